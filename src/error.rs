use crate::protocol::StatusCode;
use crate::session::SessionState;

/// Errors reported by the protocol engine and the transport session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The reply length does not match the layout expected for the request.
    #[error("Wrong result size - expected={expected} received={received}")]
    WrongResultSize { expected: usize, received: usize },
    /// The reply trailer does not match the CRC computed over the frame.
    #[error("Wrong CRC - calculated={calculated:04X} received={received:04X}")]
    WrongCrc { calculated: u16, received: u16 },
    /// The meter answered with a nonzero status code.
    #[error("Meter reported status: {0}")]
    Status(StatusCode),
    /// No answer to the channel test. The meter is absent or unpowered.
    #[error("Communication channel timeout, power meter does not answer")]
    ChannelTimeout,
    /// The meter went silent after the channel had been verified.
    #[error("Communication channel timeout during session")]
    MidSessionTimeout,
    /// A validated reply was decoded with a helper for a different layout.
    #[error("Unexpected response layout")]
    UnexpectedResponse,
    #[error("Cannot {operation} while session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("Value out of range")]
    RangeError,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serialport")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}
