//! [`Channel`] over a local serial port (RS485 dongle) using the `serialport` crate.

use crate::protocol::CHANNEL_TIMEOUT;
use crate::session::Channel;
use crate::Error;
use std::io::{self, Read, Write};
use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 9600;

#[derive(Debug)]
pub struct SerialChannel {
    serial: Box<dyn serialport::SerialPort>,
}

impl SerialChannel {
    /// Opens `port` in raw 8N1 mode without flow control.
    pub fn open(port: &str, baud_rate: u32) -> Result<Self, Error> {
        log::debug!("Opening serial port '{port}' at {baud_rate} baud");
        Ok(Self {
            serial: serialport::new(port, baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .timeout(CHANNEL_TIMEOUT)
                .open()?,
        })
    }
}

impl Channel for SerialChannel {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        self.serial.write_all(buffer)?;
        self.serial.flush()
    }

    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.serial.set_timeout(timeout)?;
        match self.serial.read(buffer) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        let pending = self.serial.bytes_to_read()?;
        if pending > 0 {
            log::trace!("Discarding {} pending bytes", pending);
            self.serial.clear(serialport::ClearBuffer::Input)?;
        }
        Ok(())
    }
}
