use crate::protocol::*;
use crate::Error;
use std::io;
use std::time::{Duration, Instant};

/// Half-duplex byte stream to the meter.
pub trait Channel {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()>;

    /// Reads the bytes available, waiting at most `timeout` for the first one.
    /// Returns `Ok(0)` when the timeout expired without any data.
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Drops stale input so it cannot be taken for the next reply.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub address: Address,
    pub channel_timeout: Duration,
    /// Pause after every transmission before the reply is read.
    pub settle_delay: Duration,
    pub access_level: AccessLevel,
    pub password: Password,
    /// Log every frame sent and received at info level.
    pub dump_frames: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: Address::default(),
            channel_timeout: CHANNEL_TIMEOUT,
            settle_delay: SETTLE_DELAY,
            access_level: AccessLevel::default(),
            password: Password::default(),
            dump_frames: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    ChannelVerified,
    Initialized,
    Reading,
}

/// One request/response conversation with the meter.
///
/// The session owns the channel until [`Session::into_inner`]. Every request
/// waits for its reply (or the timeout) before the next one is sent, and
/// nothing is ever retried.
#[derive(Debug)]
pub struct Session<C> {
    channel: C,
    config: SessionConfig,
    state: SessionState,
}

impl<C: Channel> Session<C> {
    pub fn new(channel: C, config: SessionConfig) -> Self {
        Self {
            channel,
            config,
            state: SessionState::Closed,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Releases the channel.
    pub fn into_inner(self) -> C {
        self.channel
    }

    fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn send_bytes(&mut self, tx_buffer: &[u8]) -> Result<(), Error> {
        self.channel.discard_input()?;
        log::trace!("send_bytes: {:02X?}", tx_buffer);
        if self.config.dump_frames {
            log::info!("Sent bytes: {}\t{:02X?}", tx_buffer.len(), tx_buffer);
        }
        self.channel.write_all(tx_buffer)?;
        if !self.config.settle_delay.is_zero() {
            std::thread::sleep(self.config.settle_delay);
        }
        Ok(())
    }

    /// Collects up to `size` bytes within one channel timeout, however the
    /// meter splits the reply. Returns `None` when nothing arrived in time.
    fn receive_bytes(&mut self, size: usize) -> Result<Option<Vec<u8>>, Error> {
        let mut rx_buffer = vec![0; MAX_FRAME_SIZE];
        let mut received = 0;
        let deadline = Instant::now() + self.config.channel_timeout;
        while received < size {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let n = self
                .channel
                .read_timeout(&mut rx_buffer[received..], remaining)?;
            if n == 0 {
                break;
            }
            received += n;
        }
        if received == 0 {
            return Ok(None);
        }
        rx_buffer.truncate(received);

        log::trace!("receive_bytes: {:02X?}", rx_buffer);
        if self.config.dump_frames {
            log::info!("Received bytes: {}\t{:02X?}", rx_buffer.len(), rx_buffer);
        }
        Ok(Some(rx_buffer))
    }

    fn transact(
        &mut self,
        command: &Command,
        layout: ReplyLayout,
    ) -> Result<Option<Response>, Error> {
        let tx_buffer = command.request(self.config.address);
        self.send_bytes(&tx_buffer)?;
        match self.receive_bytes(layout.size())? {
            Some(rx_buffer) => validate(&rx_buffer, layout).map(Some),
            None => Ok(None),
        }
    }

    /// Like `transact` for a channel already known to be alive, so silence is fatal.
    fn transact_in_session(
        &mut self,
        command: &Command,
        layout: ReplyLayout,
    ) -> Result<Response, Error> {
        self.transact(command, layout)?.ok_or_else(|| {
            log::warn!(
                "No reply to command {:02X} within {:?}",
                command.code(),
                self.config.channel_timeout
            );
            Error::MidSessionTimeout
        })
    }

    /// Sends the channel test. Silence is reported as `Error::ChannelTimeout`.
    pub fn verify_channel(&mut self) -> Result<(), Error> {
        match self.transact(&Command::TestChannel, ReplyLayout::Status)? {
            Some(_) => {
                if self.state == SessionState::Closed {
                    self.state = SessionState::ChannelVerified;
                }
                log::debug!("Communication channel verified");
                Ok(())
            }
            None => {
                log::warn!(
                    "No reply to channel test within {:?}",
                    self.config.channel_timeout
                );
                Err(Error::ChannelTimeout)
            }
        }
    }

    /// Opens the meter channel with the configured access level and password.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.require(
            "initialize",
            &[
                SessionState::ChannelVerified,
                SessionState::Initialized,
                SessionState::Reading,
            ],
        )?;
        let command = Command::Initialize {
            access_level: self.config.access_level,
            password: self.config.password,
        };
        self.transact_in_session(&command, ReplyLayout::Status)?;
        self.state = SessionState::Initialized;
        log::debug!("Connection initialised ({:?})", self.config.access_level);
        Ok(())
    }

    pub fn read_parameter(
        &mut self,
        command: &Command,
        layout: ReplyLayout,
    ) -> Result<Response, Error> {
        self.require(
            "read parameter",
            &[SessionState::Initialized, SessionState::Reading],
        )?;
        let response = self.transact_in_session(command, layout)?;
        self.state = SessionState::Reading;
        Ok(response)
    }

    /// Sends the close command. The session is closed afterwards even if the
    /// meter did not acknowledge it.
    pub fn close(&mut self) -> Result<(), Error> {
        let result = self.transact_in_session(&Command::Close, ReplyLayout::Status);
        self.state = SessionState::Closed;
        log::debug!("Connection closed");
        result.map(|_| ())
    }

    fn read_phases(&mut self, quantity: Quantity) -> Result<PhaseValues, Error> {
        let response = self.read_parameter(&quantity.command(), quantity.reply_layout())?;
        PhaseValues::decode(&response, quantity.scale())
    }

    fn read_phases_with_sum(&mut self, quantity: Quantity) -> Result<PhaseValuesWithSum, Error> {
        let response = self.read_parameter(&quantity.command(), quantity.reply_layout())?;
        PhaseValuesWithSum::decode(&response, quantity.scale())
    }

    /// Voltage per phase (V).
    pub fn get_voltage(&mut self) -> Result<PhaseValues, Error> {
        self.read_phases(Quantity::Voltage)
    }

    /// Current per phase (A).
    pub fn get_current(&mut self) -> Result<PhaseValues, Error> {
        self.read_phases(Quantity::Current)
    }

    /// Power factor cos(f) per phase and overall.
    pub fn get_power_factor(&mut self) -> Result<PhaseValuesWithSum, Error> {
        self.read_phases_with_sum(Quantity::PowerFactor)
    }

    /// Grid frequency (Hz).
    pub fn get_frequency(&mut self) -> Result<f32, Error> {
        let quantity = Quantity::Frequency;
        let response = self.read_parameter(&quantity.command(), quantity.reply_layout())?;
        decode_scalar(&response, quantity.scale())
    }

    /// Angle between phases (degrees).
    pub fn get_phase_angle(&mut self) -> Result<PhaseValues, Error> {
        self.read_phases(Quantity::PhaseAngle)
    }

    /// Active power per phase and total (W).
    pub fn get_active_power(&mut self) -> Result<PhaseValuesWithSum, Error> {
        self.read_phases_with_sum(Quantity::ActivePower)
    }

    /// Reactive power per phase and total (VA).
    pub fn get_reactive_power(&mut self) -> Result<PhaseValuesWithSum, Error> {
        self.read_phases_with_sum(Quantity::ReactivePower)
    }

    /// Energy counter (kWh) of `period` for `tariff`, 0 meaning all tariffs.
    pub fn get_energy(
        &mut self,
        period: EnergyPeriod,
        tariff: u8,
    ) -> Result<PhaseValuesWithSum, Error> {
        let command = Command::read_energy(period, tariff)?;
        let response = self.read_parameter(&command, ReplyLayout::PhaseQuadsWithSum)?;
        PhaseValuesWithSum::decode(&response, ENERGY_SCALE)
    }
}
