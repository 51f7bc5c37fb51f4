use crate::Error;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RS485 bus address of the power meter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Address(u8);

impl Address {
    pub const fn new(address: u8) -> Self {
        Self(address)
    }
}

impl std::ops::Deref for Address {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u8> for Address {
    fn from(address: u8) -> Self {
        Self(address)
    }
}

/// How long the meter may stay silent before a request is considered unanswered.
pub const CHANNEL_TIMEOUT: Duration = Duration::from_secs(2);

/// Settling time the meter needs between receiving a frame and answering it.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Upper bound of a single receive, larger than any reply the meter sends.
pub const MAX_FRAME_SIZE: usize = 255;

/// Scale of the accumulated energy counters (Wh -> kWh).
pub const ENERGY_SCALE: f32 = 1000.0;

const CRC_SIZE: usize = 2;
const HEADER_SIZE: usize = 1;

const CMD_TEST_CHANNEL: u8 = 0x00;
const CMD_INITIALIZE: u8 = 0x01;
const CMD_CLOSE: u8 = 0x02;
const CMD_READ_ENERGY: u8 = 0x05;
const CMD_READ_PARAMETER: u8 = 0x08;
const PARAM_CURRENT_VALUES: u8 = 0x16;
const MAX_TARIFF: u8 = 4;

/// Modbus RTU CRC16 (polynomial 0xA001, initial value 0xFFFF).
///
/// The register is sent low byte first, so the wire trailer read as a
/// little-endian `u16` equals the returned value.
pub fn crc16(buffer: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in buffer {
        crc ^= u16::from(*byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

fn append_crc(buffer: &mut Vec<u8>) {
    let crc = crc16(buffer);
    buffer.extend_from_slice(&crc.to_le_bytes());
}

/// Decodes a 3 byte field. The meter sends the two low bytes swapped.
pub fn decode3(bytes: &[u8; 3], scale: f32) -> f32 {
    assert!(scale != 0.0, "decode scale must not be zero");
    let value = (u32::from(bytes[0]) << 16) | (u32::from(bytes[2]) << 8) | u32::from(bytes[1]);
    value as f32 / scale
}

/// Decodes a 4 byte field. The meter sends both 16 bit halves byte swapped.
pub fn decode4(bytes: &[u8; 4], scale: f32) -> f32 {
    assert!(scale != 0.0, "decode scale must not be zero");
    let value = (u32::from(bytes[1]) << 24)
        | (u32::from(bytes[0]) << 16)
        | (u32::from(bytes[3]) << 8)
        | u32::from(bytes[2]);
    value as f32 / scale
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum AccessLevel {
    #[default]
    User = 0x01,
    Admin = 0x02,
}

/// Six digit meter password, each digit is transmitted as its numeric value.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Password([u8; 6]);

impl Password {
    /// Fails with `Error::RangeError` unless every digit is 0-9.
    pub fn new(digits: [u8; 6]) -> Result<Self, Error> {
        if digits.iter().any(|digit| *digit > 9) {
            return Err(Error::RangeError);
        }
        Ok(Self(digits))
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl Default for Password {
    /// Factory default user password "111111".
    fn default() -> Self {
        Self([0x01; 6])
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password(******)")
    }
}

impl std::str::FromStr for Password {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 {
            return Err(Error::RangeError);
        }
        let mut digits = [0; 6];
        for (digit, c) in digits.iter_mut().zip(s.chars()) {
            *digit = c.to_digit(10).ok_or(Error::RangeError)? as u8;
        }
        Self::new(digits)
    }
}

impl TryFrom<String> for Password {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> String {
        password.0.iter().map(|d| char::from(b'0' + d)).collect()
    }
}

/// Accumulation period of an energy counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EnergyPeriod {
    SinceReset,
    ThisYear,
    LastYear,
    /// Month number 1-12 of the current year.
    Month(u8),
    Today,
    Yesterday,
}

impl EnergyPeriod {
    /// Parameter id of the energy request: period in the high nibble, month in the low one.
    pub fn param_id(&self) -> u8 {
        let (period, month) = match *self {
            EnergyPeriod::SinceReset => (0, 0),
            EnergyPeriod::ThisYear => (1, 0),
            EnergyPeriod::LastYear => (2, 0),
            EnergyPeriod::Month(month) => (3, month),
            EnergyPeriod::Today => (4, 0),
            EnergyPeriod::Yesterday => (5, 0),
        };
        (period << 4) | (month & 0x0F)
    }
}

/// Instantaneous quantities available through the read-current-values request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Voltage,
    Current,
    PowerFactor,
    Frequency,
    PhaseAngle,
    ActivePower,
    ReactivePower,
}

impl Quantity {
    pub const fn sub_index(self) -> u8 {
        match self {
            Quantity::Voltage => 0x11,
            Quantity::Current => 0x21,
            Quantity::PowerFactor => 0x30,
            Quantity::Frequency => 0x40,
            Quantity::PhaseAngle => 0x51,
            Quantity::ActivePower => 0x00,
            Quantity::ReactivePower => 0x08,
        }
    }

    pub const fn scale(self) -> f32 {
        match self {
            Quantity::Voltage | Quantity::Frequency | Quantity::PhaseAngle => 100.0,
            Quantity::Current
            | Quantity::PowerFactor
            | Quantity::ActivePower
            | Quantity::ReactivePower => 1000.0,
        }
    }

    pub const fn reply_layout(self) -> ReplyLayout {
        match self {
            Quantity::Frequency => ReplyLayout::Triple,
            Quantity::Voltage | Quantity::Current | Quantity::PhaseAngle => {
                ReplyLayout::PhaseTriples
            }
            Quantity::PowerFactor | Quantity::ActivePower | Quantity::ReactivePower => {
                ReplyLayout::PhaseTriplesWithSum
            }
        }
    }

    pub const fn command(self) -> Command {
        Command::ReadParameter {
            code: CMD_READ_PARAMETER,
            param_id: PARAM_CURRENT_VALUES,
            sub_index: self.sub_index(),
        }
    }
}

/// A request frame sent to the meter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TestChannel,
    Initialize {
        access_level: AccessLevel,
        password: Password,
    },
    Close,
    ReadParameter {
        code: u8,
        param_id: u8,
        sub_index: u8,
    },
}

impl Command {
    /// Energy counter request. `tariff` 0 selects the sum of all tariffs.
    pub fn read_energy(period: EnergyPeriod, tariff: u8) -> Result<Self, Error> {
        if let EnergyPeriod::Month(month) = period {
            if !(1..=12).contains(&month) {
                log::warn!("Invalid month {month}");
                return Err(Error::RangeError);
            }
        }
        if tariff > MAX_TARIFF {
            log::warn!("Invalid tariff {tariff}");
            return Err(Error::RangeError);
        }
        Ok(Command::ReadParameter {
            code: CMD_READ_ENERGY,
            param_id: period.param_id(),
            sub_index: tariff,
        })
    }

    pub fn code(&self) -> u8 {
        match self {
            Command::TestChannel => CMD_TEST_CHANNEL,
            Command::Initialize { .. } => CMD_INITIALIZE,
            Command::Close => CMD_CLOSE,
            Command::ReadParameter { code, .. } => *code,
        }
    }

    pub fn request_size(&self) -> usize {
        let payload = match self {
            Command::TestChannel | Command::Close => 1,
            Command::Initialize { .. } => 8,
            Command::ReadParameter { .. } => 3,
        };
        HEADER_SIZE + payload + CRC_SIZE
    }

    /// Builds the ready to transmit frame including the CRC trailer.
    pub fn request(&self, address: Address) -> Vec<u8> {
        let mut tx_buffer = Vec::with_capacity(self.request_size());
        tx_buffer.push(*address);
        tx_buffer.push(self.code());
        match self {
            Command::Initialize {
                access_level,
                password,
            } => {
                tx_buffer.push(*access_level as u8);
                tx_buffer.extend_from_slice(password.as_bytes());
            }
            Command::ReadParameter {
                param_id,
                sub_index,
                ..
            } => {
                tx_buffer.push(*param_id);
                tx_buffer.push(*sub_index);
            }
            Command::TestChannel | Command::Close => {}
        }
        append_crc(&mut tx_buffer);
        tx_buffer
    }
}

/// Fixed reply shapes. Every layout is address + payload + CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyLayout {
    Status,
    Triple,
    PhaseTriples,
    PhaseTriplesWithSum,
    PhaseQuadsWithSum,
}

impl ReplyLayout {
    pub const fn size(self) -> usize {
        let payload = match self {
            ReplyLayout::Status => 1,
            ReplyLayout::Triple => 3,
            ReplyLayout::PhaseTriples => 3 * 3,
            ReplyLayout::PhaseTriplesWithSum => 4 * 3,
            ReplyLayout::PhaseQuadsWithSum => 4 * 4,
        };
        HEADER_SIZE + payload + CRC_SIZE
    }
}

/// Status byte of a single status reply. Only the low nibble is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StatusCode {
    Ok,
    IllegalCommand,
    InternalCounterError,
    PermissionDenied,
    ClockAlreadyCorrected,
    ChannelNotOpen,
    Unknown(u8),
}

impl From<u8> for StatusCode {
    fn from(status: u8) -> Self {
        match status & 0x0F {
            0 => StatusCode::Ok,
            1 => StatusCode::IllegalCommand,
            2 => StatusCode::InternalCounterError,
            3 => StatusCode::PermissionDenied,
            4 => StatusCode::ClockAlreadyCorrected,
            5 => StatusCode::ChannelNotOpen,
            other => StatusCode::Unknown(other),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StatusCode::Ok => write!(f, "OK"),
            StatusCode::IllegalCommand => write!(f, "Illegal command or parameter"),
            StatusCode::InternalCounterError => write!(f, "Internal counter error"),
            StatusCode::PermissionDenied => write!(f, "Permission denied"),
            StatusCode::ClockAlreadyCorrected => write!(f, "Clock already corrected today"),
            StatusCode::ChannelNotOpen => write!(f, "Communication channel is not open"),
            StatusCode::Unknown(code) => write!(f, "Unknown status code {code}"),
        }
    }
}

/// A validated reply with its raw, still packed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Status reply carrying `StatusCode::Ok`.
    Status,
    Triple([u8; 3]),
    PhaseTriples {
        p1: [u8; 3],
        p2: [u8; 3],
        p3: [u8; 3],
    },
    PhaseTriplesWithSum {
        sum: [u8; 3],
        p1: [u8; 3],
        p2: [u8; 3],
        p3: [u8; 3],
    },
    PhaseQuadsWithSum {
        sum: [u8; 4],
        p1: [u8; 4],
        p2: [u8; 4],
        p3: [u8; 4],
    },
}

fn validate_len(buffer: &[u8], reply_size: usize) -> Result<(), Error> {
    if buffer.len() != reply_size {
        log::warn!(
            "Invalid buffer size - required={} received={}",
            reply_size,
            buffer.len()
        );
        return Err(Error::WrongResultSize {
            expected: reply_size,
            received: buffer.len(),
        });
    }
    Ok(())
}

fn validate_checksum(buffer: &[u8]) -> Result<(), Error> {
    let (frame, trailer) = buffer.split_at(buffer.len() - CRC_SIZE);
    let calculated = crc16(frame);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    if calculated != received {
        log::warn!(
            "Invalid checksum - calculated={:04X} received={:04X} buffer={:02X?}",
            calculated,
            received,
            buffer
        );
        return Err(Error::WrongCrc {
            calculated,
            received,
        });
    }
    Ok(())
}

fn field<const N: usize>(payload: &[u8], index: usize) -> [u8; N] {
    let mut value = [0; N];
    value.copy_from_slice(&payload[index * N..(index + 1) * N]);
    value
}

/// Checks size and CRC of a reply and splits it into the fields of `layout`.
///
/// A status reply with a nonzero status is returned as `Error::Status`.
pub fn validate(rx_buffer: &[u8], layout: ReplyLayout) -> Result<Response, Error> {
    validate_len(rx_buffer, layout.size())?;
    validate_checksum(rx_buffer)?;
    let payload = &rx_buffer[HEADER_SIZE..rx_buffer.len() - CRC_SIZE];
    let response = match layout {
        ReplyLayout::Status => {
            let status = StatusCode::from(payload[0]);
            if status != StatusCode::Ok {
                log::warn!("Meter replied with status {:02X} ({status})", payload[0]);
                return Err(Error::Status(status));
            }
            Response::Status
        }
        ReplyLayout::Triple => Response::Triple(field(payload, 0)),
        ReplyLayout::PhaseTriples => Response::PhaseTriples {
            p1: field(payload, 0),
            p2: field(payload, 1),
            p3: field(payload, 2),
        },
        ReplyLayout::PhaseTriplesWithSum => Response::PhaseTriplesWithSum {
            sum: field(payload, 0),
            p1: field(payload, 1),
            p2: field(payload, 2),
            p3: field(payload, 3),
        },
        ReplyLayout::PhaseQuadsWithSum => Response::PhaseQuadsWithSum {
            sum: field(payload, 0),
            p1: field(payload, 1),
            p2: field(payload, 2),
            p3: field(payload, 3),
        },
    };
    Ok(response)
}

/// Decodes a single value reply.
pub fn decode_scalar(response: &Response, scale: f32) -> Result<f32, Error> {
    match response {
        Response::Triple(value) => Ok(decode3(value, scale)),
        _ => Err(Error::UnexpectedResponse),
    }
}

/// Per phase values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseValues {
    pub p1: f32,
    pub p2: f32,
    pub p3: f32,
}

impl PhaseValues {
    pub fn decode(response: &Response, scale: f32) -> Result<Self, Error> {
        match response {
            Response::PhaseTriples { p1, p2, p3 } => Ok(Self {
                p1: decode3(p1, scale),
                p2: decode3(p2, scale),
                p3: decode3(p3, scale),
            }),
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

/// Per phase values together with the sum over all phases.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseValuesWithSum {
    pub sum: f32,
    pub p1: f32,
    pub p2: f32,
    pub p3: f32,
}

impl PhaseValuesWithSum {
    pub fn decode(response: &Response, scale: f32) -> Result<Self, Error> {
        match response {
            Response::PhaseTriplesWithSum { sum, p1, p2, p3 } => Ok(Self {
                sum: decode3(sum, scale),
                p1: decode3(p1, scale),
                p2: decode3(p2, scale),
                p3: decode3(p3, scale),
            }),
            Response::PhaseQuadsWithSum { sum, p1, p2, p3 } => Ok(Self {
                sum: decode4(sum, scale),
                p1: decode4(p1, scale),
                p2: decode4(p2, scale),
                p3: decode4(p3, scale),
            }),
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_crc(bytes: &[u8]) -> Vec<u8> {
        let mut buffer = bytes.to_vec();
        append_crc(&mut buffer);
        buffer
    }

    #[test]
    fn crc16_test() {
        // CRC-16/MODBUS check value
        assert_eq!(crc16(b"123456789"), 0x4B37);
        assert_eq!(crc16(&[]), 0xFFFF);
        // test channel request to address 0 is sent as 00 00 01 B0
        assert_eq!(crc16(&[0x00, 0x00]).to_le_bytes(), [0x01, 0xB0]);
    }

    #[test]
    fn crc_trailer_round_trip() {
        let frame = with_crc(&[0x00, 0x08, 0x16, 0x11]);
        assert_eq!(frame, [0x00, 0x08, 0x16, 0x11, 0x4F, 0x8A]);
        let trailer = u16::from_le_bytes([frame[4], frame[5]]);
        assert_eq!(trailer, crc16(&frame[..4]));
    }

    #[test]
    fn single_bit_flip_is_detected() {
        let layouts = [
            ReplyLayout::Status,
            ReplyLayout::Triple,
            ReplyLayout::PhaseTriples,
            ReplyLayout::PhaseTriplesWithSum,
            ReplyLayout::PhaseQuadsWithSum,
        ];
        for layout in layouts {
            let mut payload = vec![0x00];
            payload.extend((1..layout.size() - CRC_SIZE).map(|i| (i as u8).wrapping_mul(0x3B)));
            if layout == ReplyLayout::Status {
                payload[1] = 0x00;
            }
            let frame = with_crc(&payload);
            assert!(validate(&frame, layout).is_ok());
            // trailer bytes included
            for byte in 0..frame.len() {
                for bit in 0..8 {
                    let mut corrupted = frame.clone();
                    corrupted[byte] ^= 1 << bit;
                    assert!(
                        matches!(
                            validate(&corrupted, layout),
                            Err(Error::WrongCrc { .. })
                        ),
                        "{layout:?} byte {byte} bit {bit}"
                    );
                }
            }
        }
    }

    #[test]
    fn decode3_test() {
        assert_eq!(decode3(&[0x01, 0x02, 0x03], 100.0), 655.86);
        assert_eq!(decode3(&[0x00, 0x3C, 0x59], 100.0), 228.44);
        assert_eq!(decode3(&[0x00, 0x00, 0x00], 1000.0), 0.0);
        assert_eq!(
            decode3(&[0x01, 0x02, 0x03], 100.0),
            decode3(&[0x01, 0x02, 0x03], 100.0)
        );
    }

    #[test]
    fn decode4_test() {
        // 0x0001_E240 = 123456
        assert_eq!(decode4(&[0x01, 0x00, 0x40, 0xE2], 1000.0), 123.456);
        assert_eq!(decode4(&[0x00, 0x00, 0x00, 0x00], 1000.0), 0.0);
    }

    #[test]
    #[should_panic]
    fn decode_zero_scale_panics() {
        decode3(&[0x01, 0x02, 0x03], 0.0);
    }

    #[test]
    fn request_sizes_test() {
        let commands = [
            (Command::TestChannel, 4),
            (
                Command::Initialize {
                    access_level: AccessLevel::User,
                    password: Password::default(),
                },
                11,
            ),
            (
                Command::Initialize {
                    access_level: AccessLevel::Admin,
                    password: "222222".parse().unwrap(),
                },
                11,
            ),
            (Command::Close, 4),
            (Quantity::Voltage.command(), 6),
            (Quantity::ReactivePower.command(), 6),
            (Command::read_energy(EnergyPeriod::Month(7), 2).unwrap(), 6),
        ];
        for (command, size) in commands {
            assert_eq!(command.request_size(), size);
            assert_eq!(command.request(Address::new(0)).len(), size);
            assert_eq!(command.request(Address::new(0xFE)).len(), size);
        }
    }

    #[test]
    fn request_frames_test() {
        assert_eq!(
            Command::TestChannel.request(Address::default()),
            [0x00, 0x00, 0x01, 0xB0]
        );
        assert_eq!(
            Command::Close.request(Address::default()),
            [0x00, 0x02, 0x80, 0x71]
        );
        assert_eq!(
            Command::Initialize {
                access_level: AccessLevel::User,
                password: Password::default(),
            }
            .request(Address::default()),
            [0x00, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x77, 0x81]
        );
        assert_eq!(
            Quantity::Voltage.command().request(Address::default()),
            [0x00, 0x08, 0x16, 0x11, 0x4F, 0x8A]
        );
        assert_eq!(
            Command::read_energy(EnergyPeriod::SinceReset, 0)
                .unwrap()
                .request(Address::default()),
            [0x00, 0x05, 0x00, 0x00, 0x10, 0x25]
        );
    }

    #[test]
    fn energy_request_test() {
        assert_eq!(EnergyPeriod::Today.param_id(), 0x40);
        assert_eq!(EnergyPeriod::Yesterday.param_id(), 0x50);
        assert_eq!(EnergyPeriod::Month(12).param_id(), 0x3C);
        assert!(matches!(
            Command::read_energy(EnergyPeriod::Month(13), 0),
            Err(Error::RangeError)
        ));
        assert!(matches!(
            Command::read_energy(EnergyPeriod::Month(0), 0),
            Err(Error::RangeError)
        ));
        assert!(matches!(
            Command::read_energy(EnergyPeriod::Today, 5),
            Err(Error::RangeError)
        ));
    }

    #[test]
    fn wrong_size_is_rejected_regardless_of_crc() {
        let frame = with_crc(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(
            validate(&frame, ReplyLayout::PhaseTriples),
            Err(Error::WrongResultSize {
                expected: 12,
                received: 6
            })
        ));
        assert!(matches!(
            validate(&[], ReplyLayout::Status),
            Err(Error::WrongResultSize { .. })
        ));
    }

    #[test]
    fn status_masks_high_nibble() {
        assert_eq!(StatusCode::from(0xF0), StatusCode::Ok);
        assert_eq!(StatusCode::from(0x83), StatusCode::PermissionDenied);
        assert_eq!(StatusCode::from(0x0E), StatusCode::Unknown(0x0E));
        assert_eq!(
            validate(&with_crc(&[0x00, 0xA0]), ReplyLayout::Status).unwrap(),
            Response::Status
        );
        assert!(matches!(
            validate(&with_crc(&[0x00, 0x75]), ReplyLayout::Status),
            Err(Error::Status(StatusCode::ChannelNotOpen))
        ));
        assert!(matches!(
            validate(&with_crc(&[0x00, 0x01]), ReplyLayout::Status),
            Err(Error::Status(StatusCode::IllegalCommand))
        ));
    }

    #[test]
    fn decode_phase_values_test() {
        let frame = with_crc(&[
            0x00, 0x01, 0x02, 0x03, 0x00, 0x3C, 0x59, 0x00, 0x00, 0x00,
        ]);
        let response = validate(&frame, ReplyLayout::PhaseTriples).unwrap();
        let voltage = PhaseValues::decode(&response, 100.0).unwrap();
        assert_eq!(voltage.p1, 655.86);
        assert_eq!(voltage.p2, 228.44);
        assert_eq!(voltage.p3, 0.0);
        assert!(matches!(
            PhaseValuesWithSum::decode(&response, 100.0),
            Err(Error::UnexpectedResponse)
        ));
    }

    #[test]
    fn decode_energy_test() {
        let frame = with_crc(&[
            0x00, 0x01, 0x00, 0x40, 0xE2, 0x00, 0x00, 0xE8, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0xD0, 0x07,
        ]);
        let response = validate(&frame, ReplyLayout::PhaseQuadsWithSum).unwrap();
        let energy = PhaseValuesWithSum::decode(&response, ENERGY_SCALE).unwrap();
        assert_eq!(energy.sum, 123.456);
        assert_eq!(energy.p1, 1.0);
        assert_eq!(energy.p2, 0.0);
        assert_eq!(energy.p3, 2.0);
    }

    #[test]
    fn password_test() {
        let password: Password = "123450".parse().unwrap();
        assert_eq!(password.as_bytes(), &[1, 2, 3, 4, 5, 0]);
        assert_eq!(String::from(password), "123450");
        assert!("12345".parse::<Password>().is_err());
        assert!("12345a".parse::<Password>().is_err());
        assert!(Password::new([1, 2, 3, 4, 5, 10]).is_err());
        let password = Password::new([9, 0, 0, 0, 0, 7]).unwrap();
        assert_eq!(String::from(password), "900007");
        assert_eq!(Password::try_from(String::from(password)).unwrap(), password);
        assert_eq!(format!("{:?}", password), "Password(******)");
    }
}
