#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mercury236_lib
//!
//! This crate provides a library for polling Mercury 236 three phase power meters
//! over RS485. The meter speaks a Modbus RTU like protocol: every frame starts with
//! the bus address and ends with a Modbus CRC16.
//!
//! A [`session::Session`] owns the byte channel and runs the strictly sequential
//! request/response exchange, [`readings::collect`] performs the complete polling
//! run and returns every measurement at once.
//!
//! ## Features
//!
//! - `default`: Enables `bin-dependencies`, which is intended for compiling the `mercury236` command-line tool.
//! - `serialport`: Enables [`serialport::SerialChannel`], a channel using the `serialport` crate.
//! - `serde`: Enables `serde` support for the value types and configuration.
//! - `bin-dependencies`: Enables all features required by the `mercury236` binary executable.

/// Contains error types for the library.
mod error;
/// Frame codec of the meter protocol.
pub mod protocol;
/// Collects the full measurement set.
pub mod readings;
/// Transport session with the meter.
pub mod session;

pub use error::Error;

/// Channel implementation over a local serial port.
#[cfg_attr(docsrs, doc(cfg(feature = "serialport")))]
#[cfg(feature = "serialport")]
pub mod serialport;
