//! TWELITE Standard Application Serial Protocol
//!
//! This crate decodes the ASCII-hex frames emitted on the serial port of a
//! TWELITE wireless module running the standard application. Each frame is a
//! single text line:
//!
//! ```text
//! ┌───────┬──────────────────────────────────────────┬──────────┐
//! │ ':'   │ PAYLOAD (hex pairs)                      │ CHECKSUM │
//! │ 1 chr │ SRC │ CMD │ command-specific fields ...  │ 1B (hex) │
//! └───────┴──────────────────────────────────────────┴──────────┘
//! ```
//!
//! The checksum byte makes the 8-bit sum of every decoded byte zero. Command
//! `0x81` carries a data-arrival report (digital and analog IO of a remote
//! end device); every other command is shown as a generic record.
//!
//! Decoding is pure: [`decode`] turns one line into a [`Record`] or a
//! [`DecodeError`] without touching any I/O.

#![no_std]
#![deny(unsafe_code)]

pub mod data_arrival;
pub mod decoder;
pub mod fields;
pub mod frame;
pub mod generic;

pub use data_arrival::{AnalogInput, DataArrival, DigitalInput, DATA_ARRIVAL_LEN};
pub use decoder::{decode, DecodeError, Decline, ExpectedLength, Record};
pub use frame::{encode_line, Frame, FrameError, HexError, FRAME_START, MAX_FRAME_SIZE};
pub use generic::{GenericRecord, GENERIC_MIN_LEN};

/// Command byte of a data-arrival (IO report) frame
pub const CMD_DATA_ARRIVAL: u8 = 0x81;
