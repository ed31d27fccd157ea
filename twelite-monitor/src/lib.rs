//! Board-agnostic serial monitor for TWELITE frames
//!
//! This crate contains everything between a byte stream and human-readable
//! output that does not depend on specific hardware:
//!
//! - Line splitting over any blocking [`embedded_io::Read`] source
//! - The read loop that decodes each line and renders the outcome
//! - Monitor configuration and its TOML-subset parser
//!
//! The loop is synchronous: one line is read, decoded and written out
//! before the next read starts.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod line;
pub mod monitor;

pub use config::{parse_config, MonitorConfig, ParseError};
pub use line::{LineError, LineReader, MAX_LINE_LEN};
pub use monitor::{Monitor, MonitorError, MonitorStats, Outcome};
