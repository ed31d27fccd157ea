//! Data-arrival (command 0x81) IO report
//!
//! Payload layout (checksum removed, multi-byte fields big-endian):
//!
//! ```text
//! [0]       SRC       source short address
//! [1]       CMD       0x81
//! [2]       PKTID     packet identifier
//! [3]       VER       protocol version
//! [4]       LQI       link quality
//! [5..=8]   SRC_LONG  32-bit source address
//! [9]       DST       destination short address
//! [10..=11] TS        timestamp, 1/64 s ticks
//! [12]      RELAY     relay flag
//! [13..=14] VOLT      supply voltage, mV
//! [15]      -         unused
//! [16]      DI        digital input states, DI1 in bit 0
//! [17]      DI_LATCH  digital inputs that went low since last cleared
//! [18..=21] AD        analog inputs AD1..AD4
//! ```
//!
//! The analog correction bits are packed two per channel into the trailing
//! payload byte.

use core::fmt;

use crate::decoder::{Decline, ExpectedLength};
use crate::fields::{
    analog_millivolts, correction_bits, digital_bits, lqi_to_dbm, ticks_to_seconds,
    ANALOG_UNUSED_MV, CHANNELS,
};

/// Exact payload length of a data-arrival report
pub const DATA_ARRIVAL_LEN: usize = 22;

const IDX_SRC: usize = 0;
const IDX_CMD: usize = 1;
const IDX_PACKET_ID: usize = 2;
const IDX_VERSION: usize = 3;
const IDX_LQI: usize = 4;
const IDX_SRC_LONG: usize = 5;
const IDX_DST: usize = 9;
const IDX_TIMESTAMP: usize = 10;
const IDX_RELAY: usize = 12;
const IDX_VOLTAGE: usize = 13;
const IDX_DI: usize = 16;
const IDX_DI_LATCHED: usize = 17;
const IDX_AD: usize = 18;
const IDX_AD_CORRECTION: usize = DATA_ARRIVAL_LEN - 1;

/// State of one digital input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitalInput {
    /// Current state bit (1 while the input is low)
    pub state: u8,
    /// Set once the input has gone low, until the remote device clears it
    pub latched: u8,
}

/// Reading of one analog input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogInput {
    /// Input not connected (floating high)
    Unused,
    /// Measured voltage
    Millivolts(u16),
}

impl AnalogInput {
    /// Build a reading from the raw byte and its 2-bit correction
    pub fn from_raw(raw: u8, correction: u8) -> Self {
        match analog_millivolts(raw, correction) {
            ANALOG_UNUSED_MV => AnalogInput::Unused,
            // at most (0xFE * 4 + 3) * 4, so always fits
            mv => AnalogInput::Millivolts(mv as u16),
        }
    }

    /// Millivolts, or [`ANALOG_UNUSED_MV`] for an unused input
    pub fn millivolts(&self) -> i16 {
        match self {
            AnalogInput::Unused => ANALOG_UNUSED_MV,
            AnalogInput::Millivolts(mv) => *mv as i16,
        }
    }
}

/// Decoded data-arrival report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataArrival {
    /// Source short address
    pub src: u8,
    /// Command byte (always 0x81)
    pub command: u8,
    /// Packet sequence identifier
    pub packet_id: u8,
    /// Protocol version
    pub protocol_version: u8,
    /// Link quality indicator
    pub lqi: u8,
    /// 32-bit serial address of the source
    pub src_long: u32,
    /// Destination short address
    pub dst: u8,
    /// Timestamp in 1/64 s ticks
    pub timestamp: u16,
    /// Relay flag
    pub relay: u8,
    /// Supply voltage in mV
    pub voltage_mv: u16,
    /// DI1..DI4
    pub digital: [DigitalInput; CHANNELS],
    /// AD1..AD4
    pub analog: [AnalogInput; CHANNELS],
    /// 2-bit correction residual per analog channel
    pub corrections: [u8; CHANNELS],
}

impl DataArrival {
    /// Interpret a payload (checksum already removed)
    ///
    /// Declines unless the payload is exactly [`DATA_ARRIVAL_LEN`] bytes.
    pub fn from_payload(payload: &[u8]) -> Result<Self, Decline> {
        if payload.len() != DATA_ARRIVAL_LEN {
            return Err(Decline {
                command: payload.get(IDX_CMD).copied().unwrap_or_default(),
                expected: ExpectedLength::Exactly(DATA_ARRIVAL_LEN),
                actual: payload.len(),
            });
        }

        let be_u16 = |idx: usize| u16::from_be_bytes([payload[idx], payload[idx + 1]]);

        let states = digital_bits(payload[IDX_DI]);
        let latched = digital_bits(payload[IDX_DI_LATCHED]);
        let corrections = correction_bits(payload[IDX_AD_CORRECTION]);

        Ok(Self {
            src: payload[IDX_SRC],
            command: payload[IDX_CMD],
            packet_id: payload[IDX_PACKET_ID],
            protocol_version: payload[IDX_VERSION],
            lqi: payload[IDX_LQI],
            src_long: u32::from_be_bytes([
                payload[IDX_SRC_LONG],
                payload[IDX_SRC_LONG + 1],
                payload[IDX_SRC_LONG + 2],
                payload[IDX_SRC_LONG + 3],
            ]),
            dst: payload[IDX_DST],
            timestamp: be_u16(IDX_TIMESTAMP),
            relay: payload[IDX_RELAY],
            voltage_mv: be_u16(IDX_VOLTAGE),
            digital: core::array::from_fn(|ch| DigitalInput {
                state: states[ch],
                latched: latched[ch],
            }),
            analog: core::array::from_fn(|ch| {
                AnalogInput::from_raw(payload[IDX_AD + ch], corrections[ch])
            }),
            corrections,
        })
    }

    /// Approximate signal strength in dBm
    pub fn lqi_dbm(&self) -> f32 {
        lqi_to_dbm(self.lqi)
    }

    /// Timestamp in seconds
    pub fn timestamp_seconds(&self) -> f32 {
        ticks_to_seconds(self.timestamp)
    }
}

impl fmt::Display for DataArrival {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  command   = 0x{:02x} (data arrival)", self.command)?;
        writeln!(f, "  src       = 0x{:02x}", self.src)?;
        writeln!(f, "  src long  = 0x{:08x}", self.src_long)?;
        writeln!(f, "  dst       = 0x{:02x}", self.dst)?;
        writeln!(f, "  pktid     = 0x{:02x}", self.packet_id)?;
        writeln!(f, "  prtcl ver = 0x{:02x}", self.protocol_version)?;
        writeln!(f, "  LQI       = {} / {:.2} [dbm]", self.lqi, self.lqi_dbm())?;
        writeln!(f, "  time stmp = {:.3} [s]", self.timestamp_seconds())?;
        writeln!(f, "  relay flg = {}", self.relay)?;
        writeln!(f, "  volt      = {:04} [mV]", self.voltage_mv)?;

        for (ch, di) in self.digital.iter().enumerate() {
            write!(f, "  DI{}={}/{}", ch + 1, di.state, di.latched)?;
        }
        writeln!(f)?;

        write!(f, " ")?;
        for (ch, ad) in self.analog.iter().enumerate() {
            write!(f, " AD{}={:04}", ch + 1, ad.millivolts())?;
        }
        writeln!(f, " [mV]")
    }
}
