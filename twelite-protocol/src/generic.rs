//! Generic record for commands without a dedicated layout

use core::fmt;

use heapless::Vec;

use crate::decoder::{Decline, ExpectedLength};
use crate::frame::MAX_FRAME_SIZE;

/// Shortest payload the generic interpreter accepts
pub const GENERIC_MIN_LEN: usize = 3;

/// Source, command and the remaining payload bytes as received
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GenericRecord {
    /// Source short address
    pub src: u8,
    /// Command byte
    pub command: u8,
    /// Payload bytes after the command byte
    pub data: Vec<u8, MAX_FRAME_SIZE>,
}

impl GenericRecord {
    /// Interpret a payload (checksum already removed)
    pub fn from_payload(payload: &[u8]) -> Result<Self, Decline> {
        let decline = Decline {
            command: payload.get(1).copied().unwrap_or_default(),
            expected: ExpectedLength::AtLeast(GENERIC_MIN_LEN),
            actual: payload.len(),
        };

        if payload.len() < GENERIC_MIN_LEN {
            return Err(decline);
        }

        Ok(Self {
            src: payload[0],
            command: payload[1],
            data: Vec::from_slice(&payload[2..]).map_err(|_| decline)?,
        })
    }
}

impl fmt::Display for GenericRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  command = 0x{:02x} (other)", self.command)?;
        writeln!(f, "  src     = 0x{:02x}", self.src)?;
        write!(f, "  payload =")?;
        for byte in &self.data {
            write!(f, " {byte:02x}")?;
        }
        writeln!(f, " (hex)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String;

    #[test]
    fn test_generic_from_payload() {
        let record = GenericRecord::from_payload(&[0x78, 0x8B, 0x01, 0xA0]).unwrap();
        assert_eq!(record.src, 0x78);
        assert_eq!(record.command, 0x8B);
        assert_eq!(&record.data[..], &[0x01, 0xA0]);
    }

    #[test]
    fn test_generic_declines_short_payload() {
        let decline = GenericRecord::from_payload(&[0x78, 0x8B]).unwrap_err();
        assert_eq!(decline.command, 0x8B);
        assert_eq!(decline.expected, ExpectedLength::AtLeast(3));
        assert_eq!(decline.actual, 2);

        assert!(GenericRecord::from_payload(&[]).is_err());
    }

    #[test]
    fn test_generic_render() {
        let record = GenericRecord::from_payload(&[0x01, 0x02, 0x0A, 0xFF, 0x10]).unwrap();
        let mut out = String::<128>::new();
        write!(out, "{record}").unwrap();

        assert_eq!(
            out.as_str(),
            "  command = 0x02 (other)\n  src     = 0x01\n  payload = 0a ff 10 (hex)\n"
        );
    }
}
