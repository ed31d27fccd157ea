//! Line decoding and command dispatch

use core::fmt;

use crate::data_arrival::DataArrival;
use crate::frame::{Frame, FrameError, FRAME_START};
use crate::generic::GenericRecord;
use crate::CMD_DATA_ARRIVAL;

/// Payload length an interpreter requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpectedLength {
    /// Exactly this many bytes
    Exactly(usize),
    /// At least this many bytes
    AtLeast(usize),
}

/// An interpreter refused a payload of the wrong length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Decline {
    /// Command byte of the refused payload (0 if absent)
    pub command: u8,
    /// Length the interpreter needs
    pub expected: ExpectedLength,
    /// Length it was given
    pub actual: usize,
}

impl fmt::Display for Decline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected {
            ExpectedLength::Exactly(n) => write!(
                f,
                "command 0x{:02x} needs {} bytes, got {}",
                self.command, n, self.actual
            ),
            ExpectedLength::AtLeast(n) => write!(
                f,
                "command 0x{:02x} needs at least {} bytes, got {}",
                self.command, n, self.actual
            ),
        }
    }
}

/// Why a line produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Line does not start with [`FRAME_START`]
    NotAFrame,
    /// Hex, checksum or length problem in the frame itself
    Frame(FrameError),
    /// Interpreter for the command refused the payload
    Declined(Decline),
}

impl From<FrameError> for DecodeError {
    fn from(e: FrameError) -> Self {
        DecodeError::Frame(e)
    }
}

impl From<Decline> for DecodeError {
    fn from(d: Decline) -> Self {
        DecodeError::Declined(d)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::NotAFrame => write!(f, "not a frame"),
            DecodeError::Frame(e) => write!(f, "{e}"),
            DecodeError::Declined(d) => write!(f, "{d}"),
        }
    }
}

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Record {
    /// Command 0x81 IO report
    DataArrival(DataArrival),
    /// Any other command
    Generic(GenericRecord),
}

impl Record {
    /// Pick the interpreter for the frame's command byte
    pub fn from_frame(frame: &Frame) -> Result<Self, Decline> {
        match frame.command() {
            CMD_DATA_ARRIVAL => {
                DataArrival::from_payload(frame.payload()).map(Record::DataArrival)
            }
            _ => GenericRecord::from_payload(frame.payload()).map(Record::Generic),
        }
    }

    /// Source short address
    pub fn source(&self) -> u8 {
        match self {
            Record::DataArrival(r) => r.src,
            Record::Generic(r) => r.src,
        }
    }

    /// Command byte
    pub fn command(&self) -> u8 {
        match self {
            Record::DataArrival(r) => r.command,
            Record::Generic(r) => r.command,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::DataArrival(r) => fmt::Display::fmt(r, f),
            Record::Generic(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// Decode one line received from the module
///
/// Lines without the leading [`FRAME_START`] are reported as
/// [`DecodeError::NotAFrame`]; callers usually ignore them.
pub fn decode(line: &str) -> Result<Record, DecodeError> {
    let body = line.strip_prefix(FRAME_START).ok_or(DecodeError::NotAFrame)?;
    let frame = Frame::from_hex(body)?;
    Ok(Record::from_frame(&frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_line, HexError};
    use crate::DATA_ARRIVAL_LEN;

    fn io_report() -> [u8; DATA_ARRIVAL_LEN] {
        let mut payload = [0u8; DATA_ARRIVAL_LEN];
        payload[0] = 0xAA;
        payload[1] = CMD_DATA_ARRIVAL;
        payload[16] = 0b0000_0101;
        payload[18] = 0x01;
        payload[21] = 0x03;
        payload
    }

    #[test]
    fn test_decode_not_a_frame() {
        assert_eq!(decode(""), Err(DecodeError::NotAFrame));
        assert_eq!(decode("!dbg: hello"), Err(DecodeError::NotAFrame));
        assert_eq!(decode(" :7801AB"), Err(DecodeError::NotAFrame));
    }

    #[test]
    fn test_decode_data_arrival() {
        let line = encode_line(&io_report()).unwrap();
        let record = decode(&line).unwrap();

        let Record::DataArrival(report) = record else {
            panic!("expected a data-arrival record");
        };
        assert_eq!(report.src, 0xAA);
        assert_eq!(report.digital[0].state, 1);
        assert_eq!(report.digital[2].state, 1);
        assert_eq!(report.analog[0].millivolts(), 28);
    }

    #[test]
    fn test_decode_bit_flip_fails_checksum() {
        let mut payload = io_report();
        let line = encode_line(&payload).unwrap();
        let checksum = &line[line.len() - 2..];

        // Flip a bit but keep the original checksum
        payload[9] ^= 0x01;
        let corrupted = encode_line(&payload).unwrap();
        let mut tampered = heapless::String::<64>::new();
        tampered.push_str(&corrupted[..corrupted.len() - 2]).unwrap();
        tampered.push_str(checksum).unwrap();

        assert!(matches!(
            decode(&tampered),
            Err(DecodeError::Frame(FrameError::InvalidChecksum { .. }))
        ));
    }

    #[test]
    fn test_decode_generic() {
        let line = encode_line(&[0x78, 0x8B, 0x01, 0x02]).unwrap();
        let record = decode(&line).unwrap();

        assert_eq!(record.source(), 0x78);
        assert_eq!(record.command(), 0x8B);
        assert!(matches!(record, Record::Generic(_)));
    }

    #[test]
    fn test_decode_lowercase_hex() {
        // 0x78 + 0x8B + 0x01 + 0xFC = 0x200
        let record = decode(":788b01fc").unwrap();
        assert_eq!(record.command(), 0x8B);
    }

    #[test]
    fn test_decode_malformed_hex() {
        assert_eq!(
            decode(":78X"),
            Err(DecodeError::Frame(FrameError::Hex(HexError::OddLength)))
        );
        assert!(matches!(
            decode(":78XY"),
            Err(DecodeError::Frame(FrameError::Hex(
                HexError::InvalidCharacter { .. }
            )))
        ));
    }

    #[test]
    fn test_decode_empty_frame() {
        assert_eq!(decode(":"), Err(DecodeError::Frame(FrameError::Empty)));
    }

    #[test]
    fn test_decode_short_payload() {
        // Single payload byte plus checksum
        assert_eq!(
            decode(":7888"),
            Err(DecodeError::Frame(FrameError::TooShort))
        );
    }

    #[test]
    fn test_decode_data_arrival_wrong_length_declines() {
        let line = encode_line(&io_report()[..20]).unwrap();
        assert_eq!(
            decode(&line),
            Err(DecodeError::Declined(Decline {
                command: CMD_DATA_ARRIVAL,
                expected: ExpectedLength::Exactly(DATA_ARRIVAL_LEN),
                actual: 20,
            }))
        );
    }

    #[test]
    fn test_decode_generic_too_short_declines() {
        let line = encode_line(&[0x78, 0x8B]).unwrap();
        assert!(matches!(decode(&line), Err(DecodeError::Declined(_))));
    }
}
