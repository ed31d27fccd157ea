//! Frame decoding for the TWELITE serial protocol.
//!
//! Frame format (one text line):
//! - START (1 char): ':'
//! - BODY (2n hex digits, either case): n bytes in transmission order
//! - CHECKSUM (last byte of BODY): chosen so that the 8-bit sum of all n bytes is zero
//!
//! Stripping the checksum leaves the payload, which always starts with the
//! source address and the command byte.

use core::fmt;

use heapless::{String, Vec};

/// Frame start character
pub const FRAME_START: char = ':';

/// Maximum number of decoded bytes in one frame (payload + checksum)
pub const MAX_FRAME_SIZE: usize = 128;

/// Maximum encoded line length (START + two hex digits per byte)
pub const MAX_LINE_SIZE: usize = 1 + 2 * MAX_FRAME_SIZE;

/// Smallest payload that still carries a source address and a command byte
pub const MIN_PAYLOAD_LEN: usize = 2;

/// Errors from turning the hex body of a line into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HexError {
    /// Odd number of hex digits
    OddLength,
    /// Character that is not a hex digit
    InvalidCharacter { c: char, index: usize },
    /// More bytes than [`MAX_FRAME_SIZE`]
    TooLong,
}

impl From<hex::FromHexError> for HexError {
    fn from(e: hex::FromHexError) -> Self {
        match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                HexError::InvalidCharacter { c, index }
            }
            hex::FromHexError::OddLength => HexError::OddLength,
            hex::FromHexError::InvalidStringLength => HexError::TooLong,
        }
    }
}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexError::OddLength => write!(f, "odd number of hex digits"),
            HexError::InvalidCharacter { c, index } => {
                write!(f, "invalid hex character {c:?} at {index}")
            }
            HexError::TooLong => write!(f, "frame longer than {MAX_FRAME_SIZE} bytes"),
        }
    }
}

/// Errors that can occur while validating a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Body is not a valid hex string
    Hex(HexError),
    /// No bytes at all, so there is no checksum to verify
    Empty,
    /// 8-bit sum of all bytes is not zero
    InvalidChecksum { sum: u8 },
    /// Payload has no room for source address and command
    TooShort,
}

impl From<HexError> for FrameError {
    fn from(e: HexError) -> Self {
        FrameError::Hex(e)
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Hex(e) => write!(f, "{e}"),
            FrameError::Empty => write!(f, "empty frame"),
            FrameError::InvalidChecksum { sum } => write!(f, "checksum sum 0x{sum:02x} != 0"),
            FrameError::TooShort => write!(f, "payload shorter than {MIN_PAYLOAD_LEN} bytes"),
        }
    }
}

/// 8-bit truncated sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// Checksum byte that makes the sum of `payload` plus itself zero
pub fn checksum_byte(payload: &[u8]) -> u8 {
    0u8.wrapping_sub(checksum(payload))
}

/// Decode a hex body (the text after [`FRAME_START`]) into bytes
pub fn decode_hex(body: &str) -> Result<Vec<u8, MAX_FRAME_SIZE>, HexError> {
    let digits = body.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }

    let len = digits.len() / 2;
    if len > MAX_FRAME_SIZE {
        return Err(HexError::TooLong);
    }

    let mut buffer = [0u8; MAX_FRAME_SIZE];
    hex::decode_to_slice(digits, &mut buffer[..len])?;
    Vec::from_slice(&buffer[..len]).map_err(|_| HexError::TooLong)
}

/// A frame whose checksum has been verified and stripped
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    payload: Vec<u8, MAX_FRAME_SIZE>,
}

impl Frame {
    /// Decode and verify the hex body of a line
    pub fn from_hex(body: &str) -> Result<Self, FrameError> {
        let bytes = decode_hex(body)?;
        Self::from_bytes(&bytes)
    }

    /// Verify the checksum of decoded frame bytes and strip it
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let Some((_, payload)) = bytes.split_last() else {
            return Err(FrameError::Empty);
        };

        // Verify over every byte including the checksum itself, strip only after
        let sum = checksum(bytes);
        if sum != 0 {
            return Err(FrameError::InvalidChecksum { sum });
        }

        // Source and command must both be present
        if payload.len() < MIN_PAYLOAD_LEN {
            return Err(FrameError::TooShort);
        }

        let payload = Vec::from_slice(payload).map_err(|_| HexError::TooLong)?;
        Ok(Self { payload })
    }

    /// Payload bytes (checksum removed)
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Short address of the sending device
    pub fn source(&self) -> u8 {
        self.payload[0]
    }

    /// Command byte
    pub fn command(&self) -> u8 {
        self.payload[1]
    }
}

/// Encode a payload as a frame line, appending its checksum
///
/// Digits are upper case, as the module itself prints them. Only used to
/// build input for tests and replays; nothing is ever sent to the module.
pub fn encode_line(payload: &[u8]) -> Result<String<MAX_LINE_SIZE>, FrameError> {
    let mut bytes: Vec<u8, MAX_FRAME_SIZE> =
        Vec::from_slice(payload).map_err(|_| HexError::TooLong)?;
    bytes
        .push(checksum_byte(payload))
        .map_err(|_| HexError::TooLong)?;

    let mut digits = [0u8; 2 * MAX_FRAME_SIZE];
    let digits = &mut digits[..2 * bytes.len()];
    hex::encode_to_slice(&bytes, digits).map_err(HexError::from)?;
    // The module prints upper case
    digits.make_ascii_uppercase();

    let mut line = String::new();
    line.push(FRAME_START).map_err(|_| HexError::TooLong)?;
    for &digit in digits.iter() {
        line.push(char::from(digit)).map_err(|_| HexError::TooLong)?;
    }
    Ok(line)
}
