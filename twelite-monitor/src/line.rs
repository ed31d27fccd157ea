//! Line splitting over a blocking byte source
//!
//! The module prints one frame per line terminated by CR LF. [`LineReader`]
//! collects bytes up to each `\n` and hands out the line with trailing
//! whitespace removed.

use embedded_io::Read;
use heapless::Vec;

/// Longest line kept, comfortably above the longest valid frame line
pub const MAX_LINE_LEN: usize = 320;

/// Bytes requested from the source per read
const READ_CHUNK: usize = 64;

/// Errors from [`LineReader::read_line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError<E> {
    /// The underlying source failed
    Read(E),
    /// Line exceeded [`MAX_LINE_LEN`] and was dropped; `first` is its first byte
    TooLong { first: u8 },
}

/// Splits a byte stream into lines
pub struct LineReader<R> {
    source: R,
    line: Vec<u8, MAX_LINE_LEN>,
    chunk: [u8; READ_CHUNK],
    pos: usize,
    filled: usize,
    eof: bool,
}

impl<R: Read> LineReader<R> {
    /// Create a line reader over `source`
    pub fn new(source: R) -> Self {
        Self {
            source,
            line: Vec::new(),
            chunk: [0u8; READ_CHUNK],
            pos: 0,
            filled: 0,
            eof: false,
        }
    }

    /// Read the next line, blocking until it is complete
    ///
    /// Returns `Ok(None)` once the source reports end of stream. A final line
    /// without a terminator is still returned before that.
    pub fn read_line(&mut self) -> Result<Option<&[u8]>, LineError<R::Error>> {
        self.line.clear();
        let mut overflow = false;
        let mut first = None;

        loop {
            // Refill the chunk once it is used up
            if self.pos == self.filled {
                if self.eof {
                    return Ok(None);
                }

                let n = self.source.read(&mut self.chunk).map_err(LineError::Read)?;
                if n == 0 {
                    self.eof = true;
                    if first.is_none() {
                        return Ok(None);
                    }
                    break;
                }
                self.pos = 0;
                self.filled = n;
            }

            let byte = self.chunk[self.pos];
            self.pos += 1;

            if byte == b'\n' {
                break;
            }

            // Keep draining to the newline after the buffer fills, so the
            // next call starts on a fresh line
            first.get_or_insert(byte);
            if self.line.push(byte).is_err() {
                overflow = true;
            }
        }

        if overflow {
            return Err(LineError::TooLong {
                first: first.unwrap_or_default(),
            });
        }

        Ok(Some(trim_end(&self.line)))
    }

    /// Release the underlying source
    pub fn into_inner(self) -> R {
        self.source
    }
}

fn trim_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}
