//! Read loop
//!
//! Every line read from the module goes through [`Monitor::process_line`]:
//!
//! - lines not starting with `:` are ignored without output
//! - a frame candidate is echoed (optional) after a blank line, then
//!   followed by the decoded record, `checksum ng`, or `  skip`
//! - interpreter declines print nothing unless `report_declines` is set
//!
//! No error on a single line stops the loop; only the byte source or the
//! output sink failing does.

use core::fmt::{self, Write};

use embedded_io::Read;

use twelite_protocol::{decode, DecodeError, FrameError, FRAME_START};

use crate::config::MonitorConfig;
use crate::line::{LineError, LineReader};

/// What happened to one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Not a frame candidate
    Ignored,
    /// Decoded and printed
    Record,
    /// Malformed frame (bad hex, empty, too short, too long)
    Skipped,
    /// Checksum did not verify
    ChecksumFailed,
    /// Interpreter refused the payload length
    Declined,
}

/// Running counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorStats {
    /// Lines read, including ignored and overlong ones
    pub lines: u32,
    /// Lines starting with `:`
    pub frames: u32,
    /// Records printed
    pub records: u32,
    /// Malformed frames
    pub skipped: u32,
    /// Checksum failures
    pub checksum_errors: u32,
    /// Interpreter declines
    pub declined: u32,
    /// Lines dropped for exceeding the line buffer
    pub overflows: u32,
}

/// Errors that end the read loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorError<E> {
    /// Byte source failed
    Read(E),
    /// Output sink refused a write
    Output,
}

impl<E> From<fmt::Error> for MonitorError<E> {
    fn from(_: fmt::Error) -> Self {
        MonitorError::Output
    }
}

/// Decodes lines and renders them as text
#[derive(Debug, Clone)]
pub struct Monitor {
    config: MonitorConfig,
    stats: MonitorStats,
}

impl Monitor {
    /// Create a monitor with the given output options
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            stats: MonitorStats::default(),
        }
    }

    /// Output options
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Counters so far
    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Decode one line and write its block to `out`
    pub fn process_line<W: Write>(
        &mut self,
        line: &[u8],
        out: &mut W,
    ) -> Result<Outcome, fmt::Error> {
        self.stats.lines = self.stats.lines.wrapping_add(1);

        if line.first() != Some(&(FRAME_START as u8)) {
            return Ok(Outcome::Ignored);
        }
        self.stats.frames = self.stats.frames.wrapping_add(1);

        // Blank separator, then the raw line
        writeln!(out)?;
        if self.config.echo_lines {
            writeln!(out, "{}", line.escape_ascii())?;
        }

        // Echo above already escaped any non-ASCII bytes; a frame that is
        // not valid UTF-8 cannot be hex, so it is a plain skip
        let result = match core::str::from_utf8(line) {
            Ok(text) => decode(text),
            Err(_) => return self.skip(out),
        };

        match result {
            Ok(record) => {
                self.stats.records = self.stats.records.wrapping_add(1);
                write!(out, "{record}")?;
                Ok(Outcome::Record)
            }
            Err(DecodeError::NotAFrame) => Ok(Outcome::Ignored),
            Err(DecodeError::Frame(FrameError::InvalidChecksum { .. })) => {
                self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
                writeln!(out, "checksum ng")?;
                Ok(Outcome::ChecksumFailed)
            }
            Err(DecodeError::Frame(_)) => self.skip(out),
            Err(DecodeError::Declined(decline)) => {
                self.stats.declined = self.stats.declined.wrapping_add(1);
                if self.config.report_declines {
                    writeln!(out, "  declined: {decline}")?;
                }
                Ok(Outcome::Declined)
            }
        }
    }

    /// Account for a line the reader dropped as too long
    ///
    /// Only frame candidates produce output (`  skip`); the line itself is
    /// no longer available to echo.
    pub fn process_overflow<W: Write>(
        &mut self,
        first: u8,
        out: &mut W,
    ) -> Result<Outcome, fmt::Error> {
        self.stats.lines = self.stats.lines.wrapping_add(1);
        self.stats.overflows = self.stats.overflows.wrapping_add(1);

        if first != FRAME_START as u8 {
            return Ok(Outcome::Ignored);
        }
        self.stats.frames = self.stats.frames.wrapping_add(1);

        // Nothing left to echo, only the separator
        writeln!(out)?;
        self.skip(out)
    }

    /// Read and process one line
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn step<R: Read, W: Write>(
        &mut self,
        reader: &mut LineReader<R>,
        out: &mut W,
    ) -> Result<Option<Outcome>, MonitorError<R::Error>> {
        match reader.read_line() {
            Ok(Some(line)) => Ok(Some(self.process_line(line, out)?)),
            Ok(None) => Ok(None),
            Err(LineError::TooLong { first }) => Ok(Some(self.process_overflow(first, out)?)),
            Err(LineError::Read(e)) => Err(MonitorError::Read(e)),
        }
    }

    /// Process lines until the source reports end of stream
    pub fn run<R: Read, W: Write>(
        &mut self,
        reader: &mut LineReader<R>,
        out: &mut W,
    ) -> Result<MonitorStats, MonitorError<R::Error>> {
        while self.step(reader, out)?.is_some() {}
        Ok(self.stats)
    }

    fn skip<W: Write>(&mut self, out: &mut W) -> Result<Outcome, fmt::Error> {
        self.stats.skipped = self.stats.skipped.wrapping_add(1);
        writeln!(out, "  skip")?;
        Ok(Outcome::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;
    use twelite_protocol::{encode_line, CMD_DATA_ARRIVAL, DATA_ARRIVAL_LEN};

    fn io_report() -> [u8; DATA_ARRIVAL_LEN] {
        let mut payload = [0u8; DATA_ARRIVAL_LEN];
        payload[0] = 0x78;
        payload[1] = CMD_DATA_ARRIVAL;
        payload[18..].copy_from_slice(&[0x01, 0xFF, 0xFF, 0x03]);
        payload
    }

    #[test]
    fn test_non_frame_line_is_silent() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        let mut out = String::<64>::new();

        let outcome = monitor.process_line(b"!INF TWELITE APP", &mut out).unwrap();

        assert_eq!(outcome, Outcome::Ignored);
        assert!(out.is_empty());
        assert_eq!(monitor.stats().lines, 1);
        assert_eq!(monitor.stats().frames, 0);
    }

    #[test]
    fn test_generic_frame_block() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        let mut out = String::<256>::new();

        // 0x78 + 0x8B + 0x01 + 0xFC = 0x200
        let outcome = monitor.process_line(b":788B01FC", &mut out).unwrap();

        assert_eq!(outcome, Outcome::Record);
        assert_eq!(
            out.as_str(),
            "\n:788B01FC\n  command = 0x8b (other)\n  src     = 0x78\n  payload = 01 (hex)\n"
        );
    }

    #[test]
    fn test_echo_disabled() {
        let config = MonitorConfig {
            echo_lines: false,
            ..Default::default()
        };
        let mut monitor = Monitor::new(config);
        let mut out = String::<256>::new();

        monitor.process_line(b":788B01FC", &mut out).unwrap();

        assert!(out.starts_with("\n  command = 0x8b (other)\n"));
    }

    #[test]
    fn test_checksum_failure() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        let mut out = String::<64>::new();

        let outcome = monitor.process_line(b":788B01FD", &mut out).unwrap();

        assert_eq!(outcome, Outcome::ChecksumFailed);
        assert_eq!(out.as_str(), "\n:788B01FD\nchecksum ng\n");
        assert_eq!(monitor.stats().checksum_errors, 1);
        assert_eq!(monitor.stats().records, 0);
    }

    #[test]
    fn test_malformed_frames_skip() {
        let mut monitor = Monitor::new(MonitorConfig::default());

        for line in [&b":78G"[..], b":", b":7888", b":\xff\xfe"] {
            let mut out = String::<64>::new();
            let outcome = monitor.process_line(line, &mut out).unwrap();
            assert_eq!(outcome, Outcome::Skipped);
            assert!(out.ends_with("  skip\n"));
        }
        assert_eq!(monitor.stats().skipped, 4);
    }

    #[test]
    fn test_decline_silent_by_default() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        let line = encode_line(&io_report()[..21]).unwrap();
        let mut out = String::<128>::new();

        let outcome = monitor.process_line(line.as_bytes(), &mut out).unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(out.lines().count(), 2); // blank + echo
        assert_eq!(monitor.stats().declined, 1);
    }

    #[test]
    fn test_decline_reported() {
        let config = MonitorConfig {
            report_declines: true,
            ..Default::default()
        };
        let mut monitor = Monitor::new(config);
        let line = encode_line(&io_report()[..21]).unwrap();
        let mut out = String::<256>::new();

        monitor.process_line(line.as_bytes(), &mut out).unwrap();

        assert!(out.ends_with("  declined: command 0x81 needs 22 bytes, got 21\n"));
    }

    #[test]
    fn test_run_until_eof() {
        let report = encode_line(&io_report()).unwrap();
        let mut input = heapless::Vec::<u8, 256>::new();
        input.extend_from_slice(b"boot banner\r\n").unwrap();
        input.extend_from_slice(report.as_bytes()).unwrap();
        input.extend_from_slice(b"\r\n:788B01FD\r\n:78G\r\n").unwrap();

        let mut reader = LineReader::new(&input[..]);
        let mut monitor = Monitor::new(MonitorConfig::default());
        let mut out = String::<1024>::new();

        let stats = monitor.run(&mut reader, &mut out).unwrap();

        assert_eq!(
            stats,
            MonitorStats {
                lines: 4,
                frames: 3,
                records: 1,
                skipped: 1,
                checksum_errors: 1,
                declined: 0,
                overflows: 0,
            }
        );
        assert!(out.contains("  command   = 0x81 (data arrival)\n"));
        assert!(out.contains("  AD1=0028 AD2=-001 AD3=-001 AD4=0048 [mV]\n"));
        assert!(out.contains("checksum ng\n"));
    }

    #[test]
    fn test_overflow_frame_skips() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        let mut out = String::<64>::new();

        assert_eq!(monitor.process_overflow(b':', &mut out).unwrap(), Outcome::Skipped);
        assert_eq!(monitor.process_overflow(b'x', &mut out).unwrap(), Outcome::Ignored);
        assert_eq!(out.as_str(), "\n  skip\n");
        assert_eq!(monitor.stats().overflows, 2);
    }

    #[test]
    fn test_output_error() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        let mut reader = LineReader::new(&b":788B01FC\n"[..]);
        let mut out = String::<4>::new();

        assert_eq!(monitor.run(&mut reader, &mut out), Err(MonitorError::Output));
    }

    #[test]
    fn test_counters_wrap_instead_of_overflowing() {
        let mut monitor = Monitor::new(MonitorConfig::default());
        monitor.stats.lines = u32::MAX;
        monitor.stats.frames = u32::MAX;
        monitor.stats.skipped = u32::MAX;
        monitor.stats.overflows = u32::MAX;
        let mut out = String::<64>::new();

        monitor.process_line(b":78G", &mut out).unwrap();
        monitor.process_overflow(b':', &mut out).unwrap();

        assert_eq!(monitor.stats().lines, 1);
        assert_eq!(monitor.stats().frames, 1);
        assert_eq!(monitor.stats().skipped, 1);
        assert_eq!(monitor.stats().overflows, 0);
    }
}
