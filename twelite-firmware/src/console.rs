//! Line-buffered text sink over the defmt console

use core::fmt;

use heapless::String;
use twelite_monitor::MAX_LINE_LEN;

/// Collects monitor output and prints it one line at a time
///
/// A line longer than the buffer is printed in pieces.
pub struct DefmtConsole {
    line: String<{ MAX_LINE_LEN + 16 }>,
}

impl DefmtConsole {
    pub const fn new() -> Self {
        Self { line: String::new() }
    }

    fn flush_line(&mut self) {
        defmt::println!("{=str}", self.line.as_str());
        self.line.clear();
    }
}

impl fmt::Write for DefmtConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if c == '\n' {
                self.flush_line();
                continue;
            }
            if self.line.push(c).is_err() {
                self.flush_line();
                self.line.push(c).map_err(|_| fmt::Error)?;
            }
        }
        Ok(())
    }
}
