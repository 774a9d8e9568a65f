//! Readings log sink
//!
//! Every accepted cycle appends one line with the normalized color:
//!
//! ```text
//! 0.9534626, 0.21187, 0.21187
//! 0.09245003, 0.97072536, 0.2218801 --> G
//! ```
//!
//! The label suffix is only written when label logging is enabled.

use core::fmt::Write as _;

use heapless::String;

use crate::classify::ColorLabel;
use crate::sampling::NormalizedColor;

/// Longest line the log formats (three floats, separators, label)
pub const LINE_CAPACITY: usize = 96;

/// Errors that can occur when appending to the readings log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogError {
    /// Underlying writer failed
    Write,
    /// Line did not fit the format buffer
    Format,
    /// Log was already closed
    Closed,
}

/// One accepted cycle as written to the log
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogRecord {
    /// Normalized color of the batch
    pub color: NormalizedColor,
    /// Resolved label, when label logging is enabled
    pub label: Option<ColorLabel>,
}

impl LogRecord {
    /// Format the record as one log line including the trailing newline
    pub fn write_line<W: core::fmt::Write>(&self, out: &mut W) -> core::fmt::Result {
        let [r, g, b] = self.color.components();
        write!(out, "{}, {}, {}", r, g, b)?;
        if let Some(label) = self.label {
            write!(out, " --> {}", label.as_char())?;
        }
        out.write_char('\n')
    }
}

/// Append-only sink for accepted readings
///
/// The request loop owns the sink for its whole lifetime and calls
/// [`ReadingLog::close`] on every exit path.
pub trait ReadingLog {
    /// Append one record
    fn append(&mut self, record: &LogRecord) -> Result<(), LogError>;

    /// Flush and release the sink
    ///
    /// Calling close on an already closed sink is a no-op.
    fn close(&mut self) -> Result<(), LogError> {
        Ok(())
    }
}

/// Line-oriented log over any `embedded_io::Write` (UART, file adapter)
pub struct LineLog<W> {
    writer: W,
    open: bool,
    lines: u32,
}

impl<W: embedded_io::Write> LineLog<W> {
    /// Wrap an open writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            open: true,
            lines: 0,
        }
    }

    /// Number of lines appended so far
    pub fn lines_written(&self) -> u32 {
        self.lines
    }

    /// Check if the log still accepts records
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Borrow the underlying writer
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: embedded_io::Write> ReadingLog for LineLog<W> {
    fn append(&mut self, record: &LogRecord) -> Result<(), LogError> {
        if !self.open {
            return Err(LogError::Closed);
        }

        let mut line: String<LINE_CAPACITY> = String::new();
        record.write_line(&mut line).map_err(|_| LogError::Format)?;

        self.writer
            .write_all(line.as_bytes())
            .map_err(|_| LogError::Write)?;
        self.lines = self.lines.saturating_add(1);
        Ok(())
    }

    fn close(&mut self) -> Result<(), LogError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.writer.flush().map_err(|_| LogError::Write)
    }
}
