//! Durable, line-oriented event log.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::errors::CatalogError;
use crate::event::Severity;

/// Append-only event log, one `[TAG] text` line per event.
///
/// Not synchronized; `EventReporter` owns it behind a mutex.
pub struct EventLog {
    writer: Box<dyn Write + Send>,
}

impl EventLog {
    /// Open `path` for logging, truncating any previous content.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Log into an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Log that drops every line.
    pub fn discard() -> Self {
        Self::from_writer(io::sink())
    }

    /// Append one line and flush it through to the underlying writer.
    pub fn append(&mut self, severity: Severity, text: &str) -> io::Result<()> {
        self.writer.write_all(format_line(severity, text).as_bytes())?;
        self.writer.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Render a log line including its trailing newline.
pub fn format_line(severity: Severity, text: &str) -> String {
    format!("[{}] {}\n", severity.tag(), text)
}
