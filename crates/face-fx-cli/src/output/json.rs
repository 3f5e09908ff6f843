//! JSON output adapter.

use anyhow::Result;
use face_fx_core::{DirectionLabel, FrameReport};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// One line of run output, describing a processed frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    /// Frame sequence number.
    pub frame: u64,
    /// When the frame finished processing (RFC 3339).
    pub timestamp: String,
    /// Faces found in the frame.
    pub faces: usize,
    /// Blink total after this frame.
    pub blink_count: u32,
    /// Direction of the last face with pose data.
    pub direction: DirectionLabel,
    /// Whether this frame completed a blink.
    pub blink: bool,
    /// Set when the detector failed on this frame.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub detection_failed: bool,
}

impl FrameRecord {
    /// Builds the record for a processed frame.
    #[must_use]
    pub fn from_report(report: &FrameReport, timestamp: String) -> Self {
        Self {
            frame: report.sequence,
            timestamp,
            faces: report.faces,
            blink_count: report.blink_count,
            direction: report.direction,
            blink: !report.blinks.is_empty(),
            detection_failed: report.detection_failed,
        }
    }
}

/// JSON Lines output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one record as a single JSON line.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write(&self, record: &FrameRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    /// Writes a batch of records as a JSON array.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_array(&self, records: &[FrameRecord], pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
