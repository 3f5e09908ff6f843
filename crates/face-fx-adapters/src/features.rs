//! Replays face detections recorded as JSON Lines.
//!
//! Each line describes one frame:
//!
//! ```text
//! {"frame": 0, "faces": [{"bounds": {...}, "left_eye": {...}, ...}]}
//! {"frame": 1, "error": "tracking lost"}
//! ```
//!
//! Frames without a line have no faces.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use face_fx_core::domain::{FaceFeature, Frame};
use face_fx_core::ports::{DetectorConfig, FaceFeatureSource};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct Record {
    frame: u64,
    #[serde(default)]
    faces: Vec<FaceFeature>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
enum Entry {
    Faces(Vec<FaceFeature>),
    Failure(String),
}

/// Feature source backed by a recorded detection session.
#[derive(Debug, Clone, Default)]
pub struct RecordedFeatureSource {
    entries: HashMap<u64, Entry>,
}

impl RecordedFeatureSource {
    /// Loads a recording from a JSON Lines file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open feature recording: {}", path.display()))?;
        let source = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid feature recording: {}", path.display()))?;
        debug!(
            "Loaded {} recorded frames from {}",
            source.len(),
            path.display()
        );
        Ok(source)
    }

    /// Parses a recording from any buffered reader.
    ///
    /// Blank lines are ignored. A frame listed twice keeps its last record.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if a line is not a valid record.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut entries = HashMap::new();
        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.with_context(|| format!("Failed to read line {line_no}"))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record: Record = serde_json::from_str(trimmed)
                .with_context(|| format!("Malformed record on line {line_no}"))?;
            let entry = match record.error {
                Some(message) => Entry::Failure(message),
                None => Entry::Faces(record.faces),
            };
            if entries.insert(record.frame, entry).is_some() {
                warn!(
                    frame = record.frame,
                    line = line_no,
                    "Duplicate frame record, keeping the later one"
                );
            }
        }
        Ok(Self { entries })
    }

    /// Number of frames with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the recording holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FaceFeatureSource for RecordedFeatureSource {
    fn detect(&self, frame: &Frame, config: &DetectorConfig) -> Result<Vec<FaceFeature>> {
        let faces = match self.entries.get(&frame.sequence) {
            None => return Ok(Vec::new()),
            Some(Entry::Failure(message)) => {
                bail!("recorded detector failure on frame {}: {message}", frame.sequence)
            }
            Some(Entry::Faces(faces)) => faces,
        };

        let faces = faces
            .iter()
            .take(config.max_faces)
            .cloned()
            .map(|mut face| {
                if !config.detect_smiles {
                    face.smiling = false;
                }
                if !config.detect_eye_blinks {
                    face.left_eye_closed = false;
                    face.right_eye_closed = false;
                }
                face
            })
            .collect();
        Ok(faces)
    }
}
