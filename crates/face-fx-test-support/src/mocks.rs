//! Mock implementations of core port traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use face_fx_core::domain::{FaceFeature, Frame};
use face_fx_core::ports::{
    BlinkObserver, DetectorConfig, FaceFeatureSource, FrameObserver, FrameSource, ProcessingBlock,
};

/// One scripted detector result.
#[derive(Debug, Clone)]
enum Detection {
    Faces(Vec<FaceFeature>),
    Failure(String),
}

/// Mock implementation of `FaceFeatureSource` for testing.
///
/// Replays scripted results in call order, then reports no faces. Cloned
/// handles share the script and the call log.
#[derive(Debug, Clone, Default)]
pub struct MockFeatureSource {
    script: Arc<Mutex<VecDeque<Detection>>>,
    calls: Arc<Mutex<Vec<u64>>>,
}

impl MockFeatureSource {
    /// Creates a source that returns each entry of `frames` in turn.
    #[must_use]
    pub fn new(frames: Vec<Vec<FaceFeature>>) -> Self {
        let source = Self::default();
        for faces in frames {
            source.push_faces(faces);
        }
        source
    }

    /// Creates a source that never finds a face.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Queues a successful detection.
    pub fn push_faces(&self, faces: Vec<FaceFeature>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Detection::Faces(faces));
    }

    /// Queues a detector failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Detection::Failure(message.into()));
    }

    /// Sequence numbers of every frame passed to `detect`.
    #[must_use]
    pub fn calls(&self) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FaceFeatureSource for MockFeatureSource {
    fn detect(&self, frame: &Frame, _config: &DetectorConfig) -> anyhow::Result<Vec<FaceFeature>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.sequence);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Detection::Faces(faces)) => Ok(faces),
            Some(Detection::Failure(message)) => bail!(message),
            None => Ok(Vec::new()),
        }
    }
}

/// Mock implementation of `BlinkObserver` for testing.
///
/// Captures every notified count for later assertions.
#[derive(Debug, Default)]
pub struct RecordingBlinkObserver {
    counts: Mutex<Vec<u32>>,
}

impl RecordingBlinkObserver {
    /// Creates a shared observer.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns all captured counts.
    #[must_use]
    pub fn counts(&self) -> Vec<u32> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BlinkObserver for RecordingBlinkObserver {
    fn on_blink_detected(&self, count: u32) {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(count);
    }
}

/// Mock implementation of `FrameObserver` for testing.
///
/// Captures the sequence number of every processed frame and keeps the most
/// recent frame.
#[derive(Debug, Default)]
pub struct RecordingFrameObserver {
    sequences: Mutex<Vec<u64>>,
    last: Mutex<Option<Frame>>,
}

impl RecordingFrameObserver {
    /// Creates a shared observer.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sequence numbers seen so far.
    #[must_use]
    pub fn sequences(&self) -> Vec<u64> {
        self.sequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently processed frame.
    #[must_use]
    pub fn last_frame(&self) -> Option<Frame> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FrameObserver for RecordingFrameObserver {
    fn on_frame_processed(&self, frame: &Frame) {
        self.sequences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.sequence);
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
    }
}

/// Mock implementation of `FrameSource` for testing.
///
/// Delivers its frames synchronously inside `start` and keeps the frames the
/// processing block returned.
pub struct MockFrameSource {
    frames: Vec<Frame>,
    block: Option<ProcessingBlock>,
    output: Arc<Mutex<Vec<Frame>>>,
    running: bool,
    start_count: usize,
}

impl MockFrameSource {
    /// Creates a source that will deliver `frames` in order.
    #[must_use]
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            block: None,
            output: Arc::new(Mutex::new(Vec::new())),
            running: false,
            start_count: 0,
        }
    }

    /// Frames returned by the processing block, in delivery order.
    #[must_use]
    pub fn output(&self) -> Vec<Frame> {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `start` succeeded.
    #[must_use]
    pub const fn start_count(&self) -> usize {
        self.start_count
    }
}

impl FrameSource for MockFrameSource {
    fn set_processing_block(&mut self, block: ProcessingBlock) {
        self.block = Some(block);
    }

    fn start(&mut self) -> anyhow::Result<()> {
        let Some(block) = self.block.as_mut() else {
            bail!("no processing block set");
        };
        self.running = true;
        self.start_count += 1;
        for frame in self.frames.clone() {
            let processed = block(frame);
            self.output
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(processed);
        }
        self.running = false;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
