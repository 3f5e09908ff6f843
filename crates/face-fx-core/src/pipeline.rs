//! Per-frame analytics and compositing.
//!
//! [`FrameProcessor`] ties the ports and analysis stages together. For each
//! frame it runs the detector, updates the head direction and blink state from
//! every face, composites the overlays, then notifies observers.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::analysis::{BlinkConfig, BlinkStateMachine, HeadPoseClassifier};
use crate::domain::{BlinkEvent, DirectionLabel, Frame};
use crate::error::ConfigError;
use crate::notifier::EventNotifier;
use crate::overlay::{OverlayCompositor, OverlayConfig};
use crate::ports::{DetectorConfig, FaceFeatureSource, ProcessingBlock};

/// Everything needed to build a [`FrameProcessor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    /// Passed to the detector on every frame.
    pub detector: DetectorConfig,
    /// Blink detection tuning.
    pub blink: BlinkConfig,
    /// Head direction classifier.
    pub pose: HeadPoseClassifier,
    /// Overlay geometry and colors.
    pub overlay: OverlayConfig,
}

impl PipelineConfig {
    /// Sets the blink configuration.
    #[must_use]
    pub fn with_blink(mut self, blink: BlinkConfig) -> Self {
        self.blink = blink;
        self
    }

    /// Sets the head pose classifier.
    #[must_use]
    pub const fn with_pose(mut self, pose: HeadPoseClassifier) -> Self {
        self.pose = pose;
        self
    }

    /// Sets the overlay configuration.
    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }

    /// Sets the detector configuration.
    #[must_use]
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }
}

/// What happened while processing one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Sequence number of the processed frame.
    pub sequence: u64,
    /// Faces returned by the detector.
    pub faces: usize,
    /// Blinks completed during this frame.
    pub blinks: Vec<BlinkEvent>,
    /// Total blinks after this frame.
    pub blink_count: u32,
    /// Direction label after this frame.
    pub direction: DirectionLabel,
    /// Whether the detector failed on this frame.
    pub detection_failed: bool,
}

/// Runs detection, analysis and compositing for a stream of frames.
///
/// Calls must be serialized by the caller; `process` takes `&mut self`.
pub struct FrameProcessor {
    detector: Box<dyn FaceFeatureSource>,
    detector_config: DetectorConfig,
    blink: BlinkStateMachine,
    classifier: HeadPoseClassifier,
    direction: DirectionLabel,
    compositor: OverlayCompositor,
    notifier: Arc<EventNotifier>,
}

impl std::fmt::Debug for FrameProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProcessor")
            .field("detector_config", &self.detector_config)
            .field("blink", &self.blink)
            .field("classifier", &self.classifier)
            .field("direction", &self.direction)
            .field("compositor", &self.compositor)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl FrameProcessor {
    /// Builds a processor and all of its stages.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the blink configuration is invalid.
    pub fn new(
        detector: Box<dyn FaceFeatureSource>,
        config: PipelineConfig,
        notifier: Arc<EventNotifier>,
    ) -> Result<Self, ConfigError> {
        config.blink.validate()?;
        debug!(
            algorithm = ?config.blink.algorithm,
            min_closed = config.blink.min_closed,
            max_closed = config.blink.max_closed,
            threshold = config.pose.threshold(),
            "Frame processor ready"
        );
        Ok(Self {
            detector,
            detector_config: config.detector,
            blink: BlinkStateMachine::new(config.blink),
            classifier: config.pose,
            direction: DirectionLabel::default(),
            compositor: OverlayCompositor::new(config.overlay),
            notifier,
        })
    }

    /// Processes one frame and returns the frame to display.
    pub fn process(&mut self, frame: Frame) -> Frame {
        self.process_with_report(frame).0
    }

    /// Processes one frame and also reports what was detected.
    pub fn process_with_report(&mut self, frame: Frame) -> (Frame, FrameReport) {
        let sequence = frame.sequence;
        let faces = match self.detector.detect(&frame, &self.detector_config) {
            Ok(faces) => faces,
            Err(e) => {
                warn!(frame = sequence, "Face detection failed: {e:#}");
                self.notifier.notify_frame(&frame);
                let report = self.report(sequence, 0, Vec::new(), true);
                return (frame, report);
            }
        };
        trace!(frame = sequence, faces = faces.len(), "Faces detected");

        let mut events = Vec::new();
        for face in &faces {
            if let Some((yaw, roll)) = face.pose() {
                self.direction = self.classifier.classify(yaw, roll);
            }
            if let Some(event) = self.blink.ingest(face.eyes_closed()) {
                events.push(event);
            }
        }

        let output =
            self.compositor
                .composite(frame, &faces, self.blink.blink_count(), self.direction);

        for event in &events {
            self.notifier.notify_blink(event.count);
        }
        self.notifier.notify_frame(&output);

        let report = self.report(sequence, faces.len(), events, false);
        (output, report)
    }

    fn report(
        &self,
        sequence: u64,
        faces: usize,
        blinks: Vec<BlinkEvent>,
        detection_failed: bool,
    ) -> FrameReport {
        FrameReport {
            sequence,
            faces,
            blinks,
            blink_count: self.blink.blink_count(),
            direction: self.direction,
            detection_failed,
        }
    }

    /// Total blinks counted so far.
    #[must_use]
    pub const fn blink_count(&self) -> u32 {
        self.blink.blink_count()
    }

    /// Current head direction.
    #[must_use]
    pub const fn direction(&self) -> DirectionLabel {
        self.direction
    }

    /// Shared notifier used for observer delivery.
    #[must_use]
    pub fn notifier(&self) -> &Arc<EventNotifier> {
        &self.notifier
    }

    /// Clears blink state and the direction label.
    pub fn reset(&mut self) {
        self.blink.reset();
        self.direction = DirectionLabel::default();
    }

    /// Wraps the processor as a frame source callback.
    #[must_use]
    pub fn into_processing_block(mut self) -> ProcessingBlock {
        Box::new(move |frame| self.process(frame))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use anyhow::anyhow;
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::domain::{FaceFeature, Point, Rect};
    use crate::ports::BlinkObserver;

    /// Replays scripted detector results, then reports no faces.
    struct Scripted(Mutex<VecDeque<anyhow::Result<Vec<FaceFeature>>>>);

    impl Scripted {
        fn boxed(script: Vec<anyhow::Result<Vec<FaceFeature>>>) -> Box<dyn FaceFeatureSource> {
            Box::new(Self(Mutex::new(script.into())))
        }
    }

    impl FaceFeatureSource for Scripted {
        fn detect(&self, _: &Frame, _: &DetectorConfig) -> anyhow::Result<Vec<FaceFeature>> {
            self.0.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Default)]
    struct Counts(Mutex<Vec<u32>>);

    impl BlinkObserver for Counts {
        fn on_blink_detected(&self, count: u32) {
            self.0.lock().unwrap().push(count);
        }
    }

    fn face(closed: bool, yaw: Option<f32>, roll: Option<f32>) -> FaceFeature {
        FaceFeature {
            bounds: Rect::new(10.0, 10.0, 40.0, 40.0),
            left_eye: Point::new(20.0, 25.0),
            right_eye: Point::new(40.0, 25.0),
            mouth: Point::new(30.0, 40.0),
            left_eye_closed: closed,
            right_eye_closed: closed,
            smiling: false,
            yaw,
            roll,
        }
    }

    fn frame(sequence: u64) -> Frame {
        Frame::new(sequence, RgbaImage::from_pixel(64, 64, Rgba([40, 80, 120, 255])))
    }

    fn processor(script: Vec<anyhow::Result<Vec<FaceFeature>>>) -> FrameProcessor {
        FrameProcessor::new(
            Scripted::boxed(script),
            PipelineConfig::default(),
            Arc::new(EventNotifier::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_blink_config_rejected() {
        let config = PipelineConfig::default().with_blink(BlinkConfig::default().with_range(5, 2));
        let result = FrameProcessor::new(
            Scripted::boxed(Vec::new()),
            config,
            Arc::new(EventNotifier::new()),
        );
        assert!(matches!(result, Err(ConfigError::InvertedRange { .. })));
    }

    #[test]
    fn test_no_faces_passes_frame_through() {
        let mut p = processor(vec![Ok(Vec::new())]);
        let input = frame(1);
        let (output, report) = p.process_with_report(input.clone());
        assert_eq!(output, input);
        assert_eq!(report.faces, 0);
        assert!(!report.detection_failed);
    }

    #[test]
    fn test_detector_failure_keeps_label() {
        let mut p = processor(vec![
            Ok(vec![face(false, Some(0.9), Some(0.0))]),
            Err(anyhow!("camera hiccup")),
        ]);
        p.process(frame(0));
        assert_eq!(p.direction(), DirectionLabel::LookingLeft);

        let input = frame(1);
        let (output, report) = p.process_with_report(input.clone());
        assert_eq!(output, input);
        assert!(report.detection_failed);
        assert_eq!(report.direction, DirectionLabel::LookingLeft);
        assert_eq!(p.direction(), DirectionLabel::LookingLeft);
    }

    #[test]
    fn test_missing_pose_keeps_label() {
        let mut p = processor(vec![
            Ok(vec![face(false, Some(0.0), Some(-0.9))]),
            Ok(vec![face(false, None, Some(0.9))]),
        ]);
        p.process(frame(0));
        assert_eq!(p.direction(), DirectionLabel::HeadTiltedLeft);
        p.process(frame(1));
        assert_eq!(p.direction(), DirectionLabel::HeadTiltedLeft);
    }

    #[test]
    fn test_blink_notifies_once() {
        let mut script = Vec::new();
        for i in 0..10 {
            script.push(Ok(vec![face(i < 3, None, None)]));
        }
        let notifier = Arc::new(EventNotifier::new());
        let counts = Arc::new(Counts::default());
        let as_dyn: Arc<dyn BlinkObserver> = counts.clone();
        notifier.subscribe(Arc::downgrade(&as_dyn));

        let mut p = FrameProcessor::new(
            Scripted::boxed(script),
            PipelineConfig::default(),
            Arc::clone(&notifier),
        )
        .unwrap();

        let mut reports = Vec::new();
        for i in 0..10 {
            reports.push(p.process_with_report(frame(i)).1);
        }

        assert_eq!(*counts.0.lock().unwrap(), vec![1]);
        assert_eq!(p.blink_count(), 1);
        assert_eq!(reports[9].blinks, vec![BlinkEvent::new(1)]);
        assert!(reports[..9].iter().all(|r| r.blinks.is_empty()));
    }

    #[test]
    fn test_every_face_feeds_the_same_history() {
        // Two faces per frame fill the ten-sample window in five frames
        let mut script = Vec::new();
        for i in 0..5 {
            script.push(Ok(vec![face(i == 0, None, None), face(false, None, None)]));
        }
        let mut p = processor(script);
        for i in 0..5 {
            p.process(frame(i));
        }
        // One closed sample is below the default minimum
        assert_eq!(p.blink_count(), 0);
    }

    #[test]
    fn test_processing_block_runs_processor() {
        let mut block = processor(vec![Ok(Vec::new())]).into_processing_block();
        let input = frame(3);
        assert_eq!(block(input.clone()), input);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut p = processor(vec![Ok(vec![face(false, Some(-0.9), Some(0.0))])]);
        p.process(frame(0));
        assert_eq!(p.direction(), DirectionLabel::LookingRight);
        p.reset();
        assert_eq!(p.direction(), DirectionLabel::LookingStraight);
        assert_eq!(p.blink_count(), 0);
    }
}
