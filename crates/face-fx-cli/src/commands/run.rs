//! Run command - replay a recorded camera session through the pipeline.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use face_fx_adapters::{DirectoryFrameSource, RecordedFeatureSource};
use face_fx_core::{
    BlinkAlgorithm, BlinkConfig, BlinkObserver, DetectorConfig, EventNotifier, FrameObserver,
    FrameProcessor, FrameReport, FrameSource, HeadPoseClassifier, OverlayConfig, PipelineConfig,
};
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{FrameRecord, JsonOutput, ProgressBar};

/// How often the reporting loop checks whether delivery has ended.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Output format for frame records.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Blink detection algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// Count closed samples in a full sliding window
    SlidingWindow,
    /// Closed sample followed by an open one
    FallingEdge,
}

impl From<AlgorithmArg> for BlinkAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::SlidingWindow => Self::SlidingWindow,
            AlgorithmArg::FallingEdge => Self::FallingEdge,
        }
    }
}

/// Parse and validate a frame rate.
fn parse_fps(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a non-negative frame rate"))
    }
}

/// Parse and validate an angle threshold.
fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a non-negative angle"))
    }
}

/// Arguments for replaying a session.
#[derive(Args, Clone)]
pub struct RunArgs {
    /// Directory of frame images, played in file name order
    pub frames: Option<PathBuf>,

    /// Recorded face detections (JSON Lines, one record per frame)
    #[arg(short, long, value_name = "FILE")]
    pub features: Option<PathBuf>,

    /// Write composited frames as PNG into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Delivery rate in frames per second (0 = as fast as possible)
    #[arg(long, value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Blink detection algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Minimum closed samples in a full window
    #[arg(long)]
    pub min_closed: Option<usize>,

    /// Maximum closed samples in a full window
    #[arg(long)]
    pub max_closed: Option<usize>,

    /// Yaw/roll threshold for head direction
    #[arg(long, value_parser = parse_threshold)]
    pub pose_threshold: Option<f32>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl RunArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Library defaults
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        args.fps = args.fps.or(config.general.fps);
        if args.output.is_none() {
            args.output.clone_from(&config.output.dir);
        }

        args.algorithm = args.algorithm.or(match config.blink.algorithm {
            Some(BlinkAlgorithm::FallingEdge) => Some(AlgorithmArg::FallingEdge),
            Some(_) => Some(AlgorithmArg::SlidingWindow),
            None => None,
        });
        args.min_closed = args.min_closed.or(config.blink.min_closed);
        args.max_closed = args.max_closed.or(config.blink.max_closed);
        args.pose_threshold = args.pose_threshold.or(config.pose.threshold);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        // Boolean output options: CLI flag wins, then config
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        // Kept for the settings that have no CLI flag
        args.config = Some(config.clone());
        args
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }

    /// Builds the pipeline configuration from merged args and config.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let config = self.config.clone().unwrap_or_default();

        let mut blink = BlinkConfig::default();
        if let Some(algorithm) = self.algorithm {
            blink = blink.with_algorithm(algorithm.into());
        }
        if let Some(window) = config.blink.window {
            blink.window = window;
        }
        let min_closed = self.min_closed.unwrap_or(blink.min_closed);
        let max_closed = self.max_closed.unwrap_or(blink.max_closed);
        blink = blink.with_range(min_closed, max_closed);
        if let Some(cooldown) = config.blink.cooldown_frames {
            blink = blink.with_cooldown(cooldown);
        }

        let mut pipeline = PipelineConfig::default()
            .with_blink(blink)
            .with_detector(detector_config(&config))
            .with_overlay(overlay_config(&config));
        if let Some(threshold) = self.pose_threshold {
            pipeline = pipeline.with_pose(
                HeadPoseClassifier::with_threshold(threshold)
                    .context("Invalid head pose threshold")?,
            );
        }

        debug!("Pipeline configuration: {pipeline:?}");
        Ok(pipeline)
    }
}

fn detector_config(config: &AppConfig) -> DetectorConfig {
    let section = &config.detector;
    let defaults = DetectorConfig::default();
    DetectorConfig {
        accuracy: section.accuracy.unwrap_or(defaults.accuracy),
        max_faces: section.max_faces.unwrap_or(defaults.max_faces),
        min_feature_size: section.min_feature_size.unwrap_or(defaults.min_feature_size),
        tracking: section.tracking.unwrap_or(defaults.tracking),
        detect_smiles: section.detect_smiles.unwrap_or(defaults.detect_smiles),
        detect_eye_blinks: section.detect_eye_blinks.unwrap_or(defaults.detect_eye_blinks),
    }
}

fn overlay_config(config: &AppConfig) -> OverlayConfig {
    let section = &config.overlay;
    let mut overlay = OverlayConfig::default();
    overlay.hue_angle = section.hue_angle.unwrap_or(overlay.hue_angle);
    overlay.face_height_increase = section
        .face_height_increase
        .unwrap_or(overlay.face_height_increase);
    overlay.face_top_offset = section.face_top_offset.unwrap_or(overlay.face_top_offset);
    overlay.eye_inner_radius = section.eye_inner_radius.unwrap_or(overlay.eye_inner_radius);
    overlay.eye_outer_radius = section.eye_outer_radius.unwrap_or(overlay.eye_outer_radius);
    overlay.mouth_size = section.mouth_size.unwrap_or(overlay.mouth_size);
    overlay.saturation = section.saturation.unwrap_or(overlay.saturation);
    overlay.brightness = section.brightness.unwrap_or(overlay.brightness);
    overlay.text_scale = section.text_scale.unwrap_or(overlay.text_scale);
    overlay.smile_scale = section.smile_scale.unwrap_or(overlay.smile_scale);
    overlay
}

/// Result of running the run command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct RunResult {
    /// Frames processed.
    pub frames: usize,
    /// Frames whose detection failed.
    pub detection_failures: usize,
    /// Blink total at the end of the session.
    pub blinks: u32,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the run command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &RunArgs) -> Result<RunResult> {
    let Some(frames_dir) = args.frames.as_ref() else {
        bail!("No frames directory specified");
    };
    let Some(features_path) = args.features.as_ref() else {
        bail!("No feature recording specified (use --features FILE)");
    };
    info!("Replaying {}", frames_dir.display());

    let pipeline = args.pipeline_config()?;
    let detector = RecordedFeatureSource::open(features_path)?;

    let mut source = DirectoryFrameSource::new(frames_dir)?.with_fps(args.fps.unwrap_or(0.0));
    if let Some(dir) = &args.output {
        source = source.with_output_dir(dir);
    }
    if source.frame_count() == 0 {
        bail!("No frame images found in {}", frames_dir.display());
    }

    // Determine if we should show progress
    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = Arc::new(ProgressBar::new(
        source.frame_count() as u64,
        args.quiet,
        show_progress,
    ));

    // The notifier only holds weak handles; these Arcs keep the bar alive
    let notifier = Arc::new(EventNotifier::new());
    let frame_observer: Arc<dyn FrameObserver> = progress.clone();
    let blink_observer: Arc<dyn BlinkObserver> = progress.clone();
    notifier.subscribe_frames(Arc::downgrade(&frame_observer));
    notifier.subscribe(Arc::downgrade(&blink_observer));

    let mut processor = FrameProcessor::new(Box::new(detector), pipeline, notifier)
        .context("Invalid pipeline configuration")?;

    let (tx, rx) = mpsc::channel::<FrameReport>();
    source.set_processing_block(Box::new(move |frame| {
        let (frame, report) = processor.process_with_report(frame);
        if tx.send(report).is_err() {
            debug!("Report receiver closed, dropping frame report");
        }
        frame
    }));

    let output = JsonOutput::stdout();
    let mut summary = Summary::default();
    let mut collected: Vec<FrameRecord> = Vec::new();

    source.start()?;
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(report) => {
                progress.report(&report);
                summary.emit(&report, &output, args.format(), &mut collected)?;
            }
            Err(RecvTimeoutError::Timeout) if source.is_running() => {}
            Err(_) => break,
        }
    }
    let stats = source.wait()?;
    // Reports sent between the last poll and the worker exiting
    for report in rx.try_iter() {
        progress.report(&report);
        summary.emit(&report, &output, args.format(), &mut collected)?;
    }

    if matches!(args.format(), OutputFormat::Json) {
        output.write_array(&collected, args.pretty)?;
    }
    output.flush()?;

    progress.finish(summary.frames, summary.blinks);
    info!(
        frames = summary.frames,
        skipped = stats.skipped,
        written = stats.written,
        blinks = summary.blinks,
        "Replay finished"
    );

    Ok(RunResult {
        frames: summary.frames,
        detection_failures: summary.detection_failures,
        blinks: summary.blinks,
        exit_code: ExitCode::Success,
    })
}

/// Running totals over emitted frame records.
#[derive(Default)]
struct Summary {
    frames: usize,
    detection_failures: usize,
    blinks: u32,
}

impl Summary {
    fn emit(
        &mut self,
        report: &FrameReport,
        output: &JsonOutput,
        format: OutputFormat,
        collected: &mut Vec<FrameRecord>,
    ) -> Result<()> {
        self.frames += 1;
        self.blinks = report.blink_count;
        if report.detection_failed {
            self.detection_failures += 1;
        }

        let record = FrameRecord::from_report(report, iso_timestamp());
        match format {
            OutputFormat::Jsonl => output.write(&record)?,
            OutputFormat::Json => collected.push(record),
        }
        Ok(())
    }
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
