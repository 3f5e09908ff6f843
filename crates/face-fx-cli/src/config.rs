//! Configuration file support for face-fx.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/face-fx/config.toml` (lowest priority)
//! - Project-local: `.face-fx.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use face_fx_core::overlay::text::MAX_SCALE;
use face_fx_core::{BlinkAlgorithm, DetectorAccuracy};
use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Blink detection settings.
    pub blink: BlinkSection,
    /// Head pose settings.
    pub pose: PoseSection,
    /// Face detector settings.
    pub detector: DetectorSection,
    /// Overlay geometry and colors.
    pub overlay: OverlaySection,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Frame delivery rate; 0 delivers as fast as possible.
    pub fps: Option<f32>,
}

/// Blink detection configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BlinkSection {
    /// Detection algorithm: "sliding-window" or "falling-edge".
    pub algorithm: Option<BlinkAlgorithm>,
    /// Sliding window size in samples.
    pub window: Option<usize>,
    /// Minimum closed samples in a full window.
    pub min_closed: Option<usize>,
    /// Maximum closed samples in a full window.
    pub max_closed: Option<usize>,
    /// Samples ignored after each blink.
    pub cooldown_frames: Option<u32>,
}

/// Head pose configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PoseSection {
    /// Absolute yaw/roll beyond which the head counts as turned.
    pub threshold: Option<f32>,
}

/// Face detector configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// Accuracy: "low" or "high".
    pub accuracy: Option<DetectorAccuracy>,
    /// Maximum faces per frame.
    pub max_faces: Option<usize>,
    /// Minimum face size as a fraction of the frame (0.0-1.0).
    pub min_feature_size: Option<f32>,
    /// Track faces across frames.
    pub tracking: Option<bool>,
    /// Evaluate the smiling flag.
    pub detect_smiles: Option<bool>,
    /// Evaluate the eye-closed flags.
    pub detect_eye_blinks: Option<bool>,
}

/// Overlay configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OverlaySection {
    /// Face hue rotation in radians.
    pub hue_angle: Option<f32>,
    /// Extra height added to the face highlight.
    pub face_height_increase: Option<f32>,
    /// Offset of the highlight above the face box.
    pub face_top_offset: Option<f32>,
    /// Opaque eye gradient radius.
    pub eye_inner_radius: Option<f32>,
    /// Transparent eye gradient radius.
    pub eye_outer_radius: Option<f32>,
    /// Side of the mouth window.
    pub mouth_size: Option<f32>,
    /// Mouth saturation multiplier.
    pub saturation: Option<f32>,
    /// Mouth brightness offset.
    pub brightness: Option<f32>,
    /// Status text scale.
    pub text_scale: Option<u32>,
    /// Smile bump strength.
    pub smile_scale: Option<f32>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
    /// Directory for composited frames.
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/face-fx/config.toml`
    /// 2. Project-local: `.face-fx.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load XDG config (lowest priority)
        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        // Load project-local config (higher priority, merged)
        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(fps) = self.general.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(format!("general.fps must be a non-negative number, got {fps}"));
            }
        }

        if self.blink.window == Some(0) {
            return Err("blink.window must be at least 1".to_string());
        }
        if let (Some(min), Some(max)) = (self.blink.min_closed, self.blink.max_closed) {
            if min > max {
                return Err(format!(
                    "blink.min_closed ({min}) must not exceed blink.max_closed ({max})"
                ));
            }
        }

        if let Some(t) = self.pose.threshold {
            if t.is_nan() || t < 0.0 {
                return Err(format!("pose.threshold must be non-negative, got {t}"));
            }
        }

        if self.detector.max_faces == Some(0) {
            return Err("detector.max_faces must be at least 1".to_string());
        }
        if let Some(size) = self.detector.min_feature_size {
            if !(0.0..=1.0).contains(&size) {
                return Err(format!(
                    "detector.min_feature_size must be 0.0-1.0, got {size}"
                ));
            }
        }

        for (name, radius) in [
            ("overlay.eye_inner_radius", self.overlay.eye_inner_radius),
            ("overlay.eye_outer_radius", self.overlay.eye_outer_radius),
            ("overlay.mouth_size", self.overlay.mouth_size),
        ] {
            if let Some(r) = radius {
                if !r.is_finite() || r < 0.0 {
                    return Err(format!("{name} must be non-negative, got {r}"));
                }
            }
        }
        if let Some(scale) = self.overlay.text_scale {
            if !(1..=MAX_SCALE).contains(&scale) {
                return Err(format!(
                    "overlay.text_scale must be 1-{MAX_SCALE}, got {scale}"
                ));
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                return Err(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // General
        self.general.fps = other.general.fps.or(self.general.fps);

        // Blink
        self.blink.algorithm = other.blink.algorithm.or(self.blink.algorithm);
        self.blink.window = other.blink.window.or(self.blink.window);
        self.blink.min_closed = other.blink.min_closed.or(self.blink.min_closed);
        self.blink.max_closed = other.blink.max_closed.or(self.blink.max_closed);
        self.blink.cooldown_frames = other
            .blink
            .cooldown_frames
            .or(self.blink.cooldown_frames);

        // Pose
        self.pose.threshold = other.pose.threshold.or(self.pose.threshold);

        // Detector
        self.detector.accuracy = other.detector.accuracy.or(self.detector.accuracy);
        self.detector.max_faces = other.detector.max_faces.or(self.detector.max_faces);
        self.detector.min_feature_size = other
            .detector
            .min_feature_size
            .or(self.detector.min_feature_size);
        self.detector.tracking = other.detector.tracking.or(self.detector.tracking);
        self.detector.detect_smiles = other
            .detector
            .detect_smiles
            .or(self.detector.detect_smiles);
        self.detector.detect_eye_blinks = other
            .detector
            .detect_eye_blinks
            .or(self.detector.detect_eye_blinks);

        // Overlay
        let (mine, theirs) = (&mut self.overlay, other.overlay);
        mine.hue_angle = theirs.hue_angle.or(mine.hue_angle);
        mine.face_height_increase = theirs.face_height_increase.or(mine.face_height_increase);
        mine.face_top_offset = theirs.face_top_offset.or(mine.face_top_offset);
        mine.eye_inner_radius = theirs.eye_inner_radius.or(mine.eye_inner_radius);
        mine.eye_outer_radius = theirs.eye_outer_radius.or(mine.eye_outer_radius);
        mine.mouth_size = theirs.mouth_size.or(mine.mouth_size);
        mine.saturation = theirs.saturation.or(mine.saturation);
        mine.brightness = theirs.brightness.or(mine.brightness);
        mine.text_scale = theirs.text_scale.or(mine.text_scale);
        mine.smile_scale = theirs.smile_scale.or(mine.smile_scale);

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
        self.output.dir = other.output.dir.or_else(|| self.output.dir.take());
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("face-fx").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.face-fx.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".face-fx.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
