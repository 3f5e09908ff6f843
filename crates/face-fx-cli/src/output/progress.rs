//! Progress bar adapter using indicatif.

use face_fx_core::{BlinkObserver, Frame, FrameObserver, FrameReport};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Progress bar adapter for CLI output.
///
/// Subscribed to the pipeline's notifier, it advances once per composited
/// frame and shows the running blink total. The observer callbacks run on the
/// frame-processing thread and only touch the bar. Without a bar, blinks are
/// printed by [`ProgressBar::report`] on the thread draining frame reports.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Total number of frames
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, show progress bar; otherwise print each blink
    #[must_use]
    pub fn new(total: u64, quiet: bool, show_bar: bool) -> Self {
        if quiet {
            return Self {
                bar: None,
                quiet: true,
            };
        }

        let bar = show_bar.then(|| {
            let bar = IndicatifBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            ) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }

    /// Prints the blinks completed in `report` when no bar is shown.
    pub fn report(&self, report: &FrameReport) {
        if self.quiet || self.bar.is_some() {
            return;
        }
        for line in blink_lines(report) {
            eprintln!("{line}");
        }
    }

    /// Finishes the bar with a summary line.
    pub fn finish(&self, frames: usize, blinks: u32) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(format!("Done: {frames} frames, {blinks} blinks"));
        }
    }
}

impl FrameObserver for ProgressBar {
    fn on_frame_processed(&self, _frame: &Frame) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }
}

impl BlinkObserver for ProgressBar {
    fn on_blink_detected(&self, count: u32) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{count} blinks"));
        }
    }
}

/// One status line per blink completed in `report`.
fn blink_lines(report: &FrameReport) -> Vec<String> {
    report
        .blinks
        .iter()
        .map(|event| format!("blink {}", event.count))
        .collect()
}

#[cfg(test)]
mod tests {
    use face_fx_core::{BlinkEvent, DirectionLabel};

    use super::*;

    fn report(blinks: Vec<BlinkEvent>) -> FrameReport {
        FrameReport {
            sequence: 4,
            faces: 2,
            blink_count: 2,
            blinks,
            direction: DirectionLabel::LookingStraight,
            detection_failed: false,
        }
    }

    #[test]
    fn test_blink_lines() {
        assert!(blink_lines(&report(Vec::new())).is_empty());
        assert_eq!(
            blink_lines(&report(vec![BlinkEvent::new(1), BlinkEvent::new(2)])),
            vec!["blink 1".to_string(), "blink 2".to_string()]
        );
    }

    #[test]
    fn test_observer_callback_without_bar_is_silent() {
        // Nothing to draw and nothing printed from the processing thread
        let progress = ProgressBar::new(10, false, false);
        progress.on_blink_detected(3);
        progress.on_frame_processed(&Frame::new(0, image::RgbaImage::new(2, 2)));
        assert!(progress.bar.is_none());
    }
}
