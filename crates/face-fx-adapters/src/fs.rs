//! Filesystem adapter that plays a directory of images as a camera.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use face_fx_core::domain::Frame;
use face_fx_core::ports::{FrameSource, ProcessingBlock};
use tracing::{debug, info, warn};

/// Supported image extensions.
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Counters for one delivery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Frames handed to the processing block.
    pub delivered: usize,
    /// Files that could not be decoded.
    pub skipped: usize,
    /// Processed frames written to the output directory.
    pub written: usize,
}

/// Holds the processing block between runs. The worker borrows it for the
/// length of a delivery and puts it back afterwards.
type BlockSlot = Arc<Mutex<Option<ProcessingBlock>>>;

struct Worker {
    handle: JoinHandle<Result<DeliveryStats>>,
}

/// Frame source that decodes the images in a directory, in file name order,
/// and delivers them on a worker thread.
///
/// The file at sorted position `n` becomes frame `n`.
pub struct DirectoryFrameSource {
    files: Arc<Vec<PathBuf>>,
    fps: f32,
    output_dir: Option<PathBuf>,
    block: BlockSlot,
    worker: Option<Worker>,
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    last_stats: DeliveryStats,
}

impl DirectoryFrameSource {
    /// Scans `dir` for frame images.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory: {}", dir.display()))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_supported_frame(path))
            .collect();
        files.sort();
        debug!("Found {} frame files in {}", files.len(), dir.display());

        Ok(Self {
            files: Arc::new(files),
            fps: 0.0,
            output_dir: None,
            block: Arc::new(Mutex::new(None)),
            worker: None,
            stop: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            last_stats: DeliveryStats::default(),
        })
    }

    /// Sets the delivery rate. Zero or less delivers as fast as frames are
    /// processed.
    #[must_use]
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Writes every processed frame as PNG into `dir`.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Number of frame files found.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    /// Frame files in delivery order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Blocks until every frame has been delivered or the source was
    /// stopped, and returns the run's counters.
    ///
    /// # Errors
    ///
    /// Returns an error if writing an output frame failed or the worker
    /// panicked.
    pub fn wait(&mut self) -> Result<DeliveryStats> {
        let Some(worker) = self.worker.take() else {
            return Ok(self.last_stats);
        };
        let result = worker.handle.join();
        self.running.store(false, Ordering::SeqCst);
        let stats = result.map_err(|_| anyhow!("frame delivery thread panicked"))??;
        self.last_stats = stats;
        info!(
            delivered = stats.delivered,
            skipped = stats.skipped,
            written = stats.written,
            "Frame delivery finished"
        );
        Ok(stats)
    }

    fn frame_interval(&self) -> Option<Duration> {
        (self.fps > 0.0 && self.fps.is_finite()).then(|| Duration::from_secs_f32(1.0 / self.fps))
    }

    /// Starts delivery on a thread obtained from `spawn`. A failed spawn
    /// leaves the source stopped with its processing block still set.
    fn start_with<F>(&mut self, spawn: F) -> Result<()>
    where
        F: FnOnce(Delivery) -> io::Result<JoinHandle<Result<DeliveryStats>>>,
    {
        if self.worker.is_some() {
            bail!("frame source is already running");
        }
        if lock(&self.block).is_none() {
            bail!("no processing block set");
        }
        if let Some(dir) = &self.output_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }

        self.stop.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        let delivery = Delivery {
            files: Arc::clone(&self.files),
            interval: self.frame_interval(),
            output_dir: self.output_dir.clone(),
            block: Arc::clone(&self.block),
            stop: Arc::clone(&self.stop),
            running: Arc::clone(&self.running),
        };

        match spawn(delivery) {
            Ok(handle) => {
                self.worker = Some(Worker { handle });
                info!("Delivering {} frames", self.files.len());
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e).context("Failed to spawn frame delivery thread")
            }
        }
    }
}

impl FrameSource for DirectoryFrameSource {
    fn set_processing_block(&mut self, block: ProcessingBlock) {
        *lock(&self.block) = Some(block);
    }

    fn start(&mut self) -> Result<()> {
        self.start_with(|delivery| {
            thread::Builder::new()
                .name("frame-source".into())
                .spawn(move || delivery.run())
        })
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Err(e) = self.wait() {
            warn!("Frame delivery ended with an error: {e:#}");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for DirectoryFrameSource {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

/// State moved onto the worker thread.
struct Delivery {
    files: Arc<Vec<PathBuf>>,
    interval: Option<Duration>,
    output_dir: Option<PathBuf>,
    block: BlockSlot,
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl Delivery {
    fn run(self) -> Result<DeliveryStats> {
        let taken = lock(&self.block).take();
        let result = match taken {
            Some(mut block) => {
                let result = self.deliver(&mut block);
                // A block installed during the run replaces this one
                let mut slot = lock(&self.block);
                if slot.is_none() {
                    *slot = Some(block);
                }
                result
            }
            None => Err(anyhow!("no processing block set")),
        };
        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn deliver(&self, block: &mut ProcessingBlock) -> Result<DeliveryStats> {
        let mut stats = DeliveryStats::default();
        let started = Instant::now();

        for (index, path) in self.files.iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                debug!("Frame delivery stopped after {} frames", stats.delivered);
                break;
            }
            if let Some(interval) = self.interval {
                let due = interval.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
                if let Some(wait) = due.checked_sub(started.elapsed()) {
                    thread::sleep(wait);
                }
            }

            let image = match image::open(path) {
                Ok(image) => image.to_rgba8(),
                Err(e) => {
                    warn!("Skipping unreadable frame {}: {e}", path.display());
                    stats.skipped += 1;
                    continue;
                }
            };

            let frame = Frame::new(index as u64, image);
            let processed = block(frame);
            stats.delivered += 1;

            if let Some(dir) = &self.output_dir {
                let target = output_path(dir, path, index);
                processed
                    .image
                    .save(&target)
                    .with_context(|| format!("Failed to write frame: {}", target.display()))?;
                stats.written += 1;
            }
        }

        Ok(stats)
    }
}

fn lock(slot: &Mutex<Option<ProcessingBlock>>) -> MutexGuard<'_, Option<ProcessingBlock>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Checks if a path has a supported frame extension.
fn is_supported_frame(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.as_str()))
}

/// Output file for a processed frame: the source stem as PNG.
fn output_path(dir: &Path, source: &Path, index: usize) -> PathBuf {
    let stem = source
        .file_stem()
        .map_or_else(|| format!("frame_{index:06}"), |s| s.to_string_lossy().into_owned());
    dir.join(format!("{stem}.png"))
}
