//! Observer adapters that hand notifications to another thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};

use face_fx_core::domain::Frame;
use face_fx_core::ports::{BlinkObserver, FrameObserver};
use tracing::{debug, trace};

/// Forwards blink counts into an unbounded channel.
///
/// Sending never blocks the frame-processing thread.
#[derive(Debug)]
pub struct ChannelBlinkObserver {
    tx: Sender<u32>,
}

impl ChannelBlinkObserver {
    /// Creates an observer and the receiving end for its counts.
    #[must_use]
    pub fn channel() -> (Self, Receiver<u32>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl BlinkObserver for ChannelBlinkObserver {
    fn on_blink_detected(&self, count: u32) {
        if self.tx.send(count).is_err() {
            debug!(count, "Blink receiver dropped");
        }
    }
}

/// Publishes processed frames through a one-slot channel.
///
/// When the consumer has not taken the previous frame the new one is dropped,
/// so a slow display never stalls the pipeline.
#[derive(Debug)]
pub struct LatestFrameObserver {
    tx: SyncSender<Frame>,
    dropped: AtomicU64,
}

impl LatestFrameObserver {
    /// Creates an observer and the receiving end for its frames.
    #[must_use]
    pub fn channel() -> (Self, Receiver<Frame>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Frames discarded because the consumer was behind.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FrameObserver for LatestFrameObserver {
    fn on_frame_processed(&self, frame: &Frame) {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(frame = frame.sequence, total, "Consumer behind, frame dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(frame = frame.sequence, "Frame receiver dropped");
            }
        }
    }
}
