//! Observer registry for blink and processed-frame notifications.
//!
//! The notifier holds only [`Weak`] handles. Callers own their observers and
//! unsubscribe before dropping them; a handle that has died anyway is skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::{debug, warn};

use crate::domain::Frame;
use crate::ports::{BlinkObserver, FrameObserver};

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

struct Registry<T: ?Sized> {
    entries: RwLock<Vec<(SubscriptionId, Weak<T>)>>,
}

impl<T: ?Sized> Registry<T> {
    const fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn insert(&self, id: SubscriptionId, observer: Weak<T>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Upgrades every live handle. The lock is released before observers run
    /// so they may subscribe or unsubscribe from inside a callback.
    fn live(&self, what: &str) -> Vec<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .filter_map(|(id, handle)| {
                let upgraded = handle.upgrade();
                if upgraded.is_none() {
                    warn!(
                        subscription = id.get(),
                        "Skipping dropped {what} observer that was never unsubscribed"
                    );
                }
                upgraded
            })
            .collect()
    }
}

/// Delivers blink and frame notifications to subscribed observers.
pub struct EventNotifier {
    next_id: AtomicU64,
    blink: Registry<dyn BlinkObserver>,
    frames: Registry<dyn FrameObserver>,
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("blink_observers", &self.blink.len())
            .field("frame_observers", &self.frames.len())
            .finish()
    }
}

impl EventNotifier {
    /// Creates a notifier with no observers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            blink: Registry::new(),
            frames: Registry::new(),
        }
    }

    fn allocate(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a blink observer.
    pub fn subscribe(&self, observer: Weak<dyn BlinkObserver>) -> SubscriptionId {
        let id = self.allocate();
        self.blink.insert(id, observer);
        debug!(subscription = id.get(), "Blink observer subscribed");
        id
    }

    /// Removes a blink observer. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.blink.remove(id);
        debug!(subscription = id.get(), removed, "Blink observer unsubscribed");
        removed
    }

    /// Registers a processed-frame observer.
    pub fn subscribe_frames(&self, observer: Weak<dyn FrameObserver>) -> SubscriptionId {
        let id = self.allocate();
        self.frames.insert(id, observer);
        debug!(subscription = id.get(), "Frame observer subscribed");
        id
    }

    /// Removes a frame observer. Returns false if `id` was not registered.
    pub fn unsubscribe_frames(&self, id: SubscriptionId) -> bool {
        let removed = self.frames.remove(id);
        debug!(subscription = id.get(), removed, "Frame observer unsubscribed");
        removed
    }

    /// Number of registered blink observers, live or not.
    #[must_use]
    pub fn blink_observer_count(&self) -> usize {
        self.blink.len()
    }

    /// Number of registered frame observers, live or not.
    #[must_use]
    pub fn frame_observer_count(&self) -> usize {
        self.frames.len()
    }

    /// Tells every blink observer about a new blink total.
    pub fn notify_blink(&self, count: u32) {
        for observer in self.blink.live("blink") {
            observer.on_blink_detected(count);
        }
    }

    /// Hands a composited frame to every frame observer.
    pub fn notify_frame(&self, frame: &Frame) {
        for observer in self.frames.live("frame") {
            observer.on_frame_processed(frame);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use image::RgbaImage;

    use super::*;

    #[derive(Default)]
    struct Counts(Mutex<Vec<u32>>);

    impl BlinkObserver for Counts {
        fn on_blink_detected(&self, count: u32) {
            self.0.lock().unwrap().push(count);
        }
    }

    #[derive(Default)]
    struct Sequences(Mutex<Vec<u64>>);

    impl FrameObserver for Sequences {
        fn on_frame_processed(&self, frame: &Frame) {
            self.0.lock().unwrap().push(frame.sequence);
        }
    }

    fn weak_blink(observer: &Arc<Counts>) -> Weak<dyn BlinkObserver> {
        let as_dyn: Arc<dyn BlinkObserver> = observer.clone();
        Arc::downgrade(&as_dyn)
    }

    #[test]
    fn test_notify_reaches_all_subscribers() {
        let notifier = EventNotifier::new();
        let a = Arc::new(Counts::default());
        let b = Arc::new(Counts::default());
        notifier.subscribe(weak_blink(&a));
        notifier.subscribe(weak_blink(&b));

        notifier.notify_blink(1);
        notifier.notify_blink(2);

        assert_eq!(*a.0.lock().unwrap(), vec![1, 2]);
        assert_eq!(*b.0.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = EventNotifier::new();
        let a = Arc::new(Counts::default());
        let id = notifier.subscribe(weak_blink(&a));

        notifier.notify_blink(1);
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify_blink(2);

        assert_eq!(*a.0.lock().unwrap(), vec![1]);
        assert_eq!(notifier.blink_observer_count(), 0);
    }

    #[test]
    fn test_dropped_observer_is_skipped() {
        let notifier = EventNotifier::new();
        let kept = Arc::new(Counts::default());
        let dropped = Arc::new(Counts::default());
        notifier.subscribe(weak_blink(&dropped));
        notifier.subscribe(weak_blink(&kept));
        drop(dropped);

        notifier.notify_blink(7);
        assert_eq!(*kept.0.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_frame_observers_are_separate() {
        let notifier = EventNotifier::new();
        let frames = Arc::new(Sequences::default());
        let as_dyn: Arc<dyn FrameObserver> = frames.clone();
        let id = notifier.subscribe_frames(Arc::downgrade(&as_dyn));

        notifier.notify_frame(&Frame::new(4, RgbaImage::new(1, 1)));
        assert_eq!(*frames.0.lock().unwrap(), vec![4]);
        assert_eq!(notifier.blink_observer_count(), 0);

        assert!(!notifier.unsubscribe(id));
        assert!(notifier.unsubscribe_frames(id));
        notifier.notify_frame(&Frame::new(5, RgbaImage::new(1, 1)));
        assert_eq!(*frames.0.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_ids_are_unique() {
        let notifier = EventNotifier::new();
        let a = Arc::new(Counts::default());
        let first = notifier.subscribe(weak_blink(&a));
        let second = notifier.subscribe(weak_blink(&a));
        assert_ne!(first, second);
    }
}
