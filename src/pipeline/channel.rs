//! Bounded, ordered, drop-oldest hand-off between producer and consumer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;

use crate::Sample;

/// The acquisition channel carrying samples from a source to the statistics
/// engine.
///
/// Samples are delivered in the exact order produced. When the channel is
/// full, the oldest unread sample is evicted to admit the newest: the
/// monitoring use case cares about current state, so freshness wins over
/// completeness. Neither side ever blocks on the other.
///
/// Cloning is cheap and shares the underlying buffer, which is how the
/// producer task and the consumer tick hold the two ends.
///
/// # Example
///
/// ```
/// use stream_imu::{AcquisitionChannel, Sample};
///
/// let channel = AcquisitionChannel::new(3);
/// for i in 0..5 {
///     channel.push(Sample::new(i as f32, 0.0, 0.0));
/// }
/// // Capacity 3: the two oldest samples were evicted.
/// let drained = channel.drain();
/// assert_eq!(drained.len(), 3);
/// assert_eq!(drained[0].acc_x, 2.0);
/// assert_eq!(channel.total_dropped(), 2);
/// ```
#[derive(Clone)]
pub struct AcquisitionChannel {
    inner: Arc<Shared>,
}

struct Shared {
    buffer: Mutex<HeapRb<Sample>>,
    capacity: usize,
    total_dropped: AtomicU64,
}

impl AcquisitionChannel {
    /// Creates a channel holding at most `capacity` unread samples.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Shared {
                buffer: Mutex::new(HeapRb::new(capacity)),
                capacity,
                total_dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Pushes a sample, evicting the oldest unread sample if full.
    ///
    /// Returns `true` if an eviction occurred.
    pub fn push(&self, sample: Sample) -> bool {
        let mut buffer = self.inner.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if buffer.try_push(sample).is_ok() {
            return false;
        }
        // Full: drop-oldest, then the push cannot fail.
        let _ = buffer.try_pop();
        let _ = buffer.try_push(sample);
        self.inner.total_dropped.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Removes and returns all currently buffered samples, oldest first.
    pub fn drain(&self) -> Vec<Sample> {
        let mut buffer = self.inner.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let mut samples = Vec::with_capacity(buffer.occupied_len());
        while let Some(sample) = buffer.try_pop() {
            samples.push(sample);
        }
        samples
    }

    /// Number of unread samples currently buffered.
    pub fn len(&self) -> usize {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .occupied_len()
    }

    /// Returns `true` if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of unread samples the channel holds.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Samples evicted by the drop-oldest policy over the channel lifetime.
    pub fn total_dropped(&self) -> u64 {
        self.inner.total_dropped.load(Ordering::Relaxed)
    }
}
