//! Sample source abstraction: live WT901 hardware and mock replay.
//!
//! Both variants satisfy the same producer contract - push decoded samples
//! into the [`AcquisitionChannel`](crate::AcquisitionChannel) from a
//! background task - and are indistinguishable at the channel interface.
//! Exactly one source is alive at a time, owned by the monitor.

pub(crate) mod device;
mod mock;

pub use mock::MockReplay;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

/// Handle to a running sample source task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](SourceHandle::shutdown) for a prompt, clean stop. The task
/// rechecks the stop flag on a bounded period, so shutdown is serviced
/// within one loop iteration.
pub struct SourceHandle {
    label: String,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SourceHandle {
    pub(crate) fn new(label: String, stop: Arc<AtomicBool>, task: JoinHandle<()>) -> Self {
        Self { label, stop, task }
    }

    /// Human-readable source label ("mock" or the device name).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Requests a stop and waits for the producer task to finish.
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.task.await.is_err() {
            tracing::warn!(source = %self.label, "source task panicked during shutdown");
        }
    }
}
