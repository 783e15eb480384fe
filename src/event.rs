//! Runtime events for monitoring acquisition health.
//!
//! Events are non-fatal notifications about pipeline behavior. Acquisition
//! continues running after events are emitted - they're for logging/metrics,
//! not error handling. Fatal conditions surface through
//! [`ConnectionState::Error`](crate::ConnectionState::Error) instead.

use std::sync::Arc;

/// Runtime events emitted during acquisition.
///
/// These are informational events, not errors. Use the [`EventCallback`] to
/// log them or update metrics.
///
/// # Example
///
/// ```
/// use stream_imu::MonitorEvent;
///
/// fn handle_event(event: MonitorEvent) {
///     match event {
///         MonitorEvent::SamplesDropped { dropped, total_dropped } => {
///             eprintln!("dropped {dropped} samples ({total_dropped} total)");
///         }
///         MonitorEvent::ScanCompleted { device_count } => {
///             eprintln!("scan found {device_count} device(s)");
///         }
///         MonitorEvent::SourceStarted { source } => {
///             eprintln!("source started: {source}");
///         }
///         MonitorEvent::SourceStopped { source, reason } => {
///             eprintln!("source {source} stopped: {reason}");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The acquisition channel evicted unread samples to admit newer ones.
    ///
    /// This is the drop-oldest backpressure policy at work, not a fault:
    /// the consumer tick is slower than the producer. Consider increasing
    /// `channel_capacity` if sustained.
    SamplesDropped {
        /// Samples evicted since the last event.
        dropped: u64,
        /// Samples evicted over the lifetime of the channel.
        total_dropped: u64,
    },

    /// A device scan finished.
    ScanCompleted {
        /// Number of devices discovered.
        device_count: usize,
    },

    /// A sample source began producing.
    SourceStarted {
        /// Human-readable source label ("mock" or the device name).
        source: String,
    },

    /// A sample source stopped producing.
    ///
    /// Emitted both for requested stops and for transport failures; in the
    /// failure case the connection state also moves to `Error`.
    SourceStopped {
        /// Human-readable source label.
        source: String,
        /// Why the source stopped.
        reason: String,
    },
}

/// Callback type for receiving runtime events.
///
/// Register via [`MonitorBuilder::on_event()`](crate::MonitorBuilder::on_event).
///
/// # Example
///
/// ```ignore
/// let monitor = VibrationMonitor::builder()
///     .on_event(|event| tracing::warn!(?event, "monitor event"))
///     .build();
/// ```
pub type EventCallback = Arc<dyn Fn(MonitorEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// Convenience for creating event callbacks without manually wrapping in
/// `Arc`.
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(MonitorEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
