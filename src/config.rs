//! Configuration types for the vibration monitor.

use std::time::Duration;

use crate::stats::Baseline;

/// Configuration for monitor behavior.
///
/// Use [`MonitorConfig::default()`] for sensible defaults, or customize as
/// needed via [`MonitorBuilder`](crate::MonitorBuilder).
///
/// # Example
///
/// ```
/// use stream_imu::MonitorConfig;
/// use std::time::Duration;
///
/// let config = MonitorConfig {
///     scan_timeout: Duration::from_secs(10),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Capacity of the rolling statistics window.
    ///
    /// Statistics (mean, std dev, peak) are computed over at most this many
    /// of the most recent samples. Default: 50
    pub window_capacity: usize,

    /// Capacity of the acquisition channel between producer and consumer.
    ///
    /// When full, the oldest unread sample is evicted (drop-oldest) and a
    /// [`MonitorEvent::SamplesDropped`] is emitted. Sized for roughly a
    /// quarter second of headroom at the device's ~1 kHz notification rate.
    /// Default: 256
    ///
    /// [`MonitorEvent::SamplesDropped`]: crate::MonitorEvent::SamplesDropped
    pub channel_capacity: usize,

    /// Replay rate of the mock source, in samples per second.
    ///
    /// A property of replay, independent of the corpus length. Default: 10
    pub replay_rate_hz: u32,

    /// How long a device scan listens for advertisements.
    ///
    /// Default: 5 seconds
    pub scan_timeout: Duration,

    /// Baseline the statistics engine classifies against.
    ///
    /// Default: [`Baseline::Idle`]
    pub baseline: Baseline,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_capacity: 50,
            channel_capacity: 256,
            replay_rate_hz: 10,
            scan_timeout: Duration::from_secs(5),
            baseline: Baseline::Idle,
        }
    }
}
