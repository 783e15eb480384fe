//! Log sink trait and implementations for recorded data points.
//!
//! A [`LogSink`] is any destination that can receive manually logged
//! statistics snapshots. The crate provides two built-in sinks:
//!
//! - [`ChannelSink`]: Sends entries to a tokio mpsc channel
//! - [`MemorySink`]: Accumulates entries in memory, mainly for tests
//!
//! You can implement the [`LogSink`] trait for custom destinations like
//! CSV files or network endpoints.

mod channel;
mod memory;

pub use channel::ChannelSink;
pub use memory::MemorySink;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SinkError;
use crate::stats::{Baseline, VibrationStatus};

/// Operator-supplied context attached to a logged point.
///
/// All fields are optional; an empty metadata set is a valid log entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointMetadata {
    /// Engine speed at the time of the reading, in revolutions per minute.
    pub rpm: Option<u32>,
    /// Vessel speed over ground, in knots.
    pub speed_knots: Option<f32>,
    /// Free-form operator note.
    pub note: Option<String>,
}

impl PointMetadata {
    /// Metadata with no fields set.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A single manually logged data point: the statistics snapshot current at
/// the moment of logging, plus operator metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Wall-clock time the point was logged.
    pub logged_at: DateTime<Utc>,
    /// Source label at log time: the device name, "mock", or "offline".
    pub session: String,
    /// Mean total acceleration over the window, in g.
    pub mean_g: f32,
    /// Standard deviation of total acceleration, in g.
    pub std_dev_g: f32,
    /// Peak total acceleration in the window, in g.
    pub peak_g: f32,
    /// Number of samples the snapshot was computed from.
    pub sample_count: usize,
    /// Classification of the snapshot against the baseline.
    pub status: VibrationStatus,
    /// Baseline the deviation was measured against, in g.
    pub baseline_g: f32,
    /// Signed deviation of the mean from the baseline, in g.
    pub deviation_g: f32,
    /// Human-readable advisory derived from the classification.
    pub recommendation: String,
    /// Engine speed, if supplied.
    pub rpm: Option<u32>,
    /// Vessel speed, if supplied.
    pub speed_knots: Option<f32>,
    /// Operator note, if supplied.
    pub note: Option<String>,
}

/// A destination for logged data points.
///
/// # Implementation Notes
///
/// - Methods take `&self` - use interior mutability (`Mutex`, `RwLock`) if needed
/// - All methods are async and run on the tokio runtime
/// - `on_start` is called before the first entry; open resources here
/// - `on_stop` is called when the monitor is done with the sink; flush here
///
/// # Example
///
/// ```
/// use stream_imu::{LogEntry, LogSink, SinkError};
/// use async_trait::async_trait;
///
/// struct PrintSink;
///
/// #[async_trait]
/// impl LogSink for PrintSink {
///     fn name(&self) -> &str {
///         "print"
///     }
///
///     async fn write(&self, entry: &LogEntry) -> Result<(), SinkError> {
///         println!("{}: {:.3} g ({:?})", entry.session, entry.mean_g, entry.status);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Called once before the first entry is written.
    ///
    /// Default implementation does nothing.
    async fn on_start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Writes one logged data point.
    async fn write(&self, entry: &LogEntry) -> Result<(), SinkError>;

    /// Called when no further entries will be written.
    ///
    /// Default implementation does nothing.
    async fn on_stop(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl LogEntry {
    /// Builds an entry from a statistics record, stamped with the current
    /// wall-clock time.
    pub(crate) fn from_record(
        record: &crate::stats::StatisticsRecord,
        baseline: Baseline,
        session: String,
        metadata: PointMetadata,
    ) -> Self {
        Self {
            logged_at: Utc::now(),
            session,
            mean_g: record.mean_g,
            std_dev_g: record.std_dev_g,
            peak_g: record.peak_g,
            sample_count: record.sample_count,
            status: record.status,
            baseline_g: record.baseline_g,
            deviation_g: record.deviation_g,
            recommendation: crate::stats::recommendation(record, baseline),
            rpm: metadata.rpm,
            speed_knots: metadata.speed_knots,
            note: metadata.note,
        }
    }
}
