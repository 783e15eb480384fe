//! Error types for stream-imu.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`MonitorError`]): a requested action could not be
//!   performed
//! - **Recoverable events**: runtime issues surfaced via
//!   [`EventCallback`](crate::EventCallback)
//!
//! Malformed frame bytes are neither: the decoder resynchronizes silently.

/// Errors returned from [`VibrationMonitor`](crate::VibrationMonitor) actions.
///
/// Runtime issues during streaming (dropped samples, source stop) are handled
/// via the event callback and the connection state instead.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The requested action is not valid in the current connection state.
    ///
    /// The state is left unchanged; this is a rejection, not a failure.
    #[error("invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        /// Name of the state the monitor was in.
        state: &'static str,
        /// The action that was rejected.
        action: &'static str,
    },

    /// No Bluetooth adapter is available on this system.
    #[error("no bluetooth adapter available")]
    NoAdapter,

    /// Device discovery failed.
    #[error("scan failed: {reason}")]
    ScanFailed {
        /// Why the scan failed.
        reason: String,
    },

    /// The selected device is no longer visible to the adapter.
    #[error("device not found: {address}")]
    DeviceNotFound {
        /// Address of the device that wasn't found.
        address: String,
    },

    /// Connecting to a device failed.
    #[error("connection to '{name}' failed: {reason}")]
    ConnectFailed {
        /// Display name of the device.
        name: String,
        /// Why the connection failed.
        reason: String,
    },

    /// The device lacks the WT901 notify characteristic.
    #[error("notify characteristic {uuid} not found on device")]
    NotifyCharacteristicMissing {
        /// The characteristic UUID that was expected.
        uuid: uuid::Uuid,
    },

    /// The statistics window is empty, so there is no record to report.
    ///
    /// Returned from `log_point` before any samples have been consumed.
    /// Callers must branch on this rather than treating it as a Normal
    /// reading.
    #[error("insufficient data: statistics window is empty")]
    InsufficientData,

    /// A log sink rejected the entry.
    #[error("log sink error: {0}")]
    Sink(#[from] SinkError),

    /// An error from the underlying BLE library.
    #[error("bluetooth backend error: {0}")]
    Backend(String),
}

impl From<btleplug::Error> for MonitorError {
    fn from(err: btleplug::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Errors that can occur within a [`LogSink`](crate::LogSink) implementation.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A write operation failed.
    #[error("write failed: {reason}")]
    WriteFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The receiving channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Custom error for user-implemented sinks.
    #[error("{0}")]
    Custom(String),
}

impl SinkError {
    /// Creates a custom sink error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates a write failed error with the given reason.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }
}
