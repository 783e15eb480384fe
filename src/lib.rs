//! # stream-imu
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Propeller-shaft vibration monitoring with a WT901BLE68 BLE accelerometer.
//!
//! `stream-imu` decodes the WitMotion notification protocol, keeps a rolling
//! window of total-acceleration samples, classifies the window mean against
//! an idle or cruising baseline, and lets the operator log annotated data
//! points. A deterministic mock replay source makes the whole pipeline
//! usable without hardware.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stream_imu::{Baseline, ChannelSink, LogEntry, PointMetadata, VibrationMonitor};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel::<LogEntry>(32);
//!
//! let mut monitor = VibrationMonitor::builder()
//!     .baseline(Baseline::Cruise)
//!     .on_event(|e| tracing::warn!(?e, "monitor event"))
//!     .build();
//!
//! monitor.scan()?;                       // Disconnected -> Scanning
//! // ...wait for DeviceListReady, pick a device...
//! monitor.connect().await?;              // -> Connected, streaming
//!
//! loop {
//!     tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//!     if let Some(record) = monitor.tick() {
//!         println!("{:.3} g ({:?})", record.mean_g, record.status);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! The crate maintains a strict task boundary:
//!
//! - **Producer task**: Receives BLE notifications (or replays the mock
//!   corpus), decodes frames, and pushes samples without blocking
//! - **Acquisition channel**: Bounded drop-oldest queue absorbs pressure
//!   from a slow consumer; a fresh sample always has somewhere to go
//! - **Consumer**: The monitor drains the channel on `tick`, refreshes the
//!   statistics window, and serves logging requests
//!
//! Sample loss under backpressure is deliberate and observable (via
//! [`MonitorEvent::SamplesDropped`]); the freshest data always wins.

#![warn(missing_docs)]
// Sensor math requires intentional numeric casts between raw and engineering units
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod config;
mod connection;
pub mod decoder;
mod error;
mod event;
mod monitor;
mod pipeline;
mod sample;
mod sink;
pub mod source;
mod stats;

pub use config::MonitorConfig;
pub use connection::{ConnectionState, DeviceDescriptor};
pub use decoder::{FrameDecoder, FULL_SCALE_G};
pub use error::{MonitorError, SinkError};
pub use event::{event_callback, EventCallback, MonitorEvent};
pub use monitor::{MonitorBuilder, VibrationMonitor};
pub use pipeline::AcquisitionChannel;
pub use sample::Sample;
pub use sink::{ChannelSink, LogEntry, LogSink, MemorySink, PointMetadata};
pub use source::{MockReplay, SourceHandle};
pub use stats::{
    recommendation, Baseline, StatisticsRecord, StatsEngine, VibrationStatus,
    ATTENTION_THRESHOLD_G, WARNING_THRESHOLD_G,
};
