//! Tokio mpsc channel sink implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::SinkError;
use crate::sink::{LogEntry, LogSink};

/// A sink that sends logged data points to a tokio mpsc channel.
///
/// This is the primary way to forward logged points to another part of an
/// application (UI, exporter, uploader).
///
/// # Example
///
/// ```
/// use stream_imu::{ChannelSink, LogEntry};
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<LogEntry>(100);
/// let sink = ChannelSink::new(tx);
///
/// // Pass &sink to VibrationMonitor::log_point, then receive entries:
/// // while let Some(entry) = rx.recv().await { ... }
/// ```
pub struct ChannelSink {
    name: String,
    sender: mpsc::Sender<LogEntry>,
}

impl ChannelSink {
    /// Creates a new channel sink with the given sender.
    pub fn new(sender: mpsc::Sender<LogEntry>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a new channel sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<LogEntry>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }
}

#[async_trait]
impl LogSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, entry: &LogEntry) -> Result<(), SinkError> {
        self.sender
            .send(entry.clone())
            .await
            .map_err(|_| SinkError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::VibrationStatus;
    use chrono::Utc;

    fn attention_entry(rpm: u32) -> LogEntry {
        LogEntry {
            logged_at: Utc::now(),
            session: "WT901BLE68".to_string(),
            mean_g: 1.16,
            std_dev_g: 0.012,
            peak_g: 1.21,
            sample_count: 50,
            status: VibrationStatus::Attention,
            baseline_g: 1.01,
            deviation_g: 0.15,
            recommendation: "Moderate deviation from idle baseline (+0.150g). Monitor trend."
                .to_string(),
            rpm: Some(rpm),
            speed_knots: Some(0.0),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_entries_arrive_in_write_order_with_fields_intact() {
        let (tx, mut rx) = mpsc::channel::<LogEntry>(10);
        let sink = ChannelSink::with_name("exporter", tx);
        assert_eq!(sink.name(), "exporter");

        // Two readings logged as the operator steps up engine speed.
        sink.write(&attention_entry(700)).await.unwrap();
        sink.write(&attention_entry(1200)).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.rpm, Some(700));
        assert_eq!(second.rpm, Some(1200));
        assert_eq!(first.status, VibrationStatus::Attention);
        assert!(first.recommendation.contains("Monitor trend"));
    }

    #[tokio::test]
    async fn test_write_after_receiver_gone_is_recoverable() {
        let (tx, mut rx) = mpsc::channel::<LogEntry>(10);
        let sink = ChannelSink::new(tx);

        // One delivered entry, then the consumer goes away mid-session.
        sink.write(&attention_entry(700)).await.unwrap();
        assert!(rx.recv().await.is_some());
        drop(rx);

        let result = sink.write(&attention_entry(1200)).await;
        assert!(matches!(result, Err(SinkError::ChannelClosed)));
    }
}
