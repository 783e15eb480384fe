//! In-memory sink, mainly for tests and short sessions.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::sink::{LogEntry, LogSink};

/// A sink that accumulates logged entries in memory.
///
/// Useful in tests and for short interactive sessions where the caller
/// inspects the log afterwards.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Creates an empty in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all entries written so far, in write order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write(&self, entry: &LogEntry) -> Result<(), SinkError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::VibrationStatus;
    use chrono::Utc;

    fn entry(note: &str) -> LogEntry {
        LogEntry {
            logged_at: Utc::now(),
            session: "mock".to_string(),
            mean_g: 1.03,
            std_dev_g: 0.01,
            peak_g: 1.06,
            sample_count: 50,
            status: VibrationStatus::Normal,
            baseline_g: 1.03,
            deviation_g: 0.0,
            recommendation: String::new(),
            rpm: None,
            speed_knots: None,
            note: Some(note.to_string()),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_preserves_write_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.write(&entry("first")).await.unwrap();
        sink.write(&entry("second")).await.unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].note.as_deref(), Some("first"));
        assert_eq!(entries[1].note.as_deref(), Some("second"));
    }
}
