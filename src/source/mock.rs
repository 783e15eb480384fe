//! Mock sample source for testing and demos without hardware.

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::event::{EventCallback, MonitorEvent};
use crate::pipeline::AcquisitionChannel;
use crate::source::SourceHandle;
use crate::Sample;

/// Default number of points in the generated idle corpus.
const DEFAULT_CORPUS_LEN: usize = 100;

/// Period of the slow oscillation component, in corpus points.
const OSCILLATION_PERIOD: f32 = 25.0;

/// A mock source that replays a fixed acceleration corpus in a loop.
///
/// The corpus models plausible idle vibration: total acceleration around
/// 1.01 g with a bounded slow oscillation and deterministic noise. Replay
/// runs at a fixed rate (default 10 Hz) that is a property of replay, not of
/// the corpus length, and loops indefinitely - every full pass produces the
/// same `acc_total` sequence.
///
/// Downstream consumers cannot tell a mock from a live device: both push
/// samples into the same acquisition channel.
///
/// # Example
///
/// ```
/// use stream_imu::MockReplay;
///
/// let mock = MockReplay::idle();
/// assert_eq!(mock.len(), 100);
///
/// // The corpus hovers around the idle baseline.
/// let mean: f32 = mock.corpus().iter().map(|s| s.acc_total).sum::<f32>()
///     / mock.len() as f32;
/// assert!((mean - 1.01).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct MockReplay {
    corpus: Vec<Sample>,
    rate_hz: u32,
}

impl MockReplay {
    /// Creates a mock with the default idle corpus at 10 Hz.
    pub fn idle() -> Self {
        Self::idle_with_len(DEFAULT_CORPUS_LEN)
    }

    /// Creates an idle corpus with a specific number of points.
    pub fn idle_with_len(len: usize) -> Self {
        let len = len.max(1);
        let mut corpus = Vec::with_capacity(len);

        // Simple LCG for deterministic "random" noise.
        let mut seed: u32 = 12345;
        let mut noise = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (seed >> 16) as f32 / 65536.0 - 0.5
        };

        for i in 0..len {
            let phase = 2.0 * PI * i as f32 / OSCILLATION_PERIOD;
            let total = 1.01 + 0.004 * phase.sin() + 0.006 * noise();
            let acc_x = 0.015 * (phase * 1.7).cos() + 0.004 * noise();
            let acc_y = 0.012 * (phase * 2.3).sin() + 0.004 * noise();
            // Put the remainder of the magnitude on Z so the total is exact.
            let acc_z = (total * total - acc_x * acc_x - acc_y * acc_y).sqrt();
            corpus.push(Sample::new(acc_x, acc_y, acc_z));
        }

        Self { corpus, rate_hz: 10 }
    }

    /// Creates a mock from an explicit corpus of samples.
    pub fn with_corpus(corpus: Vec<Sample>, rate_hz: u32) -> Self {
        let corpus = if corpus.is_empty() {
            Self::idle().corpus
        } else {
            corpus
        };
        Self {
            corpus,
            rate_hz: rate_hz.max(1),
        }
    }

    /// Overrides the replay rate, in samples per second.
    pub fn with_rate(mut self, rate_hz: u32) -> Self {
        self.rate_hz = rate_hz.max(1);
        self
    }

    /// The corpus that will be replayed, in order.
    pub fn corpus(&self) -> &[Sample] {
        &self.corpus
    }

    /// Number of points in the corpus.
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    /// Returns `true` if the corpus is empty (never true in practice).
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// The replay rate in samples per second.
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Spawns the replay task, pushing samples into `channel` until stopped.
    pub(crate) fn spawn(
        self,
        channel: AcquisitionChannel,
        events: Option<EventCallback>,
    ) -> SourceHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let task = tokio::spawn(async move {
            let period = Duration::from_secs_f64(1.0 / f64::from(self.rate_hz));
            let mut interval = tokio::time::interval(period);
            let mut index = 0usize;

            tracing::info!(
                corpus_len = self.corpus.len(),
                rate_hz = self.rate_hz,
                "mock replay started"
            );
            if let Some(ref callback) = events {
                callback(MonitorEvent::SourceStarted {
                    source: "mock".to_string(),
                });
            }

            while !stop_flag.load(Ordering::SeqCst) {
                interval.tick().await;
                let template = self.corpus[index % self.corpus.len()];
                index = index.wrapping_add(1);

                // Re-stamp with replay time; the accelerations repeat exactly.
                let sample = Sample::new(template.acc_x, template.acc_y, template.acc_z);
                if channel.push(sample) {
                    if let Some(ref callback) = events {
                        callback(MonitorEvent::SamplesDropped {
                            dropped: 1,
                            total_dropped: channel.total_dropped(),
                        });
                    }
                }
            }

            tracing::info!(replayed = index, "mock replay stopped");
            if let Some(ref callback) = events {
                callback(MonitorEvent::SourceStopped {
                    source: "mock".to_string(),
                    reason: "stop requested".to_string(),
                });
            }
        });

        SourceHandle::new("mock".to_string(), stop, task)
    }
}

impl Default for MockReplay {
    fn default() -> Self {
        Self::idle()
    }
}
