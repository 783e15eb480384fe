//! Rolling-window vibration statistics with baseline comparison.
//!
//! The engine owns a fixed-capacity window of the most recent samples and
//! derives mean, population standard deviation, and peak of `acc_total` on
//! demand. Classification compares the *mean* against a caller-supplied
//! baseline; peak is reported but never classified.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::pipeline::AcquisitionChannel;
use crate::Sample;

/// Deviation above which a reading warrants attention, in g.
pub const ATTENTION_THRESHOLD_G: f32 = 0.1;

/// Deviation above which a reading is a warning, in g.
pub const WARNING_THRESHOLD_G: f32 = 0.2;

/// Expected steady-state total acceleration for an operating mode.
///
/// The engine holds no opinion on which baseline applies; callers select it
/// (typically from whether the engine is idling or the vessel is underway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Baseline {
    /// Engine idling: 1.01 g.
    #[default]
    Idle,
    /// Cruising: 1.03 g.
    Cruise,
}

impl Baseline {
    /// The baseline total acceleration in g.
    pub fn g(&self) -> f32 {
        match self {
            Self::Idle => 1.01,
            Self::Cruise => 1.03,
        }
    }

    /// Lowercase label used in recommendation text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cruise => "cruising",
        }
    }
}

/// Classification of a mean reading against its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibrationStatus {
    /// Within ±0.1 g of baseline (inclusive).
    Normal,
    /// More than 0.1 g but at most 0.2 g from baseline.
    Attention,
    /// More than 0.2 g from baseline.
    Warning,
}

impl VibrationStatus {
    /// Classifies a mean deviation from baseline.
    ///
    /// Bounds are closed on the less severe side: a deviation of exactly
    /// 0.1 g is `Normal` and exactly 0.2 g is `Attention`.
    pub fn classify(deviation_g: f32) -> Self {
        let magnitude = deviation_g.abs();
        if magnitude <= ATTENTION_THRESHOLD_G {
            Self::Normal
        } else if magnitude <= WARNING_THRESHOLD_G {
            Self::Attention
        } else {
            Self::Warning
        }
    }
}

/// A point-in-time snapshot of the statistics window.
///
/// Derived entirely from the window contents at computation time; never
/// partially updated.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRecord {
    /// Mean of `acc_total` over the window, in g.
    pub mean_g: f32,
    /// Population standard deviation of `acc_total`, in g.
    pub std_dev_g: f32,
    /// Maximum `acc_total` in the window, in g.
    pub peak_g: f32,
    /// Classification of the mean against the baseline.
    pub status: VibrationStatus,
    /// The baseline that was compared against, in g.
    pub baseline_g: f32,
    /// `mean_g - baseline_g`, signed.
    pub deviation_g: f32,
    /// Number of samples the record was computed from (≤ window capacity).
    pub sample_count: usize,
    /// When the record was computed.
    pub computed_at: SystemTime,
}

/// Builds the operator-facing recommendation for a record.
///
/// Wording follows the original survey reports: warnings name the likely
/// mechanical cause, attention readings ask for trend monitoring.
pub fn recommendation(record: &StatisticsRecord, baseline: Baseline) -> String {
    match record.status {
        VibrationStatus::Normal => "Continue monitoring".to_string(),
        VibrationStatus::Attention => format!(
            "Moderate deviation from {} baseline ({:+.3}g). Monitor trend.",
            baseline.label(),
            record.deviation_g
        ),
        VibrationStatus::Warning => {
            if record.deviation_g > 0.0 {
                format!(
                    "High vibration detected. Check shaft alignment and propeller balance. \
                     {:.3}g above {} baseline.",
                    record.deviation_g,
                    baseline.label()
                )
            } else {
                format!(
                    "Unusually low vibration. Verify sensor placement and calibration. \
                     {:.3}g below {} baseline.",
                    record.deviation_g.abs(),
                    baseline.label()
                )
            }
        }
    }
}

/// Rolling-window statistics engine.
///
/// Owns the window exclusively; sources never touch it. Call
/// [`tick`](StatsEngine::tick) from the consumer context to drain the
/// acquisition channel and recompute.
///
/// # Example
///
/// ```
/// use stream_imu::{AcquisitionChannel, Baseline, Sample, StatsEngine};
///
/// let channel = AcquisitionChannel::new(64);
/// let mut engine = StatsEngine::new(50, Baseline::Idle);
///
/// assert!(engine.tick(&channel).is_none()); // empty window: no record
///
/// channel.push(Sample::new(0.0, 0.0, 1.01));
/// let record = engine.tick(&channel).expect("one sample is enough");
/// assert_eq!(record.sample_count, 1);
/// ```
#[derive(Debug)]
pub struct StatsEngine {
    window: VecDeque<Sample>,
    capacity: usize,
    baseline: Baseline,
    latest: Option<StatisticsRecord>,
}

impl StatsEngine {
    /// Creates an engine with the given window capacity and baseline.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize, baseline: Baseline) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            baseline,
            latest: None,
        }
    }

    /// The baseline currently classified against.
    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    /// Switches the baseline. Takes effect on the next computation.
    pub fn set_baseline(&mut self, baseline: Baseline) {
        self.baseline = baseline;
    }

    /// Number of samples currently in the window.
    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Inserts a sample, evicting the oldest when the window is full.
    pub fn ingest(&mut self, sample: Sample) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    /// Drains the channel into the window and recomputes statistics.
    ///
    /// Returns `None` when the window is empty - an empty window is
    /// "insufficient data", never a zero-filled Normal record.
    pub fn tick(&mut self, channel: &AcquisitionChannel) -> Option<StatisticsRecord> {
        for sample in channel.drain() {
            self.ingest(sample);
        }
        self.compute()
    }

    /// Recomputes statistics over the current window contents.
    ///
    /// Idempotent: repeated calls without new samples yield equal values.
    pub fn compute(&mut self) -> Option<StatisticsRecord> {
        if self.window.is_empty() {
            return None;
        }

        let count = self.window.len();
        let mut sum = 0.0f64;
        let mut peak = f32::MIN;
        for sample in &self.window {
            sum += f64::from(sample.acc_total);
            if sample.acc_total > peak {
                peak = sample.acc_total;
            }
        }
        let mean = sum / count as f64;

        let mut sum_sq_dev = 0.0f64;
        for sample in &self.window {
            let dev = f64::from(sample.acc_total) - mean;
            sum_sq_dev += dev * dev;
        }
        let std_dev = (sum_sq_dev / count as f64).sqrt();

        let mean_g = mean as f32;
        let deviation_g = mean_g - self.baseline.g();
        let record = StatisticsRecord {
            mean_g,
            std_dev_g: std_dev as f32,
            peak_g: peak,
            status: VibrationStatus::classify(deviation_g),
            baseline_g: self.baseline.g(),
            deviation_g,
            sample_count: count,
            computed_at: SystemTime::now(),
        };
        self.latest = Some(record.clone());
        Some(record)
    }

    /// The most recently computed record, if any.
    pub fn latest(&self) -> Option<&StatisticsRecord> {
        self.latest.as_ref()
    }
}
