//! Acceleration sample with metadata.

use std::time::SystemTime;

/// One decoded accelerometer reading, in units of standard gravity (g).
///
/// `Sample` is the fundamental unit of data passed through the pipeline.
/// The total acceleration is computed once at construction so every consumer
/// sees the same value; samples are immutable after creation.
///
/// # Example
///
/// ```
/// use stream_imu::Sample;
///
/// let sample = Sample::new(0.02, -0.01, 1.0);
/// assert!((sample.acc_total - 1.00025).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Wall-clock time at which the sample was decoded.
    pub timestamp: SystemTime,

    /// Acceleration along the X axis, in g.
    pub acc_x: f32,

    /// Acceleration along the Y axis, in g.
    pub acc_y: f32,

    /// Acceleration along the Z axis, in g.
    pub acc_z: f32,

    /// Total acceleration magnitude `sqrt(x² + y² + z²)`, in g.
    ///
    /// Always non-negative. Computed at decode time, never recomputed
    /// downstream.
    pub acc_total: f32,
}

impl Sample {
    /// Creates a sample from per-axis readings, stamped with the current time.
    pub fn new(acc_x: f32, acc_y: f32, acc_z: f32) -> Self {
        Self::at(SystemTime::now(), acc_x, acc_y, acc_z)
    }

    /// Creates a sample with an explicit timestamp.
    pub fn at(timestamp: SystemTime, acc_x: f32, acc_y: f32, acc_z: f32) -> Self {
        let acc_total = (acc_x * acc_x + acc_y * acc_y + acc_z * acc_z).sqrt();
        Self {
            timestamp,
            acc_x,
            acc_y,
            acc_z,
            acc_total,
        }
    }
}
