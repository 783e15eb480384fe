//! WT901 binary frame decoder.
//!
//! The WT901BLE68 streams fixed-size frames inside BLE notifications. A
//! notification may contain several frames, a partial frame, or garbage from
//! a dropped packet, so the decoder is stateful: bytes that do not yet form a
//! complete frame are retained for the next call, and unrecognized bytes are
//! skipped one at a time until a marker pair resynchronizes the scan.
//!
//! Two frame types carry acceleration:
//!
//! - `0x55 0x51`: standard WT901 IMU frame, 11 bytes
//! - `0x55 0x61`: WT901BLE68 extended frame, 16 bytes
//!
//! Both place the X/Y/Z fields as little-endian `i16` at offsets 2/4/6,
//! scaled to ±16 g full range. Malformed input is never an error; the decoder
//! only ever yields zero or more samples.

use crate::Sample;

/// First byte of every WT901 frame.
const FRAME_MARKER: u8 = 0x55;

/// Frame type byte for the standard 11-byte IMU frame.
const STANDARD_FRAME_TYPE: u8 = 0x51;
const STANDARD_FRAME_LEN: usize = 11;

/// Frame type byte for the 16-byte extended frame seen on the WT901BLE68.
const EXTENDED_FRAME_TYPE: u8 = 0x61;
const EXTENDED_FRAME_LEN: usize = 16;

/// Accelerometer full-scale range in g.
pub const FULL_SCALE_G: f32 = 16.0;

/// Converts one raw little-endian field to g.
fn raw_to_g(lo: u8, hi: u8) -> f32 {
    f32::from(i16::from_le_bytes([lo, hi])) / 32768.0 * FULL_SCALE_G
}

/// Stateful decoder for the WT901 byte stream.
///
/// Feed raw notification payloads to [`decode`](FrameDecoder::decode) in
/// arrival order; each call returns the samples completed by that chunk.
/// Frames may span chunk boundaries; splitting the same byte stream at any
/// offset yields the same sample sequence.
///
/// # Example
///
/// ```
/// use stream_imu::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
/// // 0x55 0x51, ax=1024, ay=0, az=2048, temp + checksum padding
/// let frame = [0x55, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00];
/// let samples = decoder.decode(&frame);
/// assert_eq!(samples.len(), 1);
/// assert!((samples[0].acc_x - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Undecoded tail of the previous chunk.
    pending: Vec<u8>,
}

impl FrameDecoder {
    /// Creates a decoder with no pending bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes all complete frames available after appending `chunk`.
    ///
    /// Returns samples in arrival order. Incomplete trailing bytes are kept
    /// for the next call; unrecognized bytes are silently skipped.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Sample> {
        self.pending.extend_from_slice(chunk);

        let mut samples = Vec::new();
        let buf = &self.pending;
        let mut pos = 0;

        while pos < buf.len() {
            if buf[pos] != FRAME_MARKER {
                pos += 1;
                continue;
            }
            // Marker at the very end: frame type unknown until more bytes arrive.
            if pos + 1 >= buf.len() {
                break;
            }
            let frame_len = match buf[pos + 1] {
                STANDARD_FRAME_TYPE => STANDARD_FRAME_LEN,
                EXTENDED_FRAME_TYPE => EXTENDED_FRAME_LEN,
                _ => {
                    // Not a supported frame; resynchronize one byte at a time.
                    pos += 1;
                    continue;
                }
            };
            if pos + frame_len > buf.len() {
                // Frame spans the chunk boundary; retain and wait for the rest.
                break;
            }

            let acc_x = raw_to_g(buf[pos + 2], buf[pos + 3]);
            let acc_y = raw_to_g(buf[pos + 4], buf[pos + 5]);
            let acc_z = raw_to_g(buf[pos + 6], buf[pos + 7]);
            samples.push(Sample::new(acc_x, acc_y, acc_z));

            pos += frame_len;
        }

        self.pending.drain(..pos);
        samples
    }

    /// Number of undecoded bytes currently retained.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a standard 11-byte frame from raw i16 axis values.
    fn standard_frame(ax: i16, ay: i16, az: i16) -> Vec<u8> {
        let mut frame = vec![FRAME_MARKER, STANDARD_FRAME_TYPE];
        frame.extend_from_slice(&ax.to_le_bytes());
        frame.extend_from_slice(&ay.to_le_bytes());
        frame.extend_from_slice(&az.to_le_bytes());
        frame.extend_from_slice(&[0, 0, 0]); // temperature + checksum
        frame
    }

    /// Builds a 16-byte extended frame from raw i16 axis values.
    fn extended_frame(ax: i16, ay: i16, az: i16) -> Vec<u8> {
        let mut frame = vec![FRAME_MARKER, EXTENDED_FRAME_TYPE];
        frame.extend_from_slice(&ax.to_le_bytes());
        frame.extend_from_slice(&ay.to_le_bytes());
        frame.extend_from_slice(&az.to_le_bytes());
        frame.resize(EXTENDED_FRAME_LEN, 0);
        frame
    }

    fn encode_g(value: f32) -> i16 {
        (value / FULL_SCALE_G * 32768.0).round() as i16
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&[]).is_empty());
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_standard_frame_scaling() {
        let mut decoder = FrameDecoder::new();
        // 2048 / 32768 * 16 = 1.0 g
        let samples = decoder.decode(&standard_frame(2048, -2048, 4096));
        assert_eq!(samples.len(), 1);
        assert!((samples[0].acc_x - 1.0).abs() < 1e-6);
        assert!((samples[0].acc_y + 1.0).abs() < 1e-6);
        assert!((samples[0].acc_z - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_extended_frame_decodes() {
        let mut decoder = FrameDecoder::new();
        let samples = decoder.decode(&extended_frame(0, 0, 2067));
        assert_eq!(samples.len(), 1);
        // 2067 / 32768 * 16 ≈ 1.009 g
        assert!((samples[0].acc_z - 1.00928).abs() < 1e-4);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let mut chunk = standard_frame(100, 0, 0);
        chunk.extend(extended_frame(200, 0, 0));
        chunk.extend(standard_frame(300, 0, 0));

        let samples = decoder.decode(&chunk);
        assert_eq!(samples.len(), 3);
        assert!(samples[0].acc_x < samples[1].acc_x);
        assert!(samples[1].acc_x < samples[2].acc_x);
    }

    #[test]
    fn test_frame_spanning_chunk_boundary() {
        let frame = standard_frame(1024, 512, 2048);

        // Decode in one shot for reference.
        let mut whole = FrameDecoder::new();
        let expected = whole.decode(&frame);
        assert_eq!(expected.len(), 1);

        // Split at every possible offset.
        for split in 0..frame.len() {
            let mut decoder = FrameDecoder::new();
            let mut samples = decoder.decode(&frame[..split]);
            samples.extend(decoder.decode(&frame[split..]));
            assert_eq!(samples.len(), 1, "split at {split}");
            assert_eq!(samples[0].acc_x, expected[0].acc_x);
            assert_eq!(samples[0].acc_y, expected[0].acc_y);
            assert_eq!(samples[0].acc_z, expected[0].acc_z);
        }
    }

    #[test]
    fn test_short_buffer_fully_retained() {
        let mut decoder = FrameDecoder::new();
        let frame = standard_frame(1, 2, 3);
        let samples = decoder.decode(&frame[..6]);
        assert!(samples.is_empty());
        assert_eq!(decoder.pending_len(), 6);
    }

    #[test]
    fn test_resynchronizes_past_garbage() {
        let mut decoder = FrameDecoder::new();
        let mut chunk = vec![0x12, 0x55, 0x99, 0xab]; // 0x55 with bad type byte
        chunk.extend(standard_frame(2048, 0, 0));
        chunk.extend([0xff, 0x00]);

        let samples = decoder.decode(&chunk);
        assert_eq!(samples.len(), 1);
        assert!((samples[0].acc_x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_marker_at_tail_kept_for_next_call() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&[0x00, 0x55]).is_empty());
        assert_eq!(decoder.pending_len(), 1);

        let mut rest = vec![STANDARD_FRAME_TYPE];
        rest.extend_from_slice(&2048i16.to_le_bytes());
        rest.extend_from_slice(&[0u8; 7]);
        let samples = decoder.decode(&rest);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_quantization_round_trip() {
        // Encoding then decoding recovers values within one quantization step.
        let step = FULL_SCALE_G / 32768.0;
        let mut decoder = FrameDecoder::new();
        for &g in &[0.0f32, 0.013, -0.42, 1.01, 1.03, -9.81 / 9.80665, 15.9] {
            let samples = decoder.decode(&standard_frame(encode_g(g), 0, 0));
            assert_eq!(samples.len(), 1);
            assert!(
                (samples[0].acc_x - g).abs() <= step,
                "value {g} decoded as {}",
                samples[0].acc_x
            );
        }
    }
}
