use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};

use crate::{AudioSink, GhostiesError, Result};

/// Snapshot of both channel volumes taken at a single point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoLevel {
    pub left: f32,
    pub right: f32,
}

/// Average absolute sample magnitude per stereo channel, shared between the
/// audio thread (writer) and the render loop (reader).
///
/// Each value lives in its own atomic, so a reader may observe the left value
/// of one block next to the right value of the previous block. That is fine
/// for driving an animation.
#[derive(Debug, Default)]
pub struct ChannelLevels {
    left_bits: AtomicU32,
    right_bits: AtomicU32,
}

impl ChannelLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, left: f32, right: f32) {
        self.left_bits.store(left.to_bits(), Ordering::Relaxed);
        self.right_bits.store(right.to_bits(), Ordering::Relaxed);
    }

    pub fn left(&self) -> f32 {
        f32::from_bits(self.left_bits.load(Ordering::Relaxed))
    }

    pub fn right(&self) -> f32 {
        f32::from_bits(self.right_bits.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> StereoLevel {
        StereoLevel {
            left: self.left(),
            right: self.right(),
        }
    }
}

/// Applies `sign(x) * |x|^exponent`. Zero stays zero.
pub fn shape_sample(sample: f32, exponent: f32) -> f32 {
    let magnitude = sample.abs().powf(exponent);
    if sample < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Processor that reshapes interleaved stereo audio in place and publishes
/// the per-channel average magnitude of every block it sees.
#[derive(Debug, Clone)]
pub struct EnvelopeTransform {
    exponent: f32,
    levels: Arc<ChannelLevels>,
}

impl EnvelopeTransform {
    pub fn new(exponent: f32, levels: Arc<ChannelLevels>) -> Self {
        Self { exponent, levels }
    }

    pub fn levels(&self) -> &Arc<ChannelLevels> {
        &self.levels
    }

    /// Shapes `samples` in place and returns the resulting channel averages.
    /// The buffer must hold exactly `frames` interleaved stereo frames.
    pub fn process(&self, samples: &mut [f32], frames: usize) -> Result<StereoLevel> {
        if frames == 0 || samples.is_empty() {
            return Err(GhostiesError::InvalidInput(
                "envelope transform requires at least one frame",
            ));
        }
        if frames.checked_mul(2) != Some(samples.len()) {
            return Err(GhostiesError::InvalidInput(
                "envelope transform requires two interleaved samples per frame",
            ));
        }

        let mut left_sum = 0.0_f32;
        let mut right_sum = 0.0_f32;

        for frame in samples.chunks_exact_mut(2) {
            frame[0] = shape_sample(frame[0], self.exponent);
            frame[1] = shape_sample(frame[1], self.exponent);

            left_sum += frame[0].abs();
            right_sum += frame[1].abs();
        }

        let frames = frames as f32;
        let level = StereoLevel {
            left: left_sum / frames,
            right: right_sum / frames,
        };
        self.levels.store(level.left, level.right);
        Ok(level)
    }
}

impl AudioSink for EnvelopeTransform {
    fn on_buffer(&mut self, samples: &mut [f32], frames: usize) -> Result<()> {
        self.process(samples, frames).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(exponent: f32) -> EnvelopeTransform {
        EnvelopeTransform::new(exponent, Arc::new(ChannelLevels::new()))
    }

    #[test]
    fn unit_exponent_is_identity() {
        let transform = transform(1.0);
        let input = vec![0.3, -0.7, 1.0, -1.0, 0.0, 0.125, -0.001, 0.999];
        let mut samples = input.clone();

        transform.process(&mut samples, 4).unwrap();

        assert_eq!(samples, input);
    }

    #[test]
    fn preserves_sign_for_any_positive_exponent() {
        let input = [0.8, -0.8, 0.0, -0.25, 0.5, -1.0];
        for exponent in [0.3, 1.0, 2.0, 3.7] {
            let transform = transform(exponent);
            let mut samples = input;
            transform.process(&mut samples, 3).unwrap();

            for (before, after) in input.iter().zip(samples.iter()) {
                if *before == 0.0 {
                    assert_eq!(*after, 0.0);
                } else {
                    assert_eq!(before.signum(), after.signum());
                }
            }
        }
    }

    #[test]
    fn silence_yields_zero_levels() {
        for exponent in [0.5, 1.0, 4.0] {
            let transform = transform(exponent);
            transform.levels().store(0.7, 0.7);
            let mut samples = vec![0.0; 512];

            transform.process(&mut samples, 256).unwrap();

            assert_eq!(transform.levels().snapshot(), StereoLevel::default());
        }
    }

    #[test]
    fn constant_amplitude_averages_to_shaped_magnitude() {
        let transform = transform(1.5);
        let mut samples = Vec::new();
        for _ in 0..100 {
            samples.push(0.4);
            samples.push(-0.9);
        }

        let level = transform.process(&mut samples, 100).unwrap();

        assert!((level.left - 0.4_f32.powf(1.5)).abs() < 1e-5);
        assert!((level.right - 0.9_f32.powf(1.5)).abs() < 1e-5);
    }

    #[test]
    fn squares_a_single_frame() {
        let transform = transform(2.0);
        let mut samples = [0.5, -0.5];

        transform.process(&mut samples, 1).unwrap();

        assert_eq!(samples, [0.25, -0.25]);
        let level = transform.levels().snapshot();
        assert_eq!(level.left, 0.25);
        assert_eq!(level.right, 0.25);
    }

    #[test]
    fn full_scale_frames_pass_through_at_unit_exponent() {
        let transform = transform(1.0);
        let mut samples = [1.0, 1.0, -1.0, -1.0];

        transform.process(&mut samples, 2).unwrap();

        assert_eq!(samples, [1.0, 1.0, -1.0, -1.0]);
        assert_eq!(
            transform.levels().snapshot(),
            StereoLevel {
                left: 1.0,
                right: 1.0
            }
        );
    }

    #[test]
    fn each_block_replaces_previous_levels() {
        let transform = transform(1.0);
        transform.process(&mut [1.0, 1.0], 1).unwrap();
        transform.process(&mut [0.2, 0.1], 1).unwrap();

        let level = transform.levels().snapshot();
        assert!((level.left - 0.2).abs() < f32::EPSILON);
        assert!((level.right - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_buffer_is_rejected_without_touching_levels() {
        let transform = transform(1.0);
        transform.levels().store(0.3, 0.6);

        let err = transform.process(&mut [], 0).unwrap_err();

        assert!(matches!(err, GhostiesError::InvalidInput(_)));
        let level = transform.levels().snapshot();
        assert_eq!(level.left, 0.3);
        assert_eq!(level.right, 0.6);
        assert!(!level.left.is_nan() && !level.right.is_nan());
    }

    #[test]
    fn mismatched_frame_count_is_rejected() {
        let transform = transform(2.0);
        let mut samples = [0.5, 0.5, 0.5];

        assert!(transform.process(&mut samples, 1).is_err());
        assert!(transform.process(&mut samples, 2).is_err());
        assert_eq!(samples, [0.5, 0.5, 0.5]);
    }

    #[test]
    fn overflowing_frame_count_is_rejected() {
        let transform = transform(1.0);
        let mut samples = [0.5, 0.5];

        let err = transform
            .process(&mut samples, usize::MAX / 2 + 1)
            .unwrap_err();

        assert!(matches!(err, GhostiesError::InvalidInput(_)));
        assert_eq!(samples, [0.5, 0.5]);
    }

    #[test]
    fn sink_trait_delegates_to_process() {
        let mut transform = transform(2.0);
        let mut samples = [-0.5, 0.5];

        transform.on_buffer(&mut samples, 1).unwrap();

        assert_eq!(samples, [-0.25, 0.25]);
        assert_eq!(transform.levels().left(), 0.25);
    }
}
