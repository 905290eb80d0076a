use serde::{Deserialize, Serialize};

use crate::{AnimationConfig, StereoLevel};

/// Where a ghost sits this frame and how far its mouth is open, in logical
/// screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhostPose {
    pub x: f32,
    pub y: f32,
    pub mouth_height: f32,
}

/// Maps the animation phase and the current channel volumes to ghost poses.
///
/// The left ghost follows the left channel and sits at one third of the
/// screen width; the right ghost follows the right channel at two thirds and
/// runs `phase_shift` radians ahead.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    config: AnimationConfig,
    width: f32,
    height: f32,
}

impl AnimationDriver {
    pub fn new(config: AnimationConfig, width: u32, height: u32) -> Self {
        Self {
            config,
            width: width as f32,
            height: height as f32,
        }
    }

    /// `mouth_base + volume * mouth_gain`, capped at `mouth_max`.
    pub fn mouth_height(&self, volume: f32) -> f32 {
        let height = self.config.mouth_base + volume * self.config.mouth_gain;
        height.min(self.config.mouth_max)
    }

    /// Smallest volume at which the mouth is fully open.
    pub fn saturation_volume(&self) -> f32 {
        (self.config.mouth_max - self.config.mouth_base) / self.config.mouth_gain
    }

    pub fn poses(&self, phase: f32, levels: StereoLevel) -> [GhostPose; 2] {
        let shifted = phase + self.config.phase_shift;
        let centre_y = self.height / 2.0;

        [
            GhostPose {
                x: self.width / 3.0 + phase.cos() * self.config.left_sway,
                y: centre_y + phase.sin() * self.config.bob,
                mouth_height: self.mouth_height(levels.left),
            },
            GhostPose {
                x: self.width / 3.0 * 2.0 + shifted.cos() * self.config.right_sway,
                y: centre_y + shifted.sin() * self.config.bob,
                mouth_height: self.mouth_height(levels.right),
            },
        ]
    }
}
