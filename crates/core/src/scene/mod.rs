use serde::{Deserialize, Serialize};

use crate::GhostPose;

/// 8-bit RGBA colour. Alpha 255 is opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Translucent black painted over the whole screen each frame.
    pub const fn fade(alpha: u8) -> Self {
        Self::new(0, 0, 0, alpha)
    }
}

/// Filled primitive in logical screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgba,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
}

impl DrawCommand {
    pub fn circle(x: f32, y: f32, radius: f32, color: Rgba) -> Self {
        Self::Circle {
            x,
            y,
            radius,
            color,
        }
    }

    pub fn rect(x: f32, y: f32, width: f32, height: f32, color: Rgba) -> Self {
        Self::Rect {
            x,
            y,
            width,
            height,
            color,
        }
    }
}

/// Head, body, two eyes with highlights, and a mouth whose height comes from
/// the pose.
pub fn ghost(pose: &GhostPose) -> [DrawCommand; 7] {
    let GhostPose { x, y, mouth_height } = *pose;

    [
        DrawCommand::circle(x, y - 50.0, 100.0, Rgba::WHITE),
        DrawCommand::rect(x - 100.0, y - 50.0, 200.0, 200.0, Rgba::WHITE),
        // left eye
        DrawCommand::circle(x - 50.0, y - 75.0, 20.0, Rgba::BLACK),
        DrawCommand::circle(x - 45.0, y - 70.0, 15.0, Rgba::WHITE),
        // right eye
        DrawCommand::circle(x + 50.0, y - 75.0, 20.0, Rgba::BLACK),
        DrawCommand::circle(x + 55.0, y - 70.0, 15.0, Rgba::WHITE),
        DrawCommand::rect(x - 50.0, y, 100.0, mouth_height, Rgba::BLACK),
    ]
}

/// Everything drawn in one frame: the fade overlay first, then each ghost in
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub commands: Vec<DrawCommand>,
}

impl SceneFrame {
    pub fn compose(width: u32, height: u32, fade_alpha: u8, poses: &[GhostPose]) -> Self {
        let mut commands = Vec::with_capacity(1 + poses.len() * 7);
        commands.push(DrawCommand::rect(
            0.0,
            0.0,
            width as f32,
            height as f32,
            Rgba::fade(fade_alpha),
        ));
        for pose in poses {
            commands.extend(ghost(pose));
        }
        Self { commands }
    }
}
