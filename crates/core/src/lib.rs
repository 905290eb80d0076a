//! Core library for the Talking Ghosties demo.
//!
//! Two ghosts are drawn with mouths that open and close with the left and
//! right channels of a soundtrack. Each module owns one piece of that:
//! reshaping audio and measuring channel volume ([`analysis`]), feeding the
//! decoded stream through that processor on its way to the device
//! ([`audio`]), turning volume into ghost poses ([`mapping`]) and draw
//! commands ([`scene`]), and rasterising them for a terminal ([`render`]).

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod mapping;
pub mod render;
pub mod scene;
pub mod timeline;

pub use analysis::{shape_sample, ChannelLevels, EnvelopeTransform, StereoLevel};
pub use audio::{AudioEngine, AudioSink, MusicStream, ProcessedSource, ProcessorHook};
pub use config::{AnimationConfig, AppConfig, AudioConfig, WindowConfig};
pub use error::{GhostiesError, Result};
pub use mapping::{AnimationDriver, GhostPose};
pub use render::{FrameWidget, Framebuffer, RenderGraph};
pub use scene::{ghost, DrawCommand, Rgba, SceneFrame};
pub use timeline::{FramePacer, PlaybackClock};
