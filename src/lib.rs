//! Board Cursor - a blinking selection marker for board-game renderers
//!
//! Loads a marker mesh from a Wavefront OBJ file, deduplicates and
//! normalizes it, uploads it through a small OpenGL-shaped context trait and
//! animates it as a cursor that the player moves across the board.
//!
//! # Features
//! - Exact-position vertex deduplication into indexed buffers
//! - Normalization into a 0.5-diagonal box centered on the origin
//! - Scoped GPU resource lifecycle with explicit binding guards
//! - Moving/Selected state machine with a polled blink timer
//! - Headless recording context for tests and tooling
//! - OpenGL backend over glow (`gl` feature)

pub mod backend;
pub mod marker;
pub mod resources;
pub mod scene;

pub use marker::{MarkerError, MarkerResult, SelectionMarker};
pub use resources::{MeshBuffer, MeshError, ShaderNames};
pub use scene::{BlinkPalette, MovementBounds, SelectionStatus};

use glam::Vec3;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a selection marker
#[derive(Debug, Clone)]
pub struct MarkerConfig {
    /// OBJ file the marker mesh is loaded from
    pub model_path: PathBuf,
    /// Position at creation
    pub start_position: Vec3,
    /// Allowed range for X and Z
    pub bounds: MovementBounds,
    /// Uniform scale applied to the normalized mesh when drawing
    pub model_scale: f32,
    /// Time between blink toggles
    pub blink_interval: Duration,
    pub palette: BlinkPalette,
    pub shader_names: ShaderNames,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/select.obj"),
            start_position: Vec3::new(-0.8, 0.0, 0.6),
            bounds: MovementBounds::default(),
            model_scale: 0.45,
            blink_interval: Duration::from_millis(250),
            palette: BlinkPalette::default(),
            shader_names: ShaderNames::default(),
        }
    }
}

impl MarkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_start_position(mut self, position: Vec3) -> Self {
        self.start_position = position;
        self
    }

    pub fn with_bounds(mut self, bounds: MovementBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_model_scale(mut self, scale: f32) -> Self {
        self.model_scale = scale;
        self
    }

    pub fn with_blink_interval(mut self, interval: Duration) -> Self {
        self.blink_interval = interval;
        self
    }

    pub fn with_palette(mut self, palette: BlinkPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_shader_names(mut self, names: ShaderNames) -> Self {
        self.shader_names = names;
        self
    }
}
