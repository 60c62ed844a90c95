//! The selection marker component
//!
//! Ties the mesh, its GPU resources and the selection state together behind
//! the operations the owning application calls: initialize once, then per
//! frame `advance_frame` and `render`, input-driven `set_selected`/`move_*`,
//! and `teardown` when done.

use crate::backend::{BackendError, GraphicsContext, ProgramHandle};
use crate::resources::{GpuMesh, MeshBuffer, MeshError};
use crate::scene::{BlinkTimer, SelectionState};
use crate::MarkerConfig;
use glam::{Mat4, Vec3};
use std::time::Duration;
use thiserror::Error;

/// Marker initialization error
#[derive(Error, Debug)]
pub enum MarkerError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type MarkerResult<T> = Result<T, MarkerError>;

/// A single blinking, grid-constrained selection marker
#[derive(Debug)]
pub struct SelectionMarker {
    config: MarkerConfig,
    program: ProgramHandle,
    mesh: MeshBuffer,
    gpu: GpuMesh,
    state: SelectionState,
    blink_timer: BlinkTimer,
    last_frame_position: Vec3,
}

impl SelectionMarker {
    /// Load the configured model and upload it for `program`
    pub fn initialize<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        program: ProgramHandle,
        config: MarkerConfig,
    ) -> MarkerResult<Self> {
        let mesh = MeshBuffer::load_obj(&config.model_path)?;
        Self::from_mesh(ctx, program, mesh, config)
    }

    /// Initialize from an already deduplicated, not yet normalized mesh
    pub fn from_mesh<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        program: ProgramHandle,
        mut mesh: MeshBuffer,
        config: MarkerConfig,
    ) -> MarkerResult<Self> {
        mesh.normalize()?;

        let mut gpu = GpuMesh::new();
        upload(ctx, &mut gpu, program, &mesh, &config)?;

        log::info!(
            "Selection marker ready: mesh '{}' ({} vertices, {} triangles)",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        let state = SelectionState::new(config.start_position, config.palette, config.bounds);
        Ok(Self {
            program,
            mesh,
            gpu,
            blink_timer: BlinkTimer::new(config.blink_interval),
            last_frame_position: state.position(),
            state,
            config,
        })
    }

    /// Re-read the model file and rebuild the GPU resources
    ///
    /// A model that fails to load leaves the current resources in place; a
    /// failed upload releases them. The selection state is kept.
    pub fn reload<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) -> MarkerResult<()> {
        let mut mesh = MeshBuffer::load_obj(&self.config.model_path)?;
        mesh.normalize()?;

        upload(ctx, &mut self.gpu, self.program, &mesh, &self.config)?;
        self.mesh = mesh;
        Ok(())
    }

    /// Draw the marker with its current transform and color
    pub fn render<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        let model = self.model_matrix();
        self.gpu.draw(ctx, &model, self.state.color());
    }

    /// Upload the camera matrices to the marker's program
    pub fn upload_camera<C: GraphicsContext + ?Sized>(&self, ctx: &mut C, view: &Mat4, projection: &Mat4) {
        self.gpu.upload_camera(ctx, view, projection);
    }

    /// Advance the blink timer by `dt`
    ///
    /// Returns whether a blink update fired this frame. While selected the
    /// timer still runs but the color does not change.
    pub fn advance_frame(&mut self, dt: Duration) -> bool {
        self.last_frame_position = self.state.position();
        if !self.blink_timer.tick(dt) {
            return false;
        }
        self.state.blink();
        true
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.state.select(selected);
    }

    /// Move along X; out-of-bounds moves are ignored
    pub fn move_x(&mut self, delta: f32) -> bool {
        self.state.move_along_x(delta)
    }

    /// Move along Z; out-of-bounds moves are ignored
    pub fn move_z(&mut self, delta: f32) -> bool {
        self.state.move_along_z(delta)
    }

    /// Release all GPU resources; safe to call more than once
    pub fn teardown<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        self.gpu.destroy(ctx);
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.state.model_matrix(self.config.model_scale)
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn mesh(&self) -> &MeshBuffer {
        &self.mesh
    }

    pub fn gpu(&self) -> &GpuMesh {
        &self.gpu
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Position at the start of the most recent `advance_frame`
    pub fn last_frame_position(&self) -> Vec3 {
        self.last_frame_position
    }
}

/// Create buffers and layout, releasing everything again on failure
fn upload<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    gpu: &mut GpuMesh,
    program: ProgramHandle,
    mesh: &MeshBuffer,
    config: &MarkerConfig,
) -> Result<(), BackendError> {
    let result = match gpu.create_buffers(ctx, mesh) {
        Ok(()) => gpu.bind_layout(ctx, program, &config.shader_names),
        Err(err) => Err(err),
    };
    if result.is_err() {
        gpu.destroy(ctx);
    }
    result
}
