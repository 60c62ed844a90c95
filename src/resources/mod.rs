//! Resource management
//!
//! Handles loading, deduplication and normalization of the marker mesh, and
//! the GPU resources it is uploaded into.

mod gpu_mesh;
mod mesh;
pub mod obj;

pub use gpu_mesh::*;
pub use mesh::*;
pub use obj::{CornerIndex, ObjModel, ObjShape};

use std::path::PathBuf;
use thiserror::Error;

/// Mesh loading error type
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Failed to load model {} ({message})", .path.display())]
    Load { path: PathBuf, message: String },
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Corner {corner} references vertex {vertex_index} but only {available} vertices exist")]
    OutOfRange {
        corner: usize,
        vertex_index: usize,
        available: usize,
    },
    #[error("Mesh has zero extent (every vertex at {point:?})")]
    DegenerateMesh { point: [f32; 3] },
    #[error("Mesh extent from {min:?} to {max:?} cannot be scaled to a finite size")]
    UnscalableExtent { min: [f32; 3], max: [f32; 3] },
    #[error("Vertex {vertex} has a non-finite position {position:?}")]
    NonFinitePosition { vertex: usize, position: [f32; 3] },
    #[error("Mesh has no vertices")]
    EmptyMesh,
}

pub type MeshResult<T> = Result<T, MeshError>;
