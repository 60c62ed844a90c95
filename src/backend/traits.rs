//! Core graphics context abstraction
//!
//! The trait mirrors the small slice of an OpenGL-style API that the marker
//! needs: vertex arrays, buffers, attribute/uniform lookup and indexed draws.
//! Both the recording context and the glow context implement it.

use crate::backend::types::*;
use glam::{Mat4, Vec4};
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create {kind}: {message}")]
    ResourceCreationFailed { kind: &'static str, message: String },
    #[error("Unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u64 },
    #[error("Missing {0}: create it first")]
    MissingResource(&'static str),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub(crate) u64);

/// Handle to a linked shader program owned by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub(crate) u64);

/// Resolved location of a uniform variable in a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub(crate) u64);

macro_rules! impl_raw_id {
    ($($handle:ty),*) => {
        $(
            impl $handle {
                /// Raw identifier, stable for the lifetime of the resource
                pub fn id(&self) -> u64 {
                    self.0
                }
            }
        )*
    };
}

impl_raw_id!(BufferHandle, VertexArrayHandle, ProgramHandle, UniformLocation);

/// Graphics context trait
///
/// Binding calls mutate context-wide state exactly like their OpenGL
/// counterparts. Prefer [`VertexArrayBinding`](crate::backend::VertexArrayBinding)
/// over raw `bind_vertex_array` calls so the binding is released on every
/// exit path.
pub trait GraphicsContext {
    // Resource lifecycle

    /// Create a vertex array object
    fn create_vertex_array(&mut self) -> BackendResult<VertexArrayHandle>;

    /// Delete a vertex array object
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// Create a buffer object
    fn create_buffer(&mut self) -> BackendResult<BufferHandle>;

    /// Delete a buffer object
    fn delete_buffer(&mut self, buffer: BufferHandle);

    // Binding state

    /// Bind a vertex array, or unbind with `None`
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>);

    /// Bind a buffer to a target, or unbind the target with `None`
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Upload data into the buffer currently bound to `target`
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    // Program interface

    /// Look up a vertex attribute by name
    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Look up a uniform variable by name
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Enable and describe a float attribute sourced from the bound array buffer
    fn enable_vertex_attribute(&mut self, attribute: &VertexAttribute);

    /// Set a 4x4 matrix uniform
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// Set a vec4 uniform
    fn set_uniform_vec4(&mut self, location: UniformLocation, value: Vec4);

    // Drawing

    /// Draw `count` indices from the element buffer of the bound vertex array
    fn draw_indexed(&mut self, topology: PrimitiveTopology, count: u32, format: IndexFormat);
}
