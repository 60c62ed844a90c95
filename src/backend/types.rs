//! Common types shared between graphics contexts

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::hash::{Hash, Hasher};

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Index data consumed by indexed draws
    ElementArray,
}

/// Buffer usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    StaticDraw,
}

/// Vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x3,
}

impl VertexFormat {
    /// Size in bytes of one attribute value
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32x3 => 12,
        }
    }

    /// Number of float components
    pub fn components(&self) -> u32 {
        match self {
            VertexFormat::Float32x3 => 3,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub stride: u64,
    pub offset: u64,
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
}

/// Index format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint32,
}

impl IndexFormat {
    pub fn size(&self) -> u64 {
        match self {
            IndexFormat::Uint32 => 4,
        }
    }
}

/// Position-only vertex
///
/// Equality and hashing compare the raw bit patterns of the three
/// coordinates, so only bit-identical positions are considered equal.
/// `0.0` and `-0.0` are distinct keys and two NaNs with the same payload
/// are the same key.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }

    fn key(&self) -> [u32; 3] {
        [
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
        ]
    }

    /// Attribute layout of a tightly packed position buffer
    pub fn position_attribute(location: u32) -> VertexAttribute {
        VertexAttribute {
            location,
            format: VertexFormat::Float32x3,
            stride: std::mem::size_of::<Self>() as u64,
            offset: 0,
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
