//! Mesh data structures, vertex deduplication and normalization

use crate::backend::types::Vertex;
use crate::resources::obj::{CornerIndex, ObjModel};
use crate::resources::{MeshError, MeshResult};
use glam::Vec3;
use std::collections::HashMap;
use std::path::Path;

/// Deduplicated positions plus one index per source corner
///
/// Vertices keep first-seen order. Every index is `< vertices.len()`.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub name: String,
}

impl MeshBuffer {
    pub fn new(name: &str) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: name.to_string(),
        }
    }

    /// Calculate vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Calculate index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Calculate triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Get index data as bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Position of every corner, in source order
    pub fn corner_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.indices
            .iter()
            .map(|&index| self.vertices[index as usize].position)
    }

    /// Build a buffer from a flat `x, y, z` attribute array and corner records
    ///
    /// Corners whose positions are bit-identical share one vertex. There is
    /// no tolerance: positions that differ in the last bit stay distinct.
    pub fn from_corners<I>(name: &str, positions: &[f32], corners: I) -> MeshResult<Self>
    where
        I: IntoIterator<Item = CornerIndex>,
    {
        let mut mesh = MeshBuffer::new(name);
        let mut seen: HashMap<Vertex, u32> = HashMap::new();

        for (corner, CornerIndex { vertex_index }) in corners.into_iter().enumerate() {
            let xyz = vertex_index
                .checked_mul(3)
                .and_then(|start| positions.get(start..start.checked_add(3)?));
            let Some(xyz) = xyz else {
                return Err(MeshError::OutOfRange {
                    corner,
                    vertex_index,
                    available: positions.len() / 3,
                });
            };
            let vertex = Vertex::new(Vec3::new(xyz[0], xyz[1], xyz[2]));

            let index = *seen.entry(vertex).or_insert_with(|| {
                mesh.vertices.push(vertex);
                (mesh.vertices.len() - 1) as u32
            });
            mesh.indices.push(index);
        }

        Ok(mesh)
    }

    /// Build a buffer from every shape of a parsed model
    pub fn from_obj(name: &str, model: &ObjModel) -> MeshResult<Self> {
        Self::from_corners(name, &model.positions, model.corners())
    }

    /// Read an OBJ file and deduplicate its vertices
    ///
    /// The result is not normalized.
    pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<Self> {
        let path = path.as_ref();
        let model = ObjModel::load(path)?;
        for warning in &model.warnings {
            log::warn!("{}: {}", path.display(), warning);
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mesh = Self::from_obj(&name, &model)?;

        log::info!(
            "Loaded mesh '{}': {} corners, {} unique vertices",
            mesh.name,
            mesh.index_count(),
            mesh.vertex_count()
        );
        Ok(mesh)
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for an empty buffer
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for vertex in &self.vertices {
            min = min.min(vertex.position);
            max = max.max(vertex.position);
        }
        Some((min, max))
    }

    /// Center the mesh on the origin and scale its bounding-box diagonal to 0.5
    ///
    /// `scale = 0.5 / length(max - min)` is taken from the current positions,
    /// not remembered: a second pass re-fits whatever is there, and on an
    /// untouched result it only adds rounding noise. Call it once per load.
    /// A zero-extent box, a non-finite position, or an extent too large or
    /// too small to scale in `f32` fails without touching the positions.
    pub fn normalize(&mut self) -> MeshResult<()> {
        if let Some((vertex, bad)) = self
            .vertices
            .iter()
            .enumerate()
            .find(|(_, v)| !v.position.is_finite())
        {
            return Err(MeshError::NonFinitePosition {
                vertex,
                position: bad.position.to_array(),
            });
        }

        let (min, max) = self.bounds().ok_or(MeshError::EmptyMesh)?;
        if min == max {
            return Err(MeshError::DegenerateMesh { point: min.to_array() });
        }

        // Spans past f32::MAX overflow to inf, sub-normal spans underflow to 0
        let diagonal = (max - min).length();
        let scale = 0.5 / diagonal;
        let center = (min + max) / 2.0;
        if !diagonal.is_finite() || diagonal == 0.0 || !scale.is_finite() || !center.is_finite() {
            return Err(MeshError::UnscalableExtent {
                min: min.to_array(),
                max: max.to_array(),
            });
        }

        for vertex in &mut self.vertices {
            vertex.position = (vertex.position - center) * scale;
        }
        Ok(())
    }

    /// Create an axis-aligned cube of edge 1 centered at origin
    ///
    /// Built from 12 triangles (36 corners) over 8 shared corner positions.
    pub fn cube() -> Self {
        let (positions, corners) = cube_corners();
        let mut mesh = MeshBuffer::new("cube");
        for (vertex_index, xyz) in positions.chunks_exact(3).enumerate() {
            debug_assert_eq!(vertex_index, mesh.vertices.len());
            mesh.vertices.push(Vertex::new(Vec3::from_slice(xyz)));
        }
        mesh.indices = corners.iter().map(|corner| corner.vertex_index as u32).collect();
        mesh
    }
}

/// Flat positions and triangle corners of a unit cube
pub(crate) fn cube_corners() -> (Vec<f32>, Vec<CornerIndex>) {
    #[rustfmt::skip]
    let positions = vec![
        -0.5, -0.5,  0.5,
         0.5, -0.5,  0.5,
         0.5,  0.5,  0.5,
        -0.5,  0.5,  0.5,
        -0.5, -0.5, -0.5,
         0.5, -0.5, -0.5,
         0.5,  0.5, -0.5,
        -0.5,  0.5, -0.5,
    ];

    // Two triangles per face: front, back, right, left, top, bottom
    let faces: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [5, 4, 7, 6],
        [1, 5, 6, 2],
        [4, 0, 3, 7],
        [3, 2, 6, 7],
        [4, 5, 1, 0],
    ];

    let mut corners = Vec::with_capacity(36);
    for [a, b, c, d] in faces {
        for vertex_index in [a, b, c, a, c, d] {
            corners.push(CornerIndex { vertex_index });
        }
    }

    (positions, corners)
}
