//! Wavefront OBJ reader
//!
//! Produces the raw view of a model that mesh building consumes: one flat
//! position array (`x, y, z` per vertex) and a list of shapes, each a list of
//! triangle corners pointing into that array. Faces with more than three
//! corners are fan-triangulated. Texture coordinates, normals and materials
//! are skipped.

use crate::resources::{MeshError, MeshResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One corner of a triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerIndex {
    /// Zero-based vertex index into [`ObjModel::positions`] (in triples)
    pub vertex_index: usize,
}

/// A named group of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjShape {
    pub name: String,
    pub corners: Vec<CornerIndex>,
}

impl ObjShape {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            corners: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }
}

/// Parsed OBJ contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    /// Flat `x, y, z` position attribute array
    pub positions: Vec<f32>,
    pub shapes: Vec<ObjShape>,
    /// Non-fatal problems found while parsing
    pub warnings: Vec<String>,
}

impl ObjModel {
    /// Number of `v` records read
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Total corner count over all shapes
    pub fn corner_count(&self) -> usize {
        self.shapes.iter().map(|shape| shape.corners.len()).sum()
    }

    /// Corners of every shape, in shape order
    pub fn corners(&self) -> impl Iterator<Item = CornerIndex> + '_ {
        self.shapes.iter().flat_map(|shape| shape.corners.iter().copied())
    }

    /// Read a model from a file
    ///
    /// Missing files and malformed contents are both reported as
    /// [`MeshError::Load`] carrying the path.
    pub fn load(path: impl AsRef<Path>) -> MeshResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| MeshError::Load {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::parse(BufReader::new(file)).map_err(|err| match err {
            MeshError::Load { .. } => err,
            other => MeshError::Load {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })
    }

    /// Parse a model from a string
    pub fn parse_str(source: &str) -> MeshResult<Self> {
        Self::parse(source.as_bytes())
    }

    /// Parse a model from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> MeshResult<Self> {
        let mut model = ObjModel::default();
        let mut current = ObjShape::default();

        for (line_index, line) in reader.lines().enumerate() {
            let line_number = line_index + 1;
            let line = line.map_err(|err| MeshError::Parse {
                line: line_number,
                message: err.to_string(),
            })?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };

            match keyword {
                "v" => {
                    let coords: Vec<&str> = parts.collect();
                    if coords.len() < 3 {
                        return Err(MeshError::Parse {
                            line: line_number,
                            message: format!("vertex needs 3 coordinates, found {}", coords.len()),
                        });
                    }
                    for coord in &coords[..3] {
                        let value: f32 = coord.parse().map_err(|_| MeshError::Parse {
                            line: line_number,
                            message: format!("invalid coordinate: {}", coord),
                        })?;
                        if !value.is_finite() {
                            return Err(MeshError::Parse {
                                line: line_number,
                                message: format!("coordinate is not a finite number: {}", coord),
                            });
                        }
                        model.positions.push(value);
                    }
                }
                "f" => {
                    let refs: Vec<&str> = parts.collect();
                    if refs.len() < 3 {
                        model.warnings.push(format!(
                            "line {}: face with {} corners skipped",
                            line_number,
                            refs.len()
                        ));
                        continue;
                    }
                    let vertex_count = model.vertex_count();
                    let face = refs
                        .iter()
                        .map(|reference| resolve_reference(reference, vertex_count, line_number))
                        .collect::<MeshResult<Vec<_>>>()?;

                    // Fan triangulation for n-gons
                    for i in 1..(face.len() - 1) {
                        current.corners.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                "o" | "g" => {
                    let name = line[keyword.len()..].trim();
                    if current.corners.is_empty() {
                        current.name = name.to_string();
                    } else {
                        model.shapes.push(std::mem::replace(&mut current, ObjShape::named(name)));
                    }
                }
                "vt" | "vn" | "vp" | "s" | "usemtl" | "mtllib" | "l" | "p" => {}
                other => {
                    model
                        .warnings
                        .push(format!("line {}: unknown statement '{}' ignored", line_number, other));
                }
            }
        }

        if !current.corners.is_empty() {
            model.shapes.push(current);
        }

        Ok(model)
    }
}

/// Resolve one `v`, `v/vt`, `v//vn` or `v/vt/vn` face reference
fn resolve_reference(reference: &str, vertex_count: usize, line: usize) -> MeshResult<CornerIndex> {
    let position = reference.split('/').next().unwrap_or(reference);
    let raw: i64 = position.parse().map_err(|_| MeshError::Parse {
        line,
        message: format!("invalid face index: {}", reference),
    })?;

    let vertex_index = match raw {
        0 => {
            return Err(MeshError::Parse {
                line,
                message: "face index 0 is not valid (OBJ indices start at 1)".to_string(),
            })
        }
        // OBJ uses 1-based indexing
        positive if positive > 0 => (positive - 1) as usize,
        // Negative indices count back from the most recent vertex
        negative => {
            let resolved = vertex_count as i64 + negative;
            if resolved < 0 {
                return Err(MeshError::Parse {
                    line,
                    message: format!(
                        "relative face index {} reaches before the first vertex",
                        negative
                    ),
                });
            }
            resolved as usize
        }
    };

    Ok(CornerIndex { vertex_index })
}
