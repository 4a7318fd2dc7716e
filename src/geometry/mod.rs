//! Mesh geometry in both directions.
//!
//! Import reads the per-vertex arrays of a PDX mesh node into faces with per-corner
//! attributes. Export goes the other way: attributes are baked into scene space, vertices
//! are split wherever corners disagree, and skin influences are packed into four slots.

mod dedup;
mod export;
mod skin;

pub use dedup::{deduplicate_vertices, CornerKey, Dedup};
pub use export::{export_mesh, ExportedMesh};
pub use skin::{limit_influences, pack_skin, PackedSkin, MAX_INFLUENCES};

use cgmath::{InnerSpace, Matrix3, Vector3, Vector4};

use crate::converter::props::{optional_floats, optional_int, require_floats, require_ints};
use crate::converter::{ConvertError, Result};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::math::{transform_normal, uv_from_slice, PdxVector3};
use crate::pdx::PdxNode;
use crate::scene::{Face, MeshGeometry, SkinData};

/// A face corner with everything the exporter and the renderer need from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub key: CornerKey,
    pub tangent: Option<Vector4<f32>>,
}

fn flat_normal(geometry: &MeshGeometry, face: &Face) -> Vector3<f32> {
    let p = |k: usize| {
        geometry
            .positions
            .get(face.vertices[k] as usize)
            .copied()
            .unwrap_or(Vector3::new(0.0, 0.0, 0.0))
    };
    let n = (p(1) - p(0)).cross(p(2) - p(0));
    if n.magnitude2() > 0.0 {
        n.normalize()
    } else {
        n
    }
}

/// Every face corner in face order, normals carried through `normal_mat`. Faces without
/// normals get their flat face normal.
pub fn corners(geometry: &MeshGeometry, normal_mat: &Matrix3<f32>) -> Vec<Corner> {
    let mut out = Vec::with_capacity(geometry.faces.len() * 3);
    for face in &geometry.faces {
        let flat = if face.normals.is_none() {
            Some(flat_normal(geometry, face))
        } else {
            None
        };
        for k in 0..3 {
            let normal = match (&face.normals, flat) {
                (Some(normals), _) => normals[k],
                (None, Some(flat)) => flat,
                (None, None) => Vector3::new(0.0, 0.0, 0.0),
            };
            let uvs = (0..geometry.uv_channels)
                .map(|channel| face.uvs.get(channel).map(|uv| uv[k]))
                .collect();
            out.push(Corner {
                key: CornerKey {
                    vertex: face.vertices[k],
                    normal: transform_normal(normal_mat, normal),
                    uvs,
                },
                tangent: face.tangents.map(|t| t[k]),
            });
        }
    }
    out
}

/// Fails on the first face corner that points past the vertex list.
pub fn check_face_indices(name: &str, geometry: &MeshGeometry) -> Result<()> {
    let len = geometry.vertex_count();
    for face in &geometry.faces {
        if let Some(index) = face.vertices.iter().find(|index| **index as usize >= len) {
            return Err(ConvertError::IndexOutOfRange {
                node: name.to_string(),
                what: "triangle vertex",
                index: *index as i64,
                len,
            });
        }
    }
    Ok(())
}

fn out_of_range(node: &PdxNode, what: &'static str, index: i64, len: usize) -> ConvertError {
    ConvertError::IndexOutOfRange {
        node: node.name.clone(),
        what,
        index,
        len,
    }
}

/// Looks up the `stride`-sized record of `vertex` in a flat array.
fn record<'a>(
    node: &PdxNode,
    what: &'static str,
    data: &'a [f32],
    stride: usize,
    vertex: u32,
) -> Result<&'a [f32]> {
    let start = vertex as usize * stride;
    data.get(start..start + stride)
        .ok_or_else(|| out_of_range(node, what, vertex as i64, data.len() / stride))
}

/// Reads the geometry of a PDX mesh node. `bone_names` is the skeleton of the enclosing
/// shape, empty when it has none.
pub fn mesh_from_pdx(node: &PdxNode, bone_names: &[String], diagnostics: &mut Diagnostics) -> Result<MeshGeometry> {
    let positions: Vec<Vector3<f32>> = require_floats(node, "p", 3)?
        .chunks(3)
        .map(|c| PdxVector3::from_slice(c).0)
        .collect();
    let vertex_count = positions.len();

    let normals = optional_floats(node, "n", 3)?;
    let tangents = optional_floats(node, "ta", 4)?;
    let mut uv_sets = vec![];
    while let Some(uv) = optional_floats(node, &format!("u{}", uv_sets.len()), 2)? {
        uv_sets.push(uv);
    }

    let tri = require_ints(node, "tri")?;
    if tri.len() % 3 != 0 {
        return Err(ConvertError::BadStride {
            node: node.name.clone(),
            property: "tri".to_string(),
            stride: 3,
            len: tri.len(),
        });
    }

    let mut faces = Vec::with_capacity(tri.len() / 3);
    for corner in tri.chunks(3) {
        let mut vertices = [0u32; 3];
        for k in 0..3 {
            let index = corner[k];
            if index < 0 || index as usize >= vertex_count {
                return Err(out_of_range(node, "triangle vertex", index as i64, vertex_count));
            }
            vertices[k] = index as u32;
        }

        let normals = match &normals {
            Some(n) => {
                let mut out = [Vector3::new(0.0, 0.0, 0.0); 3];
                for k in 0..3 {
                    out[k] = PdxVector3::from_slice(record(node, "normal", n, 3, vertices[k])?).0;
                }
                Some(out)
            }
            None => None,
        };
        let tangents = match &tangents {
            Some(ta) => {
                let mut out = [Vector4::new(0.0, 0.0, 0.0, 0.0); 3];
                for k in 0..3 {
                    let t = record(node, "tangent", ta, 4, vertices[k])?;
                    out[k] = Vector4::new(t[0], t[1], t[2], t[3]);
                }
                Some(out)
            }
            None => None,
        };
        let mut uvs = Vec::with_capacity(uv_sets.len());
        for set in &uv_sets {
            let mut out = [uv_from_slice(&[0.0, 0.0]); 3];
            for k in 0..3 {
                out[k] = uv_from_slice(record(node, "uv", set, 2, vertices[k])?);
            }
            uvs.push(out);
        }

        faces.push(Face {
            vertices,
            normals,
            tangents,
            uvs,
        });
    }

    let skin = match node.object_of("skin") {
        Some(skin) => Some(skin_from_pdx(node, skin, vertex_count, bone_names, diagnostics)?),
        None => None,
    };

    Ok(MeshGeometry {
        positions,
        faces,
        uv_channels: uv_sets.len(),
        skin,
    })
}

fn skin_from_pdx(
    mesh: &PdxNode,
    skin: &PdxNode,
    vertex_count: usize,
    bone_names: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<SkinData> {
    let declared = optional_int(skin, "bones")?.ok_or_else(|| ConvertError::MissingProperty {
        node: skin.name.clone(),
        property: "bones".to_string(),
    })?;
    let used = if declared > MAX_INFLUENCES as i32 {
        diagnostics.warn(
            DiagnosticCode::InfluenceCountClamped,
            DiagnosticContext::node(mesh.name.clone()),
            format!(
                "skin of '{}' declares {} influences per vertex, reading {}",
                mesh.name, declared, MAX_INFLUENCES
            ),
        );
        MAX_INFLUENCES
    } else {
        declared.max(0) as usize
    };

    let ix = require_ints(skin, "ix")?;
    if ix.len() % 4 != 0 {
        return Err(ConvertError::BadStride {
            node: skin.name.clone(),
            property: "ix".to_string(),
            stride: 4,
            len: ix.len(),
        });
    }
    let w = require_floats(skin, "w", 4)?;
    let available = (ix.len() / 4).min(w.len() / 4);
    if available < vertex_count {
        return Err(out_of_range(mesh, "skin vertex", available as i64, vertex_count));
    }

    let mut indices = Vec::with_capacity(vertex_count);
    let mut weights = Vec::with_capacity(vertex_count);
    for v in 0..vertex_count {
        let mut vi = [-1i32; 4];
        let mut vw = [0.0f32; 4];
        for k in 0..used {
            let index = ix[v * 4 + k];
            if !bone_names.is_empty() && index >= bone_names.len() as i32 {
                return Err(out_of_range(mesh, "bone", index as i64, bone_names.len()));
            }
            vi[k] = index;
            vw[k] = w[v * 4 + k];
        }
        indices.push(vi);
        weights.push(vw);
    }

    Ok(SkinData {
        bone_names: bone_names.to_vec(),
        indices,
        weights,
    })
}
