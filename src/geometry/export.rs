use cgmath::{Matrix4, Vector3};

use super::{check_face_indices, corners, deduplicate_vertices, pack_skin, PackedSkin};
use crate::converter::Result;
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::math::{normal_matrix, transform_point, transform_tangent, Aabb};
use crate::scene::MeshGeometry;
use crate::skeleton::Skeleton;

/// Flat per-vertex arrays of one mesh in scene space, in PDX layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMesh {
    pub vertex_count: usize,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tangents: Vec<f32>,
    /// One array per UV channel, two floats per vertex.
    pub uvs: Vec<Vec<f32>>,
    pub triangles: Vec<i32>,
    pub aabb: Aabb,
    /// Present when the mesh is skinned and a skeleton was exported.
    pub skin: Option<PackedSkin>,
}

impl ExportedMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }
}

/// Bakes a mesh into scene space and flattens it for the PDX tree.
///
/// Vertices are split wherever two face corners disagree on normal or UVs; a split vertex
/// copies the position and skin of its original. Attributes a face lacks are written as
/// zeros.
pub fn export_mesh(
    name: &str,
    geometry: &MeshGeometry,
    world: &Matrix4<f32>,
    skeleton: &Skeleton,
    flip_uv_v: bool,
    diagnostics: &mut Diagnostics,
) -> Result<ExportedMesh> {
    check_face_indices(name, geometry)?;
    let original_count = geometry.vertex_count();

    if geometry.faces.iter().any(|face| face.normals.is_none()) {
        diagnostics.warn(
            DiagnosticCode::MissingNormals,
            DiagnosticContext::node(name),
            format!("mesh '{}' has faces without normals, using face normals", name),
        );
    }

    let corners = corners(geometry, &normal_matrix(world));
    let keys: Vec<_> = corners.iter().map(|corner| corner.key.clone()).collect();
    let dedup = deduplicate_vertices(original_count, &keys);
    let vertex_count = dedup.vertex_count();

    let packed = match &geometry.skin {
        Some(skin) if !skin.is_empty() && !skeleton.is_empty() => {
            Some(pack_skin(name, skin, skeleton, original_count, diagnostics)?)
        }
        Some(skin) if !skin.is_empty() => {
            diagnostics.warn(
                DiagnosticCode::SkinDropped,
                DiagnosticContext::node(name),
                format!("mesh '{}' is skinned but the scene has no bones, skin not exported", name),
            );
            None
        }
        _ => None,
    };

    let world_positions: Vec<Vector3<f32>> = geometry
        .positions
        .iter()
        .map(|p| transform_point(world, *p))
        .collect();

    let mut positions = Vec::with_capacity(vertex_count * 3);
    for source in &dedup.sources {
        let p = world_positions[*source as usize];
        positions.extend_from_slice(&[p.x, p.y, p.z]);
    }

    let mut normals = vec![0.0f32; vertex_count * 3];
    let mut tangents = vec![0.0f32; vertex_count * 4];
    let mut uvs = vec![vec![0.0f32; vertex_count * 2]; geometry.uv_channels];
    let mut triangles = Vec::with_capacity(corners.len());

    for (corner, vertex) in corners.iter().zip(dedup.corner_vertices.iter()) {
        let v = *vertex as usize;
        let n = corner.key.normal;
        normals[v * 3..v * 3 + 3].copy_from_slice(&[n.x, n.y, n.z]);
        if let Some(t) = corner.tangent {
            let t = transform_tangent(world, t);
            tangents[v * 4..v * 4 + 4].copy_from_slice(&[t.x, t.y, t.z, t.w]);
        }
        for (channel, uv) in corner.key.uvs.iter().enumerate() {
            if let Some(uv) = uv {
                let v_coord = if flip_uv_v { 1.0 - uv.y } else { uv.y };
                uvs[channel][v * 2..v * 2 + 2].copy_from_slice(&[uv.x, v_coord]);
            }
        }
        triangles.push(*vertex as i32);
    }

    let skin = packed.map(|packed| PackedSkin {
        bones_used: packed.bones_used,
        indices: dedup
            .sources
            .iter()
            .map(|source| packed.indices[*source as usize])
            .collect(),
        weights: dedup
            .sources
            .iter()
            .map(|source| packed.weights[*source as usize])
            .collect(),
    });

    let aabb = if world_positions.is_empty() {
        Aabb {
            min: [0.0; 3],
            max: [0.0; 3],
        }
    } else {
        Aabb::from_points(world_positions.iter())
    };

    log::debug!(
        "mesh '{}': {} vertices in, {} out, {} triangles",
        name,
        original_count,
        vertex_count,
        triangles.len() / 3
    );

    Ok(ExportedMesh {
        vertex_count,
        positions,
        normals,
        tangents,
        uvs,
        triangles,
        aabb,
        skin,
    })
}
