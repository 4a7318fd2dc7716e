use cgmath::{Matrix3, SquareMatrix, Vector2, Vector3, Vector4};

use crate::converter::Result;
use crate::geometry::{check_face_indices, corners, deduplicate_vertices};
use crate::material::Material;
use crate::math::Aabb;

/// One triangle. Attributes are stored per corner so two faces may give the same vertex
/// different normals or UVs; flattening resolves that by splitting the vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: [u32; 3],
    pub normals: Option<[Vector3<f32>; 3]>,
    pub tangents: Option<[Vector4<f32>; 3]>,
    /// One entry per UV channel.
    pub uvs: Vec<[Vector2<f32>; 3]>,
}

/// Per-vertex skin. Indices point into `bone_names`; `-1` marks an unused slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinData {
    pub bone_names: Vec<String>,
    pub indices: Vec<[i32; 4]>,
    pub weights: Vec<[f32; 4]>,
}

impl SkinData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshGeometry {
    pub positions: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
    pub uv_channels: usize,
    pub skin: Option<SkinData>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.as_ref().map(|skin| !skin.is_empty()).unwrap_or(false)
    }

    /// Flattens the faces into GPU-style buffers, splitting vertices whose corners disagree
    /// on normal or UVs. `name` only labels the error for a face past the vertex list.
    pub fn render_buffers(&self, name: &str) -> Result<RenderBuffers> {
        check_face_indices(name, self)?;
        let corners = corners(self, &Matrix3::identity());
        let keys: Vec<_> = corners.iter().map(|corner| corner.key.clone()).collect();
        let dedup = deduplicate_vertices(self.vertex_count(), &keys);

        let mut vertices: Vec<SkinnedVertex> = dedup
            .sources
            .iter()
            .map(|source| {
                let source = *source as usize;
                let p = self.positions[source];
                let (bone_indices, bone_weights) = self
                    .skin
                    .as_ref()
                    .and_then(|skin| Some((*skin.indices.get(source)?, *skin.weights.get(source)?)))
                    .unwrap_or(([-1; 4], [0.0; 4]));
                SkinnedVertex {
                    position: [p.x, p.y, p.z],
                    normal: [0.0; 3],
                    tangent: [0.0; 4],
                    uvs: vec![[0.0; 2]; self.uv_channels],
                    bone_indices,
                    bone_weights,
                }
            })
            .collect();

        for (corner, target) in corners.iter().zip(dedup.corner_vertices.iter()) {
            let vertex = &mut vertices[*target as usize];
            let n = corner.key.normal;
            vertex.normal = [n.x, n.y, n.z];
            if let Some(t) = corner.tangent {
                vertex.tangent = [t.x, t.y, t.z, t.w];
            }
            for (channel, uv) in corner.key.uvs.iter().enumerate() {
                if let Some(uv) = uv {
                    vertex.uvs[channel] = [uv.x, uv.y];
                }
            }
        }

        let triangles = dedup
            .corner_vertices
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        Ok(RenderBuffers { vertices, triangles })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub uvs: Vec<[f32; 2]>,
    pub bone_indices: [i32; 4],
    pub bone_weights: [f32; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderBuffers {
    pub vertices: Vec<SkinnedVertex>,
    pub triangles: Vec<[u32; 3]>,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: MeshGeometry,
    pub material: Material,
    /// Bounds recorded by the source asset.
    pub aabb: Option<Aabb>,
}

impl Mesh {
    pub fn is_collider(&self) -> bool {
        self.material.is_collider()
    }
}
