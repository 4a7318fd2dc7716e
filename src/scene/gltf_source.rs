//! Loads a glTF document into a `Scene` for export.
//!
//! Skin joints become bone nodes and primitives become mesh nodes. A node with a single
//! primitive carries the mesh itself; several primitives hang below it as `<name>_<i>`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3, Vector4};

use super::{Face, Mesh, MeshGeometry, NodeId, NodeKind, Scene, SkinData};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::geometry::limit_influences;
use crate::material::{Material, Shader, TextureRef};

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn texture_ref(texture: gltf::Texture) -> TextureRef {
    let image = texture.source();
    let file_name = match image.source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => uri
            .rsplit('/')
            .next()
            .unwrap_or(uri)
            .to_string(),
        _ => image
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("texture_{}", image.index())),
    };
    TextureRef {
        path: file_name.clone().into(),
        file_name,
    }
}

fn material_from_gltf(material: gltf::Material, skinned: bool) -> Material {
    if material.name() == Some("Collision") {
        return Material::collider();
    }

    let transparent = material.alpha_mode() == gltf::material::AlphaMode::Blend;
    let mut out = Material::lit(if transparent {
        Shader::PdxMeshAlphaBlend
    } else {
        Shader::PdxMeshStandard
    });
    out.diffuse = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .map(|info| texture_ref(info.texture()));
    out.normal = material
        .normal_texture()
        .map(|info| texture_ref(info.texture()));
    out.skinning = skinned;
    out
}

fn mesh_from_primitive(
    name: &str,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    bone_names: Option<&[String]>,
    diagnostics: &mut Diagnostics,
) -> anyhow::Result<Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        bail!("mesh '{}' uses {:?} primitives, only triangles are supported", name, primitive.mode());
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<Vector3<f32>> = reader
        .read_positions()
        .ok_or_else(|| anyhow!("mesh '{}' has no positions", name))?
        .map(Vector3::from)
        .collect();
    let vertex_count = positions.len();

    let normals: Option<Vec<Vector3<f32>>> = reader
        .read_normals()
        .map(|normals| normals.map(Vector3::from).collect());
    let tangents: Option<Vec<Vector4<f32>>> = reader
        .read_tangents()
        .map(|tangents| tangents.map(Vector4::from).collect());
    let mut uv_sets: Vec<Vec<Vector2<f32>>> = vec![];
    while let Some(uvs) = reader.read_tex_coords(uv_sets.len() as u32) {
        uv_sets.push(uvs.into_f32().map(Vector2::from).collect());
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertex_count as u32).collect(),
    };

    let attribute = |len: usize, what: &str, index: u32| -> anyhow::Result<usize> {
        let index = index as usize;
        if index >= len {
            bail!("mesh '{}': {} index {} out of range ({})", name, what, index, len);
        }
        Ok(index)
    };

    let mut faces = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let vertices = [tri[0], tri[1], tri[2]];
        for index in vertices {
            attribute(vertex_count, "vertex", index)?;
        }
        let normals = match &normals {
            Some(n) => Some([
                n[attribute(n.len(), "normal", vertices[0])?],
                n[attribute(n.len(), "normal", vertices[1])?],
                n[attribute(n.len(), "normal", vertices[2])?],
            ]),
            None => None,
        };
        let tangents = match &tangents {
            Some(t) => Some([
                t[attribute(t.len(), "tangent", vertices[0])?],
                t[attribute(t.len(), "tangent", vertices[1])?],
                t[attribute(t.len(), "tangent", vertices[2])?],
            ]),
            None => None,
        };
        let mut uvs = Vec::with_capacity(uv_sets.len());
        for set in &uv_sets {
            uvs.push([
                set[attribute(set.len(), "uv", vertices[0])?],
                set[attribute(set.len(), "uv", vertices[1])?],
                set[attribute(set.len(), "uv", vertices[2])?],
            ]);
        }
        faces.push(Face {
            vertices,
            normals,
            tangents,
            uvs,
        });
    }

    let skin = match bone_names {
        Some(bone_names) => {
            let mut influences: Vec<Vec<(i32, f32)>> = vec![Vec::new(); vertex_count];
            let mut set = 0;
            while let (Some(joints), Some(weights)) = (reader.read_joints(set), reader.read_weights(set)) {
                for (v, (j, w)) in joints.into_u16().zip(weights.into_f32()).enumerate().take(vertex_count) {
                    for k in 0..4 {
                        influences[v].push((j[k] as i32, w[k]));
                    }
                }
                set += 1;
            }

            let mut skin = SkinData {
                bone_names: bone_names.to_vec(),
                indices: Vec::with_capacity(vertex_count),
                weights: Vec::with_capacity(vertex_count),
            };
            for (v, vertex) in influences.iter().enumerate() {
                if vertex.iter().any(|(_, w)| !w.is_finite()) {
                    diagnostics.warn(
                        DiagnosticCode::InvalidSkinWeight,
                        DiagnosticContext::node(name).with_vertex(v),
                        format!("vertex {} of '{}' has a non-finite weight, influence dropped", v, name),
                    );
                }
                let (indices, weights, truncated) = limit_influences(vertex);
                if truncated {
                    diagnostics.warn(
                        DiagnosticCode::InfluencesTruncated,
                        DiagnosticContext::node(name).with_vertex(v),
                        format!("vertex {} of '{}' has more than 4 influences, kept the heaviest", v, name),
                    );
                }
                skin.indices.push(indices);
                skin.weights.push(weights);
            }
            Some(skin)
        }
        None => None,
    };

    let material = material_from_gltf(primitive.material(), skin.is_some());
    Ok(Mesh {
        geometry: MeshGeometry {
            positions,
            faces,
            uv_channels: uv_sets.len(),
            skin,
        },
        material,
        aabb: None,
    })
}

struct Loader<'a> {
    buffers: &'a [gltf::buffer::Data],
    joints: HashSet<usize>,
    scene: Scene,
    diagnostics: Diagnostics,
}

impl Loader<'_> {
    fn add_node(&mut self, node: gltf::Node, parent: NodeId) -> anyhow::Result<()> {
        let name = node_name(&node);
        let local = Matrix4::from(node.transform().matrix());
        let is_joint = self.joints.contains(&node.index());
        let bone_names: Option<Vec<String>> = node
            .skin()
            .map(|skin| skin.joints().map(|joint| node_name(&joint)).collect());

        let primitives: Vec<gltf::Primitive> = node
            .mesh()
            .map(|mesh| mesh.primitives().collect())
            .unwrap_or_default();

        let id = if primitives.len() == 1 && !is_joint {
            let mesh = mesh_from_primitive(
                &name,
                &primitives[0],
                self.buffers,
                bone_names.as_deref(),
                &mut self.diagnostics,
            )?;
            self.scene.add_child(parent, name, NodeKind::Mesh(Box::new(mesh)), local)
        } else {
            let kind = if is_joint { NodeKind::Bone } else { NodeKind::Group };
            let id = self.scene.add_child(parent, name.clone(), kind, local);
            for (i, primitive) in primitives.iter().enumerate() {
                let child_name = format!("{}_{}", name, i);
                let mesh = mesh_from_primitive(
                    &child_name,
                    primitive,
                    self.buffers,
                    bone_names.as_deref(),
                    &mut self.diagnostics,
                )?;
                self.scene.add_child(id, child_name, NodeKind::Mesh(Box::new(mesh)), Matrix4::identity());
            }
            id
        };

        for child in node.children() {
            self.add_node(child, id)?;
        }
        Ok(())
    }
}

/// Builds a scene from an already loaded document: the default scene, or the first one.
pub fn scene_from_gltf(doc: &gltf::Document, buffers: &[gltf::buffer::Data]) -> anyhow::Result<(Scene, Diagnostics)> {
    let joints = doc
        .skins()
        .flat_map(|skin| skin.joints().map(|joint| joint.index()).collect::<Vec<_>>())
        .collect();

    let Some(gltf_scene) = doc.default_scene().or_else(|| doc.scenes().next()) else {
        return Ok((Scene::new("scene"), Diagnostics::new()));
    };

    let mut loader = Loader {
        buffers,
        joints,
        scene: Scene::new(gltf_scene.name().unwrap_or("scene")),
        diagnostics: Diagnostics::new(),
    };
    let root = loader.scene.root();
    for node in gltf_scene.nodes() {
        loader.add_node(node, root)?;
    }

    log::debug!("loaded glTF scene with {} nodes", loader.scene.len());
    Ok((loader.scene, loader.diagnostics))
}

pub fn load_gltf(path: &Path) -> anyhow::Result<(Scene, Diagnostics)> {
    let (doc, buffers, _images) =
        gltf::import(path).with_context(|| format!("failed to load {}", path.display()))?;
    scene_from_gltf(&doc, &buffers)
}

/// Same as `load_gltf` for a document held in memory; external buffers are not resolved.
pub fn load_gltf_slice(bytes: &[u8]) -> anyhow::Result<(Scene, Diagnostics)> {
    let (doc, buffers, _images) = gltf::import_slice(bytes).context("failed to parse glTF")?;
    scene_from_gltf(&doc, &buffers)
}
