//! Import and export of whole PDX trees.
//!
//! Import turns a `pdxData` tree into a renderable scene with per-category node lists and
//! counts. Export walks a scene and assembles the tree, one shape holding every mesh and the
//! rooted skeleton.

mod error;
pub(crate) mod props;

pub use error::{ConvertError, Result};

use std::path::PathBuf;

use cgmath::{Matrix4, SquareMatrix};
use serde::{Deserialize, Serialize};

use crate::animation::{sample_animation, AnimationClip};
use crate::diagnostics::Diagnostics;
use crate::geometry::{export_mesh, mesh_from_pdx, ExportedMesh};
use crate::material::{material_from_pdx, material_to_pdx};
use crate::math::Aabb;
use crate::pdx::PdxNode;
use crate::scene::{Mesh, NodeId, NodeKind, Scene};
use crate::skeleton::{skeleton_from_pdx, skeleton_from_scene, skeleton_to_pdx, Skeleton};

const WIREFRAME_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Directory the mesh's textures are resolved against.
    pub pdx_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub texture_base_name: String,
    /// Shader written for every mesh; derived from each material when unset.
    pub shader: Option<String>,
    pub shape_name: String,
    pub flip_uv_v: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            texture_base_name: "unknown".to_string(),
            shader: None,
            shape_name: "shape".to_string(),
            flip_uv_v: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneStats {
    /// Ordinary meshes and colliders.
    pub mesh_count: usize,
    pub triangle_count: usize,
    pub bone_count: usize,
    pub max_extent: f32,
    pub max_extent_height: f32,
}

impl SceneStats {
    fn add_bounds(&mut self, aabb: &Aabb) {
        for axis in 0..3 {
            self.max_extent = self.max_extent.max(-aabb.min[axis]).max(aabb.max[axis]);
        }
        self.max_extent_height = self.max_extent_height.max(aabb.max[1]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayCategory {
    Skeletons,
    Wireframes,
    Colliders,
    Meshes,
}

/// A shape's skeleton and the scene node created for each of its bones.
#[derive(Debug, Clone)]
pub struct ImportedSkeleton {
    pub shape: String,
    pub skeleton: Skeleton,
    pub bone_nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ImportedScene {
    pub scene: Scene,
    pub skeletons: Vec<ImportedSkeleton>,
    pub meshes: Vec<NodeId>,
    pub colliders: Vec<NodeId>,
    pub skeleton_helpers: Vec<NodeId>,
    pub wireframes: Vec<NodeId>,
    pub stats: SceneStats,
    pub animation: Option<AnimationClip>,
    pub diagnostics: Diagnostics,
}

impl ImportedScene {
    pub fn set_category_visible(&mut self, category: DisplayCategory, visible: bool) {
        let ids = match category {
            DisplayCategory::Skeletons => &self.skeleton_helpers,
            DisplayCategory::Wireframes => &self.wireframes,
            DisplayCategory::Colliders => &self.colliders,
            DisplayCategory::Meshes => &self.meshes,
        };
        for id in ids {
            self.scene.node_mut(*id).visible = visible;
        }
    }

    /// The skeleton animations are played on: the last shape that has bones.
    pub fn active_skeleton(&self) -> Option<&ImportedSkeleton> {
        self.skeletons.iter().rev().find(|s| !s.skeleton.is_empty())
    }

    /// Puts every bone node back to its bind pose.
    pub fn reset_pose(&mut self) {
        for imported in &self.skeletons {
            for (bone, node) in imported.skeleton.bones().iter().zip(&imported.bone_nodes) {
                self.scene.node_mut(*node).local = bone.local;
            }
        }
    }

    /// Replaces the current animation. The pose is reset first; `None` only stops playback.
    pub fn set_animation(&mut self, animation: Option<&PdxNode>) -> Result<Diagnostics> {
        let skeleton = self.active_skeleton().ok_or(ConvertError::NoSkeleton)?;
        let mut diagnostics = Diagnostics::new();
        let clip = match animation {
            Some(animation) => Some(sample_animation(animation, &skeleton.skeleton, &mut diagnostics)?),
            None => None,
        };

        self.reset_pose();
        self.animation = clip;
        Ok(diagnostics)
    }

    /// Moves the bones of the active skeleton to the current clip's pose at `time`.
    pub fn apply_pose(&mut self, time: f32) {
        let (Some(clip), Some(skeleton)) = (&self.animation, self.active_skeleton()) else {
            return;
        };
        let pose = clip.pose(time);
        let targets: Vec<(NodeId, Matrix4<f32>)> = pose
            .into_iter()
            .filter_map(|(bone, local)| skeleton.bone_nodes.get(bone).map(|node| (*node, local)))
            .collect();
        for (node, local) in targets {
            self.scene.node_mut(node).local = local;
        }
    }
}

fn read_aabb(node: &PdxNode) -> Option<Aabb> {
    let aabb = node.object_of("aabb")?;
    let min = aabb.floats_of("min")?;
    let max = aabb.floats_of("max")?;
    if min.len() < 3 || max.len() < 3 {
        return None;
    }
    Some(Aabb {
        min: [min[0], min[1], min[2]],
        max: [max[0], max[1], max[2]],
    })
}

fn import_shape(
    shape: &PdxNode,
    options: &ImportOptions,
    out: &mut ImportedScene,
) -> Result<()> {
    let root = out.scene.root();

    let skeleton = match shape.object_of("skeleton") {
        Some(node) => skeleton_from_pdx(node, &mut out.diagnostics)?,
        None => Skeleton::new(),
    };

    let mut bone_nodes = Vec::with_capacity(skeleton.len());
    for bone in skeleton.bones() {
        let parent = bone.parent.map(|p| bone_nodes[p]).unwrap_or(root);
        bone_nodes.push(out.scene.add_child(parent, bone.name.clone(), NodeKind::Bone, bone.local));
    }
    if let Some(first) = bone_nodes.first() {
        let helper = out.scene.add_child(
            root,
            format!("{}_skeleton", shape.name),
            NodeKind::SkeletonHelper { root_bone: *first },
            Matrix4::identity(),
        );
        out.skeleton_helpers.push(helper);
    }
    out.stats.bone_count += skeleton.len();

    let bone_names = skeleton.bone_names();
    for node in shape.objects() {
        let aabb = read_aabb(node);
        if let Some(aabb) = &aabb {
            out.stats.add_bounds(aabb);
        }
        if !node.has("p") {
            continue;
        }

        let geometry = mesh_from_pdx(node, &bone_names, &mut out.diagnostics)?;
        let material = material_from_pdx(
            &node.name,
            node.object_of("material"),
            &options.pdx_path,
            geometry.is_skinned(),
            &mut out.diagnostics,
        );
        out.stats.triangle_count += geometry.triangle_count();
        out.stats.mesh_count += 1;

        let mesh = Mesh {
            geometry,
            material,
            aabb,
        };
        let collider = mesh.is_collider();
        let id = out.scene.add_child(
            root,
            node.name.clone(),
            NodeKind::Mesh(Box::new(mesh)),
            Matrix4::identity(),
        );
        let wireframe = out.scene.add_child(
            id,
            format!("{}_wireframe", node.name),
            NodeKind::WireframeHelper {
                target: id,
                color: WIREFRAME_COLOR,
            },
            Matrix4::identity(),
        );
        out.wireframes.push(wireframe);
        if collider {
            out.colliders.push(id);
        } else {
            out.meshes.push(id);
        }
    }

    out.skeletons.push(ImportedSkeleton {
        shape: shape.name.clone(),
        skeleton,
        bone_nodes,
    });
    Ok(())
}

/// Builds a scene from a `pdxData` tree.
pub fn import_scene(tree: &PdxNode, options: &ImportOptions) -> Result<ImportedScene> {
    let mut out = ImportedScene {
        scene: Scene::new(tree.name.clone()),
        skeletons: vec![],
        meshes: vec![],
        colliders: vec![],
        skeleton_helpers: vec![],
        wireframes: vec![],
        stats: SceneStats::default(),
        animation: None,
        diagnostics: Diagnostics::new(),
    };

    if let Some(object) = tree.object_of("object") {
        for shape in object.objects() {
            import_shape(shape, options, &mut out)?;
        }
    }

    log::info!(
        "imported {} meshes, {} triangles, {} bones",
        out.stats.mesh_count,
        out.stats.triangle_count,
        out.stats.bone_count
    );
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct ExportedTree {
    pub tree: PdxNode,
    pub stats: SceneStats,
    pub diagnostics: Diagnostics,
}

fn mesh_node(name: &str, mesh: ExportedMesh, material: PdxNode) -> PdxNode {
    let mut children = vec![
        PdxNode::floats("p", mesh.positions),
        PdxNode::floats("n", mesh.normals),
        PdxNode::floats("ta", mesh.tangents),
    ];
    for (channel, uv) in mesh.uvs.into_iter().enumerate() {
        children.push(PdxNode::floats(format!("u{}", channel), uv));
    }
    children.push(PdxNode::ints("tri", mesh.triangles));
    children.push(PdxNode::object(
        "aabb",
        vec![
            PdxNode::floats("min", mesh.aabb.min.to_vec()),
            PdxNode::floats("max", mesh.aabb.max.to_vec()),
        ],
    ));
    children.push(material);
    if let Some(skin) = mesh.skin {
        children.push(PdxNode::object(
            "skin",
            vec![
                PdxNode::ints("bones", vec![skin.bones_used as i32]),
                PdxNode::ints("ix", skin.indices.into_iter().flatten().collect()),
                PdxNode::floats("w", skin.weights.into_iter().flatten().collect()),
            ],
        ));
    }
    PdxNode::object(name, children)
}

/// Assembles a `pdxData` tree from every mesh and bone under the scene root.
pub fn export_scene(scene: &Scene, options: &ExportOptions) -> Result<ExportedTree> {
    let mut diagnostics = Diagnostics::new();
    let mut stats = SceneStats::default();

    let skeleton = skeleton_from_scene(scene, scene.root(), &mut diagnostics);
    stats.bone_count = skeleton.len();

    let mut shape_children = Vec::new();
    for id in scene.meshes(scene.root()) {
        let node = scene.node(id);
        let Some(mesh) = node.mesh() else { continue };
        let world = scene.world_transform(id);

        let exported = export_mesh(
            &node.name,
            &mesh.geometry,
            &world,
            &skeleton,
            options.flip_uv_v,
            &mut diagnostics,
        )?;
        stats.mesh_count += 1;
        stats.triangle_count += exported.triangle_count();
        stats.add_bounds(&exported.aabb);

        let material = material_to_pdx(&mesh.material, options);
        shape_children.push(mesh_node(&node.name, exported, material));
    }

    if !skeleton.is_empty() {
        shape_children.push(skeleton_to_pdx(&skeleton)?);
    }

    let tree = PdxNode::object(
        "pdxData",
        vec![
            PdxNode::ints("pdxasset", vec![1, 0]),
            PdxNode::object(
                "object",
                vec![PdxNode::object(options.shape_name.clone(), shape_children)],
            ),
            PdxNode::object("locator", vec![]),
        ],
    );

    log::info!(
        "exported {} meshes, {} triangles, {} bones",
        stats.mesh_count,
        stats.triangle_count,
        stats.bone_count
    );
    Ok(ExportedTree {
        tree,
        stats,
        diagnostics,
    })
}
