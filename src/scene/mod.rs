//! Renderable scene graph.
//!
//! Nodes live in one arena owned by `Scene` and refer to each other by `NodeId`. Every node
//! declares what it is through `NodeKind`, so traversals test the tag instead of probing types.

pub mod gltf_source;
mod mesh;

pub use mesh::{Face, Mesh, MeshGeometry, RenderBuffers, SkinData, SkinnedVertex};

use cgmath::{Matrix4, SquareMatrix};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Bone,
    Mesh(Box<Mesh>),
    /// Line display of a skeleton, anchored at its root bone.
    SkeletonHelper { root_bone: NodeId },
    /// Edge display of a mesh.
    WireframeHelper { target: NodeId, color: [f32; 3] },
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    /// Node space to parent space.
    pub local: Matrix4<f32>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visible: bool,
}

impl SceneNode {
    pub fn is_bone(&self) -> bool {
        matches!(self.kind, NodeKind::Bone)
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    root: NodeId,
}

impl Scene {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: root_name.into(),
                kind: NodeKind::Group,
                local: Matrix4::identity(),
                parent: None,
                children: vec![],
                visible: true,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.0]
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        local: Matrix4<f32>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.into(),
            kind,
            local,
            parent: Some(parent),
            children: vec![],
            visible: true,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn is_bone(&self, id: NodeId) -> bool {
        self.node(id).is_bone()
    }

    /// Whether the node hangs directly off another bone.
    pub fn has_bone_parent(&self, id: NodeId) -> bool {
        self.node(id)
            .parent
            .map(|parent| self.is_bone(parent))
            .unwrap_or(false)
    }

    /// Node space to scene space: the product of all locals from the root down.
    pub fn world_transform(&self, id: NodeId) -> Matrix4<f32> {
        let mut world = self.node(id).local;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            let node = self.node(parent);
            world = node.local * world;
            current = node.parent;
        }
        world
    }

    /// Depth-first, pre-order walk starting at `from`; children in insertion order.
    pub fn traverse(&self, from: NodeId, visit: &mut impl FnMut(NodeId, &SceneNode)) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            visit(id, node);
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    pub fn bones(&self, from: NodeId) -> Vec<NodeId> {
        let mut bones = vec![];
        self.traverse(from, &mut |id, node| {
            if node.is_bone() {
                bones.push(id);
            }
        });
        bones
    }

    pub fn meshes(&self, from: NodeId) -> Vec<NodeId> {
        let mut meshes = vec![];
        self.traverse(from, &mut |id, node| {
            if node.mesh().is_some() {
                meshes.push(id);
            }
        });
        meshes
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        let mut found = None;
        self.traverse(self.root, &mut |id, node| {
            if found.is_none() && node.name == name {
                found = Some(id);
            }
        });
        found
    }
}
