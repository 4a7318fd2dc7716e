//! Bone hierarchies.
//!
//! A PDX skeleton stores, per bone, the inverse of its bind-pose world transform (`tx`) and
//! the index of its parent (`pa`). Parents always come before their children, so every
//! walk over `Skeleton::bones` visits a parent first.

mod export;

pub use export::{skeleton_from_scene, skeleton_to_pdx, ADDED_ROOT_NAME};

use std::collections::HashMap;

use cgmath::{Matrix4, SquareMatrix};

use crate::converter::props::{optional_int, require_floats};
use crate::converter::{ConvertError, Result};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::math::{invert, PdxMatrix43};
use crate::pdx::PdxNode;

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    /// Bind pose relative to the parent bone.
    pub local: Matrix4<f32>,
    /// Bind pose in skeleton space.
    pub world: Matrix4<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bone and returns its index. Name lookups resolve to the first bone added
    /// under a name.
    pub fn push(&mut self, bone: Bone) -> usize {
        let index = self.bones.len();
        self.by_name.entry(bone.name.clone()).or_insert(index);
        self.bones.push(bone);
        index
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|bone| bone.name.clone()).collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = (usize, &Bone)> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
    }
}

/// Builds a skeleton from the `skeleton` node of a shape.
///
/// Each bone's world transform is the inverse of its `tx` block and its local transform is
/// taken relative to the parent's world. A bone whose `tx` is all zeros, or cannot be
/// inverted, gets an identity local transform.
pub fn skeleton_from_pdx(node: &PdxNode, diagnostics: &mut Diagnostics) -> Result<Skeleton> {
    let mut skeleton = Skeleton::new();

    for (j, bone) in node.objects().enumerate() {
        let raw = require_floats(bone, "tx", 12)?;
        let tx: [f32; 12] = raw.as_slice().try_into().map_err(|_| ConvertError::BadStride {
            node: bone.name.clone(),
            property: "tx".to_string(),
            stride: 12,
            len: raw.len(),
        })?;

        if let Some(ix) = optional_int(bone, "ix")? {
            if ix != j as i32 {
                diagnostics.warn(
                    DiagnosticCode::BoneIndexMismatch,
                    DiagnosticContext::bone(bone.name.clone()),
                    format!("bone '{}' declares index {} but is bone {}", bone.name, ix, j),
                );
            }
        }

        let parent = match optional_int(bone, "pa")? {
            None => None,
            Some(pa) if pa < 0 => None,
            Some(pa) if (pa as usize) < j => Some(pa as usize),
            Some(pa) => {
                return Err(ConvertError::IndexOutOfRange {
                    node: bone.name.clone(),
                    what: "parent bone",
                    index: pa as i64,
                    len: j,
                })
            }
        };
        let parent_world = parent
            .map(|p| skeleton.bones[p].world)
            .unwrap_or_else(Matrix4::identity);

        let world = if PdxMatrix43::is_zero_block(&tx) {
            diagnostics.warn(
                DiagnosticCode::ZeroBoneTransform,
                DiagnosticContext::bone(bone.name.clone()),
                format!("bone '{}' has an all-zero transform", bone.name),
            );
            parent_world
        } else {
            match invert(&PdxMatrix43::from_tx(&tx).0) {
                Some(world) => world,
                None => {
                    diagnostics.warn(
                        DiagnosticCode::SingularBoneTransform,
                        DiagnosticContext::bone(bone.name.clone()),
                        format!("bone '{}' has a transform that cannot be inverted", bone.name),
                    );
                    parent_world
                }
            }
        };
        let local = invert(&parent_world)
            .map(|inv| inv * world)
            .unwrap_or(world);

        if skeleton.index_of(&bone.name).is_some() {
            diagnostics.warn(
                DiagnosticCode::DuplicateBoneName,
                DiagnosticContext::bone(bone.name.clone()),
                format!("bone name '{}' is used more than once", bone.name),
            );
        }

        skeleton.push(Bone {
            name: bone.name.clone(),
            parent,
            local,
            world,
        });
    }

    log::debug!("read skeleton '{}' with {} bones", node.name, skeleton.len());
    Ok(skeleton)
}
