use std::collections::HashSet;

use super::{Bone, Skeleton};
use crate::converter::{ConvertError, Result};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::math::{invert, PdxMatrix43};
use crate::pdx::PdxNode;
use crate::scene::{NodeId, Scene};

/// Name of the bone inserted when the scene has several root bones.
pub const ADDED_ROOT_NAME: &str = "AddedRoot";

/// Collects the bones under `root` into a skeleton, parents first.
///
/// Bones are visited depth-first; a name seen before is skipped and reported. When more than
/// one bone hangs off a non-bone node, a synthetic root carrying the world transform of `root`
/// is put at index 0 and those bones are re-parented onto it.
pub fn skeleton_from_scene(scene: &Scene, root: NodeId, diagnostics: &mut Diagnostics) -> Skeleton {
    let mut seen = HashSet::new();
    let mut picked: Vec<NodeId> = Vec::new();
    for id in scene.bones(root) {
        let name = &scene.node(id).name;
        if seen.insert(name.clone()) {
            picked.push(id);
        } else {
            diagnostics.warn(
                DiagnosticCode::DuplicateBoneName,
                DiagnosticContext::bone(name.clone()),
                format!("bone name '{}' is used more than once, only the first is exported", name),
            );
        }
    }

    let root_bones = picked
        .iter()
        .filter(|id| !scene.has_bone_parent(**id))
        .count();

    let mut skeleton = Skeleton::new();
    let added_root = root_bones > 1;
    if added_root {
        let world = scene.world_transform(root);
        skeleton.push(Bone {
            name: ADDED_ROOT_NAME.to_string(),
            parent: None,
            local: world,
            world,
        });
        diagnostics.info(
            DiagnosticCode::RootBoneAdded,
            DiagnosticContext::bone(ADDED_ROOT_NAME),
            format!("{} root bones found, added '{}' above them", root_bones, ADDED_ROOT_NAME),
        );
    }

    for id in picked {
        let node = scene.node(id);
        let parent = if scene.has_bone_parent(id) {
            node.parent
                .and_then(|parent| skeleton.index_of(&scene.node(parent).name))
        } else if added_root {
            Some(0)
        } else {
            None
        };

        let world = scene.world_transform(id);
        let local = parent
            .and_then(|p| invert(&skeleton.bones[p].world))
            .map(|inv| inv * world)
            .unwrap_or(world);

        skeleton.push(Bone {
            name: node.name.clone(),
            parent,
            local,
            world,
        });
    }

    skeleton
}

/// The `skeleton` node: one object per bone with `ix`, `pa` (omitted for roots) and the
/// inverse world transform as `tx`.
pub fn skeleton_to_pdx(skeleton: &Skeleton) -> Result<PdxNode> {
    let mut bones = Vec::with_capacity(skeleton.len());
    for (index, bone) in skeleton.bones().iter().enumerate() {
        let inverse = invert(&bone.world).ok_or_else(|| ConvertError::SingularTransform {
            bone: bone.name.clone(),
        })?;

        let mut props = vec![PdxNode::ints("ix", vec![index as i32])];
        if let Some(parent) = bone.parent {
            props.push(PdxNode::ints("pa", vec![parent as i32]));
        }
        props.push(PdxNode::floats("tx", PdxMatrix43(inverse).to_tx().to_vec()));
        bones.push(PdxNode::object(bone.name.clone(), props));
    }
    Ok(PdxNode::object("skeleton", bones))
}
