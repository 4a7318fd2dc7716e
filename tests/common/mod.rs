// Common test utilities and fixture builders
#![allow(dead_code)]

use cgmath::Matrix4;
use pdx_tools_lib::pdx::PdxNode;
use pdx_tools_lib::skeleton::Skeleton;

/// Inverse bind block of a bone sitting at `offset` with no rotation
pub fn translated_tx(offset: [f32; 3]) -> [f32; 12] {
    [
        1.0, 0.0, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,
        -offset[0], -offset[1], -offset[2],
    ]
}

/// A bone node as found under `skeleton`
pub fn bone(name: &str, ix: i32, pa: Option<i32>, tx: [f32; 12]) -> PdxNode {
    let mut children = vec![PdxNode::ints("ix", vec![ix])];
    if let Some(pa) = pa {
        children.push(PdxNode::ints("pa", vec![pa]));
    }
    children.push(PdxNode::floats("tx", tx.to_vec()));
    PdxNode::object(name, children)
}

/// root -> spine -> head, each one unit above the last
pub fn three_bone_skeleton() -> PdxNode {
    PdxNode::object(
        "skeleton",
        vec![
            bone("root", 0, None, translated_tx([0.0, 1.0, 0.0])),
            bone("spine", 1, Some(0), translated_tx([0.0, 2.0, 0.0])),
            bone("head", 2, Some(1), translated_tx([0.0, 3.0, 0.5])),
        ],
    )
}

pub fn material(shader: &str) -> PdxNode {
    PdxNode::object(
        "material",
        vec![
            PdxNode::string("shader", shader),
            PdxNode::string("diff", "body_diffuse.dds"),
            PdxNode::string("n", "body_normal.dds"),
            PdxNode::string("spec", "nospec.dds"),
        ],
    )
}

/// One triangle, three vertices, two UV channels with the same coordinates
pub fn triangle_mesh(name: &str, shader: &str) -> PdxNode {
    let uv = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    PdxNode::object(
        name,
        vec![
            PdxNode::floats("p", vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            PdxNode::floats("n", vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]),
            PdxNode::floats("ta", vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]),
            PdxNode::floats("u0", uv.clone()),
            PdxNode::floats("u1", uv),
            PdxNode::ints("tri", vec![0, 1, 2]),
            PdxNode::object(
                "aabb",
                vec![
                    PdxNode::floats("min", vec![0.0, 0.0, 0.0]),
                    PdxNode::floats("max", vec![1.0, 1.0, 0.0]),
                ],
            ),
            material(shader),
        ],
    )
}

/// The triangle mesh skinned to the three-bone skeleton
pub fn skinned_triangle_mesh(name: &str) -> PdxNode {
    let mut mesh = triangle_mesh(name, "PdxMeshStandard");
    if let Some(children) = mesh.children_mut() {
        children.push(PdxNode::object(
            "skin",
            vec![
                PdxNode::ints("bones", vec![2]),
                PdxNode::ints("ix", vec![0, 0, 0, 0, 1, 2, 0, 0, 2, 0, 0, 0]),
                PdxNode::floats(
                    "w",
                    vec![1.0, 0.0, 0.0, 0.0, 0.75, 0.25, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
                ),
            ],
        ));
    }
    mesh
}

/// Wraps shape children into a full `pdxData` tree
pub fn pdx_file(shape_children: Vec<PdxNode>) -> PdxNode {
    PdxNode::object(
        "pdxData",
        vec![
            PdxNode::ints("pdxasset", vec![1, 0]),
            PdxNode::object("object", vec![PdxNode::object("shape", shape_children)]),
            PdxNode::object("locator", vec![]),
        ],
    )
}

pub fn character_file() -> PdxNode {
    pdx_file(vec![
        skinned_triangle_mesh("body"),
        triangle_mesh("hitbox", "Collision"),
        three_bone_skeleton(),
    ])
}

pub fn max_abs_diff(a: &Matrix4<f32>, b: &Matrix4<f32>) -> f32 {
    let a: &[f32; 16] = a.as_ref();
    let b: &[f32; 16] = b.as_ref();
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// Print bone hierarchy for debugging
pub fn print_skeleton(skeleton: &Skeleton) {
    println!("\n=== Bone Hierarchy ===");
    for (i, bone) in skeleton.bones().iter().enumerate() {
        let parent_name = match bone.parent {
            Some(p) => format!("'{}'", skeleton.bones()[p].name),
            None => "ROOT".to_string(),
        };
        println!("[{}] '{}' (parent → {})", i, bone.name, parent_name);
    }
}
