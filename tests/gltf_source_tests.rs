// glTF loading tests
// Small embedded documents are loaded into a scene and exported to a PDX tree

use base64::Engine;
use pdx_tools_lib::converter::{export_scene, ExportOptions};
use pdx_tools_lib::diagnostics::DiagnosticCode;
use pdx_tools_lib::scene::gltf_source::load_gltf_slice;
use pdx_tools_lib::scene::NodeKind;
use serde_json::json;

fn push_f32(buffer: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buffer.extend_from_slice(&v.to_le_bytes());
    }
}

/// One triangle skinned to `hip` and `hand`, without normals.
///
/// Buffer layout: positions at 0 (36 bytes), u16 indices at 36 (6 bytes, padded to 8),
/// u8 joints at 44 (12 bytes), f32 weights at 56 (48 bytes).
fn skinned_triangle_gltf(primitives: usize) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(104);
    push_f32(&mut buffer, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    for index in [0u16, 1, 2, 0] {
        buffer.extend_from_slice(&index.to_le_bytes());
    }
    buffer.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0]);
    push_f32(
        &mut buffer,
        &[1.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    );
    assert_eq!(buffer.len(), 104);

    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buffer)
    );
    let primitive = json!({
        "attributes": { "POSITION": 0, "JOINTS_0": 2, "WEIGHTS_0": 3 },
        "indices": 1,
        "mode": 4
    });

    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "name": "Scene", "nodes": [0, 3] }],
        "nodes": [
            { "name": "Armature", "children": [1] },
            { "name": "hip", "children": [2] },
            { "name": "hand", "translation": [0.0, 1.0, 0.0] },
            { "name": "body", "mesh": 0, "skin": 0 }
        ],
        "skins": [{ "joints": [1, 2] }],
        "meshes": [{ "name": "body", "primitives": vec![primitive; primitives] }],
        "buffers": [{ "byteLength": 104, "uri": uri }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 12 },
            { "buffer": 0, "byteOffset": 56, "byteLength": 48 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5121, "count": 3, "type": "VEC4" },
            { "bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4" }
        ]
    });
    serde_json::to_vec(&document).unwrap()
}

/// Joints become bones, the skinned mesh exports with a packed skin
#[test]
fn skinned_gltf_exports_skeleton_and_skin() {
    println!("\n🔍 Testing: skinned glTF export");

    let (scene, mut diagnostics) = load_gltf_slice(&skinned_triangle_gltf(1)).expect("load failed");
    let hip = scene.find("hip").expect("hip node");
    let hand = scene.find("hand").expect("hand node");
    assert!(scene.is_bone(hip));
    assert!(scene.has_bone_parent(hand));
    assert!(matches!(scene.node(scene.find("Armature").unwrap()).kind, NodeKind::Group));

    let body = scene.node(scene.find("body").unwrap()).mesh().expect("body carries the mesh");
    let skin = body.geometry.skin.as_ref().expect("body is skinned");
    assert_eq!(skin.bone_names, vec!["hip".to_string(), "hand".to_string()]);
    assert_eq!(skin.indices[1], [0, 1, -1, -1]);

    let exported = export_scene(&scene, &ExportOptions::default()).expect("export failed");
    diagnostics.merge(exported.diagnostics);
    assert!(diagnostics.has(DiagnosticCode::MissingNormals));
    assert!(!diagnostics.has(DiagnosticCode::RootBoneAdded));

    let shape = exported.tree.object_of("object").unwrap().object_of("shape").unwrap();
    let mesh = shape.object_of("body").expect("exported body");
    let packed = mesh.object_of("skin").expect("exported skin");
    assert_eq!(packed.int_of("bones"), Some(2));
    assert_eq!(&packed.ints_of("ix").unwrap()[4..8], &[0, 1, 0, 0]);

    let skeleton = shape.object_of("skeleton").expect("exported skeleton");
    let hand = skeleton.object_of("hand").unwrap();
    assert_eq!(hand.int_of("ix"), Some(1));
    assert_eq!(hand.int_of("pa"), Some(0));
    let tx = hand.floats_of("tx").unwrap();
    assert_eq!(tx.len(), 12);
    assert!((tx[10] + 1.0).abs() < 1e-6, "inverse bind should move down by 1, got {:?}", tx);

    assert_eq!(exported.stats.bone_count, 2);
    assert_eq!(exported.stats.triangle_count, 1);

    println!("✅ glTF skin exported");
}

/// Several primitives on one node hang below it as numbered meshes
#[test]
fn multi_primitive_node_gets_child_meshes() {
    println!("\n🔍 Testing: multi-primitive glTF node");

    let (scene, _) = load_gltf_slice(&skinned_triangle_gltf(2)).expect("load failed");
    let body = scene.find("body").unwrap();
    assert!(matches!(scene.node(body).kind, NodeKind::Group));
    assert!(scene.find("body_0").is_some());
    assert!(scene.find("body_1").is_some());
    assert_eq!(scene.meshes(scene.root()).len(), 2);

    let exported = export_scene(&scene, &ExportOptions::default()).unwrap();
    assert_eq!(exported.stats.mesh_count, 2);
    assert_eq!(exported.stats.triangle_count, 2);

    println!("✅ Primitives split into child meshes");
}

#[test]
fn garbage_is_rejected() {
    assert!(load_gltf_slice(b"not a gltf").is_err());
}
