// Geometry export tests
// Vertex splitting, skin packing and the layout of exported mesh nodes

use cgmath::{Matrix4, SquareMatrix, Vector2, Vector3};
use pdx_tools_lib::converter::{export_scene, import_scene, ConvertError, ExportOptions, ImportOptions};
use pdx_tools_lib::geometry::{deduplicate_vertices, CornerKey};
use pdx_tools_lib::material::{Material, Shader};
use pdx_tools_lib::pdx::PdxNode;
use pdx_tools_lib::scene::{Face, Mesh, MeshGeometry, NodeKind, Scene, SkinData};

#[path = "common/mod.rs"]
mod common;

fn exported_mesh<'a>(tree: &'a PdxNode, name: &str) -> &'a PdxNode {
    tree.object_of("object")
        .and_then(|o| o.object_of("shape"))
        .and_then(|s| s.object_of(name))
        .unwrap_or_else(|| panic!("exported tree has no mesh '{}'", name))
}

fn vertex_count(mesh: &PdxNode) -> usize {
    mesh.floats_of("p").unwrap().len() / 3
}

/// Double-sided triangle: the back face reuses the three vertices, optionally with a
/// different second-channel UV on vertex 2
fn double_sided_triangle(divergent: bool) -> MeshGeometry {
    let normal = Vector3::new(0.0, 0.0, 1.0);
    let uv = [Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
    let back_uv1 = if divergent {
        [uv[0], Vector2::new(0.5, 0.5), uv[1]]
    } else {
        [uv[0], uv[2], uv[1]]
    };
    MeshGeometry {
        positions: vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ],
        faces: vec![
            Face {
                vertices: [0, 1, 2],
                normals: Some([normal; 3]),
                tangents: None,
                uvs: vec![uv, uv],
            },
            Face {
                vertices: [0, 2, 1],
                normals: Some([normal; 3]),
                tangents: None,
                uvs: vec![[uv[0], uv[2], uv[1]], back_uv1],
            },
        ],
        uv_channels: 2,
        skin: None,
    }
}

fn scene_with(geometry: MeshGeometry, world: Matrix4<f32>) -> Scene {
    let mut scene = Scene::new("root");
    let root = scene.root();
    let group = scene.add_child(root, "group", NodeKind::Group, world);
    scene.add_child(
        group,
        "mesh",
        NodeKind::Mesh(Box::new(Mesh {
            geometry,
            material: Material::lit(Shader::PdxMeshStandard),
            aabb: None,
        })),
        Matrix4::identity(),
    );
    scene
}

/// 3 vertices, 1 triangle, identical UV channels: nothing to split
#[test]
fn three_vertex_triangle_exports_three_vertices() {
    println!("\n🔍 Testing: 3-vertex triangle round trip");

    let tree = common::pdx_file(vec![common::triangle_mesh("body", "PdxMeshStandard")]);
    let imported = import_scene(&tree, &ImportOptions::default()).unwrap();
    let mesh = imported.scene.node(imported.meshes[0]).mesh().unwrap();
    assert_eq!(mesh.geometry.vertex_count(), 3);
    assert_eq!(mesh.geometry.uv_channels, 2);

    let exported = export_scene(&imported.scene, &ExportOptions::default()).unwrap();
    let body = exported_mesh(&exported.tree, "body");
    assert_eq!(vertex_count(body), 3, "no vertex should be cloned");
    assert_eq!(body.ints_of("tri"), Some(&[0, 1, 2][..]));
    assert_eq!(body.floats_of("u1").unwrap().len(), 6);

    println!("✅ 3 vertices in, 3 vertices out");
}

/// One diverging UV on the second channel clones exactly one vertex
#[test]
fn divergent_second_channel_clones_one_vertex() {
    println!("\n🔍 Testing: divergent UV clone");

    let same = export_scene(&scene_with(double_sided_triangle(false), Matrix4::identity()), &ExportOptions::default()).unwrap();
    assert_eq!(vertex_count(exported_mesh(&same.tree, "mesh")), 3);

    let split = export_scene(&scene_with(double_sided_triangle(true), Matrix4::identity()), &ExportOptions::default()).unwrap();
    let mesh = exported_mesh(&split.tree, "mesh");
    assert_eq!(vertex_count(mesh), 4, "vertex 2 should be cloned once");
    assert_eq!(mesh.ints_of("tri"), Some(&[0, 1, 2, 0, 3, 1][..]));

    let p = mesh.floats_of("p").unwrap();
    assert_eq!(&p[9..12], &p[6..9], "clone must copy the original position");
    let u1 = mesh.floats_of("u1").unwrap();
    assert_eq!(&u1[6..8], &[0.5, 0.5]);
    assert_eq!(&u1[4..6], &[0.0, 1.0]);

    println!("✅ One extra vertex for the diverging corner");
}

/// Running the split again over its own output adds nothing
#[test]
fn deduplication_is_idempotent() {
    println!("\n🔍 Testing: dedup idempotence");

    let exported = export_scene(&scene_with(double_sided_triangle(true), Matrix4::identity()), &ExportOptions::default()).unwrap();
    let mesh = exported_mesh(&exported.tree, "mesh");
    let count = vertex_count(mesh);
    let n = mesh.floats_of("n").unwrap();
    let u0 = mesh.floats_of("u0").unwrap();
    let u1 = mesh.floats_of("u1").unwrap();

    let keys: Vec<CornerKey> = mesh
        .ints_of("tri")
        .unwrap()
        .iter()
        .map(|v| {
            let v = *v as usize;
            CornerKey {
                vertex: v as u32,
                normal: Vector3::new(n[v * 3], n[v * 3 + 1], n[v * 3 + 2]),
                uvs: vec![
                    Some(Vector2::new(u0[v * 2], u0[v * 2 + 1])),
                    Some(Vector2::new(u1[v * 2], u1[v * 2 + 1])),
                ],
            }
        })
        .collect();

    let again = deduplicate_vertices(count, &keys);
    assert_eq!(again.vertex_count(), count, "second pass must not add vertices");

    println!("✅ Dedup is idempotent");
}

/// Every vertex gets four slots; unused ones carry weight 0 and repeat slot 0
#[test]
fn skin_slots_are_always_four() {
    println!("\n🔍 Testing: 4-slot skin layout");

    let imported = import_scene(&common::character_file(), &ImportOptions::default()).unwrap();
    let exported = export_scene(&imported.scene, &ExportOptions::default()).unwrap();
    let body = exported_mesh(&exported.tree, "body");
    let skin = body.object_of("skin").expect("skinned mesh must export skin");

    let count = vertex_count(body);
    let bones = skin.int_of("bones").unwrap() as usize;
    let ix = skin.ints_of("ix").unwrap();
    let w = skin.floats_of("w").unwrap();
    assert_eq!(bones, 2);
    assert_eq!(ix.len(), count * 4);
    assert_eq!(w.len(), count * 4);

    for v in 0..count {
        for k in bones..4 {
            assert_eq!(w[v * 4 + k], 0.0, "vertex {} slot {} should be unused", v, k);
            assert_eq!(ix[v * 4 + k], ix[v * 4], "unused slot repeats slot 0");
        }
    }
    assert_eq!(&ix[4..8], &[1, 2, 1, 1]);
    assert_eq!(&w[4..8], &[0.75, 0.25, 0.0, 0.0]);

    // collider has no skin
    assert!(!exported_mesh(&exported.tree, "hitbox").has("skin"));

    println!("✅ Skin packed into four slots");
}

/// Mesh nodes list their properties in a fixed order
#[test]
fn mesh_node_layout() {
    println!("\n🔍 Testing: exported mesh layout");

    let imported = import_scene(&common::character_file(), &ImportOptions::default()).unwrap();
    let exported = export_scene(&imported.scene, &ExportOptions::default()).unwrap();
    let names: Vec<&str> = exported_mesh(&exported.tree, "body")
        .children()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["p", "n", "ta", "u0", "u1", "tri", "aabb", "material", "skin"]);

    let shape = exported.tree.object_of("object").unwrap().object_of("shape").unwrap();
    assert_eq!(shape.children().last().map(|c| c.name.as_str()), Some("skeleton"));

    println!("✅ Layout matches");
}

/// The world transform ends up in positions and bounds
#[test]
fn world_transform_is_baked() {
    println!("\n🔍 Testing: baked world transform");

    let world = Matrix4::from_translation(Vector3::new(0.0, 0.0, 2.0)) * Matrix4::from_scale(2.0);
    let exported = export_scene(&scene_with(double_sided_triangle(false), world), &ExportOptions::default()).unwrap();
    let mesh = exported_mesh(&exported.tree, "mesh");
    let p = mesh.floats_of("p").unwrap();
    assert_eq!(&p[3..6], &[2.0, 0.0, 2.0]);

    let aabb = mesh.object_of("aabb").unwrap();
    assert_eq!(aabb.floats_of("min").unwrap(), vec![0.0, 0.0, 2.0]);
    assert_eq!(aabb.floats_of("max").unwrap(), vec![2.0, 2.0, 2.0]);
    assert_eq!(exported.stats.max_extent_height, 2.0);

    println!("✅ World transform baked");
}

/// A skin that names a bone the skeleton does not have is fatal
#[test]
fn unknown_skin_bone_fails_export() {
    println!("\n🔍 Testing: unknown skin bone");

    let mut geometry = double_sided_triangle(false);
    geometry.skin = Some(SkinData {
        bone_names: vec!["ghost".to_string()],
        indices: vec![[0, -1, -1, -1]; 3],
        weights: vec![[1.0, 0.0, 0.0, 0.0]; 3],
    });
    let mut scene = scene_with(geometry, Matrix4::identity());
    let root = scene.root();
    scene.add_child(root, "hip", NodeKind::Bone, Matrix4::identity());

    let err = export_scene(&scene, &ExportOptions::default()).unwrap_err();
    assert!(
        matches!(err, ConvertError::UnknownSkinBone { ref bone, .. } if bone == "ghost"),
        "unexpected error: {}",
        err
    );

    println!("✅ Unknown bone rejected");
}
