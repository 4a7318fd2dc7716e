// Material mapping tests
// Collision meshes, texture paths and display categories after import

use std::path::PathBuf;

use pdx_tools_lib::converter::{export_scene, import_scene, DisplayCategory, ExportOptions, ImportOptions};
use pdx_tools_lib::diagnostics::DiagnosticCode;
use pdx_tools_lib::material::{MaterialKind, Shader};
use pdx_tools_lib::pdx::PdxNode;
use pdx_tools_lib::scene::NodeKind;

#[path = "common/mod.rs"]
mod common;

fn exported_material<'a>(tree: &'a PdxNode, mesh: &str) -> &'a PdxNode {
    tree.object_of("object")
        .and_then(|o| o.object_of("shape"))
        .and_then(|s| s.object_of(mesh))
        .and_then(|m| m.object_of("material"))
        .unwrap_or_else(|| panic!("no material for '{}'", mesh))
}

/// A Collision mesh lands in the collider list with a wireframe material
#[test]
fn collision_mesh_becomes_collider() {
    println!("\n🔍 Testing: collision mesh import");

    let imported = import_scene(&common::character_file(), &ImportOptions::default()).unwrap();
    assert_eq!(imported.colliders.len(), 1);
    assert_eq!(imported.meshes.len(), 1);
    assert_eq!(imported.stats.mesh_count, 2, "colliders count as meshes");
    assert_eq!(imported.stats.triangle_count, 2);

    let hitbox = imported.scene.node(imported.colliders[0]);
    assert_eq!(hitbox.name, "hitbox");
    let material = &hitbox.mesh().unwrap().material;
    assert!(matches!(material.kind, MaterialKind::Wireframe { .. }));
    assert_eq!(material.shader, Shader::Collision);
    // textures are listed on the node but ignored for colliders
    assert!(material.diffuse.is_none());

    println!("✅ Collider imported as wireframe");
}

/// Textures resolve against the asset directory, placeholders are dropped
#[test]
fn textures_resolve_next_to_asset() {
    println!("\n🔍 Testing: texture paths");

    let options = ImportOptions {
        pdx_path: PathBuf::from("gfx/models/units"),
    };
    let imported = import_scene(&common::character_file(), &options).unwrap();
    let body = imported.scene.node(imported.meshes[0]).mesh().unwrap();

    let diffuse = body.material.diffuse.as_ref().expect("diffuse texture");
    assert_eq!(diffuse.path, PathBuf::from("gfx/models/units/body_diffuse.dds"));
    assert_eq!(
        body.material.normal.as_ref().map(|t| t.file_name.as_str()),
        Some("body_normal.dds")
    );
    assert!(body.material.specular.is_none(), "nospec.dds is a placeholder");
    assert!(body.material.skinning, "skinned mesh needs a skinning material");

    println!("✅ Texture paths resolved");
}

/// An unrecognised shader is kept but reported
#[test]
fn unknown_shader_is_reported() {
    println!("\n🔍 Testing: unknown shader");

    let tree = common::pdx_file(vec![common::triangle_mesh("banner", "PdxMeshFlag")]);
    let imported = import_scene(&tree, &ImportOptions::default()).unwrap();
    assert!(imported.diagnostics.has(DiagnosticCode::UnknownShader));

    let banner = imported.scene.node(imported.meshes[0]).mesh().unwrap();
    assert_eq!(banner.material.kind, MaterialKind::Lit);
    assert_eq!(banner.material.shader.as_str(), "PdxMeshFlag");

    println!("✅ Unknown shader reported");
}

/// Export writes the derived shader and base-named textures
#[test]
fn export_names_textures_after_base() {
    println!("\n🔍 Testing: exported material");

    let imported = import_scene(&common::character_file(), &ImportOptions::default()).unwrap();

    let defaults = export_scene(&imported.scene, &ExportOptions::default()).unwrap();
    let body = exported_material(&defaults.tree, "body");
    assert_eq!(body.str_of("shader"), Some("PdxMeshStandard"));
    assert_eq!(body.str_of("diff"), Some("unknown_diffuse.dds"));
    assert_eq!(body.str_of("n"), Some("unknown_normal.dds"));
    assert_eq!(body.str_of("spec"), Some("unknown_spec.dds"));
    assert_eq!(exported_material(&defaults.tree, "hitbox").str_of("shader"), Some("Collision"));

    let options = ExportOptions {
        texture_base_name: "tank".to_string(),
        shader: Some("PdxMeshSnow".to_string()),
        ..ExportOptions::default()
    };
    let custom = export_scene(&imported.scene, &options).unwrap();
    let body = exported_material(&custom.tree, "body");
    assert_eq!(body.str_of("shader"), Some("PdxMeshSnow"));
    assert_eq!(body.str_of("diff"), Some("tank_diffuse.dds"));

    println!("✅ Exported material named after base");
}

/// Toggling a category flips only the nodes in it
#[test]
fn category_visibility_toggles() {
    println!("\n🔍 Testing: display categories");

    let mut imported = import_scene(&common::character_file(), &ImportOptions::default()).unwrap();
    assert_eq!(imported.wireframes.len(), 2);
    assert_eq!(imported.skeleton_helpers.len(), 1);

    imported.set_category_visible(DisplayCategory::Colliders, false);
    assert!(!imported.scene.node(imported.colliders[0]).visible);
    assert!(imported.scene.node(imported.meshes[0]).visible);

    imported.set_category_visible(DisplayCategory::Wireframes, false);
    for id in &imported.wireframes {
        let node = imported.scene.node(*id);
        assert!(!node.visible);
        assert!(matches!(node.kind, NodeKind::WireframeHelper { .. }));
    }

    imported.set_category_visible(DisplayCategory::Colliders, true);
    assert!(imported.scene.node(imported.colliders[0]).visible);

    println!("✅ Categories toggle independently");
}
