use std::path::PathBuf;

use pdx_tools_lib::converter::{import_scene, ImportOptions};
use pdx_tools_lib::pdx::{io::read_tree, print_tree};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage:");
        eprintln!("  pdx_inspect <tree.json> [--no-tree]");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let show_tree = !args.iter().any(|a| a == "--no-tree");

    let tree = match read_tree(&path).await {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Failed to read {}: {:?}", path.display(), e);
            std::process::exit(1);
        }
    };

    if show_tree {
        if let Err(e) = print_tree(&tree) {
            eprintln!("Failed to print tree: {}", e);
        }
    }

    // textures resolve next to the asset
    let options = ImportOptions {
        pdx_path: path.parent().map(|p| p.to_path_buf()).unwrap_or_default(),
    };
    let imported = match import_scene(&tree, &options) {
        Ok(imported) => imported,
        Err(e) => {
            eprintln!("Import failed: {}", e);
            std::process::exit(1);
        }
    };

    let stats = &imported.stats;
    println!("meshes:            {}", stats.mesh_count);
    println!("  colliders:       {}", imported.colliders.len());
    println!("triangles:         {}", stats.triangle_count);
    println!("bones:             {}", stats.bone_count);
    println!("max extent:        {}", stats.max_extent);
    println!("max extent height: {}", stats.max_extent_height);

    let diagnostics = &imported.diagnostics;
    if !diagnostics.is_empty() {
        println!(
            "diagnostics: {} warnings, {} info",
            diagnostics.warning_count, diagnostics.info_count
        );
        for item in &diagnostics.items {
            println!("  [{}] {}", item.code.as_str(), item.message);
        }
    }
}
