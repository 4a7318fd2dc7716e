use std::path::PathBuf;

use pdx_tools_lib::converter::{export_scene, ExportOptions};
use pdx_tools_lib::pdx::io::write_tree;
use pdx_tools_lib::scene::gltf_source::load_gltf;

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  export-cli <scene.gltf> <out.json> [--shader NAME] [--texture-base NAME] [--shape NAME] [--flip-v] [--options FILE]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  export-cli ./tank.gltf ./tank.json --texture-base tank");
    eprintln!("  export-cli ./shield.glb ./shield.json --shader JdxMeshShield");
    std::process::exit(1);
}

fn value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => {
            eprintln!("{} requires a value", flag);
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    // an options file is the base, flags override it
    let mut options = ExportOptions::default();
    if let Some(i) = args.iter().position(|a| a == "--options") {
        let path = PathBuf::from(value(&args, i, "--options"));
        let loaded = tokio::fs::read(&path)
            .await
            .map_err(anyhow::Error::from)
            .and_then(|bytes| serde_json::from_slice::<ExportOptions>(&bytes).map_err(anyhow::Error::from));
        match loaded {
            Ok(loaded) => options = loaded,
            Err(e) => {
                eprintln!("Failed to read options {}: {:?}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--shader" => {
                options.shader = Some(value(&args, i, "--shader"));
                i += 2;
            }
            "--texture-base" => {
                options.texture_base_name = value(&args, i, "--texture-base");
                i += 2;
            }
            "--shape" => {
                options.shape_name = value(&args, i, "--shape");
                i += 2;
            }
            "--flip-v" => {
                options.flip_uv_v = true;
                i += 1;
            }
            "--options" => i += 2,
            other => {
                eprintln!("Unknown argument '{}'", other);
                usage();
            }
        }
    }

    eprintln!("Exporting {} ...", input.display());

    let (scene, mut diagnostics) = match load_gltf(&input) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load scene: {:?}", e);
            std::process::exit(1);
        }
    };

    let exported = match export_scene(&scene, &options) {
        Ok(exported) => exported,
        Err(e) => {
            eprintln!("Export failed: {}", e);
            std::process::exit(1);
        }
    };
    diagnostics.merge(exported.diagnostics);

    if let Err(e) = write_tree(&output, &exported.tree).await {
        eprintln!("Failed to write tree: {:?}", e);
        std::process::exit(1);
    }

    eprintln!("Export complete!");
    eprintln!("  Output: {}", output.display());
    eprintln!("  Meshes: {}", exported.stats.mesh_count);
    eprintln!("  Triangles: {}", exported.stats.triangle_count);
    eprintln!("  Bones: {}", exported.stats.bone_count);
    eprintln!(
        "  Diagnostics: {} warnings, {} info",
        diagnostics.warning_count, diagnostics.info_count
    );
    for item in &diagnostics.items {
        eprintln!("    [{}] {}", item.code.as_str(), item.message);
    }
}
