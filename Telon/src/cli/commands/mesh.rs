//! CLI command for StaticMesh decoding

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{CUBE, DISK, PACKAGE, print_done, print_step};
use crate::config::DecoderOptions;
use crate::extraction::{STATIC_MESH_CLASS, decode_export, decode_package};
use crate::package::read_package;

/// Decode StaticMesh exports and print coverage per mesh
pub fn execute(
    file: &Path,
    export: Option<&str>,
    output: Option<&Path>,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let steps = if output.is_some() { 3 } else { 2 };
    let options = match config {
        Some(path) => DecoderOptions::load(path)?,
        None => DecoderOptions::default(),
    };

    print_step(1, steps, PACKAGE, &format!("Opening {}...", file.display()));
    let pkg = read_package(file)?;

    print_step(2, steps, CUBE, "Decoding meshes...");
    let reports = match export {
        Some(name) => {
            let entry = pkg
                .find_export(name)
                .ok_or_else(|| anyhow::anyhow!("No export named '{name}'"))?;
            if !entry.class_name.eq_ignore_ascii_case(STATIC_MESH_CLASS) {
                anyhow::bail!("Export '{name}' is a {}, not a StaticMesh", entry.class_name);
            }
            vec![decode_export(&pkg, entry, &options)]
        }
        None => decode_package(&pkg, &options, Some(STATIC_MESH_CLASS)).exports,
    };

    if reports.is_empty() {
        println!("No StaticMesh exports in {}", file.display());
        return Ok(());
    }

    println!();
    println!(
        "  {:32} {:>8} {:>9} {:>5} {:>8} {:>8}",
        "Mesh", "Status", "Coverage", "LODs", "Verts", "Tris"
    );
    for report in &reports {
        let Some(mesh) = report.mesh() else {
            continue;
        };
        let result = &mesh.result;
        println!(
            "  {:32} {:>8} {:>8.2}% {:>5} {:>8} {:>8}",
            report.object_name,
            format!("{:?}", result.status),
            result.coverage_pct,
            mesh.lods.len(),
            mesh.total_vertices(),
            mesh.total_triangles()
        );
        if let Some(message) = &result.message {
            println!("      error: {message}");
        }
        for region in &result.unknown_regions {
            println!(
                "      unknown {:>8} bytes at {:>8} ({})",
                region.size, region.start, region.context
            );
        }
    }
    println!();

    if let Some(output) = output {
        print_step(3, steps, DISK, "Writing report...");
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(output, json)?;
        println!("Written to: {}", output.display());
    }

    print_done(started.elapsed());
    Ok(())
}
