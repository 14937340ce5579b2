//! CLI command for batch decoding a directory of packages

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, GEAR, LOOKING_GLASS, TRUCK, print_done, print_step, simple_bar};
use crate::config::DecoderOptions;
use crate::extraction::{STATIC_MESH_CLASS, batch_decode, find_package_files};

/// Decode every StaticMesh under a directory and summarize the results
pub fn execute(
    dir: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let steps = if output.is_some() { 3 } else { 2 };
    let options = match config {
        Some(path) => DecoderOptions::load(path)?,
        None => DecoderOptions::default(),
    };

    print_step(1, steps, LOOKING_GLASS, &format!("Searching {}...", dir.display()));
    let files = find_package_files(dir);
    if files.is_empty() {
        println!("No package files found in: {}", dir.display());
        return Ok(());
    }
    println!("Found {} package files", files.len());

    print_step(2, steps, TRUCK, "Decoding meshes...");
    let pb = simple_bar(files.len() as u64, quiet);
    let report = batch_decode(&files, &options, Some(STATIC_MESH_CLASS), |progress| {
        pb.set_position(progress.current as u64);
        let name = Path::new(&progress.file)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        pb.set_message(name);
    });
    pb.finish_and_clear();

    println!();
    println!("{GEAR}Batch complete:");
    println!("  Packages read:   {}", report.success_count);
    println!("  Packages failed: {}", report.fail_count);
    println!("  Meshes:          {}", report.totals.total());
    println!("    Complete: {}", report.totals.complete);
    println!("    Partial:  {}", report.totals.partial);
    println!("    Error:    {}", report.totals.error);

    let failed: Vec<_> = report.files.iter().filter(|e| e.error.is_some()).collect();
    if !failed.is_empty() {
        println!();
        println!("Failed packages:");
        for entry in failed {
            println!(
                "  {}: {}",
                Path::new(&entry.path)
                    .strip_prefix(dir)
                    .unwrap_or(Path::new(&entry.path))
                    .display(),
                entry.error.as_deref().unwrap_or_default()
            );
        }
    }
    println!();

    if let Some(output) = output {
        print_step(3, steps, DISK, "Writing report...");
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(output, json)?;
        println!("Written to: {}", output.display());
    }

    print_done(started.elapsed());
    Ok(())
}
