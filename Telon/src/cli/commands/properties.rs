//! CLI command for property list decoding

use std::path::Path;

use crate::config::DecoderOptions;
use crate::extraction::{ExportReport, decode_export};
use crate::package::read_package;

/// Decode and print the property lists of every export, or one named export
pub fn execute(
    file: &Path,
    export: Option<&str>,
    scan: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let pkg = read_package(file)?;
    let options = DecoderOptions {
        scan_property_start: scan,
        ..DecoderOptions::default()
    };

    let selected: Vec<_> = match export {
        Some(name) => vec![
            pkg.find_export(name)
                .ok_or_else(|| anyhow::anyhow!("No export named '{name}'"))?,
        ],
        None => pkg.exports().iter().collect(),
    };

    let reports: Vec<ExportReport> = selected
        .iter()
        .map(|e| decode_export(&pkg, e, &options))
        .collect();

    for report in &reports {
        println!(
            "[{}] {} ({})",
            report.index, report.object_name, report.class_name
        );
        let Some(list) = report.properties() else {
            println!(
                "  (unreadable: {})",
                report.result().message.as_deref().unwrap_or("unknown error")
            );
            continue;
        };
        for property in &list.properties {
            let index = property
                .array_index
                .map(|i| format!("[{i}]"))
                .unwrap_or_default();
            println!(
                "  {}{}: {:?} = {:?}",
                property.name, index, property.property_type, property.value
            );
        }
        println!(
            "  -- {} properties, bytes {}..{}, {:?}",
            list.len(),
            list.start_offset,
            list.end_offset,
            list.termination
        );
    }

    if let Some(output) = output {
        let lists: Vec<_> = reports
            .iter()
            .filter_map(|r| r.properties().map(|list| (&r.object_name, list)))
            .collect();
        let json = serde_json::to_string_pretty(&lists)?;
        std::fs::write(output, json)?;
        println!();
        println!("Written to: {}", output.display());
    }

    Ok(())
}
