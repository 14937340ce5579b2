//! CLI commands for package containers

use std::collections::HashMap;
use std::path::Path;

use crate::package::{RangeKind, audit_package, read_package};

/// Show header fields, table counts and exports per class
pub fn info(file: &Path) -> anyhow::Result<()> {
    let pkg = read_package(file)?;
    let header = pkg.header();

    let mut by_class: HashMap<&str, (usize, i64)> = HashMap::new();
    for export in pkg.exports() {
        let (count, size) = by_class.entry(export.class_name.as_str()).or_insert((0, 0));
        *count += 1;
        *size += export.serial_size.max(0);
    }

    println!("Package Information: {}", file.display());
    println!();
    println!("Signature:   {:#010X}", header.signature);
    println!("Version:     {} (licensee {})", header.version, header.licensee);
    println!("Flags:       {:#010X}", header.package_flags);
    println!("File size:   {} bytes", pkg.data().len());
    println!(
        "Names:       {:>6} at {}",
        header.names.count, header.names.offset
    );
    println!(
        "Imports:     {:>6} at {}",
        header.imports.count, header.imports.offset
    );
    println!(
        "Exports:     {:>6} at {}",
        header.exports.count, header.exports.offset
    );
    println!();

    println!("Exports by class:");
    let mut class_list: Vec<_> = by_class.into_iter().collect();
    class_list.sort_by_key(|(name, (count, _))| (std::cmp::Reverse(*count), *name));
    for (class_name, (count, size)) in class_list {
        let class_name = if class_name.is_empty() { "?" } else { class_name };
        println!("  {class_name:24} {count:>6} exports  {size:>10} bytes");
    }

    Ok(())
}

/// List the export table, optionally filtered by class
pub fn exports(file: &Path, class: Option<&str>) -> anyhow::Result<()> {
    let pkg = read_package(file)?;

    let selected: Vec<_> = match class {
        Some(class_name) => pkg.exports_of_class(class_name).collect(),
        None => pkg.exports().iter().collect(),
    };

    println!("{} exports in {}", selected.len(), file.display());
    println!();
    println!(
        "  {:>5}  {:24} {:32} {:>10} {:>10}",
        "Index", "Class", "Name", "Offset", "Size"
    );
    for export in selected {
        println!(
            "  {:>5}  {:24} {:32} {:>10} {:>10}",
            export.index,
            export.class_name,
            export.object_name,
            export.serial_offset,
            export.serial_size
        );
    }

    Ok(())
}

/// Audit which byte ranges of the file are accounted for
pub fn audit(file: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let pkg = read_package(file)?;
    let audit = audit_package(&pkg);

    println!("Package audit: {}", file.display());
    println!();
    println!(
        "Mapped: {}/{} bytes ({:.2}%)",
        audit.mapped_bytes, audit.file_len, audit.coverage_pct
    );
    if audit.overlaps > 0 {
        println!("Overlapping ranges: {}", audit.overlaps);
    }

    let gaps: Vec<_> = audit.gaps().collect();
    if gaps.is_empty() {
        println!("No unmapped ranges");
    } else {
        println!();
        println!("Unmapped ranges:");
        for gap in gaps {
            println!("  {:>10} - {:<10} {:>8} bytes", gap.start, gap.end, gap.size);
        }
    }

    let tables = audit
        .ranges
        .iter()
        .filter(|r| !matches!(r.kind, RangeKind::ExportData | RangeKind::Unmapped));
    println!();
    println!("Tables:");
    for range in tables {
        println!(
            "  {:8} {:>10} - {:<10} {:>8} bytes",
            range.label, range.start, range.end, range.size
        );
    }

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&audit)?;
        std::fs::write(output, json)?;
        println!();
        println!("Written to: {}", output.display());
    }

    Ok(())
}
