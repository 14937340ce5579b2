//! Export and package decoding drivers
//!
//! Routes each export to the decoder for its class, and fans whole packages
//! and directories of packages out over rayon.

mod batch;
mod report;

use rayon::prelude::*;

use crate::config::DecoderOptions;
use crate::coverage::ParseResult;
use crate::package::{ExportEntry, NameTable, PackageContainer};
use crate::property::{PropertyDecoder, PropertyList, Termination, find_property_start};
use crate::staticmesh::decode_static_mesh;

pub use batch::{BatchProgress, PACKAGE_EXTENSIONS, batch_decode, find_package_files};
pub use report::{
    BatchEntry, BatchReport, ExportContent, ExportReport, PackageReport, StatusCounts,
};

/// Class name routed to the StaticMesh decoder.
pub const STATIC_MESH_CLASS: &str = "StaticMesh";

/// Decode one export with the decoder its class calls for.
///
/// StaticMesh exports go through [`decode_static_mesh`]; every other class
/// is read as a chained property list. A serial range that lies outside the
/// file yields an `Error` status instead of an `Err`.
#[must_use]
pub fn decode_export(
    pkg: &PackageContainer,
    export: &ExportEntry,
    options: &DecoderOptions,
) -> ExportReport {
    let content = match pkg.export_data(export) {
        Ok(data) if export.class_name.eq_ignore_ascii_case(STATIC_MESH_CLASS) => {
            ExportContent::StaticMesh(decode_static_mesh(
                data,
                pkg.names(),
                export.serial_offset,
                options,
            ))
        }
        Ok(data) => {
            let (list, result) = decode_object_properties(data, pkg.names(), options);
            ExportContent::Properties { list, result }
        }
        Err(err) => {
            tracing::warn!("Export {} ({}): {}", export.index, export.object_name, err);
            let mut result = ParseResult::new(0, options.hex_preview_limit);
            result.fail(&err);
            ExportContent::Unreadable {
                result: result.finish(&[]),
            }
        }
    };

    ExportReport {
        index: export.index,
        object_name: export.object_name.clone(),
        class_name: export.class_name.clone(),
        serial_offset: export.serial_offset,
        serial_size: export.serial_size,
        content,
    }
}

/// Decode a property list from the start of an object's data, falling back
/// to a scored start search when offset 0 yields nothing.
fn decode_object_properties(
    data: &[u8],
    names: &NameTable,
    options: &DecoderOptions,
) -> (PropertyList, ParseResult) {
    let decoder = PropertyDecoder::new(names).with_max_properties(options.max_properties);
    let mut list = decoder.decode(data, 0);

    if list.is_empty() && options.scan_property_start {
        if let Some(start) = find_property_start(data, names).filter(|&s| s > 0) {
            let scanned = decoder.decode(data, start);
            if !scanned.is_empty() {
                tracing::debug!("Property list found at {} by scan", start);
                list = scanned;
            }
        }
    }

    let mut result = ParseResult::new(data.len(), options.hex_preview_limit);
    result.unknown_through(list.start_offset, data, "pre_property_header");
    result.parsed_through(list.end_offset);
    result.unknown_through(data.len(), data, "post_property_data");
    if let Termination::Desync { kind, message, .. } = &list.termination {
        result.fail_with(*kind, message.as_str());
    }
    (list, result.finish(data))
}

/// Decode every export of a package, optionally only those of one class.
///
/// Exports are decoded in parallel; the report keeps export table order.
#[must_use]
pub fn decode_package(
    pkg: &PackageContainer,
    options: &DecoderOptions,
    class_filter: Option<&str>,
) -> PackageReport {
    let selected: Vec<&ExportEntry> = pkg
        .exports()
        .iter()
        .filter(|e| class_filter.is_none_or(|class| e.class_name.eq_ignore_ascii_case(class)))
        .collect();

    let exports: Vec<ExportReport> = selected
        .par_iter()
        .map(|export| decode_export(pkg, export, options))
        .collect();

    let mut summary = StatusCounts::default();
    for report in &exports {
        summary.add(report.status());
    }
    tracing::debug!(
        "Decoded {} exports: {} complete, {} partial, {} error",
        exports.len(),
        summary.complete,
        summary.partial,
        summary.error
    );

    PackageReport {
        header: *pkg.header(),
        name_count: pkg.names().len(),
        import_count: pkg.imports().len(),
        export_count: pkg.exports().len(),
        exports,
        summary,
    }
}
