//! Byte-range audit of a whole package file

use serde::Serialize;

use super::document::PackageContainer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Header,
    Names,
    Imports,
    Exports,
    ExportData,
    Unmapped,
}

/// One byte range of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRange {
    pub kind: RangeKind,
    pub start: usize,
    pub end: usize,
    pub size: usize,
    pub label: String,
}

impl AuditRange {
    fn new(kind: RangeKind, start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            size: end - start,
            label: label.into(),
        }
    }
}

/// Which parts of a package file the tables and exports account for.
#[derive(Debug, Clone, Serialize)]
pub struct PackageAudit {
    pub file_len: usize,
    /// Mapped and unmapped ranges sorted by start offset.
    pub ranges: Vec<AuditRange>,
    /// Bytes covered by at least one mapped range.
    pub mapped_bytes: usize,
    pub coverage_pct: f64,
    /// Mapped ranges that start inside an earlier one.
    pub overlaps: usize,
}

impl PackageAudit {
    /// The unmapped ranges.
    pub fn gaps(&self) -> impl Iterator<Item = &AuditRange> {
        self.ranges.iter().filter(|r| r.kind == RangeKind::Unmapped)
    }
}

/// Map every byte of the package to a table, an export or a gap.
#[must_use]
pub fn audit_package(pkg: &PackageContainer) -> PackageAudit {
    let file_len = pkg.data().len();

    let mut mapped: Vec<AuditRange> = pkg
        .table_spans()
        .iter()
        .map(|span| {
            let kind = match span.table {
                "header" => RangeKind::Header,
                "names" => RangeKind::Names,
                "imports" => RangeKind::Imports,
                _ => RangeKind::Exports,
            };
            AuditRange::new(kind, span.start, span.end.max(span.start), span.table)
        })
        .collect();

    for export in pkg.exports().iter().filter(|e| e.has_payload()) {
        let Ok(start) = usize::try_from(export.serial_offset) else {
            continue;
        };
        let start = start.min(file_len);
        let end = start
            .saturating_add(export.serial_size as usize)
            .min(file_len);
        let label = format!("{} ({})", export.object_name, export.class_name);
        mapped.push(AuditRange::new(RangeKind::ExportData, start, end, label));
    }
    mapped.sort_by_key(|r| (r.start, r.end));

    let mut ranges = Vec::with_capacity(mapped.len() * 2);
    let mut covered_to = 0;
    let mut mapped_bytes = 0;
    let mut overlaps = 0;
    for range in mapped {
        if range.start > covered_to {
            ranges.push(AuditRange::new(RangeKind::Unmapped, covered_to, range.start, "unmapped"));
        } else if range.start < covered_to {
            overlaps += 1;
        }
        mapped_bytes += range.end.saturating_sub(range.start.max(covered_to));
        covered_to = covered_to.max(range.end);
        ranges.push(range);
    }
    if covered_to < file_len {
        ranges.push(AuditRange::new(RangeKind::Unmapped, covered_to, file_len, "unmapped"));
    }

    let coverage_pct = if file_len == 0 {
        0.0
    } else {
        100.0 * mapped_bytes as f64 / file_len as f64
    };
    tracing::debug!(
        "Audit: {}/{} bytes mapped, {} overlaps",
        mapped_bytes,
        file_len,
        overlaps
    );

    PackageAudit {
        file_len,
        ranges,
        mapped_bytes,
        coverage_pct,
        overlaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PackageBuilder;
    use pretty_assertions::assert_eq;

    fn package(trailing: usize) -> PackageContainer {
        let mut builder = PackageBuilder::new();
        let class = builder.import("Engine", "Class", "StaticMesh");
        builder.export(class, "A", vec![0x00; 10]);
        builder.export(class, "B", vec![0x00; 6]);
        let mut data = builder.build();
        data.extend(vec![0xCC; trailing]);
        PackageContainer::open(data).unwrap()
    }

    #[test]
    fn test_builder_layout_is_fully_mapped() {
        let audit = audit_package(&package(0));
        assert_eq!(audit.gaps().count(), 0);
        assert_eq!(audit.mapped_bytes, audit.file_len);
        assert!((audit.coverage_pct - 100.0).abs() < 1e-9);

        let kinds: Vec<RangeKind> = audit.ranges.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RangeKind::Header,
                RangeKind::ExportData,
                RangeKind::ExportData,
                RangeKind::Names,
                RangeKind::Imports,
                RangeKind::Exports,
            ]
        );
        assert_eq!(audit.ranges[1].label, "A (StaticMesh)");
    }

    #[test]
    fn test_trailing_bytes_are_unmapped() {
        let audit = audit_package(&package(12));
        let gaps: Vec<&AuditRange> = audit.gaps().collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].end, audit.file_len);
        assert_eq!(gaps[0].size, 12);
        assert_eq!(audit.mapped_bytes + 12, audit.file_len);
    }

    #[test]
    fn test_overlapping_exports_count_bytes_once() {
        let mut pkg = package(0);
        let first = pkg.exports[0].serial_offset;
        pkg.exports[1].serial_offset = first;
        let audit = audit_package(&pkg);

        assert_eq!(audit.overlaps, 1);
        // B's old 6 bytes are now unclaimed
        let gaps: Vec<(usize, usize)> = audit.gaps().map(|g| (g.start, g.size)).collect();
        assert_eq!(gaps, vec![(46, 6)]);
        assert_eq!(audit.mapped_bytes + 6, audit.file_len);
    }
}
