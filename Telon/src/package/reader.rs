//! Package header and table parsing

use std::path::Path;

use super::document::{
    ExportEntry, HEADER_SIZE, ImportEntry, NameEntry, NameTable, PACKAGE_SIGNATURE,
    PackageContainer, PackageHeader, TableLocation, TableSpan,
};
use crate::error::{Error, Result};
use crate::formats::ue2::Ue2Reader;

// Smallest possible encoded entry per table, used to reject absurd counts
// before allocating.
const MIN_NAME_ENTRY: usize = 5;
const MIN_IMPORT_ENTRY: usize = 7;
const MIN_EXPORT_ENTRY: usize = 10;

/// Read and parse a package file from disk.
pub fn read_package<P: AsRef<Path>>(path: P) -> Result<PackageContainer> {
    let data = std::fs::read(path.as_ref())?;
    tracing::debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
    PackageContainer::open(data)
}

impl PackageContainer {
    /// Parse a package from an in-memory buffer.
    ///
    /// The three tables are either read completely or the whole package is
    /// rejected; a malformed class reference only resolves to an empty name.
    pub fn open(data: Vec<u8>) -> Result<Self> {
        let header = parse_header(&data)?;
        let mut spans = vec![TableSpan {
            table: "header",
            start: 0,
            end: HEADER_SIZE,
        }];

        let (names, span) = parse_names(&data, header.names)?;
        spans.push(span);
        let (imports, span) = parse_imports(&data, header.imports, &names)?;
        spans.push(span);
        let (mut exports, span) = parse_exports(&data, header.exports, &names, &imports)?;
        spans.push(span);

        // Positive class references point at exports, which only exist now
        let export_names: Vec<String> = exports.iter().map(|e| e.object_name.clone()).collect();
        for export in exports.iter_mut().filter(|e| e.class_index > 0) {
            export.class_name = usize::try_from(export.class_index - 1)
                .ok()
                .and_then(|i| export_names.get(i))
                .cloned()
                .unwrap_or_default();
        }

        tracing::debug!(
            "Parsed package v{}/{}: {} names, {} imports, {} exports",
            header.version,
            header.licensee,
            names.len(),
            imports.len(),
            exports.len()
        );

        Ok(Self {
            data,
            header,
            names,
            imports,
            exports,
            spans,
        })
    }
}

fn truncated(table: &'static str) -> impl Fn(Error) -> Error {
    move |err| match err {
        Error::OutOfBounds { offset, .. } => Error::Truncated { table, offset },
        other => other,
    }
}

fn parse_header(data: &[u8]) -> Result<PackageHeader> {
    let mut reader = Ue2Reader::new(data);

    let signature = reader.read_u32().map_err(truncated("header"))?;
    if signature != PACKAGE_SIGNATURE {
        return Err(Error::InvalidSignature { found: signature });
    }

    let mut read_header = || -> Result<PackageHeader> {
        let version = reader.read_u16()?;
        let licensee = reader.read_u16()?;
        let package_flags = reader.read_u32()?;
        let names = TableLocation {
            count: reader.read_u32()?,
            offset: reader.read_u32()?,
        };
        let exports = TableLocation {
            count: reader.read_u32()?,
            offset: reader.read_u32()?,
        };
        let imports = TableLocation {
            count: reader.read_u32()?,
            offset: reader.read_u32()?,
        };
        Ok(PackageHeader {
            signature,
            version,
            licensee,
            package_flags,
            names,
            exports,
            imports,
        })
    };
    read_header().map_err(truncated("header"))
}

/// Position a reader at a table and reject counts the buffer cannot hold.
fn table_reader<'a>(
    data: &'a [u8],
    location: TableLocation,
    table: &'static str,
    min_entry: usize,
) -> Result<Ue2Reader<'a>> {
    let offset = location.offset as usize;
    let available = data.len().saturating_sub(offset);
    if offset > data.len() || (location.count as usize).saturating_mul(min_entry) > available {
        return Err(Error::Truncated {
            table,
            offset: offset.min(data.len()),
        });
    }
    Ok(Ue2Reader::at(data, offset))
}

fn parse_names(data: &[u8], location: TableLocation) -> Result<(NameTable, TableSpan)> {
    let mut reader = table_reader(data, location, "names", MIN_NAME_ENTRY)?;
    let start = reader.tell();

    let mut entries = Vec::with_capacity(location.count as usize);
    for _ in 0..location.count {
        let name = reader.read_fstring().map_err(truncated("names"))?;
        let flags = reader.read_u32().map_err(truncated("names"))?;
        entries.push(NameEntry { name, flags });
    }

    let span = TableSpan {
        table: "names",
        start,
        end: reader.tell(),
    };
    Ok((NameTable::new(entries), span))
}

fn parse_imports(
    data: &[u8],
    location: TableLocation,
    names: &NameTable,
) -> Result<(Vec<ImportEntry>, TableSpan)> {
    let mut reader = table_reader(data, location, "imports", MIN_IMPORT_ENTRY)?;
    let start = reader.tell();

    let mut imports = Vec::with_capacity(location.count as usize);
    for _ in 0..location.count {
        let mut read_entry = || -> Result<ImportEntry> {
            let class_package_index = reader.read_compact_index()?;
            let class_name_index = reader.read_compact_index()?;
            let package = reader.read_i32()?;
            let object_name_index = reader.read_compact_index()?;
            Ok(ImportEntry {
                class_package_index,
                class_name_index,
                package,
                object_name_index,
                class_package: names.get_or_empty(class_package_index),
                class_name: names.get_or_empty(class_name_index),
                object_name: names.get_or_empty(object_name_index),
            })
        };
        imports.push(read_entry().map_err(truncated("imports"))?);
    }

    let span = TableSpan {
        table: "imports",
        start,
        end: reader.tell(),
    };
    Ok((imports, span))
}

fn parse_exports(
    data: &[u8],
    location: TableLocation,
    names: &NameTable,
    imports: &[ImportEntry],
) -> Result<(Vec<ExportEntry>, TableSpan)> {
    let mut reader = table_reader(data, location, "exports", MIN_EXPORT_ENTRY)?;
    let start = reader.tell();

    let mut exports = Vec::with_capacity(location.count as usize);
    for index in 0..location.count as usize {
        let mut read_entry = || -> Result<ExportEntry> {
            let class_index = reader.read_compact_index()?;
            let super_index = reader.read_compact_index()?;
            let package = reader.read_i32()?;
            let object_name_index = reader.read_compact_index()?;
            let object_flags = reader.read_u32()?;
            let serial_size = reader.read_compact_index()?;
            let serial_offset = if serial_size > 0 {
                reader.read_compact_index()?
            } else {
                0
            };
            Ok(ExportEntry {
                index,
                class_index,
                super_index,
                package,
                object_name_index,
                object_flags,
                serial_size,
                serial_offset,
                class_name: import_class_name(class_index, imports),
                object_name: names.get_or_empty(object_name_index),
            })
        };
        exports.push(read_entry().map_err(truncated("exports"))?);
    }

    let span = TableSpan {
        table: "exports",
        start,
        end: reader.tell(),
    };
    Ok((exports, span))
}

/// Class name for zero and negative class references; positive references
/// are filled in once every export is known.
fn import_class_name(class_index: i64, imports: &[ImportEntry]) -> String {
    match class_index {
        0 => "Class".to_string(),
        i if i < 0 => usize::try_from(-i - 1)
            .ok()
            .and_then(|idx| imports.get(idx))
            .map(|import| import.object_name.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PackageBuilder;
    use pretty_assertions::assert_eq;

    fn sample_package() -> Vec<u8> {
        let mut builder = PackageBuilder::new();
        let mesh_class = builder.import("Engine", "Class", "StaticMesh");
        let texture_class = builder.import("Engine", "Class", "Texture");
        let rock = builder.export(mesh_class, "Rock", vec![0x00, 0xAA, 0xBB]);
        builder.export(texture_class, "RockSkin", vec![0x00]);
        // Class defined inside the package, and an instance of it
        let local_class = builder.export(0, "LocalThing", Vec::new());
        builder.export(local_class, "LocalInstance", vec![0x00, 0x01]);
        // A reference far outside the import table
        builder.export(-40, "Orphan", vec![0x00]);
        assert_eq!(rock, 1);
        builder.build()
    }

    #[test]
    fn test_open_reads_header_and_tables() {
        let pkg = PackageContainer::open(sample_package()).unwrap();
        assert_eq!(pkg.header().signature, PACKAGE_SIGNATURE);
        assert_eq!(pkg.exports().len(), 5);
        assert_eq!(pkg.imports().len(), 2);
        assert_eq!(pkg.imports()[0].class_package, "Engine");
        assert_eq!(pkg.name(0), Some("None"));
    }

    #[test]
    fn test_class_resolution_invariant() {
        let pkg = PackageContainer::open(sample_package()).unwrap();
        for export in pkg.exports() {
            let expected = match export.class_index {
                0 => "Class".to_string(),
                i if i < 0 => pkg
                    .imports()
                    .get((-i - 1) as usize)
                    .map(|imp| imp.object_name.clone())
                    .unwrap_or_default(),
                i => pkg.exports()[(i - 1) as usize].object_name.clone(),
            };
            assert_eq!(export.class_name, expected, "export {}", export.object_name);
        }

        let classes: Vec<&str> = pkg.exports().iter().map(|e| e.class_name.as_str()).collect();
        assert_eq!(classes, vec!["StaticMesh", "Texture", "Class", "LocalThing", ""]);
    }

    #[test]
    fn test_export_data_is_zero_copy_slice() {
        let pkg = PackageContainer::open(sample_package()).unwrap();
        let rock = pkg.find_export("Rock").unwrap();
        let data = pkg.export_data(rock).unwrap();
        assert_eq!(data, &[0x00, 0xAA, 0xBB]);
        assert_eq!(data.as_ptr(), pkg.data()[rock.serial_offset as usize..].as_ptr());

        let class = pkg.find_export("LocalThing").unwrap();
        assert!(!class.has_payload());
        assert_eq!(class.serial_offset, 0);
        assert!(pkg.export_data(class).unwrap().is_empty());
    }

    #[test]
    fn test_object_name_references() {
        let pkg = PackageContainer::open(sample_package()).unwrap();
        assert_eq!(pkg.object_name(0), "None");
        assert_eq!(pkg.object_name(-1), "StaticMesh");
        assert_eq!(pkg.object_name(2), "RockSkin");
        assert_eq!(pkg.object_name(99), "");
        assert_eq!(pkg.exports_of_class("staticmesh").count(), 1);
    }

    #[test]
    fn test_bad_signature_is_fatal() {
        let mut data = sample_package();
        data[0] = 0x00;
        match PackageContainer::open(data) {
            Err(Error::InvalidSignature { found }) => assert_eq!(found & 0xFF, 0),
            other => panic!("expected InvalidSignature, got {other:?}"),
        }
    }

    #[test]
    fn test_short_header_is_truncated() {
        let data = PACKAGE_SIGNATURE.to_le_bytes().to_vec();
        assert!(matches!(
            PackageContainer::open(data),
            Err(Error::Truncated { table: "header", .. })
        ));
    }

    #[test]
    fn test_cut_export_table_is_truncated() {
        let mut data = sample_package();
        // The export table is written last
        data.truncate(data.len() - 3);
        assert!(matches!(
            PackageContainer::open(data),
            Err(Error::Truncated { table: "exports", .. })
        ));
    }

    #[test]
    fn test_absurd_name_count_rejected_before_reading() {
        let mut data = sample_package();
        data[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            PackageContainer::open(data),
            Err(Error::Truncated { table: "names", .. })
        ));
    }

    #[test]
    fn test_export_range_outside_file() {
        let pkg = PackageContainer::open(sample_package()).unwrap();
        let mut export = pkg.find_export("Rock").unwrap().clone();
        export.serial_size = 1 << 30;
        assert!(matches!(
            pkg.export_data(&export),
            Err(Error::ExportOutOfBounds { index: 0, .. })
        ));
    }

    #[test]
    fn test_table_spans_follow_layout() {
        let pkg = PackageContainer::open(sample_package()).unwrap();
        let spans = pkg.table_spans();
        assert_eq!(spans[0].end, HEADER_SIZE);
        let exports = spans.iter().find(|s| s.table == "exports").unwrap();
        assert_eq!(exports.end, pkg.data().len());
    }

    #[test]
    fn test_read_package_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Rocks.usx");
        std::fs::write(&path, sample_package()).unwrap();
        let pkg = read_package(&path).unwrap();
        assert_eq!(pkg.exports().len(), 5);
    }
}
