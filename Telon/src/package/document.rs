//! Package table types and accessors

use serde::Serialize;

use crate::error::{Error, Result};

/// Magic at offset 0 of every package.
pub const PACKAGE_SIGNATURE: u32 = 0x9E2A83C1;

/// Size of the fixed header prefix.
pub const HEADER_SIZE: usize = 36;

/// Count and absolute offset of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableLocation {
    pub count: u32,
    pub offset: u32,
}

/// The fixed 36-byte package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackageHeader {
    pub signature: u32,
    pub version: u16,
    pub licensee: u16,
    pub package_flags: u32,
    pub names: TableLocation,
    pub exports: TableLocation,
    pub imports: TableLocation,
}

/// One name table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameEntry {
    pub name: String,
    pub flags: u32,
}

/// Index-addressed name table.
///
/// Name references read from the stream are untrusted; every lookup is
/// bounds-checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameTable {
    entries: Vec<NameEntry>,
}

impl NameTable {
    #[must_use]
    pub fn new(entries: Vec<NameEntry>) -> Self {
        Self { entries }
    }

    /// Build a table from bare strings (flags zero).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names
                .into_iter()
                .map(|name| NameEntry {
                    name: name.into(),
                    flags: 0,
                })
                .collect(),
        }
    }

    /// Look up a name, `None` when the index is out of range.
    #[must_use]
    pub fn get(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|entry| entry.name.as_str())
    }

    /// Look up a name, failing with [`Error::InvalidNameIndex`].
    pub fn resolve(&self, index: i64) -> Result<&str> {
        self.get(index).ok_or(Error::InvalidNameIndex {
            index,
            count: self.entries.len(),
        })
    }

    /// Name at `index`, or an empty string.
    #[must_use]
    pub fn get_or_empty(&self, index: i64) -> String {
        self.get(index).unwrap_or_default().to_string()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameEntry> {
        self.entries.iter()
    }
}

/// An object referenced from another package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEntry {
    pub class_package_index: i64,
    pub class_name_index: i64,
    pub package: i32,
    pub object_name_index: i64,
    pub class_package: String,
    pub class_name: String,
    pub object_name: String,
}

/// An object defined in this package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEntry {
    /// Zero-based position in the export table.
    pub index: usize,
    /// Signed class reference: negative imports, positive exports, zero "Class".
    pub class_index: i64,
    pub super_index: i64,
    pub package: i32,
    pub object_name_index: i64,
    pub object_flags: u32,
    pub serial_size: i64,
    pub serial_offset: i64,
    pub class_name: String,
    pub object_name: String,
}

impl ExportEntry {
    /// Whether this export has serialized data.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.serial_size > 0
    }
}

/// Byte range a table occupied in the file, as measured while reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSpan {
    pub table: &'static str,
    pub start: usize,
    pub end: usize,
}

/// A parsed package.
#[derive(Debug, Clone)]
pub struct PackageContainer {
    pub(super) data: Vec<u8>,
    pub(super) header: PackageHeader,
    pub(super) names: NameTable,
    pub(super) imports: Vec<ImportEntry>,
    pub(crate) exports: Vec<ExportEntry>,
    pub(super) spans: Vec<TableSpan>,
}

impl PackageContainer {
    #[must_use]
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    #[must_use]
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    #[must_use]
    pub fn imports(&self) -> &[ImportEntry] {
        &self.imports
    }

    #[must_use]
    pub fn exports(&self) -> &[ExportEntry] {
        &self.exports
    }

    /// The whole file buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Header and table byte ranges.
    #[must_use]
    pub fn table_spans(&self) -> &[TableSpan] {
        &self.spans
    }

    /// Bounds-checked name lookup.
    #[must_use]
    pub fn name(&self, index: i64) -> Option<&str> {
        self.names.get(index)
    }

    /// Object name behind a signed object reference.
    ///
    /// Zero is the null reference and reads as "None"; references that point
    /// outside the tables read as an empty string.
    #[must_use]
    pub fn object_name(&self, reference: i64) -> String {
        match reference {
            0 => "None".to_string(),
            r if r < 0 => self
                .import_at(r)
                .map(|import| import.object_name.clone())
                .unwrap_or_default(),
            r => self
                .export_at(r)
                .map(|export| export.object_name.clone())
                .unwrap_or_default(),
        }
    }

    /// Import behind a negative one-based reference.
    #[must_use]
    pub fn import_at(&self, reference: i64) -> Option<&ImportEntry> {
        if reference >= 0 {
            return None;
        }
        usize::try_from(-reference - 1)
            .ok()
            .and_then(|i| self.imports.get(i))
    }

    /// Export behind a positive one-based reference.
    #[must_use]
    pub fn export_at(&self, reference: i64) -> Option<&ExportEntry> {
        if reference <= 0 {
            return None;
        }
        usize::try_from(reference - 1)
            .ok()
            .and_then(|i| self.exports.get(i))
    }

    /// First export with the given object name.
    #[must_use]
    pub fn find_export(&self, object_name: &str) -> Option<&ExportEntry> {
        self.exports.iter().find(|e| e.object_name == object_name)
    }

    /// Exports whose resolved class name matches, case-insensitively.
    pub fn exports_of_class<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = &'a ExportEntry> + 'a {
        self.exports
            .iter()
            .filter(move |e| e.class_name.eq_ignore_ascii_case(class_name))
    }

    /// Zero-copy view of an export's serialized data.
    ///
    /// Exports without a payload yield an empty slice.
    pub fn export_data(&self, export: &ExportEntry) -> Result<&[u8]> {
        if export.serial_size <= 0 {
            return Ok(&[]);
        }
        let out_of_bounds = || Error::ExportOutOfBounds {
            index: export.index,
            offset: export.serial_offset,
            size: export.serial_size,
            len: self.data.len(),
        };
        let start = usize::try_from(export.serial_offset).map_err(|_| out_of_bounds())?;
        let size = usize::try_from(export.serial_size).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(size).ok_or_else(out_of_bounds)?;
        self.data.get(start..end).ok_or_else(out_of_bounds)
    }
}
