//! Package container: header, name/import/export tables, export data
//!
//! A [`PackageContainer`] owns the whole file buffer and is read-only once
//! opened, so it can be shared across threads while exports are decoded.

mod audit;
mod document;
mod reader;

pub use audit::{AuditRange, PackageAudit, RangeKind, audit_package};
pub use document::{
    ExportEntry, HEADER_SIZE, ImportEntry, NameEntry, NameTable, PACKAGE_SIGNATURE,
    PackageContainer, PackageHeader, TableLocation, TableSpan,
};
pub use reader::read_package;
