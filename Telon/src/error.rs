//! Error types for `Telon`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error type for `Telon` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Errors ====================
    /// The file does not start with the package magic.
    #[error("invalid package signature: expected 0x9E2A83C1, found {found:#010X}")]
    InvalidSignature {
        /// The 32-bit value found at offset 0.
        found: u32,
    },

    /// A container table ran past the end of the buffer.
    #[error("{table} table truncated at offset {offset}")]
    Truncated {
        /// Which structure was being read (`header`, `names`, `imports`, `exports`).
        table: &'static str,
        /// Absolute offset where the read failed.
        offset: usize,
    },

    /// A read needed more bytes than the buffer holds.
    #[error("read of {needed} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfBounds {
        /// Offset of the failed read.
        offset: usize,
        /// Number of bytes requested.
        needed: usize,
        /// Total buffer length.
        len: usize,
    },

    /// An export's serial range lies outside the file.
    #[error("export {index} data [{offset}, +{size}) exceeds file length {len}")]
    ExportOutOfBounds {
        /// Zero-based export index.
        index: usize,
        /// Declared serial offset.
        offset: i64,
        /// Declared serial size.
        size: i64,
        /// File length.
        len: usize,
    },

    // ==================== Property Errors ====================
    /// A name reference points outside the name table.
    #[error("invalid name index {index} (name table has {count} entries)")]
    InvalidNameIndex {
        /// The offending index.
        index: i64,
        /// Number of names in the table.
        count: usize,
    },

    /// A property tag failed validation; the stream is no longer aligned.
    #[error("desync detected at offset {offset}: {reason}")]
    DesyncDetected {
        /// Offset of the rejected tag.
        offset: usize,
        /// Which rule rejected it.
        reason: String,
    },

    // ==================== StaticMesh Errors ====================
    /// No offset in the search window satisfied the anchor predicate.
    #[error("{what} anchor not found in {window} bytes from offset {start}")]
    AnchorNotFound {
        /// Which structure was being located.
        what: &'static str,
        /// First offset searched.
        start: usize,
        /// Size of the search window.
        window: usize,
    },

    /// The lazy-array skip pointer does not land inside the export.
    #[error(
        "skip pointer {pointer} (relative {relative}) outside [{cursor}, {len}]"
    )]
    SkipPointerOutOfBounds {
        /// Absolute file offset read from the stream.
        pointer: u32,
        /// Pointer relative to the export's serial offset.
        relative: i64,
        /// Cursor position when the pointer was read.
        cursor: usize,
        /// Export data length.
        len: usize,
    },

    /// A count exceeded its sanity ceiling.
    #[error("implausible {what} count {count} (limit {limit})")]
    ImplausibleCount {
        /// What was being counted.
        what: &'static str,
        /// The count read from the stream.
        count: i64,
        /// The ceiling it exceeded.
        limit: i64,
    },

    // ==================== Config/Report Errors ====================
    /// Failed to parse a decoder options file.
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to serialize a report.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable classification of an [`Error`], carried by reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Io,
    InvalidSignature,
    Truncated,
    OutOfBounds,
    ExportOutOfBounds,
    InvalidNameIndex,
    DesyncDetected,
    AnchorNotFound,
    SkipPointerOutOfBounds,
    ImplausibleCount,
    Config,
    Json,
}

impl Error {
    /// Classify this error for reporting.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Io(_) => FailureKind::Io,
            Error::InvalidSignature { .. } => FailureKind::InvalidSignature,
            Error::Truncated { .. } => FailureKind::Truncated,
            Error::OutOfBounds { .. } => FailureKind::OutOfBounds,
            Error::ExportOutOfBounds { .. } => FailureKind::ExportOutOfBounds,
            Error::InvalidNameIndex { .. } => FailureKind::InvalidNameIndex,
            Error::DesyncDetected { .. } => FailureKind::DesyncDetected,
            Error::AnchorNotFound { .. } => FailureKind::AnchorNotFound,
            Error::SkipPointerOutOfBounds { .. } => FailureKind::SkipPointerOutOfBounds,
            Error::ImplausibleCount { .. } => FailureKind::ImplausibleCount,
            Error::Config(_) => FailureKind::Config,
            Error::Json(_) => FailureKind::Json,
        }
    }

    /// Shorthand for a [`Error::DesyncDetected`] at `offset`.
    pub(crate) fn desync(offset: usize, reason: impl Into<String>) -> Self {
        Error::DesyncDetected {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type alias for `Telon` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = Error::ImplausibleCount {
            what: "vertex",
            count: 600_000,
            limit: 500_000,
        };
        assert_eq!(err.kind(), FailureKind::ImplausibleCount);
        assert_eq!(err.to_string(), "implausible vertex count 600000 (limit 500000)");
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::SkipPointerOutOfBounds).unwrap();
        assert_eq!(json, "\"skip_pointer_out_of_bounds\"");
    }
}
