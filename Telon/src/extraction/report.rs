//! Serializable decode reports

use serde::Serialize;

use crate::coverage::{ParseResult, ParseStatus};
use crate::error::FailureKind;
use crate::package::PackageHeader;
use crate::property::PropertyList;
use crate::staticmesh::DecodedStaticMesh;

/// What a decoder made of one export.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decoder", rename_all = "snake_case")]
pub enum ExportContent {
    Properties {
        list: PropertyList,
        result: ParseResult,
    },
    StaticMesh(DecodedStaticMesh),
    /// The export's data range could not be read.
    Unreadable { result: ParseResult },
}

/// Decode outcome for one export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub index: usize,
    pub object_name: String,
    pub class_name: String,
    pub serial_offset: i64,
    pub serial_size: i64,
    pub content: ExportContent,
}

impl ExportReport {
    #[must_use]
    pub fn result(&self) -> &ParseResult {
        match &self.content {
            ExportContent::Properties { result, .. } | ExportContent::Unreadable { result } => {
                result
            }
            ExportContent::StaticMesh(mesh) => &mesh.result,
        }
    }

    #[must_use]
    pub fn status(&self) -> ParseStatus {
        self.result().status
    }

    /// The decoded property list, if the export was readable.
    #[must_use]
    pub fn properties(&self) -> Option<&PropertyList> {
        match &self.content {
            ExportContent::Properties { list, .. } => Some(list),
            ExportContent::StaticMesh(mesh) => Some(&mesh.properties),
            ExportContent::Unreadable { .. } => None,
        }
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&DecodedStaticMesh> {
        match &self.content {
            ExportContent::StaticMesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Export counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub complete: usize,
    pub partial: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: ParseStatus) {
        match status {
            ParseStatus::Complete => self.complete += 1,
            ParseStatus::Partial => self.partial += 1,
            ParseStatus::Error => self.error += 1,
        }
    }

    pub fn merge(&mut self, other: &StatusCounts) {
        self.complete += other.complete;
        self.partial += other.partial;
        self.error += other.error;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.complete + self.partial + self.error
    }
}

/// Decode outcome for every selected export of one package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub header: PackageHeader,
    pub name_count: usize,
    pub import_count: usize,
    pub export_count: usize,
    pub exports: Vec<ExportReport>,
    pub summary: StatusCounts,
}

/// One file of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PackageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Result of a batch run over many packages.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Packages that opened.
    pub success_count: usize,
    /// Packages that could not be read.
    pub fail_count: usize,
    /// Export statuses across all opened packages.
    pub totals: StatusCounts,
    pub files: Vec<BatchEntry>,
}
