//! # Telon
//!
//! A pure-Rust decoder for Vanguard: Saga of Heroes packages, the Unreal
//! Engine 2 derived container format used by the game client.
//!
//! ## What It Decodes
//!
//! - **Package containers** - Header, name/import/export tables, export data
//! - **Property lists** - Tagged property streams with desync detection
//! - **StaticMesh** - Bounds, sections, core streams, LOD vertices and indices
//! - **Coverage reports** - Every export byte claimed as parsed or unknown
//!
//! ## Quick Start
//!
//! ### Reading a Package
//!
//! ```no_run
//! use telon::package::read_package;
//!
//! let pkg = read_package("P0001_Sun_Meshes.usx")?;
//! println!("{} names, {} exports", pkg.names().len(), pkg.exports().len());
//!
//! for export in pkg.exports_of_class("StaticMesh") {
//!     println!("{} at {} ({} bytes)", export.object_name, export.serial_offset, export.serial_size);
//! }
//! # Ok::<(), telon::Error>(())
//! ```
//!
//! ### Decoding Exports
//!
//! ```no_run
//! use telon::config::DecoderOptions;
//! use telon::extraction::decode_package;
//! use telon::package::read_package;
//!
//! let pkg = read_package("P0001_Sun_Meshes.usx")?;
//! let report = decode_package(&pkg, &DecoderOptions::default(), Some("StaticMesh"));
//! for export in &report.exports {
//!     let result = export.result();
//!     println!("{}: {:?} {:.1}%", export.object_name, result.status, result.coverage_pct);
//! }
//! # Ok::<(), telon::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use telon::prelude::*;
//!
//! let names = NameTable::from_names(["None"]);
//! let list = decode_properties(&[0x00], &names, 0);
//! assert!(list.is_empty());
//! assert!(list.is_terminated());
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `telon` command-line binary

pub mod config;
pub mod coverage;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod package;
pub mod property;
pub mod staticmesh;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::DecoderOptions;
    pub use crate::coverage::{ParseResult, ParseStatus, UnknownRegion};
    pub use crate::error::{Error, FailureKind, Result};
    pub use crate::formats::ue2::{Ue2Reader, encode_compact_index, encode_fstring};

    // Package container
    pub use crate::package::{
        ExportEntry, ImportEntry, NameTable, PackageAudit, PackageContainer, PackageHeader,
        audit_package, read_package,
    };

    // Decoders
    pub use crate::property::{
        ListMode, Property, PropertyDecoder, PropertyList, PropertyType, PropertyValue,
        Termination, decode_properties, find_property_start,
    };
    pub use crate::staticmesh::{DecodedStaticMesh, LodModel, StaticMeshCore, decode_static_mesh};

    // Drivers
    pub use crate::extraction::{
        BatchReport, ExportReport, PackageReport, batch_decode, decode_export, decode_package,
        find_package_files,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

#[doc(hidden)]
pub mod test_support;
