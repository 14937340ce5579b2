//! Vanguard StaticMesh geometry
//!
//! [`decode_static_mesh`] turns a StaticMesh export into its core
//! structure, LOD models and a byte-coverage report.
//!
//! ```no_run
//! use telon::config::DecoderOptions;
//! use telon::package::read_package;
//! use telon::staticmesh::decode_static_mesh;
//!
//! let pkg = read_package("P0001_Sun_Meshes.usx")?;
//! for export in pkg.exports_of_class("StaticMesh") {
//!     let data = pkg.export_data(export)?;
//!     let mesh = decode_static_mesh(data, pkg.names(), export.serial_offset, &DecoderOptions::default());
//!     println!("{}: {:.1}% {:?}", export.object_name, mesh.result.coverage_pct, mesh.result.status);
//! }
//! # Ok::<(), telon::Error>(())
//! ```

mod anchor;
mod decoder;
mod lod;
mod streams;
mod types;

pub use anchor::{
    LEGAL_VERSIONS, MAX_LOD_HEADER_VERTICES, MAX_SECTIONS, SKIP_PADDING, bounds_layout_before,
    empty_streams_follow, find_core_anchor, find_skip_padding, index_candidate_quality,
    is_core_anchor, is_plausible_lod_header, is_plausible_post_skip, plausible_bounds,
    score_core_anchor,
};
pub use decoder::decode_static_mesh;
pub use lod::MAX_TRAILING_COUNT;
pub use types::{
    BoundingBox, BoundingSphere, BoundsLayout, CollisionSummary, CoreStreams, DecodedStaticMesh,
    IndexBuffer, LOD_VERTEX_SIZE, LazySkip, LodHeaderLayout, LodModel, LodVertex, MeshSection,
    PostSkipHeader, SectionLayout, StaticMeshCore, StreamSummary, TrailingArray, UvStreamSummary,
};
