//! StaticMesh geometry types

use serde::Serialize;

use crate::coverage::ParseResult;
use crate::property::PropertyList;

/// Bytes per LOD vertex.
pub const LOD_VERTEX_SIZE: usize = 56;

/// Bounding box layout ahead of the content version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsLayout {
    /// Box without a validity byte, then the sphere: 40 bytes.
    Vanguard,
    /// Box with a trailing validity byte, then the sphere: 41 bytes.
    WithValidity,
}

impl BoundsLayout {
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Vanguard => 40,
            Self::WithValidity => 41,
        }
    }
}

/// Section record width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    /// u32 strip flag then five u16 fields.
    Compact,
    /// Six u32 fields.
    Wide,
}

impl SectionLayout {
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Compact => 14,
            Self::Wide => 24,
        }
    }
}

/// LOD header width; the vertex count is always the last word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LodHeaderLayout {
    Short,
    Long,
}

impl LodHeaderLayout {
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Short => 12,
            Self::Long => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

/// One render section. Compact records widen their u16 fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshSection {
    pub is_strip: u32,
    pub first_index: u32,
    pub min_vertex_index: u32,
    pub max_vertex_index: u32,
    pub num_triangles: u32,
    pub num_primitives: u32,
}

/// Count and revision of a skipped core stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub count: u32,
    pub element_size: usize,
    pub revision: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UvStreamSummary {
    pub count: u32,
    pub coord_index: u32,
    pub revision: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollisionSummary {
    pub model_ref: i32,
    pub triangle_count: u32,
    pub node_count: u32,
}

/// The legacy render streams between the sections and the skip padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreStreams {
    pub vertices: StreamSummary,
    pub colors: StreamSummary,
    pub alphas: StreamSummary,
    pub uvs: Vec<UvStreamSummary>,
    pub indices: StreamSummary,
    pub wireframe: StreamSummary,
    pub collision: CollisionSummary,
}

/// The lazy-array skip over the raw triangle payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LazySkip {
    /// Offset of the six zero bytes.
    pub padding_offset: usize,
    /// Absolute file offset read from the stream; zero when there is no payload.
    pub pointer: u32,
    /// Pointer relative to the export start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    pub payload_size: usize,
    /// Found by searching instead of at the expected position.
    pub searched: bool,
}

/// Everything from the bounds to the lazy-array skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticMeshCore {
    /// Offset of the bounding box.
    pub offset: usize,
    pub bounds_layout: BoundsLayout,
    pub bounding_box: BoundingBox,
    pub bounding_sphere: BoundingSphere,
    pub version: i32,
    pub section_layout: SectionLayout,
    pub sections: Vec<MeshSection>,
    /// Absent when the stream walk failed and the skip was found by search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<CoreStreams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<LazySkip>,
}

/// The four words between the skipped payload and the first LOD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostSkipHeader {
    pub offset: usize,
    pub physics_ref: i32,
    pub auth_key: i32,
    pub lod_version: i32,
    pub lod_count: u32,
}

/// A 56-byte LOD vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LodVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent_x: [f32; 3],
    pub tangent_y: [f32; 3],
    pub u: f32,
    pub v: f32,
}

impl LodVertex {
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        let f = |i: usize| {
            let at = i * 4;
            f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Self {
            position: [f(0), f(1), f(2)],
            normal: [f(3), f(4), f(5)],
            tangent_x: [f(6), f(7), f(8)],
            tangent_y: [f(9), f(10), f(11)],
            u: f(12),
            v: f(13),
        }
    }
}

/// A u32-count-prefixed u16 array found after a LOD's vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailingArray {
    /// Offset of the count word.
    pub offset: usize,
    pub count: u32,
    /// Entries not below the LOD's vertex count.
    pub invalid: usize,
}

impl TrailingArray {
    /// End offset of the array, count word included.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + 4 + self.count as usize * 2
    }
}

/// The array chosen as the LOD's triangle list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexBuffer {
    pub offset: usize,
    pub count: u32,
    /// Empty in counts-only mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<u16>,
}

impl IndexBuffer {
    #[must_use]
    pub fn triangle_count(&self) -> u32 {
        self.count / 3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LodModel {
    pub offset: usize,
    pub header_layout: LodHeaderLayout,
    pub header: Vec<u32>,
    pub vertex_count: u32,
    /// Empty in counts-only mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<LodVertex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_buffer: Option<IndexBuffer>,
    /// Arrays that were read but not selected, in stream order.
    pub other_arrays: Vec<TrailingArray>,
}

/// Result of decoding one StaticMesh export.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedStaticMesh {
    pub properties: PropertyList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core: Option<StaticMeshCore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_skip: Option<PostSkipHeader>,
    pub lods: Vec<LodModel>,
    pub result: ParseResult,
}

impl DecodedStaticMesh {
    /// Vertices across all LODs.
    #[must_use]
    pub fn total_vertices(&self) -> u64 {
        self.lods.iter().map(|lod| u64::from(lod.vertex_count)).sum()
    }

    /// Triangles across all LODs with a selected index buffer.
    #[must_use]
    pub fn total_triangles(&self) -> u64 {
        self.lods
            .iter()
            .filter_map(|lod| lod.index_buffer.as_ref())
            .map(|buffer| u64::from(buffer.triangle_count()))
            .sum()
    }
}
