//! Bounds, sections and the legacy core streams

use super::anchor::{empty_streams_follow, i32_at};
use super::types::{
    BoundingBox, BoundingSphere, BoundsLayout, CollisionSummary, CoreStreams, MeshSection,
    SectionLayout, StreamSummary, UvStreamSummary,
};
use crate::error::{Error, Result};
use crate::formats::ue2::Ue2Reader;

const COLLISION_TRIANGLE_SIZE: usize = 10;
const COLLISION_NODE_SIZE: usize = 33;

/// Read a signed count and reject negatives and values above `limit`.
pub(crate) fn read_count(reader: &mut Ue2Reader<'_>, what: &'static str, limit: u32) -> Result<u32> {
    let count = reader.read_i32()?;
    if count < 0 || i64::from(count) > i64::from(limit) {
        return Err(Error::ImplausibleCount {
            what,
            count: i64::from(count),
            limit: i64::from(limit),
        });
    }
    Ok(count as u32)
}

pub(crate) fn read_bounds(
    reader: &mut Ue2Reader<'_>,
    layout: BoundsLayout,
) -> Result<(BoundingBox, BoundingSphere)> {
    let min = reader.read_vec3()?;
    let max = reader.read_vec3()?;
    let is_valid = match layout {
        BoundsLayout::Vanguard => None,
        BoundsLayout::WithValidity => Some(reader.read_u8()?),
    };
    let center = reader.read_vec3()?;
    let radius = reader.read_f32()?;
    Ok((BoundingBox { min, max, is_valid }, BoundingSphere { center, radius }))
}

/// Pick the section width from the streams that follow it.
///
/// Returns the layout and whether it was a fallback guess.
pub(crate) fn detect_section_layout(
    data: &[u8],
    sections_start: usize,
    section_count: usize,
    max_count: u32,
) -> Result<(SectionLayout, bool)> {
    for layout in [SectionLayout::Compact, SectionLayout::Wide] {
        if empty_streams_follow(data, sections_start, section_count, layout) {
            return Ok((layout, false));
        }
    }

    let vertex_at = sections_start + section_count * SectionLayout::Compact.size();
    let Some(vertex_count) = i32_at(data, vertex_at) else {
        return Err(Error::OutOfBounds {
            offset: vertex_at,
            needed: 4,
            len: data.len(),
        });
    };
    if (0..=i64::from(max_count)).contains(&i64::from(vertex_count)) {
        tracing::warn!(
            "Neither section width leaves empty streams; assuming 14-byte sections (vertex count {})",
            vertex_count
        );
        return Ok((SectionLayout::Compact, true));
    }
    Err(Error::ImplausibleCount {
        what: "vertex stream",
        count: i64::from(vertex_count),
        limit: i64::from(max_count),
    })
}

pub(crate) fn read_section(reader: &mut Ue2Reader<'_>, layout: SectionLayout) -> Result<MeshSection> {
    let is_strip = reader.read_u32()?;
    let mut field = || -> Result<u32> {
        match layout {
            SectionLayout::Compact => Ok(u32::from(reader.read_u16()?)),
            SectionLayout::Wide => reader.read_u32(),
        }
    };
    Ok(MeshSection {
        is_strip,
        first_index: field()?,
        min_vertex_index: field()?,
        max_vertex_index: field()?,
        num_triangles: field()?,
        num_primitives: field()?,
    })
}

fn read_stream(
    reader: &mut Ue2Reader<'_>,
    what: &'static str,
    element_size: usize,
    max_count: u32,
) -> Result<StreamSummary> {
    let count = read_count(reader, what, max_count)?;
    reader.skip(count as usize * element_size)?;
    let revision = reader.read_i32()?;
    Ok(StreamSummary {
        count,
        element_size,
        revision,
    })
}

/// Walk the render streams and collision data up to the skip padding.
pub(crate) fn read_streams(reader: &mut Ue2Reader<'_>, max_count: u32) -> Result<CoreStreams> {
    let vertices = read_stream(reader, "vertex stream", 24, max_count)?;
    let colors = read_stream(reader, "color stream", 4, max_count)?;
    let alphas = read_stream(reader, "alpha stream", 4, max_count)?;

    let uv_count = read_count(reader, "UV stream", max_count)?;
    let mut uvs = Vec::new();
    for _ in 0..uv_count {
        let count = read_count(reader, "UV", max_count)?;
        reader.skip(count as usize * 8)?;
        let coord_index = reader.read_u32()?;
        let revision = reader.read_i32()?;
        uvs.push(UvStreamSummary {
            count,
            coord_index,
            revision,
        });
    }

    let indices = read_stream(reader, "index stream", 2, max_count)?;
    let wireframe = read_stream(reader, "wireframe stream", 2, max_count)?;

    let model_ref = reader.read_i32()?;
    let triangle_count = read_count(reader, "collision triangle", max_count)?;
    reader.skip(triangle_count as usize * COLLISION_TRIANGLE_SIZE)?;
    let node_count = read_count(reader, "collision node", max_count)?;
    reader.skip(node_count as usize * COLLISION_NODE_SIZE)?;

    Ok(CoreStreams {
        vertices,
        colors,
        alphas,
        uvs,
        indices,
        wireframe,
        collision: CollisionSummary {
            model_ref,
            triangle_count,
            node_count,
        },
    })
}
