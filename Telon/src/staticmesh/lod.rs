//! LOD models: header, vertices and the trailing u16 arrays

use super::anchor::{
    index_candidate_quality, is_plausible_lod_header, lod_header_counts, prefers_long_header,
    u32_at,
};
use super::types::{IndexBuffer, LOD_VERTEX_SIZE, LodHeaderLayout, LodModel, LodVertex, TrailingArray};
use crate::config::DecoderOptions;
use crate::coverage::ParseResult;
use crate::error::{Error, Result};
use crate::formats::ue2::Ue2Reader;

/// Largest element count read for a trailing array.
pub const MAX_TRAILING_COUNT: u32 = 1_000_000;

struct ScannedArray<'a> {
    array: TrailingArray,
    values: Vec<u16>,
    raw: &'a [u8],
    candidate: bool,
}

fn u16_values(raw: &[u8]) -> Vec<u16> {
    raw.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Read one LOD at the reader's position, claiming its bytes in `result`.
pub(crate) fn read_lod(
    reader: &mut Ue2Reader<'_>,
    lod_index: usize,
    is_last: bool,
    options: &DecoderOptions,
    result: &mut ParseResult,
) -> Result<LodModel> {
    let data = reader.data();
    let offset = reader.tell();

    let (short_count, long_count) = lod_header_counts(data, offset);
    let header_layout = if prefers_long_header(short_count, long_count) {
        LodHeaderLayout::Long
    } else {
        LodHeaderLayout::Short
    };
    let header = (0..header_layout.size() / 4)
        .map(|_| reader.read_u32())
        .collect::<Result<Vec<u32>>>()?;
    let vertex_count = header.last().copied().unwrap_or_default();
    if vertex_count > options.max_count {
        return Err(Error::ImplausibleCount {
            what: "LOD vertex",
            count: i64::from(vertex_count),
            limit: i64::from(options.max_count),
        });
    }

    let vertex_bytes = reader.read_bytes(vertex_count as usize * LOD_VERTEX_SIZE)?;
    let vertices = if options.include_vertices {
        vertex_bytes
            .chunks_exact(LOD_VERTEX_SIZE)
            .map(LodVertex::from_bytes)
            .collect()
    } else {
        Vec::new()
    };
    result.parsed_through(reader.tell());

    let scanned = scan_trailing_arrays(reader, vertex_count, is_last, options.max_trailing_arrays)?;

    let selected = scanned
        .iter()
        .enumerate()
        .filter(|(_, s)| s.candidate)
        .fold(None::<(usize, u32)>, |best, (i, s)| match best {
            Some((_, count)) if count >= s.array.count => best,
            _ => Some((i, s.array.count)),
        })
        .map(|(i, _)| i);

    let mut index_buffer = None;
    let mut other_arrays = Vec::new();
    for (position, scan) in scanned.into_iter().enumerate() {
        let end = scan.array.end();
        if Some(position) == selected {
            result.parsed_through(end);
            index_buffer = Some(IndexBuffer {
                offset: scan.array.offset,
                count: scan.array.count,
                indices: if options.include_vertices {
                    scan.values
                } else {
                    Vec::new()
                },
            });
        } else if scan.array.count == 0 {
            result.parsed_through(end);
        } else {
            result.unknown_through(end, data, &format!("lod{lod_index}_array{position}"));
            tracing::trace!(
                "LOD {} array {}: {} entries ({} bytes) not selected",
                lod_index,
                position,
                scan.array.count,
                scan.raw.len()
            );
            other_arrays.push(scan.array);
        }
    }

    match &index_buffer {
        Some(buffer) => tracing::debug!(
            "LOD {}: {} vertices, {} indices at {}",
            lod_index,
            vertex_count,
            buffer.count,
            buffer.offset
        ),
        None => tracing::warn!("LOD {}: no plausible index buffer", lod_index),
    }

    Ok(LodModel {
        offset,
        header_layout,
        header,
        vertex_count,
        vertices,
        index_buffer,
        other_arrays,
    })
}

/// Read u32-count-prefixed u16 arrays until one is implausible, the
/// budget runs out, or (for inner LODs) the next LOD header shows up.
fn scan_trailing_arrays<'a>(
    reader: &mut Ue2Reader<'a>,
    vertex_count: u32,
    is_last: bool,
    max_arrays: usize,
) -> Result<Vec<ScannedArray<'a>>> {
    let data = reader.data();
    let mut scanned: Vec<ScannedArray<'a>> = Vec::new();

    for _ in 0..max_arrays {
        let start = reader.tell();
        let Some(count) = u32_at(data, start) else {
            break;
        };
        if count > MAX_TRAILING_COUNT || start + 4 + count as usize * 2 > data.len() {
            break;
        }
        reader.skip(4)?;
        let raw = reader.read_bytes(count as usize * 2)?;
        let values = u16_values(raw);
        let invalid = values.iter().filter(|&&v| u32::from(v) >= vertex_count).count();
        let candidate = index_candidate_quality(&values, vertex_count).is_some();
        scanned.push(ScannedArray {
            array: TrailingArray {
                offset: start,
                count,
                invalid,
            },
            values,
            raw,
            candidate,
        });

        if !is_last
            && scanned.iter().any(|s| s.candidate)
            && is_plausible_lod_header(data, reader.tell())
        {
            break;
        }
    }
    Ok(scanned)
}
