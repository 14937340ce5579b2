//! Anchor predicates and scoring for StaticMesh structure search
//!
//! Each function is a pure check over a byte window. Searches take the
//! highest score and break ties on the lowest offset.

use super::types::{BoundsLayout, SectionLayout};
use crate::property::plausible_float;

/// Content versions seen ahead of the section list.
pub const LEGAL_VERSIONS: [i32; 7] = [11, 12, 128, 129, 60482, 60484, 60485];

/// Upper bound on the section count.
pub const MAX_SECTIONS: i32 = 200;

/// Largest LOD vertex count a header may claim and still look plausible.
pub const MAX_LOD_HEADER_VERTICES: u32 = 100_000;

/// Zero bytes ahead of the skip pointer.
pub const SKIP_PADDING: usize = 6;

pub(crate) fn i32_at(data: &[u8], offset: usize) -> Option<i32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    i32_at(data, offset).map(|v| v as u32)
}

fn f32_at(data: &[u8], offset: usize) -> Option<f32> {
    u32_at(data, offset).map(f32::from_bits)
}

/// Whether a legal version and section count sit at `offset`.
#[must_use]
pub fn is_core_anchor(data: &[u8], offset: usize) -> bool {
    let Some(version) = i32_at(data, offset) else {
        return false;
    };
    let Some(sections) = i32_at(data, offset + 4) else {
        return false;
    };
    LEGAL_VERSIONS.contains(&version) && (0..=MAX_SECTIONS).contains(&sections)
}

/// Whether the vertex and color stream counts are both zero when the
/// sections at `sections_start` are `layout` wide.
#[must_use]
pub fn empty_streams_follow(
    data: &[u8],
    sections_start: usize,
    section_count: usize,
    layout: SectionLayout,
) -> bool {
    let vertex_at = sections_start + section_count * layout.size();
    // vertex count, then its revision, then the color count
    i32_at(data, vertex_at) == Some(0) && i32_at(data, vertex_at + 8) == Some(0)
}

/// Whether the bytes before `version_offset` read as a bounding box and
/// sphere in `layout`. The validity byte, when present, must be 0 or 1.
#[must_use]
pub fn plausible_bounds(data: &[u8], version_offset: usize, layout: BoundsLayout) -> bool {
    let Some(start) = version_offset.checked_sub(layout.size()) else {
        return false;
    };
    let sphere_start = match layout {
        BoundsLayout::Vanguard => start + 24,
        BoundsLayout::WithValidity => {
            if !matches!(data.get(start + 24), Some(0 | 1)) {
                return false;
            }
            start + 25
        }
    };
    let floats: Option<Vec<f32>> = (0..6)
        .map(|i| f32_at(data, start + i * 4))
        .chain((0..4).map(|i| f32_at(data, sphere_start + i * 4)))
        .collect();
    let Some(floats) = floats else {
        return false;
    };
    floats.iter().all(|&v| plausible_float(v))
        && (0..3).all(|axis| floats[axis] <= floats[axis + 3])
        && floats[9] >= 0.0
}

/// Bounds layout that reads plausibly ahead of `version_offset`, 40-byte
/// first.
#[must_use]
pub fn bounds_layout_before(data: &[u8], version_offset: usize) -> Option<BoundsLayout> {
    [BoundsLayout::Vanguard, BoundsLayout::WithValidity]
        .into_iter()
        .find(|&layout| plausible_bounds(data, version_offset, layout))
}

/// Score a candidate version offset; zero when it is no anchor at all.
///
/// A legal version and section count score 1, empty streams under either
/// section width add 2, and plausible bounds of either layout ahead of it
/// add 1.
#[must_use]
pub fn score_core_anchor(data: &[u8], offset: usize) -> u32 {
    if !is_core_anchor(data, offset) {
        return 0;
    }
    let mut score = 1;

    let section_count = i32_at(data, offset + 4).unwrap_or_default() as usize;
    let sections_start = offset + 8;
    if [SectionLayout::Compact, SectionLayout::Wide]
        .into_iter()
        .any(|layout| empty_streams_follow(data, sections_start, section_count, layout))
    {
        score += 2;
    }
    if bounds_layout_before(data, offset).is_some() {
        score += 1;
    }
    score
}

/// Search `window` bytes from `start` for the best-scoring version offset.
#[must_use]
pub fn find_core_anchor(data: &[u8], start: usize, window: usize) -> Option<usize> {
    let end = start.saturating_add(window).min(data.len());
    let mut best: Option<(usize, u32)> = None;
    for offset in start..end {
        let score = score_core_anchor(data, offset);
        if score > 0 && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((offset, score));
        }
    }
    best.map(|(offset, _)| offset)
}

/// Whether the post-skip header at `offset` has a sane LOD version and count.
#[must_use]
pub fn is_plausible_post_skip(data: &[u8], offset: usize, max_lods: u32) -> bool {
    let (Some(lod_version), Some(lod_count)) = (i32_at(data, offset + 8), i32_at(data, offset + 12))
    else {
        return false;
    };
    matches!(lod_version, 0 | 1) && (1..=i64::from(max_lods)).contains(&i64::from(lod_count))
}

/// Vertex counts of the short and long LOD header readings at `offset`.
pub(crate) fn lod_header_counts(data: &[u8], offset: usize) -> (Option<u32>, Option<u32>) {
    (u32_at(data, offset + 8), u32_at(data, offset + 12))
}

/// Whether the long header reading should win over the short one.
pub(crate) fn prefers_long_header(short_count: Option<u32>, long_count: Option<u32>) -> bool {
    let short_unusable = short_count.is_none_or(|v| v == 0 || v > MAX_LOD_HEADER_VERTICES);
    short_unusable && long_count.is_some_and(|v| (1..=MAX_LOD_HEADER_VERTICES).contains(&v))
}

/// Whether a LOD header at `offset` claims a vertex count whose vertices
/// fit in the buffer.
#[must_use]
pub fn is_plausible_lod_header(data: &[u8], offset: usize) -> bool {
    let (short_count, long_count) = lod_header_counts(data, offset);
    let (header, count) = if prefers_long_header(short_count, long_count) {
        (16, long_count)
    } else {
        (12, short_count)
    };
    count.is_some_and(|count| {
        (1..=MAX_LOD_HEADER_VERTICES).contains(&count)
            && offset + header + count as usize * super::types::LOD_VERTEX_SIZE <= data.len()
    })
}

/// Invalid entry count of a trailing array if it can be an index buffer.
///
/// Candidates hold at least three entries and fewer entries at or above
/// `vertex_count` than 5% of their length (at least one).
#[must_use]
pub fn index_candidate_quality(values: &[u16], vertex_count: u32) -> Option<usize> {
    if values.len() < 3 {
        return None;
    }
    let invalid = values
        .iter()
        .filter(|&&v| u32::from(v) >= vertex_count)
        .count();
    let allowed = (values.len() as f64 * 0.05).max(1.0);
    ((invalid as f64) < allowed).then_some(invalid)
}

/// Search forward from `start` for the skip padding and a pointer that
/// lands inside the export.
///
/// Returns the padding offset and pointer. A zero pointer is accepted only
/// if no in-range pointer follows any zero run.
#[must_use]
pub fn find_skip_padding(data: &[u8], start: usize, serial_offset: i64) -> Option<(usize, u32)> {
    let len = data.len();
    let mut zero_pointer = None;
    let last = len.checked_sub(SKIP_PADDING + 4)?;
    for offset in start..=last {
        if data[offset..offset + SKIP_PADDING].iter().any(|&b| b != 0) {
            continue;
        }
        let Some(pointer) = u32_at(data, offset + SKIP_PADDING) else {
            break;
        };
        if pointer == 0 {
            zero_pointer.get_or_insert(offset);
            continue;
        }
        let relative = i64::from(pointer) - serial_offset;
        let after = (offset + SKIP_PADDING + 4) as i64;
        if relative > 0 && relative >= after && relative <= len as i64 {
            return Some((offset, pointer));
        }
    }
    zero_pointer.map(|offset| (offset, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler_with_anchor(len: usize, at: usize, version: i32, sections: i32) -> Vec<u8> {
        let mut data = vec![0xEE; len];
        data[at..at + 4].copy_from_slice(&version.to_le_bytes());
        data[at + 4..at + 8].copy_from_slice(&sections.to_le_bytes());
        data
    }

    #[test]
    fn test_find_core_anchor_is_deterministic() {
        for at in [0, 7, 333, 1500] {
            let data = filler_with_anchor(2100, at, 12, 3);
            assert_eq!(find_core_anchor(&data, 0, 2048), Some(at), "anchor at {at}");
        }
    }

    #[test]
    fn test_find_core_anchor_without_candidates() {
        let data = vec![0xEE; 512];
        assert_eq!(find_core_anchor(&data, 0, 2048), None);
        // Legal version with too many sections
        let data = filler_with_anchor(512, 40, 128, 201);
        assert_eq!(find_core_anchor(&data, 0, 2048), None);
    }

    #[test]
    fn test_window_bounds_search() {
        let data = filler_with_anchor(600, 500, 129, 0);
        assert_eq!(find_core_anchor(&data, 0, 400), None);
        assert_eq!(find_core_anchor(&data, 100, 401), Some(500));
    }

    #[test]
    fn test_higher_score_beats_earlier_offset() {
        let mut data = filler_with_anchor(400, 20, 11, 0);
        // Second candidate followed by empty vertex and color streams
        data[200..204].copy_from_slice(&60485i32.to_le_bytes());
        data[204..208].copy_from_slice(&0i32.to_le_bytes());
        data[208..220].fill(0);
        assert_eq!(score_core_anchor(&data, 20), 1);
        assert_eq!(score_core_anchor(&data, 200), 3);
        assert_eq!(find_core_anchor(&data, 0, 400), Some(200));
    }

    fn bounds_bytes(validity: Option<u8>) -> Vec<u8> {
        let mut data = vec![0xEE; 4];
        for value in [-1.0f32, -1.0, -1.0, 1.0, 1.0, 1.0] {
            data.extend(value.to_le_bytes());
        }
        data.extend(validity);
        for value in [0.0f32, 0.0, 0.0, 1.75] {
            data.extend(value.to_le_bytes());
        }
        data.extend(12i32.to_le_bytes());
        data
    }

    #[test]
    fn test_bounds_layout_before_version() {
        let plain = bounds_bytes(None);
        assert_eq!(bounds_layout_before(&plain, 44), Some(BoundsLayout::Vanguard));
        assert!(!plausible_bounds(&plain, 44, BoundsLayout::WithValidity));

        let flagged = bounds_bytes(Some(1));
        assert_eq!(bounds_layout_before(&flagged, 45), Some(BoundsLayout::WithValidity));
        assert!(!plausible_bounds(&flagged, 45, BoundsLayout::Vanguard));

        // Validity byte outside 0..=1
        let bad_flag = bounds_bytes(Some(7));
        assert_eq!(bounds_layout_before(&bad_flag, 45), None);
        assert_eq!(bounds_layout_before(&plain, 10), None);
    }

    #[test]
    fn test_post_skip_plausibility() {
        let mut data = Vec::new();
        for value in [0i32, 99, 1, 2] {
            data.extend(value.to_le_bytes());
        }
        assert!(is_plausible_post_skip(&data, 0, 5));
        assert!(!is_plausible_post_skip(&data, 0, 1));
        assert!(!is_plausible_post_skip(&data, 4, 5));
    }

    #[test]
    fn test_lod_header_layout_choice() {
        assert!(!prefers_long_header(Some(4), Some(0)));
        assert!(prefers_long_header(Some(0), Some(4)));
        assert!(prefers_long_header(Some(200_000), Some(12)));
        assert!(!prefers_long_header(Some(0), Some(200_000)));
    }

    #[test]
    fn test_index_candidate_quality() {
        assert_eq!(index_candidate_quality(&[0, 1, 2, 0, 2, 3], 4), Some(0));
        assert_eq!(index_candidate_quality(&[0, 1], 4), None);
        assert_eq!(index_candidate_quality(&[0, 1, 9], 4), None);
        // 40 entries allow one stray value
        let mut values = vec![1u16; 40];
        values[5] = 500;
        assert_eq!(index_candidate_quality(&values, 4), Some(1));
        values[6] = 500;
        assert_eq!(index_candidate_quality(&values, 4), None);
    }

    #[test]
    fn test_find_skip_padding() {
        let mut data = vec![0x11; 64];
        data[20..26].fill(0);
        data[26..30].copy_from_slice(&(1000u32 + 40).to_le_bytes());
        assert_eq!(find_skip_padding(&data, 0, 1000), Some((20, 1040)));
        // Pointer outside the export
        assert_eq!(find_skip_padding(&data, 0, 0), None);
        // Zero pointer as a fallback
        data[26..30].fill(0);
        assert_eq!(find_skip_padding(&data, 0, 1000), Some((20, 0)));
    }
}
