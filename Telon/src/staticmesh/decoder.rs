//! StaticMesh export decoding
//!
//! The payload is a property list, bounds, the legacy core streams, a
//! lazy-array skip over raw triangles, a short post-skip header and the LOD
//! models. Every byte is claimed in a [`ParseResult`] as the walk proceeds;
//! when a fixed layout does not fit, a scored search takes over and the
//! bytes it skipped are recorded as unknown.

use super::anchor::{
    SKIP_PADDING, bounds_layout_before, find_core_anchor, find_skip_padding, is_core_anchor,
    is_plausible_post_skip,
};
use super::lod::read_lod;
use super::streams::{
    detect_section_layout, read_bounds, read_count, read_section, read_streams,
};
use super::types::{
    BoundsLayout, DecodedStaticMesh, LazySkip, LodModel, PostSkipHeader, StaticMeshCore,
};
use crate::config::DecoderOptions;
use crate::coverage::ParseResult;
use crate::error::{Error, Result};
use crate::formats::ue2::Ue2Reader;
use crate::package::NameTable;
use crate::property::{ListMode, PropertyDecoder};

/// Decode a StaticMesh export.
///
/// `serial_offset` is the export's absolute file offset, needed to resolve
/// the skip pointer. Mesh-level failures never return `Err`: they are
/// recorded in the result's status and whatever was decoded before them is
/// kept.
#[must_use]
pub fn decode_static_mesh(
    data: &[u8],
    names: &NameTable,
    serial_offset: i64,
    options: &DecoderOptions,
) -> DecodedStaticMesh {
    let properties = PropertyDecoder::new(names)
        .with_mode(ListMode::Single)
        .with_max_properties(options.max_properties)
        .decode(data, 0);

    if data.is_empty() {
        return DecodedStaticMesh {
            properties,
            core: None,
            post_skip: None,
            lods: Vec::new(),
            result: ParseResult::new(0, options.hex_preview_limit).finish(data),
        };
    }

    let mut walk = MeshWalk {
        data,
        serial_offset,
        options,
        result: ParseResult::new(data.len(), options.hex_preview_limit),
        core: None,
        post_skip: None,
        lods: Vec::new(),
    };
    walk.result.parsed_through(properties.end_offset);

    if let Err(err) = walk.run(properties.end_offset) {
        tracing::warn!("StaticMesh decode stopped: {}", err);
        walk.result.fail(&err);
    }

    DecodedStaticMesh {
        properties,
        core: walk.core,
        post_skip: walk.post_skip,
        lods: walk.lods,
        result: walk.result.finish(data),
    }
}

struct MeshWalk<'a> {
    data: &'a [u8],
    serial_offset: i64,
    options: &'a DecoderOptions,
    result: ParseResult,
    core: Option<StaticMeshCore>,
    post_skip: Option<PostSkipHeader>,
    lods: Vec<LodModel>,
}

impl MeshWalk<'_> {
    fn run(&mut self, prop_end: usize) -> Result<()> {
        let (bounds_offset, bounds_layout) = self.locate_core(prop_end)?;
        let cursor = self.read_core(bounds_offset, bounds_layout)?;
        let cursor = self.apply_skip(cursor)?;
        let cursor = self.read_post_skip(cursor)?;

        let mut reader = Ue2Reader::at(self.data, cursor);
        let lod_count = self.post_skip.map_or(0, |header| header.lod_count) as usize;
        for lod_index in 0..lod_count {
            let is_last = lod_index + 1 == lod_count;
            let lod = read_lod(&mut reader, lod_index, is_last, self.options, &mut self.result)?;
            self.lods.push(lod);
        }

        self.result
            .unknown_through(self.data.len(), self.data, "post_lod_data");
        Ok(())
    }

    /// Find the bounding box: directly after the properties in either
    /// layout, else by scored search.
    fn locate_core(&mut self, prop_end: usize) -> Result<(usize, BoundsLayout)> {
        for layout in [BoundsLayout::Vanguard, BoundsLayout::WithValidity] {
            if is_core_anchor(self.data, prop_end + layout.size()) {
                tracing::debug!("Core at {} with {:?} bounds", prop_end, layout);
                return Ok((prop_end, layout));
            }
        }

        let start = prop_end + BoundsLayout::Vanguard.size();
        let window = self.options.anchor_window;
        let version_offset = find_core_anchor(self.data, start, window).ok_or(Error::AnchorNotFound {
            what: "core",
            start,
            window,
        })?;

        // Hits lie past prop_end + 40, so either layout starts at or after the properties
        let layout =
            bounds_layout_before(self.data, version_offset).unwrap_or(BoundsLayout::Vanguard);
        let bounds_offset = version_offset - layout.size();
        tracing::warn!(
            "Core found by search at {} with {:?} bounds ({} bytes after properties)",
            version_offset,
            layout,
            bounds_offset - prop_end
        );
        self.result.uses_heuristics = true;
        self.result
            .unknown_through(bounds_offset, self.data, "pre_core_gap");
        Ok((bounds_offset, layout))
    }

    /// Read bounds, sections and streams up to the skip pointer. Returns the
    /// offset just past the pointer.
    fn read_core(&mut self, bounds_offset: usize, bounds_layout: BoundsLayout) -> Result<usize> {
        let max_count = self.options.max_count;
        let mut reader = Ue2Reader::at(self.data, bounds_offset);
        let (bounding_box, bounding_sphere) = read_bounds(&mut reader, bounds_layout)?;
        let version = reader.read_i32()?;
        let section_count = read_count(&mut reader, "section", max_count)? as usize;

        let sections_start = reader.tell();
        let (section_layout, guessed) =
            detect_section_layout(self.data, sections_start, section_count, max_count)?;
        if guessed {
            self.result.uses_heuristics = true;
        }
        let sections = (0..section_count)
            .map(|_| read_section(&mut reader, section_layout))
            .collect::<Result<Vec<_>>>()?;
        let sections_end = reader.tell();
        self.result.parsed_through(sections_end);

        self.core = Some(StaticMeshCore {
            offset: bounds_offset,
            bounds_layout,
            bounding_box,
            bounding_sphere,
            version,
            section_layout,
            sections,
            streams: None,
            skip: None,
        });

        let walked = read_streams(&mut reader, max_count);
        let expected = reader.tell();
        let strict = match &walked {
            Ok(_) => self
                .data
                .get(expected..expected + SKIP_PADDING)
                .is_some_and(|padding| padding.iter().all(|&b| b == 0)),
            Err(_) => false,
        };

        let (padding_offset, searched) = if strict {
            self.result.parsed_through(expected + SKIP_PADDING);
            (expected, false)
        } else {
            let Some((found, _)) = find_skip_padding(self.data, sections_end, self.serial_offset)
            else {
                return Err(walked.err().unwrap_or(Error::AnchorNotFound {
                    what: "skip padding",
                    start: sections_end,
                    window: self.data.len().saturating_sub(sections_end),
                }));
            };
            tracing::warn!(
                "Skip padding found by search at {} (stream walk ended at {})",
                found,
                expected
            );
            self.result.uses_heuristics = true;
            self.result.unknown_through(found, self.data, "core_streams");
            self.result.parsed_through(found + SKIP_PADDING);
            (found, true)
        };

        reader.seek(padding_offset + SKIP_PADDING)?;
        let pointer = reader.read_u32()?;
        self.result.parsed_through(reader.tell());

        if let Some(core) = self.core.as_mut() {
            core.streams = walked.ok();
            core.skip = Some(LazySkip {
                padding_offset,
                pointer,
                target: None,
                payload_size: 0,
                searched,
            });
        }
        Ok(reader.tell())
    }

    /// Jump over the raw triangle payload. Returns the post-skip offset.
    fn apply_skip(&mut self, cursor: usize) -> Result<usize> {
        let Some(skip) = self.core.as_mut().and_then(|core| core.skip.as_mut()) else {
            return Ok(cursor);
        };
        if skip.pointer == 0 {
            return Ok(cursor);
        }

        let len = self.data.len();
        let relative = i64::from(skip.pointer) - self.serial_offset;
        let target = usize::try_from(relative)
            .ok()
            .filter(|&target| target >= cursor && target <= len)
            .ok_or(Error::SkipPointerOutOfBounds {
                pointer: skip.pointer,
                relative,
                cursor,
                len,
            })?;

        skip.target = Some(target);
        skip.payload_size = target - cursor;
        self.result.uses_skips = true;
        self.result.parsed_through(target);
        Ok(target)
    }

    /// Read the post-skip header, searching forward if it is not where the
    /// skip left off. Returns the offset of the first LOD.
    fn read_post_skip(&mut self, cursor: usize) -> Result<usize> {
        let max_lods = self.options.max_lods;
        let window = self.options.post_skip_search;

        let offset = (cursor..=cursor.saturating_add(window))
            .find(|&offset| is_plausible_post_skip(self.data, offset, max_lods))
            .ok_or(Error::AnchorNotFound {
                what: "post-skip header",
                start: cursor,
                window,
            })?;
        if offset != cursor {
            tracing::warn!("Post-skip header found {} bytes past the skip", offset - cursor);
            self.result.uses_heuristics = true;
            self.result.unknown_through(offset, self.data, "post_skip_gap");
        }

        let mut reader = Ue2Reader::at(self.data, offset);
        let header = PostSkipHeader {
            offset,
            physics_ref: reader.read_i32()?,
            auth_key: reader.read_i32()?,
            lod_version: reader.read_i32()?,
            lod_count: reader.read_u32()?,
        };
        self.result.parsed_through(reader.tell());
        self.post_skip = Some(header);
        Ok(reader.tell())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::ParseStatus;
    use crate::error::FailureKind;
    use crate::staticmesh::{LodHeaderLayout, SectionLayout};
    use crate::test_support::{FIXTURE_INDICES, MeshFixture};
    use pretty_assertions::assert_eq;

    fn decode(fixture: &MeshFixture) -> (Vec<u8>, DecodedStaticMesh) {
        let data = fixture.build();
        let mesh = decode_static_mesh(
            &data,
            &MeshFixture::names(),
            fixture.serial_offset,
            &DecoderOptions::default(),
        );
        (data, mesh)
    }

    fn assert_coverage_invariant(mesh: &DecodedStaticMesh) {
        let result = &mesh.result;
        assert_eq!(result.bytes_parsed + result.bytes_unknown, result.bytes_total);
        let expected = 100.0 * result.bytes_parsed as f64 / result.bytes_total as f64;
        assert!((result.coverage_pct - expected).abs() < 1e-9);
    }

    #[test]
    fn test_decodes_fixture() {
        let (data, mesh) = decode(&MeshFixture::default());
        assert_coverage_invariant(&mesh);

        assert_eq!(mesh.properties.properties.len(), 1);
        assert_eq!(mesh.properties.end_offset, 3);

        let core = mesh.core.as_ref().unwrap();
        assert_eq!(core.offset, 3);
        assert_eq!(core.bounds_layout, BoundsLayout::Vanguard);
        assert_eq!(core.version, 12);
        assert_eq!(core.section_layout, SectionLayout::Compact);
        assert_eq!(core.sections[0].num_triangles, 2);
        assert_eq!(core.bounding_sphere.radius, 1.75);
        let streams = core.streams.as_ref().unwrap();
        assert_eq!(streams.vertices.revision, 1);
        let skip = core.skip.unwrap();
        assert_eq!(skip.payload_size, 8);
        assert!(!skip.searched);

        let post_skip = mesh.post_skip.unwrap();
        assert_eq!(post_skip.auth_key, 0x1234);
        assert_eq!(post_skip.lod_count, 1);

        assert_eq!(mesh.lods.len(), 1);
        let lod = &mesh.lods[0];
        assert_eq!(lod.vertex_count, 4);
        assert_eq!(lod.vertices[3].position, [3.0, 0.0, 1.0]);
        assert_eq!(lod.index_buffer.as_ref().unwrap().indices, FIXTURE_INDICES.to_vec());
        assert_eq!(mesh.total_triangles(), 2);

        let result = &mesh.result;
        assert_eq!(result.bytes_total, data.len());
        assert_eq!(result.bytes_unknown, 13);
        assert!(result.uses_skips);
        assert!(!result.uses_heuristics);
        assert_eq!(result.status, ParseStatus::Partial);
        let contexts: Vec<&str> = result.unknown_regions.iter().map(|r| r.context.as_str()).collect();
        assert_eq!(contexts, vec!["lod0_array0", "post_lod_data"]);
        assert_eq!(result.unknown_regions[1].hex, "deadbeef01");
    }

    #[test]
    fn test_junk_before_core_uses_search() {
        let fixture = MeshFixture {
            junk_before_core: 7,
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        assert_coverage_invariant(&mesh);

        let result = &mesh.result;
        assert!(result.uses_heuristics);
        assert_eq!(result.unknown_regions[0].context, "pre_core_gap");
        assert_eq!((result.unknown_regions[0].start, result.unknown_regions[0].size), (3, 7));
        assert_eq!(mesh.core.as_ref().unwrap().offset, 10);
        assert_eq!(result.bytes_unknown, 20);
        assert_eq!(mesh.lods.len(), 1);
    }

    #[test]
    fn test_bounds_with_validity_byte() {
        let fixture = MeshFixture {
            bounds_with_validity: true,
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        let core = mesh.core.as_ref().unwrap();
        assert_eq!(core.bounds_layout, BoundsLayout::WithValidity);
        assert_eq!(core.bounding_box.is_valid, Some(1));
        assert!(!mesh.result.uses_heuristics);
        assert_eq!(mesh.result.bytes_unknown, 13);
    }

    #[test]
    fn test_searched_core_keeps_validity_byte_layout() {
        let fixture = MeshFixture {
            junk_before_core: 7,
            bounds_with_validity: true,
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        assert_coverage_invariant(&mesh);

        let core = mesh.core.as_ref().unwrap();
        assert_eq!(core.bounds_layout, BoundsLayout::WithValidity);
        assert_eq!(core.offset, 10);
        assert_eq!(core.bounding_box.min, [-1.0, -1.0, -1.0]);
        assert_eq!(core.bounding_box.max, [1.0, 1.0, 1.0]);
        assert_eq!(core.bounding_box.is_valid, Some(1));
        assert_eq!(core.bounding_sphere.radius, 1.75);

        let result = &mesh.result;
        assert!(result.uses_heuristics);
        assert_eq!(result.unknown_regions[0].context, "pre_core_gap");
        assert_eq!((result.unknown_regions[0].start, result.unknown_regions[0].size), (3, 7));
        assert_eq!(result.bytes_unknown, 20);
        assert_eq!(mesh.lods.len(), 1);
    }

    #[test]
    fn test_wide_sections() {
        let fixture = MeshFixture {
            wide_sections: true,
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        let core = mesh.core.as_ref().unwrap();
        assert_eq!(core.section_layout, SectionLayout::Wide);
        assert_eq!(core.sections[0].max_vertex_index, 3);
        assert_eq!(mesh.result.status, ParseStatus::Partial);
        assert_eq!(mesh.result.bytes_unknown, 13);
    }

    #[test]
    fn test_long_lod_header() {
        let fixture = MeshFixture {
            long_lod_header: true,
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        assert_eq!(mesh.lods[0].header_layout, LodHeaderLayout::Long);
        assert_eq!(mesh.lods[0].vertex_count, 4);
        assert!(mesh.lods[0].index_buffer.is_some());
    }

    #[test]
    fn test_two_lods() {
        let fixture = MeshFixture {
            lod_count: 2,
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        assert_coverage_invariant(&mesh);
        assert_eq!(mesh.lods.len(), 2);
        assert!(mesh.lods.iter().all(|lod| lod.index_buffer.is_some()));
        assert_eq!(mesh.result.bytes_unknown, 8 + 8 + 5);
    }

    #[test]
    fn test_skip_pointer_outside_export() {
        let fixture = MeshFixture {
            skip_pointer: Some(1_000_000),
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        assert_coverage_invariant(&mesh);
        assert_eq!(mesh.result.status, ParseStatus::Error);
        assert_eq!(mesh.result.failure, Some(FailureKind::SkipPointerOutOfBounds));
        // The core survives the failure
        assert!(mesh.core.is_some());
        assert!(mesh.lods.is_empty());
        assert_eq!(
            mesh.result.unknown_regions.last().unwrap().context,
            "unparsed_after_error"
        );
    }

    #[test]
    fn test_zero_skip_pointer_means_no_payload() {
        let fixture = MeshFixture {
            skip_pointer: Some(0),
            ..MeshFixture::default()
        };
        let (_, mesh) = decode(&fixture);
        assert_coverage_invariant(&mesh);
        // The 8 payload bytes now sit where the post-skip header should be
        let result = &mesh.result;
        assert!(!result.uses_skips);
        assert!(result.uses_heuristics);
        assert_eq!(result.unknown_regions[0].context, "post_skip_gap");
        assert_eq!(result.unknown_regions[0].size, 8);
        assert_eq!(mesh.lods.len(), 1);
    }

    #[test]
    fn test_garbage_reports_anchor_not_found() {
        let data = vec![0xFF; 300];
        let mesh = decode_static_mesh(&data, &MeshFixture::names(), 0, &DecoderOptions::default());
        assert_coverage_invariant(&mesh);
        assert_eq!(mesh.result.status, ParseStatus::Error);
        assert_eq!(mesh.result.failure, Some(FailureKind::AnchorNotFound));
        assert_eq!(mesh.result.bytes_unknown, 300);
        assert!(mesh.core.is_none());
    }

    #[test]
    fn test_empty_export() {
        let mesh = decode_static_mesh(&[], &MeshFixture::names(), 0, &DecoderOptions::default());
        assert_eq!(mesh.result.bytes_total, 0);
        assert_eq!(mesh.result.coverage_pct, 0.0);
        assert_eq!(mesh.result.status, ParseStatus::Complete);
        assert_eq!(mesh.result.failure, None);
        assert!(mesh.core.is_none());
        assert!(mesh.result.unknown_regions.is_empty());
    }
}
