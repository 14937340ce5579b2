//! Synthetic packages and payloads for the unit and integration tests
//!
//! Not part of the stable API.

use crate::formats::ue2::{encode_compact_index, encode_fstring};
use crate::package::{HEADER_SIZE, NameTable, PACKAGE_SIGNATURE};
use crate::property::PropertyType;

struct BuiltImport {
    class_package: i64,
    class_name: i64,
    object_name: i64,
}

struct BuiltExport {
    class_ref: i64,
    object_name: i64,
    data: Vec<u8>,
}

/// Writes a package: header, export payloads, names, imports, exports.
pub struct PackageBuilder {
    names: Vec<String>,
    imports: Vec<BuiltImport>,
    exports: Vec<BuiltExport>,
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self {
            names: vec!["None".to_string()],
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Start from a fixed name table so payload name indices line up.
    pub fn with_names(names: &NameTable) -> Self {
        Self {
            names: names.iter().map(|entry| entry.name.clone()).collect(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn name(&mut self, name: &str) -> i64 {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            return index as i64;
        }
        self.names.push(name.to_string());
        self.names.len() as i64 - 1
    }

    /// Add an import and return its (negative) reference.
    pub fn import(&mut self, class_package: &str, class_name: &str, object_name: &str) -> i64 {
        let import = BuiltImport {
            class_package: self.name(class_package),
            class_name: self.name(class_name),
            object_name: self.name(object_name),
        };
        self.imports.push(import);
        -(self.imports.len() as i64)
    }

    /// Add an export and return its (positive) reference.
    pub fn export(&mut self, class_ref: i64, object_name: &str, data: Vec<u8>) -> i64 {
        let export = BuiltExport {
            class_ref,
            object_name: self.name(object_name),
            data,
        };
        self.exports.push(export);
        self.exports.len() as i64
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];

        let mut serials = Vec::with_capacity(self.exports.len());
        for export in &self.exports {
            serials.push(out.len() as i64);
            out.extend_from_slice(&export.data);
        }

        let name_offset = out.len();
        for name in &self.names {
            out.extend(encode_fstring(name));
            out.extend(0u32.to_le_bytes());
        }

        let import_offset = out.len();
        for import in &self.imports {
            out.extend(encode_compact_index(import.class_package));
            out.extend(encode_compact_index(import.class_name));
            out.extend(0i32.to_le_bytes());
            out.extend(encode_compact_index(import.object_name));
        }

        let export_offset = out.len();
        for (export, serial_offset) in self.exports.iter().zip(serials) {
            out.extend(encode_compact_index(export.class_ref));
            out.extend(encode_compact_index(0));
            out.extend(0i32.to_le_bytes());
            out.extend(encode_compact_index(export.object_name));
            out.extend(0x0007_0004u32.to_le_bytes());
            let size = export.data.len() as i64;
            out.extend(encode_compact_index(size));
            if size > 0 {
                out.extend(encode_compact_index(serial_offset));
            }
        }

        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.extend(PACKAGE_SIGNATURE.to_le_bytes());
        header.extend(128u16.to_le_bytes());
        header.extend(34u16.to_le_bytes());
        header.extend(1u32.to_le_bytes());
        for (count, offset) in [
            (self.names.len(), name_offset),
            (self.exports.len(), export_offset),
            (self.imports.len(), import_offset),
        ] {
            header.extend((count as u32).to_le_bytes());
            header.extend((offset as u32).to_le_bytes());
        }
        out[..HEADER_SIZE].copy_from_slice(&header);
        out
    }
}

fn size_class(size: usize, out: &mut Vec<u8>) -> u8 {
    match size {
        1 => 0,
        2 => 1,
        4 => 2,
        12 => 3,
        16 => 4,
        n if n <= 0xFF => {
            out.push(n as u8);
            5
        }
        n if n <= 0xFFFF => {
            out.extend((n as u16).to_le_bytes());
            6
        }
        n => {
            out.extend((n as u32).to_le_bytes());
            7
        }
    }
}

fn array_index_bytes(index: u32) -> Vec<u8> {
    if index < 0x80 {
        vec![index as u8]
    } else if index < 0x4000 {
        vec![0x80 | (index >> 8) as u8, index as u8]
    } else {
        let b = index.to_be_bytes();
        vec![0xC0 | b[0], b[1], b[2], b[3]]
    }
}

fn encode_tag(
    name: i64,
    property_type: PropertyType,
    struct_name: Option<i64>,
    array_index: Option<u32>,
    payload: &[u8],
) -> Vec<u8> {
    let mut out = encode_compact_index(name);
    let info_at = out.len();
    out.push(0);
    if let Some(struct_name) = struct_name {
        out.extend(encode_compact_index(struct_name));
    }
    let class = size_class(payload.len(), &mut out);
    let array_bit = if array_index.is_some() { 0x80 } else { 0 };
    out[info_at] = property_type.tag() | (class << 4) | array_bit;
    if let Some(index) = array_index {
        out.extend(array_index_bytes(index));
    }
    out.extend_from_slice(payload);
    out
}

/// A plain property tag with its payload.
pub fn property_tag(name: i64, property_type: PropertyType, payload: &[u8]) -> Vec<u8> {
    encode_tag(name, property_type, None, None, payload)
}

/// A struct property tag.
pub fn struct_tag(name: i64, struct_name: i64, payload: &[u8]) -> Vec<u8> {
    encode_tag(name, PropertyType::Struct, Some(struct_name), None, payload)
}

/// An array element tag.
pub fn array_tag(name: i64, property_type: PropertyType, index: u32, payload: &[u8]) -> Vec<u8> {
    encode_tag(name, property_type, None, Some(index), payload)
}

/// A Bool tag; the value lives in the array bit.
pub fn bool_tag(name: i64, value: bool) -> Vec<u8> {
    let mut out = encode_compact_index(name);
    out.push(PropertyType::Bool.tag() | if value { 0x80 } else { 0 });
    out
}

/// Builds a StaticMesh payload with one section, empty core streams and
/// four-vertex LODs.
///
/// Byte layout of the default fixture: 3 property bytes, 40 bounds bytes,
/// version 12 and one 14-byte section, 56 bytes of empty streams, the skip
/// padding and pointer over an 8-byte payload, the post-skip header, then
/// per LOD a 12-byte header, 224 vertex bytes, an unselected 2-element
/// array (8 bytes) and a 6-element index buffer. A 5-byte tail follows.
pub struct MeshFixture {
    pub serial_offset: i64,
    pub junk_before_core: usize,
    pub bounds_with_validity: bool,
    pub wide_sections: bool,
    pub long_lod_header: bool,
    pub lod_count: u32,
    pub skip_pointer: Option<u32>,
}

impl Default for MeshFixture {
    fn default() -> Self {
        Self {
            serial_offset: HEADER_SIZE as i64,
            junk_before_core: 0,
            bounds_with_validity: false,
            wide_sections: false,
            long_lod_header: false,
            lod_count: 1,
            skip_pointer: None,
        }
    }
}

pub const FIXTURE_TAIL: [u8; 5] = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
pub const FIXTURE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn zero_stream() -> Vec<u8> {
    [0i32.to_le_bytes(), 1i32.to_le_bytes()].concat()
}

impl MeshFixture {
    pub fn names() -> NameTable {
        NameTable::from_names(["None", "bUseSimpleBoxCollision"])
    }

    /// Offset of the content version within the built payload.
    pub fn version_offset(&self) -> usize {
        3 + self.junk_before_core + if self.bounds_with_validity { 41 } else { 40 }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0x01, 0x83, 0x00];
        out.extend(std::iter::repeat_n(0xEE, self.junk_before_core));

        out.extend(floats(&[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]));
        if self.bounds_with_validity {
            out.push(1);
        }
        out.extend(floats(&[0.0, 0.0, 0.0, 1.75]));

        out.extend(12i32.to_le_bytes());
        out.extend(1i32.to_le_bytes());
        if self.wide_sections {
            for value in [0u32, 0, 0, 3, 2, 2] {
                out.extend(value.to_le_bytes());
            }
        } else {
            out.extend(0u32.to_le_bytes());
            for value in [0u16, 0, 3, 2, 2] {
                out.extend(value.to_le_bytes());
            }
        }

        // vertex, color, alpha
        for _ in 0..3 {
            out.extend(zero_stream());
        }
        // no UV streams
        out.extend(0i32.to_le_bytes());
        // index, wireframe
        for _ in 0..2 {
            out.extend(zero_stream());
        }
        // collision model, triangles, nodes
        out.extend([0u8; 12]);

        out.extend([0u8; 6]);
        let payload_end = out.len() + 4 + 8;
        let pointer = self
            .skip_pointer
            .unwrap_or((self.serial_offset as usize + payload_end) as u32);
        out.extend(pointer.to_le_bytes());
        out.extend([0xAB; 8]);

        for value in [0i32, 0x1234, 1, self.lod_count as i32] {
            out.extend(value.to_le_bytes());
        }

        for _ in 0..self.lod_count {
            let header: &[u32] = if self.long_lod_header {
                &[1, 0, 0, 4]
            } else {
                &[1, 0, 4]
            };
            for value in header {
                out.extend(value.to_le_bytes());
            }
            for i in 0..4 {
                let corner = i as f32;
                out.extend(floats(&[
                    corner, 0.0, 1.0, // position
                    0.0, 0.0, 1.0, // normal
                    1.0, 0.0, 0.0, // tangent x
                    0.0, 1.0, 0.0, // tangent y
                    corner * 0.25, 0.5,
                ]));
            }
            out.extend(2u32.to_le_bytes());
            for value in [0u16, 1] {
                out.extend(value.to_le_bytes());
            }
            out.extend(6u32.to_le_bytes());
            for value in FIXTURE_INDICES {
                out.extend(value.to_le_bytes());
            }
        }

        out.extend(FIXTURE_TAIL);
        out
    }
}
