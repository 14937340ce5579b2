//! Payload decoding for property values
//!
//! Payloads arrive already cut to the size declared by their tag. Shapes
//! that cannot be recognised are returned as [`PropertyValue::Raw`] rather
//! than guessed at.

use super::decoder::PropertyDecoder;
use super::types::{ArrayValue, PropertyType, PropertyValue, Range, Rotator, StructValue};
use crate::formats::ue2::Ue2Reader;
use crate::package::NameTable;

/// Struct nesting depth beyond which payloads stay raw.
pub const MAX_STRUCT_DEPTH: u32 = 3;
/// Properties decoded from one nested struct list.
pub const MAX_NESTED_PROPERTIES: usize = 20;
/// Largest element count accepted for an array payload.
pub const MAX_ARRAY_COUNT: i64 = 1000;

const SCALE_STRUCTS: &[&str] = &["Scale", "MainScale", "PostScale", "DrawScale3D"];
const LOCATION_STRUCTS: &[&str] = &["Location", "ColLocation", "Min", "Max"];
const RANGE_STRUCTS: &[&str] = &[
    "Range",
    "StartSpinRange",
    "SpinsPerSecondRange",
    "StartSizeRange",
    "LifetimeRange",
    "InitialDelayRange",
];
const RANGE_VECTOR_STRUCTS: &[&str] = &[
    "StartLocationRange",
    "StartVelocityRange",
    "ColorMultiplierRange",
    "VelocityLossRange",
];
const REFERENCE_STRUCTS: &[&str] = &[
    "StaticMeshActor",
    "Texture",
    "Material",
    "StaticMesh",
    "Shader",
    "Combiner",
    "AlphaMap",
    "LayerWeightMap",
    "Layers",
    "LODSet",
    "CullDistance",
    "CompoundObject",
];
const FLOAT_PAIR_STRUCTS: &[&str] = &["USize", "VSize", "UClamp", "VClamp"];
const INT_PAIR_STRUCTS: &[&str] = &["UBits", "VBits", "Format"];
const INT_STRUCTS: &[&str] = &[
    "InternalTime",
    "ZoneNumber",
    "Priority",
    "MaxParticles",
    "WaterVolumeType",
];
const FLOAT_STRUCTS: &[&str] = &[
    "DistanceFogStart",
    "DistanceFogEnd",
    "DrawScale",
    "CullDistance",
    "FadeIn",
    "FadeOut",
    "LifetimeRange",
];
const VECTOR_ARRAYS: &[&str] = &["VelocityLocations", "VelocityVectors"];

/// Whether a float is finite and of a magnitude real data uses.
pub(crate) fn plausible_float(value: f32) -> bool {
    value.is_finite() && value.abs() < 1e10 && (value == 0.0 || value.abs() >= 1e-10)
}

fn f32_at(data: &[u8], index: usize) -> f32 {
    let at = index * 4;
    f32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn i32_at(data: &[u8], index: usize) -> i32 {
    let at = index * 4;
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn u32_at(data: &[u8], index: usize) -> u32 {
    let at = index * 4;
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Read `count` floats if they are all plausible.
fn plausible_floats(data: &[u8], count: usize) -> Option<Vec<f32>> {
    if data.len() < count * 4 {
        return None;
    }
    let values: Vec<f32> = (0..count).map(|i| f32_at(data, i)).collect();
    values.iter().all(|&v| plausible_float(v)).then_some(values)
}

fn vec3(values: &[f32]) -> [f32; 3] {
    [values[0], values[1], values[2]]
}

/// Decode a payload according to its tag.
pub(crate) fn decode_value(
    property_type: PropertyType,
    name: &str,
    struct_name: Option<&str>,
    payload: &[u8],
    decoder: &PropertyDecoder<'_>,
) -> PropertyValue {
    use PropertyType as T;

    let raw = || PropertyValue::Raw(payload.to_vec());
    match property_type {
        T::Byte => PropertyValue::Byte(payload[0]),
        T::Int => PropertyValue::Int(i32_at(payload, 0)),
        T::Float => PropertyValue::Float(f32_at(payload, 0)),
        T::Vector => PropertyValue::Vector([f32_at(payload, 0), f32_at(payload, 1), f32_at(payload, 2)]),
        T::Rotator => PropertyValue::Rotator(Rotator {
            pitch: i32_at(payload, 0),
            yaw: i32_at(payload, 1),
            roll: i32_at(payload, 2),
        }),
        T::Object | T::Class => Ue2Reader::new(payload)
            .read_compact_index()
            .map_or_else(|_| raw(), PropertyValue::Object),
        T::Name => match Ue2Reader::new(payload).read_compact_index() {
            Ok(index) => PropertyValue::Name(
                decoder
                    .names()
                    .get(index)
                    .map_or_else(|| format!("#{index}"), str::to_string),
            ),
            Err(_) => raw(),
        },
        T::String | T::Str => decode_string(payload).map_or_else(raw, PropertyValue::String),
        T::Array => decode_array(name, payload).map_or_else(raw, PropertyValue::Array),
        T::Struct => decode_struct(struct_name.unwrap_or_default(), payload, decoder)
            .map_or_else(raw, PropertyValue::Struct),
        T::Bool | T::None | T::Map | T::FixedArray => raw(),
    }
}

/// Decode an FString payload, rejecting text that is mostly unprintable.
fn decode_string(payload: &[u8]) -> Option<String> {
    let text = Ue2Reader::new(payload).read_fstring().ok()?;
    let total = text.chars().count();
    let printable = text.chars().filter(|c| matches!(c, ' '..='~')).count();
    (printable * 2 >= total).then_some(text)
}

/// Decode an array payload: compact element count, then the elements.
///
/// Element types are not recorded in the tag, so the layout is inferred
/// from the bytes available per element.
pub(crate) fn decode_array(name: &str, payload: &[u8]) -> Option<ArrayValue> {
    let mut reader = Ue2Reader::new(payload);
    let count = reader.read_compact_index().ok()?;
    if !(0..=MAX_ARRAY_COUNT).contains(&count) {
        return None;
    }
    let n = count as usize;
    let rest = &payload[reader.tell()..];

    if VECTOR_ARRAYS.contains(&name) && rest.len() >= n * 12 {
        let values = (0..n)
            .map(|i| [f32_at(rest, i * 3), f32_at(rest, i * 3 + 1), f32_at(rest, i * 3 + 2)])
            .collect();
        return Some(ArrayValue::Vectors { values });
    }
    if rest.len() == n || (n > 0 && rest.len() / n == 1) {
        return Some(ArrayValue::Bytes {
            values: rest[..n].to_vec(),
        });
    }
    if n > 0 && rest.len() / n == 4 {
        let values = (0..n).map(|i| i32_at(rest, i)).collect();
        return Some(ArrayValue::Ints { values });
    }
    if n > 0 {
        if let Some(values) = plausible_floats(rest, n) {
            return Some(ArrayValue::Floats { values });
        }
    }
    Some(ArrayValue::Opaque {
        count,
        size: rest.len(),
        raw: rest.to_vec(),
    })
}

/// Decode a struct payload by name and size, then by shape.
pub(crate) fn decode_struct(
    struct_name: &str,
    payload: &[u8],
    decoder: &PropertyDecoder<'_>,
) -> Option<StructValue> {
    if payload.is_empty() || decoder.depth() > MAX_STRUCT_DEPTH {
        return None;
    }
    if let Some(value) = known_struct(struct_name, payload) {
        return Some(value);
    }

    let len = payload.len();
    if (4..=16).contains(&len) && len % 4 == 0 {
        if let Some(values) = plausible_floats(payload, len / 4) {
            return Some(StructValue::Floats(values));
        }
    }

    if len > 4 && decoder.depth() < MAX_STRUCT_DEPTH {
        let nested = decoder.nested().decode(payload, 0);
        if !nested.properties.is_empty() && nested.is_terminated() {
            return Some(StructValue::Properties(nested.properties));
        }
    }
    None
}

/// Fixed layouts keyed by struct name and exact size.
fn known_struct(name: &str, data: &[u8]) -> Option<StructValue> {
    let len = data.len();
    let named = |list: &[&str]| list.contains(&name);

    if name == "Color" && len == 4 {
        return Some(StructValue::Color {
            r: data[0],
            g: data[1],
            b: data[2],
            a: data[3],
        });
    }
    if name == "Rotator" && len == 12 {
        return Some(StructValue::Rotator(Rotator {
            pitch: i32_at(data, 0),
            yaw: i32_at(data, 1),
            roll: i32_at(data, 2),
        }));
    }
    if (name == "Vector" || named(SCALE_STRUCTS) || named(LOCATION_STRUCTS)) && len == 12 {
        return plausible_floats(data, 3).map(|v| StructValue::Vector(vec3(&v)));
    }
    if named(RANGE_STRUCTS) && len == 8 {
        if let Some(v) = plausible_floats(data, 2) {
            return Some(StructValue::Range(Range { min: v[0], max: v[1] }));
        }
    }
    if named(RANGE_VECTOR_STRUCTS) && len == 24 {
        return plausible_floats(data, 6).map(|v| StructValue::RangeVector {
            min: vec3(&v[0..3]),
            max: vec3(&v[3..6]),
        });
    }
    if name == "Plane" && len == 16 {
        return plausible_floats(data, 4).map(|v| StructValue::Plane([v[0], v[1], v[2], v[3]]));
    }
    if name == "Box" && len >= 24 {
        return plausible_floats(data, 6).map(|v| StructValue::Box {
            min: vec3(&v[0..3]),
            max: vec3(&v[3..6]),
        });
    }
    if name == "Guid" && len == 16 {
        return Some(StructValue::Guid(format!(
            "{:08X}-{:08X}-{:08X}-{:08X}",
            u32_at(data, 0),
            u32_at(data, 1),
            u32_at(data, 2),
            u32_at(data, 3)
        )));
    }
    if named(REFERENCE_STRUCTS) && len == 4 {
        return Some(StructValue::Reference(i32_at(data, 0)));
    }
    if named(FLOAT_PAIR_STRUCTS) && len == 8 {
        if let Some(v) = plausible_floats(data, 2) {
            return Some(StructValue::FloatPair { u: v[0], v: v[1] });
        }
    }
    if named(INT_PAIR_STRUCTS) && len == 8 {
        return Some(StructValue::IntPair {
            a: i32_at(data, 0),
            b: i32_at(data, 1),
        });
    }
    if named(INT_STRUCTS) && len == 4 {
        return Some(StructValue::Int(i32_at(data, 0)));
    }
    if named(FLOAT_STRUCTS) && len == 4 && plausible_float(f32_at(data, 0)) {
        return Some(StructValue::Float(f32_at(data, 0)));
    }
    if name == "NonUniformRelativeSize" && len == 16 {
        return plausible_floats(data, 4).map(StructValue::Floats);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ue2::encode_fstring;

    fn floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_known_struct_layouts() {
        assert_eq!(
            known_struct("Color", &[10, 20, 30, 255]),
            Some(StructValue::Color { r: 10, g: 20, b: 30, a: 255 })
        );
        assert_eq!(
            known_struct("DrawScale3D", &floats(&[1.0, 2.0, 0.5])),
            Some(StructValue::Vector([1.0, 2.0, 0.5]))
        );
        assert_eq!(
            known_struct("LifetimeRange", &floats(&[1.5, 3.0])),
            Some(StructValue::Range(Range { min: 1.5, max: 3.0 }))
        );
        // LifetimeRange as a single float
        assert_eq!(
            known_struct("LifetimeRange", &floats(&[2.0])),
            Some(StructValue::Float(2.0))
        );
        assert_eq!(
            known_struct("Guid", &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0xFF, 0, 0, 0]),
            Some(StructValue::Guid("00000001-00000002-00000003-000000FF".to_string()))
        );
        // Wrong size for the name falls through
        assert_eq!(known_struct("Color", &[1, 2, 3]), None);
    }

    #[test]
    fn test_box_ignores_validity_byte() {
        let mut data = floats(&[-1.0, -2.0, -3.0, 1.0, 2.0, 3.0]);
        data.push(1);
        assert_eq!(
            known_struct("Box", &data),
            Some(StructValue::Box {
                min: [-1.0, -2.0, -3.0],
                max: [1.0, 2.0, 3.0]
            })
        );
    }

    #[test]
    fn test_array_element_inference() {
        // 3 bytes for 3 elements
        assert_eq!(
            decode_array("Flags", &[0x03, 7, 8, 9]),
            Some(ArrayValue::Bytes { values: vec![7, 8, 9] })
        );
        // 8 bytes for 2 elements
        let mut ints = vec![0x02];
        ints.extend_from_slice(&5i32.to_le_bytes());
        ints.extend_from_slice(&(-6i32).to_le_bytes());
        assert_eq!(
            decode_array("Counts", &ints),
            Some(ArrayValue::Ints { values: vec![5, -6] })
        );
        // Vectors by property name
        let mut vectors = vec![0x01];
        vectors.extend(floats(&[1.0, 2.0, 3.0]));
        assert_eq!(
            decode_array("VelocityVectors", &vectors),
            Some(ArrayValue::Vectors { values: vec![[1.0, 2.0, 3.0]] })
        );
    }

    #[test]
    fn test_array_wide_elements_read_as_floats_or_opaque() {
        let mut wide = vec![0x02];
        wide.extend(floats(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(
            decode_array("Points", &wide),
            Some(ArrayValue::Floats { values: vec![1.0, 2.0] })
        );

        let mut garbage = vec![0x02];
        garbage.extend_from_slice(&[0xFF; 16]);
        match decode_array("Points", &garbage) {
            Some(ArrayValue::Opaque { count, size, .. }) => assert_eq!((count, size), (2, 16)),
            other => panic!("expected opaque array, got {other:?}"),
        }
    }

    #[test]
    fn test_array_count_ceiling() {
        let mut payload = crate::formats::ue2::encode_compact_index(5000);
        payload.extend_from_slice(&[0; 8]);
        assert_eq!(decode_array("Big", &payload), None);
    }

    #[test]
    fn test_string_printable_check() {
        assert_eq!(decode_string(&encode_fstring("Hello")), Some("Hello".to_string()));
        let junk = [0x05, 0x01, 0x02, 0x03, b'a', 0x00];
        assert_eq!(decode_string(&junk), None);
    }
}
