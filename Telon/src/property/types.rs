//! Property tag and value types

use serde::{Serialize, Serializer};

use crate::error::FailureKind;

/// Type code stored in the low nibble of a tag's info byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropertyType {
    None,
    Byte,
    Int,
    Bool,
    Float,
    Object,
    Name,
    String,
    Class,
    Array,
    Struct,
    Vector,
    Rotator,
    Str,
    Map,
    FixedArray,
}

impl PropertyType {
    /// Map a 4-bit type code. Every code has a meaning, so this is total.
    #[must_use]
    pub fn from_tag(tag: u8) -> Self {
        match tag & 0x0F {
            0 => Self::None,
            1 => Self::Byte,
            2 => Self::Int,
            3 => Self::Bool,
            4 => Self::Float,
            5 => Self::Object,
            6 => Self::Name,
            7 => Self::String,
            8 => Self::Class,
            9 => Self::Array,
            10 => Self::Struct,
            11 => Self::Vector,
            12 => Self::Rotator,
            13 => Self::Str,
            14 => Self::Map,
            _ => Self::FixedArray,
        }
    }

    /// The 4-bit type code.
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Pitch/yaw/roll in engine units, 65536 per full turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rotator {
    pub pitch: i32,
    pub yaw: i32,
    pub roll: i32,
}

impl Rotator {
    pub const UNITS_PER_TURN: f32 = 65536.0;

    /// Angles in degrees, in pitch/yaw/roll order.
    #[must_use]
    pub fn to_degrees(self) -> [f32; 3] {
        let scale = 360.0 / Self::UNITS_PER_TURN;
        [
            self.pitch as f32 * scale,
            self.yaw as f32 * scale,
            self.roll as f32 * scale,
        ]
    }
}

/// Min/max pair of a range struct.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

/// A decoded struct payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", content = "value", rename_all = "snake_case")]
pub enum StructValue {
    Color { r: u8, g: u8, b: u8, a: u8 },
    Vector([f32; 3]),
    Rotator(Rotator),
    Range(Range),
    RangeVector { min: [f32; 3], max: [f32; 3] },
    Plane([f32; 4]),
    Box { min: [f32; 3], max: [f32; 3] },
    Guid(String),
    Reference(i32),
    FloatPair { u: f32, v: f32 },
    IntPair { a: i32, b: i32 },
    Int(i32),
    Float(f32),
    /// Unrecognised small struct that reads as plausible floats.
    Floats(Vec<f32>),
    /// Struct serialized as its own tagged property list.
    Properties(Vec<Property>),
}

/// A decoded array payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "elements", rename_all = "snake_case")]
pub enum ArrayValue {
    Bytes { values: Vec<u8> },
    Ints { values: Vec<i32> },
    Floats { values: Vec<f32> },
    Vectors { values: Vec<[f32; 3]> },
    /// Element layout could not be inferred.
    Opaque {
        count: i64,
        size: usize,
        #[serde(serialize_with = "serialize_hex")]
        raw: Vec<u8>,
    },
}

impl ArrayValue {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes { values } => values.len(),
            Self::Ints { values } => values.len(),
            Self::Floats { values } => values.len(),
            Self::Vectors { values } => values.len(),
            Self::Opaque { count, .. } => usize::try_from(*count).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded property value, one variant per payload shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Byte(u8),
    Int(i32),
    Bool(bool),
    Float(f32),
    /// Signed object reference: negative imports, positive exports, zero null.
    Object(i64),
    Name(String),
    String(String),
    Array(ArrayValue),
    Struct(StructValue),
    Vector([f32; 3]),
    Rotator(Rotator),
    /// Payload kept verbatim.
    #[serde(serialize_with = "serialize_hex")]
    Raw(Vec<u8>),
}

/// One decoded property tag and its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub property_type: PropertyType,
    /// Payload size declared by the tag.
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub struct_name: Option<String>,
    pub value: PropertyValue,
    /// Which chained list the property was read from, starting at 0.
    pub list_index: u32,
    /// Offset of the tag within the decoded buffer.
    pub offset: usize,
}

/// How far a property list walk continues past a terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    /// Continue into following lists until two terminators in a row.
    #[default]
    Chained,
    /// Stop at the first terminator.
    Single,
}

/// Why a property list walk stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// Two terminators in a row.
    DoubleNone,
    /// A terminator in single-list mode.
    SingleNone,
    /// Ran out of bytes.
    EndOfData,
    /// Hit the property count ceiling.
    Limit,
    /// A tag failed validation; the list ends at the last good boundary.
    Desync {
        offset: usize,
        kind: FailureKind,
        message: String,
    },
}

/// Result of walking property lists from a start offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyList {
    pub start_offset: usize,
    pub properties: Vec<Property>,
    /// First byte after the last cleanly decoded tag or terminator.
    pub end_offset: usize,
    pub termination: Termination,
    /// Number of terminators consumed.
    pub lists: u32,
}

impl PropertyList {
    /// Whether at least one list ended on its terminator.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.lists > 0
    }

    /// First property with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
