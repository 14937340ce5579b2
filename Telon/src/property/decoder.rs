//! Tagged property list decoding
//!
//! A list is a run of tags, each naming a property and describing its
//! payload, closed by a tag whose name is "None". Vanguard objects often
//! carry a second list directly after the first, so the default mode keeps
//! going until two terminators appear back to back.

use super::types::{ListMode, Property, PropertyList, PropertyType, PropertyValue, Termination};
use super::validate::{check_name_type, check_struct_name, check_type_size};
use super::values::{MAX_NESTED_PROPERTIES, decode_value};
use crate::error::{Error, Result};
use crate::formats::ue2::Ue2Reader;
use crate::package::NameTable;

/// Properties decoded per call before stopping.
pub const MAX_PROPERTIES: usize = 200;

/// Name of the list terminator.
pub const TERMINATOR: &str = "None";

/// Decoded tag header, before the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagHeader<'n> {
    pub name: &'n str,
    pub property_type: PropertyType,
    pub size: usize,
    pub is_array: bool,
    pub array_index: Option<u32>,
    pub struct_name: Option<&'n str>,
}

/// One step of a list walk.
pub(crate) enum Tag<'n> {
    Terminator,
    Property(TagHeader<'n>),
}

/// Read a tag header and validate it.
///
/// On success the reader sits at the start of the payload, which is known
/// to fit in the remaining bytes.
pub(crate) fn read_tag<'n>(reader: &mut Ue2Reader<'_>, names: &'n NameTable) -> Result<Tag<'n>> {
    let offset = reader.tell();
    let desync = |reason: String| Error::desync(offset, reason);

    let name = names.resolve(reader.read_compact_index()?)?;
    if name.eq_ignore_ascii_case(TERMINATOR) {
        return Ok(Tag::Terminator);
    }

    let info = reader.read_u8()?;
    let property_type = PropertyType::from_tag(info);
    let is_array = info & 0x80 != 0;
    check_name_type(name, property_type).map_err(desync)?;

    // The struct type name precedes any explicit size bytes
    let struct_name = if property_type == PropertyType::Struct {
        let struct_name = names.resolve(reader.read_compact_index()?)?;
        check_struct_name(struct_name).map_err(desync)?;
        Some(struct_name)
    } else {
        None
    };

    let declared = match (info >> 4) & 0x07 {
        0 => 1,
        1 => 2,
        2 => 4,
        3 => 12,
        4 => 16,
        5 => usize::from(reader.read_u8()?),
        6 => usize::from(reader.read_u16()?),
        _ => reader.read_u32()? as usize,
    };
    let size = if property_type == PropertyType::Bool {
        0
    } else {
        declared
    };
    check_type_size(property_type, size).map_err(desync)?;

    let array_index = if is_array && property_type != PropertyType::Bool {
        Some(read_array_index(reader)?)
    } else {
        None
    };

    if size > reader.remaining() {
        return Err(desync(format!(
            "payload of {size} bytes overruns buffer ({} left)",
            reader.remaining()
        )));
    }

    Ok(Tag::Property(TagHeader {
        name,
        property_type,
        size,
        is_array,
        array_index,
        struct_name,
    }))
}

/// Read an array element index: 1, 2 or 4 bytes selected by the top bits.
pub(crate) fn read_array_index(reader: &mut Ue2Reader<'_>) -> Result<u32> {
    let b = u32::from(reader.read_u8()?);
    if b & 0x80 == 0 {
        Ok(b)
    } else if b & 0xC0 == 0x80 {
        let low = u32::from(reader.read_u8()?);
        Ok(((b & 0x7F) << 8) | low)
    } else {
        let rest = reader.read_bytes(3)?;
        Ok(((b & 0x3F) << 24)
            | (u32::from(rest[0]) << 16)
            | (u32::from(rest[1]) << 8)
            | u32::from(rest[2]))
    }
}

/// Configurable property list decoder.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDecoder<'a> {
    names: &'a NameTable,
    mode: ListMode,
    max_properties: usize,
    depth: u32,
}

impl<'a> PropertyDecoder<'a> {
    /// Chained-mode decoder with the default property ceiling.
    #[must_use]
    pub fn new(names: &'a NameTable) -> Self {
        Self {
            names,
            mode: ListMode::Chained,
            max_properties: MAX_PROPERTIES,
            depth: 0,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ListMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_max_properties(mut self, max: usize) -> Self {
        self.max_properties = max;
        self
    }

    #[must_use]
    pub fn names(&self) -> &'a NameTable {
        self.names
    }

    /// Struct nesting depth of this decoder.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Decoder for a struct payload one level down.
    #[must_use]
    pub(crate) fn nested(&self) -> Self {
        Self {
            names: self.names,
            mode: ListMode::Single,
            max_properties: MAX_NESTED_PROPERTIES,
            depth: self.depth + 1,
        }
    }

    /// Walk property lists in `data` from `start_offset`.
    ///
    /// Never fails: a rejected tag ends the walk and is reported through
    /// [`PropertyList::termination`], with every earlier property kept.
    pub fn decode(&self, data: &[u8], start_offset: usize) -> PropertyList {
        let mut reader = Ue2Reader::at(data, start_offset);
        let mut properties = Vec::new();
        let mut lists = 0u32;
        let mut consecutive_terminators = 0;
        let mut end_offset = reader.tell();

        let termination = loop {
            if properties.len() >= self.max_properties {
                break Termination::Limit;
            }
            if reader.remaining() == 0 {
                break Termination::EndOfData;
            }

            let offset = reader.tell();
            match self.read_property(&mut reader, lists) {
                Ok(None) => {
                    lists += 1;
                    consecutive_terminators += 1;
                    end_offset = reader.tell();
                    if self.mode == ListMode::Single {
                        break Termination::SingleNone;
                    }
                    if consecutive_terminators >= 2 {
                        break Termination::DoubleNone;
                    }
                }
                Ok(Some(property)) => {
                    consecutive_terminators = 0;
                    end_offset = reader.tell();
                    properties.push(property);
                }
                Err(err) => {
                    if self.depth == 0 {
                        tracing::debug!("Property list stopped at offset {}: {}", offset, err);
                    }
                    break Termination::Desync {
                        offset,
                        kind: err.kind(),
                        message: err.to_string(),
                    };
                }
            }
        };

        PropertyList {
            start_offset,
            properties,
            end_offset,
            termination,
            lists,
        }
    }

    /// Read one tag and its value; `None` for a terminator.
    fn read_property(&self, reader: &mut Ue2Reader<'_>, list_index: u32) -> Result<Option<Property>> {
        let offset = reader.tell();
        let header = match read_tag(reader, self.names)? {
            Tag::Terminator => return Ok(None),
            Tag::Property(header) => header,
        };

        let payload = reader.read_bytes(header.size)?;
        let value = if header.property_type == PropertyType::Bool {
            PropertyValue::Bool(header.is_array)
        } else {
            decode_value(
                header.property_type,
                header.name,
                header.struct_name,
                payload,
                self,
            )
        };

        Ok(Some(Property {
            name: header.name.to_string(),
            property_type: header.property_type,
            size: header.size,
            array_index: header.array_index,
            struct_name: header.struct_name.map(str::to_string),
            value,
            list_index,
            offset,
        }))
    }
}

/// Decode chained property lists from `start_offset`.
pub fn decode_properties(data: &[u8], names: &NameTable, start_offset: usize) -> PropertyList {
    PropertyDecoder::new(names).decode(data, start_offset)
}

/// Decode property lists from `start_offset` in the given mode.
pub fn decode_property_list(
    data: &[u8],
    names: &NameTable,
    start_offset: usize,
    mode: ListMode,
) -> PropertyList {
    PropertyDecoder::new(names).with_mode(mode).decode(data, start_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::property::types::{ArrayValue, StructValue};
    use crate::test_support::{array_tag, bool_tag, property_tag, struct_tag};
    use pretty_assertions::assert_eq;

    fn names() -> NameTable {
        NameTable::from_names([
            "None", "X", "Speed", "Vector", "Location", "bHidden", "Tags", "Title", "Color",
            "DrawScale3D", "Offsets", "Inner", "Label", "CompoundObject61",
        ])
    }

    #[test]
    fn test_single_int_then_terminator() {
        let data = [0x01, 0x22, 42, 0, 0, 0, 0x00];
        let list = decode_properties(&data, &names(), 0);

        assert_eq!(list.properties.len(), 1);
        let prop = &list.properties[0];
        assert_eq!(prop.name, "X");
        assert_eq!(prop.property_type, PropertyType::Int);
        assert_eq!(prop.value, PropertyValue::Int(42));
        assert_eq!(prop.list_index, 0);
        assert_eq!(list.end_offset, 7);
        assert_eq!(list.lists, 1);
        assert!(list.is_terminated());
    }

    #[test]
    fn test_double_terminator_stops_before_trailing_bytes() {
        let mut data = vec![0x01, 0x22, 7, 0, 0, 0, 0x00, 0x00];
        data.extend_from_slice(&[0x01, 0x22, 9, 0, 0, 0]);
        let list = decode_properties(&data, &names(), 0);

        assert_eq!(list.termination, Termination::DoubleNone);
        assert_eq!(list.properties.len(), 1);
        assert_eq!(list.end_offset, 8);
    }

    #[test]
    fn test_chained_lists_tag_list_index() {
        let mut data = property_tag(1, PropertyType::Int, &5i32.to_le_bytes());
        data.push(0x00);
        data.extend(property_tag(2, PropertyType::Float, &1.5f32.to_le_bytes()));
        data.extend([0x00, 0x00]);

        let list = decode_properties(&data, &names(), 0);
        let indices: Vec<(&str, u32)> = list
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.list_index))
            .collect();
        assert_eq!(indices, vec![("X", 0), ("Speed", 1)]);
        assert_eq!(list.lists, 3);
    }

    #[test]
    fn test_single_mode_stops_at_first_terminator() {
        let mut data = property_tag(1, PropertyType::Int, &5i32.to_le_bytes());
        data.push(0x00);
        data.extend(property_tag(2, PropertyType::Float, &1.5f32.to_le_bytes()));

        let list = decode_property_list(&data, &names(), 0, ListMode::Single);
        assert_eq!(list.termination, Termination::SingleNone);
        assert_eq!(list.properties.len(), 1);
        assert_eq!(list.end_offset, 7);
    }

    #[test]
    fn test_float_with_wrong_size_is_desync() {
        let mut data = property_tag(1, PropertyType::Int, &3i32.to_le_bytes());
        let bad_offset = data.len();
        // Float, explicit byte size 7
        data.extend([0x02, 0x54, 0x07, 1, 2, 3, 4, 5, 6, 7, 0x00]);

        let list = decode_properties(&data, &names(), 0);
        assert_eq!(list.properties.len(), 1);
        assert_eq!(list.properties[0].value, PropertyValue::Int(3));
        assert_eq!(list.end_offset, bad_offset);
        match &list.termination {
            Termination::Desync {
                offset,
                kind,
                message,
            } => {
                assert_eq!(*offset, bad_offset);
                assert_eq!(*kind, FailureKind::DesyncDetected);
                assert!(message.contains("Float"), "{message}");
            }
            other => panic!("expected desync, got {other:?}"),
        }
    }

    #[test]
    fn test_map_type_rejected() {
        let data = [0x02, 0x2E, 0, 0, 0, 0, 0x00];
        let list = decode_properties(&data, &names(), 0);
        assert!(list.properties.is_empty());
        assert!(matches!(list.termination, Termination::Desync { offset: 0, .. }));
    }

    #[test]
    fn test_vector_named_string_rejected() {
        let data = property_tag(3, PropertyType::String, &[0x02, b'a', 0x00]);
        let list = decode_properties(&data, &names(), 0);
        assert!(list.properties.is_empty());
        assert!(matches!(list.termination, Termination::Desync { .. }));
    }

    #[test]
    fn test_invalid_name_index_stops() {
        let data = [0x01, 0x22, 1, 0, 0, 0, 0x3F, 0x22];
        let list = decode_properties(&data, &names(), 0);
        assert_eq!(list.properties.len(), 1);
        match &list.termination {
            Termination::Desync {
                offset,
                kind,
                message,
            } => {
                assert_eq!(*offset, 6);
                assert_eq!(*kind, FailureKind::InvalidNameIndex);
                assert!(message.contains("invalid name index 63"), "{message}");
            }
            other => panic!("expected desync, got {other:?}"),
        }
    }

    #[test]
    fn test_bool_value_lives_in_array_bit() {
        let mut data = bool_tag(5, true);
        data.extend(bool_tag(5, false));
        data.push(0x00);

        let list = decode_properties(&data, &names(), 0);
        let values: Vec<&PropertyValue> = list.properties.iter().map(|p| &p.value).collect();
        assert_eq!(values, vec![&PropertyValue::Bool(true), &PropertyValue::Bool(false)]);
        assert!(list.properties.iter().all(|p| p.size == 0 && p.array_index.is_none()));
    }

    #[test]
    fn test_struct_vector_and_color() {
        let position: Vec<u8> = [1.0f32, -2.0, 3.5].iter().flat_map(|f| f.to_le_bytes()).collect();
        let mut data = struct_tag(4, 3, &position);
        data.extend(struct_tag(8, 8, &[255, 128, 0, 255]));
        data.push(0x00);

        let list = decode_properties(&data, &names(), 0);
        assert_eq!(list.properties.len(), 2);
        assert_eq!(list.properties[0].struct_name.as_deref(), Some("Vector"));
        assert_eq!(
            list.properties[0].value,
            PropertyValue::Struct(StructValue::Vector([1.0, -2.0, 3.5]))
        );
        assert_eq!(
            list.properties[1].value,
            PropertyValue::Struct(StructValue::Color { r: 255, g: 128, b: 0, a: 255 })
        );
    }

    #[test]
    fn test_object_like_struct_name_rejected() {
        let data = struct_tag(11, 13, &[0, 0, 0, 0]);
        let list = decode_properties(&data, &names(), 0);
        assert!(list.properties.is_empty());
        assert!(matches!(list.termination, Termination::Desync { .. }));
    }

    #[test]
    fn test_extended_array_index() {
        let payload = 0.25f32.to_le_bytes();
        // 0x81 0x02: two-byte form, (1 << 8) | 2
        let mut data = vec![0x02, 0xA4, 0x81, 0x02];
        data.extend_from_slice(&payload);
        data.extend(array_tag(2, PropertyType::Float, 5, &payload));
        data.extend(array_tag(2, PropertyType::Float, 70_000, &payload));
        data.push(0x00);

        let list = decode_properties(&data, &names(), 0);
        let indices: Vec<Option<u32>> = list.properties.iter().map(|p| p.array_index).collect();
        assert_eq!(indices, vec![Some(258), Some(5), Some(70_000)]);
    }

    #[test]
    fn test_nested_struct_properties() {
        let mut inner = property_tag(1, PropertyType::Int, &11i32.to_le_bytes());
        inner.extend(property_tag(12, PropertyType::Str, &crate::formats::ue2::encode_fstring("Lid")));
        inner.push(0x00);
        let mut data = struct_tag(11, 11, &inner);
        data.push(0x00);

        let list = decode_properties(&data, &names(), 0);
        match &list.properties[0].value {
            PropertyValue::Struct(StructValue::Properties(props)) => {
                assert_eq!(props.len(), 2);
                assert_eq!(props[1].value, PropertyValue::String("Lid".to_string()));
            }
            other => panic!("expected nested properties, got {other:?}"),
        }
    }

    #[test]
    fn test_array_property() {
        let data = [
            property_tag(10, PropertyType::Array, &[0x03, 1, 2, 3]),
            vec![0x00],
        ]
        .concat();
        let list = decode_properties(&data, &names(), 0);
        assert_eq!(
            list.properties[0].value,
            PropertyValue::Array(ArrayValue::Bytes { values: vec![1, 2, 3] })
        );
    }

    #[test]
    fn test_payload_overrun_is_desync() {
        // Int claims 4 bytes, 2 remain
        let data = [0x01, 0x22, 1, 2];
        let list = decode_properties(&data, &names(), 0);
        assert!(list.properties.is_empty());
        assert!(matches!(list.termination, Termination::Desync { offset: 0, .. }));
    }

    #[test]
    fn test_property_limit() {
        let mut data = Vec::new();
        for _ in 0..5 {
            data.extend(property_tag(1, PropertyType::Int, &0i32.to_le_bytes()));
        }
        let list = PropertyDecoder::new(&names()).with_max_properties(3).decode(&data, 0);
        assert_eq!(list.termination, Termination::Limit);
        assert_eq!(list.properties.len(), 3);
    }

    #[test]
    fn test_empty_buffer_is_end_of_data() {
        let list = decode_properties(&[], &names(), 0);
        assert_eq!(list.termination, Termination::EndOfData);
        assert!(!list.is_terminated());
    }
}
