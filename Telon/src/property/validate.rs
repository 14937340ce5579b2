//! Tag plausibility rules
//!
//! Tags are self-describing but nothing in the stream marks where a list
//! went wrong. These rules reject tag shapes that never occur in real
//! packages, so the decoder stops at the last good boundary instead of
//! reading garbage as values.

use super::types::PropertyType;

/// Largest payload size accepted for any tag.
pub const MAX_PROPERTY_SIZE: usize = 10_000_000;

/// Struct names only ever seen when the stream is misaligned.
pub const INVALID_STRUCT_NAMES: &[&str] = &[
    "InternalTime",
    "LODSet",
    "StartSpinRange",
    "StartLocationRange",
    "LifetimeRange",
    "StartVelocityRange",
    "CoordinateSystem",
    "bLockLocation",
    "UClamp",
    "VClamp",
    "pBuildingTileLayerData",
    "PrefabPackageName",
];

/// Property names that are never String or Str typed.
pub const NON_STRING_PROP_NAMES: &[&str] = &[
    "Vector",
    "Region",
    "StartSizeRange",
    "InternalTime",
    "Zone",
    "PointRegion",
    "UBits",
    "VBits",
    "Level",
    "Tag",
    "bLightChanged",
    "WaterVolumeType",
    "VelocityVectors",
    "pBuildingTileLayerData",
    "Rotation",
    "Location",
    "Color",
    "RelativeTime",
    "ZoneNumber",
    "bNoDelete",
    "Scale",
    "LevelInfo",
    "m_CompoundObjectType",
    "ChunkPosition",
    "Layers",
    "MainScale",
    "Range",
    "PostScale",
    "DrawScale",
    "DrawScale3D",
    "Brush",
    "Model",
    "Texture",
    "TerrainLayer",
    "Rotator",
    "SheerAxis",
    "SheerRate",
    "UClamp",
    "WaterVolume",
    "iLeaf",
    "ColLocation",
    "Format",
    "MaxParticles",
    "RangeVector",
    "USize",
    "VSize",
    "VClamp",
    "RelativeVelocity",
    "LocationPriority",
    "bSelected",
];

/// Property names that are never Name typed.
pub const NON_NAME_PROP_NAMES: &[&str] = &[
    "InternalTime",
    "Vector",
    "VBits",
    "UClamp",
    "LODSet",
    "m_CompoundObjectType",
    "pBuildingTileLayerData",
    "RangeVector",
    "SheerRate",
    "Summary",
    "CameraLocationDynamic",
    "FadeOutStartTime",
];

/// Property names that are never Array typed.
pub const NON_ARRAY_PROP_NAMES: &[&str] = &[
    "Vector",
    "bDynamicLight",
    "Color",
    "Max",
    "pBuildingTileLayerData",
    "LightAmbientBrightness",
    "LightAmbientColor",
    "VSize",
    "Group",
];

/// Check a (type, size) pair against the size table.
///
/// Returns the reason on rejection. Bool is exempt: its payload is always
/// empty and the size class carries no meaning.
pub fn check_type_size(property_type: PropertyType, size: usize) -> Result<(), String> {
    use PropertyType as T;

    let exact = match property_type {
        T::Map | T::FixedArray => {
            return Err(format!("{property_type:?} tags never occur in valid lists"));
        }
        T::Byte => Some(1),
        T::Int | T::Float => Some(4),
        T::Vector | T::Rotator => Some(12),
        _ => None,
    };
    if let Some(expected) = exact {
        if size != expected {
            return Err(format!("{property_type:?} must be {expected} bytes, found {size}"));
        }
    }

    let min = match property_type {
        T::String | T::Str => 2,
        T::Array | T::Struct => 4,
        _ => 0,
    };
    if size < min {
        return Err(format!("{property_type:?} needs at least {min} bytes, found {size}"));
    }

    if matches!(property_type, T::Object | T::Name | T::Class) && size > 5 {
        return Err(format!("{property_type:?} reference of {size} bytes"));
    }

    if size > MAX_PROPERTY_SIZE {
        return Err(format!("size {size} exceeds {MAX_PROPERTY_SIZE}"));
    }

    Ok(())
}

/// Check a property name against the types it is never declared with.
pub fn check_name_type(name: &str, property_type: PropertyType) -> Result<(), String> {
    let banned = match property_type {
        PropertyType::String | PropertyType::Str => NON_STRING_PROP_NAMES,
        PropertyType::Name => NON_NAME_PROP_NAMES,
        PropertyType::Array => NON_ARRAY_PROP_NAMES,
        _ => return Ok(()),
    };
    if banned.contains(&name) {
        return Err(format!("property '{name}' is never {property_type:?} typed"));
    }
    Ok(())
}

/// Check a struct type name.
///
/// Object-like names (`Something12`) show up when an object reference is
/// being read as a struct name.
pub fn check_struct_name(struct_name: &str) -> Result<(), String> {
    if INVALID_STRUCT_NAMES.contains(&struct_name) {
        return Err(format!("'{struct_name}' is not a struct type"));
    }
    if struct_name.chars().count() > 3
        && struct_name.chars().last().is_some_and(|c| c.is_ascii_digit())
    {
        return Err(format!("struct name '{struct_name}' looks like an object name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sizes() {
        assert!(check_type_size(PropertyType::Float, 4).is_ok());
        assert!(check_type_size(PropertyType::Float, 7).is_err());
        assert!(check_type_size(PropertyType::Byte, 2).is_err());
        assert!(check_type_size(PropertyType::Rotator, 12).is_ok());
    }

    #[test]
    fn test_map_and_fixed_array_rejected() {
        assert!(check_type_size(PropertyType::Map, 4).is_err());
        assert!(check_type_size(PropertyType::FixedArray, 16).is_err());
    }

    #[test]
    fn test_min_and_max_sizes() {
        assert!(check_type_size(PropertyType::String, 1).is_err());
        assert!(check_type_size(PropertyType::Struct, 3).is_err());
        assert!(check_type_size(PropertyType::Array, 4).is_ok());
        assert!(check_type_size(PropertyType::Object, 5).is_ok());
        assert!(check_type_size(PropertyType::Name, 6).is_err());
        assert!(check_type_size(PropertyType::Struct, MAX_PROPERTY_SIZE + 1).is_err());
    }

    #[test]
    fn test_bool_ignores_size() {
        assert!(check_type_size(PropertyType::Bool, 0).is_ok());
        assert!(check_type_size(PropertyType::Bool, 16).is_ok());
    }

    #[test]
    fn test_name_type_rules() {
        assert!(check_name_type("Vector", PropertyType::String).is_err());
        assert!(check_name_type("Vector", PropertyType::Struct).is_ok());
        assert!(check_name_type("Summary", PropertyType::Name).is_err());
        assert!(check_name_type("Group", PropertyType::Array).is_err());
        assert!(check_name_type("Tag", PropertyType::Name).is_ok());
    }

    #[test]
    fn test_struct_names() {
        assert!(check_struct_name("Vector").is_ok());
        assert!(check_struct_name("LODSet").is_err());
        assert!(check_struct_name("CompoundObject61").is_err());
        // Short names ending in a digit are real types
        assert!(check_struct_name("Ab1").is_ok());
    }
}
