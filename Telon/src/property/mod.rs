//! Tagged property lists
//!
//! Every object payload begins with a self-describing list of property tags.
//! [`decode_properties`] walks them into typed [`Property`] values and stops
//! cleanly when the stream stops making sense.
//!
//! ```
//! use telon::package::NameTable;
//! use telon::property::{PropertyValue, decode_properties};
//!
//! let names = NameTable::from_names(["None", "X"]);
//! let list = decode_properties(&[0x01, 0x22, 42, 0, 0, 0, 0x00], &names, 0);
//! assert_eq!(list.properties[0].value, PropertyValue::Int(42));
//! ```

mod decoder;
mod scan;
mod types;
mod validate;
mod values;

pub use decoder::{
    MAX_PROPERTIES, PropertyDecoder, TERMINATOR, decode_properties, decode_property_list,
};
pub use scan::{PROPERTY_SEARCH_WINDOW, find_property_start, score_property_chain};
pub use types::{
    ArrayValue, ListMode, Property, PropertyList, PropertyType, PropertyValue, Range, Rotator,
    StructValue, Termination,
};
pub use validate::{
    INVALID_STRUCT_NAMES, MAX_PROPERTY_SIZE, check_name_type, check_struct_name, check_type_size,
};
pub use values::{MAX_ARRAY_COUNT, MAX_NESTED_PROPERTIES, MAX_STRUCT_DEPTH};

pub(crate) use values::plausible_float;
