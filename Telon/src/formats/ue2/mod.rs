//! Unreal Engine 2 primitive encodings
//!
//! Position-tracked reading of the little-endian primitives used throughout
//! Vanguard packages, including the two variable-length encodings: the
//! compact index and the FString.

pub mod codec;
pub mod reader;

pub use codec::{encode_compact_index, encode_fstring};
pub use reader::Ue2Reader;
