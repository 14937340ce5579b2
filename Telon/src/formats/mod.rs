//! Binary encodings shared by the package and export decoders

pub mod ue2;
