//! Decoder options, loadable from a TOML file
//!
//! ```toml
//! anchor_window = 4096
//! include_vertices = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn default_anchor_window() -> usize {
    2048
}

fn default_post_skip_search() -> usize {
    100
}

fn default_max_lods() -> u32 {
    5
}

fn default_max_trailing_arrays() -> usize {
    10
}

fn default_max_count() -> u32 {
    500_000
}

fn default_max_properties() -> usize {
    200
}

fn default_hex_preview_limit() -> usize {
    256
}

fn default_true() -> bool {
    true
}

/// Tunables for property and StaticMesh decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Bytes scanned for the mesh core when neither fixed bounds layout fits.
    #[serde(default = "default_anchor_window")]
    pub anchor_window: usize,
    /// Bytes scanned for the post-skip LOD header.
    #[serde(default = "default_post_skip_search")]
    pub post_skip_search: usize,
    /// Upper bound on the LOD count.
    #[serde(default = "default_max_lods")]
    pub max_lods: u32,
    /// Trailing u16 arrays examined after each LOD's vertices.
    #[serde(default = "default_max_trailing_arrays")]
    pub max_trailing_arrays: usize,
    /// Sanity ceiling for stream and vertex counts.
    #[serde(default = "default_max_count")]
    pub max_count: u32,
    /// Properties decoded per call before giving up.
    #[serde(default = "default_max_properties")]
    pub max_properties: usize,
    /// Fall back to a scored property start search when offset 0 yields nothing.
    #[serde(default = "default_true")]
    pub scan_property_start: bool,
    /// Keep decoded vertices and indices in reports (counts only when false).
    #[serde(default = "default_true")]
    pub include_vertices: bool,
    /// Bytes of hex kept per unknown region.
    #[serde(default = "default_hex_preview_limit")]
    pub hex_preview_limit: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            anchor_window: default_anchor_window(),
            post_skip_search: default_post_skip_search(),
            max_lods: default_max_lods(),
            max_trailing_arrays: default_max_trailing_arrays(),
            max_count: default_max_count(),
            max_properties: default_max_properties(),
            scan_property_start: true,
            include_vertices: true,
            hex_preview_limit: default_hex_preview_limit(),
        }
    }
}

impl DecoderOptions {
    /// Parse options from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set the core anchor search window.
    #[must_use]
    pub fn with_anchor_window(mut self, bytes: usize) -> Self {
        self.anchor_window = bytes;
        self
    }

    /// Report counts only, dropping vertex and index payloads.
    #[must_use]
    pub fn counts_only(mut self) -> Self {
        self.include_vertices = false;
        self
    }

    /// Never search for a property start; always decode from offset 0.
    #[must_use]
    pub fn no_property_scan(mut self) -> Self {
        self.scan_property_start = false;
        self
    }
}
