//! Byte-coverage accounting for decoded exports
//!
//! A [`ParseResult`] is threaded through a decode and claims every byte of
//! the export exactly once, either as parsed or as an [`UnknownRegion`].
//! Whatever the decoder never reached is claimed as unknown when the result
//! is finished, so `bytes_parsed + bytes_unknown == bytes_total` holds for
//! failed decodes too.

use serde::Serialize;

use crate::error::{Error, FailureKind};

/// Overall outcome of decoding one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// Every byte was interpreted.
    Complete,
    /// Decoding succeeded but some byte ranges remain unidentified.
    Partial,
    /// Decoding stopped on a failure.
    Error,
}

/// A byte range the decoder consumed but could not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownRegion {
    /// Start offset, relative to the export data.
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    pub size: usize,
    /// Hex of the region, cut to the configured preview limit.
    pub hex: String,
    /// Where in the structure the region was found.
    pub context: String,
}

/// Coverage accumulator and diagnostic summary for one export.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub bytes_total: usize,
    pub bytes_parsed: usize,
    pub bytes_unknown: usize,
    pub coverage_pct: f64,
    pub uses_heuristics: bool,
    pub uses_skips: bool,
    pub unknown_regions: Vec<UnknownRegion>,
    pub status: ParseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip)]
    consumed_to: usize,
    #[serde(skip)]
    hex_limit: usize,
}

impl ParseResult {
    /// Start accounting for an export of `bytes_total` bytes.
    #[must_use]
    pub fn new(bytes_total: usize, hex_limit: usize) -> Self {
        Self {
            bytes_total,
            bytes_parsed: 0,
            bytes_unknown: 0,
            coverage_pct: 0.0,
            uses_heuristics: false,
            uses_skips: false,
            unknown_regions: Vec::new(),
            status: ParseStatus::Complete,
            message: None,
            failure: None,
            consumed_to: 0,
            hex_limit,
        }
    }

    /// Claim everything up to `end` as parsed. Already-claimed bytes are ignored.
    pub fn parsed_through(&mut self, end: usize) {
        let end = end.min(self.bytes_total);
        if end > self.consumed_to {
            self.bytes_parsed += end - self.consumed_to;
            self.consumed_to = end;
        }
    }

    /// Claim everything up to `end` as an unknown region.
    pub fn unknown_through(&mut self, end: usize, data: &[u8], context: &str) {
        let end = end.min(self.bytes_total).min(data.len());
        if end <= self.consumed_to {
            return;
        }
        let start = self.consumed_to;
        let preview_end = end.min(start.saturating_add(self.hex_limit));
        self.unknown_regions.push(UnknownRegion {
            start,
            end,
            size: end - start,
            hex: hex::encode(&data[start..preview_end]),
            context: context.to_string(),
        });
        self.bytes_unknown += end - start;
        self.consumed_to = end;
    }

    /// Record a failure. The first failure wins.
    pub fn fail(&mut self, error: &Error) {
        self.fail_with(error.kind(), error.to_string());
    }

    /// Record a failure already reduced to its kind and message.
    pub fn fail_with(&mut self, kind: FailureKind, message: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(kind);
            self.message = Some(message.into());
        }
    }

    /// Whether a failure has been recorded.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Claim any remaining bytes and compute coverage and status.
    #[must_use]
    pub fn finish(mut self, data: &[u8]) -> Self {
        if self.consumed_to < self.bytes_total {
            let context = if self.is_failed() {
                "unparsed_after_error"
            } else {
                "unclaimed"
            };
            self.unknown_through(self.bytes_total, data, context);
        }

        self.coverage_pct = if self.bytes_total == 0 {
            0.0
        } else {
            100.0 * self.bytes_parsed as f64 / self.bytes_total as f64
        };
        self.status = if self.is_failed() {
            ParseStatus::Error
        } else if self.bytes_unknown > 0 {
            ParseStatus::Partial
        } else {
            ParseStatus::Complete
        };
        self
    }
}
