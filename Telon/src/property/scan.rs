//! Locating the start of a property list inside an object payload
//!
//! Some objects carry a short header before their properties (a class
//! reference, padding). Every candidate offset near the start is scored by
//! how far a clean tag chain runs from it.

use super::decoder::{TERMINATOR, Tag, read_tag};
use crate::formats::ue2::Ue2Reader;
use crate::package::NameTable;

/// Candidate start offsets examined.
pub const PROPERTY_SEARCH_WINDOW: usize = 50;

const MAX_SCORED_PROPERTIES: usize = 100;
const MAX_NAME_LEN: usize = 100;

/// Find the most plausible property list start in the first bytes of `data`.
///
/// Returns `None` when no offset scores above zero.
#[must_use]
pub fn find_property_start(data: &[u8], names: &NameTable) -> Option<usize> {
    let window = PROPERTY_SEARCH_WINDOW.min(data.len().saturating_sub(2));

    let mut best: Option<(usize, i64)> = None;
    for offset in 0..window {
        let score = score_property_chain(data, names, offset);
        if score > 0 && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((offset, score));
        }
    }

    if let Some((offset, score)) = best {
        tracing::debug!("Property list start at {} (score {})", offset, score);
    }
    best.map(|(offset, _)| offset)
}

/// Score the tag chain starting at `offset`.
///
/// Each clean property adds one; a terminator adds `10 + 2 * properties`
/// and ends the chain. Names shaped like object names cost points.
#[must_use]
pub fn score_property_chain(data: &[u8], names: &NameTable, offset: usize) -> i64 {
    let mut reader = Ue2Reader::at(data, offset);
    let mut score = 0i64;
    let mut seen = 0usize;

    while reader.tell() + 1 < data.len() && seen < MAX_SCORED_PROPERTIES {
        let tag_offset = reader.tell();
        let Some(name) = reader
            .read_compact_index()
            .ok()
            .and_then(|index| names.get(index))
        else {
            break;
        };

        if name.eq_ignore_ascii_case(TERMINATOR) {
            score += 10 + 2 * seen as i64;
            break;
        }
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            break;
        }
        score -= name_penalty(name);

        if reader.seek(tag_offset).is_err() {
            break;
        }
        let header = match read_tag(&mut reader, names) {
            Ok(Tag::Property(header)) => header,
            _ => break,
        };
        if reader.skip(header.size).is_err() {
            break;
        }
        seen += 1;
        score += 1;
    }

    score
}

/// Points lost for a name that looks like an object or a number.
fn name_penalty(name: &str) -> i64 {
    let mut penalty = 0;
    if name.starts_with(|c: char| c.is_ascii_digit() || c == '_') {
        penalty += 5;
    }
    if name.ends_with(|c: char| c.is_ascii_digit()) && name.chars().any(char::is_alphabetic) {
        penalty += 3;
    }
    penalty
}
