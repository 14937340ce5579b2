//! Batch package decoding
//!
//! Discovers package files under a directory and decodes them in parallel,
//! one container per file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use super::decode_package;
use super::report::{BatchEntry, BatchReport, StatusCounts};
use crate::config::DecoderOptions;
use crate::package::read_package;

/// File extensions treated as packages (compared case-insensitively).
pub const PACKAGE_EXTENSIONS: &[&str] = &["usx", "upk", "utx", "uax", "ukx", "u", "vgr"];

/// Progress of a batch run, reported once per file as it starts.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
    pub file: String,
}

/// Find all package files in a directory recursively
///
/// # Arguments
/// * `dir` - Directory to search
///
/// # Returns
/// A sorted list of paths whose extension is one of [`PACKAGE_EXTENSIONS`].
pub fn find_package_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path().extension().is_some_and(|ext| {
                    PACKAGE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    files.sort();
    files
}

/// Decode package files in parallel
///
/// A file that cannot be opened becomes a failed entry carrying its error
/// message; the rest of the batch carries on.
///
/// # Arguments
/// * `files` - Package files to decode
/// * `options` - Decoder options shared by every export
/// * `class_filter` - Only decode exports of this class, if given
/// * `progress` - Callback for progress updates
///
/// # Returns
/// One entry per file, in input order, with status totals.
pub fn batch_decode<F>(
    files: &[PathBuf],
    options: &DecoderOptions,
    class_filter: Option<&str>,
    progress: F,
) -> BatchReport
where
    F: Fn(&BatchProgress) + Send + Sync,
{
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);
    let total = files.len();

    let entries: Vec<BatchEntry> = files
        .par_iter()
        .map(|path| {
            let display_path = path.to_string_lossy().to_string();
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&BatchProgress {
                current,
                total,
                file: display_path.clone(),
            });

            match read_package(path) {
                Ok(pkg) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    BatchEntry {
                        path: display_path,
                        report: Some(decode_package(&pkg, options, class_filter)),
                        error: None,
                        failure: None,
                    }
                }
                Err(err) => {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!("Failed to open {}: {}", display_path, err);
                    BatchEntry {
                        path: display_path,
                        report: None,
                        error: Some(err.to_string()),
                        failure: Some(err.kind()),
                    }
                }
            }
        })
        .collect();

    let mut totals = StatusCounts::default();
    for report in entries.iter().filter_map(|e| e.report.as_ref()) {
        totals.merge(&report.summary);
    }

    let success_count = success_counter.load(Ordering::SeqCst);
    let fail_count = fail_counter.load(Ordering::SeqCst);
    tracing::info!(
        "Batch decoded {} packages ({} failed): {} complete, {} partial, {} error",
        success_count,
        fail_count,
        totals.complete,
        totals.partial,
        totals.error
    );

    BatchReport {
        success_count,
        fail_count,
        totals,
        files: entries,
    }
}
