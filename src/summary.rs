//! Conversion results.
//!
//! A [`ConversionSummary`] is returned once every page of a container has
//! been attempted. Page-local failures live here instead of aborting the
//! run, each tagged with its page index and the error that stopped it.

use std::{path::PathBuf, time::Duration};

use serde_json::{Value, json};

use crate::error::ConvertError;

/// A page that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    /// Zero-based page index.
    pub page: u32,
    /// Output file path.
    pub path: PathBuf,
    /// Size of the encoded JPEG in bytes.
    pub bytes: u64,
}

/// A page that failed to convert.
#[derive(Debug)]
pub struct PageFailure {
    /// Zero-based page index.
    pub page: u32,
    /// What went wrong.
    pub error: ConvertError,
}

/// Outcome of converting every page of one container.
///
/// All lists are sorted by page index, whatever order the pages
/// completed in.
#[derive(Debug, Default)]
#[must_use]
pub struct ConversionSummary {
    /// Number of pages in the input container.
    pub page_count: u32,
    /// Pages written successfully.
    pub succeeded: Vec<WrittenPage>,
    /// Pages that failed, with reasons.
    pub failed: Vec<PageFailure>,
    /// Pages skipped because the run was cancelled before they started.
    pub cancelled: Vec<u32>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl ConversionSummary {
    pub(crate) fn new(page_count: u32) -> Self {
        Self {
            page_count,
            ..Self::default()
        }
    }

    pub(crate) fn finalize(mut self, elapsed: Duration) -> Self {
        self.succeeded.sort_by_key(|written| written.page);
        self.failed.sort_by_key(|failure| failure.page);
        self.cancelled.sort_unstable();
        self.elapsed = elapsed;
        self
    }

    /// Number of pages written.
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    /// Number of pages that failed.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Indices of the failed pages.
    pub fn failed_pages(&self) -> Vec<u32> {
        self.failed.iter().map(|failure| failure.page).collect()
    }

    /// Returns `true` when every page was written.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    /// Total bytes written across all pages.
    pub fn bytes_written(&self) -> u64 {
        self.succeeded.iter().map(|written| written.bytes).sum()
    }

    /// Machine-readable form used by the CLI's `--json` output.
    pub fn to_json(&self) -> Value {
        json!({
            "page_count": self.page_count,
            "succeeded": self.succeeded.iter().map(|written| json!({
                "page": written.page,
                "path": written.path.display().to_string(),
                "bytes": written.bytes,
            })).collect::<Vec<_>>(),
            "failed": self.failed.iter().map(|failure| json!({
                "page": failure.page,
                "error": failure.error.to_string(),
            })).collect::<Vec<_>>(),
            "cancelled": self.cancelled,
            "elapsed_seconds": self.elapsed.as_secs_f64(),
        })
    }
}
