//! Error types for the `tiff2jpeg` crate.
//!
//! This module defines [`ConvertError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose a failure without extra logging at the call site: file paths,
//! page numbers, and upstream decoder or encoder messages.
//!
//! Two groups of variants exist. Fatal errors ([`ConvertError::FileOpen`],
//! [`ConvertError::OutputDirectory`]) abort a conversion before any page is
//! processed. Page-local errors are collected per page into a
//! [`ConversionSummary`](crate::ConversionSummary) and never stop sibling
//! pages.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `tiff2jpeg` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// The TIFF container could not be opened.
    #[error("Failed to open TIFF container at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::TiffContainer::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: IoError,
    },

    /// A page could not be read or decoded from the container.
    #[error("Failed to read page {page}: {reason}")]
    PageRead {
        /// Zero-based page index.
        page: u32,
        /// Underlying decoder message.
        reason: String,
    },

    /// The requested page index exceeds the page count.
    #[error("Page {page} is out of range (container has {page_count} pages)")]
    PageOutOfRange {
        /// The page index that was requested.
        page: u32,
        /// Number of pages in the container.
        page_count: u32,
    },

    /// The page uses a sample layout that has no RGB conversion.
    #[error("Page {page} has unsupported color type {color_type}")]
    UnsupportedColorType {
        /// Zero-based page index.
        page: u32,
        /// Debug rendering of the TIFF color type.
        color_type: String,
    },

    /// JPEG encoding of a page failed.
    #[error("Failed to encode page {page} as JPEG: {source}")]
    Encode {
        /// Zero-based page index.
        page: u32,
        /// Underlying encoder failure.
        source: ImageError,
    },

    /// Writing an encoded page to disk failed.
    #[error("Failed to write page {page} to {path}: {source}")]
    Write {
        /// Zero-based page index.
        page: u32,
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: IoError,
    },

    /// The worker pool could not be started.
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    /// A page job panicked. The panic is contained to that page.
    #[error("Page {page} job panicked: {message}")]
    JobPanicked {
        /// Zero-based page index.
        page: u32,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl ConvertError {
    /// The page this error belongs to, if it is page-local.
    pub fn page(&self) -> Option<u32> {
        match self {
            ConvertError::PageRead { page, .. }
            | ConvertError::PageOutOfRange { page, .. }
            | ConvertError::UnsupportedColorType { page, .. }
            | ConvertError::Encode { page, .. }
            | ConvertError::Write { page, .. }
            | ConvertError::JobPanicked { page, .. } => Some(*page),
            _ => None,
        }
    }

    /// Returns `true` for errors raised while reading a page out of the
    /// container (corrupt data, out-of-range index, unsupported layout).
    pub fn is_page_read(&self) -> bool {
        matches!(
            self,
            ConvertError::PageRead { .. }
                | ConvertError::PageOutOfRange { .. }
                | ConvertError::UnsupportedColorType { .. }
        )
    }

    /// Returns `true` for errors that abort a whole conversion.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::FileOpen { .. }
                | ConvertError::OutputDirectory { .. }
                | ConvertError::WorkerPool(_)
        )
    }
}
