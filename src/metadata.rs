//! Page metadata types.
//!
//! [`PageInfo`] describes one page of a container as stored on disk. It is
//! read through [`TiffContainer::page_info`](crate::TiffContainer::page_info)
//! and [`TiffContainer::pages`](crate::TiffContainer::pages), which take the
//! same exclusive section as page extraction.
//!
//! # Example
//!
//! ```no_run
//! use tiff2jpeg::TiffContainer;
//!
//! let container = TiffContainer::open("scan.tif").unwrap();
//! for page in container.pages().unwrap() {
//!     println!("page {}: {}x{} {}", page.index, page.width, page.height, page.color_type);
//! }
//! ```

use serde_json::{Value, json};

/// Metadata for a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PageInfo {
    /// Zero-based page index.
    pub index: u32,
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
    /// Sample layout as reported by the TIFF decoder (e.g. `"RGB(8)"`).
    pub color_type: String,
}

impl PageInfo {
    /// Machine-readable form used by the CLI's `--json` output.
    pub fn to_json(&self) -> Value {
        json!({
            "index": self.index,
            "width": self.width,
            "height": self.height,
            "color_type": self.color_type,
        })
    }
}
