//! # tiff2jpeg
//!
//! Split multi-page TIFF images into one JPEG file per page.
//!
//! A TIFF decoder reads pages through a single cursor, so it cannot be
//! driven from several threads at once. `tiff2jpeg` keeps one decoder
//! behind a lock in [`TiffContainer`], copies each page out under that lock,
//! and does everything else (color conversion, JPEG encoding, file writes)
//! in parallel on a worker pool.
//!
//! ## Quick Start
//!
//! ### Convert a Whole File
//!
//! ```no_run
//! let summary = tiff2jpeg::convert("scan.tif", "pages").unwrap();
//! for failure in &summary.failed {
//!     eprintln!("page {}: {}", failure.page, failure.error);
//! }
//! ```
//!
//! Pages are written as `00000.jpg`, `00001.jpg`, … in the output
//! directory, which is created if it does not exist.
//!
//! ### Progress and Cancellation
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tiff2jpeg::{CancellationToken, ConvertOptions, ProgressCallback, ProgressInfo};
//!
//! struct Print;
//!
//! impl ProgressCallback for Print {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{}", info.current, info.total);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ConvertOptions::new()
//!     .with_progress(Arc::new(Print))
//!     .with_cancellation(token.clone())
//!     .with_threads(4);
//!
//! let summary = tiff2jpeg::convert_with_options("scan.tif", "pages", &options).unwrap();
//! ```
//!
//! ### Single Pages
//!
//! ```no_run
//! use tiff2jpeg::TiffContainer;
//!
//! let container = TiffContainer::open("scan.tif").unwrap();
//! let frame = container.extract_page(2).unwrap();
//! frame.to_rgb().unwrap().save("page-3.jpg").unwrap();
//! ```
//!
//! ## Features
//!
//! - **Serialized decoding**: one shared decoder, one exclusive section
//!   per page read
//! - **Parallel encoding**: a rayon worker pool sized to the machine
//! - **Fault isolation**: a corrupt page is reported, not fatal
//! - **Progress & cancellation**: callbacks and a `CancellationToken`
//! - **Page metadata**: dimensions and sample layout per page
//! - **Wide input coverage**: 1 to 16-bit gray, RGB(A), CMYK, YCbCr, and
//!   float pages, all written as 8-bit RGB JPEG

pub mod configuration;
pub mod container;
mod conversion;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod summary;

pub use configuration::ConvertOptions;
pub use container::TiffContainer;
pub use error::ConvertError;
pub use frame::{JPEG_QUALITY, PageFrame};
pub use metadata::PageInfo;
pub use pipeline::{convert, convert_with_options, output_path};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use summary::{ConversionSummary, PageFailure, WrittenPage};
