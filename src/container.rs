//! Shared access to a multi-page TIFF container.
//!
//! A TIFF decoder exposes one page at a time through an internal cursor,
//! which makes it unsafe to drive from several threads at once.
//! [`TiffContainer`] owns the single decoder behind a mutex and only hands
//! out private copies of page data, so callers never see the cursor.
//!
//! # Example
//!
//! ```no_run
//! use tiff2jpeg::{ConvertError, TiffContainer};
//!
//! let container = TiffContainer::open("scan.tif")?;
//! println!("{} pages", container.page_count());
//!
//! let frame = container.extract_page(0)?;
//! std::fs::write("first.jpg", frame.to_jpeg()?)?;
//!
//! container.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs::File,
    io::{BufReader, Read, Seek},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tiff::{
    TiffResult,
    decoder::{Decoder, DecodingResult},
};

use crate::{error::ConvertError, frame::PageFrame, metadata::PageInfo};

type SharedDecoder = Decoder<BufReader<File>>;

/// An open multi-page TIFF file.
///
/// The page count is read once at open time. Every operation that moves
/// the decoder's cursor runs inside one exclusive section; callers block
/// until the current holder finishes its seek and decode.
///
/// `TiffContainer` is [`Sync`]; share it between workers with an
/// [`Arc`](std::sync::Arc).
pub struct TiffContainer {
    /// `None` once the container has been closed.
    decoder: Mutex<Option<SharedDecoder>>,
    page_count: u32,
    file_path: PathBuf,
}

impl Debug for TiffContainer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TiffContainer")
            .field("file_path", &self.file_path)
            .field("page_count", &self.page_count)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl TiffContainer {
    /// Open a TIFF file and count its pages.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::FileOpen`] if the file is missing, unreadable,
    /// or its directory chain cannot be parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();
        let open_error = |reason: String| ConvertError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        log::debug!("Opening TIFF container: {}", path.display());

        let file = File::open(path).map_err(|error| open_error(error.to_string()))?;
        let mut decoder =
            Decoder::new(BufReader::new(file)).map_err(|error| open_error(error.to_string()))?;

        let page_count = count_pages(&mut decoder).map_err(|error| open_error(error.to_string()))?;
        decoder
            .seek_to_image(0)
            .map_err(|error| open_error(error.to_string()))?;

        log::debug!("{} has {page_count} page(s)", path.display());

        Ok(Self {
            decoder: Mutex::new(Some(decoder)),
            page_count,
            file_path,
        })
    }

    /// Number of pages in the container.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Path the container was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Decode one page into a private buffer.
    ///
    /// Seeking and decoding both happen inside the exclusive section; the
    /// returned frame is owned by the caller and can be converted without
    /// further locking.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::PageOutOfRange`] for an index at or past
    /// [`page_count`](TiffContainer::page_count), and
    /// [`ConvertError::PageRead`] if the page is corrupt or the container
    /// has been closed.
    pub fn extract_page(&self, page: u32) -> Result<PageFrame, ConvertError> {
        self.check_range(page)?;

        self.with_page(page, |decoder| {
            let (width, height) = decoder.dimensions()?;
            let color_type = decoder.colortype()?;
            let samples: DecodingResult = decoder.read_image()?;
            Ok(PageFrame::new(page, width, height, color_type, samples))
        })
    }

    /// Read the dimensions and sample layout of one page without decoding
    /// its pixels.
    pub fn page_info(&self, page: u32) -> Result<PageInfo, ConvertError> {
        self.check_range(page)?;
        self.with_page(page, |decoder| read_page_info(decoder, page))
    }

    /// Metadata for every page, in page order.
    ///
    /// Holds the exclusive section for the whole scan.
    pub fn pages(&self) -> Result<Vec<PageInfo>, ConvertError> {
        let mut guard = self.lock();
        let decoder = guard.as_mut().ok_or_else(|| closed_error(0))?;

        let mut pages = Vec::with_capacity(self.page_count as usize);
        for page in 0..self.page_count {
            decoder
                .seek_to_image(page as usize)
                .map_err(|error| page_read_error(page, error))?;
            let info =
                read_page_info(decoder, page).map_err(|error| page_read_error(page, error))?;
            pages.push(info);
        }
        Ok(pages)
    }

    /// Release the decoder and its file handle.
    ///
    /// Idempotent. Waits for any in-progress extraction to finish; later
    /// extractions fail with [`ConvertError::PageRead`].
    pub fn close(&self) {
        if self.lock().take().is_some() {
            log::debug!("Closed TIFF container: {}", self.file_path.display());
        }
    }

    /// Returns `true` once [`close`](TiffContainer::close) has run.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    fn check_range(&self, page: u32) -> Result<(), ConvertError> {
        if page >= self.page_count {
            return Err(ConvertError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }
        Ok(())
    }

    /// Run `read` inside the exclusive section with the cursor on `page`.
    fn with_page<T>(
        &self,
        page: u32,
        read: impl FnOnce(&mut SharedDecoder) -> TiffResult<T>,
    ) -> Result<T, ConvertError> {
        let mut guard = self.lock();
        let decoder = guard.as_mut().ok_or_else(|| closed_error(page))?;

        log::trace!("Seeking to page {page}");
        decoder
            .seek_to_image(page as usize)
            .and_then(|()| read(decoder))
            .map_err(|error| page_read_error(page, error))
    }

    fn lock(&self) -> MutexGuard<'_, Option<SharedDecoder>> {
        // Every entry re-seeks, so a panicked holder leaves no cursor state behind.
        self.decoder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TiffContainer {
    fn drop(&mut self) {
        self.close();
    }
}

/// Walk the directory chain. The decoder starts positioned on page 0.
fn count_pages<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<u32> {
    let mut count = 1;
    while decoder.more_images() {
        decoder.next_image()?;
        count += 1;
    }
    Ok(count)
}

fn read_page_info<R: Read + Seek>(decoder: &mut Decoder<R>, page: u32) -> TiffResult<PageInfo> {
    let (width, height) = decoder.dimensions()?;
    let color_type = decoder.colortype()?;
    Ok(PageInfo {
        index: page,
        width,
        height,
        color_type: format!("{color_type:?}"),
    })
}

fn closed_error(page: u32) -> ConvertError {
    ConvertError::PageRead {
        page,
        reason: "container is closed".to_string(),
    }
}

fn page_read_error(page: u32, error: tiff::TiffError) -> ConvertError {
    ConvertError::PageRead {
        page,
        reason: error.to_string(),
    }
}
