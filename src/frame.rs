//! Decoded page frames.
//!
//! A [`PageFrame`] is a private, immutable copy of one page's samples taken
//! out of a [`TiffContainer`](crate::TiffContainer). Once extracted it needs
//! no synchronisation: color conversion and JPEG encoding run on the frame
//! alone, in parallel with other frames and with further extractions.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use image::{ExtendedColorType, RgbImage, codecs::jpeg::JpegEncoder};
use tiff::{ColorType, decoder::DecodingResult};

use crate::conversion::{ConversionFailure, samples_to_rgb};
use crate::error::ConvertError;

/// JPEG quality used for every page.
pub const JPEG_QUALITY: u8 = 75;

/// One decoded page, owned by the job that extracted it.
pub struct PageFrame {
    index: u32,
    width: u32,
    height: u32,
    color_type: ColorType,
    samples: DecodingResult,
}

impl Debug for PageFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PageFrame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color_type", &self.color_type)
            .finish_non_exhaustive()
    }
}

impl PageFrame {
    pub(crate) fn new(
        index: u32,
        width: u32,
        height: u32,
        color_type: ColorType,
        samples: DecodingResult,
    ) -> Self {
        Self {
            index,
            width,
            height,
            color_type,
            samples,
        }
    }

    /// Zero-based page index within the container.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Page width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Page height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sample layout of the source page.
    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// Convert the page to 8-bit truecolor.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnsupportedColorType`] for layouts without an
    /// RGB mapping and [`ConvertError::PageRead`] when the decoded buffer is
    /// shorter than the page dimensions require.
    pub fn to_rgb(&self) -> Result<RgbImage, ConvertError> {
        let buffer = samples_to_rgb(self.color_type, &self.samples, self.width, self.height)
            .map_err(|failure| match failure {
                ConversionFailure::Unsupported => ConvertError::UnsupportedColorType {
                    page: self.index,
                    color_type: format!("{:?}", self.color_type),
                },
                ConversionFailure::Truncated { expected, actual } => ConvertError::PageRead {
                    page: self.index,
                    reason: format!("expected {expected} samples, decoder returned {actual}"),
                },
            })?;

        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            ConvertError::PageRead {
                page: self.index,
                reason: "pixel buffer does not match page dimensions".to_string(),
            }
        })
    }

    /// Convert the page to RGB and encode it as a complete JPEG file in
    /// memory, at [`JPEG_QUALITY`].
    ///
    /// The output is deterministic: the same page always encodes to the
    /// same bytes.
    pub fn to_jpeg(&self) -> Result<Vec<u8>, ConvertError> {
        let rgb = self.to_rgb()?;

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|source| ConvertError::Encode {
                page: self.index,
                source,
            })?;

        Ok(encoded)
    }
}
