//! Sample-layout conversion to packed RGB8.
//!
//! TIFF pages store samples in many layouts. Everything is reduced to a
//! tightly-packed 3-channel buffer suitable for
//! [`image::RgbImage::from_raw`]. Alpha is discarded, 16-bit samples keep
//! their high byte, float samples are clamped to `0.0..=1.0`. Sub-byte gray
//! is stretched to the full 8-bit range and YCbCr uses the JFIF matrix.

use tiff::{ColorType, decoder::DecodingResult};

/// Why a page's samples could not be converted.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConversionFailure {
    /// The color type / sample format pair has no conversion.
    Unsupported,
    /// The decoder returned fewer samples than the dimensions require.
    Truncated { expected: usize, actual: usize },
}

/// Convert decoded samples to packed RGB8.
pub(crate) fn samples_to_rgb(
    color_type: ColorType,
    samples: &DecodingResult,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ConversionFailure> {
    let pixels = (width as usize) * (height as usize);

    match (color_type, samples) {
        (ColorType::Gray(bits @ (1 | 2 | 4)), DecodingResult::U8(data)) => {
            unpack_gray(data, bits, width, height)
        }
        (ColorType::Gray(8), DecodingResult::U8(data)) => pack(data, 1, pixels, |p| gray(p[0])),
        (ColorType::Gray(16), DecodingResult::U16(data)) => {
            pack(data, 1, pixels, |p| gray(high_byte(p[0])))
        }
        (ColorType::Gray(32), DecodingResult::F32(data)) => {
            pack(data, 1, pixels, |p| gray(unit_float(p[0])))
        }
        (ColorType::GrayA(8), DecodingResult::U8(data)) => pack(data, 2, pixels, |p| gray(p[0])),
        (ColorType::GrayA(16), DecodingResult::U16(data)) => {
            pack(data, 2, pixels, |p| gray(high_byte(p[0])))
        }
        (ColorType::RGB(8), DecodingResult::U8(data)) => {
            pack(data, 3, pixels, |p| [p[0], p[1], p[2]])
        }
        (ColorType::RGB(16), DecodingResult::U16(data)) => pack(data, 3, pixels, |p| {
            [high_byte(p[0]), high_byte(p[1]), high_byte(p[2])]
        }),
        (ColorType::RGB(32), DecodingResult::F32(data)) => pack(data, 3, pixels, |p| {
            [unit_float(p[0]), unit_float(p[1]), unit_float(p[2])]
        }),
        (ColorType::RGBA(8), DecodingResult::U8(data)) => {
            pack(data, 4, pixels, |p| [p[0], p[1], p[2]])
        }
        (ColorType::RGBA(16), DecodingResult::U16(data)) => pack(data, 4, pixels, |p| {
            [high_byte(p[0]), high_byte(p[1]), high_byte(p[2])]
        }),
        (ColorType::CMYK(8), DecodingResult::U8(data)) => {
            pack(data, 4, pixels, |p| cmyk(p[0], p[1], p[2], p[3]))
        }
        (ColorType::YCbCr(8), DecodingResult::U8(data)) => {
            pack(data, 3, pixels, |p| ycbcr(p[0], p[1], p[2]))
        }
        _ => Err(ConversionFailure::Unsupported),
    }
}

/// Walk `pixels` interleaved samples of `channels` each, mapping every
/// pixel through `to_rgb`.
fn pack<T>(
    samples: &[T],
    channels: usize,
    pixels: usize,
    to_rgb: impl Fn(&[T]) -> [u8; 3],
) -> Result<Vec<u8>, ConversionFailure> {
    let expected = pixels * channels;
    let samples = samples.get(..expected).ok_or(ConversionFailure::Truncated {
        expected,
        actual: samples.len(),
    })?;

    let mut buffer = Vec::with_capacity(pixels * 3);
    for pixel in samples.chunks_exact(channels) {
        buffer.extend_from_slice(&to_rgb(pixel));
    }
    Ok(buffer)
}

/// Expand 1, 2 or 4-bit gray rows (MSB first, each row padded to a whole
/// byte).
fn unpack_gray(
    data: &[u8],
    bits: u8,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ConversionFailure> {
    let bits = usize::from(bits);
    let width = width as usize;
    let height = height as usize;
    let row_bytes = (width * bits).div_ceil(8);
    let expected = row_bytes * height;
    if data.len() < expected {
        return Err(ConversionFailure::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let max = (1u16 << bits) - 1;
    let mut buffer = Vec::with_capacity(width * height * 3);
    for row in data[..expected].chunks_exact(row_bytes) {
        for x in 0..width {
            let offset = x * bits;
            let shift = 8 - bits - offset % 8;
            let sample = u16::from(row[offset / 8] >> shift) & max;
            buffer.extend_from_slice(&gray((sample * 255 / max) as u8));
        }
    }
    Ok(buffer)
}

fn gray(value: u8) -> [u8; 3] {
    [value; 3]
}

fn high_byte(value: u16) -> u8 {
    (value >> 8) as u8
}

fn unit_float(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn cmyk(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let ink = |channel: u8| {
        let white = 255 - u32::from(k);
        ((255 - u32::from(channel)) * white / 255) as u8
    };
    [ink(c), ink(m), ink(y)]
}

/// Full-range BT.601 (JFIF) in 16.16 fixed point.
fn ycbcr(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y = i32::from(y);
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    let scale = |value: i32| (value + (1 << 15)) >> 16;
    let channel = |value: i32| value.clamp(0, 255) as u8;
    [
        channel(y + scale(91_881 * cr)),
        channel(y + scale(-22_554 * cb - 46_802 * cr)),
        channel(y + scale(116_130 * cb)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray8_expands_to_three_channels() {
        let samples = DecodingResult::U8(vec![0, 128, 255, 7]);
        let rgb = samples_to_rgb(ColorType::Gray(8), &samples, 2, 2).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 128, 128, 128, 255, 255, 255, 7, 7, 7]);
    }

    #[test]
    fn rgba_drops_alpha() {
        let samples = DecodingResult::U8(vec![10, 20, 30, 0, 40, 50, 60, 255]);
        let rgb = samples_to_rgb(ColorType::RGBA(8), &samples, 2, 1).unwrap();
        assert_eq!(rgb, vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn sixteen_bit_keeps_high_byte() {
        let samples = DecodingResult::U16(vec![0xFFFF, 0x8000, 0x00FF]);
        let rgb = samples_to_rgb(ColorType::RGB(16), &samples, 1, 1).unwrap();
        assert_eq!(rgb, vec![0xFF, 0x80, 0x00]);
    }

    #[test]
    fn cmyk_black_and_white() {
        let samples = DecodingResult::U8(vec![0, 0, 0, 0, 0, 0, 0, 255]);
        let rgb = samples_to_rgb(ColorType::CMYK(8), &samples, 2, 1).unwrap();
        assert_eq!(rgb, vec![255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn float_samples_are_clamped() {
        let samples = DecodingResult::F32(vec![-1.0, 0.5, 2.0]);
        let rgb = samples_to_rgb(ColorType::Gray(32), &samples, 3, 1).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 128, 128, 128, 255, 255, 255]);
    }

    #[test]
    fn bilevel_rows_are_byte_padded() {
        // Width 3: each row uses the top three bits of one byte.
        let samples = DecodingResult::U8(vec![0b1010_0000, 0b0100_0000]);
        let rgb = samples_to_rgb(ColorType::Gray(1), &samples, 3, 2).unwrap();
        let values: Vec<u8> = rgb.chunks(3).map(|p| p[0]).collect();
        assert_eq!(values, vec![255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn sub_byte_gray_is_stretched() {
        let samples = DecodingResult::U8(vec![0b1101_1000]);
        let rgb = samples_to_rgb(ColorType::Gray(2), &samples, 4, 1).unwrap();
        let values: Vec<u8> = rgb.chunks(3).map(|p| p[0]).collect();
        assert_eq!(values, vec![255, 85, 170, 0]);

        // Width 3 at 4 bits spans two bytes per row.
        let samples = DecodingResult::U8(vec![0xF0, 0x80]);
        let rgb = samples_to_rgb(ColorType::Gray(4), &samples, 3, 1).unwrap();
        let values: Vec<u8> = rgb.chunks(3).map(|p| p[0]).collect();
        assert_eq!(values, vec![255, 0, 136]);
    }

    #[test]
    fn ycbcr_uses_jfif_matrix() {
        let samples = DecodingResult::U8(vec![128, 128, 128, 255, 128, 128, 0, 128, 128]);
        let rgb = samples_to_rgb(ColorType::YCbCr(8), &samples, 3, 1).unwrap();
        assert_eq!(rgb, vec![128, 128, 128, 255, 255, 255, 0, 0, 0]);

        // Pure red in JFIF YCbCr.
        let samples = DecodingResult::U8(vec![76, 85, 255]);
        let rgb = samples_to_rgb(ColorType::YCbCr(8), &samples, 1, 1).unwrap();
        assert!(rgb[0] >= 250 && rgb[1] <= 2 && rgb[2] <= 2, "got {rgb:?}");
    }

    #[test]
    fn short_buffer_is_truncated() {
        let samples = DecodingResult::U8(vec![1, 2, 3]);
        let failure = samples_to_rgb(ColorType::RGB(8), &samples, 2, 1).unwrap_err();
        assert_eq!(
            failure,
            ConversionFailure::Truncated {
                expected: 6,
                actual: 3
            }
        );
    }

    #[test]
    fn palette_is_unsupported() {
        let samples = DecodingResult::U8(vec![0; 4]);
        let failure = samples_to_rgb(ColorType::Palette(8), &samples, 2, 2).unwrap_err();
        assert_eq!(failure, ConversionFailure::Unsupported);
    }
}
