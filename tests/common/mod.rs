//! Shared fixture builders.
//!
//! Multi-page TIFF files are synthesized with the `tiff` encoder so the
//! tests need no binary fixtures on disk.

#![allow(dead_code)]

use std::{fs, io::Cursor, path::Path};

use tiff::encoder::{TiffEncoder, colortype};

/// Page sizes used by most tests: five pages, not all the same size.
pub const FIVE_PAGES: [(u32, u32); 5] = [(24, 16), (16, 24), (32, 8), (8, 8), (20, 12)];

/// Deterministic RGB content that differs per page.
pub fn page_pixels(page: u32, width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 7 + page * 40) as u8);
            data.push((y * 5 + page * 3) as u8);
            data.push(((x + y) * 3 + page * 11) as u8);
        }
    }
    data
}

/// Encode RGB8 pages with the given sizes into an in-memory TIFF.
pub fn rgb_tiff_bytes(sizes: &[(u32, u32)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buffer).expect("Failed to create encoder");
        for (page, &(width, height)) in sizes.iter().enumerate() {
            let data = page_pixels(page as u32, width, height);
            encoder
                .write_image::<colortype::RGB8>(width, height, &data)
                .expect("Failed to write page");
        }
    }
    buffer.into_inner()
}

/// Write an RGB8 multi-page TIFF to `path`.
pub fn write_rgb_tiff(path: &Path, sizes: &[(u32, u32)]) {
    fs::write(path, rgb_tiff_bytes(sizes)).expect("Failed to write fixture");
}

/// Write a TIFF whose pages use different sample layouts:
/// gray8, gray16, RGBA8, RGB16.
pub fn write_mixed_tiff(path: &Path) {
    let (width, height) = (10, 6);
    let pixels = (width * height) as usize;
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buffer).expect("Failed to create encoder");

        let gray8: Vec<u8> = (0..pixels).map(|i| (i * 4) as u8).collect();
        encoder
            .write_image::<colortype::Gray8>(width, height, &gray8)
            .expect("Failed to write gray8 page");

        let gray16: Vec<u16> = (0..pixels).map(|i| (i * 1000) as u16).collect();
        encoder
            .write_image::<colortype::Gray16>(width, height, &gray16)
            .expect("Failed to write gray16 page");

        let rgba8: Vec<u8> = (0..pixels * 4).map(|i| (i % 251) as u8).collect();
        encoder
            .write_image::<colortype::RGBA8>(width, height, &rgba8)
            .expect("Failed to write rgba8 page");

        let rgb16: Vec<u16> = (0..pixels * 3).map(|i| (i * 300) as u16).collect();
        encoder
            .write_image::<colortype::RGB16>(width, height, &rgb16)
            .expect("Failed to write rgb16 page");
    }
    fs::write(path, buffer.into_inner()).expect("Failed to write fixture");
}

/// Write a five-page RGB TIFF whose page `corrupt_page` points its pixel
/// data past the end of the file. The directory chain stays intact, so
/// the container opens and only that page fails to decode.
pub fn write_tiff_with_corrupt_page(path: &Path, corrupt_page: usize) {
    let mut bytes = rgb_tiff_bytes(&FIVE_PAGES);
    point_strips_past_eof(&mut bytes, corrupt_page);
    fs::write(path, bytes).expect("Failed to write fixture");
}

const STRIP_OFFSETS: u16 = 273;
const FIELD_SHORT: u16 = 3;
const FIELD_LONG: u16 = 4;

struct Layout {
    big_endian: bool,
}

impl Layout {
    fn read_u16(&self, bytes: &[u8], at: usize) -> u16 {
        let raw = [bytes[at], bytes[at + 1]];
        if self.big_endian {
            u16::from_be_bytes(raw)
        } else {
            u16::from_le_bytes(raw)
        }
    }

    fn read_u32(&self, bytes: &[u8], at: usize) -> u32 {
        let raw = [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]];
        if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        }
    }

    fn write_u16(&self, bytes: &mut [u8], at: usize, value: u16) {
        let raw = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        bytes[at..at + 2].copy_from_slice(&raw);
    }

    fn write_u32(&self, bytes: &mut [u8], at: usize, value: u32) {
        let raw = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        bytes[at..at + 4].copy_from_slice(&raw);
    }
}

/// Rewrite the StripOffsets of directory `page` in a classic TIFF.
fn point_strips_past_eof(bytes: &mut [u8], page: usize) {
    let layout = match &bytes[..4] {
        b"II*\0" => Layout { big_endian: false },
        b"MM\0*" => Layout { big_endian: true },
        other => panic!("Not a classic TIFF header: {other:?}"),
    };

    let mut ifd = layout.read_u32(bytes, 4) as usize;
    for _ in 0..page {
        let entries = layout.read_u16(bytes, ifd) as usize;
        ifd = layout.read_u32(bytes, ifd + 2 + entries * 12) as usize;
        assert_ne!(ifd, 0, "Fixture has fewer than {} pages", page + 1);
    }

    let entries = layout.read_u16(bytes, ifd) as usize;
    for entry in 0..entries {
        let at = ifd + 2 + entry * 12;
        if layout.read_u16(bytes, at) != STRIP_OFFSETS {
            continue;
        }

        let field_type = layout.read_u16(bytes, at + 2);
        let count = layout.read_u32(bytes, at + 4) as usize;
        let width = match field_type {
            FIELD_SHORT => 2,
            FIELD_LONG => 4,
            other => panic!("Unexpected StripOffsets field type {other}"),
        };
        let values_at = if count * width <= 4 {
            at + 8
        } else {
            layout.read_u32(bytes, at + 8) as usize
        };

        for index in 0..count {
            let value_at = values_at + index * width;
            if field_type == FIELD_SHORT {
                layout.write_u16(bytes, value_at, u16::MAX - 16);
            } else {
                layout.write_u32(bytes, value_at, 0x7FFF_0000);
            }
        }
        return;
    }

    panic!("Directory {page} has no StripOffsets entry");
}

/// Sorted file names in `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .expect("Failed to read output directory")
        .map(|entry| {
            entry
                .expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// `00000.jpg` .. `{count-1:05}.jpg`.
pub fn expected_names(count: u32) -> Vec<String> {
    (0..count).map(|page| format!("{page:05}.jpg")).collect()
}
