//! # Conversion Pipeline Tests
//!
//! These tests exercise the full image conversion pipeline against the
//! payload contract the device firmware enforces: every converted image
//! packs to exactly 32,768 bytes, polarity follows "engrave where dark",
//! and the packed layout round-trips unchanged through the raw-upload path.

use grabado::GrabadoError;
use grabado::render::bitmap::{self, BITMAP_HEIGHT, BITMAP_WIDTH, MonoBitmap, PACKED_LEN};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use pretty_assertions::assert_eq;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn solid_gray(width: u32, height: u32, luma: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([luma])))
}

/// A deterministic synthetic photo: smooth gradients with a dark block.
fn synthetic_photo(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width.max(1)) as u8;
        let g = ((y * 255) / height.max(1)) as u8;
        let b = if x < width / 4 && y < height / 4 { 0 } else { 200 };
        image::Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

// ============================================================================
// PAYLOAD CONTRACT
// ============================================================================

#[test]
fn converted_payload_is_always_32768_bytes() {
    let inputs = [
        solid_gray(1, 1, 0),
        solid_gray(17, 923, 128),
        solid_gray(512, 512, 200),
        solid_gray(2048, 64, 90),
        synthetic_photo(640, 480),
        synthetic_photo(33, 33),
    ];

    for input in &inputs {
        let bitmap = bitmap::convert(input).unwrap();
        assert_eq!(bitmap.packed_bytes().len(), PACKED_LEN);
        assert_eq!(PACKED_LEN, BITMAP_WIDTH * BITMAP_HEIGHT / 8);
    }
}

#[test]
fn zero_area_image_is_rejected() {
    for (w, h) in [(0u32, 0u32), (0, 100), (100, 0)] {
        let empty = DynamicImage::new_luma8(w, h);
        assert!(
            matches!(bitmap::convert(&empty), Err(GrabadoError::InvalidImage(_))),
            "{}x{} image must be rejected",
            w,
            h
        );
    }
}

#[test]
fn conversion_is_deterministic() {
    let input = synthetic_photo(800, 600);
    let first = bitmap::convert(&input).unwrap();
    let second = bitmap::convert(&input).unwrap();
    assert_eq!(first.packed_bytes(), second.packed_bytes());
}

// ============================================================================
// POLARITY
// ============================================================================

#[test]
fn white_image_yields_no_engrave_bits() {
    // White is "don't engrave": after threshold and invert, every bit is clear.
    let bitmap = bitmap::convert(&solid_gray(512, 512, 255)).unwrap();
    assert!(bitmap.packed_bytes().iter().all(|&b| b == 0x00));
}

#[test]
fn black_image_yields_all_engrave_bits() {
    let bitmap = bitmap::convert(&solid_gray(512, 512, 0)).unwrap();
    assert!(bitmap.packed_bytes().iter().all(|&b| b == 0xFF));
}

#[test]
fn colored_dark_pixels_engrave() {
    // A saturated dark blue is well below the luminance threshold.
    let img = RgbImage::from_pixel(512, 512, image::Rgb([0, 0, 120]));
    let bitmap = bitmap::convert(&DynamicImage::ImageRgb8(img)).unwrap();
    assert!(bitmap.packed_bytes().iter().all(|&b| b == 0xFF));
}

// ============================================================================
// ORIENTATION
// ============================================================================

#[test]
fn dark_left_edge_lands_on_bitmap_right_edge() {
    // 64 dark columns on the source's left edge. The scan head reads the
    // bitmap mirrored, so they must land on the bitmap's right edge.
    let mut img = GrayImage::from_pixel(512, 512, Luma([255u8]));
    for y in 0..512 {
        for x in 0..64 {
            img.put_pixel(x, y, Luma([0u8]));
        }
    }
    let bitmap = bitmap::convert(&DynamicImage::ImageLuma8(img)).unwrap();

    for y in [0usize, 100, 511] {
        assert!(bitmap.get(511, y), "right edge must be engraved at row {}", y);
        assert!(bitmap.get(460, y));
        assert!(!bitmap.get(0, y), "left edge must be clear at row {}", y);
        assert!(!bitmap.get(100, y));
    }
}

#[test]
fn rows_are_not_mirrored_vertically() {
    // 64 dark rows at the top must stay at the top: the mirror is
    // horizontal only.
    let mut img = GrayImage::from_pixel(512, 512, Luma([255u8]));
    for y in 0..64 {
        for x in 0..512 {
            img.put_pixel(x, y, Luma([0u8]));
        }
    }
    let bitmap = bitmap::convert(&DynamicImage::ImageLuma8(img)).unwrap();

    assert!(bitmap.get(256, 0));
    assert!(bitmap.get(256, 32));
    assert!(!bitmap.get(256, 256));
    assert!(!bitmap.get(256, 511));
}

// ============================================================================
// RAW PAYLOAD ROUND TRIP
// ============================================================================

#[test]
fn packed_payload_round_trips_unchanged() {
    let payload: Vec<u8> = (0..PACKED_LEN).map(|i| (i * 31 % 256) as u8).collect();
    let bitmap = MonoBitmap::from_packed(payload.clone()).unwrap();
    assert_eq!(bitmap.packed_bytes(), &payload[..]);
    assert_eq!(bitmap.into_packed(), payload);
}

#[test]
fn wrong_payload_lengths_are_rejected() {
    for len in [0usize, 512, PACKED_LEN - 1, PACKED_LEN + 1] {
        match MonoBitmap::from_packed(vec![0u8; len]) {
            Err(GrabadoError::InvalidPayloadSize { expected, actual }) => {
                assert_eq!(expected, PACKED_LEN);
                assert_eq!(actual, len);
            }
            other => panic!("length {} must be rejected, got {:?}", len, other),
        }
    }
}

#[test]
fn converted_bitmap_survives_pack_unpack() {
    let original = bitmap::convert(&synthetic_photo(300, 300)).unwrap();
    let reloaded = MonoBitmap::from_packed(original.packed_bytes().to_vec()).unwrap();
    assert_eq!(original, reloaded);
}

// ============================================================================
// PREVIEW RENDERING
// ============================================================================

#[test]
fn preview_image_matches_bitmap() {
    let bitmap = bitmap::convert(&synthetic_photo(640, 480)).unwrap();
    let preview = bitmap.to_image();

    assert_eq!(preview.dimensions(), (512, 512));
    for (x, y) in [(0u32, 0u32), (17, 400), (255, 256), (511, 511)] {
        let engraved = bitmap.get(x as usize, y as usize);
        let pixel = preview.get_pixel(x, y)[0];
        assert_eq!(pixel == 0, engraved, "mismatch at ({}, {})", x, y);
    }
}
