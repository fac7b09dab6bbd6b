//! # Monochrome Bitmap Conversion
//!
//! This module converts arbitrary raster images into the 512×512 packed
//! monochrome bitmap the engraver firmware expects, and provides the raw
//! byte layout for direct uploads.
//!
//! ## Conversion Pipeline
//!
//! The stages run in a fixed order — each stage feeds the next, and getting
//! the order wrong produces a mirrored or inverted engraving:
//!
//! ```text
//! input image
//!     │
//!     ▼
//! 1. Scale      resize_exact to 512×512 (stretch to fill, Lanczos3)
//!     │
//!     ▼
//! 2. Monochromize   luminance threshold: luma ≥ 128 → white
//!     │
//!     ▼
//! 3. Mirror     horizontal flip (scan head reads mirrored)
//!     │
//!     ▼
//! 4. Invert     engrave where the source was dark
//!     │
//!     ▼
//! 5. Pack       row-major, 8 px/byte, MSB first → 32,768 bytes
//! ```
//!
//! ## Bit Packing
//!
//! Pixels are packed row-major, 8 per byte, most-significant-bit first:
//!
//! ```text
//! Byte 0 of row 0:   bit 7 = pixel (0,0), bit 0 = pixel (7,0)
//! Byte 1 of row 0:   bit 7 = pixel (8,0), ...
//!
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0xAA = 10101010 = █░█░█░█░
//! ```
//!
//! A set bit means "engrave this pixel". After the invert stage, set bits
//! correspond to pixels that were dark in the source image.
//!
//! ## Threshold
//!
//! Monochromization uses the image crate's Rec.709 luminance (`to_luma8`)
//! against a fixed threshold of 128. The threshold affects engraving
//! density: lowering it engraves fewer midtone pixels, raising it more.

use image::{DynamicImage, GrayImage, imageops::FilterType};

use crate::error::GrabadoError;

/// Bitmap width in pixels, fixed by the device firmware
pub const BITMAP_WIDTH: usize = 512;

/// Bitmap height in pixels, fixed by the device firmware
pub const BITMAP_HEIGHT: usize = 512;

/// Packed payload length in bytes (512 × 512 / 8)
pub const PACKED_LEN: usize = BITMAP_WIDTH * BITMAP_HEIGHT / 8;

/// Luminance threshold for monochromization.
///
/// Pixels with luma ≥ this value count as white (not engraved).
pub const LUMA_THRESHOLD: u8 = 128;

// ============================================================================
// MONO BITMAP
// ============================================================================

/// # Packed Monochrome Bitmap
///
/// A fixed 512×512 grid of single-bit pixels in the device's native layout:
/// row-major, 8 pixels per byte, MSB first, exactly [`PACKED_LEN`] bytes.
/// A set bit means "engrave this pixel".
///
/// The payload invariant (length == [`PACKED_LEN`]) holds for every value of
/// this type — construction via [`from_packed`](MonoBitmap::from_packed)
/// validates it, and [`new`](MonoBitmap::new) starts all-clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    data: Vec<u8>,
}

impl MonoBitmap {
    /// Create an all-clear bitmap (no pixel engraved).
    pub fn new() -> Self {
        Self {
            data: vec![0u8; PACKED_LEN],
        }
    }

    /// Wrap a raw caller-supplied payload, bypassing conversion.
    ///
    /// This is the direct-upload path for callers that already hold a
    /// device-layout bitmap.
    ///
    /// ## Errors
    ///
    /// Fails with [`GrabadoError::InvalidPayloadSize`] if the payload is not
    /// exactly [`PACKED_LEN`] bytes.
    pub fn from_packed(data: Vec<u8>) -> Result<Self, GrabadoError> {
        if data.len() != PACKED_LEN {
            return Err(GrabadoError::InvalidPayloadSize {
                expected: PACKED_LEN,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    /// The packed byte payload, always exactly [`PACKED_LEN`] bytes.
    pub fn packed_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the bitmap and return the packed payload.
    pub fn into_packed(self) -> Vec<u8> {
        self.data
    }

    /// Whether the pixel at (x, y) is engraved.
    ///
    /// Coordinates are in device orientation (post-mirror).
    pub fn get(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < BITMAP_WIDTH && y < BITMAP_HEIGHT);
        let byte = y * (BITMAP_WIDTH / 8) + x / 8;
        let mask = 0x80u8 >> (x % 8);
        self.data[byte] & mask != 0
    }

    /// Set or clear the pixel at (x, y).
    pub fn set(&mut self, x: usize, y: usize, engrave: bool) {
        debug_assert!(x < BITMAP_WIDTH && y < BITMAP_HEIGHT);
        let byte = y * (BITMAP_WIDTH / 8) + x / 8;
        let mask = 0x80u8 >> (x % 8);
        if engrave {
            self.data[byte] |= mask;
        } else {
            self.data[byte] &= !mask;
        }
    }

    /// Render the bitmap as a grayscale image for inspection.
    ///
    /// Engraved pixels render black, clear pixels white. The image is in
    /// device orientation — the pixels shown are exactly the pixels the
    /// device will burn, mirror included.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(BITMAP_WIDTH as u32, BITMAP_HEIGHT as u32, |x, y| {
            if self.get(x as usize, y as usize) {
                image::Luma([0u8])
            } else {
                image::Luma([255u8])
            }
        })
    }
}

impl Default for MonoBitmap {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CONVERSION
// ============================================================================

/// Convert a raster image to a device-layout [`MonoBitmap`].
///
/// Applies the full pipeline: scale to 512×512 (stretch to fill), threshold
/// to monochrome, mirror horizontally, invert polarity, pack. The result is
/// deterministic for identical input.
///
/// ## Errors
///
/// Fails with [`GrabadoError::InvalidImage`] for zero-area images. Any
/// non-empty image converts successfully.
///
/// ## Example
///
/// ```no_run
/// use grabado::render::bitmap;
///
/// let img = image::open("logo.png").map_err(|e| {
///     grabado::GrabadoError::InvalidImage(e.to_string())
/// })?;
/// let bitmap = bitmap::convert(&img)?;
/// assert_eq!(bitmap.packed_bytes().len(), bitmap::PACKED_LEN);
/// # Ok::<(), grabado::GrabadoError>(())
/// ```
pub fn convert(image: &DynamicImage) -> Result<MonoBitmap, GrabadoError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(GrabadoError::InvalidImage(format!(
            "zero-area image ({}x{})",
            image.width(),
            image.height()
        )));
    }

    // Stage 1: scale. resize_exact stretches to fill rather than letterboxing.
    let resized = image.resize_exact(
        BITMAP_WIDTH as u32,
        BITMAP_HEIGHT as u32,
        FilterType::Lanczos3,
    );

    // Stage 2: monochromize via Rec.709 luminance.
    let gray = resized.to_luma8();

    let mut bitmap = MonoBitmap::new();
    for y in 0..BITMAP_HEIGHT {
        for x in 0..BITMAP_WIDTH {
            // Stage 3: mirror — bitmap column x samples source column 511-x.
            let luma = gray.get_pixel((BITMAP_WIDTH - 1 - x) as u32, y as u32)[0];
            let white = luma >= LUMA_THRESHOLD;
            // Stage 4: invert — engrave where the source was dark.
            // Stage 5: pack happens inside set().
            bitmap.set(x, y, !white);
        }
    }

    Ok(bitmap)
}

// ============================================================================
// TESTS
// ============================================================================
