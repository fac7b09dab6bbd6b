//! # Engraver Configuration
//!
//! This module defines hardware characteristics and timing constants for
//! supported engraver models.
//!
//! ## Supported Devices
//!
//! | Model | Bitmap | EEPROM payload | Erase settle |
//! |-------|--------|----------------|--------------|
//! | NEJE DK-8 family | 512×512 | 32,768 bytes | 6000 ms |
//!
//! ## Usage
//!
//! ```
//! use grabado::engraver::EngraverConfig;
//!
//! let config = EngraverConfig::NEJE_DK8;
//! println!("{}: erase settles in {} ms", config.name, config.erase_time_ms);
//! ```

use std::time::Duration;

use crate::render::bitmap::{BITMAP_HEIGHT, BITMAP_WIDTH, PACKED_LEN};

/// # Engraver Configuration
///
/// Device-specific constants: bitmap geometry, upload pacing and the erase
/// settle time. None of these are derived at runtime — they are a firmware
/// contract validated against real hardware.
///
/// ## Timing
///
/// - **erase_time_ms**: time the EEPROM needs after an erase command before
///   it reliably accepts new data. Uploading sooner makes the device
///   silently drop the leading bytes of the transmission.
/// - **chunk_size / chunk_delay_ms**: the receive buffer is small; payloads
///   are written in bounded chunks with a short pause between them.
/// - **drain_timeout_ms**: upper bound on waiting for the kernel transmit
///   queue to empty after an upload.
#[derive(Debug, Clone, Copy)]
pub struct EngraverConfig {
    /// Device model name
    pub name: &'static str,

    /// Bitmap width in pixels
    pub image_width: u32,

    /// Bitmap height in pixels
    pub image_height: u32,

    /// Packed upload payload length in bytes
    pub packed_len: usize,

    /// Maximum bytes per transport write during an upload
    pub chunk_size: usize,

    /// Pause between chunks (milliseconds)
    pub chunk_delay_ms: u64,

    /// EEPROM settle time after an erase command (milliseconds)
    pub erase_time_ms: u64,

    /// Timeout for draining the transmit queue after an upload (milliseconds)
    pub drain_timeout_ms: u64,
}

impl EngraverConfig {
    /// # NEJE DK-8 Family Configuration
    ///
    /// The classic 1K-EEPROM desktop engraver (DK-8-KZ and compatibles).
    ///
    /// ## Specifications
    ///
    /// | Property | Value |
    /// |----------|-------|
    /// | Engraving area | 512×512 points |
    /// | Upload payload | 32,768 bytes |
    /// | Serial line | 57600 8N1 |
    /// | Erase settle | 6000 ms |
    pub const NEJE_DK8: Self = Self {
        name: "NEJE DK-8",
        image_width: BITMAP_WIDTH as u32,
        image_height: BITMAP_HEIGHT as u32,
        packed_len: PACKED_LEN,
        chunk_size: 64,
        chunk_delay_ms: 2,
        erase_time_ms: 6000,
        drain_timeout_ms: 10_000,
    };

    /// Erase settle time as a [`Duration`]
    #[inline]
    pub fn erase_time(&self) -> Duration {
        Duration::from_millis(self.erase_time_ms)
    }

    /// Inter-chunk pause as a [`Duration`]
    #[inline]
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    /// Drain timeout as a [`Duration`]
    #[inline]
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for EngraverConfig {
    fn default() -> Self {
        Self::NEJE_DK8
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neje_dk8_geometry() {
        let config = EngraverConfig::NEJE_DK8;
        assert_eq!(config.image_width, 512);
        assert_eq!(config.image_height, 512);
        assert_eq!(
            config.packed_len,
            (config.image_width * config.image_height / 8) as usize
        );
    }

    #[test]
    fn test_neje_dk8_timing() {
        let config = EngraverConfig::NEJE_DK8;
        assert_eq!(config.erase_time(), Duration::from_secs(6));
        assert!(config.chunk_size > 0);
        assert!(config.drain_timeout() > config.chunk_delay());
    }

    #[test]
    fn test_default_is_neje_dk8() {
        let default = EngraverConfig::default();
        assert_eq!(default.name, EngraverConfig::NEJE_DK8.name);
    }
}
