//! # Image Conversion
//!
//! This module turns arbitrary raster images into the packed monochrome
//! bitmap the engraver firmware consumes.
//!
//! ## Module Structure
//!
//! - [`bitmap`]: The [`MonoBitmap`](bitmap::MonoBitmap) type, the conversion
//!   pipeline and the packed byte layout

pub mod bitmap;

pub use bitmap::{MonoBitmap, convert};
