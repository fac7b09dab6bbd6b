//! # Grabado - Laser Engraver Driver Library
//!
//! Grabado is a Rust library for driving NEJE-class laser engravers over a
//! serial connection. It provides:
//!
//! - **Protocol implementation**: the engraver command set and its byte encoding
//! - **Image conversion**: scale → monochromize → mirror → invert → pack,
//!   producing the 512×512 packed bitmap the firmware expects
//! - **Chunked transmission**: flow-controlled uploads that respect the
//!   device's receive buffer and EEPROM erase latency
//! - **Session management**: an explicit state machine over the serial transport
//!
//! ## Quick Start
//!
//! ```no_run
//! use grabado::Engraver;
//!
//! // Open a session on the engraver's serial port
//! let mut engraver = Engraver::open("/dev/ttyUSB0")?;
//!
//! // Load the image to engrave
//! let img = image::open("logo.png")
//!     .map_err(|e| grabado::GrabadoError::InvalidImage(e.to_string()))?;
//!
//! // Erase the EEPROM and wait out the settle window
//! engraver.erase()?;
//! engraver.wait_for_erase()?;
//!
//! // Upload the converted bitmap, then start the pass
//! let sent = engraver.upload_image(&img)?;
//! println!("uploaded {} bytes", sent);
//! engraver.start(60)?;
//!
//! # Ok::<(), grabado::GrabadoError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Engraver command set and byte encoding |
//! | [`render`] | Image to monochrome bitmap conversion |
//! | [`transport`] | Serial transport and chunked transmission |
//! | [`engraver`] | Session state machine and device façade |
//! | [`error`] | Error types |
//!
//! ## Supported Devices
//!
//! Currently validated against the NEJE DK-8 family (512×512 point area,
//! 57600 baud serial). Other engravers speaking the same EEPROM upload
//! protocol should work with appropriate configuration adjustments.

pub mod engraver;
pub mod error;
pub mod protocol;
pub mod render;
pub mod transport;

// Re-exports for convenience
pub use engraver::{Engraver, EngraverConfig, SessionState};
pub use error::GrabadoError;
pub use protocol::Command;
pub use render::MonoBitmap;
pub use transport::{SerialTransport, Transport};
