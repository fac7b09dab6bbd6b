//! # Engraver Transport Layer
//!
//! This module provides the byte-transport capability the engraver session
//! consumes, plus the chunked transmission engine that paces uploads.
//!
//! ## Available Transports
//!
//! - [`serial`]: POSIX serial device (USB-to-serial adapters, `/dev/ttyUSB*`)
//!
//! ## Chunked Transmission
//!
//! Writing the full 32 KB bitmap payload in one operation overruns the
//! device's receive buffer and corrupts the stored image. [`send_chunked`]
//! splits a payload into bounded chunks, writes them in order and paces the
//! writes with a small delay so the firmware can keep up.

use std::thread;
use std::time::Duration;

use crate::error::GrabadoError;

pub mod serial;

pub use serial::SerialTransport;

/// # Byte Transport
///
/// A blocking, write-only byte channel to the device. The engraver session
/// owns exactly one transport for its lifetime; components borrow it only
/// for the duration of a call.
pub trait Transport {
    /// Write the entire buffer to the device.
    fn write_all(&mut self, data: &[u8]) -> Result<(), GrabadoError>;

    /// Block until the transmit buffer is fully handed to the device.
    ///
    /// With a timeout, fails with [`GrabadoError::TimedOut`] if the buffer
    /// has not drained in time. With `None`, blocks until drained.
    fn await_drain(&mut self, timeout: Option<Duration>) -> Result<(), GrabadoError>;
}

/// Deliver a payload to the transport in bounded chunks.
///
/// Splits `payload` into chunks of at most `chunk_size` bytes (the last
/// chunk may be shorter), writes each chunk in order and sleeps for
/// `chunk_delay` between chunks. Chunk boundaries never lose or reorder
/// bytes: the concatenation of all chunks reproduces the payload exactly.
///
/// Returns the total number of bytes written, which equals the payload
/// length on success.
///
/// ## Errors
///
/// A failed write aborts the transmission and reports
/// [`GrabadoError::TransmissionFailed`] carrying the number of bytes
/// successfully written so far. There is no automatic retry — re-sending a
/// prefix the device already consumed would corrupt the stored bitmap, so
/// retries are the caller's decision and must restart the full payload.
pub fn send_chunked(
    transport: &mut dyn Transport,
    payload: &[u8],
    chunk_size: usize,
    chunk_delay: Duration,
) -> Result<usize, GrabadoError> {
    debug_assert!(chunk_size > 0, "chunk size must be positive");

    let mut sent = 0usize;
    for chunk in payload.chunks(chunk_size) {
        transport
            .write_all(chunk)
            .map_err(|e| GrabadoError::TransmissionFailed {
                sent,
                reason: e.to_string(),
            })?;
        sent += chunk.len();

        if !chunk_delay.is_zero() {
            thread::sleep(chunk_delay);
        }
    }

    Ok(sent)
}

// ============================================================================
// TESTS
// ============================================================================
