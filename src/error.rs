//! # Error Types
//!
//! This module defines error types used throughout the grabado library.

use thiserror::Error;

use crate::engraver::SessionState;

/// Main error type for grabado operations
#[derive(Debug, Error)]
pub enum GrabadoError {
    /// The serial connection could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation was attempted on a disconnected session
    #[error("Not connected to an engraver")]
    NotConnected,

    /// An operation is not valid in the current session state
    #[error("Cannot {operation} while the session is {state}")]
    InvalidState {
        /// The operation that was attempted
        operation: &'static str,
        /// The session state at the time of the attempt
        state: SessionState,
    },

    /// The source image is unusable (zero-area or unreadable)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A raw upload payload has the wrong length
    #[error("Invalid payload size: expected {expected} bytes, got {actual}")]
    InvalidPayloadSize {
        /// The exact length the device firmware expects
        expected: usize,
        /// The length that was supplied
        actual: usize,
    },

    /// A write failed or the device disconnected mid-transmission.
    ///
    /// Carries the number of bytes successfully written before the failure
    /// so the caller can decide between retry-from-scratch and abort. The
    /// device cannot resume a partial bitmap transfer.
    #[error("Transmission failed after {sent} bytes: {reason}")]
    TransmissionFailed {
        /// Bytes successfully written before the failure
        sent: usize,
        /// Description of the underlying failure
        reason: String,
    },

    /// Waiting for the transmit buffer to drain exceeded the timeout
    #[error("Timed out waiting for the transmit buffer to drain")]
    TimedOut,

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
