//! # Engraver Session
//!
//! This module provides the [`Engraver`] façade: the single exclusive owner
//! of the device transport, combining command encoding, image conversion and
//! chunked transmission into the operation sequence a caller performs.
//!
//! ## Session States
//!
//! ```text
//!                  open
//! Disconnected ──────────► Idle ◄──────────────┐
//!      ▲                   │  ▲                │ reset()
//!      │ close()       erase() │ settle        │ (any connected state)
//!      │                   ▼  │ elapsed        │
//!      │                 Erasing               │
//!      │                                       │
//!      │                 Idle ── upload ──► Uploading ── all chunks ──► Ready
//!      │                   ▲                   │                         │
//!      │                   └─── failure ───────┘                  start()│
//!      │                                                                 ▼
//!      └──────────────     Paused ◄── pause() ── Engraving ◄── start() ──┘
//!                             └────── start() (resume) ──────►
//! ```
//!
//! Movement, preview, home and center are transient device motions, valid
//! from `Idle` or `Ready`; they do not change the session state.
//!
//! ## The Erase Window
//!
//! Erasing the EEPROM takes the device about six seconds. Uploading sooner
//! makes the firmware silently drop the leading bytes of the transmission,
//! so the session enforces the window: [`Engraver::erase`] sends the erase
//! frame and returns immediately, and an upload attempted before the settle
//! time has elapsed is rejected. [`Engraver::wait_for_erase`] blocks out the
//! remainder of the window for callers that just want to wait.
//!
//! ## Typical Sequence
//!
//! ```no_run
//! use grabado::Engraver;
//!
//! let img = image::open("logo.png")
//!     .map_err(|e| grabado::GrabadoError::InvalidImage(e.to_string()))?;
//!
//! let mut engraver = Engraver::open("/dev/ttyUSB0")?;
//! engraver.erase()?;
//! engraver.wait_for_erase()?;
//! engraver.upload_image(&img)?;
//! engraver.start(60)?;
//! # Ok::<(), grabado::GrabadoError>(())
//! ```

use std::fmt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use image::DynamicImage;

use crate::error::GrabadoError;
use crate::protocol::commands::Command;
use crate::render::bitmap::{self, MonoBitmap};
use crate::transport::{self, SerialTransport, Transport};

pub mod config;

pub use config::EngraverConfig;

// ============================================================================
// SESSION STATE
// ============================================================================

/// # Session State
///
/// The explicit state of an engraver session. Every operation validates the
/// current state and rejects invalid transitions with
/// [`GrabadoError::InvalidState`] rather than silently corrupting device
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Terminal: the transport is closed or lost; no commands are accepted
    Disconnected,
    /// Connected, no operation in progress
    Idle,
    /// An erase was issued; the EEPROM settle window may still be open
    Erasing,
    /// A bitmap upload is in progress
    Uploading,
    /// A bitmap is fully uploaded; the device can engrave it
    Ready,
    /// The device is engraving
    Engraving,
    /// Engraving is paused; resume with [`Engraver::start`]
    Paused,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Idle => "idle",
            SessionState::Erasing => "erasing",
            SessionState::Uploading => "uploading",
            SessionState::Ready => "ready",
            SessionState::Engraving => "engraving",
            SessionState::Paused => "paused",
        })
    }
}

// ============================================================================
// ENGRAVER SESSION
// ============================================================================

/// # Engraver Session
///
/// Owns the device transport exclusively for its lifetime and tracks the
/// session state. Exactly one outstanding command sequence at a time: the
/// underlying serial line cannot interleave independent command streams.
/// Callers needing non-blocking behavior should run the session on a
/// dedicated worker rather than share it across threads.
///
/// Dropping the session (or calling [`close`](Engraver::close)) releases
/// the transport deterministically on every exit path.
pub struct Engraver<T: Transport = SerialTransport> {
    transport: Option<T>,
    state: SessionState,
    config: EngraverConfig,
    erased_at: Option<Instant>,
}

impl Engraver<SerialTransport> {
    /// Open a session on the given serial device.
    ///
    /// ## Errors
    ///
    /// Returns [`GrabadoError::ConnectionFailed`] if the device cannot be
    /// opened or configured.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, GrabadoError> {
        let transport = SerialTransport::open(device)?;
        Ok(Self::new(transport))
    }

    /// List serial ports that may have an engraver attached.
    pub fn available_ports() -> Vec<String> {
        SerialTransport::list_available()
    }
}

impl<T: Transport> Engraver<T> {
    /// Create a session over an already-open transport, with the default
    /// [`EngraverConfig::NEJE_DK8`] configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EngraverConfig::default())
    }

    /// Create a session with an explicit device configuration.
    pub fn with_config(transport: T, config: EngraverConfig) -> Self {
        Self {
            transport: Some(transport),
            state: SessionState::Idle,
            config,
            erased_at: None,
        }
    }

    /// The current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The device configuration this session uses.
    pub fn config(&self) -> &EngraverConfig {
        &self.config
    }

    /// Close the session and release the transport.
    ///
    /// The session enters the terminal [`SessionState::Disconnected`] state;
    /// every subsequent operation fails with [`GrabadoError::NotConnected`].
    pub fn close(&mut self) {
        self.transport = None;
        self.erased_at = None;
        self.state = SessionState::Disconnected;
    }

    // ------------------------------------------------------------------
    // Device motion (transient, no state transition)
    // ------------------------------------------------------------------

    /// Move the head to the home position.
    pub fn home(&mut self) -> Result<(), GrabadoError> {
        self.motion("home", Command::Home)
    }

    /// Move the head to the center of the engraving area.
    pub fn center(&mut self) -> Result<(), GrabadoError> {
        self.motion("center", Command::Center)
    }

    /// Trace the outline of the loaded image without burning.
    pub fn preview(&mut self) -> Result<(), GrabadoError> {
        self.motion("preview", Command::Preview)
    }

    /// Nudge the head up.
    pub fn move_up(&mut self) -> Result<(), GrabadoError> {
        self.motion("move up", Command::MoveUp)
    }

    /// Nudge the head down.
    pub fn move_down(&mut self) -> Result<(), GrabadoError> {
        self.motion("move down", Command::MoveDown)
    }

    /// Nudge the head left.
    pub fn move_left(&mut self) -> Result<(), GrabadoError> {
        self.motion("move left", Command::MoveLeft)
    }

    /// Nudge the head right.
    pub fn move_right(&mut self) -> Result<(), GrabadoError> {
        self.motion("move right", Command::MoveRight)
    }

    // ------------------------------------------------------------------
    // Erase
    // ------------------------------------------------------------------

    /// Erase the EEPROM. Required before uploading a new image.
    ///
    /// Sends the erase frame, waits for it to leave the transmit queue and
    /// returns immediately with the settle duration the device needs before
    /// it reliably accepts new data. The session transitions to
    /// [`SessionState::Erasing`]; uploads attempted before the settle window
    /// has elapsed are rejected. Call [`wait_for_erase`](Self::wait_for_erase)
    /// to block out the window, or sleep the returned duration yourself.
    pub fn erase(&mut self) -> Result<Duration, GrabadoError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Disconnected => return Err(GrabadoError::NotConnected),
            state => {
                return Err(GrabadoError::InvalidState {
                    operation: "erase",
                    state,
                });
            }
        }

        let drain_timeout = self.config.drain_timeout();
        self.transmit(Command::Erase)?;
        self.transport_mut()?.await_drain(Some(drain_timeout))?;

        // The settle clock starts once the frame has left the host.
        self.state = SessionState::Erasing;
        self.erased_at = Some(Instant::now());
        Ok(self.config.erase_time())
    }

    /// Block until the erase settle window has elapsed.
    ///
    /// Sleeps out the remainder of the window (a no-op if it has already
    /// passed) and transitions the session back to [`SessionState::Idle`].
    pub fn wait_for_erase(&mut self) -> Result<(), GrabadoError> {
        match self.state {
            SessionState::Erasing => {}
            SessionState::Disconnected => return Err(GrabadoError::NotConnected),
            state => {
                return Err(GrabadoError::InvalidState {
                    operation: "wait for erase",
                    state,
                });
            }
        }

        if let Some(erased_at) = self.erased_at {
            let settle = self.config.erase_time();
            let elapsed = erased_at.elapsed();
            if elapsed < settle {
                thread::sleep(settle - elapsed);
            }
        }

        self.erased_at = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Convert an image and upload it to the EEPROM.
    ///
    /// Runs the full conversion pipeline (scale, monochromize, mirror,
    /// invert, pack), then uploads the packed bitmap. Conversion errors are
    /// detected before any I/O occurs.
    ///
    /// Returns the number of bytes sent to the device.
    pub fn upload_image(&mut self, image: &DynamicImage) -> Result<usize, GrabadoError> {
        let bitmap = bitmap::convert(image)?;
        self.upload_bitmap(&bitmap)
    }

    /// Upload an already-converted bitmap to the EEPROM.
    pub fn upload_bitmap(&mut self, bitmap: &MonoBitmap) -> Result<usize, GrabadoError> {
        self.upload_payload(bitmap.packed_bytes())
    }

    /// Upload a raw caller-supplied payload, bypassing conversion.
    ///
    /// The payload must be a device-layout packed bitmap of exactly
    /// 32,768 bytes; anything else fails with
    /// [`GrabadoError::InvalidPayloadSize`] before any I/O occurs.
    pub fn upload_packed(&mut self, payload: &[u8]) -> Result<usize, GrabadoError> {
        if payload.len() != self.config.packed_len {
            return Err(GrabadoError::InvalidPayloadSize {
                expected: self.config.packed_len,
                actual: payload.len(),
            });
        }
        self.upload_payload(payload)
    }

    fn upload_payload(&mut self, payload: &[u8]) -> Result<usize, GrabadoError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Erasing if self.erase_settled() => {
                // The settle window has elapsed; the erase is complete.
                self.erased_at = None;
            }
            SessionState::Disconnected => return Err(GrabadoError::NotConnected),
            state => {
                return Err(GrabadoError::InvalidState {
                    operation: "upload",
                    state,
                });
            }
        }

        self.state = SessionState::Uploading;
        let chunk_size = self.config.chunk_size;
        let chunk_delay = self.config.chunk_delay();
        let drain_timeout = self.config.drain_timeout();

        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => {
                self.state = SessionState::Disconnected;
                return Err(GrabadoError::NotConnected);
            }
        };

        let mut result = transport::send_chunked(transport, payload, chunk_size, chunk_delay);
        if let Ok(sent) = result {
            result = transport.await_drain(Some(drain_timeout)).map(|_| sent);
        }

        match result {
            Ok(sent) => {
                self.state = SessionState::Ready;
                Ok(sent)
            }
            Err(e) => {
                // The device has no concept of a partial image; a failed
                // upload leaves the session not-ready rather than ambiguous.
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Engraving control
    // ------------------------------------------------------------------

    /// Start the engraving pass, or resume a paused one.
    ///
    /// Commits `burn_time` (laser dwell time per engraved point; useful
    /// values are 1–240) for the pass, then begins. Valid from
    /// [`SessionState::Ready`] and [`SessionState::Paused`]; resuming does
    /// not require re-uploading the image.
    pub fn start(&mut self, burn_time: u8) -> Result<(), GrabadoError> {
        match self.state {
            SessionState::Ready | SessionState::Paused => {
                self.transmit(Command::Start(burn_time))?;
                self.state = SessionState::Engraving;
                Ok(())
            }
            SessionState::Disconnected => Err(GrabadoError::NotConnected),
            state => Err(GrabadoError::InvalidState {
                operation: "start",
                state,
            }),
        }
    }

    /// Pause the engraving process at the current location.
    pub fn pause(&mut self) -> Result<(), GrabadoError> {
        match self.state {
            SessionState::Engraving => {
                self.transmit(Command::Pause)?;
                self.state = SessionState::Paused;
                Ok(())
            }
            SessionState::Disconnected => Err(GrabadoError::NotConnected),
            state => Err(GrabadoError::InvalidState {
                operation: "pause",
                state,
            }),
        }
    }

    /// Reset the engraver and return the session to [`SessionState::Idle`].
    ///
    /// Valid from every connected state.
    pub fn reset(&mut self) -> Result<(), GrabadoError> {
        if self.state == SessionState::Disconnected {
            return Err(GrabadoError::NotConnected);
        }
        self.transmit(Command::Reset)?;
        self.erased_at = None;
        self.state = SessionState::Idle;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transport_mut(&mut self) -> Result<&mut T, GrabadoError> {
        self.transport.as_mut().ok_or(GrabadoError::NotConnected)
    }

    fn transmit(&mut self, command: Command) -> Result<(), GrabadoError> {
        let frame = command.encode();
        self.transport_mut()?.write_all(&frame)
    }

    fn motion(
        &mut self,
        operation: &'static str,
        command: Command,
    ) -> Result<(), GrabadoError> {
        match self.state {
            SessionState::Idle | SessionState::Ready => self.transmit(command),
            SessionState::Disconnected => Err(GrabadoError::NotConnected),
            state => Err(GrabadoError::InvalidState { operation, state }),
        }
    }

    fn erase_settled(&self) -> bool {
        self.erased_at
            .is_none_or(|t| t.elapsed() >= self.config.erase_time())
    }
}

// ============================================================================
// TESTS
// ============================================================================
