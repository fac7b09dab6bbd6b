//! # Serial Port Transport
//!
//! This module provides communication with NEJE-class engravers over a
//! POSIX serial device (typically a USB-to-serial adapter).
//!
//! ## Line Settings
//!
//! The engraver speaks 57600 baud, 8 data bits, no parity, one stop bit.
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary payloads pass through
//! unmodified:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//!
//! Note: IXON/IXOFF/IXANY disable XON/XOFF software flow control. This is
//! critical because 0x11 (XON/DC1) and 0x13 (XOFF/DC3) can appear in packed
//! bitmap data.
//!
//! ## Drain Semantics
//!
//! [`SerialTransport::await_drain`] reports when the kernel's transmit
//! queue for the port is empty, i.e. every byte has been handed to the
//! device. The engraver firmware gives no acknowledgement, so queue
//! emptiness is the only completion signal available to the host.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::GrabadoError;
use crate::transport::Transport;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Interval between transmit-queue polls while draining (milliseconds)
const DRAIN_POLL_MS: u64 = 10;

/// # Serial Engraver Transport
///
/// Manages a raw-mode connection to an engraver over a serial device.
///
/// ## Example
///
/// ```no_run
/// use grabado::transport::serial::SerialTransport;
/// use grabado::transport::Transport;
/// use grabado::protocol::commands::Command;
///
/// let mut transport = SerialTransport::open("/dev/ttyUSB0")?;
/// transport.write_all(&Command::Home.encode())?;
///
/// # Ok::<(), grabado::GrabadoError>(())
/// ```
pub struct SerialTransport {
    file: File,
}

impl SerialTransport {
    /// Open a serial connection to the engraver.
    ///
    /// ## Parameters
    ///
    /// - `device`: Path to the serial device (e.g., "/dev/ttyUSB0")
    ///
    /// ## Errors
    ///
    /// Returns [`GrabadoError::ConnectionFailed`] if:
    /// - The device doesn't exist
    /// - Permission denied (may need the dialout group)
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, GrabadoError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                GrabadoError::ConnectionFailed(format!("Failed to open {}: {}", path.display(), e))
            })?;

        #[cfg(unix)]
        configure_serial_raw(file.as_raw_fd())?;

        Ok(Self { file })
    }

    /// Open with the default device path (/dev/ttyUSB0)
    pub fn open_default() -> Result<Self, GrabadoError> {
        Self::open(DEFAULT_DEVICE)
    }

    /// List serial devices that may have an engraver attached.
    ///
    /// Scans `/dev` for USB serial device nodes (`ttyUSB*`, `ttyACM*`).
    /// Returns full device paths, sorted.
    #[cfg(unix)]
    pub fn list_available() -> Vec<String> {
        let mut ports: Vec<String> = fs::read_dir("/dev")
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter_map(|entry| entry.file_name().into_string().ok())
                    .filter(|name| is_serial_port_name(name))
                    .map(|name| format!("/dev/{}", name))
                    .collect()
            })
            .unwrap_or_default();
        ports.sort();
        ports
    }

    #[cfg(not(unix))]
    pub fn list_available() -> Vec<String> {
        Vec::new()
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), GrabadoError> {
        self.file.write_all(data)?;
        Ok(())
    }

    #[cfg(unix)]
    fn await_drain(&mut self, timeout: Option<Duration>) -> Result<(), GrabadoError> {
        self.file.flush()?;
        let fd = self.file.as_raw_fd();

        let Some(limit) = timeout else {
            // No deadline: let the kernel block until the queue is flushed.
            let result = unsafe { libc::tcdrain(fd) };
            if result != 0 {
                return Err(GrabadoError::Io(io::Error::last_os_error()));
            }
            return Ok(());
        };

        // With a deadline: poll the transmit-queue byte count.
        let deadline = Instant::now() + limit;
        loop {
            let mut pending: libc::c_int = 0;
            let result = unsafe { libc::ioctl(fd, libc::TIOCOUTQ, &mut pending) };
            if result != 0 {
                return Err(GrabadoError::Io(io::Error::last_os_error()));
            }
            if pending == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(GrabadoError::TimedOut);
            }
            thread::sleep(Duration::from_millis(DRAIN_POLL_MS));
        }
    }

    #[cfg(not(unix))]
    fn await_drain(&mut self, _timeout: Option<Duration>) -> Result<(), GrabadoError> {
        self.file.flush()?;
        Ok(())
    }
}

/// Whether a `/dev` entry name looks like a USB serial port.
fn is_serial_port_name(name: &str) -> bool {
    name.starts_with("ttyUSB") || name.starts_with("ttyACM")
}

/// Configure a file descriptor for raw serial communication at 57600 8N1.
///
/// This disables all input/output processing so binary data passes through
/// unmodified, and sets the line speed the engraver firmware expects.
///
/// ## What Gets Disabled
///
/// - **Input flags**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR, ICRNL, IXON, IXOFF, IXANY
/// - **Output flags**: OPOST
/// - **Local flags**: ECHO, ECHONL, ICANON, ISIG, IEXTEN
/// - **Control flags**: CSIZE, PARENB (then CS8 is set)
#[cfg(unix)]
fn configure_serial_raw(fd: i32) -> Result<(), GrabadoError> {
    use std::mem::MaybeUninit;

    // Get current terminal attributes
    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(GrabadoError::ConnectionFailed(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    // Input flags: disable all processing
    // IXON/IXOFF/IXANY: disable XON/XOFF flow control (0x11/0x13 appear in bitmap data)
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    // Output flags: disable post-processing
    termios.c_oflag &= !libc::OPOST;

    // Local flags: disable echo, canonical mode, signals
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    // Control flags: 8-bit characters, no parity, one stop bit
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    termios.c_cflag |= libc::CS8;

    // Non-blocking reads; the engraver never sends anything back
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 0;

    // Line speed: 57600 baud in both directions
    let result = unsafe { libc::cfsetspeed(&mut termios, libc::B57600) };
    if result != 0 {
        return Err(GrabadoError::ConnectionFailed(format!(
            "cfsetspeed failed: {}",
            io::Error::last_os_error()
        )));
    }

    // Apply settings immediately
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(GrabadoError::ConnectionFailed(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_path() {
        assert_eq!(DEFAULT_DEVICE, "/dev/ttyUSB0");
    }

    #[test]
    fn test_serial_port_names() {
        assert!(is_serial_port_name("ttyUSB0"));
        assert!(is_serial_port_name("ttyUSB12"));
        assert!(is_serial_port_name("ttyACM0"));
    }

    #[test]
    fn test_non_serial_port_names() {
        assert!(!is_serial_port_name("tty0")); // virtual console
        assert!(!is_serial_port_name("ttyS0")); // legacy UART, engravers ship USB adapters
        assert!(!is_serial_port_name("null"));
        assert!(!is_serial_port_name("urandom"));
        assert!(!is_serial_port_name(""));
    }

    #[test]
    fn test_list_available_does_not_panic() {
        // Contents depend on the host; the scan itself must always succeed.
        let ports = SerialTransport::list_available();
        assert!(ports.iter().all(|p| p.starts_with("/dev/")));
    }

    // Note: Open/write/drain tests require actual hardware.
    // Integration tests should be run manually with a connected engraver.
}
