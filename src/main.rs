//! # Grabado CLI
//!
//! Command-line interface for NEJE-class laser engravers.
//!
//! ## Usage
//!
//! ```bash
//! # List serial ports that may have an engraver attached
//! grabado list
//!
//! # Erase, upload and engrave an image
//! grabado engrave photo.png --burn-time 60
//!
//! # Upload without starting the pass
//! grabado engrave photo.png --no-start
//!
//! # Inspect the converted bitmap without a device
//! grabado preview-png photo.png out.png
//!
//! # Move the head
//! grabado move up
//! grabado home
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use grabado::{
    Command, Engraver, GrabadoError,
    render::bitmap,
    transport::{SerialTransport, Transport, serial::DEFAULT_DEVICE},
};

/// Grabado - Laser engraver utility
#[derive(Parser, Debug)]
#[command(name = "grabado")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List serial ports that may have an engraver attached
    List,

    /// Erase the EEPROM, upload an image and start engraving
    Engrave {
        /// Image file to engrave
        image: PathBuf,

        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// Laser dwell time per engraved point (useful range 1-240)
        #[arg(long, default_value = "60")]
        burn_time: u8,

        /// Upload only; don't start the engraving pass
        #[arg(long)]
        no_start: bool,
    },

    /// Erase the EEPROM and upload a raw 32768-byte packed bitmap
    UploadRaw {
        /// File holding the packed bitmap payload
        file: PathBuf,

        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },

    /// Convert an image and save the resulting bitmap as a PNG (no device needed)
    PreviewPng {
        /// Image file to convert
        image: PathBuf,

        /// Output PNG path
        out: PathBuf,
    },

    /// Move the head to the home position
    Home {
        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },

    /// Move the head to the center of the engraving area
    Center {
        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },

    /// Trace the outline of the loaded image without burning
    Preview {
        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },

    /// Nudge the head one step
    Move {
        /// Direction to move
        direction: Direction,

        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },

    /// Start (or resume) an engraving pass on a previously uploaded image
    Start {
        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// Laser dwell time per engraved point (useful range 1-240)
        #[arg(long, default_value = "60")]
        burn_time: u8,
    },

    /// Pause the running engraving pass
    Pause {
        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },

    /// Reset the engraver
    Reset {
        /// Engraver device path
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), GrabadoError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            let ports = Engraver::available_ports();
            if ports.is_empty() {
                println!("No serial ports found.");
            } else {
                for port in ports {
                    println!("{}", port);
                }
            }
            Ok(())
        }

        Commands::Engrave {
            image,
            device,
            burn_time,
            no_start,
        } => {
            let img = image::open(&image)
                .map_err(|e| GrabadoError::InvalidImage(format!("{}: {}", image.display(), e)))?;

            let mut engraver = Engraver::open(&device)?;

            eprintln!("Erasing EEPROM...");
            let settle = engraver.erase()?;
            eprintln!("Waiting {} ms for the erase to settle...", settle.as_millis());
            engraver.wait_for_erase()?;

            eprintln!("Uploading image...");
            let sent = engraver.upload_image(&img)?;
            eprintln!("Uploaded {} bytes.", sent);

            if no_start {
                eprintln!("Upload complete; not starting (per --no-start).");
            } else {
                engraver.start(burn_time)?;
                eprintln!("Engraving started with burn time {}.", burn_time);
            }
            Ok(())
        }

        Commands::UploadRaw { file, device } => {
            let payload = fs::read(&file)?;

            let mut engraver = Engraver::open(&device)?;

            eprintln!("Erasing EEPROM...");
            let settle = engraver.erase()?;
            eprintln!("Waiting {} ms for the erase to settle...", settle.as_millis());
            engraver.wait_for_erase()?;

            eprintln!("Uploading raw payload...");
            let sent = engraver.upload_packed(&payload)?;
            eprintln!("Uploaded {} bytes.", sent);
            Ok(())
        }

        Commands::PreviewPng { image, out } => {
            let img = image::open(&image)
                .map_err(|e| GrabadoError::InvalidImage(format!("{}: {}", image.display(), e)))?;

            let converted = bitmap::convert(&img)?;
            converted
                .to_image()
                .save(&out)
                .map_err(|e| GrabadoError::InvalidImage(format!("{}: {}", out.display(), e)))?;

            eprintln!(
                "Saved device bitmap ({}x{}, mirror included) to {}.",
                bitmap::BITMAP_WIDTH,
                bitmap::BITMAP_HEIGHT,
                out.display()
            );
            Ok(())
        }

        Commands::Home { device } => Engraver::open(&device)?.home(),
        Commands::Center { device } => Engraver::open(&device)?.center(),
        Commands::Preview { device } => Engraver::open(&device)?.preview(),

        Commands::Move { direction, device } => {
            let mut engraver = Engraver::open(&device)?;
            match direction {
                Direction::Up => engraver.move_up(),
                Direction::Down => engraver.move_down(),
                Direction::Left => engraver.move_left(),
                Direction::Right => engraver.move_right(),
            }
        }

        // Start and pause act on an engraving set up by an earlier
        // invocation, which this process cannot observe; they go through the
        // raw transport, trusting the operator on the device's state.
        Commands::Start { device, burn_time } => {
            send_raw(&device, Command::Start(burn_time))?;
            eprintln!("Start sent with burn time {}.", burn_time);
            Ok(())
        }

        Commands::Pause { device } => {
            send_raw(&device, Command::Pause)?;
            eprintln!("Pause sent.");
            Ok(())
        }

        Commands::Reset { device } => Engraver::open(&device)?.reset(),
    }
}

/// Write a single command frame outside a session state machine.
fn send_raw(device: &str, command: Command) -> Result<(), GrabadoError> {
    let mut transport = SerialTransport::open(device)?;
    transport.write_all(&command.encode())?;
    transport.await_drain(None)
}
