//! # leadscrew-motion
//!
//! Motion-control core for an electronic leadscrew: a digital replacement
//! for a lathe's change-gear train that keeps a stepper-driven carriage
//! synchronized to spindle rotation according to a selectable feed rate or
//! thread pitch, with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Exact gearing**: ratios are integer fractions end to end; no
//!   floating-point drift over long cuts
//! - **embedded-hal 1.0**: `OutputPin` for STEP/DIR/ENABLE, `InputPin` for
//!   the driver alarm; a `PositionCounter` trait for the spindle encoder
//! - **no_std compatible**: the tick path allocates nothing and never blocks
//! - **Wrap-safe**: encoder counter wraparound is corrected every tick
//! - **Overrun protection**: a buffered-step limit disables the drive before
//!   commanded motion can outrun the motor
//! - **Configuration-driven**: machine parameters load from TOML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leadscrew_motion::{
//!     DriveOptions, Encoder, MachineConfig, StepperDrive, SyncController,
//! };
//!
//! // Load machine parameters from TOML
//! let config: MachineConfig = leadscrew_motion::load_config("machine.toml")?;
//!
//! // Wire up the hardware capabilities
//! let encoder = Encoder::new(qep_counter, config.encoder.resolution, 4);
//! let stepper = StepperDrive::new(step_pin, dir_pin, enable_pin, alarm_pin,
//!     DriveOptions::from(&config.stepper));
//! let mut core = SyncController::new(encoder, stepper, &config)?;
//!
//! // From the fixed-period timer interrupt:
//! core.tick()?;
//! ```
//!
//! ## Execution contexts
//!
//! Two contexts share the controller, neither ever blocks: a fixed-period
//! interrupt runs [`SyncController::tick`], and a slower cooperative loop
//! runs [`panel::UserInterface::poll`]. On a single core the caller wraps
//! the controller in its platform's critical-section primitive (or masks
//! the tick interrupt around multi-field command sequences).
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod carriage;
pub mod config;
pub mod encoder;
pub mod error;
pub mod panel;
pub mod ratio;
pub mod stepper;
pub mod sync;
pub mod tables;

// Re-exports for ergonomic API
pub use config::MachineConfig;
pub use encoder::{Encoder, PositionCounter};
pub use error::{ConfigError, DriveError, Error, Result};
pub use panel::{DisplayFrame, KeySnapshot, LedState, Message, UserInterface};
pub use ratio::RationalRatio;
pub use stepper::{DriveOptions, NoAlarm, SignalState, StepperDrive};
pub use sync::{Direction, JogSpeed, SyncController};
pub use tables::{FeedTable, FeedTableEntry, FeedTableFactory, Gearing, Mode, Units};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::load_config;

// Unit types
pub use config::units::{HundredthMm, Rpm};
