//! Configuration module for leadscrew-motion.
//!
//! Provides types for loading and validating machine parameters from TOML
//! files (with `std` feature) or pre-parsed data.

#[cfg(feature = "std")]
mod loader;
mod machine;
pub mod units;
mod validation;

pub use machine::{ControlConfig, EncoderConfig, JogConfig, JogFactor, MachineConfig, StepperConfig};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{HundredthMm, Rpm};
