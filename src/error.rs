//! Error types for the leadscrew-motion library.
//!
//! Provides unified error handling across configuration and the stepper
//! drive fault path. Nothing in the real-time tick is retried: an operation
//! either completes or leaves the system in the defined fault state.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all leadscrew-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Stepper drive error
    Drive(DriveError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid encoder resolution (must be > 0)
    InvalidEncoderResolution(u32),
    /// Invalid encoder counter width (must be 8-32 bits)
    InvalidCounterBits(u8),
    /// Invalid stepper resolution (must be > 0)
    InvalidStepperResolution(u32),
    /// Invalid leadscrew pitch (must be > 0)
    InvalidLeadscrewTpi(u32),
    /// Invalid buffered-step limit (must be > 0)
    InvalidMaxBufferedSteps(u32),
    /// Invalid tick rate (must be > 0)
    InvalidTickRate(u32),
    /// Invalid RPM sample interval (must be > 0)
    InvalidRpmSampleTicks(u32),
    /// Invalid jog factor (numerator and denominator must be > 0)
    InvalidJogFactor {
        /// Factor numerator
        numerator: u64,
        /// Factor denominator
        denominator: u64,
    },
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Stepper drive errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveError {
    /// Commanded steps outran the motor: desired/current divergence exceeded
    /// the buffered-step limit. The drive has disabled itself; recovery
    /// requires an explicit power-cycle.
    StepBacklog {
        /// Desired position at the moment of the fault
        desired: i64,
        /// Current position at the moment of the fault
        current: i64,
        /// Configured buffered-step limit
        limit: u32,
    },
    /// A signal pin operation failed
    PinError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Drive(e) => write!(f, "Drive error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidEncoderResolution(v) => {
                write!(f, "Invalid encoder resolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidCounterBits(v) => {
                write!(f, "Invalid counter width: {} bits. Must be 8-32", v)
            }
            ConfigError::InvalidStepperResolution(v) => {
                write!(f, "Invalid stepper resolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidLeadscrewTpi(v) => {
                write!(f, "Invalid leadscrew pitch: {} TPI. Must be > 0", v)
            }
            ConfigError::InvalidMaxBufferedSteps(v) => {
                write!(f, "Invalid buffered-step limit: {}. Must be > 0", v)
            }
            ConfigError::InvalidTickRate(v) => {
                write!(f, "Invalid tick rate: {} Hz. Must be > 0", v)
            }
            ConfigError::InvalidRpmSampleTicks(v) => {
                write!(f, "Invalid RPM sample interval: {} ticks. Must be > 0", v)
            }
            ConfigError::InvalidJogFactor {
                numerator,
                denominator,
            } => {
                write!(
                    f,
                    "Invalid jog factor {}/{}. Both terms must be > 0",
                    numerator, denominator
                )
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveError::StepBacklog {
                desired,
                current,
                limit,
            } => {
                write!(
                    f,
                    "Step backlog: desired {} vs current {} exceeds limit {}",
                    desired, current, limit
                )
            }
            DriveError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DriveError> for Error {
    fn from(e: DriveError) -> Self {
        Error::Drive(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for DriveError {}
