//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::machine::{JogFactor, MachineConfig};

/// Validate a machine configuration.
///
/// Checks:
/// - Encoder resolution and counter width are in range
/// - Stepper resolution and buffered-step limit are positive
/// - Tick rate and RPM sample interval are positive
/// - Jog factors have non-zero terms
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    if config.encoder.resolution == 0 {
        return Err(Error::Config(ConfigError::InvalidEncoderResolution(
            config.encoder.resolution,
        )));
    }

    if !(8..=32).contains(&config.encoder.counter_bits) {
        return Err(Error::Config(ConfigError::InvalidCounterBits(
            config.encoder.counter_bits,
        )));
    }

    if config.stepper.resolution == 0 {
        return Err(Error::Config(ConfigError::InvalidStepperResolution(
            config.stepper.resolution,
        )));
    }

    if config.stepper.leadscrew_tpi == 0 {
        return Err(Error::Config(ConfigError::InvalidLeadscrewTpi(
            config.stepper.leadscrew_tpi,
        )));
    }

    if config.stepper.max_buffered_steps == 0 {
        return Err(Error::Config(ConfigError::InvalidMaxBufferedSteps(
            config.stepper.max_buffered_steps,
        )));
    }

    if config.control.tick_hz == 0 {
        return Err(Error::Config(ConfigError::InvalidTickRate(
            config.control.tick_hz,
        )));
    }

    if config.control.rpm_sample_ticks == 0 {
        return Err(Error::Config(ConfigError::InvalidRpmSampleTicks(
            config.control.rpm_sample_ticks,
        )));
    }

    for factor in [config.jog.slow, config.jog.medium, config.jog.fast] {
        validate_jog_factor(&factor)?;
    }

    Ok(())
}

fn validate_jog_factor(factor: &JogFactor) -> Result<()> {
    if factor.numerator == 0 || factor.denominator == 0 {
        return Err(Error::Config(ConfigError::InvalidJogFactor {
            numerator: factor.numerator,
            denominator: factor.denominator,
        }));
    }
    Ok(())
}
