//! Machine configuration - root configuration structure.
//!
//! Machine parameters are data, validated at load time, so one binary can
//! serve different encoder/stepper/leadscrew combinations.

use heapless::String;
use serde::Deserialize;

use crate::ratio::RationalRatio;
use crate::tables::Units;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    /// Machine name for logging/debugging.
    #[serde(default = "default_name")]
    pub name: String<32>,

    /// Spindle encoder parameters.
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Stepper drive parameters.
    #[serde(default)]
    pub stepper: StepperConfig,

    /// Real-time control parameters.
    #[serde(default)]
    pub control: ControlConfig,

    /// Jog speed presets.
    #[serde(default)]
    pub jog: JogConfig,
}

fn default_name() -> String<32> {
    String::try_from("lathe").unwrap_or_default()
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            encoder: EncoderConfig::default(),
            stepper: StepperConfig::default(),
            control: ControlConfig::default(),
            jog: JogConfig::default(),
        }
    }
}

/// Spindle encoder parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct EncoderConfig {
    /// Encoder counts per spindle revolution (after quadrature decoding).
    pub resolution: u32,

    /// Bit width of the free-running hardware position counter.
    pub counter_bits: u8,
}

impl EncoderConfig {
    /// Largest raw value the counter reaches before wrapping to zero.
    #[inline]
    pub fn counter_max(&self) -> u32 {
        if self.counter_bits >= 32 {
            u32::MAX
        } else {
            (1u32 << self.counter_bits) - 1
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            resolution: 4096,
            counter_bits: 24,
        }
    }
}

/// Stepper drive parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct StepperConfig {
    /// Steps per leadscrew revolution, including microstepping.
    pub resolution: u32,

    /// Leadscrew pitch in threads per inch.
    #[serde(default = "default_leadscrew_tpi")]
    pub leadscrew_tpi: u32,

    /// Desired/current step divergence that trips the overrun fault.
    pub max_buffered_steps: u32,

    /// Whether step pin logic is inverted.
    #[serde(default)]
    pub invert_step: bool,

    /// Whether direction pin logic is inverted.
    #[serde(default)]
    pub invert_direction: bool,

    /// Whether enable pin logic is inverted.
    #[serde(default)]
    pub invert_enable: bool,

    /// Whether the driver alarm input is active-low.
    #[serde(default)]
    pub invert_alarm: bool,
}

fn default_leadscrew_tpi() -> u32 {
    12
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            resolution: 1600,
            leadscrew_tpi: default_leadscrew_tpi(),
            max_buffered_steps: 100,
            invert_step: false,
            invert_direction: false,
            invert_enable: false,
            invert_alarm: false,
        }
    }
}

/// Real-time control parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    /// Synchronization tick rate in Hz. Sets the maximum step rate: the
    /// drive emits at most one step per two ticks.
    pub tick_hz: u32,

    /// Ticks between RPM display samples.
    #[serde(default = "default_rpm_sample_ticks")]
    pub rpm_sample_ticks: u32,

    /// Measurement system selected at startup.
    #[serde(default = "default_units")]
    pub default_units: Units,
}

fn default_rpm_sample_ticks() -> u32 {
    25_000
}

fn default_units() -> Units {
    Units::Imperial
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_hz: 100_000,
            rpm_sample_ticks: default_rpm_sample_ticks(),
            default_units: default_units(),
        }
    }
}

/// One jog speed preset as an exact fraction of the active ratio.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JogFactor {
    /// Factor numerator.
    pub numerator: u64,
    /// Factor denominator.
    pub denominator: u64,
}

impl JogFactor {
    /// Convert to a [`RationalRatio`]. Call only after validation; a zero
    /// denominator panics.
    pub fn ratio(&self) -> RationalRatio {
        RationalRatio::new(self.numerator, self.denominator)
    }
}

/// The three jog speed presets.
#[derive(Debug, Clone, Deserialize)]
pub struct JogConfig {
    /// Slow jog factor.
    pub slow: JogFactor,
    /// Medium jog factor.
    pub medium: JogFactor,
    /// Fast jog factor.
    pub fast: JogFactor,
}

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            slow: JogFactor {
                numerator: 1,
                denominator: 5,
            },
            medium: JogFactor {
                numerator: 1,
                denominator: 1,
            },
            fast: JogFactor {
                numerator: 5,
                denominator: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_max() {
        let encoder = EncoderConfig {
            resolution: 4096,
            counter_bits: 24,
        };
        assert_eq!(encoder.counter_max(), 0x00ff_ffff);

        let wide = EncoderConfig {
            resolution: 4096,
            counter_bits: 32,
        };
        assert_eq!(wide.counter_max(), u32::MAX);
    }

    #[test]
    fn test_defaults_match_reference_hardware() {
        let config = MachineConfig::default();
        assert_eq!(config.encoder.resolution, 4096);
        assert_eq!(config.stepper.resolution, 1600);
        assert_eq!(config.stepper.leadscrew_tpi, 12);
        assert_eq!(config.stepper.max_buffered_steps, 100);
        assert_eq!(config.control.default_units, Units::Imperial);
    }
}
