//! Quadrature spindle encoder abstraction.
//!
//! The hardware exposes a free-running position counter that wraps at a
//! configured bit width. The controller only ever reads it (plus an explicit
//! zero for re-homing); all wraparound reasoning lives here so the
//! synchronization math can treat spindle movement as a signed delta.

use crate::config::units::Rpm;

/// Capability trait over the free-running hardware position counter.
///
/// The board layer implements this over its quadrature peripheral; tests
/// substitute a plain integer. Implementations must be non-blocking: `read`
/// is called from the tick context.
pub trait PositionCounter {
    /// Read the current raw counter value, in `[0, max_count]`.
    fn read(&mut self) -> u32;

    /// Largest raw value before the counter wraps to zero (inclusive).
    fn max_count(&self) -> u32;

    /// Reset the counter to zero (re-homing only).
    fn zero(&mut self);
}

/// Spindle encoder: raw position plus a derived, display-only RPM estimate.
#[derive(Debug)]
pub struct Encoder<C: PositionCounter> {
    counter: C,
    /// Counts per spindle revolution.
    resolution: u32,
    /// RPM sample rate in Hz (tick rate / sample interval).
    sample_hz: u32,
    /// Raw value at the previous RPM sample.
    previous_sample: u32,
    rpm: Rpm,
}

impl<C: PositionCounter> Encoder<C> {
    /// Create an encoder over a hardware counter.
    ///
    /// `sample_hz` is how often [`Encoder::sample_rpm`] will be called.
    pub fn new(counter: C, resolution: u32, sample_hz: u32) -> Self {
        Self {
            counter,
            resolution,
            sample_hz,
            previous_sample: 0,
            rpm: Rpm::default(),
        }
    }

    /// Read the raw absolute position, modulo the counter width.
    #[inline]
    pub fn position(&mut self) -> u32 {
        self.counter.read()
    }

    /// Largest raw counter value (inclusive).
    #[inline]
    pub fn max_count(&self) -> u32 {
        self.counter.max_count()
    }

    /// Counts per spindle revolution.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Current spindle angle within one revolution, in encoder counts
    /// `[0, resolution)`.
    ///
    /// Display-only, not used in the synchronization path.
    #[inline]
    pub fn spindle_angle(&mut self) -> u32 {
        self.counter.read() % self.resolution
    }

    /// Reset the hardware counter and sample bookkeeping (re-homing).
    pub fn zero(&mut self) {
        self.counter.zero();
        self.previous_sample = 0;
    }

    /// Signed spindle movement between two raw readings.
    ///
    /// The shorter arc around the modular ring is always the true delta: if
    /// the unsigned difference in either direction exceeds half the counter
    /// range, the counter wrapped and the delta is reinterpreted. The result
    /// magnitude never exceeds `(max_count + 1) / 2`.
    pub fn position_delta(&self, previous: u32, current: u32) -> i64 {
        let range = self.counter.max_count() as i64 + 1;
        let mut delta = current as i64 - previous as i64;
        if delta > range / 2 {
            delta -= range;
        } else if delta < -(range / 2) {
            delta += range;
        }
        delta
    }

    /// Raw-count adjustment to apply when the counter wrapped between two
    /// readings: `-range` for a forward wrap (raw value fell), `+range` for
    /// a backward wrap, `0` otherwise.
    ///
    /// This is the difference between the raw reading change and the true
    /// movement; the controller multiplies it through the active ratio to
    /// keep the stepper's position base consistent with the modular desired
    /// position.
    pub fn wrap_adjustment(&self, previous: u32, current: u32) -> i64 {
        let raw_change = current as i64 - previous as i64;
        raw_change - self.position_delta(previous, current)
    }

    /// Update the RPM estimate from the current raw position.
    ///
    /// Call at `sample_hz` from the tick context; O(1), no allocation.
    pub fn sample_rpm(&mut self, current: u32) {
        let delta = self.position_delta(self.previous_sample, current);
        self.previous_sample = current;
        let counts_per_minute = delta.unsigned_abs() * self.sample_hz as u64 * 60;
        let rpm = counts_per_minute / self.resolution as u64;
        self.rpm = Rpm(rpm.min(u16::MAX as u64) as u16);
    }

    /// Most recent RPM estimate. Feeds the UI only.
    #[inline]
    pub fn rpm(&self) -> Rpm {
        self.rpm
    }
}
