//! The synchronization controller.
//!
//! Runs the fixed-period tick that keeps the stepper-driven carriage locked
//! to spindle rotation: read the encoder, derive the desired step count as a
//! pure function of absolute spindle angle and the active ratio, compensate
//! for counter wraparound, resynchronize on ratio or direction changes, and
//! drive the stepper signal machine.
//!
//! Desired position is deliberately not an accumulator: integrating per-tick
//! deltas would accumulate rounding error, while a pure function of absolute
//! angle is self-correcting every tick with bounded error of one
//! ratio-multiply rounding step.
//!
//! Two execution contexts share this struct: the tick runs in the timer
//! interrupt, commands and queries run in the polling loop. Neither blocks.
//! The caller is responsible for the usual single-core discipline (wrap the
//! controller in a critical-section mutex, or mask the tick interrupt around
//! multi-field command sequences).

use embedded_hal::digital::{InputPin, OutputPin};

use crate::carriage::Carriage;
use crate::config::units::{HundredthMm, Rpm};
use crate::config::MachineConfig;
use crate::encoder::{Encoder, PositionCounter};
use crate::error::DriveError;
use crate::ratio::RationalRatio;
use crate::stepper::StepperDrive;

/// Feed direction relative to spindle rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Normal direction.
    #[default]
    Forward,
    /// Reversed (left-hand threads, reverse feeds).
    Reverse,
}

impl Direction {
    /// Multiplier applied to the ratio'd step count.
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Jog speed preset selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JogSpeed {
    /// Slow preset.
    Slow,
    /// Medium preset.
    #[default]
    Medium,
    /// Fast preset.
    Fast,
}

/// The motion-control core: one spindle encoder, one stepper drive, one
/// carriage tracker, orchestrated by a fixed-period tick.
#[derive(Debug)]
pub struct SyncController<C, STEP, DIR, ENA, ALM>
where
    C: PositionCounter,
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    ALM: InputPin,
{
    encoder: Encoder<C>,
    stepper: StepperDrive<STEP, DIR, ENA, ALM>,
    carriage: Carriage,

    /// Active gear ratio; `None` until the UI pushes the first table entry.
    feed: Option<RationalRatio>,
    direction: Direction,

    jog_presets: [RationalRatio; 3],
    jog_speed: JogSpeed,
    jogging_left: bool,
    jogging_right: bool,

    /// Effective multiplier and sign of the previous tick, for change
    /// detection. `None` forces a resync on the first powered tick.
    previous_sync: Option<(RationalRatio, i64)>,
    previous_spindle: u32,

    power_on: bool,
    fault: Option<DriveError>,

    rpm_sample_ticks: u32,
    ticks_since_rpm_sample: u32,
}

impl<C, STEP, DIR, ENA, ALM> SyncController<C, STEP, DIR, ENA, ALM>
where
    C: PositionCounter,
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    ALM: InputPin,
{
    /// Assemble the controller and energize the drive.
    ///
    /// Starts powered off, forward, no active ratio, no stops armed.
    pub fn new(
        mut encoder: Encoder<C>,
        mut stepper: StepperDrive<STEP, DIR, ENA, ALM>,
        config: &MachineConfig,
    ) -> Result<Self, DriveError> {
        stepper.set_enabled(true)?;
        let previous_spindle = encoder.position();
        let carriage = Carriage::new(config.encoder.resolution);

        Ok(Self {
            encoder,
            stepper,
            carriage,
            feed: None,
            direction: Direction::Forward,
            jog_presets: [
                config.jog.slow.ratio(),
                config.jog.medium.ratio(),
                config.jog.fast.ratio(),
            ],
            jog_speed: JogSpeed::default(),
            jogging_left: false,
            jogging_right: false,
            previous_sync: None,
            previous_spindle,
            power_on: false,
            fault: None,
            rpm_sample_ticks: config.control.rpm_sample_ticks,
            ticks_since_rpm_sample: 0,
        })
    }

    /// One fixed-period synchronization tick. Interrupt context; bounded
    /// work, no allocation, no loops.
    ///
    /// Returns the fault when the backlog protection fires; the fault is
    /// also latched and visible through [`SyncController::fault`].
    pub fn tick(&mut self) -> Result<(), DriveError> {
        let Some(feed) = self.feed else {
            // No ratio selected yet: keep the raw-value bookkeeping current
            // so the first synchronized tick sees no phantom movement.
            self.previous_spindle = self.encoder.position();
            return Ok(());
        };

        let spindle = self.encoder.position();

        // Carriage accumulation. While powered off the carriage is assumed
        // to not be moving under power, so only the last-observed raw value
        // advances; that avoids a position jump artifact on power-up.
        if self.power_on {
            let delta = self.encoder.position_delta(self.previous_spindle, spindle);
            self.carriage
                .accumulate(delta * self.direction.sign(), feed);
        }

        // RPM display sampling, on its own cadence.
        self.ticks_since_rpm_sample += 1;
        if self.ticks_since_rpm_sample >= self.rpm_sample_ticks {
            self.ticks_since_rpm_sample = 0;
            self.encoder.sample_rpm(spindle);
        }

        // Feed-to-stop: power off on the tick the armed stop is reached.
        if self.carriage.check_auto_stop() {
            self.power_on = false;
            self.stepper.set_power_on(false);
        }

        // Desired stepper position is a pure function of absolute spindle
        // angle and the effective multiplier.
        let effective = self.effective_ratio(feed);
        let sign = self.effective_sign();
        let desired = effective.multiply(spindle as i64) * sign;
        self.stepper.set_desired_position(desired);

        // Encoder wrap compensation: shift the stepper's position base by
        // the ratio'd counter range so the modular desired position does not
        // appear to jump.
        let adjustment = self.encoder.wrap_adjustment(self.previous_spindle, spindle);
        if adjustment != 0 {
            self.stepper
                .offset_current_position(effective.multiply(adjustment) * sign);
        }

        // A ratio or direction change must not be expressed as a step
        // burst: catch up silently at the instant of change.
        if self.previous_sync != Some((effective, sign)) {
            self.stepper.set_current_position(desired);
        }

        self.previous_sync = Some((effective, sign));
        self.previous_spindle = spindle;

        // Service the signal machine, then the overrun protection.
        self.stepper.tick()?;
        if let Err(fault) = self.stepper.check_step_backlog() {
            self.power_on = false;
            self.stepper.set_power_on(false);
            self.fault = Some(fault);
            return Err(fault);
        }

        Ok(())
    }

    fn effective_ratio(&self, feed: RationalRatio) -> RationalRatio {
        if self.jogging_left || self.jogging_right {
            feed.compose(self.jog_presets[self.jog_speed as usize])
        } else {
            feed
        }
    }

    fn effective_sign(&self) -> i64 {
        if self.jogging_left {
            -1
        } else if self.jogging_right {
            1
        } else {
            self.direction.sign()
        }
    }

    /// Power-on requests from jog/feed commands: refused while a backlog
    /// fault is latched, so motion cannot resume without an explicit
    /// power-cycle.
    fn request_power(&mut self, on: bool) {
        if on && self.fault.is_some() {
            return;
        }
        self.power_on = on;
        self.stepper.set_power_on(on);
    }

    // ---- commands (polling context) ----

    /// Select the active gear ratio (from the current feed-table entry).
    pub fn set_feed(&mut self, ratio: RationalRatio) {
        self.feed = Some(ratio);
    }

    /// Set the feed direction.
    pub fn set_reverse(&mut self, reverse: bool) {
        self.direction = if reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        };
    }

    /// Power the leadscrew on or off (the power key).
    ///
    /// Powering on is the explicit recovery action after a backlog fault:
    /// it re-enables the drive and clears the latch. The latch survives a
    /// failed re-enable, so the fault stays visible until the drive is
    /// actually energized again.
    pub fn set_power_on(&mut self, on: bool) -> Result<(), DriveError> {
        if on && self.fault.is_some() {
            self.stepper.set_enabled(true)?;
            self.fault = None;
        }
        self.power_on = on;
        self.stepper.set_power_on(on);
        Ok(())
    }

    /// Zero the displayed carriage position (offset only).
    pub fn zero_carriage(&mut self) {
        self.carriage.zero();
    }

    /// Hard re-home: reset encoder, stepper and carriage counters to zero.
    pub fn hard_zero(&mut self) {
        self.encoder.zero();
        self.carriage.hard_zero();
        self.stepper.set_desired_position(0);
        self.stepper.set_current_position(0);
        self.previous_spindle = 0;
        self.previous_sync = None;
    }

    /// Arm or disarm the left stop at the current carriage position.
    pub fn set_left_stop(&mut self, active: bool) {
        self.carriage.set_left_stop(active);
    }

    /// Arm or disarm the right stop at the current carriage position.
    pub fn set_right_stop(&mut self, active: bool) {
        self.carriage.set_right_stop(active);
    }

    /// Feed toward the armed left stop; no-op if disarmed or already there.
    pub fn feed_left(&mut self) {
        if self.carriage.feed_left() {
            self.request_power(true);
        }
    }

    /// Feed toward the armed right stop; no-op if disarmed or already there.
    pub fn feed_right(&mut self) {
        if self.carriage.feed_right() {
            self.request_power(true);
        }
    }

    /// Engage or release a left jog. Power is forced on while held; release
    /// powers off (unless the other jog is still held). Level-idempotent so
    /// the polling loop can pass the raw key state every cycle. Jog motion
    /// is not subject to limit stops.
    pub fn jog_left(&mut self, engaged: bool) {
        if self.jogging_left == engaged {
            return;
        }
        self.jogging_left = engaged;
        self.request_power(engaged || self.jogging_right);
    }

    /// Engage or release a right jog.
    pub fn jog_right(&mut self, engaged: bool) {
        if self.jogging_right == engaged {
            return;
        }
        self.jogging_right = engaged;
        self.request_power(engaged || self.jogging_left);
    }

    /// Select a jog speed preset.
    pub fn set_jog_speed(&mut self, speed: JogSpeed) {
        self.jog_speed = speed;
    }

    // ---- queries (polling context) ----

    /// Whether the leadscrew is powered.
    #[inline]
    pub fn is_power_on(&self) -> bool {
        self.power_on
    }

    /// Latched backlog fault, if any.
    #[inline]
    pub fn fault(&self) -> Option<DriveError> {
        self.fault
    }

    /// External driver alarm input.
    pub fn is_alarm(&mut self) -> Result<bool, DriveError> {
        self.stepper.is_alarm()
    }

    /// Displayed carriage position.
    #[inline]
    pub fn carriage_position(&self) -> HundredthMm {
        self.carriage.position()
    }

    /// Spindle speed estimate for the display.
    #[inline]
    pub fn rpm(&self) -> Rpm {
        self.encoder.rpm()
    }

    /// Spindle angle within one revolution, in encoder counts.
    #[inline]
    pub fn spindle_angle(&mut self) -> u32 {
        self.encoder.spindle_angle()
    }

    /// Current feed direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Selected jog speed preset.
    #[inline]
    pub fn jog_speed(&self) -> JogSpeed {
        self.jog_speed
    }

    /// Whether the left stop is armed.
    #[inline]
    pub fn left_stop_active(&self) -> bool {
        self.carriage.left_stop().is_some()
    }

    /// Whether the right stop is armed.
    #[inline]
    pub fn right_stop_active(&self) -> bool {
        self.carriage.right_stop().is_some()
    }

    /// Whether a feed-left is in progress.
    #[inline]
    pub fn feeding_left(&self) -> bool {
        self.carriage.feeding_left()
    }

    /// Whether a feed-right is in progress.
    #[inline]
    pub fn feeding_right(&self) -> bool {
        self.carriage.feeding_right()
    }

    /// Whether either jog is engaged.
    #[inline]
    pub fn jogging(&self) -> bool {
        self.jogging_left || self.jogging_right
    }

    /// Commanded stepper position, for diagnostics and tests.
    #[inline]
    pub fn desired_steps(&self) -> i64 {
        self.stepper.desired_position()
    }

    /// Physical stepper position, for diagnostics and tests.
    #[inline]
    pub fn current_steps(&self) -> i64 {
        self.stepper.current_position()
    }
}
