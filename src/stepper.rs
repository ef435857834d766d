//! Stepper drive step/direction signal generator.
//!
//! Generic over embedded-hal 1.0 pin types so the board layer injects real
//! GPIO and tests inject simulated pins.
//!
//! The drive owns a desired and a current step count and a four-state signal
//! machine. Each signal is asserted on one tick and deasserted on the next,
//! which guarantees a minimum pulse width of one tick period and limits
//! physical motion to one step per two ticks no matter how far desired has
//! moved. That rate limit is what makes the backlog check meaningful.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::config::StepperConfig;
use crate::error::DriveError;

/// Signal-machine state. Each variant encodes the step/direction pin levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalState {
    /// step=0, dir=0.
    #[default]
    Idle,
    /// step=0, dir=1: direction asserted, ready to step forward.
    DirAsserted,
    /// step=1, dir=0: reverse step pulse in progress.
    StepPendingFromIdle,
    /// step=1, dir=1: forward step pulse in progress.
    StepPendingFromDir,
}

/// Drive wiring and limit options, usually taken from [`StepperConfig`].
#[derive(Debug, Clone, Copy)]
pub struct DriveOptions {
    /// Desired/current divergence that trips the overrun fault.
    pub max_buffered_steps: u32,
    /// Whether step pin logic is inverted.
    pub invert_step: bool,
    /// Whether direction pin logic is inverted.
    pub invert_direction: bool,
    /// Whether enable pin logic is inverted.
    pub invert_enable: bool,
    /// Whether the driver alarm input is active-low.
    pub invert_alarm: bool,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            max_buffered_steps: 100,
            invert_step: false,
            invert_direction: false,
            invert_enable: false,
            invert_alarm: false,
        }
    }
}

impl From<&StepperConfig> for DriveOptions {
    fn from(config: &StepperConfig) -> Self {
        Self {
            max_buffered_steps: config.max_buffered_steps,
            invert_step: config.invert_step,
            invert_direction: config.invert_direction,
            invert_enable: config.invert_enable,
            invert_alarm: config.invert_alarm,
        }
    }
}

/// Alarm input for drivers without a fault output: never alarmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlarm;

impl ErrorType for NoAlarm {
    type Error = core::convert::Infallible;
}

impl InputPin for NoAlarm {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Step/direction stepper drive.
///
/// Generic over:
/// - `STEP`: step pin type (must implement `OutputPin`)
/// - `DIR`: direction pin type (must implement `OutputPin`)
/// - `ENA`: driver enable pin type (must implement `OutputPin`)
/// - `ALM`: driver alarm input (must implement `InputPin`; use [`NoAlarm`]
///   when the driver has none)
#[derive(Debug)]
pub struct StepperDrive<STEP, DIR, ENA, ALM>
where
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    ALM: InputPin,
{
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: ENA,
    alarm_pin: ALM,

    options: DriveOptions,

    /// Where the controller wants the motor, in steps.
    desired: i64,
    /// Ground truth of physical step count. Mutated only by the signal
    /// machine's own transitions, or forced to track `desired` while the
    /// drive is disabled or powered off.
    current: i64,

    state: SignalState,
    enabled: bool,
    power_on: bool,
}

impl<STEP, DIR, ENA, ALM> StepperDrive<STEP, DIR, ENA, ALM>
where
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    ALM: InputPin,
{
    /// Create a new drive. Starts disabled and powered off with both
    /// positions at zero; call [`StepperDrive::set_enabled`] to energize.
    pub fn new(step_pin: STEP, dir_pin: DIR, enable_pin: ENA, alarm_pin: ALM, options: DriveOptions) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            alarm_pin,
            options,
            desired: 0,
            current: 0,
            state: SignalState::Idle,
            enabled: false,
            power_on: false,
        }
    }

    /// Set the commanded step position.
    #[inline]
    pub fn set_desired_position(&mut self, steps: i64) {
        self.desired = steps;
    }

    /// Commanded step position.
    #[inline]
    pub fn desired_position(&self) -> i64 {
        self.desired
    }

    /// Physical step position.
    #[inline]
    pub fn current_position(&self) -> i64 {
        self.current
    }

    /// Shift the position base (encoder-wrap compensation).
    #[inline]
    pub fn offset_current_position(&mut self, increment: i64) {
        self.current += increment;
    }

    /// Force the position base (ratio/direction resynchronization).
    #[inline]
    pub fn set_current_position(&mut self, position: i64) {
        self.current = position;
    }

    /// Accumulated desired/current divergence, in steps.
    #[inline]
    pub fn backlog(&self) -> u64 {
        (self.desired - self.current).unsigned_abs()
    }

    /// Current signal-machine state.
    #[inline]
    pub fn signal_state(&self) -> SignalState {
        self.state
    }

    /// Whether the drive is enabled.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the driver (drives the enable pin).
    ///
    /// The flag only changes after the pin write succeeds, so it always
    /// reflects the physical enable state.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), DriveError> {
        self.write_enable(enabled)?;
        self.enabled = enabled;
        Ok(())
    }

    /// Gate physical stepping without touching the enable pin.
    #[inline]
    pub fn set_power_on(&mut self, power_on: bool) {
        self.power_on = power_on;
    }

    /// Read the external driver fault input.
    ///
    /// Read-only status: the driver is expected to stop motion itself, so
    /// this does not alter drive state.
    pub fn is_alarm(&mut self) -> Result<bool, DriveError> {
        self.alarm_pin
            .is_high()
            .map(|high| high != self.options.invert_alarm)
            .map_err(|_| DriveError::PinError)
    }

    /// Motor-overrun protection: if the backlog exceeds the buffered-step
    /// limit the drive disables itself and reports the fault.
    ///
    /// Evaluated every tick by the controller (not internally) so the
    /// controller can react with a forced power-off and an alarm message.
    pub fn check_step_backlog(&mut self) -> Result<(), DriveError> {
        if self.backlog() > self.options.max_buffered_steps as u64 {
            self.set_enabled(false)?;
            return Err(DriveError::StepBacklog {
                desired: self.desired,
                current: self.current,
                limit: self.options.max_buffered_steps,
            });
        }
        Ok(())
    }

    /// Advance the signal machine by one tick.
    ///
    /// While enabled and powered, emits at most one signal edge per tick and
    /// commits at most one step per two ticks. Otherwise forces `current` to
    /// track `desired` with no signal activity, keeping bookkeeping
    /// consistent across power-off intervals.
    pub fn tick(&mut self) -> Result<(), DriveError> {
        if !(self.enabled && self.power_on) {
            self.current = self.desired;
            return Ok(());
        }

        match self.state {
            SignalState::Idle => {
                if self.desired > self.current {
                    self.write_direction(true)?;
                    self.state = SignalState::DirAsserted;
                } else if self.desired < self.current {
                    self.write_step(true)?;
                    self.state = SignalState::StepPendingFromIdle;
                }
            }
            SignalState::DirAsserted => {
                if self.desired > self.current {
                    self.write_step(true)?;
                    self.state = SignalState::StepPendingFromDir;
                } else if self.desired < self.current {
                    self.write_direction(false)?;
                    self.state = SignalState::Idle;
                }
            }
            SignalState::StepPendingFromIdle => {
                self.write_step(false)?;
                self.current -= 1;
                self.state = SignalState::Idle;
            }
            SignalState::StepPendingFromDir => {
                self.write_step(false)?;
                self.current += 1;
                self.state = SignalState::DirAsserted;
            }
        }

        Ok(())
    }

    fn write_step(&mut self, asserted: bool) -> Result<(), DriveError> {
        Self::write_pin(&mut self.step_pin, asserted != self.options.invert_step)
    }

    fn write_direction(&mut self, asserted: bool) -> Result<(), DriveError> {
        Self::write_pin(&mut self.dir_pin, asserted != self.options.invert_direction)
    }

    fn write_enable(&mut self, asserted: bool) -> Result<(), DriveError> {
        Self::write_pin(&mut self.enable_pin, asserted != self.options.invert_enable)
    }

    fn write_pin<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), DriveError> {
        let result = if high { pin.set_high() } else { pin.set_low() };
        result.map_err(|_| DriveError::PinError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Output pin that remembers its level.
    #[derive(Debug, Default)]
    struct TestPin {
        high: bool,
    }

    impl ErrorType for TestPin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for TestPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    fn drive() -> StepperDrive<TestPin, TestPin, TestPin, NoAlarm> {
        let mut drive = StepperDrive::new(
            TestPin::default(),
            TestPin::default(),
            TestPin::default(),
            NoAlarm,
            DriveOptions::default(),
        );
        drive.set_enabled(true).unwrap();
        drive.set_power_on(true);
        drive
    }

    #[test]
    fn test_forward_step_takes_two_ticks() {
        let mut d = drive();
        d.set_desired_position(1);

        // Tick 1: direction asserted, no step yet.
        d.tick().unwrap();
        assert_eq!(d.signal_state(), SignalState::DirAsserted);
        assert_eq!(d.current_position(), 0);

        // Tick 2: step asserted.
        d.tick().unwrap();
        assert_eq!(d.signal_state(), SignalState::StepPendingFromDir);
        assert!(d.step_pin.high);
        assert_eq!(d.current_position(), 0);

        // Tick 3: step deasserted, position committed.
        d.tick().unwrap();
        assert!(!d.step_pin.high);
        assert_eq!(d.current_position(), 1);
        assert_eq!(d.signal_state(), SignalState::DirAsserted);
    }

    #[test]
    fn test_reverse_step_from_idle() {
        let mut d = drive();
        d.set_desired_position(-1);

        d.tick().unwrap();
        assert_eq!(d.signal_state(), SignalState::StepPendingFromIdle);
        assert!(d.step_pin.high);

        d.tick().unwrap();
        assert_eq!(d.current_position(), -1);
        assert_eq!(d.signal_state(), SignalState::Idle);
        assert!(!d.step_pin.high);
    }

    #[test]
    fn test_direction_reversal_deasserts_dir_first() {
        let mut d = drive();
        d.set_desired_position(1);
        for _ in 0..3 {
            d.tick().unwrap();
        }
        assert_eq!(d.current_position(), 1);
        assert!(d.dir_pin.high);

        // Now reverse: drive must leave DirAsserted before pulsing.
        d.set_desired_position(0);
        d.tick().unwrap();
        assert_eq!(d.signal_state(), SignalState::Idle);
        assert!(!d.dir_pin.high);
        d.tick().unwrap();
        d.tick().unwrap();
        assert_eq!(d.current_position(), 0);
    }

    #[test]
    fn test_at_most_one_step_per_two_ticks() {
        let mut d = drive();
        d.set_desired_position(50);
        for tick in 1..=40 {
            d.tick().unwrap();
            assert!(d.current_position() as u64 <= (tick / 2) + 1);
        }
    }

    #[test]
    fn test_disabled_tracks_desired_silently() {
        let mut d = drive();
        d.set_power_on(false);
        d.set_desired_position(12345);
        d.tick().unwrap();
        assert_eq!(d.current_position(), 12345);
        assert_eq!(d.signal_state(), SignalState::Idle);
        assert!(!d.step_pin.high);
    }

    #[test]
    fn test_backlog_trips_and_disables() {
        let mut d = drive();
        d.set_desired_position(101);
        let err = d.check_step_backlog().unwrap_err();
        assert_eq!(
            err,
            DriveError::StepBacklog {
                desired: 101,
                current: 0,
                limit: 100
            }
        );
        assert!(!d.is_enabled());
        // Enable pin released.
        assert!(!d.enable_pin.high);
    }

    #[test]
    fn test_backlog_at_limit_is_fine() {
        let mut d = drive();
        d.set_desired_position(100);
        assert!(d.check_step_backlog().is_ok());
        assert!(d.is_enabled());
    }

    #[test]
    fn test_inverted_step_pin() {
        let mut d = StepperDrive::new(
            TestPin { high: true },
            TestPin::default(),
            TestPin::default(),
            NoAlarm,
            DriveOptions {
                invert_step: true,
                ..DriveOptions::default()
            },
        );
        d.set_enabled(true).unwrap();
        d.set_power_on(true);
        d.set_desired_position(-1);
        d.tick().unwrap();
        // Asserted step with inverted logic drives the pin low.
        assert!(!d.step_pin.high);
    }

    #[test]
    fn test_no_alarm_input() {
        let mut d = drive();
        assert!(!d.is_alarm().unwrap());
    }

    #[test]
    fn test_enable_pin_transactions() {
        use embedded_hal_mock::eh1::digital::{
            Mock as PinMock, State, Transaction as PinTransaction,
        };

        let mut step = PinMock::new(&[]);
        let mut dir = PinMock::new(&[]);
        let mut enable = PinMock::new(&[
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
        ]);

        let mut d = StepperDrive::new(
            step.clone(),
            dir.clone(),
            enable.clone(),
            NoAlarm,
            DriveOptions::default(),
        );
        d.set_enabled(true).unwrap();
        d.set_enabled(false).unwrap();

        step.done();
        dir.done();
        enable.done();
    }
}
