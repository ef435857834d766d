//! Control-panel interface types and the polling-loop coordinator.
//!
//! Everything here is data in, data out: a debounced key snapshot comes in
//! from the panel driver, a display frame goes back. Wire framing,
//! seven-segment encoding and the shift-register bus are the panel driver's
//! problem, not this crate's.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::units::{HundredthMm, Rpm};
use crate::config::MachineConfig;
use crate::encoder::PositionCounter;
use crate::sync::{JogSpeed, SyncController};
use crate::tables::{FeedTableEntry, FeedTableFactory, Gearing, Mode, Units};

/// Debounced key state, one flag per logical control.
///
/// Navigation/toggle flags are edge-triggered press events; the jog flags
/// are level-sensitive (true while the key is held).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeySnapshot {
    /// Next table entry.
    pub up: bool,
    /// Previous table entry.
    pub down: bool,
    /// Toggle metric/imperial.
    pub in_mm: bool,
    /// Toggle feed/thread mode.
    pub feed_thread: bool,
    /// Toggle forward/reverse.
    pub fwd_rev: bool,
    /// Toggle leadscrew power.
    pub power: bool,
    /// Jog left (held).
    pub jog_left: bool,
    /// Jog right (held).
    pub jog_right: bool,
    /// Cycle jog speed preset.
    pub jog_speed: bool,
    /// Arm/disarm the left stop.
    pub set_left_stop: bool,
    /// Arm/disarm the right stop.
    pub set_right_stop: bool,
    /// Feed to the left stop.
    pub feed_left: bool,
    /// Feed to the right stop.
    pub feed_right: bool,
    /// Zero the displayed carriage position.
    pub zero: bool,
}

/// Panel indicator state as plain flags; the panel driver packs them onto
/// the wire however it likes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedState {
    /// Leadscrew powered.
    pub power: bool,
    /// Forward direction.
    pub forward: bool,
    /// Reverse direction.
    pub reverse: bool,
    /// Imperial units selected.
    pub imperial: bool,
    /// Metric units selected.
    pub metric: bool,
    /// Feed mode selected.
    pub feed: bool,
    /// Thread mode selected.
    pub thread: bool,
    /// Left stop armed.
    pub left_stop: bool,
    /// Right stop armed.
    pub right_stop: bool,
    /// Feed-to-stop in progress.
    pub feeding: bool,
    /// Jog engaged.
    pub jogging: bool,
    /// Slow jog preset selected.
    pub jog_slow: bool,
    /// Medium jog preset selected.
    pub jog_medium: bool,
    /// Fast jog preset selected.
    pub jog_fast: bool,
    /// Backlog fault indication.
    pub alarm: bool,
}

/// Override messages shown in place of the value display.
///
/// Multi-screen messages are a finite sequence with an explicit successor
/// table, advanced by the panel driver on its scroll cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// The stepper backlog protection fired.
    StepBacklog,
    /// Second screen of the backlog message: how to recover.
    StepBacklogReset,
    /// The external driver alarm input is active.
    DriverAlarm,
}

impl Message {
    /// Display text for this screen.
    pub const fn text(self) -> &'static str {
        match self {
            Message::StepBacklog => "FAULT",
            Message::StepBacklogReset => "POWER CYCLE",
            Message::DriverAlarm => "ALARM",
        }
    }

    /// Next screen in the sequence, if any.
    pub const fn successor(self) -> Option<Message> {
        match self {
            Message::StepBacklog => Some(Message::StepBacklogReset),
            Message::StepBacklogReset => None,
            Message::DriverAlarm => None,
        }
    }
}

/// Everything the panel needs to render one refresh.
#[derive(Debug, Clone, Copy)]
pub struct DisplayFrame {
    /// Indicator flags.
    pub leds: LedState,
    /// Value display text from the selected table entry.
    pub value: &'static str,
    /// Spindle speed readout.
    pub rpm: Rpm,
    /// Carriage position readout.
    pub position: HundredthMm,
    /// Override message, shown instead of the value while present.
    pub message: Option<Message>,
}

/// Polling-loop coordinator between the panel and the motion core.
///
/// Owns the mode/units/direction toggles and the feed tables; pushes ratio
/// and direction changes into the controller and pulls state back out for
/// the display. Runs in the slow polling context, never in the tick.
#[derive(Debug)]
pub struct UserInterface {
    factory: FeedTableFactory,
    units: Units,
    mode: Mode,
    reverse: bool,
    message: Option<Message>,
    feed_loaded: bool,
}

impl UserInterface {
    /// Create the coordinator with startup defaults: configured units,
    /// feed mode, forward direction. The feed tables are built for the
    /// machine's configured gearing.
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            factory: FeedTableFactory::new(Gearing::from(config)),
            units: config.control.default_units,
            mode: Mode::Feed,
            reverse: false,
            message: None,
            feed_loaded: false,
        }
    }

    /// The currently selected table entry.
    pub fn current_entry(&mut self) -> &FeedTableEntry {
        self.factory.table(self.units, self.mode).current()
    }

    /// Process one key snapshot against the controller and produce the next
    /// display frame.
    pub fn poll<C, STEP, DIR, ENA, ALM>(
        &mut self,
        keys: KeySnapshot,
        core: &mut SyncController<C, STEP, DIR, ENA, ALM>,
    ) -> DisplayFrame
    where
        C: PositionCounter,
        STEP: OutputPin,
        DIR: OutputPin,
        ENA: OutputPin,
        ALM: InputPin,
    {
        let mut feed_changed = !self.feed_loaded;

        if keys.in_mm {
            self.units = match self.units {
                Units::Imperial => Units::Metric,
                Units::Metric => Units::Imperial,
            };
            feed_changed = true;
        }
        if keys.feed_thread {
            self.mode = match self.mode {
                Mode::Feed => Mode::Thread,
                Mode::Thread => Mode::Feed,
            };
            feed_changed = true;
        }
        if keys.fwd_rev {
            self.reverse = !self.reverse;
            // Table unchanged, but the core needs the new direction.
            feed_changed = true;
        }
        if keys.up {
            self.factory.table(self.units, self.mode).next();
            feed_changed = true;
        }
        if keys.down {
            self.factory.table(self.units, self.mode).previous();
            feed_changed = true;
        }

        if feed_changed {
            let entry = *self.factory.table(self.units, self.mode).current();
            core.set_feed(entry.ratio);
            core.set_reverse(self.reverse);
            self.feed_loaded = true;
        }

        if keys.power {
            // The power key is also the fault-recovery action; the latched
            // message clears only once the drive actually re-energizes.
            let on = !core.is_power_on();
            if core.set_power_on(on).is_ok() && core.fault().is_none() {
                self.message = None;
            }
        }
        if keys.zero {
            core.zero_carriage();
        }
        if keys.set_left_stop {
            core.set_left_stop(!core.left_stop_active());
        }
        if keys.set_right_stop {
            core.set_right_stop(!core.right_stop_active());
        }
        if keys.feed_left {
            core.feed_left();
        }
        if keys.feed_right {
            core.feed_right();
        }
        if keys.jog_speed {
            core.set_jog_speed(match core.jog_speed() {
                JogSpeed::Slow => JogSpeed::Medium,
                JogSpeed::Medium => JogSpeed::Fast,
                JogSpeed::Fast => JogSpeed::Slow,
            });
        }
        core.jog_left(keys.jog_left);
        core.jog_right(keys.jog_right);

        // Latch the panic message until the power key clears the fault. The
        // driver-alarm message follows the input level instead.
        if core.fault().is_some() {
            self.message = Some(Message::StepBacklog);
        } else {
            let alarm = core.is_alarm().unwrap_or(false);
            match self.message {
                None if alarm => self.message = Some(Message::DriverAlarm),
                Some(Message::DriverAlarm) if !alarm => self.message = None,
                _ => {}
            }
        }

        let entry = *self.factory.table(self.units, self.mode).current();
        DisplayFrame {
            leds: self.leds(core, &entry),
            value: entry.label,
            rpm: core.rpm(),
            position: core.carriage_position(),
            message: self.message,
        }
    }

    fn leds<C, STEP, DIR, ENA, ALM>(
        &self,
        core: &SyncController<C, STEP, DIR, ENA, ALM>,
        entry: &FeedTableEntry,
    ) -> LedState
    where
        C: PositionCounter,
        STEP: OutputPin,
        DIR: OutputPin,
        ENA: OutputPin,
        ALM: InputPin,
    {
        LedState {
            power: core.is_power_on(),
            forward: !self.reverse,
            reverse: self.reverse,
            imperial: entry.units == Units::Imperial,
            metric: entry.units == Units::Metric,
            feed: entry.mode == Mode::Feed,
            thread: entry.mode == Mode::Thread,
            left_stop: core.left_stop_active(),
            right_stop: core.right_stop_active(),
            feeding: core.feeding_left() || core.feeding_right(),
            jogging: core.jogging(),
            jog_slow: core.jog_speed() == JogSpeed::Slow,
            jog_medium: core.jog_speed() == JogSpeed::Medium,
            jog_fast: core.jog_speed() == JogSpeed::Fast,
            alarm: core.fault().is_some(),
        }
    }
}
