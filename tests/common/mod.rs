//! Shared simulation harness: counter and pins backed by plain cells so
//! tests can both drive the spindle and observe the drive signals.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use leadscrew_motion::{
    DriveOptions, Encoder, MachineConfig, NoAlarm, PositionCounter, StepperDrive, SyncController,
};

/// Observable output pin: tracks level and counts rising edges.
#[derive(Debug, Clone, Default)]
pub struct RecordingPin {
    level: Rc<Cell<bool>>,
    rising_edges: Rc<Cell<u64>>,
}

impl RecordingPin {
    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    pub fn rising_edges(&self) -> u64 {
        self.rising_edges.get()
    }
}

impl ErrorType for RecordingPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.level.get() {
            self.rising_edges.set(self.rising_edges.get() + 1);
        }
        self.level.set(true);
        Ok(())
    }
}

/// Simulated free-running spindle counter with a configurable wrap point.
#[derive(Debug, Clone)]
pub struct SimSpindle {
    value: Rc<Cell<u32>>,
    max: u32,
}

impl SimSpindle {
    pub fn new(max: u32) -> Self {
        Self {
            value: Rc::new(Cell::new(0)),
            max,
        }
    }

    /// Turn the spindle by a signed number of counts, wrapping like the
    /// hardware counter does.
    pub fn advance(&self, counts: i64) {
        let range = self.max as i64 + 1;
        let next = (self.value.get() as i64 + counts).rem_euclid(range);
        self.value.set(next as u32);
    }

    pub fn set(&self, value: u32) {
        self.value.set(value);
    }

    pub fn get(&self) -> u32 {
        self.value.get()
    }
}

impl PositionCounter for SimSpindle {
    fn read(&mut self) -> u32 {
        self.value.get()
    }

    fn max_count(&self) -> u32 {
        self.max
    }

    fn zero(&mut self) {
        self.value.set(0);
    }
}

/// A fully wired controller over simulated hardware.
pub struct Rig {
    pub core: SyncController<SimSpindle, RecordingPin, RecordingPin, RecordingPin, NoAlarm>,
    pub spindle: SimSpindle,
    pub step_pin: RecordingPin,
    pub dir_pin: RecordingPin,
    pub enable_pin: RecordingPin,
    pub config: MachineConfig,
}

pub fn rig() -> Rig {
    rig_with_config(MachineConfig::default())
}

pub fn rig_with_config(config: MachineConfig) -> Rig {
    let spindle = SimSpindle::new(config.encoder.counter_max());
    let step_pin = RecordingPin::default();
    let dir_pin = RecordingPin::default();
    let enable_pin = RecordingPin::default();

    let sample_hz = config.control.tick_hz / config.control.rpm_sample_ticks;
    let encoder = Encoder::new(spindle.clone(), config.encoder.resolution, sample_hz);
    let stepper = StepperDrive::new(
        step_pin.clone(),
        dir_pin.clone(),
        enable_pin.clone(),
        NoAlarm,
        DriveOptions::from(&config.stepper),
    );

    let core = SyncController::new(encoder, stepper, &config).expect("rig assembly");

    Rig {
        core,
        spindle,
        step_pin,
        dir_pin,
        enable_pin,
        config,
    }
}
