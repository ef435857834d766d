//! Unit types for physical quantities.
//!
//! Type-safe representations of carriage position and spindle speed to
//! prevent unit confusion at compile time.

use core::ops::{Add, Neg, Sub};

/// Carriage position in hundredths of a millimeter.
///
/// This is the persisted carriage-position unit: limit stops are captured in
/// it and the UI displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HundredthMm(pub i64);

impl HundredthMm {
    /// Create a new HundredthMm value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl Add for HundredthMm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HundredthMm {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for HundredthMm {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Spindle speed in revolutions per minute, as displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rpm(pub u16);

impl Rpm {
    /// Create a new Rpm value.
    #[inline]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }
}
