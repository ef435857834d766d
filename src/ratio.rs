//! Exact rational gear ratios.
//!
//! The relationship between spindle rotation and carriage movement is kept as
//! an integer fraction at all times. The synchronization math multiplies raw
//! encoder counts by this fraction millions of times over a long cut; a
//! floating-point approximation would accumulate position drift, so none is
//! offered.

/// An exact rational gear ratio: output steps per spindle encoder count.
///
/// Invariant: `denominator > 0`. Checked at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RationalRatio {
    numerator: u64,
    denominator: u64,
}

impl RationalRatio {
    /// The identity ratio (1/1).
    pub const UNITY: Self = Self::new(1, 1);

    /// Create a new ratio.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero. All ratios in this crate are built
    /// from compile-time tables or validated configuration, so this fires at
    /// `const` evaluation or config load, never in the tick path.
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        assert!(denominator > 0, "ratio denominator must be positive");
        Self {
            numerator,
            denominator,
        }
    }

    /// Get the numerator.
    #[inline]
    pub const fn numerator(self) -> u64 {
        self.numerator
    }

    /// Get the denominator.
    #[inline]
    pub const fn denominator(self) -> u64 {
        self.denominator
    }

    /// Multiply a signed count by this ratio, truncating toward zero.
    ///
    /// The intermediate product is 128 bits wide, so any count that fits in
    /// an `i64` is safe against overflow for the counter ranges and table
    /// ratios this crate works with.
    #[inline]
    pub fn multiply(self, count: i64) -> i64 {
        (count as i128 * self.numerator as i128 / self.denominator as i128) as i64
    }

    /// Compose two ratios into one exact fraction.
    ///
    /// Used to fold the jog factor into the active feed ratio so a combined
    /// multiply truncates once, not twice. Table numerators and jog factors
    /// are small enough that the `u64` products cannot overflow.
    #[inline]
    pub const fn compose(self, other: Self) -> Self {
        Self::new(
            self.numerator * other.numerator,
            self.denominator * other.denominator,
        )
    }
}
