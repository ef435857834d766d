//! Property tests for the wraparound arithmetic and the exact-ratio math
//! that the synchronization loop depends on.

mod common;

use common::SimSpindle;
use leadscrew_motion::{Encoder, RationalRatio};
use proptest::prelude::*;

const MAX: u32 = 0x00ff_ffff;
const RANGE: i64 = MAX as i64 + 1;

fn encoder() -> Encoder<SimSpindle> {
    Encoder::new(SimSpindle::new(MAX), 4096, 1)
}

proptest! {
    /// The computed delta is always the shorter arc around the counter
    /// ring, and re-applying it to the previous reading lands exactly on
    /// the current one.
    #[test]
    fn delta_takes_the_shorter_arc(prev in 0..=MAX, cur in 0..=MAX) {
        let enc = encoder();
        let delta = enc.position_delta(prev, cur);
        prop_assert!(delta.abs() <= RANGE / 2);
        prop_assert_eq!((prev as i64 + delta).rem_euclid(RANGE), cur as i64);
    }

    /// Wrap adjustment is exactly what separates the raw reading change
    /// from the true movement, and only ever a whole counter range.
    #[test]
    fn wrap_adjustment_accounts_for_the_raw_change(prev in 0..=MAX, cur in 0..=MAX) {
        let enc = encoder();
        let adjustment = enc.wrap_adjustment(prev, cur);
        prop_assert!(adjustment == 0 || adjustment.abs() == RANGE);
        prop_assert_eq!(
            enc.position_delta(prev, cur) + adjustment,
            cur as i64 - prev as i64
        );
    }

    /// Accumulating per-reading deltas over an arbitrary walk stays in
    /// lockstep with the hardware counter, wraps included.
    #[test]
    fn delta_tracking_never_diverges_from_the_counter(
        moves in prop::collection::vec(-2_000i64..2_000, 1..200),
    ) {
        let spindle = SimSpindle::new(MAX);
        let mut enc = Encoder::new(spindle.clone(), 4096, 1);
        let mut absolute: i64 = 0;
        let mut previous = enc.position();
        for m in moves {
            spindle.advance(m);
            let current = enc.position();
            absolute += enc.position_delta(previous, current);
            previous = current;
        }
        prop_assert_eq!(absolute.rem_euclid(RANGE) as u32, spindle.get());
    }

    /// Ratio multiplication is exact: zero maps to zero, whole-denominator
    /// counts map to whole-numerator steps, and everything else truncates
    /// toward zero with no hidden rounding state.
    #[test]
    fn ratio_multiply_is_exact(
        num in 1u64..100_000,
        den in 1u64..100_000,
        k in -1_000i64..1_000,
        count in -1_000_000i64..1_000_000,
    ) {
        let ratio = RationalRatio::new(num, den);
        prop_assert_eq!(ratio.multiply(0), 0);
        prop_assert_eq!(ratio.multiply(k * den as i64), k * num as i64);

        let exact = count as i128 * num as i128 / den as i128;
        prop_assert_eq!(ratio.multiply(count) as i128, exact);
    }
}
