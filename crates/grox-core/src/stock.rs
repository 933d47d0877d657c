//! # Stock Arithmetic
//!
//! The floor rule shared by the stock mutator (grox-db executes it as one
//! conditional UPDATE) and by ledger replay.
//!
//! ```text
//!   on_hand = 3, sell 5  ──►  max(0, 3 − 5) = 0     (not an error)
//! ```

/// Balance after deducting `quantity` units, floored at zero.
///
/// ## Example
/// ```rust
/// use grox_core::stock::apply_deduction;
///
/// assert_eq!(apply_deduction(10, 4), 6);
/// assert_eq!(apply_deduction(3, 5), 0);
/// ```
#[inline]
pub fn apply_deduction(on_hand: i64, quantity: i64) -> i64 {
    on_hand.saturating_sub(quantity).max(0)
}

/// Balance after a signed change, floored at zero.
#[inline]
pub fn apply_delta(on_hand: i64, delta: i64) -> i64 {
    on_hand.saturating_add(delta).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduction_never_negative() {
        for on_hand in 0..20 {
            for qty in 0..30 {
                let after = apply_deduction(on_hand, qty);
                assert_eq!(after, (on_hand - qty).max(0));
                assert!(after >= 0);
            }
        }
    }

    #[test]
    fn test_delta_clamps() {
        assert_eq!(apply_delta(5, 3), 8);
        assert_eq!(apply_delta(5, -9), 0);
    }
}
