//! Epsilon comparison for delay, slack and criticality values.
//!
//! Delays accumulate through repeated summation, so two path lengths that are
//! mathematically equal can differ in the last bits. Every "are these equal"
//! question in timing analysis goes through [`approx_eq`].

/// Two values closer than this are considered equal.
pub const EQUAL_EPSILON: f32 = 1e-6;

/// Returns `true` if `a` and `b` differ by less than [`EQUAL_EPSILON`].
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EQUAL_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_epsilon_is_equal() {
        assert!(approx_eq(1.0, 1.0 + 5e-7));
        assert!(approx_eq(0.0, -5e-7));
    }

    #[test]
    fn beyond_epsilon_is_not_equal() {
        assert!(!approx_eq(1.0, 1.00001));
        assert!(!approx_eq(0.0, 2e-6));
    }

    #[test]
    fn repeated_summation_still_ties() {
        let mut a = 0.0f32;
        for _ in 0..10 {
            a += 0.1;
        }
        assert!(approx_eq(a, 1.0));
    }
}
