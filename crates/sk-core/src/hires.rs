//! High-resolution fractional position
//!
//! Keeps the integer and fractional parts of a position separately so that
//! long constant-rate walks (resampling, envelopes, ring-buffer lookup) do
//! not lose sub-sample precision as the integer part grows.

use std::cmp::Ordering;

/// Integer + fractional position with a step vector
///
/// After every mutation the fraction lies in `[0, 1)`; whole units are
/// carried into the integer part and negative fractions borrow from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HiResValue {
    int: i64,
    frac: f64,
    step_int: i64,
    step_frac: f64,
}

#[inline]
fn split(value: f64) -> (i64, f64) {
    let whole = value.floor();
    (whole as i64, value - whole)
}

impl HiResValue {
    pub fn new(pos: f64, step: f64) -> Self {
        let mut value = Self::default();
        value.set_pos(pos);
        value.set_step(step);
        value
    }

    pub fn from_pos(pos: f64) -> Self {
        Self::new(pos, 0.0)
    }

    pub fn set_pos(&mut self, pos: f64) {
        (self.int, self.frac) = split(pos);
        self.validate();
    }

    pub fn set_int_pos(&mut self, pos: i64) {
        self.int = pos;
        self.frac = 0.0;
    }

    pub fn set_step(&mut self, step: f64) {
        (self.step_int, self.step_frac) = split(step);
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.step_int as f64 + self.step_frac
    }

    #[inline]
    pub fn pos(&self) -> f64 {
        self.int as f64 + self.frac
    }

    #[inline]
    pub fn int_part(&self) -> i64 {
        self.int
    }

    #[inline]
    pub fn frac_part(&self) -> f64 {
        self.frac
    }

    /// Integer part as an index, `None` when negative
    #[inline]
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.int).ok()
    }

    pub fn add_double(&mut self, delta: f64) {
        let (int, frac) = split(delta);
        self.int += int;
        self.frac += frac;
        self.validate();
    }

    pub fn add(&mut self, other: &HiResValue) {
        self.int += other.int;
        self.frac += other.frac;
        self.validate();
    }

    #[inline]
    pub fn step_forward(&mut self) {
        self.int += self.step_int;
        self.frac += self.step_frac;
        self.validate();
    }

    #[inline]
    pub fn step_backward(&mut self) {
        self.int -= self.step_int;
        self.frac -= self.step_frac;
        self.validate();
    }

    #[inline]
    fn validate(&mut self) {
        if self.frac >= 1.0 || self.frac < 0.0 {
            let whole = self.frac.floor();
            self.int += whole as i64;
            self.frac -= whole;
            // floor() of a tiny negative can leave exactly 1.0 behind
            if self.frac >= 1.0 {
                self.int += 1;
                self.frac = 0.0;
            }
        }
    }
}

impl PartialEq for HiResValue {
    fn eq(&self, other: &Self) -> bool {
        self.int == other.int && self.frac == other.frac
    }
}

impl PartialOrd for HiResValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.int.cmp(&other.int) {
            Ordering::Equal => self.frac.partial_cmp(&other.frac),
            ord => Some(ord),
        }
    }
}

impl PartialEq<i64> for HiResValue {
    fn eq(&self, other: &i64) -> bool {
        self.int == *other && self.frac == 0.0
    }
}

impl PartialOrd<i64> for HiResValue {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        match self.int.cmp(other) {
            Ordering::Equal if self.frac > 0.0 => Some(Ordering::Greater),
            ord => Some(ord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fraction_stays_normalized() {
        let mut v = HiResValue::new(1.75, 0.5);
        v.step_forward();
        assert_eq!(v.int_part(), 2);
        assert_abs_diff_eq!(v.frac_part(), 0.25);

        v.add_double(-2.5);
        assert_eq!(v.int_part(), -1);
        assert_abs_diff_eq!(v.frac_part(), 0.75);
        assert_abs_diff_eq!(v.pos(), -0.25);
    }

    #[test]
    fn test_step_backward_borrows() {
        let mut v = HiResValue::new(3.1, 0.3);
        v.step_backward();
        assert_eq!(v.int_part(), 2);
        assert_abs_diff_eq!(v.frac_part(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_step_matches_single_add() {
        for &(start, step) in &[(0.0, 0.1), (12.345, 1.0 / 3.0), (-7.5, 2.718_281_8), (1e6, 0.999)] {
            let n = 1000;
            let mut walked = HiResValue::new(start, step);
            for _ in 0..n {
                walked.step_forward();
            }

            let mut added = HiResValue::from_pos(start);
            added.add_double(n as f64 * step);

            assert_abs_diff_eq!(walked.pos(), added.pos(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ordering() {
        let a = HiResValue::from_pos(2.25);
        let b = HiResValue::from_pos(2.5);
        assert!(a < b);
        assert!(a > 2i64);
        assert!(a < 3i64);
        assert!(HiResValue::from_pos(4.0) == 4i64);
    }

    #[test]
    fn test_negative_index() {
        assert_eq!(HiResValue::from_pos(-0.5).index(), None);
        assert_eq!(HiResValue::from_pos(5.9).index(), Some(5));
    }
}
