//! Spectral frame: DC term plus N magnitude/phase bins
//!
//! Bin `k` holds FFT bin `k + 1`; the last bin is Nyquist. A frame is kept
//! in polar form (magnitude, phase) unless converted to cartesian form, in
//! which case the two arrays hold the real and imaginary parts.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sk_core::{SkError, SkResult};

/// How the bin arrays are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Representation {
    /// magnitude[], phase[]
    #[default]
    Polar,
    /// real[], imaginary[]
    Cartesian,
}

/// Blend used by [`Partials::interpolate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// Straight line in magnitude
    Linear,
    /// Straight line in log magnitude
    Exponential,
}

/// Magnitudes below this are treated as silence by exponential blends
const MIN_MAGNITUDE: f64 = 1e-12;

/// One spectral frame
#[derive(Debug, Clone, PartialEq)]
pub struct Partials {
    dc: f64,
    magnitude: Vec<f64>,
    phase: Vec<f64>,
    representation: Representation,
}

#[inline]
fn wrap_phase(phase: f64) -> f64 {
    let wrapped = (phase + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

impl Partials {
    /// Silent frame with `resolution` bins
    pub fn new(resolution: usize) -> Self {
        Self {
            dc: 0.0,
            magnitude: vec![0.0; resolution],
            phase: vec![0.0; resolution],
            representation: Representation::Polar,
        }
    }

    /// Pass-through filter: every bin (and DC) has gain 1 and zero phase
    pub fn unity(resolution: usize) -> Self {
        Self {
            dc: 1.0,
            magnitude: vec![1.0; resolution],
            phase: vec![0.0; resolution],
            representation: Representation::Polar,
        }
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.magnitude.len()
    }

    #[inline]
    pub fn representation(&self) -> Representation {
        self.representation
    }

    #[inline]
    pub fn is_cartesian(&self) -> bool {
        self.representation == Representation::Cartesian
    }

    #[inline]
    pub fn dc(&self) -> f64 {
        self.dc
    }

    #[inline]
    pub fn set_dc(&mut self, dc: f64) {
        self.dc = dc;
    }

    /// Magnitude of `bin` (0.0 when out of range)
    #[inline]
    pub fn mag(&self, bin: usize) -> f64 {
        match self.representation {
            Representation::Polar => self.magnitude.get(bin).copied().unwrap_or(0.0),
            Representation::Cartesian => self.complex(bin).norm(),
        }
    }

    /// Phase of `bin` (0.0 when out of range)
    #[inline]
    pub fn phase(&self, bin: usize) -> f64 {
        match self.representation {
            Representation::Polar => self.phase.get(bin).copied().unwrap_or(0.0),
            Representation::Cartesian => self.complex(bin).arg(),
        }
    }

    /// Set a bin in polar terms regardless of the current representation
    pub fn set_polar(&mut self, bin: usize, magnitude: f64, phase: f64) {
        if bin >= self.resolution() {
            return;
        }
        match self.representation {
            Representation::Polar => {
                self.magnitude[bin] = magnitude;
                self.phase[bin] = phase;
            }
            Representation::Cartesian => {
                let c = Complex64::from_polar(magnitude, phase);
                self.magnitude[bin] = c.re;
                self.phase[bin] = c.im;
            }
        }
    }

    /// Bin value as a complex number
    #[inline]
    pub fn complex(&self, bin: usize) -> Complex64 {
        let (Some(&a), Some(&b)) = (self.magnitude.get(bin), self.phase.get(bin)) else {
            return Complex64::new(0.0, 0.0);
        };
        match self.representation {
            Representation::Polar => Complex64::from_polar(a, b),
            Representation::Cartesian => Complex64::new(a, b),
        }
    }

    /// Set a bin from a complex value regardless of the current representation
    pub fn set_complex(&mut self, bin: usize, value: Complex64) {
        if bin >= self.resolution() {
            return;
        }
        match self.representation {
            Representation::Polar => {
                self.magnitude[bin] = value.norm();
                self.phase[bin] = value.arg();
            }
            Representation::Cartesian => {
                self.magnitude[bin] = value.re;
                self.phase[bin] = value.im;
            }
        }
    }

    /// First bin array (magnitudes, or real parts in cartesian form)
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitude
    }

    /// Second bin array (phases, or imaginary parts in cartesian form)
    pub fn phases(&self) -> &[f64] {
        &self.phase
    }

    pub fn magnitudes_mut(&mut self) -> &mut [f64] {
        &mut self.magnitude
    }

    pub fn phases_mut(&mut self) -> &mut [f64] {
        &mut self.phase
    }

    pub fn clear(&mut self) {
        self.dc = 0.0;
        self.magnitude.fill(0.0);
        self.phase.fill(0.0);
    }

    pub fn to_cartesian(&mut self) {
        if self.is_cartesian() {
            return;
        }
        for (a, b) in self.magnitude.iter_mut().zip(self.phase.iter_mut()) {
            let c = Complex64::from_polar(*a, *b);
            *a = c.re;
            *b = c.im;
        }
        self.representation = Representation::Cartesian;
    }

    pub fn to_polar(&mut self) {
        if !self.is_cartesian() {
            return;
        }
        for (a, b) in self.magnitude.iter_mut().zip(self.phase.iter_mut()) {
            let c = Complex64::new(*a, *b);
            *a = c.norm();
            *b = c.arg();
        }
        self.representation = Representation::Polar;
    }

    /// Rotate the phase of one bin
    pub fn shift_phase(&mut self, bin: usize, delta: f64) {
        if bin >= self.resolution() {
            return;
        }
        match self.representation {
            Representation::Polar => self.phase[bin] = wrap_phase(self.phase[bin] + delta),
            Representation::Cartesian => {
                let c = self.complex(bin) * Complex64::from_polar(1.0, delta);
                self.set_complex(bin, c);
            }
        }
    }

    /// Linear magnitude lookup at a fractional bin position
    pub fn mag_lerp(&self, pos: f64) -> f64 {
        if pos.is_nan() || pos < 0.0 || pos >= self.resolution() as f64 {
            return 0.0;
        }
        let index = pos.floor() as usize;
        let frac = pos - index as f64;
        let a = self.mag(index);
        if frac == 0.0 {
            return a;
        }
        let b = self.mag(index + 1);
        a + (b - a) * frac
    }

    /// Cubic (Catmull-Rom) magnitude lookup at a fractional bin position
    ///
    /// Neighbours outside the frame are clamped to the edge bins.
    pub fn mag_interpolated(&self, pos: f64) -> f64 {
        let n = self.resolution();
        if n == 0 || pos.is_nan() || pos < 0.0 || pos > (n - 1) as f64 {
            return 0.0;
        }
        let index = pos.floor() as usize;
        let t = pos - index as f64;
        let at = |i: isize| self.mag(i.clamp(0, n as isize - 1) as usize);
        let i = index as isize;
        let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));

        let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
        let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
        let c = -0.5 * p0 + 0.5 * p2;
        ((a * t + b) * t + c) * t + p1
    }

    /// `self += a * b`, bin by bin (complex multiply-accumulate)
    pub fn accumulate_product(&mut self, a: &Partials, b: &Partials) -> SkResult<()> {
        if !(self.is_cartesian() && a.is_cartesian() && b.is_cartesian()) {
            return Err(SkError::NotCartesian);
        }
        for other in [a, b] {
            if other.resolution() != self.resolution() {
                return Err(SkError::ResolutionMismatch {
                    expected: self.resolution(),
                    actual: other.resolution(),
                });
            }
        }

        self.dc += a.dc * b.dc;
        for i in 0..self.resolution() {
            let (ar, ai) = (a.magnitude[i], a.phase[i]);
            let (br, bi) = (b.magnitude[i], b.phase[i]);
            self.magnitude[i] += ar * br - ai * bi;
            self.phase[i] += ar * bi + ai * br;
        }
        Ok(())
    }

    /// Multiply by a filter frame: magnitudes multiply, phases add
    pub fn multiply(&mut self, filter: &Partials) -> SkResult<()> {
        if filter.resolution() != self.resolution() {
            return Err(SkError::ResolutionMismatch {
                expected: self.resolution(),
                actual: filter.resolution(),
            });
        }

        self.dc *= filter.dc;
        for i in 0..self.resolution() {
            let product = self.complex(i) * filter.complex(i);
            self.set_complex(i, product);
        }
        Ok(())
    }

    /// Fill the bins strictly between `first_bin` and `last_bin` by blending
    /// the two endpoints
    pub fn interpolate(&mut self, first_bin: usize, last_bin: usize, mode: InterpolationMode) {
        let (first, last) = if first_bin <= last_bin {
            (first_bin, last_bin)
        } else {
            (last_bin, first_bin)
        };
        if last >= self.resolution() || last - first < 2 {
            return;
        }

        let (m0, m1) = (self.mag(first), self.mag(last));
        let (p0, p1) = (self.phase(first), self.phase(last));
        let span = (last - first) as f64;

        for bin in first + 1..last {
            let t = (bin - first) as f64 / span;
            let magnitude = match mode {
                InterpolationMode::Linear => m0 + (m1 - m0) * t,
                InterpolationMode::Exponential => {
                    let l0 = m0.max(MIN_MAGNITUDE).ln();
                    let l1 = m1.max(MIN_MAGNITUDE).ln();
                    (l0 + (l1 - l0) * t).exp()
                }
            };
            let phase = p0 + wrap_phase(p1 - p0) * t;
            self.set_polar(bin, magnitude, wrap_phase(phase));
        }
    }

    /// Blend towards `other` by `amount` (0 = self, 1 = other)
    ///
    /// Magnitudes blend linearly, phases along the shorter arc.
    pub fn blend(&mut self, other: &Partials, amount: f64) -> SkResult<()> {
        if other.resolution() != self.resolution() {
            return Err(SkError::ResolutionMismatch {
                expected: self.resolution(),
                actual: other.resolution(),
            });
        }
        let t = amount.clamp(0.0, 1.0);

        self.dc += (other.dc - self.dc) * t;
        for bin in 0..self.resolution() {
            let (m0, m1) = (self.mag(bin), other.mag(bin));
            let (p0, p1) = (self.phase(bin), other.phase(bin));
            let phase = wrap_phase(p0 + wrap_phase(p1 - p0) * t);
            self.set_polar(bin, m0 + (m1 - m0) * t, phase);
        }
        Ok(())
    }

    /// New frame with twice the bins; the added high bins are silent
    pub fn double_resolution(&self) -> Partials {
        let n = self.resolution();
        let mut doubled = Partials::new(n * 2);
        doubled.representation = self.representation;
        doubled.dc = self.dc;
        doubled.magnitude[..n].copy_from_slice(&self.magnitude);
        doubled.phase[..n].copy_from_slice(&self.phase);
        doubled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_polar_cartesian_roundtrip() {
        let mut p = Partials::new(4);
        p.set_polar(1, 2.0, 0.5);
        p.to_cartesian();
        assert!(p.is_cartesian());
        assert_abs_diff_eq!(p.magnitudes()[1], 2.0 * 0.5f64.cos(), epsilon = 1e-12);
        p.to_polar();
        assert_abs_diff_eq!(p.mag(1), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.phase(1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_accumulate_requires_cartesian() {
        let mut acc = Partials::new(2);
        let a = Partials::unity(2);
        let b = Partials::unity(2);
        assert!(matches!(
            acc.accumulate_product(&a, &b),
            Err(SkError::NotCartesian)
        ));
    }

    #[test]
    fn test_accumulate_product() {
        let mut acc = Partials::new(2);
        acc.to_cartesian();
        let mut a = Partials::new(2);
        a.to_cartesian();
        a.set_complex(0, Complex64::new(1.0, 2.0));
        a.set_dc(2.0);
        let mut b = Partials::new(2);
        b.to_cartesian();
        b.set_complex(0, Complex64::new(3.0, -1.0));
        b.set_dc(0.5);

        acc.accumulate_product(&a, &b).unwrap();
        acc.accumulate_product(&a, &b).unwrap();

        // (1+2i)(3-i) = 5+5i, twice
        assert_abs_diff_eq!(acc.complex(0).re, 10.0);
        assert_abs_diff_eq!(acc.complex(0).im, 10.0);
        assert_abs_diff_eq!(acc.dc(), 2.0);
    }

    #[test]
    fn test_mag_lerp_and_cubic() {
        let mut p = Partials::new(4);
        for (i, m) in [0.0, 1.0, 2.0, 3.0].into_iter().enumerate() {
            p.set_polar(i, m, 0.0);
        }
        assert_abs_diff_eq!(p.mag_lerp(1.25), 1.25);
        // Cubic through a straight line stays on the line
        assert_abs_diff_eq!(p.mag_interpolated(1.5), 1.5, epsilon = 1e-12);
        assert_eq!(p.mag_lerp(-1.0), 0.0);
        assert_eq!(p.mag_interpolated(10.0), 0.0);
    }

    #[test]
    fn test_mag_lerp_past_last_bin() {
        let mut p = Partials::new(8);
        p.set_polar(7, 2.0, 0.0);
        assert_abs_diff_eq!(p.mag_lerp(7.0), 2.0);
        assert_abs_diff_eq!(p.mag_lerp(7.5), 1.0);
        assert_eq!(p.mag_lerp(8.0), 0.0);
        assert_eq!(p.mag_lerp(1e300), 0.0);
        assert_eq!(p.mag_lerp(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_interpolate_linear_and_exponential() {
        let mut p = Partials::new(8);
        p.set_polar(2, 1.0, 0.0);
        p.set_polar(6, 5.0, 0.0);
        p.interpolate(2, 6, InterpolationMode::Linear);
        assert_abs_diff_eq!(p.mag(4), 3.0, epsilon = 1e-12);

        let mut q = Partials::new(8);
        q.set_polar(0, 1.0, 0.0);
        q.set_polar(2, 100.0, 0.0);
        q.interpolate(0, 2, InterpolationMode::Exponential);
        assert_abs_diff_eq!(q.mag(1), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_double_resolution_zero_fills() {
        let mut p = Partials::new(3);
        p.set_polar(2, 4.0, 1.0);
        p.set_dc(0.5);
        let d = p.double_resolution();
        assert_eq!(d.resolution(), 6);
        assert_eq!(d.mag(2), 4.0);
        assert_eq!(d.dc(), 0.5);
        assert!(d.magnitudes()[3..].iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_shift_phase_wraps() {
        let mut p = Partials::unity(2);
        p.shift_phase(0, 3.0 * PI / 2.0);
        assert_abs_diff_eq!(p.phase(0), -PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_blend_halfway() {
        let mut a = Partials::new(2);
        a.set_polar(0, 1.0, 0.0);
        let mut b = Partials::new(2);
        b.set_polar(0, 3.0, 1.0);
        a.blend(&b, 0.5).unwrap();
        assert_abs_diff_eq!(a.mag(0), 2.0);
        assert_abs_diff_eq!(a.phase(0), 0.5);
    }
}
