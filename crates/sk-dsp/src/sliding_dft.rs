//! Sliding DFT
//!
//! Updates an N-point DFT one sample at a time instead of recomputing a
//! whole block. Each bin follows
//!
//! `S[k] = twiddle[k] · (r·S[k] − r^N·x_old + x_new)`
//!
//! where `r` sits slightly below 1 so rounding errors decay instead of
//! accumulating. A Hann-windowed spectrum is derived from `S` with the
//! 3-point kernel `0.5·S[k] − 0.25·(S[k−1] + S[k+1])`.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;
use sk_core::{SkError, SkResult};

/// Damping factor `r`
const DAMPING: f64 = 0.999_999_9;

pub struct SlidingDft {
    n: usize,
    history: Vec<f64>,
    pos: usize,
    pushed: usize,
    r: f64,
    r_n: f64,
    twiddle: Vec<Complex64>,
    raw: Vec<Complex64>,
    windowed: Vec<Complex64>,
}

impl SlidingDft {
    pub fn new(n: usize) -> SkResult<Self> {
        if n < 2 {
            return Err(SkError::InvalidConfig(format!(
                "sliding DFT needs at least 2 points, got {n}"
            )));
        }

        let twiddle = (0..n)
            .map(|k| Complex64::from_polar(1.0, 2.0 * PI * k as f64 / n as f64))
            .collect();

        Ok(Self {
            n,
            history: vec![0.0; n],
            pos: 0,
            pushed: 0,
            r: DAMPING,
            r_n: DAMPING.powi(n as i32),
            twiddle,
            raw: vec![Complex64::new(0.0, 0.0); n],
            windowed: vec![Complex64::new(0.0, 0.0); n],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// True once a full window of samples has been pushed
    #[inline]
    pub fn is_data_valid(&self) -> bool {
        self.pushed >= self.n
    }

    /// Push one sample and update every bin
    pub fn push(&mut self, sample: f64) {
        let old = self.history[self.pos];
        self.history[self.pos] = sample;
        self.pos = (self.pos + 1) % self.n;
        if self.pushed < self.n {
            self.pushed += 1;
        }

        let delta = sample - self.r_n * old;
        for (s, &w) in self.raw.iter_mut().zip(&self.twiddle) {
            *s = w * (*s * self.r + delta);
        }

        let n = self.n;
        for k in 0..n {
            let prev = self.raw[(k + n - 1) % n];
            let next = self.raw[(k + 1) % n];
            self.windowed[k] = self.raw[k] * 0.5 - (prev + next) * 0.25;
        }
    }

    pub fn push_slice(&mut self, samples: &[f64]) {
        for &s in samples {
            self.push(s);
        }
    }

    /// Hann-windowed spectrum
    pub fn dft(&self) -> &[Complex64] {
        &self.windowed
    }

    /// Unwindowed spectrum
    pub fn raw(&self) -> &[Complex64] {
        &self.raw
    }

    pub fn magnitude(&self, bin: usize) -> f64 {
        self.windowed.get(bin).map(|c| c.norm()).unwrap_or(0.0)
    }

    pub fn phase(&self, bin: usize) -> f64 {
        self.windowed.get(bin).map(|c| c.arg()).unwrap_or(0.0)
    }

    /// Center frequency of `bin` in Hz
    #[inline]
    pub fn bin_freq(&self, bin: usize, sample_rate: f64) -> f64 {
        sample_rate * bin as f64 / self.n as f64
    }

    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.raw.fill(Complex64::new(0.0, 0.0));
        self.windowed.fill(Complex64::new(0.0, 0.0));
        self.pos = 0;
        self.pushed = 0;
    }
}
