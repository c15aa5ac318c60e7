//! Split-complex spectrum buffers
//!
//! Real and imaginary parts in separate arrays, `len / 2 + 1` bins for a
//! real transform of length `len` (DC and Nyquist included).

use rustfft::num_complex::Complex64;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSpectrum {
    pub re: Vec<f64>,
    pub im: Vec<f64>,
}

impl SplitSpectrum {
    /// Zeroed spectrum for a real transform of length `fft_len`
    pub fn for_fft_len(fft_len: usize) -> Self {
        Self::with_bins(fft_len / 2 + 1)
    }

    pub fn with_bins(bins: usize) -> Self {
        Self {
            re: vec![0.0; bins],
            im: vec![0.0; bins],
        }
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.re.len()
    }

    pub fn clear(&mut self) {
        self.re.fill(0.0);
        self.im.fill(0.0);
    }

    pub fn scale(&mut self, factor: f64) {
        for (r, i) in self.re.iter_mut().zip(self.im.iter_mut()) {
            *r *= factor;
            *i *= factor;
        }
    }

    #[inline]
    pub fn get(&self, bin: usize) -> Complex64 {
        Complex64::new(self.re[bin], self.im[bin])
    }

    /// `self += a * b`, bin by bin
    pub fn mul_accumulate(&mut self, a: &SplitSpectrum, b: &SplitSpectrum) {
        let bins = self.bins().min(a.bins()).min(b.bins());
        for k in 0..bins {
            let (ar, ai) = (a.re[k], a.im[k]);
            let (br, bi) = (b.re[k], b.im[k]);
            self.re[k] += ar * br - ai * bi;
            self.im[k] += ar * bi + ai * br;
        }
    }

    pub(crate) fn load(&mut self, bins: &[Complex64]) {
        for (k, c) in bins.iter().enumerate().take(self.bins()) {
            self.re[k] = c.re;
            self.im[k] = c.im;
        }
    }

    pub(crate) fn store(&self, bins: &mut [Complex64]) {
        for (k, c) in bins.iter_mut().enumerate().take(self.bins()) {
            *c = Complex64::new(self.re[k], self.im[k]);
        }
    }
}
