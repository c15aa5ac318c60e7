//! FFT wrapper bound to one block length
//!
//! - `FftBackend` / `FftPlan`: the transform contract (real → half spectrum
//!   and back), one implementation per backend
//! - `RealFftBackend`: default backend on top of realfft
//! - `PlanCache`: plans shared per transform size, process-wide instance in
//!   [`global_plan_cache`]
//! - `Fft`: converts real blocks to/from a bound [`Partials`] frame with a
//!   backend-independent normalization (forward scaled by `1/len`, inverse
//!   such that `ifft(fft(x)) == x`)

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex64;
use sk_core::{SkError, SkResult};

use crate::partials::Partials;
use crate::spectrum::SplitSpectrum;

/// Smallest supported transform (2^6 = 64)
pub const MIN_LOG_N: u32 = 6;

/// Largest supported transform (2^19)
pub const MAX_LOG_N: u32 = 19;

// ============ Backend contract ============

/// One planned transform of a fixed length
pub trait FftPlan: Send + Sync {
    fn len(&self) -> usize;

    /// Real input of `len` samples → `len / 2 + 1` complex bins, unnormalized
    ///
    /// The input buffer may be used as scratch space.
    fn forward(&self, input: &mut [f64], output: &mut [Complex64]) -> SkResult<()>;

    /// `len / 2 + 1` complex bins → `len` real samples
    ///
    /// The spectrum buffer may be used as scratch space.
    fn inverse(&self, spectrum: &mut [Complex64], output: &mut [f64]) -> SkResult<()>;

    /// Gain of `inverse(forward(x))` relative to `x`
    fn round_trip_gain(&self) -> f64;
}

/// Produces plans for power-of-two transform sizes
pub trait FftBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn plan(&self, log_n: u32) -> SkResult<Arc<dyn FftPlan>>;
}

// ============ realfft backend ============

struct RealFftPlan {
    len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
}

impl FftPlan for RealFftPlan {
    fn len(&self) -> usize {
        self.len
    }

    fn forward(&self, input: &mut [f64], output: &mut [Complex64]) -> SkResult<()> {
        self.forward
            .process(input, output)
            .map_err(|e| SkError::Fft(e.to_string()))
    }

    fn inverse(&self, spectrum: &mut [Complex64], output: &mut [f64]) -> SkResult<()> {
        // realfft rejects non-zero imaginary parts at DC and Nyquist
        if let Some(first) = spectrum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = spectrum.last_mut() {
            last.im = 0.0;
        }
        self.inverse
            .process(spectrum, output)
            .map_err(|e| SkError::Fft(e.to_string()))
    }

    fn round_trip_gain(&self) -> f64 {
        // realfft is unnormalized in both directions
        self.len as f64
    }
}

/// Default backend: realfft (rustfft underneath)
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFftBackend;

impl FftBackend for RealFftBackend {
    fn name(&self) -> &'static str {
        "realfft"
    }

    fn plan(&self, log_n: u32) -> SkResult<Arc<dyn FftPlan>> {
        let len = validate_log_n(log_n)?;
        let mut planner = RealFftPlanner::<f64>::new();
        Ok(Arc::new(RealFftPlan {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }))
    }
}

fn validate_log_n(log_n: u32) -> SkResult<usize> {
    if (MIN_LOG_N..=MAX_LOG_N).contains(&log_n) {
        Ok(1usize << log_n)
    } else {
        Err(SkError::InvalidConfig(format!(
            "FFT size 2^{log_n} outside 2^{MIN_LOG_N}..=2^{MAX_LOG_N}"
        )))
    }
}

/// `log2(len)` when `len` is a supported power of two
pub fn log2_of(len: usize) -> SkResult<u32> {
    if !len.is_power_of_two() {
        return Err(SkError::InvalidConfig(format!(
            "FFT length {len} is not a power of two"
        )));
    }
    let log_n = len.trailing_zeros();
    validate_log_n(log_n)?;
    Ok(log_n)
}

// ============ Plan cache ============

/// Plans keyed by `log_n`, created on first use and shared afterwards
pub struct PlanCache {
    backend: Box<dyn FftBackend>,
    plans: RwLock<HashMap<u32, Arc<dyn FftPlan>>>,
}

impl PlanCache {
    pub fn new(backend: Box<dyn FftBackend>) -> Self {
        Self {
            backend,
            plans: RwLock::new(HashMap::new()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn get(&self, log_n: u32) -> SkResult<Arc<dyn FftPlan>> {
        if let Some(plan) = self.plans.read().get(&log_n) {
            return Ok(Arc::clone(plan));
        }

        let mut plans = self.plans.write();
        if let Some(plan) = plans.get(&log_n) {
            return Ok(Arc::clone(plan));
        }
        let plan = self.backend.plan(log_n)?;
        log::debug!(
            "PlanCache: created {} plan for {} points",
            self.backend.name(),
            plan.len()
        );
        plans.insert(log_n, Arc::clone(&plan));
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.plans.write().clear();
    }
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(Box::new(RealFftBackend))
    }
}

static PLAN_CACHE: OnceLock<PlanCache> = OnceLock::new();

/// Process-wide plan cache
pub fn global_plan_cache() -> &'static PlanCache {
    PLAN_CACHE.get_or_init(PlanCache::default)
}

/// Install a different backend for the process-wide cache
///
/// Returns `false` when the cache was already initialized.
pub fn init_global_plan_cache(backend: Box<dyn FftBackend>) -> bool {
    PLAN_CACHE.set(PlanCache::new(backend)).is_ok()
}

// ============ Fft ============

/// Transform context bound to one block length and one [`Partials`] frame
pub struct Fft {
    log_n: u32,
    len: usize,
    plan: Arc<dyn FftPlan>,
    partials: Partials,
    time: Vec<f64>,
    bins: Vec<Complex64>,
}

impl Fft {
    /// Bind to `len = 2^log_n` using the process-wide plan cache
    pub fn new(log_n: u32) -> SkResult<Self> {
        Self::with_cache(log_n, global_plan_cache())
    }

    pub fn with_cache(log_n: u32, cache: &PlanCache) -> SkResult<Self> {
        validate_log_n(log_n)?;
        let plan = cache.get(log_n)?;
        Ok(Self::with_plan(log_n, plan))
    }

    /// Bind to a plan from a specific backend, bypassing the cache
    pub fn with_backend(log_n: u32, backend: &dyn FftBackend) -> SkResult<Self> {
        let plan = backend.plan(log_n)?;
        Ok(Self::with_plan(log_n, plan))
    }

    fn with_plan(log_n: u32, plan: Arc<dyn FftPlan>) -> Self {
        let len = 1usize << log_n;
        Self {
            log_n,
            len,
            plan,
            partials: Partials::new(len / 2),
            time: vec![0.0; len],
            bins: vec![Complex64::new(0.0, 0.0); len / 2 + 1],
        }
    }

    #[inline]
    pub fn log_n(&self) -> u32 {
        self.log_n
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn half_len(&self) -> usize {
        self.len / 2
    }

    pub fn partials(&self) -> &Partials {
        &self.partials
    }

    pub fn partials_mut(&mut self) -> &mut Partials {
        &mut self.partials
    }

    /// Replace the bound frame (resolution must be `len / 2`)
    pub fn set_partials(&mut self, partials: Partials) -> SkResult<()> {
        self.check_resolution(&partials)?;
        self.partials = partials;
        Ok(())
    }

    fn check_resolution(&self, partials: &Partials) -> SkResult<()> {
        if partials.resolution() != self.half_len() {
            return Err(SkError::ResolutionMismatch {
                expected: self.half_len(),
                actual: partials.resolution(),
            });
        }
        Ok(())
    }

    /// Load `samples` (zero-padded or truncated to `len`) and run the forward
    /// transform into `self.bins`, scaled by `1/len`
    fn forward_bins(&mut self, samples: &[f64]) -> SkResult<()> {
        let n = samples.len().min(self.len);
        self.time[..n].copy_from_slice(&samples[..n]);
        self.time[n..].fill(0.0);

        self.plan.forward(&mut self.time, &mut self.bins)?;

        let norm = 1.0 / self.len as f64;
        for c in &mut self.bins {
            *c *= norm;
        }
        Ok(())
    }

    /// Inverse transform of `self.bins` into `out`
    fn inverse_bins(&mut self, out: &mut [f64]) -> SkResult<()> {
        self.plan.inverse(&mut self.bins, &mut self.time)?;

        let gain = self.len as f64 / self.plan.round_trip_gain();
        let n = out.len().min(self.len);
        for (o, &t) in out[..n].iter_mut().zip(&self.time) {
            *o = t * gain;
        }
        Ok(())
    }

    /// Forward transform of a real block into the bound frame (polar form)
    pub fn fft(&mut self, samples: &[f64]) -> SkResult<()> {
        self.forward_bins(samples)?;

        let partials = &mut self.partials;
        if partials.is_cartesian() {
            partials.to_polar();
        }
        partials.set_dc(self.bins[0].re);
        for (k, c) in self.bins[1..].iter().enumerate() {
            partials.set_complex(k, *c);
        }
        Ok(())
    }

    /// Inverse transform of the bound frame into `out` (up to `len` samples)
    pub fn ifft(&mut self, out: &mut [f64]) -> SkResult<()> {
        self.bins[0] = Complex64::new(self.partials.dc(), 0.0);
        for k in 0..self.half_len() {
            self.bins[k + 1] = self.partials.complex(k);
        }
        self.inverse_bins(out)
    }

    /// Apply a spectral envelope to the bound frame
    pub fn filter(&mut self, filter: &Partials) -> SkResult<()> {
        self.check_resolution(filter)?;
        self.partials.multiply(filter)
    }

    /// Rotate the phase of one bin of the bound frame
    pub fn shift_phase(&mut self, bin: usize, delta: f64) {
        self.partials.shift_phase(bin, delta);
    }

    /// Forward transform into a split-complex buffer
    pub fn forward_split(&mut self, samples: &[f64], out: &mut SplitSpectrum) -> SkResult<()> {
        self.forward_bins(samples)?;
        out.load(&self.bins);
        Ok(())
    }

    /// Inverse transform of a split-complex buffer
    pub fn inverse_split(&mut self, spectrum: &SplitSpectrum, out: &mut [f64]) -> SkResult<()> {
        spectrum.store(&mut self.bins);
        self.inverse_bins(out)
    }
}
