//! sk-dsp: Signal processing engine for SigKit
//!
//! Multi-channel sample buffers and the spectral tools that operate on them.
//!
//! ## Modules
//! - `ring_buffer` - Fixed-capacity circular buffer with relative indexing
//! - `partials` - Spectral frame (DC + magnitude/phase bins)
//! - `spectrum` - Split-complex spectrum buffers
//! - `fft` - FFT backend trait, realfft backend, plan cache, `Fft` wrapper
//! - `sliding_dft` - Per-sample DFT updates
//! - `signal` - The `Signal` buffer: regions, time-domain ops, resampling,
//!   envelopes, block FFT filtering
//! - `convolution` - Uniformly partitioned FFT convolution

pub mod convolution;
pub mod fft;
pub mod partials;
pub mod ring_buffer;
pub mod signal;
pub mod sliding_dft;
pub mod spectrum;

pub use convolution::{ConvolveConfig, SignalConvolveSetup};
pub use fft::{
    Fft, FftBackend, FftPlan, PlanCache, RealFftBackend, global_plan_cache,
    init_global_plan_cache,
};
pub use partials::{InterpolationMode, Partials, Representation};
pub use ring_buffer::RingBuffer;
pub use signal::{Channels, CombineMode, CombineSpan, RegionId, Signal, SignalRegion, SignalSpec};
pub use sliding_dft::SlidingDft;
pub use spectrum::SplitSpectrum;
