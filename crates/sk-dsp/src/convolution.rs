//! Uniformly partitioned FFT convolution
//!
//! The impulse response is cut into `P` partitions of `partition_len`
//! samples, each transformed once. Input is processed in blocks of the same
//! length: each block spectrum enters a ring of the last `P` input spectra,
//! and the output spectrum is
//!
//! `Y = Σ X[(head − j) mod P] · H[j]`
//!
//! The inverse transform spans `fft_len ≥ 2·partition_len` samples; the part
//! past `partition_len` is carried over and added to the next block.

use serde::{Deserialize, Serialize};
use sk_core::{SkError, SkResult};

use crate::fft::{Fft, log2_of};
use crate::signal::Signal;
use crate::spectrum::SplitSpectrum;

/// Smallest partition length exponent
pub const MIN_PARTITION_LOG: u32 = 1;

/// Largest partition length exponent
pub const MAX_PARTITION_LOG: u32 = 18;

/// Smallest transform the engine will run
const MIN_FFT_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvolveConfig {
    /// Requested partition length; rounded to the nearest power of two
    pub partition_len: usize,
}

impl Default for ConvolveConfig {
    fn default() -> Self {
        Self {
            partition_len: 1024,
        }
    }
}

/// Nearest supported power of two
pub fn round_partition_len(requested: usize) -> usize {
    let log = (requested.max(1) as f64).log2().round() as u32;
    1 << log.clamp(MIN_PARTITION_LOG, MAX_PARTITION_LOG)
}

/// Precomputed partitioning of one impulse response, plus the running
/// state of one convolution pass
pub struct SignalConvolveSetup {
    partition_len: usize,
    fft_len: usize,
    overlap_len: usize,
    ir_len: usize,
    ir_rate: Option<u32>,
    fft: Fft,
    ir_spectra: Vec<SplitSpectrum>,
    input_spectra: Vec<SplitSpectrum>,
    accum: SplitSpectrum,
    head: usize,
    block: Vec<f64>,
    result: Vec<f64>,
    tail: Vec<f64>,
}

impl SignalConvolveSetup {
    /// Partition one channel of `ir`
    pub fn new(ir: &Signal, ir_channel: usize, partition_len: usize) -> SkResult<Self> {
        let samples = ir.channel_samples(ir_channel)?;
        let mut setup = Self::from_samples(&samples, partition_len)?;
        setup.ir_rate = Some(ir.sample_rate());
        Ok(setup)
    }

    pub fn with_config(ir: &Signal, ir_channel: usize, config: &ConvolveConfig) -> SkResult<Self> {
        Self::new(ir, ir_channel, config.partition_len)
    }

    /// Partition a raw impulse response (no sample rate attached)
    pub fn from_samples(ir: &[f64], partition_len: usize) -> SkResult<Self> {
        let (partition_len, fft_len) = Self::geometry(partition_len);
        let mut setup = Self {
            partition_len,
            fft_len,
            overlap_len: fft_len - partition_len,
            ir_len: 0,
            ir_rate: None,
            fft: Fft::new(log2_of(fft_len)?)?,
            ir_spectra: Vec::new(),
            input_spectra: Vec::new(),
            accum: SplitSpectrum::for_fft_len(fft_len),
            head: 0,
            block: vec![0.0; fft_len],
            result: vec![0.0; fft_len],
            tail: vec![0.0; fft_len - partition_len],
        };
        setup.load_ir(ir)?;
        Ok(setup)
    }

    fn geometry(requested: usize) -> (usize, usize) {
        let partition_len = round_partition_len(requested);
        (partition_len, (2 * partition_len).max(MIN_FFT_LEN))
    }

    /// Rebuild for a new impulse response and/or partition length
    pub fn reconfigure(&mut self, ir: &[f64], partition_len: usize) -> SkResult<()> {
        let (partition_len, fft_len) = Self::geometry(partition_len);
        if fft_len != self.fft_len {
            self.fft = Fft::new(log2_of(fft_len)?)?;
            self.accum = SplitSpectrum::for_fft_len(fft_len);
            self.block = vec![0.0; fft_len];
            self.result = vec![0.0; fft_len];
        }
        self.partition_len = partition_len;
        self.fft_len = fft_len;
        self.overlap_len = fft_len - partition_len;
        self.tail = vec![0.0; self.overlap_len];
        self.ir_rate = None;
        self.load_ir(ir)
    }

    fn load_ir(&mut self, ir: &[f64]) -> SkResult<()> {
        if ir.is_empty() {
            return Err(SkError::InvalidConfig("impulse response is empty".to_string()));
        }

        let count = ir.len().div_ceil(self.partition_len);
        let scale = self.fft_len as f64;
        self.ir_spectra.clear();
        for chunk in ir.chunks(self.partition_len) {
            let mut spectrum = SplitSpectrum::for_fft_len(self.fft_len);
            self.fft.forward_split(chunk, &mut spectrum)?;
            // Undo the forward normalization once so Y = X·H keeps unity gain
            spectrum.scale(scale);
            self.ir_spectra.push(spectrum);
        }
        self.input_spectra = vec![SplitSpectrum::for_fft_len(self.fft_len); count];
        self.ir_len = ir.len();
        self.reset();

        log::debug!(
            "convolution setup: ir {} samples, {} partitions of {}, fft {}",
            self.ir_len,
            count,
            self.partition_len,
            self.fft_len
        );
        Ok(())
    }

    /// Forget input history so a new pass can start
    pub fn reset(&mut self) {
        for spectrum in &mut self.input_spectra {
            spectrum.clear();
        }
        self.tail.fill(0.0);
        self.head = 0;
    }

    #[inline]
    pub fn partition_len(&self) -> usize {
        self.partition_len
    }

    #[inline]
    pub fn partition_count(&self) -> usize {
        self.ir_spectra.len()
    }

    #[inline]
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    #[inline]
    pub fn overlap_len(&self) -> usize {
        self.overlap_len
    }

    #[inline]
    pub fn ir_len(&self) -> usize {
        self.ir_len
    }

    /// Sample rate of the impulse response, when built from a [`Signal`]
    #[inline]
    pub fn ir_rate(&self) -> Option<u32> {
        self.ir_rate
    }

    /// Convolve one block of up to `partition_len` input samples and return
    /// the next `partition_len` output samples
    pub fn process_block(&mut self, input: &[f64]) -> SkResult<&[f64]> {
        let n = input.len().min(self.partition_len);
        self.block[..n].copy_from_slice(&input[..n]);
        self.block[n..].fill(0.0);

        self.fft
            .forward_split(&self.block, &mut self.input_spectra[self.head])?;

        let count = self.ir_spectra.len();
        self.accum.clear();
        for (j, h) in self.ir_spectra.iter().enumerate() {
            let x = &self.input_spectra[(self.head + count - j) % count];
            self.accum.mul_accumulate(x, h);
        }
        self.head = (self.head + 1) % count;

        self.fft.inverse_split(&self.accum, &mut self.result)?;

        for (r, t) in self.result.iter_mut().zip(&self.tail) {
            *r += t;
        }
        self.tail
            .copy_from_slice(&self.result[self.partition_len..self.fft_len]);

        Ok(&self.result[..self.partition_len])
    }
}

impl Signal {
    /// Convolve `channel` with the partitioned impulse response in `setup`,
    /// accumulating into `out_channel` of `output`
    ///
    /// `output` is grown to `sample_count + ir_len − 1` samples and that
    /// range of `out_channel` is cleared first.
    pub fn convolve_channel(
        &self,
        channel: usize,
        setup: &mut SignalConvolveSetup,
        output: &mut Signal,
        out_channel: usize,
    ) -> SkResult<()> {
        self.convolve_channel_inner(channel, setup, output, out_channel)
            .inspect_err(|e| log::warn!("convolution of channel {channel} failed: {e}"))
    }

    fn convolve_channel_inner(
        &self,
        channel: usize,
        setup: &mut SignalConvolveSetup,
        output: &mut Signal,
        out_channel: usize,
    ) -> SkResult<()> {
        self.check_channel(channel)?;
        output.check_channel(out_channel)?;
        match setup.ir_rate {
            Some(rate) if rate != self.sample_rate() => {
                return Err(SkError::SampleRateMismatch {
                    signal: self.sample_rate(),
                    other: rate,
                });
            }
            _ => {}
        }

        let input = self.channel_samples(channel)?;
        let result_len = input.len() + setup.ir_len - 1;
        output.grow_if_needed(result_len)?;
        output.clear_range(crate::signal::Channels::Single(out_channel), 0, result_len)?;
        setup.reset();

        let partition_len = setup.partition_len;
        let mut read_pos = 0;
        let mut write_pos = 0;
        while write_pos < result_len {
            let end = (read_pos + partition_len).min(input.len());
            let block = input.get(read_pos..end).unwrap_or(&[]);
            let out = setup.process_block(block)?;

            let n_out = partition_len.min(result_len - write_pos);
            for (i, &v) in out[..n_out].iter().enumerate() {
                output.add_f64(out_channel, write_pos + i, v);
            }
            write_pos += n_out;
            read_pos += partition_len;
        }
        Ok(())
    }

    /// Convolve every channel with `ir` into a new signal
    ///
    /// Channel `c` uses impulse response channel `c % ir.channel_count()`.
    pub fn convolve(&self, ir: &Signal, config: &ConvolveConfig) -> SkResult<Signal> {
        let mut output = Signal::new(
            self.data_type(),
            self.channel_count(),
            0,
            self.sample_rate(),
        )?;
        for c in 0..self.channel_count() {
            let mut setup = SignalConvolveSetup::with_config(ir, c % ir.channel_count(), config)?;
            self.convolve_channel(c, &mut setup, &mut output, c)?;
        }
        Ok(output)
    }
}
