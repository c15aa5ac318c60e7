//! Block-wise FFT filtering (overlap-add STFT)
//!
//! For a filter frame of `R` bins the block is `2R` samples and the hop is
//! `R/4`. Each block gets an analysis taper that is flat over its central
//! two hops and rises/falls as half a Hann window over the three hops on
//! either side. After filtering, only the central two hops are kept, shaped
//! by a periodic Hann window, so consecutive hops sum to unity gain.

use std::f64::consts::PI;

use sk_core::{SkError, SkResult};

use super::Signal;
use crate::fft::{Fft, log2_of};
use crate::partials::Partials;
use crate::ring_buffer::RingBuffer;

struct FilterGeometry {
    step: usize,
    block: usize,
    window: usize,
}

impl FilterGeometry {
    fn new(resolution: usize) -> SkResult<Self> {
        if resolution < 4 || !resolution.is_power_of_two() {
            return Err(SkError::InvalidConfig(format!(
                "filter resolution must be a power of two >= 4, got {resolution}"
            )));
        }
        let step = resolution / 4;
        Ok(Self {
            step,
            block: 8 * step,
            window: 2 * step,
        })
    }

    /// Flat center of `2·step`, half-Hann ramps of `3·step` on each side
    fn analysis_taper(&self) -> Vec<f64> {
        let ramp = 3 * self.step;
        (0..self.block)
            .map(|j| {
                let edge = if j < ramp {
                    j
                } else if j >= self.block - ramp {
                    self.block - j
                } else {
                    return 1.0;
                };
                0.5 - 0.5 * (PI * edge as f64 / ramp as f64).cos()
            })
            .collect()
    }

    /// Periodic Hann over `window` samples
    fn synthesis_taper(&self) -> Vec<f64> {
        (0..self.window)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / self.window as f64).cos())
            .collect()
    }
}

/// Filter one channel's samples, returning the same number of samples
fn filter_samples(input: &[f64], filter: &Partials) -> SkResult<Vec<f64>> {
    let geometry = FilterGeometry::new(filter.resolution())?;
    let step = geometry.step;
    let block_n = geometry.block;

    let mut fft = Fft::new(log2_of(block_n)?)?;
    let analysis = geometry.analysis_taper();
    let synthesis = geometry.synthesis_taper();

    let sample_at = |n: usize| input.get(n).copied().unwrap_or(0.0);

    // Hop h covers input [h·step − 4·step, h·step + 4·step)
    let mut ring = RingBuffer::<f64>::new(block_n)?;
    for _ in 0..4 * step {
        ring.write(0.0);
    }
    for n in 0..4 * step {
        ring.write(sample_at(n));
    }

    let mut output = vec![0.0; input.len()];
    let mut block = vec![0.0; block_n];
    let mut filtered = vec![0.0; block_n];
    let mut next_input = 4 * step;
    let mut hop_start = 0usize;

    // hop_start tracks h·step; the kept region starts one step earlier
    while hop_start < input.len() + step {
        ring.copy_block(ring.write_pos(), &mut block);
        for (b, w) in block.iter_mut().zip(&analysis) {
            *b *= w;
        }

        fft.fft(&block)?;
        fft.filter(filter)?;
        fft.ifft(&mut filtered)?;

        let center = 3 * step;
        for (i, w) in synthesis.iter().enumerate() {
            let Some(out) = (hop_start + i).checked_sub(step) else {
                continue;
            };
            if let Some(slot) = output.get_mut(out) {
                *slot += filtered[center + i] * w;
            }
        }

        for _ in 0..step {
            ring.write(sample_at(next_input));
            next_input += 1;
        }
        hop_start += step;
    }

    Ok(output)
}

impl Signal {
    /// Filter every channel with a spectral envelope
    pub fn apply_filter_fft(&mut self, filter: &Partials, filter_rate: u32) -> SkResult<()> {
        for channel in 0..self.channel_count {
            self.apply_filter_fft_to_channel(channel, filter, filter_rate)?;
        }
        Ok(())
    }

    /// Filter one channel with a spectral envelope
    ///
    /// `filter` must have been designed for this signal's sample rate; its
    /// resolution sets the block size (`2 · resolution` samples).
    pub fn apply_filter_fft_to_channel(
        &mut self,
        channel: usize,
        filter: &Partials,
        filter_rate: u32,
    ) -> SkResult<()> {
        self.filter_channel(channel, filter, filter_rate)
            .inspect_err(|e| log::warn!("FFT filter on channel {channel} failed: {e}"))
    }

    fn filter_channel(&mut self, channel: usize, filter: &Partials, filter_rate: u32) -> SkResult<()> {
        if filter_rate != self.sample_rate {
            return Err(SkError::SampleRateMismatch {
                signal: self.sample_rate,
                other: filter_rate,
            });
        }
        let input = self.channel_samples(channel)?;
        let output = filter_samples(&input, filter)?;
        self.write_channel(channel, 0, &output)
    }
}
