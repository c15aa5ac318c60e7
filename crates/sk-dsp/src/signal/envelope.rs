//! Amplitude envelopes
//!
//! The gain curve blends a linear ramp with an exponential one:
//! `gain = shape·linear + (1 − shape)·exponential`. The exponential part
//! multiplies by a fixed release coefficient per sample and always starts
//! from the higher of the two levels, so attacks are generated back to front.

use sk_core::{SampleFormat, SkResult, convert_sample, with_samples};

use super::{Channels, Signal};

/// Floor applied to both levels before taking logarithms
pub const MIN_LEVEL: f64 = 1e-5;

/// Per-sample multiplier taking `from` to `to` over `n` samples
fn release_coefficient(from: f64, to: f64, n: usize) -> f64 {
    let from = from.max(MIN_LEVEL);
    let to = to.max(MIN_LEVEL);
    (1.0 + (to.ln() - from.ln()) / n as f64).clamp(0.0, 1.0)
}

/// Gain for each of `n` samples
fn envelope_gains(n: usize, start: f64, end: f64, shape: f64) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let shape = shape.clamp(0.0, 1.0);
    let span = n.saturating_sub(1).max(1) as f64;

    let hi = start.max(end);
    let lo = start.min(end);
    let coef = release_coefficient(hi, lo, n);

    let mut exponential = vec![0.0; n];
    let mut level = hi.max(MIN_LEVEL);
    let decay = start >= end;
    for i in 0..n {
        let slot = if decay { i } else { n - 1 - i };
        exponential[slot] = level;
        level *= coef;
    }

    exponential
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let linear = start + (end - start) * i as f64 / span;
            shape * linear + (1.0 - shape) * e
        })
        .collect()
}

fn apply_gains<T: SampleFormat>(
    samples: &mut [T],
    channel_count: usize,
    channels: std::ops::Range<usize>,
    offset: usize,
    gains: &[f64],
) {
    for (i, &g) in gains.iter().enumerate() {
        let frame = (offset + i) * channel_count;
        for c in channels.clone() {
            let slot = &mut samples[frame + c];
            let v: f64 = convert_sample(*slot);
            *slot = convert_sample(v * g);
        }
    }
}

impl Signal {
    /// Multiply a range by an envelope going from `start_level` to
    /// `end_level`
    ///
    /// `shape` 1.0 is a straight line, 0.0 a pure exponential curve.
    pub fn envelope(
        &mut self,
        channels: Channels,
        offset: usize,
        length: usize,
        start_level: f64,
        end_level: f64,
        shape: f64,
    ) -> SkResult<()> {
        let selected = channels.resolve(self.channel_count)?;
        self.check_range(offset, length)?;
        if length == 0 {
            return Ok(());
        }

        let gains = envelope_gains(length, start_level, end_level, shape);
        let channel_count = self.channel_count;
        with_samples!(&mut self.data, v => {
            apply_gains(v, channel_count, selected, offset, &gains)
        });
        Ok(())
    }
}
