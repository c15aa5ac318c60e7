//! Sample rate conversion
//!
//! Upsampling gathers: every output sample is a linear interpolation of the
//! input at a stepped [`HiResValue`] position. Downsampling scatters: every
//! input sample is split between the two nearest output samples by
//! fractional distance, the split weights are summed per output sample and
//! divided out at the end. Output samples that received no weight are
//! filled by interpolating between their nearest weighted neighbours.

use sk_core::{DataType, HiResValue, SkError, SkResult, validate_sample_rate};

use super::Signal;

/// Weight sums below this are treated as empty
const MIN_WEIGHT: f64 = 1e-12;

impl Signal {
    #[inline]
    pub fn is_weighted(&self) -> bool {
        self.weights.is_some()
    }

    /// Enter weights mode with all weight sums at zero
    pub fn enable_weights(&mut self) {
        self.weights = Some(vec![0.0; self.data.len()]);
    }

    /// Splat `value` at fractional position `pos` of `channel`
    ///
    /// Bins outside the signal are skipped, so positions past the end are
    /// accepted without effect. Returns `false` when weights
    /// mode is off or the channel is invalid.
    pub fn add_weighted_sample(&mut self, channel: usize, pos: f64, value: f64) -> bool {
        if self.weights.is_none() || channel >= self.channel_count || pos.is_nan() || pos < 0.0 {
            return false;
        }
        if pos >= self.sample_count as f64 {
            return true;
        }

        let i = pos.floor() as usize;
        let f = pos - i as f64;
        for (sample, weight) in [(i, 1.0 - f), (i + 1, f)] {
            if weight <= 0.0 {
                continue;
            }
            let Some(index) = self.index(channel, sample) else {
                continue;
            };
            let current = self.data.read_f64(index);
            self.data.write_f64(index, current + value * weight);
            if let Some(weights) = &mut self.weights {
                weights[index] += weight;
            }
        }
        true
    }

    /// Divide out accumulated weights, fill gaps and leave weights mode
    pub fn finish_weighted_samples(&mut self) -> SkResult<()> {
        let weights = self.weights.take().ok_or(SkError::WeightsDisabled)?;

        for c in 0..self.channel_count {
            let mut valid = vec![false; self.sample_count];
            for (n, slot) in valid.iter_mut().enumerate() {
                let index = n * self.channel_count + c;
                let w = weights[index];
                if w > MIN_WEIGHT {
                    let v = self.data.read_f64(index);
                    self.data.write_f64(index, v / w);
                    *slot = true;
                }
            }
            self.fill_gaps(c, &valid);
        }
        Ok(())
    }

    /// Interpolate every run of invalid samples from its valid neighbours
    fn fill_gaps(&mut self, channel: usize, valid: &[bool]) {
        let mut n = 0;
        while n < valid.len() {
            if valid[n] {
                n += 1;
                continue;
            }
            let start = n;
            while n < valid.len() && !valid[n] {
                n += 1;
            }
            let before = start.checked_sub(1).map(|p| (p, self.read_f64(channel, p)));
            let after = (n < valid.len()).then(|| (n, self.read_f64(channel, n)));

            for gap in start..n {
                let v = match (before, after) {
                    (Some((p0, v0)), Some((p1, v1))) => {
                        let t = (gap - p0) as f64 / (p1 - p0) as f64;
                        v0 + (v1 - v0) * t
                    }
                    (Some((_, v0)), None) => v0,
                    (None, Some((_, v1))) => v1,
                    (None, None) => 0.0,
                };
                self.write_f64(channel, gap, v);
            }
        }
    }

    /// Resample to `sample_rate`, keeping the data type
    ///
    /// The new length is `round(sample_count · new / old)`. Regions are
    /// rescaled by the same ratio.
    pub fn change_sample_rate(&mut self, sample_rate: u32) -> SkResult<()> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        if sample_rate == self.sample_rate {
            return Ok(());
        }

        let ratio = sample_rate as f64 / self.sample_rate as f64;
        let new_count = (self.sample_count as f64 * ratio).round() as usize;
        log::debug!(
            "resample {} -> {} Hz ({} -> {} samples, {})",
            self.sample_rate,
            sample_rate,
            self.sample_count,
            new_count,
            if ratio > 1.0 { "gather" } else { "scatter" }
        );

        let mut target = Signal::new(DataType::Double, self.channel_count, new_count, sample_rate)?;
        if ratio > 1.0 {
            self.gather_into(&mut target, 1.0 / ratio);
        } else {
            self.scatter_into(&mut target, ratio)?;
        }

        let data_type = self.data_type();
        self.data = target.data.converted(data_type);
        self.sample_count = new_count;
        self.sample_rate = sample_rate;
        self.weights = None;
        self.regions.rescale(ratio, self.last_sample_index());
        Ok(())
    }

    fn gather_into(&self, target: &mut Signal, step: f64) {
        let mut pos = HiResValue::new(0.0, step);
        for n in 0..target.sample_count {
            for c in 0..self.channel_count {
                target.write_f64(c, n, self.read_float_lerp(c, &pos));
            }
            pos.step_forward();
        }
    }

    fn scatter_into(&self, target: &mut Signal, step: f64) -> SkResult<()> {
        target.enable_weights();
        let mut pos = HiResValue::new(0.0, step);
        for n in 0..self.sample_count {
            for c in 0..self.channel_count {
                target.add_weighted_sample(c, pos.pos(), self.read_f64(c, n));
            }
            pos.step_forward();
        }
        target.finish_weighted_samples()
    }
}
