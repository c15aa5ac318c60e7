//! Bulk time-domain operations
//!
//! All values pass through the normalized `f64` accessors, so every operation
//! works on any storage format. Integer formats saturate on overflow.

use serde::{Deserialize, Serialize};
use sk_core::{SkError, SkResult};

use super::{Channels, Signal};

/// How source values are merged into the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineMode {
    #[default]
    Replace,
    Add,
    Subtract,
    Multiply,
}

impl CombineMode {
    #[inline]
    pub fn apply(self, dst: f64, src: f64) -> f64 {
        match self {
            CombineMode::Replace => src,
            CombineMode::Add => dst + src,
            CombineMode::Subtract => dst - src,
            CombineMode::Multiply => dst * src,
        }
    }
}

/// Source/destination placement for [`Signal::combine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombineSpan {
    pub src_channel: usize,
    pub src_offset: usize,
    pub dst_channel: usize,
    pub dst_offset: usize,
    pub length: usize,
}

impl CombineSpan {
    /// Same channel, whole length of `src`, starting at zero
    pub fn channel(channel: usize, length: usize) -> Self {
        Self {
            src_channel: channel,
            dst_channel: channel,
            length,
            ..Self::default()
        }
    }
}

impl Signal {
    /// Apply `f(channel, sample_index, value) -> value` over a range
    fn map_range(
        &mut self,
        channels: Channels,
        offset: usize,
        length: usize,
        mut f: impl FnMut(usize, usize, f64) -> f64,
    ) -> SkResult<()> {
        let selected = channels.resolve(self.channel_count)?;
        self.check_range(offset, length)?;
        for n in offset..offset + length {
            for c in selected.clone() {
                let v = self.read_f64(c, n);
                self.write_f64(c, n, f(c, n, v));
            }
        }
        Ok(())
    }

    /// Zero every sample
    pub fn clear(&mut self) {
        self.data.fill_zero();
    }

    pub fn clear_range(&mut self, channels: Channels, offset: usize, length: usize) -> SkResult<()> {
        if channels == Channels::All {
            self.check_range(offset, length)?;
            self.data
                .zero_range(offset * self.channel_count, length * self.channel_count);
            return Ok(());
        }
        self.map_range(channels, offset, length, |_, _, _| 0.0)
    }

    /// Become a copy of `src`: shape, samples and regions
    pub fn copy_from(&mut self, src: &Signal) {
        self.clone_from(src);
    }

    /// Merge a span of `src` into this signal, growing it if the span ends
    /// past the last sample
    pub fn combine(&mut self, src: &Signal, span: CombineSpan, mode: CombineMode) -> SkResult<()> {
        src.check_channel(span.src_channel)?;
        src.check_range(span.src_offset, span.length)?;
        self.check_channel(span.dst_channel)?;

        let end = span
            .dst_offset
            .checked_add(span.length)
            .ok_or(SkError::OutOfRange {
                offset: span.dst_offset,
                length: span.length,
                limit: usize::MAX,
            })?;
        self.grow_if_needed(end)?;

        for i in 0..span.length {
            let s = src.read_f64(span.src_channel, span.src_offset + i);
            let n = span.dst_offset + i;
            let d = self.read_f64(span.dst_channel, n);
            self.write_f64(span.dst_channel, n, mode.apply(d, s));
        }
        Ok(())
    }

    /// Merge a constant into a range
    pub fn combine_value(
        &mut self,
        channels: Channels,
        offset: usize,
        length: usize,
        value: f64,
        mode: CombineMode,
    ) -> SkResult<()> {
        self.map_range(channels, offset, length, |_, _, v| mode.apply(v, value))
    }

    /// Add `src` scaled by `gain` starting at `offset`
    ///
    /// Channel `c` receives source channel `c % src.channel_count()`, so a
    /// mono source is spread over every channel.
    pub fn mix(&mut self, src: &Signal, offset: usize, gain: f64) -> SkResult<()> {
        if src.sample_rate != self.sample_rate {
            return Err(SkError::SampleRateMismatch {
                signal: self.sample_rate,
                other: src.sample_rate,
            });
        }
        self.grow_if_needed(offset + src.sample_count)?;

        for n in 0..src.sample_count {
            for c in 0..self.channel_count {
                let s = src.read_f64(c % src.channel_count, n);
                self.add_f64(c, offset + n, s * gain);
            }
        }
        Ok(())
    }

    /// Reverse a range in place
    pub fn reverse(&mut self, channels: Channels, offset: usize, length: usize) -> SkResult<()> {
        let selected = channels.resolve(self.channel_count)?;
        self.check_range(offset, length)?;
        if length < 2 {
            return Ok(());
        }

        for c in selected {
            let (mut lo, mut hi) = (offset, offset + length - 1);
            while lo < hi {
                let a = self.read_f64(c, lo);
                let b = self.read_f64(c, hi);
                self.write_f64(c, lo, b);
                self.write_f64(c, hi, a);
                lo += 1;
                hi -= 1;
            }
        }
        Ok(())
    }

    /// First difference `y[n] = x[n] - x[n-1]`, with `x[offset-1]` taken as 0
    pub fn derivative(&mut self, channels: Channels, offset: usize, length: usize) -> SkResult<()> {
        let mut previous = vec![0.0; self.channel_count];
        self.map_range(channels, offset, length, |c, _, v| {
            let d = v - previous[c];
            previous[c] = v;
            d
        })
    }

    /// Multiply a range by `gain`
    pub fn scale(&mut self, channels: Channels, offset: usize, length: usize, gain: f64) -> SkResult<()> {
        self.map_range(channels, offset, length, |_, _, v| v * gain)
    }

    /// Linear gain ramp from `from_gain` to `to_gain` across the range
    pub fn fade(
        &mut self,
        channels: Channels,
        offset: usize,
        length: usize,
        from_gain: f64,
        to_gain: f64,
    ) -> SkResult<()> {
        let span = length.saturating_sub(1).max(1) as f64;
        self.map_range(channels, offset, length, |_, n, v| {
            let t = (n - offset) as f64 / span;
            v * (from_gain + (to_gain - from_gain) * t)
        })
    }

    /// Soft clipping `tanh(drive·x) / tanh(drive)`
    pub fn distortion(
        &mut self,
        channels: Channels,
        offset: usize,
        length: usize,
        drive: f64,
    ) -> SkResult<()> {
        if !(drive > 0.0 && drive.is_finite()) {
            return Err(SkError::InvalidConfig(format!(
                "distortion drive must be positive, got {drive}"
            )));
        }
        let norm = drive.tanh();
        self.map_range(channels, offset, length, |_, _, v| (v * drive).tanh() / norm)
    }

    /// Largest absolute sample value in a range
    pub fn peak(&self, channels: Channels, offset: usize, length: usize) -> SkResult<f64> {
        let selected = channels.resolve(self.channel_count)?;
        self.check_range(offset, length)?;
        let mut peak = 0.0f64;
        for n in offset..offset + length {
            for c in selected.clone() {
                peak = peak.max(self.read_f64(c, n).abs());
            }
        }
        Ok(peak)
    }

    /// Root mean square over a range (0 for an empty range)
    pub fn rms(&self, channels: Channels, offset: usize, length: usize) -> SkResult<f64> {
        let selected = channels.resolve(self.channel_count)?;
        self.check_range(offset, length)?;
        let count = length * selected.len();
        if count == 0 {
            return Ok(0.0);
        }
        let mut sum = 0.0;
        for n in offset..offset + length {
            for c in selected.clone() {
                let v = self.read_f64(c, n);
                sum += v * v;
            }
        }
        Ok((sum / count as f64).sqrt())
    }

    /// Scale so the peak of the selected channels equals `target`
    ///
    /// Returns the applied gain; silence is left untouched (gain 1).
    pub fn normalize(&mut self, channels: Channels, target: f64) -> SkResult<f64> {
        let peak = self.peak(channels, 0, self.sample_count)?;
        if peak == 0.0 {
            return Ok(1.0);
        }
        let gain = target / peak;
        self.scale(channels, 0, self.sample_count, gain)?;
        Ok(gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sk_core::DataType;

    fn ramp(len: usize) -> Signal {
        let samples: Vec<f64> = (0..len).map(|i| i as f64 * 0.1).collect();
        Signal::from_samples(&samples, 48000).unwrap()
    }

    #[test]
    fn test_combine_modes() {
        let src = Signal::from_samples(&[0.5, 0.25], 48000).unwrap();
        let mut dst = Signal::from_samples(&[0.1, 0.2], 48000).unwrap();

        dst.combine(&src, CombineSpan::channel(0, 2), CombineMode::Add).unwrap();
        assert_abs_diff_eq!(dst.read_f64(0, 0), 0.6, epsilon = 1e-12);

        dst.combine(&src, CombineSpan::channel(0, 2), CombineMode::Subtract).unwrap();
        assert_abs_diff_eq!(dst.read_f64(0, 1), 0.2, epsilon = 1e-12);

        dst.combine(&src, CombineSpan::channel(0, 2), CombineMode::Multiply).unwrap();
        assert_abs_diff_eq!(dst.read_f64(0, 0), 0.05, epsilon = 1e-12);

        dst.combine(&src, CombineSpan::channel(0, 2), CombineMode::Replace).unwrap();
        assert_eq!(dst.channel_samples(0).unwrap(), vec![0.5, 0.25]);
    }

    #[test]
    fn test_combine_grows_destination() {
        let src = Signal::from_samples(&[1.0, 1.0], 48000).unwrap();
        let mut dst = Signal::new(DataType::Float, 1, 1, 48000).unwrap();
        let span = CombineSpan {
            dst_offset: 3,
            length: 2,
            ..CombineSpan::default()
        };
        dst.combine(&src, span, CombineMode::Add).unwrap();
        assert_eq!(dst.sample_count(), 5);
        assert_eq!(dst.read_f64(0, 4), 1.0);
    }

    #[test]
    fn test_combine_checks_source_range() {
        let src = Signal::from_samples(&[1.0], 48000).unwrap();
        let mut dst = ramp(4);
        let result = dst.combine(&src, CombineSpan::channel(0, 2), CombineMode::Add);
        assert!(matches!(result, Err(SkError::OutOfRange { .. })));
    }

    #[test]
    fn test_mix_spreads_mono() {
        let src = Signal::from_samples(&[0.5, 0.5], 48000).unwrap();
        let mut dst = Signal::new(DataType::Double, 2, 2, 48000).unwrap();
        dst.mix(&src, 1, 0.5).unwrap();
        assert_eq!(dst.sample_count(), 3);
        for c in 0..2 {
            assert_eq!(dst.channel_samples(c).unwrap(), vec![0.0, 0.25, 0.25]);
        }
    }

    #[test]
    fn test_mix_rejects_rate_mismatch() {
        let src = Signal::from_samples(&[0.5], 44100).unwrap();
        let mut dst = ramp(2);
        assert!(matches!(
            dst.mix(&src, 0, 1.0),
            Err(SkError::SampleRateMismatch { signal: 48000, other: 44100 })
        ));
    }

    #[test]
    fn test_reverse() {
        let mut s = ramp(5);
        s.reverse(Channels::All, 1, 3).unwrap();
        let got = s.channel_samples(0).unwrap();
        let want = [0.0, 0.3, 0.2, 0.1, 0.4];
        for (g, w) in got.iter().zip(want) {
            assert_abs_diff_eq!(*g, w, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_derivative() {
        let mut s = ramp(4);
        s.derivative(Channels::Single(0), 0, 4).unwrap();
        let got = s.channel_samples(0).unwrap();
        assert_abs_diff_eq!(got[0], 0.0, epsilon = 1e-12);
        for v in &got[1..] {
            assert_abs_diff_eq!(*v, 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize() {
        let mut s = Signal::from_samples(&[0.1, -0.4, 0.2], 48000).unwrap();
        let gain = s.normalize(Channels::All, 0.8).unwrap();
        assert_abs_diff_eq!(gain, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.peak(Channels::All, 0, 3).unwrap(), 0.8, epsilon = 1e-12);

        let mut silent = Signal::new(DataType::Float, 1, 8, 48000).unwrap();
        assert_eq!(silent.normalize(Channels::All, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_fade_out() {
        let mut s = Signal::from_samples(&[1.0; 5], 48000).unwrap();
        s.fade(Channels::All, 0, 5, 1.0, 0.0).unwrap();
        let got = s.channel_samples(0).unwrap();
        let want = [1.0, 0.75, 0.5, 0.25, 0.0];
        for (g, w) in got.iter().zip(want) {
            assert_abs_diff_eq!(*g, w, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_distortion_keeps_full_scale() {
        let mut s = Signal::from_samples(&[1.0, -1.0, 0.1], 48000).unwrap();
        s.distortion(Channels::All, 0, 3, 4.0).unwrap();
        assert_abs_diff_eq!(s.read_f64(0, 0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.read_f64(0, 1), -1.0, epsilon = 1e-12);
        assert!(s.read_f64(0, 2) > 0.1);

        assert!(s.distortion(Channels::All, 0, 3, 0.0).is_err());
    }

    #[test]
    fn test_rms() {
        let s = Signal::from_samples(&[1.0, -1.0, 1.0, -1.0], 48000).unwrap();
        assert_abs_diff_eq!(s.rms(Channels::All, 0, 4).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clear_range_single_channel() {
        let mut s = Signal::new(DataType::Int16, 2, 4, 48000).unwrap();
        s.combine_value(Channels::All, 0, 4, 0.5, CombineMode::Replace).unwrap();
        s.clear_range(Channels::Single(1), 1, 2).unwrap();
        assert_eq!(s.read::<i16>(0, 1), 16384);
        assert_eq!(s.read::<i16>(1, 1), 0);
        assert_eq!(s.read::<i16>(1, 3), 16384);
    }

    #[test]
    fn test_copy_from() {
        let src = ramp(3);
        let mut dst = Signal::default();
        dst.copy_from(&src);
        assert_eq!(dst.spec(), src.spec());
        assert_eq!(dst.channel_samples(0).unwrap(), src.channel_samples(0).unwrap());
    }
}
