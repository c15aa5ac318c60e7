//! Multi-channel sample buffer
//!
//! Samples are stored interleaved in a single tagged buffer
//! (`index = sample * channel_count + channel`) in one of the five
//! [`DataType`]s. Per-sample accessors are total: an invalid channel or
//! sample index reads as zero and writes report `false`.

mod envelope;
mod filter;
mod ops;
mod region;
mod resample;

pub use envelope::MIN_LEVEL;
pub use ops::{CombineMode, CombineSpan};
pub use region::{RegionId, SignalRegion};

use std::ops::Range;

use serde::{Deserialize, Serialize};
use sk_core::{
    DEFAULT_SAMPLE_RATE, DataType, HiResValue, SampleData, SampleFormat, SkError, SkResult,
    validate_channel_count, validate_sample_rate,
};

use region::RegionList;

/// Shape of a signal, as accepted by [`Signal::from_spec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSpec {
    pub data_type: DataType,
    pub channel_count: usize,
    pub sample_count: usize,
    pub sample_rate: u32,
}

impl Default for SignalSpec {
    fn default() -> Self {
        Self {
            data_type: DataType::Float,
            channel_count: 1,
            sample_count: 0,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Channel selector for bulk operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Channels {
    #[default]
    All,
    Single(usize),
}

impl Channels {
    /// Channel indices selected out of `channel_count`
    pub fn resolve(self, channel_count: usize) -> SkResult<Range<usize>> {
        match self {
            Channels::All => Ok(0..channel_count),
            Channels::Single(channel) if channel < channel_count => Ok(channel..channel + 1),
            Channels::Single(channel) => Err(SkError::InvalidChannel {
                channel,
                count: channel_count,
            }),
        }
    }

    #[inline]
    pub fn contains(self, channel: usize) -> bool {
        match self {
            Channels::All => true,
            Channels::Single(c) => c == channel,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Signal {
    data: SampleData,
    channel_count: usize,
    sample_count: usize,
    sample_rate: u32,
    /// Per-element weight sums, present only in weights mode
    weights: Option<Vec<f64>>,
    regions: RegionList,
}

impl Default for Signal {
    fn default() -> Self {
        let spec = SignalSpec::default();
        Self {
            data: SampleData::zeroed(spec.data_type, 0),
            channel_count: spec.channel_count,
            sample_count: 0,
            sample_rate: spec.sample_rate,
            weights: None,
            regions: RegionList::default(),
        }
    }
}

fn storage_len(channel_count: usize, sample_count: usize) -> SkResult<usize> {
    sample_count.checked_mul(channel_count).ok_or_else(|| {
        SkError::Allocation(format!(
            "{sample_count} samples x {channel_count} channels overflows"
        ))
    })
}

impl Signal {
    /// Zeroed signal
    pub fn new(
        data_type: DataType,
        channel_count: usize,
        sample_count: usize,
        sample_rate: u32,
    ) -> SkResult<Self> {
        let mut signal = Self::default();
        signal.configure(data_type, channel_count, sample_count, sample_rate)?;
        Ok(signal)
    }

    pub fn from_spec(spec: &SignalSpec) -> SkResult<Self> {
        Self::new(
            spec.data_type,
            spec.channel_count,
            spec.sample_count,
            spec.sample_rate,
        )
    }

    /// Single-channel `Double` signal holding `samples`
    pub fn from_samples(samples: &[f64], sample_rate: u32) -> SkResult<Self> {
        let mut signal = Self::new(DataType::Double, 1, samples.len(), sample_rate)?;
        signal.data = SampleData::Double(samples.to_vec());
        Ok(signal)
    }

    /// (Re)allocate zeroed storage for the given shape
    ///
    /// Drops weights mode. Regions are kept and clamped to the new length.
    pub fn configure(
        &mut self,
        data_type: DataType,
        channel_count: usize,
        sample_count: usize,
        sample_rate: u32,
    ) -> SkResult<()> {
        let channel_count = validate_channel_count(channel_count)?;
        let sample_rate = validate_sample_rate(sample_rate)?;
        let len = storage_len(channel_count, sample_count)?;

        log::debug!(
            "configure signal: {} x {} ch x {} samples @ {} Hz",
            data_type.name(),
            channel_count,
            sample_count,
            sample_rate
        );

        self.data = SampleData::zeroed(data_type, len);
        self.channel_count = channel_count;
        self.sample_count = sample_count;
        self.sample_rate = sample_rate;
        self.weights = None;
        self.regions.clamp_all(self.last_sample_index());
        Ok(())
    }

    pub fn spec(&self) -> SignalSpec {
        SignalSpec {
            data_type: self.data_type(),
            channel_count: self.channel_count,
            sample_count: self.sample_count,
            sample_rate: self.sample_rate,
        }
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Relabel the sample rate without touching the samples
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> SkResult<()> {
        self.sample_rate = validate_sample_rate(sample_rate)?;
        Ok(())
    }

    /// Index of the last sample, `None` when empty
    #[inline]
    pub fn last_sample_index(&self) -> Option<usize> {
        self.sample_count.checked_sub(1)
    }

    /// Size of the sample storage in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.byte_len()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut SampleData {
        &mut self.data
    }

    /// Re-encode the storage in another format
    pub fn convert_data_type(&mut self, data_type: DataType) {
        if data_type != self.data_type() {
            self.data = self.data.converted(data_type);
        }
    }

    /// Extend to at least `sample_count` samples, zero-filling new frames
    pub fn grow_if_needed(&mut self, sample_count: usize) -> SkResult<()> {
        if sample_count > self.sample_count {
            self.set_sample_count(sample_count)?;
        }
        Ok(())
    }

    /// Resize to exactly `sample_count` samples
    pub fn set_sample_count(&mut self, sample_count: usize) -> SkResult<()> {
        let len = storage_len(self.channel_count, sample_count)?;
        self.data.resize(len);
        if let Some(weights) = &mut self.weights {
            weights.resize(len, 0.0);
        }
        self.sample_count = sample_count;
        self.regions.clamp_all(self.last_sample_index());
        Ok(())
    }

    // ============ Checks ============

    pub(crate) fn check_channel(&self, channel: usize) -> SkResult<()> {
        if channel < self.channel_count {
            Ok(())
        } else {
            Err(SkError::InvalidChannel {
                channel,
                count: self.channel_count,
            })
        }
    }

    pub(crate) fn check_range(&self, offset: usize, length: usize) -> SkResult<()> {
        match offset.checked_add(length) {
            Some(end) if end <= self.sample_count => Ok(()),
            _ => Err(SkError::OutOfRange {
                offset,
                length,
                limit: self.sample_count,
            }),
        }
    }

    // ============ Per-sample access ============

    /// Storage index of (`channel`, `sample`), `None` when out of range
    #[inline]
    pub fn index(&self, channel: usize, sample: usize) -> Option<usize> {
        (channel < self.channel_count && sample < self.sample_count)
            .then(|| sample * self.channel_count + channel)
    }

    /// Read converted to `T` (zero when out of range)
    #[inline]
    pub fn read<T: SampleFormat>(&self, channel: usize, sample: usize) -> T {
        match self.index(channel, sample) {
            Some(i) => self.data.read(i),
            None => T::default(),
        }
    }

    /// Write converting from `T`; `false` when out of range
    #[inline]
    pub fn write<T: SampleFormat>(&mut self, channel: usize, sample: usize, value: T) -> bool {
        match self.index(channel, sample) {
            Some(i) => self.data.write(i, value),
            None => false,
        }
    }

    /// Normalized read (integer formats map to [-1, 1))
    #[inline]
    pub fn read_f64(&self, channel: usize, sample: usize) -> f64 {
        self.read::<f64>(channel, sample)
    }

    #[inline]
    pub fn write_f64(&mut self, channel: usize, sample: usize, value: f64) -> bool {
        self.write::<f64>(channel, sample, value)
    }

    /// Accumulate into one sample
    #[inline]
    pub fn add_f64(&mut self, channel: usize, sample: usize, value: f64) -> bool {
        match self.index(channel, sample) {
            Some(i) => {
                let current = self.data.read_f64(i);
                self.data.write_f64(i, current + value)
            }
            None => false,
        }
    }

    /// Linear interpolation at a fractional position
    ///
    /// A neighbour outside the signal contributes zero.
    pub fn read_float_lerp(&self, channel: usize, pos: &HiResValue) -> f64 {
        let at = |i: i64| -> f64 {
            if i < 0 {
                0.0
            } else {
                self.read_f64(channel, i as usize)
            }
        };
        let i = pos.int_part();
        let f = pos.frac_part();
        at(i) * (1.0 - f) + at(i + 1) * f
    }

    // ============ Channel views ============

    /// Copy of one channel as normalized `f64`
    pub fn channel_samples(&self, channel: usize) -> SkResult<Vec<f64>> {
        self.check_channel(channel)?;
        Ok((0..self.sample_count)
            .map(|n| self.read_f64(channel, n))
            .collect())
    }

    /// Write `samples` into `channel` starting at `offset`, growing as needed
    pub fn write_channel(&mut self, channel: usize, offset: usize, samples: &[f64]) -> SkResult<()> {
        self.check_channel(channel)?;
        let end = offset.checked_add(samples.len()).ok_or(SkError::OutOfRange {
            offset,
            length: samples.len(),
            limit: usize::MAX,
        })?;
        self.grow_if_needed(end)?;
        for (n, &v) in samples.iter().enumerate() {
            self.write_f64(channel, offset + n, v);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec() {
        let spec = SignalSpec::default();
        assert_eq!(spec.data_type, DataType::Float);
        assert_eq!(spec.channel_count, 1);
        assert_eq!(spec.sample_rate, 48_000);

        let signal = Signal::from_spec(&spec).unwrap();
        assert!(signal.is_empty());
        assert_eq!(signal.last_sample_index(), None);
    }

    #[test]
    fn test_configure_validates() {
        assert!(matches!(
            Signal::new(DataType::Float, 0, 10, 48000),
            Err(SkError::InvalidChannelCount(0))
        ));
        assert!(matches!(
            Signal::new(DataType::Float, 5000, 10, 48000),
            Err(SkError::InvalidChannelCount(5000))
        ));
        assert!(matches!(
            Signal::new(DataType::Float, 2, 10, 0),
            Err(SkError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn test_byte_len() {
        let signal = Signal::new(DataType::Int16, 3, 100, 44100).unwrap();
        assert_eq!(signal.byte_len(), 100 * 3 * 2);
        assert_eq!(signal.last_sample_index(), Some(99));
    }

    #[test]
    fn test_float_to_int16_round_trip() {
        let mut signal = Signal::new(DataType::Int16, 1, 4, 48000).unwrap();
        assert!(signal.write::<f32>(0, 0, 0.5));
        assert_eq!(signal.read::<i16>(0, 0), 16384);
        assert!((signal.read::<f32>(0, 0) - 0.5).abs() <= 1.0 / 32768.0);
    }

    #[test]
    fn test_accessors_are_total() {
        let mut signal = Signal::new(DataType::Double, 2, 4, 48000).unwrap();
        assert!(!signal.write_f64(2, 0, 1.0));
        assert!(!signal.write_f64(0, 4, 1.0));
        assert_eq!(signal.read_f64(5, 0), 0.0);
        assert_eq!(signal.read::<i32>(0, 99), 0);
    }

    #[test]
    fn test_interleaved_layout() {
        let mut signal = Signal::new(DataType::Double, 2, 3, 48000).unwrap();
        signal.write_f64(1, 2, 0.25);
        assert_eq!(signal.index(1, 2), Some(5));
        assert_eq!(signal.data().as_slice::<f64>().unwrap()[5], 0.25);
    }

    #[test]
    fn test_grow_keeps_samples() {
        let mut signal = Signal::new(DataType::Float, 2, 2, 48000).unwrap();
        signal.write_f64(1, 1, 0.5);
        signal.grow_if_needed(10).unwrap();
        assert_eq!(signal.sample_count(), 10);
        assert_eq!(signal.read_f64(1, 1), 0.5);
        assert_eq!(signal.read_f64(1, 9), 0.0);

        signal.grow_if_needed(5).unwrap();
        assert_eq!(signal.sample_count(), 10);
    }

    #[test]
    fn test_read_float_lerp() {
        let signal = Signal::from_samples(&[0.0, 1.0, 0.5], 48000).unwrap();
        assert!((signal.read_float_lerp(0, &HiResValue::from_pos(0.5)) - 0.5).abs() < 1e-12);
        assert!((signal.read_float_lerp(0, &HiResValue::from_pos(1.5)) - 0.75).abs() < 1e-12);
        // Missing right neighbour counts as zero
        assert!((signal.read_float_lerp(0, &HiResValue::from_pos(2.5)) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_convert_data_type() {
        let mut signal = Signal::from_samples(&[0.5, -0.25], 48000).unwrap();
        signal.convert_data_type(DataType::Int8);
        assert_eq!(signal.data_type(), DataType::Int8);
        assert_eq!(signal.read::<i8>(0, 0), 64);
        assert_eq!(signal.read::<i8>(0, 1), -32);
    }

    #[test]
    fn test_channel_round_trip() {
        let mut signal = Signal::new(DataType::Double, 2, 0, 48000).unwrap();
        signal.write_channel(1, 2, &[0.1, 0.2]).unwrap();
        assert_eq!(signal.sample_count(), 4);
        assert_eq!(signal.channel_samples(1).unwrap(), vec![0.0, 0.0, 0.1, 0.2]);
        assert!(signal.channel_samples(2).is_err());
    }
}
