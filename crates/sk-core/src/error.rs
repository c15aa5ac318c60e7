//! Error types for SigKit

use thiserror::Error;

use crate::DataType;

/// Core error type
#[derive(Error, Debug)]
pub enum SkError {
    #[error("Invalid channel count: {0} (expected 1..={max})", max = crate::MAX_CHANNELS)]
    InvalidChannelCount(usize),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported data type: {0:?}")]
    UnsupportedDataType(DataType),

    #[error("Invalid channel {channel} (signal has {count})")]
    InvalidChannel { channel: usize, count: usize },

    #[error("Range {offset}+{length} exceeds {limit} samples")]
    OutOfRange {
        offset: usize,
        length: usize,
        limit: usize,
    },

    #[error("Invalid region: {0}")]
    InvalidRegion(u32),

    #[error("Region {0} is locked")]
    RegionLocked(u32),

    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("FFT error: {0}")]
    Fft(String),

    #[error("Sample rate mismatch: signal {signal} Hz, other {other} Hz")]
    SampleRateMismatch { signal: u32, other: u32 },

    #[error("Resolution mismatch: expected {expected} bins, got {actual}")]
    ResolutionMismatch { expected: usize, actual: usize },

    #[error("Partials must be in cartesian form")]
    NotCartesian,

    #[error("Weights mode is not enabled")]
    WeightsDisabled,
}

/// Result type alias
pub type SkResult<T> = Result<T, SkError>;
