//! sk-core: Shared types for SigKit
//!
//! This crate provides the foundational types used across all SigKit crates:
//! sample formats and their conversion rules, tagged sample storage, the
//! fractional position used for resampling, and the error taxonomy.

mod buffer;
mod error;
mod hires;
mod sample;

pub use buffer::*;
pub use error::*;
pub use hires::*;
pub use sample::*;

/// Maximum number of channels a signal may carry
pub const MAX_CHANNELS: usize = 4096;

/// Default sample rate for freshly created signals
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Validate a channel count against [`MAX_CHANNELS`]
#[inline]
pub fn validate_channel_count(channels: usize) -> SkResult<usize> {
    if (1..=MAX_CHANNELS).contains(&channels) {
        Ok(channels)
    } else {
        Err(SkError::InvalidChannelCount(channels))
    }
}

/// Validate a sample rate (must be at least 1 Hz)
#[inline]
pub fn validate_sample_rate(rate: u32) -> SkResult<u32> {
    if rate >= 1 {
        Ok(rate)
    } else {
        Err(SkError::InvalidSampleRate(rate))
    }
}
