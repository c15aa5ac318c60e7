//! Sample formats and the conversion rules between them
//!
//! Every sample access in a [`crate::SampleData`] goes through
//! [`convert_sample`]:
//! - integer ↔ float scales by the full dynamic range (128, 32768, 2^31),
//!   not by the positive maximum
//! - integer ↔ integer shifts by the bit-width difference
//! - float ↔ double is a plain cast
//!
//! Narrowing never fails: floats saturate into the integer range and
//! integers drop their low bits.

use serde::{Deserialize, Serialize};

/// Storage format of a sample buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Float,
    Double,
}

impl DataType {
    pub const ALL: [DataType; 5] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Float,
        DataType::Double,
    ];

    #[inline]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float => 4,
            Self::Double => 8,
        }
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.bytes_per_sample() as u32 * 8
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::Float
    }
}

/// A numeric type that can live in a sample buffer
pub trait SampleFormat: Copy + Default + PartialOrd + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    /// Full-scale magnitude used for integer ↔ float conversion (1.0 for floats)
    const SCALE: f64;

    /// Raw value as f64, without any scaling
    fn to_f64_raw(self) -> f64;

    /// Raw cast from f64, saturating for integers
    fn from_f64_raw(value: f64) -> Self;

    /// Raw integer value (floats truncate)
    fn to_i64_raw(self) -> i64;

    /// Raw cast from i64 (integers wrap to their width)
    fn from_i64_raw(value: i64) -> Self;

    /// Normalized value, so that full scale maps to [-1, 1)
    #[inline]
    fn to_unit(self) -> f64 {
        self.to_f64_raw() / Self::SCALE
    }

    /// Build from a normalized value
    #[inline]
    fn from_unit(value: f64) -> Self {
        Self::from_f64_raw(value * Self::SCALE)
    }
}

macro_rules! impl_int_sample {
    ($t:ty, $dt:expr, $scale:expr) => {
        impl SampleFormat for $t {
            const DATA_TYPE: DataType = $dt;
            const SCALE: f64 = $scale;

            #[inline]
            fn to_f64_raw(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64_raw(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn to_i64_raw(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64_raw(value: i64) -> Self {
                value as $t
            }
        }
    };
}

macro_rules! impl_float_sample {
    ($t:ty, $dt:expr) => {
        impl SampleFormat for $t {
            const DATA_TYPE: DataType = $dt;
            const SCALE: f64 = 1.0;

            #[inline]
            fn to_f64_raw(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64_raw(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn to_i64_raw(self) -> i64 {
                self as i64
            }

            #[inline]
            fn from_i64_raw(value: i64) -> Self {
                value as $t
            }
        }
    };
}

impl_int_sample!(i8, DataType::Int8, 128.0);
impl_int_sample!(i16, DataType::Int16, 32_768.0);
impl_int_sample!(i32, DataType::Int32, 2_147_483_648.0);
impl_float_sample!(f32, DataType::Float);
impl_float_sample!(f64, DataType::Double);

/// Convert one sample from format `S` to format `D`
#[inline]
pub fn convert_sample<S: SampleFormat, D: SampleFormat>(value: S) -> D {
    let src = S::DATA_TYPE;
    let dst = D::DATA_TYPE;

    match (src.is_integer(), dst.is_integer()) {
        (true, true) => {
            let raw = value.to_i64_raw();
            let shifted = if dst.bits() >= src.bits() {
                raw << (dst.bits() - src.bits())
            } else {
                raw >> (src.bits() - dst.bits())
            };
            D::from_i64_raw(shifted)
        }
        (true, false) => D::from_f64_raw(value.to_unit()),
        (false, true) => D::from_unit(value.to_f64_raw()),
        (false, false) => D::from_f64_raw(value.to_f64_raw()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_float_to_int16_scale() {
        let v: i16 = convert_sample(0.5f32);
        assert_eq!(v, 16384);

        let back: f32 = convert_sample(v);
        assert_abs_diff_eq!(back, 0.5, epsilon = 1.0 / 32768.0);
    }

    #[test]
    fn test_int8_uses_128() {
        let v: f64 = convert_sample(-128i8);
        assert_eq!(v, -1.0);

        let v: f64 = convert_sample(64i8);
        assert_eq!(v, 0.5);

        let v: i8 = convert_sample(0.25f64);
        assert_eq!(v, 32);
    }

    #[test]
    fn test_int32_scale() {
        let v: i32 = convert_sample(-1.0f64);
        assert_eq!(v, i32::MIN);

        let v: f64 = convert_sample(1 << 30);
        assert_eq!(v, 0.5);
    }

    #[test]
    fn test_integer_widening_is_shift() {
        let v: i16 = convert_sample(3i8);
        assert_eq!(v, 3 * 256);

        let v: i32 = convert_sample(-2i16);
        assert_eq!(v, -2 * 65536);
    }

    #[test]
    fn test_integer_narrowing_is_shift() {
        let v: i8 = convert_sample(1000i16);
        assert_eq!(v, (1000i16 >> 8) as i8);

        // Arithmetic shift rounds toward negative infinity
        let v: i8 = convert_sample(-1i16);
        assert_eq!(v, -1);
    }

    #[test]
    fn test_float_saturates_into_int() {
        let v: i16 = convert_sample(1.0f32);
        assert_eq!(v, i16::MAX);

        let v: i8 = convert_sample(-4.0f64);
        assert_eq!(v, i8::MIN);
    }

    #[test]
    fn test_data_type_sizes() {
        assert_eq!(DataType::Int8.bytes_per_sample(), 1);
        assert_eq!(DataType::Int16.bytes_per_sample(), 2);
        assert_eq!(DataType::Int32.bytes_per_sample(), 4);
        assert_eq!(DataType::Float.bytes_per_sample(), 4);
        assert_eq!(DataType::Double.bytes_per_sample(), 8);
        assert!(DataType::Int32.is_integer());
        assert!(!DataType::Double.is_integer());
    }
}
