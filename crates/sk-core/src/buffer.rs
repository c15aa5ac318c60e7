//! Tagged sample storage
//!
//! One physical buffer interpreted under a runtime [`DataType`]. Element
//! access is generic over [`SampleFormat`]: reads convert from the stored
//! format, writes convert into it. Out-of-range access is not an error,
//! reads return the neutral value and writes report `false`.

use crate::sample::{DataType, SampleFormat, convert_sample};

/// Typed sample storage selected by [`DataType`]
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

/// Dispatch `$body` over the concrete vector inside a `SampleData`
#[macro_export]
macro_rules! with_samples {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::SampleData::Int8($v) => $body,
            $crate::SampleData::Int16($v) => $body,
            $crate::SampleData::Int32($v) => $body,
            $crate::SampleData::Float($v) => $body,
            $crate::SampleData::Double($v) => $body,
        }
    };
}

impl SampleData {
    /// Zeroed storage of `len` elements
    pub fn zeroed(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Int8 => Self::Int8(vec![0; len]),
            DataType::Int16 => Self::Int16(vec![0; len]),
            DataType::Int32 => Self::Int32(vec![0; len]),
            DataType::Float => Self::Float(vec![0.0; len]),
            DataType::Double => Self::Double(vec![0.0; len]),
        }
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_samples!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the storage in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.len() * self.data_type().bytes_per_sample()
    }

    /// Read element `index` converted to `T`
    #[inline]
    pub fn read<T: SampleFormat>(&self, index: usize) -> T {
        with_samples!(self, v => v.get(index).map(|&s| convert_sample(s)).unwrap_or_default())
    }

    /// Write `value` into element `index`, converting to the stored format
    #[inline]
    pub fn write<T: SampleFormat>(&mut self, index: usize, value: T) -> bool {
        with_samples!(self, v => match v.get_mut(index) {
            Some(slot) => {
                *slot = convert_sample(value);
                true
            }
            None => false,
        })
    }

    /// Normalized read, full scale maps to [-1, 1)
    #[inline]
    pub fn read_f64(&self, index: usize) -> f64 {
        self.read::<f64>(index)
    }

    /// Normalized write
    #[inline]
    pub fn write_f64(&mut self, index: usize, value: f64) -> bool {
        self.write::<f64>(index, value)
    }

    /// Fill every element with zero
    pub fn fill_zero(&mut self) {
        with_samples!(self, v => v.fill(Default::default()))
    }

    /// Zero `len` elements starting at `start`, clipped to the storage
    pub fn zero_range(&mut self, start: usize, len: usize) {
        with_samples!(self, v => {
            let end = start.saturating_add(len).min(v.len());
            if start < end {
                v[start..end].fill(Default::default());
            }
        })
    }

    /// Resize, zero-filling new elements
    pub fn resize(&mut self, len: usize) {
        with_samples!(self, v => v.resize(len, Default::default()))
    }

    /// Copy of this storage re-encoded as `data_type`
    pub fn converted(&self, data_type: DataType) -> Self {
        let mut out = Self::zeroed(data_type, self.len());
        with_samples!(self, src => {
            for (i, &s) in src.iter().enumerate() {
                out.write(i, s);
            }
        });
        out
    }

    /// Typed view when the storage format is `T`
    pub fn as_slice<T: SampleFormat>(&self) -> Option<&[T]> {
        let any: &dyn std::any::Any = with_samples!(self, v => v);
        any.downcast_ref::<Vec<T>>().map(Vec::as_slice)
    }

    /// Mutable typed view when the storage format is `T`
    pub fn as_mut_slice<T: SampleFormat>(&mut self) -> Option<&mut [T]> {
        let any: &mut dyn std::any::Any = with_samples!(self, v => v);
        any.downcast_mut::<Vec<T>>().map(Vec::as_mut_slice)
    }

    /// Little-endian byte image of the storage
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        with_samples!(self, v => {
            for s in v {
                bytes.extend_from_slice(&s.to_le_bytes());
            }
        });
        bytes
    }

    /// Rebuild storage from a little-endian byte image
    ///
    /// Trailing bytes that do not form a whole sample are ignored.
    pub fn from_le_bytes(data_type: DataType, bytes: &[u8]) -> Self {
        let width = data_type.bytes_per_sample();
        let chunks = bytes.chunks_exact(width);
        match data_type {
            DataType::Int8 => Self::Int8(chunks.map(|c| i8::from_le_bytes([c[0]])).collect()),
            DataType::Int16 => {
                Self::Int16(chunks.map(|c| i16::from_le_bytes([c[0], c[1]])).collect())
            }
            DataType::Int32 => Self::Int32(
                chunks
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            DataType::Float => Self::Float(
                chunks
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            DataType::Double => Self::Double(
                chunks
                    .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                    .collect(),
            ),
        }
    }
}
