//! Sound file codec contract

use std::path::Path;

use serde::{Deserialize, Serialize};
use sk_core::DataType;
use sk_dsp::Signal;

use crate::FileResult;

/// Container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerFormat {
    Aiff,
    Aifc,
    Wav,
    Caf,
    Aac,
}

impl ContainerFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Aiff => "AIFF",
            Self::Aifc => "AIFC",
            Self::Wav => "WAV",
            Self::Caf => "CAF",
            Self::Aac => "AAC",
        }
    }

    /// Guess from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "aif" | "aiff" => Some(Self::Aiff),
            "aifc" => Some(Self::Aifc),
            "wav" | "wave" => Some(Self::Wav),
            "caf" => Some(Self::Caf),
            "aac" | "m4a" => Some(Self::Aac),
            _ => None,
        }
    }
}

/// Sample encoding inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleEncoding {
    /// Match the signal's data type
    #[default]
    Original,
    Int8,
    Int16,
    Int24,
    Int32,
    Float,
    Alaw,
    Ulaw,
    ImaAdpcm,
    MsAdpcm,
}

impl SampleEncoding {
    /// Linear PCM encoding closest to a data type (`Double` is stored as
    /// 32-bit float)
    pub fn for_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::Int8 => Self::Int8,
            DataType::Int16 => Self::Int16,
            DataType::Int32 => Self::Int32,
            DataType::Float | DataType::Double => Self::Float,
        }
    }

    /// Resolve `Original` against the data type being written
    pub fn resolve(self, data_type: DataType) -> Self {
        match self {
            Self::Original => Self::for_data_type(data_type),
            other => other,
        }
    }

    /// Bits per stored sample, for linear encodings
    pub fn bits(self) -> Option<u16> {
        match self {
            Self::Int8 => Some(8),
            Self::Int16 => Some(16),
            Self::Int24 => Some(24),
            Self::Int32 | Self::Float => Some(32),
            _ => None,
        }
    }

    pub fn is_linear_pcm(self) -> bool {
        self.bits().is_some()
    }
}

/// Metadata reported by a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub channel_count: usize,
    pub sample_rate: u32,
    /// Frames per channel
    pub sample_count: usize,
    pub format: ContainerFormat,
    pub encoding: SampleEncoding,
}

/// How [`crate::write_to_file`] lays out a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteSpec {
    pub container: ContainerFormat,
    pub encoding: SampleEncoding,
    /// First sample to write
    pub offset: usize,
    /// Number of samples; `None` writes through to the end
    pub length: Option<usize>,
}

impl Default for WriteSpec {
    fn default() -> Self {
        Self {
            container: ContainerFormat::Wav,
            encoding: SampleEncoding::Original,
            offset: 0,
            length: None,
        }
    }
}

/// Reads interleaved PCM frames from an open container
pub trait PcmReader {
    fn info(&self) -> &FileInfo;

    /// Fill `signal` with every frame of the file
    ///
    /// `signal` must already be shaped to the file's channel and frame
    /// counts; samples are converted to its data type.
    fn read_into(&mut self, signal: &mut Signal) -> FileResult<()>;
}

/// Writes interleaved PCM frames into a new container
pub trait PcmWriter {
    /// Append `length` frames of `signal` starting at `offset`
    fn write_frames(&mut self, signal: &Signal, offset: usize, length: usize) -> FileResult<()>;

    /// Flush headers and close the file
    fn finalize(self: Box<Self>) -> FileResult<()>;
}

/// A sound file format implementation
pub trait SoundFileCodec: Send + Sync {
    fn name(&self) -> &'static str;

    fn open(&self, path: &Path) -> FileResult<Box<dyn PcmReader>>;

    /// Create a file; `encoding` is never `Original` here
    fn create(
        &self,
        path: &Path,
        container: ContainerFormat,
        encoding: SampleEncoding,
        channel_count: usize,
        sample_rate: u32,
    ) -> FileResult<Box<dyn PcmWriter>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_resolves_from_data_type() {
        assert_eq!(
            SampleEncoding::Original.resolve(DataType::Int16),
            SampleEncoding::Int16
        );
        assert_eq!(
            SampleEncoding::Original.resolve(DataType::Double),
            SampleEncoding::Float
        );
        assert_eq!(
            SampleEncoding::Int24.resolve(DataType::Float),
            SampleEncoding::Int24
        );
    }

    #[test]
    fn test_container_from_path() {
        assert_eq!(
            ContainerFormat::from_path(Path::new("a/b.WAV")),
            Some(ContainerFormat::Wav)
        );
        assert_eq!(
            ContainerFormat::from_path(Path::new("x.aif")),
            Some(ContainerFormat::Aiff)
        );
        assert_eq!(ContainerFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_linear_encodings() {
        assert!(SampleEncoding::Int24.is_linear_pcm());
        assert!(!SampleEncoding::Ulaw.is_linear_pcm());
        assert_eq!(SampleEncoding::Float.bits(), Some(32));
    }
}
