//! WAV codec (hound)

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use sk_core::SkError;
use sk_dsp::Signal;

use crate::{
    ContainerFormat, FileError, FileInfo, FileResult, PcmReader, PcmWriter, SampleEncoding,
    SoundFileCodec,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

fn encoding_of(spec: &hound::WavSpec) -> FileResult<SampleEncoding> {
    match (spec.bits_per_sample, spec.sample_format) {
        (8, hound::SampleFormat::Int) => Ok(SampleEncoding::Int8),
        (16, hound::SampleFormat::Int) => Ok(SampleEncoding::Int16),
        (24, hound::SampleFormat::Int) => Ok(SampleEncoding::Int24),
        (32, hound::SampleFormat::Int) => Ok(SampleEncoding::Int32),
        (32, hound::SampleFormat::Float) => Ok(SampleEncoding::Float),
        (bits, format) => Err(FileError::UnsupportedEncoding(format!(
            "{bits}-bit {format:?} WAV"
        ))),
    }
}

fn wav_spec(
    encoding: SampleEncoding,
    channel_count: usize,
    sample_rate: u32,
) -> FileResult<hound::WavSpec> {
    let bits_per_sample = encoding
        .bits()
        .ok_or_else(|| FileError::UnsupportedEncoding(format!("{encoding:?} in WAV")))?;
    let channels = u16::try_from(channel_count)
        .map_err(|_| FileError::Engine(SkError::InvalidChannelCount(channel_count)))?;
    Ok(hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format: match encoding {
            SampleEncoding::Float => hound::SampleFormat::Float,
            _ => hound::SampleFormat::Int,
        },
    })
}

impl SoundFileCodec for WavCodec {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn open(&self, path: &Path) -> FileResult<Box<dyn PcmReader>> {
        if !path.exists() {
            return Err(FileError::NotFound(path.display().to_string()));
        }
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let info = FileInfo {
            channel_count: spec.channels as usize,
            sample_rate: spec.sample_rate,
            sample_count: reader.duration() as usize,
            format: ContainerFormat::Wav,
            encoding: encoding_of(&spec)?,
        };
        Ok(Box::new(WavPcmReader { reader, info }))
    }

    fn create(
        &self,
        path: &Path,
        container: ContainerFormat,
        encoding: SampleEncoding,
        channel_count: usize,
        sample_rate: u32,
    ) -> FileResult<Box<dyn PcmWriter>> {
        if container != ContainerFormat::Wav {
            return Err(FileError::UnsupportedFormat(container.name().to_string()));
        }
        let spec = wav_spec(encoding, channel_count, sample_rate)?;
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Box::new(WavPcmWriter {
            writer,
            encoding,
            channel_count,
        }))
    }
}

struct WavPcmReader {
    reader: hound::WavReader<BufReader<File>>,
    info: FileInfo,
}

impl PcmReader for WavPcmReader {
    fn info(&self) -> &FileInfo {
        &self.info
    }

    fn read_into(&mut self, signal: &mut Signal) -> FileResult<()> {
        if signal.channel_count() != self.info.channel_count {
            return Err(FileError::Engine(SkError::InvalidChannelCount(
                signal.channel_count(),
            )));
        }
        signal.grow_if_needed(self.info.sample_count)?;

        // Interleaved file order matches the signal's storage order
        let data = signal.data_mut();
        match self.info.encoding {
            SampleEncoding::Float => {
                for (i, s) in self.reader.samples::<f32>().enumerate() {
                    data.write(i, s?);
                }
            }
            SampleEncoding::Int8 => {
                for (i, s) in self.reader.samples::<i32>().enumerate() {
                    data.write(i, s? as i8);
                }
            }
            SampleEncoding::Int16 => {
                for (i, s) in self.reader.samples::<i32>().enumerate() {
                    data.write(i, s? as i16);
                }
            }
            // 24-bit values are widened to full 32-bit scale
            SampleEncoding::Int24 => {
                for (i, s) in self.reader.samples::<i32>().enumerate() {
                    data.write(i, s? << 8);
                }
            }
            SampleEncoding::Int32 => {
                for (i, s) in self.reader.samples::<i32>().enumerate() {
                    data.write(i, s?);
                }
            }
            other => return Err(FileError::UnsupportedEncoding(format!("{other:?} in WAV"))),
        }
        Ok(())
    }
}

struct WavPcmWriter {
    writer: hound::WavWriter<BufWriter<File>>,
    encoding: SampleEncoding,
    channel_count: usize,
}

impl PcmWriter for WavPcmWriter {
    fn write_frames(&mut self, signal: &Signal, offset: usize, length: usize) -> FileResult<()> {
        if signal.channel_count() != self.channel_count {
            return Err(FileError::Engine(SkError::InvalidChannelCount(
                signal.channel_count(),
            )));
        }
        if offset.saturating_add(length) > signal.sample_count() {
            return Err(FileError::Engine(SkError::OutOfRange {
                offset,
                length,
                limit: signal.sample_count(),
            }));
        }

        let w = &mut self.writer;
        for n in offset..offset + length {
            for c in 0..self.channel_count {
                match self.encoding {
                    SampleEncoding::Int8 => w.write_sample(signal.read::<i8>(c, n))?,
                    SampleEncoding::Int16 => w.write_sample(signal.read::<i16>(c, n))?,
                    SampleEncoding::Int24 => w.write_sample(signal.read::<i32>(c, n) >> 8)?,
                    SampleEncoding::Int32 => w.write_sample(signal.read::<i32>(c, n))?,
                    SampleEncoding::Float => w.write_sample(signal.read::<f32>(c, n))?,
                    other => {
                        return Err(FileError::UnsupportedEncoding(format!("{other:?} in WAV")));
                    }
                }
            }
        }
        Ok(())
    }

    fn finalize(self: Box<Self>) -> FileResult<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
