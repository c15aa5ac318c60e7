//! Moving whole signals through a codec

use std::path::Path;

use sk_core::DataType;
use sk_dsp::Signal;

use crate::{FileError, FileInfo, FileResult, SoundFileCodec, WriteSpec};

/// Write a span of `signal` to `path`
///
/// `Original` encoding follows the signal's data type.
pub fn write_to_file(
    signal: &Signal,
    codec: &dyn SoundFileCodec,
    path: impl AsRef<Path>,
    spec: &WriteSpec,
) -> FileResult<()> {
    let path = path.as_ref();
    write_signal(signal, codec, path, spec)
        .inspect_err(|e| log::warn!("Writing {:?} failed: {}", path, e))
}

fn write_signal(
    signal: &Signal,
    codec: &dyn SoundFileCodec,
    path: &Path,
    spec: &WriteSpec,
) -> FileResult<()> {
    let length = spec
        .length
        .unwrap_or_else(|| signal.sample_count().saturating_sub(spec.offset));
    let encoding = spec.encoding.resolve(signal.data_type());

    log::debug!(
        "Writing {:?}: {} {:?}, {} samples from {}",
        path,
        codec.name(),
        encoding,
        length,
        spec.offset
    );

    let mut writer = codec.create(
        path,
        spec.container,
        encoding,
        signal.channel_count(),
        signal.sample_rate(),
    )?;
    writer.write_frames(signal, spec.offset, length)?;
    writer.finalize()
}

/// Load a whole file into a new signal of `data_type`
pub fn create_from_file(
    codec: &dyn SoundFileCodec,
    path: impl AsRef<Path>,
    data_type: DataType,
) -> FileResult<Signal> {
    let path = path.as_ref();
    read_signal(codec, path, data_type)
        .inspect_err(|e| log::warn!("Reading {:?} failed: {}", path, e))
}

fn read_signal(codec: &dyn SoundFileCodec, path: &Path, data_type: DataType) -> FileResult<Signal> {
    let mut reader = codec.open(path)?;
    let info = *reader.info();
    if info.channel_count == 0 {
        return Err(FileError::InvalidFile(format!("{} has no channels", path.display())));
    }

    log::debug!(
        "Reading {:?}: {} ch, {} samples @ {} Hz ({:?})",
        path,
        info.channel_count,
        info.sample_count,
        info.sample_rate,
        info.encoding
    );

    let mut signal = Signal::new(
        data_type,
        info.channel_count,
        info.sample_count,
        info.sample_rate,
    )?;
    reader.read_into(&mut signal)?;
    Ok(signal)
}

/// Container metadata without reading samples
pub fn file_info(codec: &dyn SoundFileCodec, path: impl AsRef<Path>) -> FileResult<FileInfo> {
    let reader = codec.open(path.as_ref())?;
    Ok(*reader.info())
}
