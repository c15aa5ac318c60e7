//! File I/O error types

use sk_core::SkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("WAV error: {0}")]
    Wav(String),

    #[error(transparent)]
    Engine(#[from] SkError),
}

pub type FileResult<T> = Result<T, FileError>;

impl From<hound::Error> for FileError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => FileError::Io(io),
            other => FileError::Wav(other.to_string()),
        }
    }
}
