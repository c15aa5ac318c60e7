//! sk-file: Sound file I/O for SigKit
//!
//! The engine talks to sound files through a small codec contract:
//! - `SoundFileCodec` opens and creates containers
//! - `PcmReader` / `PcmWriter` stream interleaved PCM frames
//!
//! `WavCodec` implements the contract for WAV files via hound. Other
//! containers and compressed encodings are reported as unsupported.

mod codec;
mod error;
mod signal_io;
mod wav;

pub use codec::*;
pub use error::*;
pub use signal_io::*;
pub use wav::*;
