//! Audio I/O layer for timbral.
//!
//! This crate provides:
//!
//! - **WAV output**: [`write_wav`] and the incremental [`WavSink`] for offline renders
//! - **Device discovery**: [`list_output_devices`] and [`default_output_device`]
//! - **Playback**: [`SynthPlayer`] runs a [`SynthEngine`](timbral_synth::SynthEngine)
//!   through any [`AudioBackend`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timbral_io::{BackendStreamConfig, CpalBackend, SynthPlayer};
//! use timbral_synth::{EngineConfig, NoteEvent, SynthEngine};
//!
//! let (engine, _) = SynthEngine::new(EngineConfig::default())?;
//! let player = SynthPlayer::start(&CpalBackend::new(), engine, &BackendStreamConfig::default())?;
//! player.handle().push_event(NoteEvent::note_on(1, 440.0, 0.8, 0.5));
//! ```

pub mod backend;
pub mod cpal_backend;
mod devices;
mod player;
mod wav;

pub use backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, ManualBackend, OutputCallback, StreamHandle,
};
pub use cpal_backend::CpalBackend;
pub use devices::{AudioDevice, default_output_device, list_output_devices, select_device};
pub use player::{PlaybackMeter, SynthPlayer};
pub use wav::{WavFormat, WavInfo, WavSink, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The engine rejected the stream configuration.
    #[error("Engine setup failed: {0}")]
    Prepare(#[from] timbral_synth::PrepareError),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
