//! Pluggable audio output abstraction.
//!
//! [`AudioBackend`] decouples the synth from any specific platform audio API.
//! [`CpalBackend`](crate::CpalBackend) drives real hardware; [`ManualBackend`]
//! hands the render callback back to the caller so a stream can be pulled
//! deterministically in tests and offline tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   CLI `play`, tests, tools       │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │ list_devices / build_output      │
//! └──────────────┬───────────────────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌──────────────┐
//! │ CpalBackend │  │ ManualBackend│
//! └─────────────┘  └──────────────┘
//! ```
//!
//! Callbacks are boxed closures so the trait stays object-safe. Streams come
//! back as a type-erased [`StreamHandle`] that stops playback on drop.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{AudioDevice, Error, Result};

/// Configuration for building an output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Device name or index (uses system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback.
///
/// Runs on the audio thread with an interleaved buffer of
/// `frames * channels` samples to fill. Must not allocate, lock, or block.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Called with a human-readable message when the stream fails.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio output backend.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal", "manual").
    fn name(&self) -> &str;

    /// List available output devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// The default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    ///
    /// The returned [`StreamHandle`] keeps the stream alive.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// The sample rate the backend will actually run at for `config`.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}

type Slot = Arc<Mutex<Option<(OutputCallback, u16)>>>;

/// Backend whose stream is driven by explicit [`pull`](Self::pull) calls.
///
/// No audio thread exists; the callback runs on the caller's thread.
#[derive(Clone, Default)]
pub struct ManualBackend {
    slot: Slot,
}

impl ManualBackend {
    /// A backend with no stream attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the attached callback for `frames` frames and return the output.
    ///
    /// Returns `None` when no stream is attached or it has been dropped.
    pub fn pull(&self, frames: usize) -> Option<Vec<f32>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let (callback, channels) = slot.as_mut()?;
        let mut buffer = vec![0.0; frames * usize::from(*channels)];
        callback(&mut buffer);
        Some(buffer)
    }

    /// Whether a stream is attached.
    pub fn is_attached(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for ManualBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualBackend")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Detaches the callback from its [`ManualBackend`] on drop.
struct ManualStream {
    slot: Slot,
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl AudioBackend for ManualBackend {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            index: 0,
            name: "manual".to_string(),
            default_sample_rate: 48000,
            default_channels: 2,
            is_default: true,
        }])
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(self.list_devices()?.into_iter().next())
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if config.channels == 0 {
            return Err(Error::Stream("channel count must be at least 1".into()));
        }
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(Error::Stream("manual backend already has a stream".into()));
        }
        *slot = Some((callback, config.channels));
        Ok(StreamHandle::new(ManualStream {
            slot: Arc::clone(&self.slot),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.channels, 2);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn test_stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{:?}", handle).contains("StreamHandle"));
    }

    #[test]
    fn test_manual_backend_pull_and_drop() {
        let backend = ManualBackend::new();
        assert!(backend.pull(4).is_none());

        let handle = backend
            .build_output_stream(
                &BackendStreamConfig::default(),
                Box::new(|buf: &mut [f32]| buf.fill(0.5)),
                Box::new(|_| {}),
            )
            .unwrap();
        assert_eq!(backend.pull(4).unwrap(), vec![0.5; 8]);

        drop(handle);
        assert!(!backend.is_attached());
        assert!(backend.pull(4).is_none());
    }

    #[test]
    fn test_manual_backend_single_stream() {
        let backend = ManualBackend::new();
        let config = BackendStreamConfig::default();
        let _first = backend
            .build_output_stream(&config, Box::new(|_| {}), Box::new(|_| {}))
            .unwrap();
        assert!(
            backend
                .build_output_stream(&config, Box::new(|_| {}), Box::new(|_| {}))
                .is_err()
        );
    }
}
