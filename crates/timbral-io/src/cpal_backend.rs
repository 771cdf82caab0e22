//! cpal-based audio backend implementation.
//!
//! [`CpalBackend`] is the default [`AudioBackend`], wrapping
//! [cpal](https://crates.io/crates/cpal) for ALSA (Linux), CoreAudio (macOS)
//! and WASAPI (Windows) output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use timbral_io::{AudioBackend, BackendStreamConfig, CpalBackend};
//!
//! let backend = CpalBackend::new();
//! let stream = backend.build_output_stream(
//!     &BackendStreamConfig::default(),
//!     Box::new(|buffer: &mut [f32]| buffer.fill(0.0)),
//!     Box::new(|err| eprintln!("Audio error: {}", err)),
//! )?;
//! // Stream plays until `stream` is dropped.
//! ```

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle,
};
use crate::devices::find_output_device;
use crate::{AudioDevice, Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, StreamTrait};

/// cpal-based audio backend holding the platform's default [`Host`].
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalBackend")
            .field("host", &self.host.id().name())
            .finish()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        // Both use cpal::default_host(), so indices agree.
        crate::devices::list_output_devices()
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        crate::devices::default_output_device()
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = find_output_device(&self.host, config.device_name.as_deref())?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }
}
