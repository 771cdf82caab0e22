//! Real-time playback of a [`SynthEngine`] through an [`AudioBackend`].
//!
//! The engine moves into the output callback; the caller keeps an
//! [`EngineHandle`] for events and globals and a [`PlaybackMeter`] for
//! display. Nothing in the callback allocates or locks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use timbral_core::AtomicF32;
use timbral_synth::{EngineHandle, SynthEngine};

use crate::Result;
use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};

/// Levels published by the audio thread.
#[derive(Debug, Default)]
pub struct PlaybackMeter {
    frames: AtomicU64,
    peak: AtomicF32,
    active_voices: AtomicU64,
    errors: AtomicU64,
}

impl PlaybackMeter {
    /// Frames rendered since start.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Peak absolute sample of the last callback.
    pub fn peak(&self) -> f32 {
        self.peak.load()
    }

    /// Voices sounding after the last callback.
    pub fn active_voices(&self) -> usize {
        self.active_voices.load(Ordering::Relaxed) as usize
    }

    /// Stream errors reported by the backend.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// A running synth stream. Dropping it stops playback.
#[derive(Debug)]
pub struct SynthPlayer {
    _stream: StreamHandle,
    handle: EngineHandle,
    meter: Arc<PlaybackMeter>,
    sample_rate: u32,
    channels: u16,
}

impl SynthPlayer {
    /// Prepare `engine` for the backend's stream and start playing it.
    pub fn start(
        backend: &dyn AudioBackend,
        mut engine: SynthEngine,
        config: &BackendStreamConfig,
    ) -> Result<Self> {
        let sample_rate = backend.actual_sample_rate(config);
        let polyphony = engine.config().polyphony;
        engine.prepare(
            sample_rate as f32,
            config.buffer_size.max(1) as usize,
            polyphony,
        )?;

        let handle = engine.handle();
        let meter = Arc::new(PlaybackMeter::default());
        let channels = usize::from(config.channels.max(1));

        let audio_meter = Arc::clone(&meter);
        let callback = Box::new(move |data: &mut [f32]| {
            let frames = data.len() / channels;
            engine.render_block(data, channels, frames);
            let peak = data.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            audio_meter.peak.store(peak);
            audio_meter
                .frames
                .fetch_add(frames as u64, Ordering::Relaxed);
            audio_meter
                .active_voices
                .store(engine.active_voices() as u64, Ordering::Relaxed);
        });

        let error_meter = Arc::clone(&meter);
        let error_callback = Box::new(move |message: &str| {
            error_meter.errors.fetch_add(1, Ordering::Relaxed);
            tracing::error!(error = message, "output stream error");
        });

        let stream = backend.build_output_stream(config, callback, error_callback)?;
        tracing::info!(
            backend = backend.name(),
            sample_rate,
            channels = config.channels,
            polyphony,
            "synth playback started"
        );

        Ok(Self {
            _stream: stream,
            handle,
            meter,
            sample_rate,
            channels: config.channels,
        })
    }

    /// Control handle for the playing engine.
    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// Audio-thread meter.
    pub fn meter(&self) -> &Arc<PlaybackMeter> {
        &self.meter
    }

    /// Stream sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stream channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}
