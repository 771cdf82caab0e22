//! The synthesis engine: event drain, voice mixing and global refresh.
//!
//! [`SynthEngine`] is owned by the audio callback. Everything else talks to
//! it through an [`EngineHandle`]: note events travel over a bounded
//! `crossbeam-channel` queue allocated at construction, and global parameter
//! edits are published through the shared [`GlobalParams`] atomics.
//!
//! ## Per block
//!
//! ```text
//! for each sub-block of at most max_block_size frames:
//!     clear the output region
//!     drain queued events (at most queue capacity) into the voice pool
//!     render every voice, in pool order, additively
//!     snapshot globals, advance global ramps, recompute filter coefficient
//! ```
//!
//! Global values therefore take effect one sub-block after they are read.
//! The render path never allocates, locks or logs.
//!
//! # Example
//!
//! ```rust
//! use timbral_synth::{EngineConfig, NoteEvent, SynthEngine};
//!
//! let (mut engine, handle) = SynthEngine::new(EngineConfig::default()).unwrap();
//! handle.push_event(NoteEvent::note_on(1, 440.0, 1.0, 0.0));
//! handle.set_global("cutoff", 2000.0).unwrap();
//!
//! let mut buffer = vec![0.0f32; 2 * 512];
//! engine.render_block(&mut buffer, 2, 512);
//! assert_eq!(engine.active_voices(), 1);
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use timbral_core::{
    GlobalParam, GlobalParams, GlobalSnapshot, ParameterRamp, RampCurve, UnknownParam,
    lowpass_coeff,
};

use crate::envelope::EnvelopeParams;
use crate::event::NoteEvent;
use crate::pool::{DispatchOutcome, StealPolicy, VoicePool};
use crate::voice::BlockParams;
use crate::wavetable::{DEFAULT_TABLE_LENGTH, WaveShape, WavetableBank, WavetableError};

/// Construction-time engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Largest sub-block rendered between event drains.
    pub max_block_size: usize,
    /// Number of voices.
    pub polyphony: usize,
    /// Behaviour when every voice is busy.
    pub steal_policy: StealPolicy,
    /// Wavetable period length, a power of two.
    pub table_length: usize,
    /// Table read by the primary oscillator.
    pub primary_shape: WaveShape,
    /// Table read by the secondary oscillator.
    pub secondary_shape: WaveShape,
    /// Time constant of every parameter ramp, in seconds.
    pub smoothing_time: f32,
    /// Shape of every parameter ramp.
    pub ramp_curve: RampCurve,
    /// How far low pressure attenuates a voice, 0 to 1.
    pub pressure_depth: f32,
    /// How far timbre moves the table blend, 0 to 1.
    pub timbre_depth: f32,
    /// Capacity of the event queue.
    pub event_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 512,
            polyphony: 15,
            steal_policy: StealPolicy::Never,
            table_length: DEFAULT_TABLE_LENGTH,
            primary_shape: WaveShape::Sawtooth,
            secondary_shape: WaveShape::Square,
            smoothing_time: 0.1,
            ramp_curve: RampCurve::Exponential,
            pressure_depth: 0.5,
            timbre_depth: 0.5,
            event_queue_capacity: 1024,
        }
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrepareError {
    /// Sample rate was not a positive finite number.
    InvalidSampleRate(f32),
    /// Maximum block size was zero.
    InvalidBlockSize,
    /// Polyphony was zero.
    InvalidPolyphony,
    /// Event queue capacity was zero.
    InvalidQueueCapacity,
    /// Wavetable length was rejected.
    Wavetable(WavetableError),
}

impl fmt::Display for PrepareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => write!(f, "invalid sample rate {sr}"),
            Self::InvalidBlockSize => write!(f, "maximum block size must be at least 1"),
            Self::InvalidPolyphony => write!(f, "polyphony must be at least 1"),
            Self::InvalidQueueCapacity => write!(f, "event queue capacity must be at least 1"),
            Self::Wavetable(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PrepareError {}

impl From<WavetableError> for PrepareError {
    fn from(e: WavetableError) -> Self {
        Self::Wavetable(e)
    }
}

fn validate(sample_rate: f32, max_block_size: usize, polyphony: usize) -> Result<(), PrepareError> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(PrepareError::InvalidSampleRate(sample_rate));
    }
    if max_block_size == 0 {
        return Err(PrepareError::InvalidBlockSize);
    }
    if polyphony == 0 {
        return Err(PrepareError::InvalidPolyphony);
    }
    Ok(())
}

/// Counters kept by the render side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Note-ons that took a free voice.
    pub notes_assigned: u64,
    /// Note-ons that took a busy voice.
    pub voices_stolen: u64,
    /// Note-ons dropped for lack of a voice.
    pub notes_dropped: u64,
    /// Per-note events addressed to ids no voice holds.
    pub events_ignored: u64,
    /// Events rejected by a full queue.
    pub queue_overflows: u64,
}

/// Control-side endpoint: pushes events and edits globals.
///
/// Cheap to clone. Every method is non-blocking.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    events: Sender<NoteEvent>,
    globals: Arc<GlobalParams>,
    overflows: Arc<AtomicU64>,
}

impl EngineHandle {
    /// Queue an event for the next render call.
    ///
    /// Returns `false` when the queue is full (the event is discarded) or the
    /// engine has been dropped.
    pub fn push_event(&self, event: NoteEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.overflows.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                tracing::warn!("event queue full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Publish a global parameter by name. Returns the clamped stored value.
    pub fn set_global(&self, name: &str, value: f32) -> Result<f32, UnknownParam> {
        let result = self.globals.set_by_name(name, value);
        #[cfg(feature = "tracing")]
        if result.is_err() {
            tracing::warn!("set_global: unknown parameter {name:?}");
        }
        result
    }

    /// Publish a global parameter.
    pub fn set(&self, param: GlobalParam, value: f32) -> f32 {
        self.globals.set(param, value)
    }

    /// Shared parameter store.
    pub fn globals(&self) -> &Arc<GlobalParams> {
        &self.globals
    }
}

/// Polyphonic wavetable synthesis engine.
#[derive(Debug)]
pub struct SynthEngine {
    config: EngineConfig,
    bank: WavetableBank,
    pool: VoicePool,
    globals: Arc<GlobalParams>,
    events_rx: Receiver<NoteEvent>,
    events_tx: Sender<NoteEvent>,
    overflows: Arc<AtomicU64>,
    wave_mix: ParameterRamp,
    cutoff: ParameterRamp,
    block: BlockParams,
    stats: EngineStats,
}

impl SynthEngine {
    /// Build an engine and its control handle.
    ///
    /// Allocates the wavetables, the voice pool and the event queue.
    pub fn new(config: EngineConfig) -> Result<(Self, EngineHandle), PrepareError> {
        validate(config.sample_rate, config.max_block_size, config.polyphony)?;
        if config.event_queue_capacity == 0 {
            return Err(PrepareError::InvalidQueueCapacity);
        }

        let bank = WavetableBank::new(config.table_length)?;
        let pool = VoicePool::new(
            config.polyphony,
            config.sample_rate,
            config.ramp_curve,
            config.smoothing_time,
            config.steal_policy,
        );
        let globals = Arc::new(GlobalParams::new());
        let (events_tx, events_rx) = bounded(config.event_queue_capacity);
        let overflows = Arc::new(AtomicU64::new(0));

        let snapshot = globals.snapshot();
        let ramp = |initial| {
            ParameterRamp::with_config(
                initial,
                config.ramp_curve,
                config.sample_rate,
                config.smoothing_time,
            )
        };

        let mut engine = Self {
            config,
            bank,
            pool,
            globals: Arc::clone(&globals),
            events_rx,
            events_tx: events_tx.clone(),
            overflows: Arc::clone(&overflows),
            wave_mix: ramp(snapshot.wave_mix),
            cutoff: ramp(snapshot.cutoff),
            block: BlockParams::new(
                EnvelopeParams::from(&snapshot),
                snapshot.wave_mix,
                snapshot.cutoff,
                config.sample_rate,
            ),
            stats: EngineStats::default(),
        };
        engine.rebuild_block(&snapshot);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = config.sample_rate,
            polyphony = config.polyphony,
            max_block_size = config.max_block_size,
            "engine created"
        );

        let handle = EngineHandle {
            events: events_tx,
            globals,
            overflows,
        };
        Ok((engine, handle))
    }

    /// Reconfigure for a new stream.
    ///
    /// Changing the polyphony reallocates the voice pool (silencing it);
    /// changing only the sample rate releases sounding notes. Call from
    /// setup code, never from the render callback.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
        polyphony: usize,
    ) -> Result<(), PrepareError> {
        validate(sample_rate, max_block_size, polyphony)?;

        self.config.max_block_size = max_block_size;
        if polyphony != self.pool.polyphony() {
            self.pool = VoicePool::new(
                polyphony,
                sample_rate,
                self.config.ramp_curve,
                self.config.smoothing_time,
                self.config.steal_policy,
            );
            self.config.polyphony = polyphony;
        }
        self.apply_sample_rate(sample_rate);

        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, max_block_size, polyphony, "engine prepared");
        Ok(())
    }

    /// Switch sample rate: releases every note and rebinds ramps, envelopes
    /// and filters.
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<(), PrepareError> {
        validate(sample_rate, self.config.max_block_size, self.config.polyphony)?;
        self.apply_sample_rate(sample_rate);
        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, "engine sample rate changed");
        Ok(())
    }

    fn apply_sample_rate(&mut self, sample_rate: f32) {
        self.pool.release_all();
        self.pool.set_sample_rate(sample_rate);
        self.config.sample_rate = sample_rate;
        self.wave_mix.reset(sample_rate, self.config.smoothing_time);
        self.cutoff.reset(sample_rate, self.config.smoothing_time);
        self.snap_globals();
    }

    /// Jump to the stored global values without smoothing.
    ///
    /// Setup code that loads a patch calls this before the first block, so
    /// the patch holds from frame zero instead of one block later.
    pub fn snap_globals(&mut self) {
        let snapshot = self.globals.snapshot();
        self.wave_mix.set_current_and_target(snapshot.wave_mix);
        self.cutoff.set_current_and_target(snapshot.cutoff);
        self.rebuild_block(&snapshot);
    }

    /// Render `frames` interleaved frames of `channels` channels into `out`.
    ///
    /// `out` is overwritten. Frames beyond `out.len() / channels` are ignored.
    pub fn render_block(&mut self, out: &mut [f32], channels: usize, frames: usize) {
        if channels == 0 {
            return;
        }
        let frames = frames.min(out.len() / channels);
        let mut done = 0;
        while done < frames {
            let n = (frames - done).min(self.config.max_block_size);
            out[done * channels..(done + n) * channels].fill(0.0);
            self.drain_events();
            self.pool
                .render(out, channels, done, n, &self.block, &self.bank);
            self.refresh_globals(n);
            done += n;
        }
    }

    /// Queue an event from the owning thread; same semantics as
    /// [`EngineHandle::push_event`].
    pub fn push_event(&self, event: NoteEvent) -> bool {
        match self.events_tx.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                self.overflows.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Apply an event immediately, bypassing the queue.
    ///
    /// For offline rendering, where the caller splits blocks at event times.
    pub fn dispatch(&mut self, event: NoteEvent) -> DispatchOutcome {
        let outcome = self.pool.dispatch(event);
        match outcome {
            DispatchOutcome::Assigned { .. } => self.stats.notes_assigned += 1,
            DispatchOutcome::Stolen { .. } => self.stats.voices_stolen += 1,
            DispatchOutcome::Dropped => self.stats.notes_dropped += 1,
            DispatchOutcome::Ignored => self.stats.events_ignored += 1,
            DispatchOutcome::Forwarded { .. } | DispatchOutcome::ReleasedAll => {}
        }
        outcome
    }

    /// Publish a global parameter by name. Returns the clamped stored value.
    pub fn set_global(&self, name: &str, value: f32) -> Result<f32, UnknownParam> {
        self.globals.set_by_name(name, value)
    }

    /// A new control handle sharing this engine's queue and parameters.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            events: self.events_tx.clone(),
            globals: Arc::clone(&self.globals),
            overflows: Arc::clone(&self.overflows),
        }
    }

    fn drain_events(&mut self) {
        for _ in 0..self.config.event_queue_capacity {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.dispatch(event);
                }
                Err(_) => break,
            }
        }
    }

    fn refresh_globals(&mut self, frames: usize) {
        let snapshot = self.globals.snapshot();
        self.wave_mix.set_target_value(snapshot.wave_mix);
        self.cutoff.set_target_value(snapshot.cutoff);
        self.wave_mix.skip(frames);
        self.cutoff.skip(frames);
        self.rebuild_block(&snapshot);
    }

    fn rebuild_block(&mut self, snapshot: &GlobalSnapshot) {
        let cutoff = self.cutoff.current_value();
        self.block = BlockParams {
            envelope: EnvelopeParams::from(snapshot),
            wave_mix: self.wave_mix.current_value(),
            cutoff,
            filter_coeff: lowpass_coeff(cutoff, self.config.sample_rate),
            primary: self.config.primary_shape,
            secondary: self.config.secondary_shape,
            pressure_depth: self.config.pressure_depth,
            timbre_depth: self.config.timbre_depth,
        };
    }

    /// Counters since construction.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            queue_overflows: self.overflows.load(Ordering::Relaxed),
            ..self.stats
        }
    }

    /// Voices whose envelope is running.
    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    /// Current settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared parameter store.
    pub fn globals(&self) -> &Arc<GlobalParams> {
        &self.globals
    }

    /// Voice pool for inspection.
    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Values handed to voices on the next render call.
    pub fn block_params(&self) -> &BlockParams {
        &self.block
    }
}
