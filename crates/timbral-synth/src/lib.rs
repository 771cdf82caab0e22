//! Timbral Synth - polyphonic MPE wavetable synthesis
//!
//! This crate turns per-note expressive gestures (pitch, pressure, timbre)
//! into a mixed audio stream. Each sounding note owns a voice: two wavetable
//! oscillators blended by timbre, scaled by an ADSR envelope and pressure,
//! and darkened by a one-pole lowpass.
//!
//! # Core Components
//!
//! ## Sound sources
//!
//! - [`WavetableBank`] - Sawtooth, square and sine tables with a guard sample
//! - [`Oscillator`] - Phase accumulator reading a table with linear interpolation
//! - [`Envelope`] - ADSR with a linear-to-exponential decay/release blend
//!
//! ```rust
//! use timbral_synth::{Oscillator, WaveShape, WavetableBank};
//!
//! let bank = WavetableBank::new(2048).unwrap();
//! let mut osc = Oscillator::new();
//! osc.set_frequency(440.0, 48000.0, bank.table_length());
//!
//! let sample = osc.next_sample(bank.table(WaveShape::Sawtooth));
//! assert!(sample.abs() <= 1.0);
//! ```
//!
//! ## Voices
//!
//! - [`Voice`] - One gesture's full signal path with smoothed controls
//! - [`VoicePool`] - Note-to-voice routing and [`StealPolicy`] selection
//! - [`NoteEvent`] / [`NoteId`] - The events the pool understands
//!
//! ## Engine (`std`)
//!
//! - [`SynthEngine`] - Block renderer fed by a lock-free event queue
//! - [`EngineHandle`] - Control-side endpoint for events and globals
//! - [`OfflineRenderer`] - Sample-accurate rendering of a timed event list
//! - [`MpeTranslator`] - Raw MIDI to [`NoteEvent`] in MPE legacy mode
//!
//! ```rust
//! use timbral_synth::{EngineConfig, NoteEvent, SynthEngine};
//!
//! let (mut engine, handle) = SynthEngine::new(EngineConfig::default()).unwrap();
//! handle.push_event(NoteEvent::note_on(1, 261.63, 0.8, 0.5));
//!
//! let mut buffer = vec![0.0f32; 2 * 256];
//! engine.render_block(&mut buffer, 2, 256);
//! ```
//!
//! # no_std Support
//!
//! Everything up to [`VoicePool`] is `no_std` compatible. Disable the
//! default `std` feature to drop the engine, renderer and MIDI translator:
//!
//! ```toml
//! [dependencies]
//! timbral-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
pub mod engine;
pub mod envelope;
pub mod event;
#[cfg(feature = "std")]
pub mod mpe;
pub mod oscillator;
pub mod pool;
#[cfg(feature = "std")]
pub mod renderer;
pub mod voice;
pub mod wavetable;

// Re-export main types at crate root
#[cfg(feature = "std")]
pub use engine::{EngineConfig, EngineHandle, EngineStats, PrepareError, SynthEngine};
pub use envelope::{ENVELOPE_FLOOR, Envelope, EnvelopeParams, EnvelopeStage};
pub use event::{KeyState, NoteEvent, NoteId};
#[cfg(feature = "std")]
pub use mpe::{DEFAULT_PITCH_BEND_RANGE, MpeTranslator, note_id};
pub use oscillator::Oscillator;
pub use pool::{DispatchOutcome, StealPolicy, VoicePool};
#[cfg(feature = "std")]
pub use renderer::{OfflineRenderer, TimedEvent};
pub use voice::{BlockParams, VOICE_AMP_SCALE, Voice, VoiceState};
pub use wavetable::{
    DEFAULT_TABLE_LENGTH, NAIVE_AMPLITUDE, WaveShape, Wavetable, WavetableBank, WavetableError,
};

// Re-export commonly used types from timbral-core
pub use timbral_core::{GlobalParam, GlobalParams, GlobalSnapshot, RampCurve, midi_to_freq};
