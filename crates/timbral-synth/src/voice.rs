//! A single synthesis voice: two wavetable oscillators, an ADSR, three
//! per-note ramps and a one-pole lowpass.
//!
//! Voices are created once when the pool is prepared and reused for every
//! note afterwards. A voice is *free* exactly when its envelope is idle; the
//! pool never tracks a separate busy flag.
//!
//! ## Signal path (per sample)
//!
//! ```text
//! mix   = clamp(wave_mix + timbre_depth * timbre, 0, 1)
//! osc   = primary + mix * (secondary - primary)
//! gain  = 1 - pressure_depth * (1 - pressure)
//! out  += lowpass(osc * envelope * gain * VOICE_AMP_SCALE)
//! ```

use timbral_core::{OnePole, ParameterRamp, RampCurve, lerp, lowpass_coeff};

use crate::envelope::{Envelope, EnvelopeParams};
use crate::event::{KeyState, NoteId};
use crate::oscillator::Oscillator;
use crate::wavetable::{WaveShape, WavetableBank};

/// Fixed output scaling applied to every voice before mixing.
pub const VOICE_AMP_SCALE: f32 = 0.25;

/// Everything a voice reads from the engine for one render call.
///
/// Built once per block from the global snapshot and engine settings, then
/// shared by reference with every voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    /// Envelope times and levels.
    pub envelope: EnvelopeParams,
    /// Smoothed primary/secondary blend, 0 to 1.
    pub wave_mix: f32,
    /// Smoothed lowpass cutoff in Hz.
    pub cutoff: f32,
    /// Lowpass coefficient for `cutoff`, see [`lowpass_coeff`].
    pub filter_coeff: f32,
    /// Table read by the primary oscillator.
    pub primary: WaveShape,
    /// Table read by the secondary oscillator.
    pub secondary: WaveShape,
    /// How far pressure below 1 attenuates the voice, 0 to 1.
    pub pressure_depth: f32,
    /// How far timbre pushes the blend toward the secondary table, 0 to 1.
    pub timbre_depth: f32,
}

impl BlockParams {
    /// Block parameters for the given envelope, blend and cutoff, with the
    /// default sawtooth/square table pair and half-depth pressure and timbre.
    pub fn new(envelope: EnvelopeParams, wave_mix: f32, cutoff: f32, sample_rate: f32) -> Self {
        Self {
            envelope,
            wave_mix,
            cutoff,
            filter_coeff: lowpass_coeff(cutoff, sample_rate),
            primary: WaveShape::Sawtooth,
            secondary: WaveShape::Square,
            pressure_depth: 0.5,
            timbre_depth: 0.5,
        }
    }
}

/// Lifecycle of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Envelope idle; available for a new note.
    Free,
    /// Playing a held note (attack, decay or sustain).
    Assigned,
    /// Note released; tail still sounding.
    Releasing,
}

/// One polyphony slot.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{BlockParams, EnvelopeParams, NoteId, Voice, WavetableBank};
/// use timbral_core::RampCurve;
///
/// let bank = WavetableBank::new(2048).unwrap();
/// let block = BlockParams::new(EnvelopeParams::default(), 0.0, 8000.0, 48000.0);
/// let mut voice = Voice::new(48000.0, RampCurve::Exponential, 0.1);
///
/// voice.assign(NoteId(1), 440.0, 1.0, 0.0, 1);
/// let mut out = [0.0f32; 2 * 64];
/// voice.render_block(&mut out, 2, 0, 64, &block, &bank);
/// assert!(out.iter().any(|&s| s != 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    primary: Oscillator,
    secondary: Oscillator,
    envelope: Envelope,
    pressure: ParameterRamp,
    timbre: ParameterRamp,
    frequency: ParameterRamp,
    filter: OnePole,
    note: Option<NoteId>,
    key_state: KeyState,
    /// Allocation order stamp; lower is older
    age: u64,
    sample_rate: f32,
    smoothing_time: f32,
}

impl Voice {
    /// Create a free voice.
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `curve` - Shape of the pressure/timbre/pitch ramps
    /// * `smoothing_time` - Ramp time constant in seconds
    pub fn new(sample_rate: f32, curve: RampCurve, smoothing_time: f32) -> Self {
        let ramp = |initial| ParameterRamp::with_config(initial, curve, sample_rate, smoothing_time);
        Self {
            primary: Oscillator::new(),
            secondary: Oscillator::new(),
            envelope: Envelope::new(sample_rate),
            pressure: ramp(1.0),
            timbre: ramp(0.0),
            frequency: ramp(440.0),
            filter: OnePole::new(sample_rate, 20000.0),
            note: None,
            key_state: KeyState::Off,
            age: 0,
            sample_rate,
            smoothing_time,
        }
    }

    /// Rebind every rate-dependent component to a new sample rate.
    ///
    /// Ramps snap to their targets.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.envelope.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        for ramp in [&mut self.pressure, &mut self.timbre, &mut self.frequency] {
            ramp.reset(sample_rate, self.smoothing_time);
        }
    }

    /// Start a note on a free voice.
    ///
    /// Oscillator phases and filter state restart from zero; the ramps jump
    /// to the note's initial values; the envelope attacks from its current
    /// level.
    pub fn assign(&mut self, id: NoteId, frequency: f32, pressure: f32, timbre: f32, age: u64) {
        self.primary.reset();
        self.secondary.reset();
        self.filter.reset();
        self.pressure.set_current_and_target(pressure);
        self.timbre.set_current_and_target(timbre);
        self.frequency.set_current_and_target(frequency);
        self.envelope.note_on();
        self.note = Some(id);
        self.key_state = KeyState::Down;
        self.age = age;
    }

    /// Take over a busy voice for a new note.
    ///
    /// The envelope is cut to zero first so the new attack starts from
    /// silence. The previous note id is forgotten in the same step.
    pub fn steal(&mut self, id: NoteId, frequency: f32, pressure: f32, timbre: f32, age: u64) {
        self.envelope.reset();
        self.assign(id, frequency, pressure, timbre, age);
    }

    /// Set the pressure target.
    pub fn update_pressure(&mut self, pressure: f32) {
        self.pressure.set_target_value(pressure);
    }

    /// Set the pitch target in Hz.
    pub fn update_pitch(&mut self, frequency: f32) {
        self.frequency.set_target_value(frequency);
    }

    /// Set the timbre target.
    pub fn update_timbre(&mut self, timbre: f32) {
        self.timbre.set_target_value(timbre);
    }

    /// Enter the release tail. The voice stays busy until the envelope ends.
    pub fn release(&mut self) {
        self.envelope.note_off();
        self.key_state = KeyState::Off;
    }

    /// Forget the note id without touching the sound.
    pub fn detach_note(&mut self) {
        self.note = None;
    }

    /// Render `num_frames` frames starting at `start_frame`, adding into every
    /// channel of the interleaved buffer `out`.
    ///
    /// A voice whose envelope is idle contributes nothing; it clears its note
    /// and zeroes its phases before the first frame it would have produced.
    ///
    /// The smoothed pitch is clamped to `[0, sample_rate / 2]` before it
    /// reaches the oscillators, whatever the note events asked for.
    pub fn render_block(
        &mut self,
        out: &mut [f32],
        channels: usize,
        start_frame: usize,
        num_frames: usize,
        block: &BlockParams,
        bank: &WavetableBank,
    ) {
        if !self.envelope.is_active() {
            self.clear_note();
            return;
        }

        let primary_table = bank.table(block.primary);
        let secondary_table = bank.table(block.secondary);
        let table_length = bank.table_length();
        let nyquist = 0.5 * self.sample_rate;
        self.filter.set_coeff(block.filter_coeff, block.cutoff);

        for frame in start_frame..start_frame + num_frames {
            if !self.envelope.is_active() {
                self.clear_note();
                return;
            }

            let frequency = self.frequency.next_value().clamp(0.0, nyquist);
            self.primary.set_frequency(frequency, self.sample_rate, table_length);
            self.secondary.set_frequency(frequency, self.sample_rate, table_length);

            let timbre = self.timbre.next_value();
            let pressure = self.pressure.next_value();
            let mix = (block.wave_mix + block.timbre_depth * timbre).clamp(0.0, 1.0);

            let a = self.primary.next_sample(primary_table);
            let b = self.secondary.next_sample(secondary_table);
            let osc = lerp(a, b, mix);

            let level = self.envelope.next_sample(&block.envelope);
            let gain = 1.0 - block.pressure_depth * (1.0 - pressure);
            let sample = self.filter.process(osc * level * gain * VOICE_AMP_SCALE);

            let base = frame * channels;
            for out_sample in &mut out[base..base + channels] {
                *out_sample += sample;
            }
        }
    }

    fn clear_note(&mut self) {
        self.note = None;
        self.key_state = KeyState::Off;
        self.primary.reset();
        self.secondary.reset();
    }

    /// Lifecycle state derived from the envelope.
    pub fn state(&self) -> VoiceState {
        if !self.envelope.is_active() {
            VoiceState::Free
        } else if self.envelope.is_releasing() {
            VoiceState::Releasing
        } else {
            VoiceState::Assigned
        }
    }

    /// True when the envelope is idle.
    #[inline]
    pub fn is_free(&self) -> bool {
        !self.envelope.is_active()
    }

    /// Note currently owned by this voice.
    #[inline]
    pub fn note(&self) -> Option<NoteId> {
        self.note
    }

    /// Key state of the owned note.
    pub fn key_state(&self) -> KeyState {
        self.key_state
    }

    /// Allocation stamp; lower is older.
    #[inline]
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Current envelope level.
    #[inline]
    pub fn level(&self) -> f32 {
        self.envelope.level()
    }

    /// Envelope for inspection.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Read positions of the primary and secondary oscillators.
    pub fn phases(&self) -> (f32, f32) {
        (self.primary.phase(), self.secondary.phase())
    }

    /// Current (pressure, timbre, frequency) ramp values.
    pub fn controls(&self) -> (f32, f32, f32) {
        (
            self.pressure.current_value(),
            self.timbre.current_value(),
            self.frequency.current_value(),
        )
    }

    /// Target (pressure, timbre, frequency) ramp values.
    pub fn control_targets(&self) -> (f32, f32, f32) {
        (
            self.pressure.target_value(),
            self.timbre.target_value(),
            self.frequency.target_value(),
        )
    }
}
