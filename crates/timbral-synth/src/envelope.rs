//! ADSR envelope generator for per-voice amplitude.
//!
//! The envelope holds only its own state (stage, level, elapsed time). Its
//! times and sustain level arrive on every call as [`EnvelopeParams`], taken
//! from the engine's global snapshot once per block, so a parameter edit
//! reaches every sounding voice without per-voice bookkeeping.
//!
//! # Segment shapes
//!
//! - **Attack** rises linearly to 1.0 over the attack time.
//! - **Decay** and **Release** blend two approaches by the `decay_ramp`
//!   coefficient `c`: `c = 0` is a constant-rate line that lands exactly at
//!   the segment time, `c = 1` is an exponential approach reaching -80 dB
//!   of the distance in the segment time.
//!
//! Each per-sample step is a non-negative mix of two steps that never pass
//! the segment target, so Attack never falls and Decay/Release never rise.
//! Raising the sustain level above the current level mid-decay ends Decay
//! without a step; the Sustain stage then follows the parameter.

use libm::expf;
use timbral_core::GlobalSnapshot;

/// Level distance at which a falling segment is considered finished.
pub const ENVELOPE_FLOOR: f32 = 1e-4;

/// Time constants per segment for the exponential shape, `ln(1 / ENVELOPE_FLOOR)`.
const EXP_SEGMENT_TAUS: f32 = 9.210_34;

/// Envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Inactive, output is zero.
    #[default]
    Idle,
    /// Rising toward 1.0.
    Attack,
    /// Falling from 1.0 toward the sustain level.
    Decay,
    /// Holding the sustain level while the note is down.
    Sustain,
    /// Falling to zero after note-off.
    Release,
}

/// Times and levels shared by every voice's envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParams {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level, 0 to 1.
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
    /// Decay/release shape, 0 (linear) to 1 (exponential).
    pub decay_ramp: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::from(&GlobalSnapshot::default())
    }
}

impl From<&GlobalSnapshot> for EnvelopeParams {
    fn from(snapshot: &GlobalSnapshot) -> Self {
        Self {
            attack: snapshot.attack,
            decay: snapshot.decay,
            sustain: snapshot.sustain,
            release: snapshot.release,
            decay_ramp: snapshot.decay_ramp,
        }
    }
}

/// ADSR envelope generator.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{Envelope, EnvelopeParams, EnvelopeStage};
///
/// let params = EnvelopeParams { attack: 0.01, decay: 0.1, sustain: 0.7, release: 0.2, decay_ramp: 0.0 };
/// let mut env = Envelope::new(48000.0);
///
/// env.note_on();
/// for _ in 0..480 {
///     env.next_sample(&params);
/// }
/// assert_eq!(env.stage(), EnvelopeStage::Decay);
///
/// env.note_off();
/// assert_eq!(env.stage(), EnvelopeStage::Release);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    stage: EnvelopeStage,
    level: f32,
    sample_rate: f32,
    /// Seconds spent in the current stage
    elapsed: f32,
    /// Level captured at note-off; sets the linear release rate
    release_from: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Envelope {
    /// Create an idle envelope.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            sample_rate,
            elapsed: 0.0,
            release_from: 0.0,
        }
    }

    /// Set sample rate. Takes effect on the next sample.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Start (or restart) the attack from the current level.
    pub fn note_on(&mut self) {
        self.enter(EnvelopeStage::Attack);
    }

    /// Enter release from the current level. No-op when idle.
    pub fn note_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.release_from = self.level;
            self.enter(EnvelopeStage::Release);
        }
    }

    /// Jump to idle at level 0.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.elapsed = 0.0;
        self.release_from = 0.0;
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Seconds spent in the current stage.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// False only when idle.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// True once note-off has been received.
    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self, params: &EnvelopeParams) -> f32 {
        let dt = 1.0 / self.sample_rate;
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
                return 0.0;
            }
            EnvelopeStage::Attack => {
                let samples = params.attack * self.sample_rate;
                if samples < 1.0 {
                    self.level = 1.0;
                } else {
                    self.level += 1.0 / samples;
                }
                // Tolerance absorbs rounding in the accumulated increments.
                if self.level >= 1.0 - 1e-5 {
                    self.level = 1.0;
                    self.enter(EnvelopeStage::Decay);
                    return self.level;
                }
            }
            EnvelopeStage::Decay => {
                let sustain = params.sustain.clamp(0.0, 1.0);
                if self.level > sustain {
                    self.level -= self.fall_step(
                        self.level - sustain,
                        1.0 - sustain,
                        params.decay,
                        params.decay_ramp,
                    );
                }
                if self.level - sustain < ENVELOPE_FLOOR {
                    // Sustain raised past the level: hold instead of stepping up.
                    self.level = self.level.min(sustain);
                    self.enter(EnvelopeStage::Sustain);
                    return self.level;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = params.sustain.clamp(0.0, 1.0);
            }
            EnvelopeStage::Release => {
                self.level -= self.fall_step(
                    self.level,
                    self.release_from,
                    params.release,
                    params.decay_ramp,
                );
                if self.level < ENVELOPE_FLOOR {
                    self.level = 0.0;
                    self.enter(EnvelopeStage::Idle);
                    return 0.0;
                }
            }
        }
        self.elapsed += dt;
        self.level
    }

    /// Size of one falling step.
    ///
    /// `distance` is what remains to the segment target, `span` the whole
    /// segment height that the linear rate is derived from. The result lies
    /// in `[0, distance]`.
    #[inline]
    fn fall_step(&self, distance: f32, span: f32, time: f32, ramp: f32) -> f32 {
        let samples = time * self.sample_rate;
        if samples < 1.0 {
            return distance;
        }
        let linear = (span / samples).min(distance);
        let exponential = distance * (1.0 - expf(-EXP_SEGMENT_TAUS / samples));
        let ramp = ramp.clamp(0.0, 1.0);
        ((1.0 - ramp) * linear + ramp * exponential).min(distance)
    }

    fn enter(&mut self, stage: EnvelopeStage) {
        self.stage = stage;
        self.elapsed = 0.0;
    }
}
