//! Lock-free global parameter store shared by the control and audio sides.
//!
//! The control side (UI, CLI, patch loader) writes with [`GlobalParams::set`];
//! the render side reads a whole [`GlobalSnapshot`] once per block and passes
//! it down to every voice. Each value lives in its own [`AtomicF32`], so a
//! reader never observes a torn float. Cross-parameter consistency is not
//! guaranteed within a block and is not needed: every parameter is either
//! smoothed or only sampled at segment boundaries.
//!
//! # Example
//!
//! ```rust
//! use timbral_core::{GlobalParam, GlobalParams};
//!
//! let params = GlobalParams::new();
//! params.set(GlobalParam::Attack, 0.25);
//! params.set_by_name("cutoff", 1200.0).unwrap();
//!
//! let snap = params.snapshot();
//! assert_eq!(snap.attack, 0.25);
//! assert_eq!(snap.cutoff, 1200.0);
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::param_info::{ParamDescriptor, ParamScale, ParamUnit};

/// An `f32` stored as its bit pattern in an [`AtomicU32`].
///
/// All accesses use `Relaxed` ordering: each value is independent and only
/// needs to be untorn.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Create a new atomic float.
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Read the current value.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Publish a new value.
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Engine-wide parameters shared by every voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalParam {
    /// Lowpass cutoff in Hz.
    Cutoff,
    /// Attack time in seconds.
    Attack,
    /// Decay time in seconds.
    Decay,
    /// Sustain level, 0 to 1.
    Sustain,
    /// Release time in seconds.
    Release,
    /// Blend between the primary (0) and secondary (1) wavetables.
    WaveMix,
    /// Decay/release shape: 0 is linear, 1 is exponential.
    DecayRamp,
}

/// Number of [`GlobalParam`] variants.
pub const GLOBAL_PARAM_COUNT: usize = 7;

static DESCRIPTORS: [ParamDescriptor; GLOBAL_PARAM_COUNT] = [
    ParamDescriptor::new("Cutoff", "cutoff", ParamUnit::Hertz, 20.0, 20000.0, 8000.0)
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::new("Attack", "attack", ParamUnit::Seconds, 0.0, 5.0, 0.1),
    ParamDescriptor::new("Decay", "decay", ParamUnit::Seconds, 0.0, 5.0, 0.1),
    ParamDescriptor::new("Sustain", "sustain", ParamUnit::None, 0.0, 1.0, 1.0),
    ParamDescriptor::new("Release", "release", ParamUnit::Seconds, 0.0, 5.0, 0.1),
    ParamDescriptor::new("Wave Mix", "wave_mix", ParamUnit::None, 0.0, 1.0, 0.0),
    ParamDescriptor::new("Decay Ramp", "decay_ramp", ParamUnit::None, 0.0, 1.0, 0.0),
];

impl GlobalParam {
    /// Every parameter, in store order.
    pub const ALL: [GlobalParam; GLOBAL_PARAM_COUNT] = [
        GlobalParam::Cutoff,
        GlobalParam::Attack,
        GlobalParam::Decay,
        GlobalParam::Sustain,
        GlobalParam::Release,
        GlobalParam::WaveMix,
        GlobalParam::DecayRamp,
    ];

    /// Position in the store.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Range, default and display metadata.
    #[inline]
    pub fn descriptor(self) -> &'static ParamDescriptor {
        &DESCRIPTORS[self as usize]
    }

    /// Look a parameter up by its string ID (`"cutoff"`, `"wave_mix"`, ...).
    ///
    /// Matching is ASCII case-insensitive and accepts `-` for `_`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| {
            let id = p.descriptor().string_id.as_bytes();
            let candidate = name.as_bytes();
            id.len() == candidate.len()
                && id.iter().zip(candidate).all(|(&a, &b)| {
                    let b = if b == b'-' { b'_' } else { b };
                    a.eq_ignore_ascii_case(&b)
                })
        })
    }
}

impl fmt::Display for GlobalParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().string_id)
    }
}

/// A parameter name that matches no [`GlobalParam`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParam;

impl fmt::Display for UnknownParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown global parameter")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownParam {}

/// A plain copy of every global value, taken once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalSnapshot {
    /// Lowpass cutoff in Hz.
    pub cutoff: f32,
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level.
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
    /// Wavetable blend.
    pub wave_mix: f32,
    /// Decay/release shape.
    pub decay_ramp: f32,
}

impl GlobalSnapshot {
    /// Value of one parameter.
    pub fn get(&self, param: GlobalParam) -> f32 {
        match param {
            GlobalParam::Cutoff => self.cutoff,
            GlobalParam::Attack => self.attack,
            GlobalParam::Decay => self.decay,
            GlobalParam::Sustain => self.sustain,
            GlobalParam::Release => self.release,
            GlobalParam::WaveMix => self.wave_mix,
            GlobalParam::DecayRamp => self.decay_ramp,
        }
    }
}

impl Default for GlobalSnapshot {
    fn default() -> Self {
        Self {
            cutoff: GlobalParam::Cutoff.descriptor().default,
            attack: GlobalParam::Attack.descriptor().default,
            decay: GlobalParam::Decay.descriptor().default,
            sustain: GlobalParam::Sustain.descriptor().default,
            release: GlobalParam::Release.descriptor().default,
            wave_mix: GlobalParam::WaveMix.descriptor().default,
            decay_ramp: GlobalParam::DecayRamp.descriptor().default,
        }
    }
}

/// Single-writer, many-reader store of [`GlobalParam`] values.
///
/// Share it between threads with an `Arc`. Writes clamp to the descriptor
/// range, so the render side never sees an out-of-range value.
#[derive(Debug)]
pub struct GlobalParams {
    values: [AtomicF32; GLOBAL_PARAM_COUNT],
}

impl GlobalParams {
    /// A store holding every descriptor default.
    pub fn new() -> Self {
        Self {
            values: GlobalParam::ALL.map(|p| AtomicF32::new(p.descriptor().default)),
        }
    }

    /// Publish a value, clamped to the parameter range. Returns the stored value.
    pub fn set(&self, param: GlobalParam, value: f32) -> f32 {
        let clamped = param.descriptor().clamp(value);
        self.values[param.index()].store(clamped);
        clamped
    }

    /// [`set`](Self::set) by string ID.
    pub fn set_by_name(&self, name: &str, value: f32) -> Result<f32, UnknownParam> {
        let param = GlobalParam::from_name(name).ok_or(UnknownParam)?;
        Ok(self.set(param, value))
    }

    /// Current value of one parameter.
    #[inline]
    pub fn get(&self, param: GlobalParam) -> f32 {
        self.values[param.index()].load()
    }

    /// Copy every value at once.
    pub fn snapshot(&self) -> GlobalSnapshot {
        GlobalSnapshot {
            cutoff: self.get(GlobalParam::Cutoff),
            attack: self.get(GlobalParam::Attack),
            decay: self.get(GlobalParam::Decay),
            sustain: self.get(GlobalParam::Sustain),
            release: self.get(GlobalParam::Release),
            wave_mix: self.get(GlobalParam::WaveMix),
            decay_ramp: self.get(GlobalParam::DecayRamp),
        }
    }

    /// Publish every value of a snapshot (clamped).
    pub fn apply(&self, snapshot: &GlobalSnapshot) {
        for param in GlobalParam::ALL {
            self.set(param, snapshot.get(param));
        }
    }
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self::new()
    }
}
