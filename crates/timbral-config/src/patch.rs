//! Patch file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use timbral_core::{GlobalParam, GlobalParams, GlobalSnapshot, RampCurve};
use timbral_synth::{EngineConfig, StealPolicy, WaveShape};

use crate::error::ConfigError;
use crate::validation::{ValidationError, ValidationResult, validate_patch};

/// A complete instrument setup: engine construction settings plus the
/// starting values of every global parameter.
///
/// # TOML Format
///
/// ```toml
/// name = "Soft Pad"
/// description = "Slow swell, blends towards square under timbre"
///
/// [engine]
/// polyphony = 15
/// steal_policy = "releasing-first"
/// table_length = 2048
/// primary_shape = "sine"
/// secondary_shape = "sawtooth"
/// smoothing_time = 0.1
/// ramp_curve = "exponential"
/// pressure_depth = 0.8
/// timbre_depth = 0.6
///
/// [globals]
/// attack = 1.2
/// release = 2.0
/// ```
///
/// Every table and key is optional; missing values take the engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    /// Name of the patch.
    pub name: String,

    /// Optional description of the patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Engine construction settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Starting global parameter values.
    #[serde(default)]
    pub globals: GlobalSettings,
}

/// The `[engine]` table of a patch.
///
/// Enumerated settings are stored by name so files stay readable; they are
/// resolved when the patch is turned into an [`EngineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Number of voices.
    pub polyphony: usize,
    /// `never`, `oldest`, `quietest` or `releasing-first`.
    pub steal_policy: String,
    /// Wavetable period length, a power of two.
    pub table_length: usize,
    /// `sawtooth`, `square` or `sine`.
    pub primary_shape: String,
    /// `sawtooth`, `square` or `sine`.
    pub secondary_shape: String,
    /// Parameter ramp time constant in seconds.
    pub smoothing_time: f32,
    /// `exponential` or `linear`.
    pub ramp_curve: String,
    /// Pressure attenuation depth, 0 to 1.
    pub pressure_depth: f32,
    /// Timbre blend depth, 0 to 1.
    pub timbre_depth: f32,
    /// Largest sub-block between event drains.
    pub max_block_size: usize,
    /// Event queue capacity.
    pub event_queue_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            polyphony: config.polyphony,
            steal_policy: config.steal_policy.name().to_string(),
            table_length: config.table_length,
            primary_shape: config.primary_shape.name().to_string(),
            secondary_shape: config.secondary_shape.name().to_string(),
            smoothing_time: config.smoothing_time,
            ramp_curve: config.ramp_curve.name().to_string(),
            pressure_depth: config.pressure_depth,
            timbre_depth: config.timbre_depth,
            max_block_size: config.max_block_size,
            event_queue_capacity: config.event_queue_capacity,
        }
    }
}

/// Matches `value` against `names`, ignoring ASCII case and treating `_`
/// and `-` alike.
fn lookup<T: Copy>(
    setting: &str,
    value: &str,
    all: &[T],
    name: fn(T) -> &'static str,
) -> ValidationResult<T> {
    let normalize = |s: &str| s.trim().to_ascii_lowercase().replace('_', "-");
    let wanted = normalize(value);
    all.iter()
        .copied()
        .find(|&v| normalize(name(v)) == wanted)
        .ok_or_else(|| {
            let choices: Vec<&str> = all.iter().map(|&v| name(v)).collect();
            ValidationError::InvalidSetting {
                setting: setting.to_string(),
                reason: format!("unknown value '{value}', expected one of {}", choices.join(", ")),
            }
        })
}

impl EngineSettings {
    /// Resolved steal policy.
    pub fn steal_policy(&self) -> ValidationResult<StealPolicy> {
        lookup("steal_policy", &self.steal_policy, &StealPolicy::ALL, StealPolicy::name)
    }

    /// Resolved primary table shape.
    pub fn primary_shape(&self) -> ValidationResult<WaveShape> {
        lookup("primary_shape", &self.primary_shape, &WaveShape::ALL, WaveShape::name)
    }

    /// Resolved secondary table shape.
    pub fn secondary_shape(&self) -> ValidationResult<WaveShape> {
        lookup("secondary_shape", &self.secondary_shape, &WaveShape::ALL, WaveShape::name)
    }

    /// Resolved ramp curve.
    pub fn ramp_curve(&self) -> ValidationResult<RampCurve> {
        lookup("ramp_curve", &self.ramp_curve, &RampCurve::ALL, RampCurve::name)
    }

    /// Build an [`EngineConfig`] for the given sample rate.
    ///
    /// Only the named settings are checked here; numeric limits are left to
    /// [`validate_engine`](crate::validate_engine) and the engine itself.
    pub fn engine_config(&self, sample_rate: f32) -> ValidationResult<EngineConfig> {
        Ok(EngineConfig {
            sample_rate,
            max_block_size: self.max_block_size,
            polyphony: self.polyphony,
            steal_policy: self.steal_policy()?,
            table_length: self.table_length,
            primary_shape: self.primary_shape()?,
            secondary_shape: self.secondary_shape()?,
            smoothing_time: self.smoothing_time,
            ramp_curve: self.ramp_curve()?,
            pressure_depth: self.pressure_depth,
            timbre_depth: self.timbre_depth,
            event_queue_capacity: self.event_queue_capacity,
        })
    }
}

/// The `[globals]` table of a patch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalSettings {
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
    /// Primary/secondary table blend.
    pub wave_mix: f32,
    /// Decay/release shape, 0 linear to 1 exponential.
    pub decay_ramp: f32,
}

impl GlobalSettings {
    /// Value of one parameter.
    pub fn get(&self, param: GlobalParam) -> f32 {
        self.snapshot().get(param)
    }

    /// Set one parameter without range checks.
    pub fn set(&mut self, param: GlobalParam, value: f32) {
        let slot = match param {
            GlobalParam::Cutoff => &mut self.cutoff,
            GlobalParam::Attack => &mut self.attack,
            GlobalParam::Decay => &mut self.decay,
            GlobalParam::Sustain => &mut self.sustain,
            GlobalParam::Release => &mut self.release,
            GlobalParam::WaveMix => &mut self.wave_mix,
            GlobalParam::DecayRamp => &mut self.decay_ramp,
        };
        *slot = value;
    }

    /// Plain copy for the engine.
    pub fn snapshot(&self) -> GlobalSnapshot {
        GlobalSnapshot {
            cutoff: self.cutoff,
            attack: self.attack,
            decay: self.decay,
            sustain: self.sustain,
            release: self.release,
            wave_mix: self.wave_mix,
            decay_ramp: self.decay_ramp,
        }
    }
}

impl From<GlobalSnapshot> for GlobalSettings {
    fn from(s: GlobalSnapshot) -> Self {
        Self {
            cutoff: s.cutoff,
            attack: s.attack,
            decay: s.decay,
            sustain: s.sustain,
            release: s.release,
            wave_mix: s.wave_mix,
            decay_ramp: s.decay_ramp,
        }
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        GlobalSnapshot::default().into()
    }
}

impl Patch {
    /// Create a patch with default engine settings and globals.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            engine: EngineSettings::default(),
            globals: GlobalSettings::default(),
        }
    }

    /// Create a patch with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set one global value.
    pub fn with_global(mut self, param: GlobalParam, value: f32) -> Self {
        self.globals.set(param, value);
        self
    }

    /// Capture a running engine's configuration and current globals.
    pub fn capture(name: impl Into<String>, config: &EngineConfig, globals: &GlobalParams) -> Self {
        Self {
            name: name.into(),
            description: None,
            engine: EngineSettings::from(config),
            globals: globals.snapshot().into(),
        }
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch: Patch = toml::from_str(&content)?;
        Ok(patch)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the whole patch and build an [`EngineConfig`] from it.
    pub fn engine_config(&self, sample_rate: f32) -> Result<EngineConfig, ConfigError> {
        validate_patch(self)?;
        Ok(self.engine.engine_config(sample_rate)?)
    }

    /// Push every global value into a live store.
    ///
    /// The store clamps, so an unvalidated patch still lands in range.
    pub fn apply(&self, globals: &GlobalParams) {
        globals.apply(&self.globals.snapshot());
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
