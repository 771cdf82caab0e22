//! Factory patches bundled with timbral.
//!
//! These are always available without external files and serve as starting
//! points for user patches.

use crate::Patch;

/// Internal names of the factory patches.
pub static FACTORY_PATCH_NAMES: &[&str] = &[
    "init",
    "soft_pad",
    "pluck",
    "glass_keys",
    "bright_lead",
    "mono_bass",
];

static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("init", INIT_PATCH),
    ("soft_pad", SOFT_PAD_PATCH),
    ("pluck", PLUCK_PATCH),
    ("glass_keys", GLASS_KEYS_PATCH),
    ("bright_lead", BRIGHT_LEAD_PATCH),
    ("mono_bass", MONO_BASS_PATCH),
];

/// Engine defaults, sawtooth into square.
const INIT_PATCH: &str = r#"
name = "Init"
description = "Engine defaults: sawtooth blending to square, short envelope"
"#;

const SOFT_PAD_PATCH: &str = r#"
name = "Soft Pad"
description = "Slow sine swell that gains harmonics under timbre"

[engine]
steal_policy = "releasing-first"
primary_shape = "sine"
secondary_shape = "sawtooth"
smoothing_time = 0.2
pressure_depth = 0.8
timbre_depth = 0.7

[globals]
cutoff = 3000.0
attack = 1.2
decay = 0.8
sustain = 0.8
release = 2.5
wave_mix = 0.1
decay_ramp = 0.3
"#;

const PLUCK_PATCH: &str = r#"
name = "Pluck"
description = "Percussive sawtooth with an exponential fall and no sustain"

[engine]
steal_policy = "quietest"
pressure_depth = 0.3
timbre_depth = 0.4

[globals]
cutoff = 6000.0
attack = 0.002
decay = 0.35
sustain = 0.0
release = 0.3
wave_mix = 0.0
decay_ramp = 1.0
"#;

const GLASS_KEYS_PATCH: &str = r#"
name = "Glass Keys"
description = "Sine and square blend with a bell-like decay"

[engine]
steal_policy = "oldest"
primary_shape = "sine"
secondary_shape = "square"
timbre_depth = 0.5

[globals]
cutoff = 9000.0
attack = 0.005
decay = 1.5
sustain = 0.25
release = 1.0
wave_mix = 0.35
decay_ramp = 0.8
"#;

const BRIGHT_LEAD_PATCH: &str = r#"
name = "Bright Lead"
description = "Square lead with fast linear ramps for expressive bends"

[engine]
polyphony = 4
steal_policy = "oldest"
primary_shape = "square"
secondary_shape = "sawtooth"
smoothing_time = 0.02
ramp_curve = "linear"
pressure_depth = 0.6
timbre_depth = 1.0

[globals]
cutoff = 14000.0
attack = 0.01
decay = 0.2
sustain = 0.9
release = 0.15
wave_mix = 0.2
"#;

const MONO_BASS_PATCH: &str = r#"
name = "Mono Bass"
description = "Single stealing voice, sawtooth with a short release"

[engine]
polyphony = 1
steal_policy = "oldest"
table_length = 4096
pressure_depth = 0.4
timbre_depth = 0.3

[globals]
cutoff = 1200.0
attack = 0.003
decay = 0.25
sustain = 0.7
release = 0.08
decay_ramp = 0.5
"#;

/// Every factory patch, parsed.
///
/// # Example
///
/// ```rust
/// use timbral_config::factory_patches;
///
/// for patch in factory_patches() {
///     println!("  - {}: {}", patch.name, patch.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_patches() -> Vec<Patch> {
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(_, toml)| Patch::from_toml(toml).ok())
        .collect()
}

/// Get a factory patch by internal or display name, case-insensitively.
///
/// ```rust
/// use timbral_config::get_factory_patch;
///
/// assert_eq!(get_factory_patch("soft_pad").unwrap().name, "Soft Pad");
/// assert_eq!(get_factory_patch("Soft Pad").unwrap().name, "Soft Pad");
/// assert!(get_factory_patch("nonexistent").is_none());
/// ```
pub fn get_factory_patch(name: &str) -> Option<Patch> {
    if let Some((_, toml)) = FACTORY_PATCHES_TOML
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(name))
    {
        return Patch::from_toml(toml).ok();
    }

    factory_patches()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Internal names of every factory patch.
pub fn factory_patch_names() -> Vec<&'static str> {
    FACTORY_PATCHES_TOML.iter().map(|(name, _)| *name).collect()
}

/// Whether `name` names a factory patch (internal or display name).
pub fn is_factory_patch(name: &str) -> bool {
    get_factory_patch(name).is_some()
}
