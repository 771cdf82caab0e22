//! Patch, score and path management for timbral.
//!
//! # Features
//!
//! - **Patches**: engine settings plus starting global values, as TOML
//! - **Scores**: timed note events for offline rendering
//! - **Validation**: global ranges and engine settings, all errors at once
//! - **Paths**: platform-specific patch and config directories
//! - **Factory Patches**: built-in starting points
//!
//! # Example
//!
//! ```rust,no_run
//! use timbral_config::{Patch, user_patches_dir};
//! use timbral_synth::SynthEngine;
//!
//! let patch = Patch::load("my_patch.toml").unwrap();
//! let (engine, handle) = SynthEngine::new(patch.engine_config(48000.0).unwrap()).unwrap();
//! patch.apply(handle.globals());
//!
//! let path = user_patches_dir().join("copy.toml");
//! patch.save(&path).unwrap();
//! # drop(engine);
//! ```

mod error;
mod patch;
mod score;

/// Platform-specific paths for patches and configuration.
#[cfg(feature = "std")]
pub mod paths;

/// Patch and score validation.
pub mod validation;

/// Factory patches bundled with the library.
pub mod factory_patches;

pub use error::ConfigError;
pub use factory_patches::{
    FACTORY_PATCH_NAMES, factory_patch_names, factory_patches, get_factory_patch,
    is_factory_patch,
};
pub use patch::{EngineSettings, GlobalSettings, Patch};
#[cfg(feature = "std")]
pub use paths::{
    PatchSource, ensure_user_config_dir, ensure_user_patches_dir, find_patch, list_all_patches,
    list_patches_in_dir, list_system_patches, list_user_patches, patch_name_from_path, resolve_patch,
    system_patches_dir, user_config_dir, user_patches_dir,
};
pub use score::{
    DEFAULT_NOTE_PRESSURE, DEFAULT_NOTE_TIMBRE, DEFAULT_TAIL, Score, ScoreEvent, ScoreEventKind,
};
pub use validation::{
    ValidationError, ValidationResult, validate_engine, validate_global, validate_globals,
    validate_patch,
};
