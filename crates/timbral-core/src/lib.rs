//! Timbral Core - control-rate primitives for the timbral synthesis engine
//!
//! This crate holds the small building blocks that sit between the control
//! side (note gestures, parameter edits) and the audio path, designed for
//! real-time use with zero allocation after construction.
//!
//! # Core Abstractions
//!
//! ## Parameter Ramps
//!
//! - [`ParameterRamp`] - Per-sample smoothing toward a target, exponential or linear
//! - [`RampCurve`] - Approach shape selector
//!
//! ## Shared Globals
//!
//! - [`GlobalParams`] - Atomically published engine-wide parameters
//! - [`GlobalSnapshot`] - Plain per-block copy handed to every voice
//! - [`ParamDescriptor`] - Name, unit, range and default of a parameter
//!
//! ## Filters
//!
//! - [`OnePole`] - 6 dB/oct lowpass with block-rate coefficient sharing
//!
//! ## Utilities
//!
//! - Pitch: [`midi_to_freq`]
//! - [`flush_denormal`], [`lerp`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! timbral-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use timbral_core::{GlobalParam, GlobalParams, ParameterRamp, RampCurve};
//!
//! let globals = Arc::new(GlobalParams::new());
//! globals.set(GlobalParam::Cutoff, 2000.0);
//!
//! // Audio side: read once per block, smooth toward the new value
//! let snap = globals.snapshot();
//! let mut cutoff = ParameterRamp::with_config(8000.0, RampCurve::Exponential, 48000.0, 0.1);
//! cutoff.set_target_value(snap.cutoff);
//! let value = cutoff.skip(512);
//! assert!(value < 8000.0 && value > 2000.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod math;
pub mod one_pole;
pub mod param;
pub mod param_info;
pub mod shared;

pub use math::{A4_FREQUENCY, flush_denormal, lerp, midi_to_freq};
pub use one_pole::{OnePole, lowpass_coeff};
pub use param::{ParameterRamp, RampCurve};
pub use param_info::{ParamDescriptor, ParamScale, ParamUnit};
pub use shared::{
    AtomicF32, GLOBAL_PARAM_COUNT, GlobalParam, GlobalParams, GlobalSnapshot, UnknownParam,
};
