//! Patch and score validation.
//!
//! Global values are checked against the [`ParamDescriptor`] ranges published
//! by `timbral-core`; engine settings against what the engine accepts at
//! prepare time. Every problem in a patch is collected before reporting.
//!
//! # Example
//!
//! ```rust
//! use timbral_config::{Patch, validate_patch};
//!
//! let mut patch = Patch::new("Too Long");
//! patch.globals.release = 60.0;
//! assert!(validate_patch(&patch).is_err());
//! ```

use thiserror::Error;
use timbral_core::{GlobalParam, ParamDescriptor};

use crate::patch::{EngineSettings, GlobalSettings, Patch};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown global parameter name.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Engine setting the engine would reject.
    #[error("invalid engine setting '{setting}': {reason}")]
    InvalidSetting {
        /// Setting key.
        setting: String,
        /// Description of the problem.
        reason: String,
    },

    /// Score event missing a field its type needs.
    #[error("event {index} ({kind}) is missing '{field}'")]
    MissingField {
        /// Position in the score's event list.
        index: usize,
        /// Event type name.
        kind: String,
        /// Missing field.
        field: &'static str,
    },

    /// Score timing problem.
    #[error("invalid score: {0}")]
    InvalidScore(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collect(errors: Vec<ValidationError>) -> ValidationResult<()> {
    let mut errors = errors;
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_range(desc: &ParamDescriptor, value: f32) -> ValidationResult<()> {
    if value.is_finite() && desc.contains(value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            param: desc.string_id.to_string(),
            value,
            min: desc.min,
            max: desc.max,
        })
    }
}

/// Validate one global parameter by name.
pub fn validate_global(name: &str, value: f32) -> ValidationResult<()> {
    let param = GlobalParam::from_name(name)
        .ok_or_else(|| ValidationError::UnknownParameter(name.to_string()))?;
    check_range(param.descriptor(), value)
}

/// Validate every global value of a patch.
pub fn validate_globals(globals: &GlobalSettings) -> ValidationResult<()> {
    let errors = GlobalParam::ALL
        .iter()
        .filter_map(|&p| check_range(p.descriptor(), globals.get(p)).err())
        .collect();
    collect(errors)
}

fn setting(name: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidSetting {
        setting: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate engine settings.
pub fn validate_engine(engine: &EngineSettings) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if engine.polyphony == 0 {
        errors.push(setting("polyphony", "must be at least 1"));
    }
    if engine.max_block_size == 0 {
        errors.push(setting("max_block_size", "must be at least 1"));
    }
    if engine.event_queue_capacity == 0 {
        errors.push(setting("event_queue_capacity", "must be at least 1"));
    }
    if engine.table_length < 4 || !engine.table_length.is_power_of_two() {
        errors.push(setting(
            "table_length",
            format!("{} is not a power of two >= 4", engine.table_length),
        ));
    }
    if !(engine.smoothing_time.is_finite() && engine.smoothing_time >= 0.0) {
        errors.push(setting("smoothing_time", "must be a non-negative number"));
    }
    for (name, depth) in [
        ("pressure_depth", engine.pressure_depth),
        ("timbre_depth", engine.timbre_depth),
    ] {
        if !(0.0..=1.0).contains(&depth) {
            errors.push(setting(name, format!("{depth} outside [0, 1]")));
        }
    }
    errors.extend(engine.steal_policy().err());
    errors.extend(engine.primary_shape().err());
    errors.extend(engine.secondary_shape().err());
    errors.extend(engine.ramp_curve().err());

    collect(errors)
}

/// Validate a whole patch, reporting every problem.
pub fn validate_patch(patch: &Patch) -> ValidationResult<()> {
    let mut errors = Vec::new();
    for result in [validate_engine(&patch.engine), validate_globals(&patch.globals)] {
        match result {
            Ok(()) => {}
            Err(ValidationError::Multiple(inner)) => errors.extend(inner),
            Err(e) => errors.push(e),
        }
    }
    collect(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_is_valid() {
        assert_eq!(validate_patch(&Patch::new("x")), Ok(()));
    }

    #[test]
    fn test_global_by_name() {
        assert!(validate_global("cutoff", 1000.0).is_ok());
        assert!(validate_global("Wave-Mix", 0.5).is_ok());
        assert_eq!(
            validate_global("resonance", 0.5),
            Err(ValidationError::UnknownParameter("resonance".to_string()))
        );
        assert!(matches!(
            validate_global("sustain", 1.5),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_global("attack", f32::NAN).is_err());
    }

    #[test]
    fn test_engine_settings() {
        let mut engine = EngineSettings::default();
        engine.table_length = 1000;
        assert!(matches!(
            validate_engine(&engine),
            Err(ValidationError::InvalidSetting { ref setting, .. }) if setting == "table_length"
        ));

        engine.table_length = 2048;
        engine.polyphony = 0;
        engine.timbre_depth = 2.0;
        engine.primary_shape = "triangle".to_string();
        match validate_engine(&engine) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected three errors, got {other:?}"),
        }
    }

    #[test]
    fn test_patch_collects_engine_and_global_errors() {
        let mut patch = Patch::new("bad");
        patch.engine.polyphony = 0;
        patch.globals.cutoff = 5.0;
        patch.globals.decay = -1.0;
        match validate_patch(&patch) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected three errors, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_display_joins() {
        let err = ValidationError::Multiple(vec![
            ValidationError::UnknownParameter("a".into()),
            ValidationError::UnknownParameter("b".into()),
        ]);
        assert_eq!(
            err.to_string(),
            "multiple validation errors: unknown parameter 'a'; unknown parameter 'b'"
        );
    }
}
