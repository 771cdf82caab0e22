//! Parameter metadata for discoverable, range-checked control values.
//!
//! Each externally editable value is described by a [`ParamDescriptor`]
//! carrying its display name, stable string ID, unit, range and default.
//! The global parameter store uses descriptors to clamp incoming edits;
//! the config layer uses them to validate patch files; the CLI lists them.
//!
//! # Example
//!
//! ```rust
//! use timbral_core::{ParamDescriptor, ParamScale, ParamUnit};
//!
//! let cutoff = ParamDescriptor::new("Cutoff", "cutoff", ParamUnit::Hertz, 20.0, 20000.0, 8000.0)
//!     .with_scale(ParamScale::Logarithmic);
//! assert_eq!(cutoff.clamp(50000.0), 20000.0);
//! assert!((cutoff.denormalize(cutoff.normalize(1000.0)) - 1000.0).abs() < 0.5);
//! ```

use libm::{logf, powf};

/// Scaling curve for parameter normalization.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`, requires `min > 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// More resolution at low values. Use for frequencies.
    Logarithmic,
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Hertz (Hz), for frequencies such as filter cutoff.
    Hertz,
    /// Seconds (s), for envelope segment times.
    Seconds,
    /// No unit, for levels and mix ratios in `[0, 1]`.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timbral_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Hertz => " Hz",
            ParamUnit::Seconds => " s",
            ParamUnit::None => "",
        }
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Display name (e.g., "Attack").
    pub name: &'static str,
    /// Stable snake_case ID used by patch files and `set_global` lookups.
    pub string_id: &'static str,
    /// Unit for formatting.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Value at engine start.
    pub default: f32,
    /// Normalization curve.
    pub scale: ParamScale,
}

impl ParamDescriptor {
    /// Create a linear-scaled descriptor.
    pub const fn new(
        name: &'static str,
        string_id: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            string_id,
            unit,
            min,
            max,
            default,
            scale: ParamScale::Linear,
        }
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Clamps a value to this parameter's valid range. NaN maps to the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// True when `value` lies within `[min, max]`.
    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                logf(value / self.min) / logf(self.max / self.min)
            }
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the parameter range.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * powf(self.max / self.min, normalized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: ParamDescriptor = ParamDescriptor::new("Level", "level", ParamUnit::None, 0.0, 1.0, 0.5);

    #[test]
    fn test_clamp() {
        assert_eq!(LEVEL.clamp(-1.0), 0.0);
        assert_eq!(LEVEL.clamp(2.0), 1.0);
        assert_eq!(LEVEL.clamp(0.25), 0.25);
        assert_eq!(LEVEL.clamp(f32::NAN), 0.5, "NaN falls back to default");
    }

    #[test]
    fn test_linear_normalize() {
        assert_eq!(LEVEL.normalize(0.5), 0.5);
        assert_eq!(LEVEL.denormalize(1.0), 1.0);
    }

    #[test]
    fn test_log_normalize_endpoints() {
        let desc = ParamDescriptor::new("Cutoff", "cutoff", ParamUnit::Hertz, 20.0, 20000.0, 1000.0)
            .with_scale(ParamScale::Logarithmic);
        assert!(desc.normalize(20.0).abs() < 1e-6);
        assert!((desc.normalize(20000.0) - 1.0).abs() < 1e-5);
        // Geometric midpoint sits at 0.5
        assert!((desc.normalize(632.455_5) - 0.5).abs() < 1e-3);
    }
}
