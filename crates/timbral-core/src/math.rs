//! Pitch and sample-domain math shared by the synthesis crates.
//!
//! All functions are allocation-free and `no_std`.
//!
//! # Pitch
//!
//! - [`midi_to_freq`] - Equal-tempered note number conversion
//!
//! # Utilities
//!
//! - [`lerp`] - Linear interpolation
//! - [`flush_denormal`] - Subnormal protection for recursive state

use libm::exp2f;

/// Reference pitch of MIDI note 69 (A4) in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Convert a (possibly fractional) MIDI note number to frequency in Hz.
///
/// Fractional notes are how per-note pitch bend reaches the engine: a note
/// 69 bent up by 0.5 semitones is `midi_to_freq(69.5)`.
///
/// # Example
/// ```rust
/// use timbral_core::midi_to_freq;
///
/// assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-3);
/// assert!((midi_to_freq(81.0) - 880.0).abs() < 1e-2);
/// ```
#[inline]
pub fn midi_to_freq(note: f32) -> f32 {
    A4_FREQUENCY * exp2f((note - 69.0) / 12.0)
}

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor (0.0 to 1.0)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Subnormal floats cause severe CPU slowdowns on most architectures. Values
/// below 1e-20 are replaced with zero, well before the IEEE 754 subnormal
/// range begins.
///
/// Use this on recursive state (filters, envelope tails) that can decay
/// indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq_reference_notes() {
        assert!((midi_to_freq(69.0) - 440.0).abs() < 1e-3);
        assert!((midi_to_freq(57.0) - 220.0).abs() < 1e-3);
        assert!((midi_to_freq(60.0) - 261.6256).abs() < 0.01, "middle C");
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(-1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
