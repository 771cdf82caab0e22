//! Single-cycle wavetables and the bank that owns them.
//!
//! A [`Wavetable`] stores one period of a waveform as `N + 1` samples, where
//! `N` is a power of two and the extra guard sample repeats `sample[0]`. The
//! guard lets the interpolating reader fetch `sample[i + 1]` for any
//! `i < N` without a wrap check.
//!
//! Tables are naive (not band-limited): the sawtooth and square alias at
//! high pitches. They are built once when the engine is prepared and are
//! read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use timbral_synth::{WaveShape, Wavetable};
//!
//! let saw = Wavetable::build(WaveShape::Sawtooth, 2048).unwrap();
//! assert_eq!(saw.len(), 2048);
//! assert_eq!(saw.samples()[2048], saw.samples()[0]);
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::fmt;
use core::f32::consts::TAU;

use libm::sinf;

/// Peak level of the naive sawtooth and square tables.
pub const NAIVE_AMPLITUDE: f32 = 0.6;

/// Table length used when none is configured (2^11).
pub const DEFAULT_TABLE_LENGTH: usize = 1 << 11;

/// Waveforms the bank can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WaveShape {
    /// Rising ramp from `-A` to `+A`.
    #[default]
    Sawtooth,
    /// `+A` for the first half period, `-A` for the second.
    Square,
    /// Unit-amplitude sine.
    Sine,
}

impl WaveShape {
    /// Every shape, in bank order.
    pub const ALL: [WaveShape; 3] = [WaveShape::Sawtooth, WaveShape::Square, WaveShape::Sine];

    /// Lowercase name, as used in patch files.
    pub const fn name(self) -> &'static str {
        match self {
            WaveShape::Sawtooth => "sawtooth",
            WaveShape::Square => "square",
            WaveShape::Sine => "sine",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// Value of one cycle at normalized position `t` in `[0, 1)`.
    fn evaluate(self, t: f32) -> f32 {
        match self {
            WaveShape::Sawtooth => -NAIVE_AMPLITUDE + 2.0 * NAIVE_AMPLITUDE * t,
            WaveShape::Square => {
                if t < 0.5 {
                    NAIVE_AMPLITUDE
                } else {
                    -NAIVE_AMPLITUDE
                }
            }
            WaveShape::Sine => sinf(TAU * t),
        }
    }
}

/// Table construction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavetableError {
    /// Length was not a power of two of at least 2.
    InvalidLength(usize),
}

impl fmt::Display for WavetableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WavetableError::InvalidLength(len) => {
                write!(f, "wavetable length {len} is not a power of two >= 2")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WavetableError {}

/// One period of a waveform plus a wraparound guard sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    samples: Vec<f32>,
}

impl Wavetable {
    /// Render `length` samples of `shape` into a new table.
    ///
    /// # Errors
    ///
    /// [`WavetableError::InvalidLength`] if `length` is not a power of two or is below 2.
    pub fn build(shape: WaveShape, length: usize) -> Result<Self, WavetableError> {
        if length < 2 || !length.is_power_of_two() {
            return Err(WavetableError::InvalidLength(length));
        }
        let mut samples = Vec::with_capacity(length + 1);
        let inv_len = 1.0 / length as f32;
        samples.extend((0..length).map(|i| shape.evaluate(i as f32 * inv_len)));
        samples.push(samples[0]);
        Ok(Self { samples })
    }

    /// Period length `N` (excludes the guard sample).
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len() - 1
    }

    /// Always false; tables hold at least two samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All `N + 1` samples, guard included.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Every [`WaveShape`] rendered at one shared length.
#[derive(Debug, Clone)]
pub struct WavetableBank {
    tables: [Wavetable; 3],
    length: usize,
}

impl WavetableBank {
    /// Build all shapes at `length` samples.
    ///
    /// Allocates; call from setup code only.
    pub fn new(length: usize) -> Result<Self, WavetableError> {
        Ok(Self {
            tables: [
                Wavetable::build(WaveShape::Sawtooth, length)?,
                Wavetable::build(WaveShape::Square, length)?,
                Wavetable::build(WaveShape::Sine, length)?,
            ],
            length,
        })
    }

    /// Table for one shape.
    #[inline]
    pub fn table(&self, shape: WaveShape) -> &Wavetable {
        &self.tables[shape.index()]
    }

    /// Shared period length `N`.
    #[inline]
    pub fn table_length(&self) -> usize {
        self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_lengths() {
        for len in [0, 1, 3, 1000, 2047] {
            assert_eq!(
                Wavetable::build(WaveShape::Sine, len),
                Err(WavetableError::InvalidLength(len)),
                "length {len} should be rejected"
            );
        }
        assert!(Wavetable::build(WaveShape::Sine, 2).is_ok());
    }

    #[test]
    fn test_guard_sample_repeats_first() {
        for shape in WaveShape::ALL {
            let table = Wavetable::build(shape, 64).unwrap();
            assert_eq!(table.samples().len(), 65);
            assert_eq!(table.samples()[64], table.samples()[0], "{shape:?}");
        }
    }

    #[test]
    fn test_sawtooth_ramps_from_minus_to_plus_amplitude() {
        let saw = Wavetable::build(WaveShape::Sawtooth, 2048).unwrap();
        let s = saw.samples();
        assert_eq!(s[0], -NAIVE_AMPLITUDE);
        assert!((s[1024]).abs() < 1e-6, "midpoint should cross zero");
        assert!(s[2047] > 0.59 && s[2047] < NAIVE_AMPLITUDE);
        assert!(s[..2048].windows(2).all(|w| w[1] > w[0]), "strictly rising");
    }

    #[test]
    fn test_square_halves() {
        let sq = Wavetable::build(WaveShape::Square, 16).unwrap();
        let s = sq.samples();
        assert!(s[..8].iter().all(|&x| x == NAIVE_AMPLITUDE));
        assert!(s[8..16].iter().all(|&x| x == -NAIVE_AMPLITUDE));
    }

    #[test]
    fn test_sine_quarter_points() {
        let sine = Wavetable::build(WaveShape::Sine, 1024).unwrap();
        let s = sine.samples();
        assert!(s[0].abs() < 1e-6);
        assert!((s[256] - 1.0).abs() < 1e-6);
        assert!((s[768] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bank_lookup() {
        let bank = WavetableBank::new(DEFAULT_TABLE_LENGTH).unwrap();
        assert_eq!(bank.table_length(), 2048);
        for shape in WaveShape::ALL {
            assert_eq!(
                bank.table(shape),
                &Wavetable::build(shape, DEFAULT_TABLE_LENGTH).unwrap()
            );
        }
    }
}
