//! Phase-accumulator wavetable oscillator.
//!
//! Phase is kept in table-index units, `[0, N)`, so advancing is a single
//! add and reading is one linear interpolation between neighbouring samples.

use timbral_core::lerp;

use crate::wavetable::Wavetable;

/// Reads a [`Wavetable`] at a pitch-dependent rate.
///
/// The oscillator never owns a table; the caller lends one per sample so
/// the same oscillator can crossfade between tables of equal length.
///
/// # Example
///
/// ```rust
/// use timbral_synth::{Oscillator, WaveShape, Wavetable};
///
/// let table = Wavetable::build(WaveShape::Sine, 2048).unwrap();
/// let mut osc = Oscillator::new();
/// osc.set_frequency(440.0, 48000.0, table.len());
///
/// let sample = osc.next_sample(&table);
/// assert_eq!(sample, table.samples()[0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Oscillator {
    /// Current read position in `[0, N)`
    phase: f32,
    /// Table samples advanced per output sample
    phase_increment: f32,
}

impl Oscillator {
    /// Create an oscillator at phase 0 with zero increment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pitch: `increment = freq * N / sample_rate`.
    ///
    /// Frequencies at or above `sample_rate` produce an increment of at least
    /// `N`, which the single-step wrap in [`next_sample`](Self::next_sample)
    /// does not support. [`Voice`](crate::Voice) clamps its pitch to Nyquist
    /// before calling this.
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32, sample_rate: f32, table_length: usize) {
        self.phase_increment = freq_hz * table_length as f32 / sample_rate;
    }

    /// Produce one sample from `table` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, table: &Wavetable) -> f32 {
        let samples = table.samples();
        let len = table.len() as f32;

        let index0 = self.phase as usize;
        let frac = self.phase - index0 as f32;
        let out = lerp(samples[index0], samples[index0 + 1], frac);

        self.phase += self.phase_increment;
        if self.phase >= len {
            self.phase -= len;
        }
        out
    }

    /// Move the read position to 0.
    #[inline]
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Move the read position. `phase` must lie in `[0, N)`.
    #[inline]
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase;
    }

    /// Current read position.
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Table samples advanced per output sample.
    #[inline]
    pub fn phase_increment(&self) -> f32 {
        self.phase_increment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavetable::WaveShape;

    fn saw(len: usize) -> Wavetable {
        Wavetable::build(WaveShape::Sawtooth, len).unwrap()
    }

    #[test]
    fn test_zero_increment_returns_table_value() {
        let table = saw(64);
        let mut osc = Oscillator::new();
        osc.set_phase(17.0);
        for _ in 0..8 {
            assert_eq!(osc.next_sample(&table), table.samples()[17]);
        }
        assert_eq!(osc.phase(), 17.0);
    }

    #[test]
    fn test_fractional_phase_interpolates() {
        let table = saw(64);
        let s = table.samples();
        let mut osc = Oscillator::new();
        osc.set_phase(10.25);
        let expected = s[10] + 0.25 * (s[11] - s[10]);
        assert!((osc.next_sample(&table) - expected).abs() < 1e-7);
    }

    #[test]
    fn test_interpolates_through_guard_sample() {
        let table = saw(64);
        let s = table.samples();
        let mut osc = Oscillator::new();
        osc.set_phase(63.5);
        let expected = s[63] + 0.5 * (s[0] - s[63]);
        assert!((osc.next_sample(&table) - expected).abs() < 1e-7);
    }

    #[test]
    fn test_wraps_past_table_end() {
        let table = saw(64);
        let mut osc = Oscillator::new();
        // 0.75 table samples per output sample
        osc.set_frequency(562.5, 48000.0, 64);
        assert!((osc.phase_increment() - 0.75).abs() < 1e-6);

        osc.set_phase(63.5);
        osc.next_sample(&table);
        assert!(
            (osc.phase() - 0.25).abs() < 1e-5,
            "phase should wrap to 0.25, got {}",
            osc.phase()
        );
        for _ in 0..10_000 {
            let v = osc.next_sample(&table);
            assert!(v.abs() <= 0.6 + 1e-6);
            assert!(osc.phase() >= 0.0 && osc.phase() < 64.0);
        }
    }

    #[test]
    fn test_increment_from_frequency() {
        let mut osc = Oscillator::new();
        osc.set_frequency(440.0, 48000.0, 2048);
        assert!((osc.phase_increment() - 440.0 * 2048.0 / 48000.0).abs() < 1e-4);
    }

    #[test]
    fn test_reset_zeroes_phase() {
        let table = saw(64);
        let mut osc = Oscillator::new();
        osc.set_frequency(1000.0, 48000.0, 64);
        for _ in 0..37 {
            osc.next_sample(&table);
        }
        osc.reset();
        assert_eq!(osc.phase(), 0.0);
    }
}
