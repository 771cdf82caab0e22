//! One-pole lowpass filter for per-voice tone shaping.
//!
//! A single-pole IIR lowpass with the difference equation:
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//!      = (1 - coeff) * x[n] + coeff * y[n-1]
//! ```
//!
//! where `coeff = exp(-2π * freq / sample_rate)`.
//!
//! 6 dB/octave rolloff, zero latency, one multiply per sample. The
//! coefficient can be computed once per block with [`lowpass_coeff`] and
//! shared by every voice through [`OnePole::set_coeff`], so a cutoff sweep
//! costs one `expf` per block rather than one per voice per sample.
//!
//! # Usage
//!
//! ```rust
//! use timbral_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0); // attenuated above cutoff
//! ```
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio Applications",
//! Section: One-Pole Filter.

use crate::flush_denormal;
use libm::expf;

/// Compute the one-pole lowpass coefficient for a cutoff.
///
/// The cutoff is clamped to `[0, sample_rate / 2]`. Higher freq gives a lower
/// coefficient and less filtering: at 0 Hz the coefficient is 1 (output
/// frozen), at Nyquist it is `exp(-π)`.
#[inline]
pub fn lowpass_coeff(freq_hz: f32, sample_rate: f32) -> f32 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    let freq = freq_hz.clamp(0.0, sample_rate * 0.5);
    expf(-core::f32::consts::TAU * freq / sample_rate)
}

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in [0, 1] for stable operation
/// - `state` is flushed to zero when below 1e-20 (denormal protection)
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq_hz` - Cutoff frequency in Hz (20.0 to sample_rate/2)
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            state: 0.0,
            coeff: lowpass_coeff(freq_hz, sample_rate),
            sample_rate,
            freq: freq_hz,
        }
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.coeff = lowpass_coeff(freq_hz, self.sample_rate);
    }

    /// Install a coefficient computed elsewhere with [`lowpass_coeff`].
    ///
    /// `freq_hz` is recorded so that [`frequency`](Self::frequency) stays accurate.
    #[inline]
    pub fn set_coeff(&mut self, coeff: f32, freq_hz: f32) {
        self.coeff = coeff.clamp(0.0, 1.0);
        self.freq = freq_hz;
    }

    /// Process one sample through the lowpass filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.coeff = lowpass_coeff(self.freq, sample_rate);
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Current feedback coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!(
            (out - 1.0).abs() < 1e-4,
            "DC should pass through, got {out}"
        );
    }

    #[test]
    fn attenuates_high_freq() {
        let mut lp = OnePole::new(48000.0, 100.0);
        // Alternating +1/-1 is a Nyquist-rate signal
        let mut sum = 0.0f32;
        for i in 0..4800 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            sum += lp.process(input).abs();
        }
        let avg = sum / 4800.0;
        assert!(
            avg < 0.05,
            "Nyquist signal should be heavily attenuated, avg = {avg}"
        );
    }

    #[test]
    fn reset_clears_state() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.process(1.0);
        lp.process(1.0);
        lp.reset();
        assert_eq!(lp.process(0.0), 0.0);
    }

    #[test]
    fn shared_coeff_matches_set_frequency() {
        let mut a = OnePole::new(48000.0, 200.0);
        let mut b = OnePole::new(48000.0, 200.0);
        a.set_frequency(5000.0);
        b.set_coeff(lowpass_coeff(5000.0, 48000.0), 5000.0);
        for i in 0..64 {
            let x = if i % 3 == 0 { 1.0 } else { -0.5 };
            assert_eq!(a.process(x), b.process(x));
        }
        assert_eq!(b.frequency(), 5000.0);
    }

    #[test]
    fn coeff_clamps_cutoff_to_nyquist() {
        let at_nyquist = lowpass_coeff(24000.0, 48000.0);
        assert_eq!(lowpass_coeff(96000.0, 48000.0), at_nyquist);
        assert_eq!(lowpass_coeff(-10.0, 48000.0), 1.0);
    }
}
