//! Percussive sub-band energy flux
//!
//! Tracks energy increases in the kick region (40-150 Hz) and the snare/hat
//! region (2-8 kHz) of consecutive magnitude spectra. The kick region is
//! weighted 1.5, the upper region 1.0.

use crate::dsp::fft::frequency_bin;

/// Kick region in Hz
pub const KICK_BAND: (f32, f32) = (40.0, 150.0);

/// Snare and hi-hat region in Hz
pub const HIGH_BAND: (f32, f32) = (2000.0, 8000.0);

const KICK_WEIGHT: f32 = 1.5;
const HIGH_WEIGHT: f32 = 1.0;

/// Bin ranges of the two percussive regions for one FFT size
#[derive(Debug, Clone, Copy)]
pub struct PercussiveBands {
    kick: (usize, usize),
    high: (usize, usize),
}

/// Energy of the two regions in one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergies {
    /// Σ|X|² over the kick region
    pub kick: f32,
    /// Σ|X|² over the upper region
    pub high: f32,
}

impl PercussiveBands {
    /// Resolve the regions to bins of an `fft_size`-point transform
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        let range = |(lo, hi): (f32, f32)| {
            (
                frequency_bin(lo, fft_size, sample_rate),
                frequency_bin(hi, fft_size, sample_rate),
            )
        };
        Self {
            kick: range(KICK_BAND),
            high: range(HIGH_BAND),
        }
    }

    fn energy(magnitudes: &[f32], (lo, hi): (usize, usize)) -> f32 {
        if lo > hi || lo >= magnitudes.len() {
            return 0.0;
        }
        let hi = hi.min(magnitudes.len() - 1);
        magnitudes[lo..=hi].iter().map(|m| m * m).sum()
    }

    /// Energies of both regions in one magnitude spectrum
    pub fn energies(&self, magnitudes: &[f32]) -> BandEnergies {
        BandEnergies {
            kick: Self::energy(magnitudes, self.kick),
            high: Self::energy(magnitudes, self.high),
        }
    }
}

/// Weighted, half-wave-rectified energy increase between two frames
#[inline]
pub fn percussive_flux(previous: BandEnergies, current: BandEnergies) -> f32 {
    KICK_WEIGHT * (current.kick - previous.kick).max(0.0)
        + HIGH_WEIGHT * (current.high - previous.high).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kick_weighted_higher() {
        let prev = BandEnergies::default();
        let kick = BandEnergies { kick: 1.0, high: 0.0 };
        let hat = BandEnergies { kick: 0.0, high: 1.0 };
        assert!(percussive_flux(prev, kick) > percussive_flux(prev, hat));
        assert_eq!(percussive_flux(kick, prev), 0.0);
    }

    #[test]
    fn test_band_bins() {
        let bands = PercussiveBands::new(1024, 44100);
        let mut mags = vec![0.0f32; 513];
        // 86 Hz lands in bin 2
        mags[2] = 1.0;
        let e = bands.energies(&mags);
        assert!((e.kick - 1.0).abs() < 1e-6);
        assert_eq!(e.high, 0.0);
    }
}
