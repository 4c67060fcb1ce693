//! Spectral summary and timbre descriptors
//!
//! One STFT pass produces the band summaries, the mean spectral centroid and
//! the frequency-domain timbre descriptors. Time-domain level statistics
//! (RMS, crest factor, zero-crossing rate) are computed directly on samples.

use serde::{Deserialize, Serialize};

use crate::dsp::bands::{BandAccumulator, SpectralBand};
use crate::dsp::fft::bin_frequency;
use crate::dsp::window::{frame_count, sampled_frame_indices, SpectralFrame};
use crate::error::AnalysisError;
use crate::features::onset::spectral_flux::spectral_flux;

/// Number of windows in the RMS profile
pub const RMS_PROFILE_WINDOWS: usize = 256;

/// Fraction of spectral energy below the rolloff frequency
pub const ROLLOFF_FRACTION: f32 = 0.85;

const POWER_EPSILON: f32 = 1e-12;

/// Essentia-style timbre descriptors, averaged over frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimbreFeatures {
    /// Frequency below which 85 % of the spectral energy lies, in Hz
    pub spectral_rolloff: f32,
    /// Geometric over arithmetic mean of the power spectrum, in [0, 1]
    pub spectral_flatness: f32,
    /// Sign changes per sample, in [0, 1]
    pub zero_crossing_rate: f32,
    /// Mean spectral flux between analysed frames
    pub spectral_flux: f32,
}

/// Output of the spectral pass
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSummary {
    /// Mean spectral centroid over non-silent frames, in Hz
    pub centroid: f32,
    /// The seven band summaries
    pub bands: Vec<SpectralBand>,
    /// Timbre descriptors
    pub timbre: TimbreFeatures,
}

/// Root mean square of a buffer; 0 when empty
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (energy / samples.len() as f64).sqrt() as f32
}

/// RMS over about [`RMS_PROFILE_WINDOWS`] consecutive windows
pub fn rms_profile(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let window = samples.len().div_ceil(RMS_PROFILE_WINDOWS).max(1);
    samples.chunks(window).map(rms).collect()
}

/// Peak-to-RMS ratio in dB; 0 for silence
pub fn crest_factor_db(samples: &[f32]) -> f32 {
    let level = rms(samples);
    let peak = samples.iter().fold(0.0f32, |m, &x| m.max(x.abs()));
    if level <= POWER_EPSILON || peak <= 0.0 {
        return 0.0;
    }
    20.0 * (peak / level).log10()
}

/// Fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

/// Magnitude-weighted mean frequency of one spectrum; `None` when silent
pub fn spectral_centroid(magnitudes: &[f32], fft_size: usize, sample_rate: u32) -> Option<f32> {
    let mut weighted = 0.0f32;
    let mut total = 0.0f32;
    for (k, &m) in magnitudes.iter().enumerate() {
        weighted += bin_frequency(k, fft_size, sample_rate) * m;
        total += m;
    }
    if total > POWER_EPSILON {
        Some(weighted / total)
    } else {
        None
    }
}

/// Frequency below which `fraction` of the spectral energy lies; `None` when silent
pub fn spectral_rolloff(
    magnitudes: &[f32],
    fft_size: usize,
    sample_rate: u32,
    fraction: f32,
) -> Option<f32> {
    let total: f32 = magnitudes.iter().map(|m| m * m).sum();
    if total <= POWER_EPSILON {
        return None;
    }
    let target = total * fraction.clamp(0.0, 1.0);
    let mut cumulative = 0.0f32;
    for (k, &m) in magnitudes.iter().enumerate() {
        cumulative += m * m;
        if cumulative >= target {
            return Some(bin_frequency(k, fft_size, sample_rate));
        }
    }
    Some(bin_frequency(magnitudes.len().saturating_sub(1), fft_size, sample_rate))
}

/// Spectral flatness (Wiener entropy) of one spectrum; `None` when silent
pub fn spectral_flatness(magnitudes: &[f32]) -> Option<f32> {
    if magnitudes.is_empty() {
        return None;
    }
    let n = magnitudes.len() as f64;
    let mut log_sum = 0.0f64;
    let mut sum = 0.0f64;
    for &m in magnitudes {
        let p = (m as f64) * (m as f64) + POWER_EPSILON as f64;
        log_sum += p.ln();
        sum += p;
    }
    let arithmetic = sum / n;
    if arithmetic <= 2.0 * POWER_EPSILON as f64 {
        return None;
    }
    let geometric = (log_sum / n).exp();
    Some(((geometric / arithmetic) as f32).clamp(0.0, 1.0))
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f32>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v as f64;
            self.count += 1;
        }
    }

    fn get(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64) as f32
        }
    }
}

/// Run the spectral pass over a mono channel
///
/// Frames of `frame_size` at `hop_size`, evenly subsampled to at most
/// `max_frames`. Input shorter than one frame is analysed as one zero-padded
/// frame.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` is not a power of two.
pub fn compute_spectral_summary(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    max_frames: usize,
) -> Result<SpectralSummary, AnalysisError> {
    let mut frame = SpectralFrame::new(frame_size)?;
    let mut bands = BandAccumulator::new(frame_size, sample_rate);

    let total = frame_count(samples.len(), frame_size, hop_size).max(1);
    let indices = sampled_frame_indices(total, max_frames.max(1));

    log::debug!(
        "Spectral summary: {} of {} frames (frame={}, hop={})",
        indices.len(),
        total,
        frame_size,
        hop_size
    );

    let mut centroid = Mean::default();
    let mut rolloff = Mean::default();
    let mut flatness = Mean::default();
    let mut flux = Mean::default();
    let mut previous: Option<Vec<f32>> = None;

    for idx in indices {
        let mags = frame.analyze(samples, idx * hop_size);
        bands.accumulate(mags);
        centroid.push(spectral_centroid(mags, frame_size, sample_rate));
        rolloff.push(spectral_rolloff(mags, frame_size, sample_rate, ROLLOFF_FRACTION));
        flatness.push(spectral_flatness(mags));
        match previous.as_mut() {
            Some(prev) => {
                flux.push(Some(spectral_flux(prev, mags)));
                prev.copy_from_slice(mags);
            }
            None => previous = Some(mags.to_vec()),
        }
    }

    Ok(SpectralSummary {
        centroid: centroid.get(),
        bands: bands.finish(),
        timbre: TimbreFeatures {
            spectral_rolloff: rolloff.get(),
            spectral_flatness: flatness.get(),
            zero_crossing_rate: zero_crossing_rate(samples),
            spectral_flux: flux.get(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sr: u32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_rms_and_crest() {
        let s = sine(100.0, 44100, 44100);
        assert!((rms(&s) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3);
        // Sine crest factor: 3.01 dB
        assert!((crest_factor_db(&s) - 3.01).abs() < 0.05);
        assert_eq!(crest_factor_db(&vec![0.0; 100]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_profile_length() {
        assert_eq!(rms_profile(&vec![0.5; 44100]).len(), 256);
        assert_eq!(rms_profile(&vec![0.5; 100]).len(), 100);
        assert!(rms_profile(&[]).is_empty());
    }

    #[test]
    fn test_zero_crossing_rate() {
        assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0]), 1.0);
        assert_eq!(zero_crossing_rate(&[1.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_centroid_tracks_tone() {
        let summary =
            compute_spectral_summary(&sine(1000.0, 44100, 44100), 44100, 2048, 512, 100).unwrap();
        assert!((summary.centroid - 1000.0).abs() < 60.0, "got {}", summary.centroid);
        assert!(summary.timbre.spectral_rolloff < 1200.0);
        assert!(summary.timbre.spectral_flatness < 0.1);
        assert_eq!(summary.bands.len(), 7);
    }

    #[test]
    fn test_noise_is_flatter_than_tone() {
        // Deterministic pseudo-noise
        let mut state = 12345u32;
        let noise: Vec<f32> = (0..44100)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect();
        let tone = sine(1000.0, 44100, 44100);
        let n = compute_spectral_summary(&noise, 44100, 2048, 512, 100).unwrap();
        let t = compute_spectral_summary(&tone, 44100, 2048, 512, 100).unwrap();
        assert!(n.timbre.spectral_flatness > t.timbre.spectral_flatness);
        assert!(n.timbre.zero_crossing_rate > t.timbre.zero_crossing_rate);
    }

    #[test]
    fn test_silence_summary() {
        let summary = compute_spectral_summary(&vec![0.0; 8192], 44100, 2048, 512, 100).unwrap();
        assert_eq!(summary.centroid, 0.0);
        assert_eq!(summary.timbre.spectral_flatness, 0.0);
    }
}
