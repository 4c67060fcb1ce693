//! Acid / TB-303 detection
//!
//! The 303 sound is a resonant low-pass sweeping over a 16th-note bass line.
//! Three cues are scored inside 100–800 Hz: how much the band centroid moves
//! from frame to frame, how sharply the spectrum peaks around the resonance,
//! and how closely the band's onset rate matches 16th notes at the tempo.

use serde::{Deserialize, Serialize};

use crate::dsp::fft::frequency_bin;
use crate::dsp::window::SpectralFrame;
use crate::features::onset::min_max_normalize;
use crate::features::onset::spectral_flux::spectral_flux;
use crate::features::onset::threshold::pick_onsets;

const FRAME_SIZE: usize = 1024;
const HOP_SIZE: usize = 512;
const MAX_FRAMES: usize = 4000;
const BAND_LOW_HZ: f32 = 100.0;
const BAND_HIGH_HZ: f32 = 800.0;

/// Centroid standard deviation (Hz) that scores 1
const CENTROID_SPREAD_HZ: f32 = 100.0;

/// Peak-to-mean ratio that scores 1
const RESONANCE_FULL_SCALE: f32 = 5.0;

/// Confidence above which acid is reported
pub const ACID_THRESHOLD: f32 = 0.45;

/// Acid analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcidResult {
    /// `confidence > 0.45`
    pub is_acid: bool,
    /// `0.4·centroid + 0.4·resonance + 0.2·rhythm`
    pub confidence: f32,
    /// Filter-sweep score from centroid movement
    pub centroid_movement: f32,
    /// Resonance peakiness score
    pub resonance: f32,
    /// 16th-note rhythm match
    pub rhythm_match: f32,
}

/// Score acid-style filter sweeps in the 100–800 Hz band
pub fn detect_acid(samples: &[f32], sample_rate: u32, bpm: f32) -> AcidResult {
    if samples.len() < FRAME_SIZE || sample_rate == 0 || !(bpm > 0.0) {
        return AcidResult::default();
    }
    let Ok(mut frame) = SpectralFrame::new(FRAME_SIZE) else {
        return AcidResult::default();
    };

    let span = samples.len() - FRAME_SIZE;
    let hop = HOP_SIZE.max(span.div_ceil(MAX_FRAMES - 1));
    let n_frames = span / hop + 1;
    log::debug!("Acid detection: {} frames, hop {}", n_frames, hop);

    let lo = frequency_bin(BAND_LOW_HZ, FRAME_SIZE, sample_rate);
    let hi = frequency_bin(BAND_HIGH_HZ, FRAME_SIZE, sample_rate);
    if hi <= lo + 2 {
        return AcidResult::default();
    }
    let bin_hz = sample_rate as f32 / FRAME_SIZE as f32;

    let mut centroids = Vec::with_capacity(n_frames);
    let mut peakiness = Vec::with_capacity(n_frames);
    let mut flux = Vec::with_capacity(n_frames);
    let mut prev_band: Vec<f32> = Vec::new();

    for i in 0..n_frames {
        let mags = frame.analyze(samples, i * hop);
        let band = &mags[lo..=hi];
        let total: f32 = band.iter().sum();

        if !prev_band.is_empty() {
            flux.push(spectral_flux(&prev_band, band));
        }
        prev_band.clear();
        prev_band.extend_from_slice(band);

        if !(total > 1e-6) {
            continue;
        }
        let weighted: f32 = band
            .iter()
            .enumerate()
            .map(|(k, &m)| (lo + k) as f32 * bin_hz * m)
            .sum();
        centroids.push(weighted / total);

        let mean = total / band.len() as f32;
        let max = band.iter().copied().fold(0.0f32, f32::max);
        peakiness.push((max - mean) / mean);
    }

    if centroids.len() < 2 {
        return AcidResult::default();
    }

    let n = centroids.len() as f32;
    let mean_centroid = centroids.iter().sum::<f32>() / n;
    let centroid_std = (centroids
        .iter()
        .map(|c| (c - mean_centroid) * (c - mean_centroid))
        .sum::<f32>()
        / n)
        .sqrt();
    let centroid_movement = (centroid_std / CENTROID_SPREAD_HZ).clamp(0.0, 1.0);

    let resonance = (peakiness.iter().sum::<f32>() / peakiness.len() as f32 / RESONANCE_FULL_SCALE)
        .clamp(0.0, 1.0);

    let duration = samples.len() as f32 / sample_rate as f32;
    min_max_normalize(&mut flux);
    let onsets = pick_onsets(&flux, 1.5, 0.1, 1);
    let density = onsets.len() as f32 / duration;
    let expected = bpm / 60.0 * 4.0;
    let rhythm_match = (1.0 - (density - expected).abs() / expected).clamp(0.0, 1.0);

    let confidence =
        (0.4 * centroid_movement + 0.4 * resonance + 0.2 * rhythm_match).clamp(0.0, 1.0);

    AcidResult {
        is_acid: confidence > ACID_THRESHOLD,
        confidence,
        centroid_movement,
        resonance,
        rhythm_match,
    }
}
