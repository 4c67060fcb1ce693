//! Sidechain pumping detection
//!
//! A sidechained track ducks its sub-bass on every kick: the low-passed
//! envelope shows one deep, regular trough per beat. Depth is measured per
//! peak pair, regularity as one minus the coefficient of variation of the
//! peak-to-peak intervals.

use serde::{Deserialize, Serialize};

use super::{band_envelope, envelope_peaks, mean_and_cv};
use crate::dsp::filter::Biquad;

/// Sub-bass cutoff in Hz
const CUTOFF_HZ: f32 = 100.0;

/// Envelope RMS window; spans a few sub-bass periods
const ENVELOPE_WINDOW_MS: f32 = 50.0;

/// Peaks below this fraction of the loudest are ignored
const PEAK_THRESHOLD: f32 = 0.3;

/// Strength above which pumping is reported
pub const SIDECHAIN_THRESHOLD: f32 = 0.15;

/// Sidechain analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidechainResult {
    /// `strength > 0.15`
    pub has_sidechain: bool,
    /// depth × consistency, 0 when consistency ≤ 0.5
    pub strength: f32,
    /// Mean `1 − trough/peak`
    pub depth: f32,
    /// `1 − std/mean` of the peak-to-peak intervals, in [0, 1]
    pub consistency: f32,
    /// Number of pump cycles measured
    pub pump_count: usize,
}

/// Detect sidechain pumping in the sub-bass
pub fn detect_sidechain(samples: &[f32], sample_rate: u32, bpm: f32) -> SidechainResult {
    if samples.is_empty() || sample_rate == 0 || !(bpm > 0.0) {
        return SidechainResult::default();
    }
    log::debug!("Sidechain detection: {} samples at {:.1} BPM", samples.len(), bpm);

    let mut sections = [
        Biquad::lowpass(sample_rate, CUTOFF_HZ, 0.707),
        Biquad::lowpass(sample_rate, CUTOFF_HZ, 0.707),
    ];
    let (envelope, rate) = band_envelope(samples, sample_rate, &mut sections, ENVELOPE_WINDOW_MS);
    let beat = rate * 60.0 / bpm;
    let peaks = envelope_peaks(&envelope, (beat / 4.0) as usize, PEAK_THRESHOLD);
    if peaks.len() < 3 {
        return SidechainResult::default();
    }

    let depths: Vec<f32> = peaks
        .windows(2)
        .filter_map(|pair| {
            let peak = envelope[pair[0]].min(envelope[pair[1]]);
            let trough = envelope[pair[0]..=pair[1]]
                .iter()
                .copied()
                .fold(f32::INFINITY, f32::min);
            (peak > 0.0).then(|| (1.0 - trough / peak).clamp(0.0, 1.0))
        })
        .collect();

    if depths.is_empty() {
        return SidechainResult::default();
    }
    let depth = depths.iter().sum::<f32>() / depths.len() as f32;

    let intervals: Vec<f32> = peaks.windows(2).map(|p| (p[1] - p[0]) as f32).collect();
    let Some((_, cv)) = mean_and_cv(&intervals) else {
        return SidechainResult {
            pump_count: depths.len(),
            ..SidechainResult::default()
        };
    };
    let consistency = (1.0 - cv).clamp(0.0, 1.0);
    let strength = if consistency > 0.5 {
        (depth * consistency).clamp(0.0, 1.0)
    } else {
        0.0
    };

    SidechainResult {
        has_sidechain: strength > SIDECHAIN_THRESHOLD,
        strength,
        depth,
        consistency,
        pump_count: depths.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// 50 Hz bass ducked to `floor` at every beat, recovering linearly
    fn pumped_bass(sr: u32, bpm: f32, secs: f32, floor: f32) -> Vec<f32> {
        let beat = 60.0 / bpm;
        (0..(sr as f32 * secs) as usize)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let phase = (t % beat) / beat;
                let gain = floor + (1.0 - floor) * phase;
                gain * 0.8 * (2.0 * PI * 50.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_pumping_detected() {
        let result = detect_sidechain(&pumped_bass(22050, 128.0, 8.0, 0.05), 22050, 128.0);
        assert!(result.has_sidechain, "{:?}", result);
        assert!(result.depth > 0.5);
        assert!(result.consistency > 0.5);
        assert!(result.pump_count >= 10);
    }

    #[test]
    fn test_steady_bass_not_pumped() {
        let result = detect_sidechain(&pumped_bass(22050, 128.0, 8.0, 1.0), 22050, 128.0);
        assert!(!result.has_sidechain);
        assert!(result.strength < SIDECHAIN_THRESHOLD);
    }

    /// 50 Hz bass ducked to `floor` at each of `ducks` (seconds), recovering
    /// linearly until the next one; the first duck must be after t=0
    fn ducked_at(sr: u32, ducks: &[f32], secs: f32, floor: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let prev = ducks.iter().rposition(|&d| d <= t);
                let gain = match prev {
                    Some(k) => {
                        let next = ducks.get(k + 1).copied().unwrap_or(secs);
                        let phase = (t - ducks[k]) / (next - ducks[k]);
                        floor + (1.0 - floor) * phase
                    }
                    None => floor + (1.0 - floor) * t / ducks[0],
                };
                gain * 0.8 * (2.0 * PI * 50.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_irregular_ducking_not_pumped() {
        // Equal-depth ducks at alternating 0.25 s / 0.9 s gaps: interval CV ≈ 0.57
        let mut ducks = Vec::new();
        let mut t = 0.5;
        let mut short = true;
        while t < 11.5 {
            ducks.push(t);
            t += if short { 0.25 } else { 0.9 };
            short = !short;
        }
        let result = detect_sidechain(&ducked_at(22050, &ducks, 12.0, 0.05), 22050, 120.0);
        assert!(result.pump_count >= 10, "{:?}", result);
        assert!(result.depth > 0.5, "{:?}", result);
        assert!(result.consistency <= 0.5, "{:?}", result);
        assert_eq!(result.strength, 0.0);
        assert!(!result.has_sidechain);
    }

    #[test]
    fn test_regular_ducking_consistent() {
        let ducks: Vec<f32> = (1..24).map(|i| i as f32 * 0.5).collect();
        let result = detect_sidechain(&ducked_at(22050, &ducks, 12.0, 0.05), 22050, 120.0);
        assert!(result.consistency > 0.9, "{:?}", result);
        assert!(result.has_sidechain);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(detect_sidechain(&[], 44100, 120.0), SidechainResult::default());
        assert_eq!(detect_sidechain(&[0.0; 44100], 44100, 120.0), SidechainResult::default());
        assert_eq!(detect_sidechain(&[0.1; 100], 44100, 0.0), SidechainResult::default());
    }
}
