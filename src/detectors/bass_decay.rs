//! Bass decay character
//!
//! Measures how long the sub-bass takes to fall 20 dB after each transient.
//! Short decays read as punchy kicks, long ones as rolling or sustained bass
//! lines (808s, reese, drones).

use serde::{Deserialize, Serialize};

use super::{band_envelope, envelope_peaks, mean_and_cv};
use crate::dsp::filter::Biquad;

const CUTOFF_HZ: f32 = 150.0;
const ENVELOPE_WINDOW_MS: f32 = 30.0;
const PEAK_THRESHOLD: f32 = 0.3;

/// Fraction of the peak level that ends a decay (−20 dB)
const DECAY_FLOOR: f32 = 0.1;

/// Decay class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecayClass {
    /// Under 150 ms
    #[default]
    Punchy,
    /// 150–300 ms
    Medium,
    /// 300–600 ms
    Rolling,
    /// 600 ms or more, or no decay before the next transient
    Sustained,
}

impl DecayClass {
    /// Class of a decay time in milliseconds
    pub fn from_ms(ms: f32) -> Self {
        if ms < 150.0 {
            DecayClass::Punchy
        } else if ms < 300.0 {
            DecayClass::Medium
        } else if ms < 600.0 {
            DecayClass::Rolling
        } else {
            DecayClass::Sustained
        }
    }
}

/// Bass decay analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BassDecayResult {
    /// Median decay time in ms; for `Sustained` bass that never decays, the
    /// median distance between transients (a lower bound)
    pub decay_time_ms: f32,
    /// Decay class
    pub class: DecayClass,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Transients measured
    pub transient_count: usize,
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Classify the decay of the sub-bass after each transient
pub fn detect_bass_decay(samples: &[f32], sample_rate: u32, bpm: f32) -> BassDecayResult {
    if samples.is_empty() || sample_rate == 0 || !(bpm > 0.0) {
        return BassDecayResult::default();
    }
    log::debug!("Bass decay detection: {} samples", samples.len());

    let mut sections = [
        Biquad::lowpass(sample_rate, CUTOFF_HZ, 0.707),
        Biquad::lowpass(sample_rate, CUTOFF_HZ, 0.707),
    ];
    let (envelope, rate) = band_envelope(samples, sample_rate, &mut sections, ENVELOPE_WINDOW_MS);
    let beat = rate * 60.0 / bpm;
    let peaks = envelope_peaks(&envelope, (beat / 4.0) as usize, PEAK_THRESHOLD);
    if peaks.is_empty() {
        return BassDecayResult::default();
    }

    let ms_per_point = 1000.0 / rate;
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();
    for (idx, &peak) in peaks.iter().enumerate() {
        let end = peaks.get(idx + 1).copied().unwrap_or(envelope.len());
        let target = envelope[peak] * DECAY_FLOOR;
        match envelope[peak..end].iter().position(|&v| v < target) {
            Some(offset) => resolved.push(offset as f32 * ms_per_point),
            // The last transient may simply run off the end of the buffer
            None if idx + 1 < peaks.len() => unresolved.push((end - peak) as f32 * ms_per_point),
            None => {}
        }
    }

    let measured = resolved.len() + unresolved.len();
    if measured == 0 {
        return BassDecayResult::default();
    }

    if unresolved.len() * 2 > measured {
        let gap = median(&mut unresolved);
        return BassDecayResult {
            decay_time_ms: gap,
            class: DecayClass::Sustained,
            confidence: (unresolved.len() as f32 / measured as f32).clamp(0.0, 1.0),
            transient_count: measured,
        };
    }

    let consistency = mean_and_cv(&resolved)
        .map(|(_, cv)| (1.0 - cv).clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let decay = median(&mut resolved);
    BassDecayResult {
        decay_time_ms: decay,
        class: DecayClass::from_ms(decay),
        confidence: (consistency * (resolved.len() as f32 / 4.0).min(1.0)).clamp(0.0, 1.0),
        transient_count: measured,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// 50 Hz hits at 120 BPM with exponential decay constant `tau` seconds
    fn bass_hits(sr: u32, tau: f32, secs: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let since = t % 0.5;
                0.8 * (-since / tau).exp() * (2.0 * PI * 50.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_class_thresholds() {
        assert_eq!(DecayClass::from_ms(80.0), DecayClass::Punchy);
        assert_eq!(DecayClass::from_ms(200.0), DecayClass::Medium);
        assert_eq!(DecayClass::from_ms(450.0), DecayClass::Rolling);
        assert_eq!(DecayClass::from_ms(900.0), DecayClass::Sustained);
    }

    #[test]
    fn test_punchy_kick() {
        let result = detect_bass_decay(&bass_hits(22050, 0.03, 6.0), 22050, 120.0);
        assert_eq!(result.class, DecayClass::Punchy, "{:?}", result);
        assert!(result.transient_count >= 8);
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_slow_decay_is_longer() {
        let punchy = detect_bass_decay(&bass_hits(22050, 0.03, 6.0), 22050, 120.0);
        let long = detect_bass_decay(&bass_hits(22050, 0.12, 6.0), 22050, 120.0);
        assert!(long.decay_time_ms > punchy.decay_time_ms);
        assert_ne!(long.class, DecayClass::Punchy);
    }

    #[test]
    fn test_drone_is_sustained() {
        let result = detect_bass_decay(&bass_hits(22050, 100.0, 6.0), 22050, 120.0);
        assert_eq!(result.class, DecayClass::Sustained);
    }

    #[test]
    fn test_silence_defaults() {
        assert_eq!(detect_bass_decay(&[0.0; 22050], 22050, 120.0), BassDecayResult::default());
    }
}
