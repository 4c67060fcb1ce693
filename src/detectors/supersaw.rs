//! Supersaw detection
//!
//! Stacked detuned saw voices make the tracked pitch wander between a few
//! discrete offsets around the nominal note. A 5-cent histogram of the
//! pitch-bend trace exposes those offsets as separate modes; the spacing
//! between modes is compared with the ~20 cent detune typical of supersaw
//! patches.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::features::pitch::{collect_pitch_bends, detect_notes};

/// Histogram bin width in cents
const BIN_CENTS: f32 = 5.0;

/// Histogram half-range in cents
const RANGE_CENTS: f32 = 100.0;

/// A mode must hold this fraction of all bend values
const MIN_VOICE_SHARE: f32 = 0.05;

/// Typical detune spacing in cents
const TARGET_SPACING: f32 = 20.0;

/// Width of the spacing score in cents
const SPACING_TOLERANCE: f32 = 15.0;

/// Voice count that scores 1
const FULL_VOICES: f32 = 5.0;

/// Fewer bend values than this are not analysed
const MIN_BENDS: usize = 10;

/// Confidence above which a supersaw is reported (with ≥ 3 voices)
pub const SUPERSAW_THRESHOLD: f32 = 0.4;

/// Supersaw analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupersawResult {
    /// `confidence > 0.4 && voice_count >= 3`
    pub is_supersaw: bool,
    /// Distinct detune offsets found
    pub voice_count: usize,
    /// Mean spacing between adjacent offsets in cents
    pub detune_cents: f32,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Detect supersaw layering from a pitch-bend trace in cents
pub fn detect_supersaw_from_bends(bends: &[f32]) -> SupersawResult {
    let in_range: Vec<f32> = bends
        .iter()
        .copied()
        .filter(|c| c.is_finite() && c.abs() < RANGE_CENTS)
        .collect();
    if in_range.len() < MIN_BENDS {
        return SupersawResult::default();
    }

    let n_bins = (2.0 * RANGE_CENTS / BIN_CENTS) as usize;
    let mut histogram = vec![0usize; n_bins];
    for c in &in_range {
        let bin = (((c + RANGE_CENTS) / BIN_CENTS) as usize).min(n_bins - 1);
        histogram[bin] += 1;
    }

    let min_count = ((in_range.len() as f32 * MIN_VOICE_SHARE).ceil() as usize).max(1);
    let centres: Vec<f32> = (0..n_bins)
        .filter(|&i| {
            let c = histogram[i];
            let left = if i > 0 { histogram[i - 1] } else { 0 };
            let right = histogram.get(i + 1).copied().unwrap_or(0);
            c >= min_count && c > left && c >= right
        })
        .map(|i| -RANGE_CENTS + (i as f32 + 0.5) * BIN_CENTS)
        .collect();

    let voice_count = centres.len();
    if voice_count < 2 {
        return SupersawResult {
            voice_count,
            ..SupersawResult::default()
        };
    }

    let detune_cents =
        centres.windows(2).map(|w| w[1] - w[0]).sum::<f32>() / (voice_count - 1) as f32;
    let spacing_score = (-((detune_cents - TARGET_SPACING) / SPACING_TOLERANCE).powi(2)).exp();
    let confidence = (spacing_score * (voice_count as f32 / FULL_VOICES).min(1.0)).clamp(0.0, 1.0);

    SupersawResult {
        is_supersaw: confidence > SUPERSAW_THRESHOLD && voice_count >= 3,
        voice_count,
        detune_cents,
        confidence,
    }
}

/// Track pitch and look for supersaw layering in the bend trace
pub fn detect_supersaw(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> SupersawResult {
    let notes = detect_notes(samples, sample_rate, config);
    let bends = collect_pitch_bends(&notes);
    log::debug!(
        "Supersaw detection: {} notes, {} bend values",
        notes.len(),
        bends.len()
    );
    detect_supersaw_from_bends(&bends)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_detuned_voices() {
        let mut bends = Vec::new();
        for offset in [-40.0, -20.0, 0.0, 20.0, 40.0] {
            for j in 0..20 {
                bends.push(offset + 1.0 + (j % 3) as f32);
            }
        }
        let result = detect_supersaw_from_bends(&bends);
        assert_eq!(result.voice_count, 5, "{:?}", result);
        assert!((result.detune_cents - 20.0).abs() < 1e-3);
        assert!(result.is_supersaw);
        assert!(result.confidence > 0.9);
    }

    #[test]
    fn test_single_voice() {
        let bends: Vec<f32> = (0..50).map(|i| (i % 4) as f32 - 1.5).collect();
        let result = detect_supersaw_from_bends(&bends);
        assert!(!result.is_supersaw);
        assert!(result.voice_count <= 1);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_wide_spacing_scores_low() {
        let mut bends = Vec::new();
        for offset in [-80.0, 0.0, 80.0] {
            bends.extend(std::iter::repeat(offset + 2.0).take(20));
        }
        let result = detect_supersaw_from_bends(&bends);
        assert_eq!(result.voice_count, 3);
        assert!(!result.is_supersaw, "{:?}", result);
    }

    #[test]
    fn test_too_few_values() {
        assert_eq!(detect_supersaw_from_bends(&[0.0, 20.0]), SupersawResult::default());
    }

    #[test]
    fn test_pure_tone_not_supersaw() {
        let sr = 22050;
        let tone: Vec<f32> = (0..sr as usize * 2)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / sr as f32).sin())
            .collect();
        assert!(!detect_supersaw(&tone, sr, &AnalysisConfig::default()).is_supersaw);
    }
}
