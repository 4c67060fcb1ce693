//! Confidence aggregation
//!
//! Combines the per-feature confidences of an [`AudioFeatures`] record into
//! one overall score and raises flags for the weak spots.
//!
//! # Components
//!
//! 1. **BPM confidence**: autocorrelation peak height of the winning tempo
//! 2. **Key confidence**: rescaled Pearson correlation of the winning key
//! 3. **Grid stability**: `1 − CV` of the inter-beat intervals
//! 4. **Overall confidence**: 40 % BPM, 30 % key, 30 % grid
//!
//! # Example
//!
//! ```no_run
//! use sonic_dsp::{analyze_audio, AnalysisConfig};
//! use sonic_dsp::analysis::confidence::compute_confidence;
//!
//! let samples = vec![0.0f32; 44100 * 30];
//! let features = analyze_audio(&samples, 44100, &AnalysisConfig::default())?;
//! let confidence = compute_confidence(&features);
//!
//! println!("Overall confidence: {:.2}", confidence.overall_confidence);
//! # Ok::<(), sonic_dsp::AnalysisError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::result::{AudioFeatures, BeatGrid};

/// Below this key confidence the tonality is flagged as weak
const WEAK_TONALITY: f32 = 0.2;

/// Below this BPM confidence the tempo is flagged as ambiguous
const AMBIGUOUS_TEMPO: f32 = 0.3;

/// Below this grid stability the beat grid is flagged as irregular
const IRREGULAR_GRID: f32 = 0.3;

/// Issues found while aggregating confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisFlag {
    /// Key correlation is low: atonal, percussive or modulating material
    WeakTonality,
    /// No clear autocorrelation winner, or the fallback tempo was returned
    AmbiguousTempo,
    /// Beat intervals vary widely, or no beats were tracked
    IrregularBeatGrid,
}

/// Aggregated confidence scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfidence {
    /// BPM confidence (0.0-1.0)
    pub bpm_confidence: f32,

    /// Key confidence (0.0-1.0)
    pub key_confidence: f32,

    /// Grid stability (0.0-1.0)
    ///
    /// 0 when beat tracking did not run or found fewer than three beats.
    pub grid_stability: f32,

    /// Overall confidence: BPM 40 %, key 30 %, grid 30 %
    pub overall_confidence: f32,

    /// Flags for the components that fell below their thresholds
    pub flags: Vec<AnalysisFlag>,
}

/// Stability of a beat grid: `1 − std/mean` of its intervals, clamped to [0, 1]
pub fn grid_stability(grid: &BeatGrid) -> f32 {
    if grid.beats.len() < 3 {
        return 0.0;
    }
    let intervals: Vec<f32> = grid.beats.windows(2).map(|w| w[1] - w[0]).collect();
    let n = intervals.len() as f32;
    let mean = intervals.iter().sum::<f32>() / n;
    if !mean.is_finite() || mean <= 0.0 {
        return 0.0;
    }
    let var = intervals.iter().map(|i| (i - mean) * (i - mean)).sum::<f32>() / n;
    (1.0 - var.sqrt() / mean).clamp(0.0, 1.0)
}

/// Compute aggregated confidence for a feature record
///
/// When one of BPM or key failed outright (confidence 0), the overall score
/// is the surviving component scaled by 0.6.
pub fn compute_confidence(features: &AudioFeatures) -> AnalysisConfidence {
    let bpm_confidence = if features.bpm > 0.0 {
        features.bpm_confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let key_confidence = features.key.confidence.clamp(0.0, 1.0);
    let grid_stability = features.beat_grid.as_ref().map(grid_stability).unwrap_or(0.0);

    let overall_confidence = if bpm_confidence > 0.0 && key_confidence > 0.0 {
        (bpm_confidence * 0.4 + key_confidence * 0.3 + grid_stability * 0.3).clamp(0.0, 1.0)
    } else if bpm_confidence > 0.0 {
        bpm_confidence * 0.6
    } else if key_confidence > 0.0 {
        key_confidence * 0.6
    } else {
        0.0
    };

    let mut flags = Vec::new();
    if key_confidence < WEAK_TONALITY {
        flags.push(AnalysisFlag::WeakTonality);
    }
    if bpm_confidence < AMBIGUOUS_TEMPO {
        flags.push(AnalysisFlag::AmbiguousTempo);
    }
    if grid_stability < IRREGULAR_GRID {
        flags.push(AnalysisFlag::IrregularBeatGrid);
    }

    log::debug!(
        "Confidence scores: BPM={:.3}, Key={:.3}, Grid={:.3}, Overall={:.3}",
        bpm_confidence,
        key_confidence,
        grid_stability,
        overall_confidence
    );

    AnalysisConfidence {
        bpm_confidence,
        key_confidence,
        grid_stability,
        overall_confidence,
        flags,
    }
}

impl AnalysisConfidence {
    /// Overall confidence >= 0.7
    pub fn is_high_confidence(&self) -> bool {
        self.overall_confidence >= 0.7
    }

    /// Overall confidence < 0.5
    pub fn is_low_confidence(&self) -> bool {
        self.overall_confidence < 0.5
    }

    /// "High", "Medium" or "Low"
    pub fn confidence_level(&self) -> &'static str {
        if self.is_high_confidence() {
            "High"
        } else if self.is_low_confidence() {
            "Low"
        } else {
            "Medium"
        }
    }
}
