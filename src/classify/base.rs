//! Base genre classifier
//!
//! Weighted range scoring over BPM, sub-bass level, crest factor, onset
//! density and spectral centroid against [`BASE_SIGNATURES`].

use super::signatures::{GenreSignature, Range, BASE_SIGNATURES};
use super::{rank_scores, GenreClassification, ScoredGenre};
use crate::analysis::result::AudioFeatures;

/// Dimension weights: BPM, sub-bass, crest, onset density, centroid
pub const BASE_WEIGHTS: [f32; 5] = [0.30, 0.25, 0.20, 0.15, 0.10];

/// Score lost per unit outside a range, per dimension
pub mod falloff {
    /// Per BPM
    pub const BPM: f32 = 0.05;
    /// Per dB of sub-bass
    pub const SUB_BASS_DB: f32 = 0.05;
    /// Per dB of crest factor
    pub const CREST_DB: f32 = 0.1;
    /// Per onset/second
    pub const ONSET_DENSITY: f32 = 0.15;
    /// Per Hz of centroid
    pub const CENTROID_HZ: f32 = 0.0005;
}

/// 1 inside `range`, falling linearly by `falloff` per unit outside, floored at 0
///
/// Non-finite values score 0.
///
/// # Example
///
/// ```
/// use sonic_dsp::classify::base::range_score;
/// use sonic_dsp::classify::signatures::Range;
///
/// let range = Range { min: 120.0, max: 130.0 };
/// assert_eq!(range_score(125.0, range, 0.05), 1.0);
/// assert!((range_score(110.0, range, 0.05) - 0.5).abs() < 1e-6);
/// assert_eq!(range_score(90.0, range, 0.05), 0.0);
/// ```
pub fn range_score(value: f32, range: Range, falloff: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let distance = if value < range.min {
        range.min - value
    } else if value > range.max {
        value - range.max
    } else {
        return 1.0;
    };
    (1.0 - distance * falloff).max(0.0)
}

/// Best score over several accepted ranges
pub fn best_range_score(value: f32, ranges: &[Range], falloff: f32) -> f32 {
    ranges
        .iter()
        .map(|&r| range_score(value, r, falloff))
        .fold(0.0, f32::max)
}

/// Per-dimension scores of `features` against a signature, in weight order
pub(crate) fn dimension_scores(features: &AudioFeatures, sig: &GenreSignature) -> [f32; 5] {
    [
        best_range_score(features.bpm, sig.bpm, falloff::BPM),
        range_score(features.sub_bass_db(), sig.sub_bass_db, falloff::SUB_BASS_DB),
        range_score(features.crest_factor_db, sig.crest_factor_db, falloff::CREST_DB),
        range_score(features.onset_density, sig.onset_density, falloff::ONSET_DENSITY),
        range_score(features.spectral_centroid, sig.centroid_hz, falloff::CENTROID_HZ),
    ]
}

/// Weighted base score in [0, 1]
pub fn signature_score(features: &AudioFeatures, sig: &GenreSignature) -> f32 {
    dimension_scores(features, sig)
        .iter()
        .zip(BASE_WEIGHTS.iter())
        .map(|(s, w)| s * w)
        .sum::<f32>()
        .clamp(0.0, 1.0)
}

/// Classify into one of the ten base genres
pub fn classify_genre(features: &AudioFeatures) -> GenreClassification {
    log::debug!(
        "Base genre classification: {:.1} BPM, sub-bass {:.1} dB",
        features.bpm,
        features.sub_bass_db()
    );
    let scored = BASE_SIGNATURES
        .iter()
        .map(|sig| ScoredGenre {
            genre: sig.genre,
            family: sig.family,
            score: signature_score(features, sig),
        })
        .collect();
    rank_scores(scored, false)
}
