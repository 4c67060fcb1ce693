//! Genre classification
//!
//! - [`base`]: ten broad genres from the five core features
//! - [`enhanced`]: electronic sub-genres that also weigh the production
//!   detectors (sidechain, bass decay, reverb, kick distortion) and apply
//!   detector boosts
//! - [`signatures`]: the static signature tables

pub mod base;
pub mod enhanced;
pub mod signatures;

use serde::{Deserialize, Serialize};

use crate::detectors::DetectorReport;

pub use base::classify_genre;
pub use enhanced::{classify_genre_enhanced, classify_with_detectors};

/// Secondary genres must score above this
pub const SECONDARY_THRESHOLD: f32 = 0.5;

/// One row of the score table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreScore {
    /// Genre id
    pub genre: String,
    /// Genre family
    pub family: String,
    /// Raw weighted score in [0, 1]
    pub score: f32,
    /// Confidence relative to the winner, in [0, 1]
    pub confidence: f32,
}

/// Genre classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreClassification {
    /// Winning genre id
    pub genre: String,
    /// `min(1, top × (1 + gap))`, gap being the margin over the runner-up
    pub confidence: f32,
    /// Every genre, best first
    pub all_scores: Vec<GenreScore>,
    /// Runner-up, when it scores above 0.5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    /// Family of the winning genre
    pub family: String,
}

/// Enhanced classification with the detector outputs that fed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedGenreClassification {
    /// Classification over the sub-genre table
    #[serde(flatten)]
    pub classification: GenreClassification,
    /// Every detector's result
    pub detectors: DetectorReport,
}

pub(crate) struct ScoredGenre {
    pub genre: &'static str,
    pub family: &'static str,
    pub score: f32,
}

/// Sort, pick the winner and fill in the score table
///
/// With `relative_confidence` each row's confidence is
/// `score × (1 − (primary − score))`; otherwise it is the score itself.
pub(crate) fn rank_scores(mut scored: Vec<ScoredGenre>, relative_confidence: bool) -> GenreClassification {
    for s in &mut scored {
        s.score = if s.score.is_finite() { s.score.clamp(0.0, 1.0) } else { 0.0 };
    }
    // Stable: ties keep table order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let Some(top) = scored.first() else {
        return GenreClassification {
            genre: String::new(),
            confidence: 0.0,
            all_scores: Vec::new(),
            secondary: None,
            family: String::new(),
        };
    };
    let primary = top.score;
    let runner_up = scored.get(1);
    let gap = runner_up.map(|s| primary - s.score).unwrap_or(primary);
    let confidence = (primary * (1.0 + gap)).min(1.0).clamp(0.0, 1.0);
    let secondary = runner_up
        .filter(|s| s.score > SECONDARY_THRESHOLD)
        .map(|s| s.genre.to_string());

    let all_scores = scored
        .iter()
        .map(|s| GenreScore {
            genre: s.genre.to_string(),
            family: s.family.to_string(),
            score: s.score,
            confidence: if relative_confidence {
                (s.score * (1.0 - (primary - s.score))).clamp(0.0, 1.0)
            } else {
                s.score
            },
        })
        .collect();

    GenreClassification {
        genre: top.genre.to_string(),
        confidence,
        all_scores,
        secondary,
        family: top.family.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::result::{AudioFeatures, Key, KeyDetection};
    use crate::dsp::bands::{Dominance, SpectralBand, BAND_DEFINITIONS};

    /// Features with the five classifier dimensions set and everything else neutral
    pub(crate) fn features_with(
        bpm: f32,
        sub_bass_db: f32,
        crest_factor_db: f32,
        onset_density: f32,
        centroid: f32,
    ) -> AudioFeatures {
        let spectral_bands = BAND_DEFINITIONS
            .iter()
            .map(|&(name, low, high)| {
                let avg_db = if name == "Sub Bass" { sub_bass_db } else { -30.0 };
                SpectralBand {
                    name: name.to_string(),
                    low_hz: low,
                    high_hz: high,
                    avg_db,
                    peak_db: avg_db + 6.0,
                    dominance: Dominance::from_db(avg_db),
                }
            })
            .collect();
        AudioFeatures {
            bpm,
            bpm_confidence: 0.8,
            key: KeyDetection::new(Key::Minor(9), 0.7),
            spectral_centroid: centroid,
            rms_mean: 0.2,
            rms_profile: vec![0.2; 16],
            crest_factor_db,
            onset_count: (onset_density * 30.0) as usize,
            onset_density,
            duration_seconds: 30.0,
            sample_rate: 44100,
            channel_count: 2,
            spectral_bands,
            beat_grid: None,
            stereo: None,
            mfcc: None,
            timbre: None,
        }
    }

    fn scored(pairs: &[(&'static str, f32)]) -> Vec<ScoredGenre> {
        pairs
            .iter()
            .map(|&(genre, score)| ScoredGenre {
                genre,
                family: "test",
                score,
            })
            .collect()
    }

    #[test]
    fn test_confidence_formula() {
        let result = rank_scores(scored(&[("a", 0.6), ("b", 0.8), ("c", 0.3)]), true);
        assert_eq!(result.genre, "b");
        // 0.8 × (1 + 0.2)
        assert!((result.confidence - 0.96).abs() < 1e-5);
        assert_eq!(result.secondary.as_deref(), Some("a"));
        // 0.6 × (1 − 0.2), 0.3 × (1 − 0.5)
        assert!((result.all_scores[1].confidence - 0.48).abs() < 1e-5);
        assert!((result.all_scores[2].confidence - 0.15).abs() < 1e-5);
        assert!((result.all_scores[0].confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_no_secondary_below_half() {
        let result = rank_scores(scored(&[("a", 0.9), ("b", 0.5)]), false);
        assert!(result.secondary.is_none());
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.all_scores[1].confidence, 0.5);
    }

    #[test]
    fn test_nan_scores_sanitized() {
        let result = rank_scores(scored(&[("a", f32::NAN), ("b", 0.4)]), true);
        assert_eq!(result.genre, "b");
        assert_eq!(result.all_scores[1].score, 0.0);
    }

    #[test]
    fn test_serializes_flat() {
        let enhanced = EnhancedGenreClassification {
            classification: rank_scores(scored(&[("a", 0.7)]), true),
            detectors: DetectorReport::default(),
        };
        let json = serde_json::to_value(&enhanced).unwrap();
        assert_eq!(json["genre"], "a");
        assert!(json["detectors"]["sidechain"].is_object());
    }
}
