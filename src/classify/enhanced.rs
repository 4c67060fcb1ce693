//! Enhanced sub-genre classifier
//!
//! Scores [`ENHANCED_SIGNATURES`] on the five base dimensions plus sidechain
//! strength and bass decay, and on RT60 and kick THD for the signatures that
//! define them. Dimensions a detector could not measure are left out of the
//! weighted mean. Detector flags then boost matching genres multiplicatively.

use super::base::{dimension_scores, range_score, BASE_WEIGHTS};
use super::signatures::{family, EnhancedSignature, ENHANCED_SIGNATURES};
use super::{rank_scores, EnhancedGenreClassification, ScoredGenre};
use crate::analysis::result::AudioFeatures;
use crate::config::AnalysisConfig;
use crate::detectors::{run_detectors, DetectorReport};
use crate::signal::AudioSignal;

/// Sidechain strength weight
pub const SIDECHAIN_WEIGHT: f32 = 0.95;
/// Bass decay weight
pub const BASS_DECAY_WEIGHT: f32 = 0.85;
/// RT60 weight
pub const RT60_WEIGHT: f32 = 0.5;
/// Kick THD weight
pub const KICK_THD_WEIGHT: f32 = 0.6;

const SIDECHAIN_FALLOFF: f32 = 2.0;
const BASS_DECAY_FALLOFF: f32 = 0.004;
const RT60_FALLOFF: f32 = 0.5;
const KICK_THD_FALLOFF: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
enum BoostTarget {
    Genre(&'static str),
    Family(&'static str),
}

struct Boost {
    fires: fn(&DetectorReport) -> bool,
    targets: &'static [BoostTarget],
    factor: f32,
}

static BOOSTS: [Boost; 5] = [
    Boost {
        fires: |r| r.acid.is_acid,
        targets: &[BoostTarget::Genre("acid-techno")],
        factor: 1.3,
    },
    Boost {
        fires: |r| r.supersaw.is_supersaw,
        targets: &[BoostTarget::Family(family::TRANCE), BoostTarget::Genre("future-bass")],
        factor: 1.2,
    },
    Boost {
        fires: |r| r.kick_distortion.is_distorted,
        targets: &[
            BoostTarget::Family(family::HARDCORE),
            BoostTarget::Genre("industrial-techno"),
            BoostTarget::Genre("hard-techno"),
        ],
        factor: 1.2,
    },
    Boost {
        fires: |r| r.reverb.is_wet,
        targets: &[
            BoostTarget::Genre("dub-techno"),
            BoostTarget::Genre("ambient"),
            BoostTarget::Genre("deep-house"),
        ],
        factor: 1.15,
    },
    Boost {
        fires: |r| r.vocal.has_vocals,
        targets: &[
            BoostTarget::Genre("uk-garage"),
            BoostTarget::Genre("liquid-dnb"),
            BoostTarget::Genre("progressive-house"),
        ],
        factor: 1.1,
    },
];

fn boost_factor(sig: &EnhancedSignature, report: &DetectorReport) -> f32 {
    BOOSTS
        .iter()
        .filter(|b| (b.fires)(report))
        .filter(|b| {
            b.targets.iter().any(|t| match *t {
                BoostTarget::Genre(g) => g == sig.base.genre,
                BoostTarget::Family(f) => f == sig.base.family,
            })
        })
        .map(|b| b.factor)
        .product()
}

/// Weighted score of one sub-genre before boosts, in [0, 1]
pub fn enhanced_signature_score(
    features: &AudioFeatures,
    report: &DetectorReport,
    sig: &EnhancedSignature,
) -> f32 {
    let mut total = 0.0f32;
    let mut weight = 0.0f32;
    for (s, w) in dimension_scores(features, &sig.base).iter().zip(BASE_WEIGHTS) {
        total += s * w;
        weight += w;
    }

    total += SIDECHAIN_WEIGHT * range_score(report.sidechain.strength, sig.sidechain, SIDECHAIN_FALLOFF);
    weight += SIDECHAIN_WEIGHT;

    if report.bass_decay.transient_count > 0 {
        total += BASS_DECAY_WEIGHT
            * range_score(report.bass_decay.decay_time_ms, sig.bass_decay_ms, BASS_DECAY_FALLOFF);
        weight += BASS_DECAY_WEIGHT;
    }
    if let (Some(range), true) = (sig.rt60, report.reverb.transient_count > 0) {
        total += RT60_WEIGHT * range_score(report.reverb.rt60, range, RT60_FALLOFF);
        weight += RT60_WEIGHT;
    }
    if let (Some(range), true) = (sig.kick_thd, report.kick_distortion.kick_count > 0) {
        total += KICK_THD_WEIGHT * range_score(report.kick_distortion.thd, range, KICK_THD_FALLOFF);
        weight += KICK_THD_WEIGHT;
    }

    if weight > 0.0 {
        (total / weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Classify from features and an existing detector report
pub fn classify_with_detectors(
    features: &AudioFeatures,
    report: DetectorReport,
) -> EnhancedGenreClassification {
    let scored = ENHANCED_SIGNATURES
        .iter()
        .map(|sig| ScoredGenre {
            genre: sig.base.genre,
            family: sig.base.family,
            score: enhanced_signature_score(features, &report, sig) * boost_factor(sig, &report),
        })
        .collect();
    let classification = rank_scores(scored, true);
    log::debug!(
        "Enhanced classification: {} ({}) at {:.2}",
        classification.genre,
        classification.family,
        classification.confidence
    );
    EnhancedGenreClassification {
        classification,
        detectors: report,
    }
}

/// Run the detectors on the mono mix of `signal`, then classify
///
/// `features` should come from [`crate::analyze_signal`] on the same signal;
/// its BPM drives the tempo-aware detectors and its MFCCs, when present, the
/// vocal heuristic.
pub fn classify_genre_enhanced(
    features: &AudioFeatures,
    signal: &AudioSignal,
    config: &AnalysisConfig,
) -> EnhancedGenreClassification {
    let mono = signal.mono();
    let report = run_detectors(
        &mono,
        signal.sample_rate(),
        features.bpm,
        config,
        features.mfcc.as_ref(),
    );
    classify_with_detectors(features, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::features_with;
    use crate::detectors::AcidResult;

    fn score_of(result: &EnhancedGenreClassification, genre: &str) -> f32 {
        result
            .classification
            .all_scores
            .iter()
            .find(|s| s.genre == genre)
            .map(|s| s.score)
            .unwrap()
    }

    #[test]
    fn test_dnb_family() {
        let features = features_with(174.0, -8.0, 8.0, 10.0, 2500.0);
        let result = classify_with_detectors(&features, DetectorReport::default());
        assert_eq!(result.classification.family, "dnb", "{:?}", result.classification.genre);
        assert!((0.0..=1.0).contains(&result.classification.confidence));
    }

    #[test]
    fn test_folded_dnb_tempo() {
        let features = features_with(87.0, -8.0, 8.0, 10.0, 2500.0);
        let result = classify_with_detectors(&features, DetectorReport::default());
        assert_eq!(result.classification.family, "dnb");
    }

    #[test]
    fn test_acid_boost() {
        let features = features_with(100.0, -40.0, 14.0, 1.0, 5000.0);
        let plain = classify_with_detectors(&features, DetectorReport::default());
        let report = DetectorReport {
            acid: AcidResult {
                is_acid: true,
                confidence: 0.8,
                ..AcidResult::default()
            },
            ..DetectorReport::default()
        };
        let boosted = classify_with_detectors(&features, report);
        let before = score_of(&plain, "acid-techno");
        let after = score_of(&boosted, "acid-techno");
        assert!(before < 0.7);
        assert!((after - before * 1.3).abs() < 1e-5);
        // Other genres untouched
        assert_eq!(score_of(&plain, "psytrance"), score_of(&boosted, "psytrance"));
    }

    #[test]
    fn test_unmeasured_dimensions_skipped() {
        let features = features_with(128.0, -15.0, 8.0, 6.0, 2500.0);
        let report = DetectorReport::default();
        // No RT60 measurement: deep-house is scored on its other dimensions only
        let sig = ENHANCED_SIGNATURES
            .iter()
            .find(|s| s.base.genre == "deep-house")
            .unwrap();
        let score = enhanced_signature_score(&features, &report, sig);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_all_scores_relative_confidence() {
        let features = features_with(138.0, -12.0, 7.0, 5.0, 3000.0);
        let result = classify_with_detectors(&features, DetectorReport::default());
        let primary = result.classification.all_scores[0].score;
        for s in &result.classification.all_scores {
            let expected = (s.score * (1.0 - (primary - s.score))).clamp(0.0, 1.0);
            assert!((s.confidence - expected).abs() < 1e-6);
        }
        assert_eq!(result.classification.all_scores.len(), ENHANCED_SIGNATURES.len());
    }

    #[test]
    fn test_end_to_end_bounds() {
        let sr = 22050;
        let samples: Vec<f32> = (0..sr as usize * 4)
            .map(|i| {
                let t = i as f32 / sr as f32;
                let since = t % 0.5;
                0.8 * (-since / 0.08).exp() * (2.0 * std::f32::consts::PI * 55.0 * t).sin()
            })
            .collect();
        let signal = AudioSignal::from_mono(samples, sr).unwrap();
        let features = features_with(120.0, -10.0, 9.0, 2.0, 800.0);
        let result = classify_genre_enhanced(&features, &signal, &AnalysisConfig::default());
        assert!((0.0..=1.0).contains(&result.classification.confidence));
        assert!(result.detectors.bass_decay.transient_count > 0);
    }
}
