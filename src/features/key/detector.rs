//! Key detection algorithm
//!
//! Pearson correlation of a chroma vector against the 24 Krumhansl-Kessler
//! templates. The best-correlated key wins and its correlation `r` maps to a
//! confidence of `clamp((r + 0.5) / 1.5, 0, 1)`.

use super::templates::KeyTemplates;
use super::KeyDetectionResult;
use crate::analysis::result::Key;

/// Pearson correlation of two 12-bin vectors; 0 when either is constant
pub fn pearson_correlation(a: &[f32; 12], b: &[f32; 12]) -> f32 {
    let mean_a = a.iter().sum::<f32>() / 12.0;
    let mean_b = b.iter().sum::<f32>() / 12.0;
    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for i in 0..12 {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom <= 1e-12 || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Map a winning correlation to a confidence in [0, 1]
#[inline]
pub fn correlation_confidence(r: f32) -> f32 {
    ((r + 0.5) / 1.5).clamp(0.0, 1.0)
}

/// Detect the key of a max-normalized chroma vector
///
/// An all-zero chroma yields C major with confidence 0. Scores in
/// `all_scores` are the raw correlations, highest first.
pub fn detect_key_from_chroma(chroma: &[f32; 12], templates: &KeyTemplates) -> KeyDetectionResult {
    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if !(max > 1e-10) {
        log::warn!("Silent chroma, key defaults to C major");
        return KeyDetectionResult {
            key: Key::Major(0),
            confidence: 0.0,
            all_scores: Vec::new(),
        };
    }

    let mut scores: Vec<(Key, f32)> = Vec::with_capacity(24);
    for root in 0..12u32 {
        scores.push((
            Key::Major(root),
            pearson_correlation(chroma, templates.get_major_template(root)),
        ));
    }
    for root in 0..12u32 {
        scores.push((
            Key::Minor(root),
            pearson_correlation(chroma, templates.get_minor_template(root)),
        ));
    }

    // Stable sort keeps C major first among ties
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (key, best) = scores[0];
    log::debug!("Key scores: best {} r={:.3}", key.name(), best);

    KeyDetectionResult {
        key,
        confidence: correlation_confidence(best),
        all_scores: scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::key::templates::{MAJOR_PROFILE, MINOR_PROFILE};

    #[test]
    fn test_pearson_identity_and_constant() {
        assert!((pearson_correlation(&MAJOR_PROFILE, &MAJOR_PROFILE) - 1.0).abs() < 1e-5);
        assert_eq!(pearson_correlation(&[1.0; 12], &MAJOR_PROFILE), 0.0);
    }

    #[test]
    fn test_profile_detects_its_own_key() {
        let templates = KeyTemplates::new();
        let g_major = *templates.get_major_template(7);
        let result = detect_key_from_chroma(&g_major, &templates);
        assert_eq!(result.key, Key::Major(7));
        assert!((result.confidence - 1.0).abs() < 1e-5);

        let mut c_minor = MINOR_PROFILE;
        let max = c_minor.iter().copied().fold(0.0, f32::max);
        c_minor.iter_mut().for_each(|v| *v /= max);
        assert_eq!(detect_key_from_chroma(&c_minor, &templates).key, Key::Minor(0));
    }

    #[test]
    fn test_silent_chroma_defaults() {
        let result = detect_key_from_chroma(&[0.0; 12], &KeyTemplates::new());
        assert_eq!(result.key, Key::Major(0));
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_confidence_mapping() {
        assert_eq!(correlation_confidence(-1.0), 0.0);
        assert_eq!(correlation_confidence(1.0), 1.0);
        assert!((correlation_confidence(0.25) - 0.5).abs() < 1e-6);
    }
}
