//! Adaptive thresholding and onset picking
//!
//! Median + MAD (Median Absolute Deviation) thresholds as recommended by
//! McFee & Ellis (2014), followed by local-maximum picking with a minimum gap.
//!
//! # Reference
//!
//! McFee, B., & Ellis, D. P. W. (2014). Better Beat Tracking Through Robust Onset Aggregation.
//! *Proceedings of the International Society for Music Information Retrieval Conference*.

use crate::error::AnalysisError;

/// Median of a slice (mean of the two middle values for even lengths); 0 when empty
pub fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    } else {
        sorted[mid]
    }
}

/// Compute adaptive threshold `median(values) + k * MAD(values)`
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `values` is empty or `k` is negative.
pub fn adaptive_threshold_median_mad(values: &[f32], k: f32) -> Result<f32, AnalysisError> {
    if values.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Empty values for threshold calculation".to_string(),
        ));
    }
    if k < 0.0 {
        return Err(AnalysisError::InvalidInput(
            "MAD multiplier k must be non-negative".to_string(),
        ));
    }

    let med = median(values);
    let deviations: Vec<f32> = values.iter().map(|&v| (v - med).abs()).collect();
    let mad = median(&deviations);

    Ok(med + k * mad)
}

/// Pick onset frames from an onset-strength envelope
///
/// A frame is an onset when it is a local maximum, exceeds
/// `max(median + k·MAD, floor)` and lies at least `min_gap` frames after the
/// previous onset. When two candidates are closer than `min_gap`, the
/// stronger one wins.
pub fn pick_onsets(envelope: &[f32], k: f32, floor: f32, min_gap: usize) -> Vec<usize> {
    if envelope.len() < 3 {
        return Vec::new();
    }
    let threshold = adaptive_threshold_median_mad(envelope, k.max(0.0))
        .unwrap_or(floor)
        .max(floor);

    let mut onsets: Vec<usize> = Vec::new();
    for i in 1..envelope.len() - 1 {
        let v = envelope[i];
        if v < threshold || v <= envelope[i - 1] || v < envelope[i + 1] {
            continue;
        }
        match onsets.last().copied() {
            Some(prev) if i - prev < min_gap => {
                if v > envelope[prev] {
                    if let Some(last) = onsets.last_mut() {
                        *last = i;
                    }
                }
            }
            _ => onsets.push(i),
        }
    }
    onsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_threshold_robust_to_outlier() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let threshold = adaptive_threshold_median_mad(&values, 2.5).unwrap();
        assert!(threshold > 3.5);
        assert!(threshold < 50.0);
    }

    #[test]
    fn test_adaptive_threshold_errors() {
        assert!(adaptive_threshold_median_mad(&[], 2.5).is_err());
        assert!(adaptive_threshold_median_mad(&[1.0], -1.0).is_err());
        assert_eq!(adaptive_threshold_median_mad(&[5.0], 2.5).unwrap(), 5.0);
    }

    #[test]
    fn test_pick_onsets_pulse_train() {
        let mut env = vec![0.0f32; 100];
        for i in (5..100).step_by(20) {
            env[i] = 1.0;
        }
        let onsets = pick_onsets(&env, 2.5, 0.1, 3);
        assert_eq!(onsets, vec![5, 25, 45, 65, 85]);
    }

    #[test]
    fn test_pick_onsets_min_gap_keeps_stronger() {
        let env = vec![0.0, 0.6, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(pick_onsets(&env, 0.0, 0.1, 4), vec![3]);
    }

    #[test]
    fn test_pick_onsets_silence() {
        assert!(pick_onsets(&vec![0.0; 50], 2.5, 0.1, 3).is_empty());
    }
}
