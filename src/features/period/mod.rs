//! Period estimation (BPM detection)
//!
//! Onset envelope → autocorrelation → rescored candidates → octave
//! normalization. Every degenerate input answers with
//! [`BpmEstimate::FALLBACK`] (120 BPM, confidence 0).

pub mod autocorrelation;
pub mod peak_picking;

use crate::analysis::result::BpmEstimate;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::onset::{compute_onset_envelope, OnsetEnvelope};

/// BPM candidate with confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmCandidate {
    /// BPM estimate
    pub bpm: f32,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,
}

/// Fold a tempo into the range DJ software reports
///
/// Tempi in (160, 240] are halved and tempi in [30, 70) doubled; everything
/// else is returned unchanged.
pub fn normalize_octave(bpm: f32) -> f32 {
    if bpm > 160.0 && bpm <= 240.0 {
        bpm / 2.0
    } else if (30.0..70.0).contains(&bpm) {
        bpm * 2.0
    } else {
        bpm
    }
}

/// Estimate tempo from a precomputed onset envelope
pub fn estimate_bpm(envelope: &OnsetEnvelope, min_bpm: f32, max_bpm: f32) -> BpmEstimate {
    if envelope.len() < 2 {
        log::warn!(
            "Too few onset frames for tempo estimation: {}",
            envelope.len()
        );
        return BpmEstimate::FALLBACK;
    }

    let candidates = autocorrelation::estimate_bpm_candidates(
        &envelope.values,
        envelope.sample_rate,
        envelope.hop_size,
        min_bpm,
        max_bpm,
    );

    let Some(best) = candidates.first() else {
        return BpmEstimate::FALLBACK;
    };
    if !best.bpm.is_finite() {
        return BpmEstimate::FALLBACK;
    }

    let bpm = (normalize_octave(best.bpm) * 10.0).round() / 10.0;
    BpmEstimate {
        bpm,
        confidence: best.confidence.clamp(0.0, 1.0),
    }
}

/// Detect the tempo of a mono channel
///
/// Hop and frame sizes and the BPM search range come from `config`
/// (`tempo_hop_size`, `tempo_frame_size`, `min_bpm`, `max_bpm`).
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the configured frame size is not a
/// power of two or the hop is zero.
///
/// # Example
///
/// ```
/// use sonic_dsp::features::period::detect_bpm;
/// use sonic_dsp::AnalysisConfig;
///
/// // Too short for two analysis frames
/// let estimate = detect_bpm(&[0.0; 1000], 44100, &AnalysisConfig::default())?;
/// assert_eq!(estimate.bpm, 120.0);
/// assert_eq!(estimate.confidence, 0.0);
/// # Ok::<(), sonic_dsp::AnalysisError>(())
/// ```
pub fn detect_bpm(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<BpmEstimate, AnalysisError> {
    log::debug!(
        "Detecting BPM: {} samples at {} Hz, range [{:.1}, {:.1}]",
        samples.len(),
        sample_rate,
        config.min_bpm,
        config.max_bpm
    );
    let envelope = compute_onset_envelope(
        samples,
        sample_rate,
        config.tempo_frame_size,
        config.tempo_hop_size,
    )?;
    Ok(estimate_bpm(&envelope, config.min_bpm, config.max_bpm))
}
