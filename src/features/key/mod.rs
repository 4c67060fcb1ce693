//! Key detection
//!
//! Goertzel chroma → Krumhansl-Kessler template correlation (24 keys).
//! Silent or very short input still yields a valid key, with low confidence.

pub mod detector;
pub mod templates;

pub use detector::{detect_key_from_chroma, pearson_correlation};
pub use templates::KeyTemplates;

use crate::analysis::result::{Key, KeyDetection};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::chroma::extract_chroma;
use crate::features::hpss::separate_hpss;

/// Key detection result
#[derive(Debug, Clone)]
pub struct KeyDetectionResult {
    /// Detected key (best match)
    pub key: Key,

    /// Confidence score (0.0-1.0)
    pub confidence: f32,

    /// All 24 key correlations, highest first (empty for silent input)
    pub all_scores: Vec<(Key, f32)>,
}

impl From<KeyDetectionResult> for KeyDetection {
    fn from(result: KeyDetectionResult) -> Self {
        KeyDetection::new(result.key, result.confidence)
    }
}

/// Detect the key of a mono channel
///
/// # Example
///
/// ```
/// use sonic_dsp::features::key::detect_key;
/// use sonic_dsp::AnalysisConfig;
///
/// let sr = 44100;
/// let tone: Vec<f32> = (0..sr * 2)
///     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
///     .collect();
/// let key = detect_key(&tone, sr, &AnalysisConfig::default());
/// assert_eq!(key.root, "A");
/// ```
pub fn detect_key(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> KeyDetection {
    detect_key_detailed(samples, sample_rate, config).into()
}

/// Key detection keeping the full score table
pub fn detect_key_detailed(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> KeyDetectionResult {
    log::debug!(
        "Detecting key: {} samples, frame={}, max_frames={}",
        samples.len(),
        config.key_frame_size,
        config.key_max_frames
    );
    let chroma = extract_chroma(
        samples,
        sample_rate,
        config.key_frame_size,
        config.key_max_frames,
    );
    detect_key_from_chroma(&chroma, &KeyTemplates::new())
}

/// Detect the key on the harmonic component only
///
/// Runs HPSS first, which removes drum energy that otherwise smears the
/// chroma of dense electronic mixes.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the configured HPSS frame size is
/// not a power of two.
pub fn detect_key_harmonic(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<KeyDetection, AnalysisError> {
    let separated = separate_hpss(samples, sample_rate, config)?;
    Ok(detect_key(&separated.harmonic, sample_rate, config))
}
