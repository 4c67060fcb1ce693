//! Specialized production-style detectors
//!
//! Each detector is a pure function over a mono channel (plus tempo where
//! needed) that answers "not enough data" with its zero/false default rather
//! than an error. [`run_detectors`] evaluates all seven, either sequentially or
//! as a fork-join on the rayon pool; results are identical either way.

pub mod acid;
pub mod bass_decay;
pub mod kick_distortion;
pub mod reverb;
pub mod sidechain;
pub mod supersaw;
pub mod vocal;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::dsp::filter::{envelope_block_size, filter_cascade, Biquad};
use crate::features::mfcc::MfccFeatures;

pub use acid::{detect_acid, AcidResult};
pub use bass_decay::{detect_bass_decay, BassDecayResult, DecayClass};
pub use kick_distortion::{detect_kick_distortion, KickDistortionResult};
pub use reverb::{detect_reverb, ReverbResult};
pub use sidechain::{detect_sidechain, SidechainResult};
pub use supersaw::{detect_supersaw, detect_supersaw_from_bends, SupersawResult};
pub use vocal::{detect_vocals, VocalResult};

/// Envelope rate used by the sub-bass detectors, in Hz
pub const ENVELOPE_RATE_HZ: f32 = 1000.0;

/// Output of every detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorReport {
    /// Sidechain pumping
    pub sidechain: SidechainResult,
    /// Bass decay character
    pub bass_decay: BassDecayResult,
    /// Acid/303 resonance
    pub acid: AcidResult,
    /// Reverb tail
    pub reverb: ReverbResult,
    /// Kick distortion
    pub kick_distortion: KickDistortionResult,
    /// Supersaw layering
    pub supersaw: SupersawResult,
    /// Vocal presence
    pub vocal: VocalResult,
}

/// Filtered sliding-RMS envelope at about [`ENVELOPE_RATE_HZ`]
///
/// Each point is the RMS of a full `window_ms` of filtered signal starting at that
/// hop; the window must span a few periods of the lowest frequency of
/// interest or the envelope ripples with the waveform. Returns the envelope
/// and its actual rate in Hz.
pub(crate) fn band_envelope(
    samples: &[f32],
    sample_rate: u32,
    sections: &mut [Biquad],
    window_ms: f32,
) -> (Vec<f32>, f32) {
    let filtered = filter_cascade(samples, sections);
    let hop = envelope_block_size(sample_rate, ENVELOPE_RATE_HZ);
    let window = ((sample_rate as f32 * window_ms / 1000.0) as usize).max(hop);

    let mut prefix = Vec::with_capacity(filtered.len() + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &x in &filtered {
        acc += (x as f64) * (x as f64);
        prefix.push(acc);
    }

    let points = crate::dsp::window::frame_count(filtered.len(), window, hop);
    let envelope = (0..points)
        .map(|i| {
            let start = i * hop;
            let energy = (prefix[start + window] - prefix[start]).max(0.0);
            (energy / window as f64).sqrt() as f32
        })
        .collect();
    (envelope, sample_rate as f32 / hop as f32)
}

/// Envelope points that are the maximum of their ±`radius` neighbourhood and
/// at least `relative_threshold` of the global maximum, in time order
pub(crate) fn envelope_peaks(envelope: &[f32], radius: usize, relative_threshold: f32) -> Vec<usize> {
    let max = envelope.iter().copied().fold(0.0f32, f32::max);
    if !(max > 0.0) {
        return Vec::new();
    }
    let floor = max * relative_threshold;
    let radius = radius.max(1);
    let mut peaks: Vec<usize> = Vec::new();
    for i in 0..envelope.len() {
        let v = envelope[i];
        if v < floor {
            continue;
        }
        let lo = i.saturating_sub(radius);
        let hi = (i + radius).min(envelope.len() - 1);
        if envelope[lo..=hi].iter().all(|&x| x <= v) {
            // Plateaus report their first sample only
            if peaks.last().is_some_and(|&p| i - p <= radius) {
                continue;
            }
            peaks.push(i);
        }
    }
    peaks
}

/// Mean and coefficient of variation; `None` for an empty slice or zero mean
pub(crate) fn mean_and_cv(values: &[f32]) -> Option<(f32, f32)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    if !(mean.abs() > 1e-12) {
        return None;
    }
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    Some((mean, var.sqrt() / mean.abs()))
}

/// Run all seven detectors
///
/// `mfcc` feeds the vocal detector's spectral-shape heuristic when present.
/// With `config.parallel_detectors` the detectors run as nested
/// `rayon::join` calls.
pub fn run_detectors(
    samples: &[f32],
    sample_rate: u32,
    bpm: f32,
    config: &AnalysisConfig,
    mfcc: Option<&MfccFeatures>,
) -> DetectorReport {
    log::debug!(
        "Running detectors: {} samples, {:.1} BPM, parallel={}",
        samples.len(),
        bpm,
        config.parallel_detectors
    );

    if !config.parallel_detectors {
        return DetectorReport {
            sidechain: detect_sidechain(samples, sample_rate, bpm),
            bass_decay: detect_bass_decay(samples, sample_rate, bpm),
            acid: detect_acid(samples, sample_rate, bpm),
            reverb: detect_reverb(samples, sample_rate),
            kick_distortion: detect_kick_distortion(samples, sample_rate),
            supersaw: detect_supersaw(samples, sample_rate, config),
            vocal: detect_vocals(samples, sample_rate, mfcc),
        };
    }

    let ((sidechain, bass_decay), ((acid, reverb), (kick_distortion, (supersaw, vocal)))) =
        rayon::join(
            || {
                rayon::join(
                    || detect_sidechain(samples, sample_rate, bpm),
                    || detect_bass_decay(samples, sample_rate, bpm),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || detect_acid(samples, sample_rate, bpm),
                            || detect_reverb(samples, sample_rate),
                        )
                    },
                    || {
                        rayon::join(
                            || detect_kick_distortion(samples, sample_rate),
                            || {
                                rayon::join(
                                    || detect_supersaw(samples, sample_rate, config),
                                    || detect_vocals(samples, sample_rate, mfcc),
                                )
                            },
                        )
                    },
                )
            },
        );

    DetectorReport {
        sidechain,
        bass_decay,
        acid,
        reverb,
        kick_distortion,
        supersaw,
        vocal,
    }
}
