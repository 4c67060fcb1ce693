//! Vocal presence
//!
//! Three cues: how much energy sits in the voice fundamental (150–1500 Hz) and
//! formant (300–4000 Hz) regions, whether spectral peaks line up with the
//! typical first three formants, and optionally whether the MFCC magnitude
//! profile has the low-heavy shape of speech and singing.

use serde::{Deserialize, Serialize};

use crate::dsp::fft::frequency_bin;
use crate::dsp::window::{frame_count, sampled_frame_indices, SpectralFrame};
use crate::features::mfcc::MfccFeatures;

const FRAME_SIZE: usize = 2048;
const HOP_SIZE: usize = 1024;
const MAX_FRAMES: usize = 300;

const FUNDAMENTAL_BAND: (f32, f32) = (150.0, 1500.0);
const FORMANT_BAND: (f32, f32) = (300.0, 4000.0);

/// Search range for formant peaks
const PEAK_SEARCH: (f32, f32) = (300.0, 3500.0);

/// Typical F1, F2, F3 in Hz
const FORMANT_TARGETS: [f32; 3] = [500.0, 1500.0, 2500.0];
const FORMANT_TOLERANCE_HZ: f32 = 200.0;

/// Spectral peaks considered per frame
const MAX_PEAKS: usize = 8;

/// Peaks below this fraction of the frame maximum are ignored
const PEAK_FLOOR: f32 = 0.1;

/// Expected share of |MFCC| mass in coefficients 1–4, 5–8 and 9–12
const MFCC_SHAPE: [f32; 3] = [0.40, 0.35, 0.25];

/// Frames quieter than this total power are skipped
const SILENT_POWER: f32 = 1e-10;

/// Confidence above which vocals are reported
pub const VOCAL_THRESHOLD: f32 = 0.45;

/// Vocal analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocalResult {
    /// `confidence > 0.45`
    pub has_vocals: bool,
    /// Combined confidence in [0, 1]
    pub confidence: f32,
    /// Mean of the fundamental and formant band energy ratios
    pub energy_score: f32,
    /// Share of the three formant targets matched by spectral peaks
    pub formant_score: f32,
    /// MFCC shape similarity, when MFCCs were supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfcc_score: Option<f32>,
}

fn band_bins(band: (f32, f32), sample_rate: u32) -> (usize, usize) {
    (
        frequency_bin(band.0, FRAME_SIZE, sample_rate),
        frequency_bin(band.1, FRAME_SIZE, sample_rate),
    )
}

/// Similarity of the MFCC magnitude profile to the vocal shape, in [0, 1]
pub fn mfcc_shape_score(mfcc: &MfccFeatures) -> Option<f32> {
    let c = &mfcc.coefficients;
    if c.len() < 13 {
        return None;
    }
    let groups = [
        c[1..5].iter().map(|v| v.abs()).sum::<f32>(),
        c[5..9].iter().map(|v| v.abs()).sum::<f32>(),
        c[9..13].iter().map(|v| v.abs()).sum::<f32>(),
    ];
    let total: f32 = groups.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }
    let distance: f32 = groups
        .iter()
        .zip(MFCC_SHAPE.iter())
        .map(|(g, target)| (g / total - target).abs())
        .sum();
    Some((1.0 - distance / 2.0).clamp(0.0, 1.0))
}

fn formant_matches(magnitudes: &[f32], lo: usize, hi: usize, bin_hz: f32) -> f32 {
    let frame_max = magnitudes.iter().copied().fold(0.0f32, f32::max);
    let floor = frame_max * PEAK_FLOOR;
    let mut peaks: Vec<(usize, f32)> = (lo.max(1)..hi.min(magnitudes.len() - 1))
        .filter(|&k| {
            let m = magnitudes[k];
            m > floor && m > magnitudes[k - 1] && m >= magnitudes[k + 1]
        })
        .map(|k| (k, magnitudes[k]))
        .collect();
    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
    peaks.truncate(MAX_PEAKS);

    let matched = FORMANT_TARGETS
        .iter()
        .filter(|&&target| {
            peaks
                .iter()
                .any(|&(k, _)| (k as f32 * bin_hz - target).abs() <= FORMANT_TOLERANCE_HZ)
        })
        .count();
    matched as f32 / FORMANT_TARGETS.len() as f32
}

/// Score vocal presence in a mono channel
///
/// Without MFCCs the confidence is `0.45·energy + 0.55·formant`; with them
/// `0.35·energy + 0.40·formant + 0.25·mfcc`.
pub fn detect_vocals(samples: &[f32], sample_rate: u32, mfcc: Option<&MfccFeatures>) -> VocalResult {
    let total_frames = frame_count(samples.len(), FRAME_SIZE, HOP_SIZE);
    if total_frames == 0 || sample_rate == 0 {
        return VocalResult::default();
    }
    let Ok(mut frame) = SpectralFrame::new(FRAME_SIZE) else {
        return VocalResult::default();
    };
    let indices = sampled_frame_indices(total_frames, MAX_FRAMES);
    log::debug!("Vocal detection: {} of {} frames", indices.len(), total_frames);

    let bin_hz = sample_rate as f32 / FRAME_SIZE as f32;
    let fundamental = band_bins(FUNDAMENTAL_BAND, sample_rate);
    let formant = band_bins(FORMANT_BAND, sample_rate);
    let search = band_bins(PEAK_SEARCH, sample_rate);

    let mut energy_sum = 0.0f32;
    let mut formant_sum = 0.0f32;
    let mut voiced = 0usize;
    for &index in &indices {
        let mags = frame.analyze(samples, index * HOP_SIZE);
        let power = |lo: usize, hi: usize| -> f32 { mags[lo..=hi].iter().map(|m| m * m).sum() };
        let total = power(0, mags.len() - 1);
        if !(total > SILENT_POWER) {
            continue;
        }
        let fund_ratio = power(fundamental.0, fundamental.1) / total;
        let formant_ratio = power(formant.0, formant.1) / total;
        energy_sum += 0.5 * fund_ratio + 0.5 * formant_ratio;
        formant_sum += formant_matches(mags, search.0, search.1, bin_hz);
        voiced += 1;
    }

    if voiced == 0 {
        return VocalResult::default();
    }
    let energy_score = (energy_sum / voiced as f32).clamp(0.0, 1.0);
    let formant_score = (formant_sum / voiced as f32).clamp(0.0, 1.0);
    let mfcc_score = mfcc.and_then(mfcc_shape_score);

    let confidence = match mfcc_score {
        Some(m) => 0.35 * energy_score + 0.40 * formant_score + 0.25 * m,
        None => 0.45 * energy_score + 0.55 * formant_score,
    }
    .clamp(0.0, 1.0);

    VocalResult {
        has_vocals: confidence > VOCAL_THRESHOLD,
        confidence,
        energy_score,
        formant_score,
        mfcc_score,
    }
}
