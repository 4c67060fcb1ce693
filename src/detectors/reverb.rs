//! Reverb tail estimation (RT60)
//!
//! Transients are found on a 10 ms RMS envelope with a running-average
//! threshold; the dB decay after each one is fitted with a least-squares line
//! and extrapolated to a 60 dB drop.

use serde::{Deserialize, Serialize};

use super::mean_and_cv;
use crate::dsp::filter::{amplitude_to_db, block_rms, envelope_block_size};

/// Envelope rate (10 ms blocks)
const ENVELOPE_RATE_HZ: f32 = 100.0;

/// Running-average length in envelope blocks
const AVERAGE_BLOCKS: usize = 50;

/// A transient exceeds this multiple of the running average
const TRANSIENT_RATIO: f32 = 2.0;

/// Running-average floor
const AVERAGE_FLOOR: f32 = 0.001;

/// Minimum spacing between transients, in blocks
const MIN_TRANSIENT_GAP: usize = 10;

/// Longest decay fitted, in seconds
const MAX_DECAY_SECONDS: f32 = 2.0;

const DB_FLOOR: f32 = -100.0;

/// Longest RT60 reported, in seconds
const MAX_RT60: f32 = 10.0;

/// RT60 above which a mix is called wet, in seconds
pub const WET_RT60: f32 = 0.5;

/// Reverb analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverbResult {
    /// Mean estimated RT60 in seconds (0 when no decay could be fitted)
    pub rt60: f32,
    /// `rt60 > 0.5`
    pub is_wet: bool,
    /// Confidence in [0, 1] from the number and agreement of the fits
    pub confidence: f32,
    /// Transients with a usable decay fit
    pub transient_count: usize,
}

fn find_transients(envelope: &[f32]) -> Vec<usize> {
    let mut transients: Vec<usize> = Vec::new();
    let mut window_sum = 0.0f32;
    for i in 0..envelope.len() {
        let count = i.min(AVERAGE_BLOCKS);
        let average = if count > 0 {
            (window_sum / count as f32).max(AVERAGE_FLOOR)
        } else {
            AVERAGE_FLOOR
        };
        let rising = i > 0 && envelope[i] > envelope[i - 1];
        if rising
            && envelope[i] > TRANSIENT_RATIO * average
            && transients.last().is_none_or(|&t| i - t >= MIN_TRANSIENT_GAP)
        {
            transients.push(i);
        }
        window_sum += envelope[i];
        if i >= AVERAGE_BLOCKS {
            window_sum -= envelope[i - AVERAGE_BLOCKS];
        }
    }
    transients
}

/// Least-squares slope of `ys` against `xs`
fn regression_slope(xs: &[f32], ys: &[f32]) -> Option<f32> {
    let n = xs.len() as f32;
    let mean_x = xs.iter().sum::<f32>() / n;
    let mean_y = ys.iter().sum::<f32>() / n;
    let mut num = 0.0f32;
    let mut den = 0.0f32;
    for (x, y) in xs.iter().zip(ys) {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x) * (x - mean_x);
    }
    (den > 0.0).then(|| num / den)
}

/// Estimate RT60 from the decays that follow transients
pub fn detect_reverb(samples: &[f32], sample_rate: u32) -> ReverbResult {
    if samples.is_empty() || sample_rate == 0 {
        return ReverbResult::default();
    }
    let block = envelope_block_size(sample_rate, ENVELOPE_RATE_HZ);
    let block_seconds = block as f32 / sample_rate as f32;
    let envelope = block_rms(samples, block);
    let transients = find_transients(&envelope);
    log::debug!("Reverb detection: {} transients", transients.len());

    let max_blocks = (MAX_DECAY_SECONDS / block_seconds) as usize;
    let mut estimates = Vec::new();
    for (idx, &start) in transients.iter().enumerate() {
        // Climb to the local peak
        let mut peak = start;
        while peak + 1 < envelope.len() && envelope[peak + 1] > envelope[peak] {
            peak += 1;
        }
        let next = transients.get(idx + 1).copied().unwrap_or(envelope.len());
        let end = next.min(peak + max_blocks).min(envelope.len());

        let peak_db = amplitude_to_db(envelope[peak], DB_FLOOR);
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (offset, &level) in envelope[peak..end].iter().enumerate() {
            let db = amplitude_to_db(level, DB_FLOOR);
            if db <= peak_db - 60.0 || db <= DB_FLOOR {
                break;
            }
            xs.push(offset as f32 * block_seconds);
            ys.push(db);
        }
        if xs.len() < 3 {
            continue;
        }
        if let Some(slope) = regression_slope(&xs, &ys) {
            if slope < 0.0 {
                estimates.push((-60.0 / slope).abs().min(MAX_RT60));
            }
        }
    }

    let Some((rt60, cv)) = mean_and_cv(&estimates) else {
        return ReverbResult::default();
    };
    let agreement = (1.0 - cv).clamp(0.0, 1.0);
    let confidence = (agreement * (estimates.len() as f32 / 5.0).min(1.0)).clamp(0.0, 1.0);

    ReverbResult {
        rt60,
        is_wet: rt60 > WET_RT60,
        confidence,
        transient_count: estimates.len(),
    }
}
