//! YIN fundamental frequency estimation
//!
//! # Reference
//!
//! de Cheveigné, A., & Kawahara, H. (2002). YIN, a fundamental frequency estimator
//! for speech and music. *Journal of the Acoustical Society of America*, 111(4), 1917-1930.

use crate::features::period::peak_picking::parabolic_offset;

/// Absolute threshold on the cumulative mean normalized difference
pub const YIN_THRESHOLD: f32 = 0.15;

/// Lowest frequency searched, in Hz
pub const MIN_FREQUENCY: f32 = 80.0;

/// Highest frequency searched, in Hz
pub const MAX_FREQUENCY: f32 = 2000.0;

/// Frames quieter than this RMS are reported unvoiced
pub const SILENCE_RMS: f32 = 0.01;

/// Pitch estimate of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz
    pub frequency: f32,
    /// `1 - d'(τ)` at the chosen lag, in [0, 1]
    pub confidence: f32,
}

/// Estimate the fundamental of one frame; `None` when unvoiced or silent
///
/// The lag search spans [`MAX_FREQUENCY`] down to [`MIN_FREQUENCY`] and is
/// limited so that the comparison window keeps at least half the frame.
pub fn yin_pitch(frame: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
    let n = frame.len();
    if n < 8 || sample_rate == 0 {
        return None;
    }
    let energy: f32 = frame.iter().map(|x| x * x).sum();
    if (energy / n as f32).sqrt() < SILENCE_RMS {
        return None;
    }

    let sr = sample_rate as f32;
    let tau_min = ((sr / MAX_FREQUENCY).floor() as usize).max(2);
    let tau_max = ((sr / MIN_FREQUENCY).ceil() as usize).min(n / 2);
    if tau_min + 2 >= tau_max {
        return None;
    }
    let window = n - tau_max;

    // Difference function
    let mut diff = vec![0.0f32; tau_max + 1];
    for (tau, slot) in diff.iter_mut().enumerate().skip(1) {
        *slot = (0..window)
            .map(|j| {
                let d = frame[j] - frame[j + tau];
                d * d
            })
            .sum();
    }

    // Cumulative mean normalized difference
    let mut cmnd = vec![1.0f32; tau_max + 1];
    let mut running = 0.0f32;
    for tau in 1..=tau_max {
        running += diff[tau];
        cmnd[tau] = if running > 0.0 {
            diff[tau] * tau as f32 / running
        } else {
            1.0
        };
    }

    // First dip below the threshold, followed to its local minimum
    let mut tau = tau_min;
    let mut found = None;
    while tau < tau_max {
        if cmnd[tau] < YIN_THRESHOLD {
            while tau + 1 < tau_max && cmnd[tau + 1] < cmnd[tau] {
                tau += 1;
            }
            found = Some(tau);
            break;
        }
        tau += 1;
    }
    let tau = found?;

    let refined = if tau > 1 && tau + 1 <= tau_max {
        tau as f32 + parabolic_offset(cmnd[tau - 1], cmnd[tau], cmnd[tau + 1])
    } else {
        tau as f32
    };
    if refined <= 0.0 {
        return None;
    }

    Some(PitchEstimate {
        frequency: sr / refined,
        confidence: (1.0 - cmnd[tau]).clamp(0.0, 1.0),
    })
}
