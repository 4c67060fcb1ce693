//! Beat tracking
//!
//! Dynamic-programming beat alignment on the onset envelope (Ellis 2007).
//! For every frame `i`
//!
//! ```text
//! score[i] = onset[i] + max_{j ∈ [i - maxStep, i - minStep]} (score[j] - λ·log2((i - j) / P)²)
//! ```
//!
//! with `P` the ideal beat period in frames and step bounds at ±20 % of `P`.
//! The path is backtracked from the best-scoring frame in the last two beat
//! periods. Downbeats are the phase (of four) whose beats carry the most
//! onset energy.
//!
//! # Reference
//!
//! Ellis, D. P. W. (2007). Beat Tracking by Dynamic Programming.
//! *Journal of New Music Research*, 36(1), 51-60.

use crate::analysis::result::BeatGrid;
use crate::features::onset::OnsetEnvelope;

/// Beats per bar assumed for downbeat phase selection
pub const BEATS_PER_BAR: usize = 4;

/// Track beats through an onset envelope at a known tempo
///
/// Fewer than four envelope frames or a non-positive tempo yield an empty grid.
pub fn track_beats(envelope: &OnsetEnvelope, bpm: f32, tightness: f32) -> BeatGrid {
    let n = envelope.len();
    let empty = BeatGrid {
        bpm,
        ..BeatGrid::default()
    };
    if n < 4 || !(bpm > 0.0) || !bpm.is_finite() {
        log::warn!("Beat tracking skipped: {} frames at {:.1} BPM", n, bpm);
        return empty;
    }

    let period = 60.0 * envelope.frame_rate() / bpm;
    if !(period >= 1.0) {
        return empty;
    }

    log::debug!(
        "Tracking beats: {} frames, period {:.2} frames, tightness {:.1}",
        n,
        period,
        tightness
    );

    // Normalize onset strength by its maximum
    let peak = envelope.values.iter().copied().fold(0.0f32, f32::max);
    let onset: Vec<f32> = if peak > 0.0 {
        envelope.values.iter().map(|v| v / peak).collect()
    } else {
        vec![0.0; n]
    };

    let path = dp_beat_path(&onset, period, tightness);
    let beats: Vec<f32> = path.iter().map(|&i| envelope.frame_time(i)).collect();

    let downbeat_phase = best_downbeat_phase(&path, &onset);
    let downbeats = beats
        .iter()
        .enumerate()
        .filter(|(k, _)| k % BEATS_PER_BAR == downbeat_phase)
        .map(|(_, &t)| t)
        .collect();

    BeatGrid {
        beats,
        downbeats,
        downbeat_phase,
        bpm,
    }
}

/// Frame indices of the best beat path, in ascending order
fn dp_beat_path(onset: &[f32], period: f32, tightness: f32) -> Vec<usize> {
    let n = onset.len();
    let min_step = ((0.8 * period).round() as usize).max(1);
    let max_step = ((1.2 * period).round() as usize).max(min_step);

    // Transition penalty per step size
    let penalty: Vec<f32> = (0..=max_step)
        .map(|step| {
            if step < min_step {
                0.0
            } else {
                let r = (step as f32 / period).log2();
                tightness * r * r
            }
        })
        .collect();

    let mut score = vec![0.0f32; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        let mut best: Option<(usize, f32)> = None;
        if i >= min_step {
            let lo = i.saturating_sub(max_step);
            for j in lo..=i - min_step {
                let candidate = score[j] - penalty[i - j];
                if best.is_none_or(|(_, s)| candidate > s) {
                    best = Some((j, candidate));
                }
            }
        }
        match best {
            Some((j, s)) if s > 0.0 => {
                score[i] = onset[i] + s;
                backlink[i] = Some(j);
            }
            _ => score[i] = onset[i],
        }
    }

    // Backtrack from the best frame within the last two periods
    let tail = ((2.0 * period).round() as usize).clamp(1, n);
    let mut current = (n - tail..n)
        .max_by(|&a, &b| {
            score[a]
                .partial_cmp(&score[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(n - 1);

    let mut path = vec![current];
    while let Some(prev) = backlink[current] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

fn best_downbeat_phase(path: &[usize], onset: &[f32]) -> usize {
    let mut energy = [0.0f32; BEATS_PER_BAR];
    for (k, &frame) in path.iter().enumerate() {
        energy[k % BEATS_PER_BAR] += onset[frame];
    }
    energy
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (phase, &e)| {
            if e > best.1 {
                (phase, e)
            } else {
                best
            }
        })
        .0
}
