//! Onset detection functions
//!
//! Two per-hop onset functions feed tempo estimation and beat tracking:
//! - Spectral flux (broadband magnitude increase)
//! - Percussive sub-band energy flux (kick and snare/hat regions)
//!
//! Each is min-max normalized and the two are summed into one envelope.
//! Discrete onsets are picked from that envelope with a median + MAD threshold.

pub mod energy_flux;
pub mod spectral_flux;
pub mod threshold;

use crate::dsp::window::{frame_count, SpectralFrame};
use crate::error::AnalysisError;
use energy_flux::{percussive_flux, BandEnergies, PercussiveBands};
use spectral_flux::spectral_flux;

/// MAD multiplier for onset picking
const PICK_MAD_K: f32 = 2.5;

/// Absolute floor for onset picking on the normalized envelope
const PICK_FLOOR: f32 = 0.1;

/// Minimum spacing between picked onsets, in seconds
const PICK_MIN_GAP_SECONDS: f32 = 0.05;

/// Combined onset-strength envelope, one value per hop
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetEnvelope {
    /// Onset strength per frame, in [0, 2]
    pub values: Vec<f32>,
    /// Analysis frame size in samples
    pub frame_size: usize,
    /// Hop size in samples
    pub hop_size: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl OnsetEnvelope {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no frame fits in the input
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time of the centre of frame `index`, in seconds
    pub fn frame_time(&self, index: usize) -> f32 {
        (index * self.hop_size + self.frame_size / 2) as f32 / self.sample_rate.max(1) as f32
    }

    /// Frames per second
    pub fn frame_rate(&self) -> f32 {
        self.sample_rate as f32 / self.hop_size.max(1) as f32
    }

    /// Picked onset frame indices
    pub fn onsets(&self) -> Vec<usize> {
        let min_gap = (PICK_MIN_GAP_SECONDS * self.frame_rate()).ceil().max(1.0) as usize;
        threshold::pick_onsets(&self.values, PICK_MAD_K, PICK_FLOOR, min_gap)
    }

    /// Picked onset times in seconds
    pub fn onset_times(&self) -> Vec<f32> {
        self.onsets().into_iter().map(|i| self.frame_time(i)).collect()
    }
}

/// Scale into [0, 1] by the min and max; a constant input maps to all zeros
pub fn min_max_normalize(values: &mut [f32]) {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        values.fill(0.0);
        return;
    }
    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
}

/// Compute the combined onset envelope of a mono channel
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` is not a power of two
/// or `hop_size` is zero.
pub fn compute_onset_envelope(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Result<OnsetEnvelope, AnalysisError> {
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Hop size must be > 0".to_string(),
        ));
    }
    let mut frame = SpectralFrame::new(frame_size)?;
    let n_frames = frame_count(samples.len(), frame_size, hop_size);

    log::debug!(
        "Computing onset envelope: {} samples, {} frames (frame={}, hop={})",
        samples.len(),
        n_frames,
        frame_size,
        hop_size
    );

    let bands = PercussiveBands::new(frame_size, sample_rate);
    let mut flux = Vec::with_capacity(n_frames);
    let mut percussive = Vec::with_capacity(n_frames);
    let mut previous_mags = vec![0.0f32; frame.bins()];
    let mut previous_energy = BandEnergies::default();

    for idx in 0..n_frames {
        let mags = frame.analyze(samples, idx * hop_size);
        let energy = bands.energies(mags);
        if idx == 0 {
            flux.push(0.0);
            percussive.push(0.0);
        } else {
            flux.push(spectral_flux(&previous_mags, mags));
            percussive.push(percussive_flux(previous_energy, energy));
        }
        previous_mags.copy_from_slice(mags);
        previous_energy = energy;
    }

    min_max_normalize(&mut flux);
    min_max_normalize(&mut percussive);
    let values = flux.iter().zip(&percussive).map(|(f, p)| f + p).collect();

    Ok(OnsetEnvelope {
        values,
        frame_size,
        hop_size,
        sample_rate,
    })
}
