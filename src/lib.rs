//! # Sonic DSP
//!
//! Audio feature extraction and genre classification: tempo, key, spectral
//! band balance, harmonic/percussive separation and a set of production-style
//! detectors feeding a rule-based genre classifier.
//!
//! ## Features
//!
//! - **BPM Detection**: spectral flux plus percussive sub-band flux, FFT
//!   autocorrelation with harmonic consistency and octave normalization
//! - **Beat Tracking**: dynamic-programming beat alignment with downbeat phase
//! - **Key Detection**: Goertzel chroma matched against Krumhansl-Kessler
//!   profiles over all 24 keys
//! - **HPSS**: median-filter harmonic/percussive separation
//! - **Detectors**: sidechain pumping, bass decay, acid lines, reverb tail,
//!   kick distortion, supersaw stacks, vocal presence
//! - **Genre Classification**: ten base genres and 32 electronic sub-genres
//!
//! ## Quick Start
//!
//! ```no_run
//! use sonic_dsp::{analyze_signal, classify_genre_enhanced, AnalysisConfig, AudioSignal};
//!
//! // Stereo samples, one vector per channel
//! let left: Vec<f32> = vec![0.0; 44100 * 10];
//! let right = left.clone();
//! let signal = AudioSignal::new(vec![left, right], 44100)?;
//!
//! let config = AnalysisConfig::default();
//! let features = analyze_signal(&signal, &config)?;
//! println!("BPM: {:.1} (confidence: {:.2})", features.bpm, features.bpm_confidence);
//! println!("Key: {} {}", features.key.root, features.key.scale);
//!
//! let genre = classify_genre_enhanced(&features, &signal, &config);
//! println!("Genre: {} ({})", genre.classification.genre, genre.classification.family);
//! # Ok::<(), sonic_dsp::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! AudioSignal → spectral/temporal primitives → feature extractors → AudioFeatures
//!                                                   ↓
//!                                detectors → genre classifier
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod classify;
pub mod config;
pub mod detectors;
pub mod dsp;
pub mod error;
pub mod features;
pub mod preprocessing;
pub mod signal;

// Re-export main types
pub use analysis::confidence::{compute_confidence, AnalysisConfidence, AnalysisFlag};
pub use analysis::result::{AudioFeatures, BeatGrid, BpmEstimate, Key, KeyDetection, Scale};
pub use classify::{
    classify_genre, classify_genre_enhanced, classify_with_detectors, EnhancedGenreClassification,
    GenreClassification, GenreScore,
};
pub use config::AnalysisConfig;
pub use detectors::{run_detectors, DetectorReport};
pub use dsp::bands::{Dominance, SpectralBand};
pub use error::AnalysisError;
pub use features::hpss::{separate_hpss, HpssResult};
pub use features::pitch::quantize::{quantize_notes, QuantizeGrid, QuantizeSettings};
pub use features::pitch::{detect_notes, DetectedNote};
pub use preprocessing::channel_mixer::ChannelMixMode;
pub use signal::AudioSignal;

use features::beat_tracking::track_beats;
use features::key::detect_key;
use features::mfcc::compute_mfcc;
use features::onset::compute_onset_envelope;
use features::period::estimate_bpm;
use features::spectral::{compute_spectral_summary, crest_factor_db, rms, rms_profile};
use features::stereo::analyze_stereo;

/// Extract the full feature record of a signal
///
/// Runs on the mono mix: tempo, beat grid (if `config.track_beats`), key,
/// spectral summary, loudness and onset statistics. Stereo metrics are added
/// for signals with two or more channels, MFCCs and timbre when enabled.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `config` fails validation.
/// Silent or very short signals are not errors; they yield default values.
///
/// # Example
///
/// ```no_run
/// use sonic_dsp::{analyze_signal, AnalysisConfig, AudioSignal};
///
/// let signal = AudioSignal::from_mono(vec![0.0f32; 44100 * 30], 44100)?;
/// let features = analyze_signal(&signal, &AnalysisConfig::default())?;
/// assert_eq!(features.channel_count, 1);
/// # Ok::<(), sonic_dsp::AnalysisError>(())
/// ```
pub fn analyze_signal(
    signal: &AudioSignal,
    config: &AnalysisConfig,
) -> Result<AudioFeatures, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    config.validate()?;

    let sample_rate = signal.sample_rate();
    let mono = signal.mono();
    let duration_seconds = signal.duration_seconds();

    log::debug!(
        "Starting audio analysis: {} samples x {} channels at {} Hz",
        signal.len(),
        signal.channel_count(),
        sample_rate
    );

    // Tempo and onsets share one envelope
    let envelope = compute_onset_envelope(
        &mono,
        sample_rate,
        config.tempo_frame_size,
        config.tempo_hop_size,
    )?;
    let tempo = estimate_bpm(&envelope, config.min_bpm, config.max_bpm);
    let onset_count = envelope.onsets().len();
    let onset_density = if duration_seconds > 0.0 {
        onset_count as f32 / duration_seconds
    } else {
        0.0
    };

    let beat_grid = if config.track_beats {
        let grid = track_beats(&envelope, tempo.bpm, config.beat_tightness);
        log::debug!("Tracked {} beats", grid.beats.len());
        Some(grid)
    } else {
        None
    };

    let key = detect_key(&mono, sample_rate, config);

    let summary = compute_spectral_summary(
        &mono,
        sample_rate,
        config.frame_size,
        config.hop_size,
        config.max_spectral_frames,
    )?;

    let stereo = if signal.channel_count() >= 2 {
        Some(analyze_stereo(signal))
    } else {
        None
    };

    let mfcc = if config.compute_mfcc {
        Some(compute_mfcc(
            &mono,
            sample_rate,
            config.frame_size,
            config.hop_size,
            config.max_spectral_frames,
        )?)
    } else {
        None
    };

    let features = AudioFeatures {
        bpm: tempo.bpm,
        bpm_confidence: tempo.confidence,
        key,
        spectral_centroid: summary.centroid,
        rms_mean: rms(&mono),
        rms_profile: rms_profile(&mono),
        crest_factor_db: crest_factor_db(&mono),
        onset_count,
        onset_density,
        duration_seconds,
        sample_rate,
        channel_count: signal.channel_count(),
        spectral_bands: summary.bands,
        beat_grid,
        stereo,
        mfcc,
        timbre: config.compute_timbre.then_some(summary.timbre),
    };

    log::debug!(
        "Analysis complete in {:.1} ms: {:.1} BPM, key {}, {} onsets",
        start_time.elapsed().as_secs_f32() * 1000.0,
        features.bpm,
        features.key.key.name(),
        features.onset_count
    );

    Ok(features)
}

/// Analyze mono samples
///
/// Wraps `samples` in an [`AudioSignal`] and runs [`analyze_signal`].
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero sample rate or an invalid
/// configuration.
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<AudioFeatures, AnalysisError> {
    let signal = AudioSignal::from_mono(samples.to_vec(), sample_rate)?;
    analyze_signal(&signal, config)
}
