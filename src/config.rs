//! Configuration parameters for audio analysis

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Analysis configuration parameters
///
/// Every frame cap in here is a time/quality tradeoff, not a correctness
/// requirement: raising it costs memory and latency, lowering it costs
/// resolution on long tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // STFT parameters (spectral summary, bands, timbre)
    /// Frame size for spectral summary FFTs (default: 2048)
    pub frame_size: usize,

    /// Hop size for spectral summary FFTs (default: 512)
    pub hop_size: usize,

    /// Maximum number of frames used by the spectral summary (default: 2000).
    /// Longer tracks are subsampled evenly.
    pub max_spectral_frames: usize,

    // BPM detection
    /// Analysis frame for onset functions (default: 1024)
    pub tempo_frame_size: usize,

    /// Hop for onset functions (default: 512)
    pub tempo_hop_size: usize,

    /// Minimum BPM considered by the autocorrelation (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM considered by the autocorrelation (default: 200.0)
    pub max_bpm: f32,

    // Beat tracking
    /// Tempo-drift penalty λ of the dynamic-programming tracker (default: 100.0)
    pub beat_tightness: f32,

    /// Run the beat tracker during `analyze_signal` (default: true)
    pub track_beats: bool,

    // Key detection
    /// Goertzel frame length in samples (default: 4096)
    pub key_frame_size: usize,

    /// Maximum number of sampled key frames (default: 180)
    pub key_max_frames: usize,

    // HPSS
    /// HPSS STFT frame size (default: 2048)
    pub hpss_frame_size: usize,

    /// HPSS STFT hop (default: 512)
    pub hpss_hop_size: usize,

    /// Maximum HPSS spectrogram frames (default: 4000)
    pub hpss_max_frames: usize,

    /// Median kernel across time for the harmonic estimate, in frames (default: 17)
    pub hpss_harmonic_kernel: usize,

    /// Median kernel across frequency for the percussive estimate, in bins (default: 17)
    pub hpss_percussive_kernel: usize,

    // Extended features
    /// Populate the MFCC slot of `AudioFeatures` (default: true)
    pub compute_mfcc: bool,

    /// Populate the timbre slot of `AudioFeatures` (default: true)
    pub compute_timbre: bool,

    /// Maximum frames used by the pitch tracker (default: 400)
    pub pitch_max_frames: usize,

    /// Run the enhanced classifier's detectors on the rayon pool (default: true)
    pub parallel_detectors: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            max_spectral_frames: 2000,
            tempo_frame_size: 1024,
            tempo_hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            beat_tightness: 100.0,
            track_beats: true,
            key_frame_size: 4096,
            key_max_frames: 180,
            hpss_frame_size: 2048,
            hpss_hop_size: 512,
            hpss_max_frames: 4000,
            hpss_harmonic_kernel: 17,
            hpss_percussive_kernel: 17,
            compute_mfcc: true,
            compute_timbre: true,
            pitch_max_frames: 400,
            parallel_detectors: true,
        }
    }
}

impl AnalysisConfig {
    /// Check that sizes are usable by the FFT and that ranges are ordered
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, size) in [
            ("frame_size", self.frame_size),
            ("tempo_frame_size", self.tempo_frame_size),
            ("hpss_frame_size", self.hpss_frame_size),
        ] {
            if size < 4 || !size.is_power_of_two() {
                return Err(AnalysisError::InvalidInput(format!(
                    "{} must be a power of two >= 4, got {}",
                    name, size
                )));
            }
        }

        for (name, hop, frame) in [
            ("hop_size", self.hop_size, self.frame_size),
            ("tempo_hop_size", self.tempo_hop_size, self.tempo_frame_size),
            ("hpss_hop_size", self.hpss_hop_size, self.hpss_frame_size),
        ] {
            if hop == 0 || hop > frame {
                return Err(AnalysisError::InvalidInput(format!(
                    "{} must be in 1..={}, got {}",
                    name, frame, hop
                )));
            }
        }

        if self.key_frame_size == 0 {
            return Err(AnalysisError::InvalidInput(
                "key_frame_size must be > 0".to_string(),
            ));
        }

        if self.min_bpm <= 0.0 || self.max_bpm <= self.min_bpm {
            return Err(AnalysisError::InvalidInput(format!(
                "Invalid BPM range: [{:.1}, {:.1}]",
                self.min_bpm, self.max_bpm
            )));
        }

        if self.hpss_harmonic_kernel == 0 || self.hpss_percussive_kernel == 0 {
            return Err(AnalysisError::InvalidInput(
                "HPSS median kernels must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        let config = AnalysisConfig {
            frame_size: 1000,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_bpm_range() {
        let config = AnalysisConfig {
            min_bpm: 180.0,
            max_bpm: 60.0,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_override() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "key_max_frames": 32, "parallel_detectors": false }"#)
                .unwrap();
        assert_eq!(config.key_max_frames, 32);
        assert!(!config.parallel_detectors);
        assert_eq!(config.hpss_max_frames, 4000);
    }
}
