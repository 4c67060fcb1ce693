//! Decoded audio container
//!
//! `AudioSignal` is the single input type of the engine: one or more equal-length
//! channels of `f32` samples at a fixed sample rate. It is validated once on
//! construction and then only borrowed.

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::{mix_channels, ChannelMixMode};

/// Immutable multi-channel sample buffer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Build from per-channel sample vectors
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for an empty channel list, a zero
    /// sample rate or channels of different lengths, and
    /// `AnalysisError::NumericalError` if any sample is NaN or infinite.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, AnalysisError> {
        if channels.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "Audio signal needs at least one channel".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "Invalid sample rate: 0".to_string(),
            ));
        }
        let len = channels[0].len();
        if let Some((idx, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(AnalysisError::InvalidInput(format!(
                "Channel {} has {} samples, expected {}",
                idx,
                ch.len(),
                len
            )));
        }
        for (c, ch) in channels.iter().enumerate() {
            if let Some(pos) = ch.iter().position(|s| !s.is_finite()) {
                return Err(AnalysisError::NumericalError(format!(
                    "Non-finite sample in channel {} at index {}",
                    c, pos
                )));
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel signal
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::new(vec![samples], sample_rate)
    }

    /// Build from interleaved frames (`L R L R ...` for stereo)
    ///
    /// # Errors
    ///
    /// As [`AudioSignal::new`], plus `InvalidInput` when `channel_count` is zero
    /// or does not divide the sample count.
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, AnalysisError> {
        if channel_count == 0 {
            return Err(AnalysisError::InvalidInput(
                "Channel count must be > 0".to_string(),
            ));
        }
        if samples.len() % channel_count != 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                channel_count
            )));
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True when the channels hold no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }

    /// Channel `index`, if present
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(|c| c.as_slice())
    }

    /// All channels
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Left/right pair when the signal has at least two channels
    pub fn stereo_pair(&self) -> Option<(&[f32], &[f32])> {
        match self.channels.as_slice() {
            [left, right, ..] => Some((left.as_slice(), right.as_slice())),
            _ => None,
        }
    }

    /// Average of all channels
    pub fn mono(&self) -> Vec<f32> {
        self.mix(ChannelMixMode::Mono)
    }

    /// Mono mixdown with an explicit mode
    pub fn mix(&self, mode: ChannelMixMode) -> Vec<f32> {
        mix_channels(&self.channels, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_construction() {
        assert!(AudioSignal::new(vec![], 44100).is_err());
        assert!(AudioSignal::new(vec![vec![0.0; 4]], 0).is_err());
        assert!(AudioSignal::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).is_err());
        assert!(matches!(
            AudioSignal::new(vec![vec![0.0, f32::NAN]], 44100),
            Err(AnalysisError::NumericalError(_))
        ));
    }

    #[test]
    fn test_from_interleaved() {
        let signal = AudioSignal::from_interleaved(&[1.0, -1.0, 0.5, -0.5], 2, 48000).unwrap();
        assert_eq!(signal.channel_count(), 2);
        assert_eq!(signal.len(), 2);
        assert_eq!(signal.channel(0).unwrap(), &[1.0, 0.5]);
        assert_eq!(signal.channel(1).unwrap(), &[-1.0, -0.5]);
        assert!(signal.channel(2).is_none());
        assert_eq!(signal.mono(), vec![0.0, 0.0]);

        assert!(AudioSignal::from_interleaved(&[1.0, 2.0, 3.0], 2, 48000).is_err());
    }

    #[test]
    fn test_duration() {
        let signal = AudioSignal::from_mono(vec![0.0; 22050], 44100).unwrap();
        assert!((signal.duration_seconds() - 0.5).abs() < 1e-6);
        assert!(signal.stereo_pair().is_none());
    }
}
