//! Analysis result types

use serde::{Deserialize, Serialize};

use crate::dsp::bands::{find_band, SpectralBand, DB_FLOOR};
use crate::features::mfcc::MfccFeatures;
use crate::features::spectral::TimbreFeatures;
use crate::features::stereo::StereoMetrics;

/// Pitch-class names, sharps only
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// Circle of fifths order, major and relative minor
const CIRCLE_OF_FIFTHS_MAJOR: [u32; 12] = [0, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10, 5];
const CIRCLE_OF_FIFTHS_MINOR: [u32; 12] = [9, 4, 11, 6, 1, 8, 3, 10, 5, 0, 7, 2];

/// Mode of a detected key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    /// Major (Ionian)
    Major,
    /// Natural minor (Aeolian)
    Minor,
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scale::Major => write!(f, "Major"),
            Scale::Minor => write!(f, "Minor"),
        }
    }
}

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Key from a pitch class and scale
    pub fn new(pitch_class: u32, scale: Scale) -> Self {
        match scale {
            Scale::Major => Key::Major(pitch_class % 12),
            Scale::Minor => Key::Minor(pitch_class % 12),
        }
    }

    /// Tonic pitch class (0 = C)
    pub fn pitch_class(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// Scale of the key
    pub fn scale(&self) -> Scale {
        match self {
            Key::Major(_) => Scale::Major,
            Key::Minor(_) => Scale::Minor,
        }
    }

    /// Tonic note name without the mode suffix ("A", "F#")
    pub fn root(&self) -> &'static str {
        NOTE_NAMES[self.pitch_class() as usize]
    }

    /// Get key name in musical notation (e.g., "C", "Am", "F#", "D#m")
    ///
    /// # Example
    ///
    /// ```
    /// use sonic_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C");
    /// assert_eq!(Key::Major(6).name(), "F#");
    /// assert_eq!(Key::Minor(9).name(), "Am");
    /// assert_eq!(Key::Minor(1).name(), "C#m");
    /// ```
    pub fn name(&self) -> String {
        match self {
            Key::Major(_) => self.root().to_string(),
            Key::Minor(_) => format!("{}m", self.root()),
        }
    }

    /// Key in DJ numerical notation ("1A".."12A" major, "1B".."12B" minor)
    ///
    /// Numbers step up a fifth; a minor key shares the number of its relative
    /// major.
    ///
    /// ```
    /// use sonic_dsp::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).numerical(), "1A");   // C
    /// assert_eq!(Key::Major(7).numerical(), "2A");   // G
    /// assert_eq!(Key::Minor(9).numerical(), "1B");   // Am
    /// ```
    pub fn numerical(&self) -> String {
        let pc = self.pitch_class();
        let (table, suffix) = match self {
            Key::Major(_) => (&CIRCLE_OF_FIFTHS_MAJOR, 'A'),
            Key::Minor(_) => (&CIRCLE_OF_FIFTHS_MINOR, 'B'),
        };
        let position = table.iter().position(|&x| x == pc).unwrap_or(0);
        format!("{}{}", position + 1, suffix)
    }

    /// Parse DJ numerical notation; `None` for anything malformed
    pub fn from_numerical(notation: &str) -> Option<Self> {
        if notation.len() < 2 || !notation.is_ascii() {
            return None;
        }
        let (num_str, suffix) = notation.split_at(notation.len() - 1);
        let num: usize = num_str.parse().ok()?;
        if !(1..=12).contains(&num) {
            return None;
        }
        match suffix {
            "A" => Some(Key::Major(CIRCLE_OF_FIFTHS_MAJOR[num - 1])),
            "B" => Some(Key::Minor(CIRCLE_OF_FIFTHS_MINOR[num - 1])),
            _ => None,
        }
    }
}

/// Output of key detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDetection {
    /// Detected key
    pub key: Key,
    /// Tonic name ("A", "F#")
    pub root: String,
    /// Major or minor
    pub scale: Scale,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl KeyDetection {
    /// Wrap a key with its confidence
    pub fn new(key: Key, confidence: f32) -> Self {
        Self {
            key,
            root: key.root().to_string(),
            scale: key.scale(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Tempo estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmEstimate {
    /// Tempo in beats per minute, rounded to 0.1
    pub bpm: f32,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl BpmEstimate {
    /// Returned when the input cannot support an estimate
    pub const FALLBACK: BpmEstimate = BpmEstimate {
        bpm: 120.0,
        confidence: 0.0,
    };
}

/// Beat grid structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatGrid {
    /// All beat times in seconds
    pub beats: Vec<f32>,

    /// Downbeat times (beat 1 of each bar) in seconds
    pub downbeats: Vec<f32>,

    /// Index in 0..4 of the first downbeat within `beats`
    pub downbeat_phase: usize,

    /// Tempo the grid was tracked at
    pub bpm: f32,
}

impl BeatGrid {
    /// Mean inter-beat interval in seconds, if at least two beats exist
    pub fn mean_interval(&self) -> Option<f32> {
        if self.beats.len() < 2 {
            return None;
        }
        let span = self.beats[self.beats.len() - 1] - self.beats[0];
        Some(span / (self.beats.len() - 1) as f32)
    }
}

/// Complete feature record of one signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// BPM estimate
    pub bpm: f32,

    /// BPM confidence (0.0-1.0)
    pub bpm_confidence: f32,

    /// Detected key
    pub key: KeyDetection,

    /// Mean spectral centroid in Hz
    pub spectral_centroid: f32,

    /// Mean RMS level
    pub rms_mean: f32,

    /// RMS over consecutive windows, for loudness curves
    pub rms_profile: Vec<f32>,

    /// Peak-to-RMS ratio in dB
    pub crest_factor_db: f32,

    /// Number of picked onsets
    pub onset_count: usize,

    /// Onsets per second
    pub onset_density: f32,

    /// Duration in seconds
    pub duration_seconds: f32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count of the analysed signal
    pub channel_count: usize,

    /// The seven band summaries, low to high
    pub spectral_bands: Vec<SpectralBand>,

    /// Beat grid, when beat tracking ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_grid: Option<BeatGrid>,

    /// Stereo image metrics, for signals with two or more channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereo: Option<StereoMetrics>,

    /// Mean MFCCs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfcc: Option<MfccFeatures>,

    /// Timbre descriptors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timbre: Option<TimbreFeatures>,
}

impl AudioFeatures {
    /// Band by name
    pub fn band(&self, name: &str) -> Option<&SpectralBand> {
        find_band(&self.spectral_bands, name)
    }

    /// Average level of the "Sub Bass" band, or the dB floor when absent
    pub fn sub_bass_db(&self) -> f32 {
        self.band("Sub Bass").map(|b| b.avg_db).unwrap_or(DB_FLOOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name() {
        assert_eq!(Key::Major(0).name(), "C");
        assert_eq!(Key::Major(11).name(), "B");
        assert_eq!(Key::Minor(2).name(), "Dm");
        assert_eq!(Key::Minor(9).root(), "A");
        assert_eq!(Key::new(21, Scale::Minor), Key::Minor(9));
    }

    #[test]
    fn test_key_numerical() {
        assert_eq!(Key::Major(9).numerical(), "4A");
        assert_eq!(Key::Major(5).numerical(), "12A");
        assert_eq!(Key::Minor(4).numerical(), "2B");
        assert_eq!(Key::Minor(2).numerical(), "12B");
    }

    #[test]
    fn test_key_from_numerical() {
        assert_eq!(Key::from_numerical("7A"), Some(Key::Major(6)));
        assert_eq!(Key::from_numerical("10B"), Some(Key::Minor(0)));
        assert_eq!(Key::from_numerical("0A"), None);
        assert_eq!(Key::from_numerical("13A"), None);
        assert_eq!(Key::from_numerical("1C"), None);
        assert_eq!(Key::from_numerical(""), None);
        assert_eq!(Key::from_numerical("A"), None);
    }

    #[test]
    fn test_numerical_roundtrip() {
        for i in 0..12 {
            for key in [Key::Major(i), Key::Minor(i)] {
                assert_eq!(Key::from_numerical(&key.numerical()), Some(key));
            }
        }
    }

    #[test]
    fn test_key_detection_clamps() {
        let det = KeyDetection::new(Key::Minor(9), 1.7);
        assert_eq!(det.root, "A");
        assert_eq!(det.scale, Scale::Minor);
        assert_eq!(det.confidence, 1.0);
    }

    #[test]
    fn test_beat_grid_interval() {
        let grid = BeatGrid {
            beats: vec![0.0, 0.5, 1.0, 1.5],
            ..BeatGrid::default()
        };
        assert!((grid.mean_interval().unwrap() - 0.5).abs() < 1e-6);
        assert!(BeatGrid::default().mean_interval().is_none());
    }
}
