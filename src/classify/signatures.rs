//! Genre signature tables
//!
//! Every signature is a set of `[min, max]` ranges over the classifier's
//! dimensions. Tempo accepts several ranges because the tempo estimator folds
//! fast tempos into 70–160 BPM (174 BPM drum & bass reads as 87).

/// Closed value range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

macro_rules! r {
    ($min:expr, $max:expr) => {
        Range {
            min: $min,
            max: $max,
        }
    };
}

/// Base signature over the five spectral/rhythmic dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreSignature {
    /// Genre id
    pub genre: &'static str,
    /// Genre family
    pub family: &'static str,
    /// Accepted tempo ranges; the best-matching one scores
    pub bpm: &'static [Range],
    /// Sub-bass band average in dB
    pub sub_bass_db: Range,
    /// Crest factor in dB
    pub crest_factor_db: Range,
    /// Onsets per second
    pub onset_density: Range,
    /// Spectral centroid in Hz
    pub centroid_hz: Range,
}

/// Sub-genre signature with the production-detector dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancedSignature {
    /// The five base dimensions
    pub base: GenreSignature,
    /// Sidechain strength
    pub sidechain: Range,
    /// Bass decay time in ms
    pub bass_decay_ms: Range,
    /// RT60 in seconds, for reverb-sensitive genres
    pub rt60: Option<Range>,
    /// Kick THD, for distortion-sensitive genres
    pub kick_thd: Option<Range>,
}

/// Genre families
pub mod family {
    #![allow(missing_docs)]
    pub const HOUSE: &str = "house";
    pub const TECHNO: &str = "techno";
    pub const TRANCE: &str = "trance";
    pub const DNB: &str = "dnb";
    pub const BASS: &str = "bass";
    pub const HARDCORE: &str = "hardcore";
    pub const BREAKS: &str = "breaks";
    pub const CHILL: &str = "chill";
    pub const HIPHOP: &str = "hiphop";
    pub const AMBIENT: &str = "ambient";
    pub const ROCK: &str = "rock";
    pub const POP: &str = "pop";
    pub const CLASSICAL: &str = "classical";
}

const fn base(
    genre: &'static str,
    family: &'static str,
    bpm: &'static [Range],
    sub_bass_db: Range,
    crest_factor_db: Range,
    onset_density: Range,
    centroid_hz: Range,
) -> GenreSignature {
    GenreSignature {
        genre,
        family,
        bpm,
        sub_bass_db,
        crest_factor_db,
        onset_density,
        centroid_hz,
    }
}

/// The ten base genres
pub static BASE_SIGNATURES: [GenreSignature; 10] = [
    base("hiphop", family::HIPHOP, &[r!(80.0, 100.0)], r!(-25.0, -5.0), r!(6.0, 12.0), r!(1.0, 4.0), r!(800.0, 2500.0)),
    base("house", family::HOUSE, &[r!(118.0, 130.0)], r!(-30.0, -10.0), r!(6.0, 11.0), r!(3.0, 8.0), r!(1500.0, 3500.0)),
    base("techno", family::TECHNO, &[r!(125.0, 145.0)], r!(-30.0, -10.0), r!(5.0, 10.0), r!(4.0, 10.0), r!(1500.0, 4000.0)),
    base("trance", family::TRANCE, &[r!(128.0, 145.0)], r!(-35.0, -15.0), r!(5.0, 10.0), r!(3.0, 8.0), r!(2000.0, 4500.0)),
    base("dnb", family::DNB, &[r!(160.0, 180.0), r!(80.0, 90.0)], r!(-30.0, -5.0), r!(6.0, 12.0), r!(6.0, 14.0), r!(1500.0, 4000.0)),
    base("dubstep", family::BASS, &[r!(135.0, 145.0), r!(68.0, 73.0)], r!(-25.0, -5.0), r!(5.0, 10.0), r!(2.0, 6.0), r!(1000.0, 3000.0)),
    base("ambient", family::AMBIENT, &[r!(60.0, 100.0)], r!(-60.0, -30.0), r!(10.0, 20.0), r!(0.0, 1.5), r!(500.0, 2500.0)),
    base("rock", family::ROCK, &[r!(100.0, 150.0)], r!(-45.0, -25.0), r!(10.0, 16.0), r!(3.0, 8.0), r!(2000.0, 4500.0)),
    base("pop", family::POP, &[r!(95.0, 125.0)], r!(-40.0, -20.0), r!(8.0, 14.0), r!(2.0, 6.0), r!(1500.0, 3500.0)),
    base("classical", family::CLASSICAL, &[r!(60.0, 120.0)], r!(-70.0, -40.0), r!(14.0, 24.0), r!(0.5, 3.0), r!(800.0, 2500.0)),
];

#[allow(clippy::too_many_arguments)]
const fn sub(
    genre: &'static str,
    family: &'static str,
    bpm: &'static [Range],
    sub_bass_db: Range,
    crest_factor_db: Range,
    onset_density: Range,
    centroid_hz: Range,
    sidechain: Range,
    bass_decay_ms: Range,
    rt60: Option<Range>,
    kick_thd: Option<Range>,
) -> EnhancedSignature {
    EnhancedSignature {
        base: base(genre, family, bpm, sub_bass_db, crest_factor_db, onset_density, centroid_hz),
        sidechain,
        bass_decay_ms,
        rt60,
        kick_thd,
    }
}

/// Electronic sub-genres for the enhanced classifier
pub static ENHANCED_SIGNATURES: [EnhancedSignature; 32] = [
    // House
    sub("deep-house", family::HOUSE, &[r!(118.0, 124.0)], r!(-30.0, -12.0), r!(7.0, 12.0), r!(3.0, 7.0), r!(1000.0, 2500.0),
        r!(0.2, 0.6), r!(150.0, 400.0), Some(r!(0.6, 1.5)), None),
    sub("tech-house", family::HOUSE, &[r!(124.0, 128.0)], r!(-28.0, -10.0), r!(6.0, 10.0), r!(4.0, 9.0), r!(1500.0, 3000.0),
        r!(0.2, 0.6), r!(80.0, 200.0), None, None),
    sub("progressive-house", family::HOUSE, &[r!(126.0, 130.0)], r!(-30.0, -12.0), r!(6.0, 10.0), r!(3.0, 8.0), r!(2000.0, 3500.0),
        r!(0.3, 0.8), r!(150.0, 350.0), Some(r!(0.8, 2.0)), None),
    sub("bass-house", family::HOUSE, &[r!(124.0, 128.0)], r!(-22.0, -5.0), r!(5.0, 9.0), r!(4.0, 9.0), r!(1500.0, 3500.0),
        r!(0.3, 0.8), r!(150.0, 400.0), None, Some(r!(0.1, 0.5))),
    sub("future-house", family::HOUSE, &[r!(122.0, 128.0)], r!(-25.0, -8.0), r!(6.0, 10.0), r!(3.0, 8.0), r!(2000.0, 4000.0),
        r!(0.4, 0.9), r!(100.0, 250.0), None, None),
    // Techno
    sub("minimal-techno", family::TECHNO, &[r!(124.0, 130.0)], r!(-30.0, -12.0), r!(7.0, 12.0), r!(3.0, 7.0), r!(1000.0, 2500.0),
        r!(0.0, 0.3), r!(50.0, 150.0), None, None),
    sub("peak-time-techno", family::TECHNO, &[r!(130.0, 140.0)], r!(-25.0, -8.0), r!(5.0, 9.0), r!(4.0, 9.0), r!(1500.0, 3500.0),
        r!(0.1, 0.4), r!(80.0, 200.0), None, Some(r!(0.05, 0.3))),
    sub("industrial-techno", family::TECHNO, &[r!(135.0, 150.0)], r!(-25.0, -8.0), r!(4.0, 8.0), r!(5.0, 10.0), r!(2500.0, 5000.0),
        r!(0.0, 0.3), r!(80.0, 200.0), None, Some(r!(0.2, 1.0))),
    sub("acid-techno", family::TECHNO, &[r!(130.0, 145.0)], r!(-28.0, -10.0), r!(5.0, 10.0), r!(5.0, 10.0), r!(1500.0, 3500.0),
        r!(0.0, 0.3), r!(80.0, 200.0), None, None),
    sub("hard-techno", family::TECHNO, &[r!(145.0, 160.0)], r!(-22.0, -5.0), r!(4.0, 8.0), r!(6.0, 12.0), r!(2000.0, 4500.0),
        r!(0.0, 0.3), r!(50.0, 150.0), None, Some(r!(0.2, 1.0))),
    sub("dub-techno", family::TECHNO, &[r!(118.0, 128.0)], r!(-30.0, -12.0), r!(7.0, 12.0), r!(2.0, 6.0), r!(800.0, 2000.0),
        r!(0.1, 0.4), r!(150.0, 400.0), Some(r!(1.0, 3.0)), None),
    // Trance
    sub("uplifting-trance", family::TRANCE, &[r!(136.0, 140.0)], r!(-30.0, -12.0), r!(5.0, 9.0), r!(3.0, 8.0), r!(2500.0, 4500.0),
        r!(0.4, 0.9), r!(100.0, 250.0), Some(r!(1.0, 2.5)), None),
    sub("psytrance", family::TRANCE, &[r!(140.0, 148.0)], r!(-25.0, -8.0), r!(5.0, 9.0), r!(6.0, 12.0), r!(2000.0, 4500.0),
        r!(0.2, 0.6), r!(30.0, 100.0), None, None),
    sub("progressive-trance", family::TRANCE, &[r!(128.0, 134.0)], r!(-30.0, -12.0), r!(6.0, 10.0), r!(3.0, 8.0), r!(2000.0, 4000.0),
        r!(0.3, 0.7), r!(100.0, 250.0), Some(r!(0.8, 2.0)), None),
    sub("hard-trance", family::TRANCE, &[r!(145.0, 155.0)], r!(-25.0, -8.0), r!(4.0, 8.0), r!(5.0, 10.0), r!(2500.0, 4500.0),
        r!(0.3, 0.7), r!(80.0, 200.0), None, Some(r!(0.1, 0.5))),
    // Drum & bass
    sub("liquid-dnb", family::DNB, &[r!(170.0, 176.0), r!(85.0, 88.0)], r!(-30.0, -10.0), r!(7.0, 12.0), r!(5.0, 10.0), r!(1500.0, 3000.0),
        r!(0.0, 0.3), r!(150.0, 400.0), Some(r!(0.6, 1.8)), None),
    sub("neurofunk", family::DNB, &[r!(172.0, 176.0), r!(86.0, 88.0)], r!(-22.0, -5.0), r!(5.0, 9.0), r!(7.0, 14.0), r!(2000.0, 4500.0),
        r!(0.0, 0.3), r!(200.0, 600.0), None, Some(r!(0.1, 0.6))),
    sub("jump-up", family::DNB, &[r!(172.0, 176.0), r!(86.0, 88.0)], r!(-20.0, -5.0), r!(5.0, 9.0), r!(6.0, 12.0), r!(1500.0, 3500.0),
        r!(0.0, 0.3), r!(300.0, 800.0), None, None),
    sub("jungle", family::DNB, &[r!(160.0, 170.0), r!(80.0, 85.0)], r!(-30.0, -10.0), r!(8.0, 14.0), r!(8.0, 16.0), r!(1500.0, 3500.0),
        r!(0.0, 0.2), r!(200.0, 600.0), None, None),
    // Bass music
    sub("dubstep", family::BASS, &[r!(138.0, 142.0), r!(69.0, 71.0)], r!(-20.0, -5.0), r!(5.0, 9.0), r!(2.0, 6.0), r!(1000.0, 3000.0),
        r!(0.1, 0.5), r!(300.0, 800.0), None, Some(r!(0.1, 0.6))),
    sub("riddim", family::BASS, &[r!(140.0, 150.0), r!(70.0, 75.0)], r!(-18.0, -3.0), r!(4.0, 8.0), r!(2.0, 6.0), r!(1000.0, 3000.0),
        r!(0.1, 0.5), r!(100.0, 300.0), None, Some(r!(0.2, 1.0))),
    sub("future-bass", family::BASS, &[r!(140.0, 160.0), r!(70.0, 80.0)], r!(-25.0, -8.0), r!(6.0, 10.0), r!(2.0, 6.0), r!(2000.0, 4500.0),
        r!(0.5, 1.0), r!(150.0, 400.0), None, None),
    sub("trap", family::BASS, &[r!(130.0, 150.0), r!(65.0, 75.0)], r!(-20.0, -3.0), r!(7.0, 12.0), r!(2.0, 6.0), r!(1000.0, 3000.0),
        r!(0.0, 0.3), r!(500.0, 1500.0), None, None),
    // Hardcore
    sub("hardstyle", family::HARDCORE, &[r!(150.0, 155.0)], r!(-20.0, -3.0), r!(3.0, 7.0), r!(3.0, 8.0), r!(2000.0, 4500.0),
        r!(0.1, 0.5), r!(150.0, 400.0), Some(r!(0.5, 1.5)), Some(r!(0.3, 1.5))),
    sub("gabber", family::HARDCORE, &[r!(170.0, 200.0)], r!(-20.0, -3.0), r!(3.0, 7.0), r!(6.0, 14.0), r!(2000.0, 5000.0),
        r!(0.0, 0.3), r!(80.0, 250.0), None, Some(r!(0.4, 2.0))),
    // Breaks
    sub("breakbeat", family::BREAKS, &[r!(125.0, 140.0)], r!(-30.0, -12.0), r!(8.0, 14.0), r!(5.0, 10.0), r!(1500.0, 3500.0),
        r!(0.0, 0.3), r!(100.0, 300.0), None, None),
    sub("uk-garage", family::BREAKS, &[r!(130.0, 136.0)], r!(-28.0, -10.0), r!(7.0, 12.0), r!(4.0, 9.0), r!(1500.0, 3500.0),
        r!(0.2, 0.6), r!(150.0, 400.0), None, None),
    // Chill
    sub("ambient", family::CHILL, &[r!(60.0, 90.0)], r!(-60.0, -30.0), r!(10.0, 20.0), r!(0.0, 1.5), r!(500.0, 2500.0),
        r!(0.0, 0.2), r!(600.0, 3000.0), Some(r!(2.0, 6.0)), None),
    sub("downtempo", family::CHILL, &[r!(80.0, 110.0)], r!(-40.0, -20.0), r!(8.0, 14.0), r!(1.0, 4.0), r!(1000.0, 2500.0),
        r!(0.0, 0.3), r!(200.0, 600.0), Some(r!(0.8, 2.5)), None),
    sub("lofi-hiphop", family::CHILL, &[r!(70.0, 90.0)], r!(-40.0, -20.0), r!(8.0, 14.0), r!(1.0, 4.0), r!(600.0, 1800.0),
        r!(0.0, 0.4), r!(150.0, 400.0), Some(r!(0.5, 1.5)), None),
    sub("synthwave", family::CHILL, &[r!(80.0, 118.0)], r!(-35.0, -15.0), r!(7.0, 12.0), r!(2.0, 6.0), r!(1500.0, 3500.0),
        r!(0.2, 0.6), r!(150.0, 400.0), Some(r!(1.0, 2.5)), None),
    // Hip-hop
    sub("boom-bap", family::HIPHOP, &[r!(85.0, 95.0)], r!(-25.0, -8.0), r!(8.0, 14.0), r!(1.0, 4.0), r!(800.0, 2200.0),
        r!(0.0, 0.3), r!(150.0, 400.0), None, None),
];
