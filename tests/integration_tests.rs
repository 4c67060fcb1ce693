//! Integration tests for the feature extraction pipeline

use std::f32::consts::PI;
use std::io::Cursor;

use sonic_dsp::features::stereo::analyze_stereo;
use sonic_dsp::{
    analyze_audio, analyze_signal, classify_genre, classify_genre_enhanced, classify_with_detectors,
    compute_confidence, quantize_notes, separate_hpss, AnalysisConfig, AnalysisError,
    AudioFeatures, AudioSignal, BpmEstimate, DetectedNote, DetectorReport, QuantizeGrid,
    QuantizeSettings, Scale,
};

/// Encode channels as a 16-bit PCM WAV held in memory
fn write_wav(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for i in 0..channels[0].len() {
            for ch in channels {
                let s = (ch[i].clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

/// Decode a WAV into an `AudioSignal`
fn load_wav(bytes: Vec<u8>) -> Result<AudioSignal, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(AudioSignal::from_interleaved(
        &samples,
        spec.channels as usize,
        spec.sample_rate,
    )?)
}

fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
    (0..(sample_rate as f32 * seconds) as usize)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Decaying low thump every beat
fn pulse_train(bpm: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let period = (60.0 / bpm * sample_rate as f32) as usize;
    let mut out = vec![0.0f32; (sample_rate as f32 * seconds) as usize];
    for start in (0..out.len()).step_by(period) {
        for i in 0..2000.min(out.len() - start) {
            let t = i as f32 / sample_rate as f32;
            out[start + i] = 0.9 * (-t / 0.03).exp() * (2.0 * PI * 60.0 * t).sin();
        }
    }
    out
}

fn click_train(sample_rate: u32, seconds: f32) -> Vec<f32> {
    let period = sample_rate as usize / 4;
    let mut out = vec![0.0f32; (sample_rate as f32 * seconds) as usize];
    for start in (0..out.len()).step_by(period) {
        for i in 0..64.min(out.len() - start) {
            out[start + i] = if i % 2 == 0 { 0.9 } else { -0.9 };
        }
    }
    out
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len().max(1) as f32).sqrt()
}

fn assert_bounded(features: &AudioFeatures) {
    assert!((0.0..=1.0).contains(&features.bpm_confidence));
    assert!((0.0..=1.0).contains(&features.key.confidence));
    assert!(features.spectral_centroid.is_finite());
    assert!(features.crest_factor_db.is_finite());
    assert_eq!(features.spectral_bands.len(), 7);
    if let Some(stereo) = &features.stereo {
        assert!((-1.0..=1.0).contains(&stereo.correlation));
    }
}

#[test]
fn test_sine_wav_key_a() {
    let signal = load_wav(write_wav(&[sine(440.0, 44100, 5.0, 0.5)], 44100)).unwrap();
    let features = analyze_signal(&signal, &AnalysisConfig::default()).unwrap();

    assert_eq!(features.key.root, "A");
    assert!(matches!(features.key.scale, Scale::Major | Scale::Minor));
    assert_eq!(features.channel_count, 1);
    assert!(features.stereo.is_none());
    assert!((features.duration_seconds - 5.0).abs() < 0.01);
    assert_bounded(&features);
}

#[test]
fn test_pulse_train_tempo_and_grid() {
    let samples = pulse_train(120.0, 44100, 10.0);
    let features = analyze_audio(&samples, 44100, &AnalysisConfig::default()).unwrap();

    assert!((60.0..=200.0).contains(&features.bpm));
    assert!((0.0..=1.0).contains(&features.bpm_confidence));

    let grid = features.beat_grid.as_ref().expect("beat tracking enabled by default");
    assert!(grid.beats.len() > 5, "got {} beats", grid.beats.len());
    let ibi = grid.mean_interval().unwrap();
    assert!((ibi - 0.5).abs() <= 0.15, "mean IBI {}", ibi);

    let confidence = compute_confidence(&features);
    assert!((0.0..=1.0).contains(&confidence.overall_confidence));
}

#[test]
fn test_short_input_fallback_tempo() {
    let features = analyze_audio(&[0.2; 1500], 44100, &AnalysisConfig::default()).unwrap();
    assert_eq!(features.bpm, BpmEstimate::FALLBACK.bpm);
    assert_eq!(features.bpm_confidence, 0.0);
    assert_eq!(features.onset_count, 0);
    assert_bounded(&features);
}

#[test]
fn test_silence_is_not_an_error() {
    let features = analyze_audio(&vec![0.0; 44100 * 3], 44100, &AnalysisConfig::default()).unwrap();
    assert_eq!(features.rms_mean, 0.0);
    assert_eq!(features.onset_count, 0);
    assert_bounded(&features);
}

#[test]
fn test_invalid_inputs() {
    assert!(matches!(
        analyze_audio(&[0.0; 100], 0, &AnalysisConfig::default()),
        Err(AnalysisError::InvalidInput(_))
    ));
    let config = AnalysisConfig {
        frame_size: 1000,
        ..AnalysisConfig::default()
    };
    assert!(matches!(
        analyze_audio(&[0.0; 44100], 44100, &config),
        Err(AnalysisError::InvalidInput(_))
    ));
    assert!(AudioSignal::new(vec![vec![0.0; 10], vec![0.0; 9]], 44100).is_err());
}

#[test]
fn test_hpss_tone_is_harmonic() {
    let samples = sine(440.0, 44100, 2.0, 0.5);
    let result = separate_hpss(&samples, 44100, &AnalysisConfig::default()).unwrap();
    let (h, p) = (rms(&result.harmonic), rms(&result.percussive));
    assert!(h > 2.0 * p, "harmonic {} percussive {}", h, p);

    let rebuilt: Vec<f32> = result
        .harmonic
        .iter()
        .zip(&result.percussive)
        .map(|(a, b)| a + b)
        .collect();
    let ratio = rms(&rebuilt) / rms(&samples[..rebuilt.len()]);
    assert!((0.3..=1.5).contains(&ratio), "reconstruction ratio {}", ratio);
}

#[test]
fn test_hpss_clicks_are_percussive() {
    let samples = click_train(44100, 2.0);
    let result = separate_hpss(&samples, 44100, &AnalysisConfig::default()).unwrap();
    let (h, p) = (rms(&result.harmonic), rms(&result.percussive));
    assert!(p > 1.5 * h, "harmonic {} percussive {}", h, p);

    let percussive = result.percussive_signal().unwrap();
    assert_eq!(percussive.channel_count(), 1);
}

#[test]
fn test_stereo_images() {
    let left = sine(220.0, 44100, 2.0, 0.5);
    let inverted: Vec<f32> = left.iter().map(|s| -s).collect();

    let same = AudioSignal::new(vec![left.clone(), left.clone()], 44100).unwrap();
    let m = analyze_stereo(&same);
    assert!(m.correlation > 0.95);
    assert!(m.width < 0.05);

    let wide = AudioSignal::new(vec![left.clone(), inverted], 44100).unwrap();
    let m = analyze_stereo(&wide);
    assert!(m.correlation < -0.9);
    assert!(m.width > 0.9);

    let mono = AudioSignal::from_mono(left, 44100).unwrap();
    let m = analyze_stereo(&mono);
    assert_eq!(m.correlation, 1.0);
    assert_eq!(m.width, 0.0);
}

#[test]
fn test_stereo_wav_pipeline() {
    let left = pulse_train(128.0, 44100, 4.0);
    let right: Vec<f32> = left.iter().map(|s| s * 0.8).collect();
    let signal = load_wav(write_wav(&[left, right], 44100)).unwrap();
    let features = analyze_signal(&signal, &AnalysisConfig::default()).unwrap();

    assert_eq!(features.channel_count, 2);
    let stereo = features.stereo.as_ref().unwrap();
    assert!(stereo.correlation > 0.9);
    assert_bounded(&features);
}

/// Real pipeline output with the five classifier dimensions overridden
fn shaped_features(bpm: f32, sub_bass_db: f32, crest: f32, density: f32, centroid: f32) -> AudioFeatures {
    let mut features = analyze_audio(&sine(100.0, 22050, 1.0, 0.3), 22050, &AnalysisConfig::default()).unwrap();
    features.bpm = bpm;
    features.crest_factor_db = crest;
    features.onset_density = density;
    features.spectral_centroid = centroid;
    for band in &mut features.spectral_bands {
        band.avg_db = if band.name == "Sub Bass" { sub_bass_db } else { -30.0 };
    }
    features
}

#[test]
fn test_dnb_enhanced_family() {
    let features = shaped_features(174.0, -8.0, 8.0, 10.0, 2500.0);
    let result = classify_with_detectors(&features, DetectorReport::default());
    assert_eq!(result.classification.family, "dnb");
    assert!((0.0..=1.0).contains(&result.classification.confidence));
}

#[test]
fn test_hiphop_base() {
    let features = shaped_features(85.0, -10.0, 8.0, 2.0, 1500.0);
    let result = classify_genre(&features);
    assert_eq!(result.genre, "hiphop");
    for s in &result.all_scores {
        assert!((0.0..=1.0).contains(&s.confidence));
    }
}

#[test]
fn test_enhanced_pipeline_end_to_end() {
    let samples = pulse_train(128.0, 22050, 6.0);
    let signal = AudioSignal::from_mono(samples, 22050).unwrap();
    let config = AnalysisConfig::default();
    let features = analyze_signal(&signal, &config).unwrap();
    let result = classify_genre_enhanced(&features, &signal, &config);

    assert!((0.0..=1.0).contains(&result.classification.confidence));
    assert!(!result.classification.all_scores.is_empty());

    let sequential = classify_genre_enhanced(
        &features,
        &signal,
        &AnalysisConfig {
            parallel_detectors: false,
            ..config
        },
    );
    assert_eq!(result, sequential);

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"detectors\""));
}

#[test]
fn test_features_json_roundtrip() {
    let features = analyze_audio(&pulse_train(120.0, 22050, 3.0), 22050, &AnalysisConfig::default()).unwrap();
    let json = serde_json::to_string(&features).unwrap();
    let back: AudioFeatures = serde_json::from_str(&json).unwrap();
    assert_eq!(back.bpm, features.bpm);
    assert_eq!(back.key, features.key);
    assert_eq!(back.spectral_bands.len(), 7);
}

#[test]
fn test_quantize_quarter_grid() {
    let note = DetectedNote {
        midi: 69,
        name: "A4".to_string(),
        frequency: 440.0,
        start_time: 0.49,
        duration: 0.3,
        velocity: 90,
        confidence: 0.9,
        pitch_bend: None,
    };
    let quarter = QuantizeSettings {
        grid: QuantizeGrid::Quarter,
        ..QuantizeSettings::default()
    };
    let snapped = quantize_notes(std::slice::from_ref(&note), 120.0, &quarter);
    assert!((snapped[0].start_time - 0.5).abs() < 1e-6);

    let off = quantize_notes(std::slice::from_ref(&note), 120.0, &QuantizeSettings::default());
    assert_eq!(off[0], note);
}
