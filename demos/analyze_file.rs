//! Example: Analyze a single WAV file and print the results as JSON
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--config overrides.json] [file.wav]
//!
//! Without a file, a 20 second synthetic 128 BPM track is analysed.
//! `--config` reads a JSON object of `AnalysisConfig` fields; missing fields
//! keep their defaults.

use std::env;
use std::time::Instant;

use sonic_dsp::{
    analyze_signal, classify_genre, classify_genre_enhanced, compute_confidence, AnalysisConfig,
    AudioSignal,
};

fn load_wav(path: &str) -> Result<AudioSignal, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
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

fn synth_track() -> Result<AudioSignal, Box<dyn std::error::Error>> {
    let sample_rate = 44100u32;
    let beat = (60.0 / 128.0 * sample_rate as f32) as usize;
    let left: Vec<f32> = (0..sample_rate as usize * 20)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let since = (i % beat) as f32 / sample_rate as f32;
            let kick = 0.7 * (-since / 0.06).exp() * (2.0 * std::f32::consts::PI * 50.0 * since).sin();
            // Bass ducks under the kick
            let duck = 1.0 - (-since / 0.15).exp();
            let bass = 0.3 * duck * (2.0 * std::f32::consts::PI * 55.0 * t).sin();
            let pad = 0.15 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            kick + bass + pad
        })
        .collect();
    let right = left.iter().map(|s| s * 0.9).collect();
    Ok(AudioSignal::new(vec![left, right], sample_rate)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = AnalysisConfig::default();
    let mut path = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let file = args.next().ok_or("--config needs a path")?;
            config = serde_json::from_str(&std::fs::read_to_string(file)?)?;
        } else {
            path = Some(arg);
        }
    }

    let signal = match &path {
        Some(p) => load_wav(p)?,
        None => synth_track()?,
    };

    let start = Instant::now();
    let features = analyze_signal(&signal, &config)?;
    let confidence = compute_confidence(&features);
    let genre = classify_genre(&features);
    let enhanced = classify_genre_enhanced(&features, &signal, &config);
    let elapsed_ms = start.elapsed().as_secs_f32() * 1000.0;

    let report = serde_json::json!({
        "file": path.as_deref().unwrap_or("<synthetic>"),
        "processing_time_ms": elapsed_ms,
        "features": features,
        "confidence": confidence,
        "genre": genre,
        "enhanced_genre": enhanced,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
