//! Performance benchmarks for audio analysis

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sonic_dsp::{
    analyze_audio, analyze_signal, classify_genre_enhanced, separate_hpss, AnalysisConfig,
    AudioSignal,
};

fn synth_track(sample_rate: u32, seconds: usize) -> Vec<f32> {
    // 440 Hz pad with a 128 BPM kick underneath
    let beat = (60.0 / 128.0 * sample_rate as f32) as usize;
    (0..sample_rate as usize * seconds)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let since = (i % beat) as f32 / sample_rate as f32;
            let pad = 0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            let kick = 0.6 * (-since / 0.05).exp() * (2.0 * std::f32::consts::PI * 55.0 * since).sin();
            pad + kick
        })
        .collect()
}

fn bench_analyze_audio(c: &mut Criterion) {
    let samples = synth_track(44100, 30);
    let config = AnalysisConfig::default();

    c.bench_function("analyze_audio_30s", |b| {
        b.iter(|| {
            let _ = analyze_audio(black_box(&samples), black_box(44100), black_box(&config));
        });
    });
}

fn bench_enhanced_classification(c: &mut Criterion) {
    let signal = match AudioSignal::from_mono(synth_track(44100, 30), 44100) {
        Ok(s) => s,
        Err(e) => panic!("bench signal: {}", e),
    };
    let config = AnalysisConfig::default();
    let features = match analyze_signal(&signal, &config) {
        Ok(f) => f,
        Err(e) => panic!("bench features: {}", e),
    };

    let mut group = c.benchmark_group("classify_genre_enhanced_30s");
    group.sample_size(10);
    group.bench_function("parallel", |b| {
        b.iter(|| classify_genre_enhanced(black_box(&features), black_box(&signal), &config));
    });
    let sequential = AnalysisConfig {
        parallel_detectors: false,
        ..config.clone()
    };
    group.bench_function("sequential", |b| {
        b.iter(|| classify_genre_enhanced(black_box(&features), black_box(&signal), &sequential));
    });
    group.finish();
}

fn bench_hpss(c: &mut Criterion) {
    let samples = synth_track(44100, 10);
    let config = AnalysisConfig::default();

    c.bench_function("separate_hpss_10s", |b| {
        b.iter(|| {
            let _ = separate_hpss(black_box(&samples), 44100, &config);
        });
    });
}

criterion_group!(
    benches,
    bench_analyze_audio,
    bench_enhanced_classification,
    bench_hpss
);
criterion_main!(benches);
