use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::f32::consts::PI;

use audio_enhancer_rust::audio::AudioBuffer;
use audio_enhancer_rust::dsp::filters::band_limit;
use audio_enhancer_rust::dsp::noise::SpectralDenoiser;
use audio_enhancer_rust::enhance::Enhancer;
use audio_enhancer_rust::presets::PresetLibrary;

fn tone(sample_rate: u32, seconds: f32) -> Vec<f32> {
    let count = (sample_rate as f32 * seconds) as usize;
    (0..count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.3 * (2.0 * PI * 220.0 * t).sin() + 0.1 * (2.0 * PI * 2_000.0 * t).sin()
        })
        .collect()
}

fn bench_band_limit(c: &mut Criterion) {
    let samples = tone(44_100, 5.0);
    c.bench_function("band_limit_5s_44k", |b| {
        b.iter(|| black_box(band_limit(&samples, 44_100, 120.0, 7_500.0).unwrap()))
    });
}

fn bench_denoiser(c: &mut Criterion) {
    let samples = tone(44_100, 5.0);
    let denoiser = SpectralDenoiser::default();
    c.bench_function("spectral_denoise_5s_44k", |b| {
        b.iter(|| black_box(denoiser.reduce(&samples, None)))
    });
}

fn bench_full_chain(c: &mut Criterion) {
    let preset = PresetLibrary::builtin().get("podcast-voice").unwrap().clone();
    let enhancer = Enhancer::new(preset);
    let samples = tone(44_100, 5.0);

    c.bench_function("enhance_chain_5s_44k", |b| {
        b.iter(|| {
            let mut buffer = AudioBuffer::new(samples.clone(), 44_100);
            black_box(enhancer.process(&mut buffer).unwrap())
        })
    });
}

criterion_group!(benches, bench_band_limit, bench_denoiser, bench_full_chain);
criterion_main!(benches);
