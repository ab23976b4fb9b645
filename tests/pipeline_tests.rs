use std::f32::consts::PI;
use std::path::Path;

use tempfile::TempDir;

use audio_enhancer_rust::audio::{db_to_linear, io, AudioBuffer};
use audio_enhancer_rust::batch::{BatchProcessor, FileStatus};
use audio_enhancer_rust::config::ConfigBuilder;
use audio_enhancer_rust::dsp::loudness::integrated_lufs;
use audio_enhancer_rust::enhance::{EnhanceStage, Enhancer};
use audio_enhancer_rust::presets::PresetLibrary;

fn voice_tone(sample_rate: u32, seconds: f32) -> AudioBuffer {
    let count = (sample_rate as f32 * seconds) as usize;
    let samples = (0..count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.25 * (2.0 * PI * 220.0 * t).sin() + 0.1 * (2.0 * PI * 1_000.0 * t).sin()
        })
        .collect();
    AudioBuffer::new(samples, sample_rate)
}

fn write_fixture(dir: &Path, name: &str, buffer: &AudioBuffer) -> std::path::PathBuf {
    let path = dir.join(name);
    io::save_wav(buffer, &path).unwrap();
    path
}

#[tokio::test]
async fn test_batch_run_over_wav_fixtures() {
    let temp = TempDir::new().unwrap();
    let input_dir = temp.path().join("input");
    let output_dir = temp.path().join("enhanced");
    std::fs::create_dir_all(&input_dir).unwrap();

    let tone = voice_tone(16_000, 1.0);
    write_fixture(&input_dir, "take1.wav", &tone);
    write_fixture(&input_dir, "take2.wav", &tone);

    let config = ConfigBuilder::new()
        .with_workers(2)
        .enable_noise_reduction(false)
        .build();
    let processor = BatchProcessor::new(config, "podcast-voice").unwrap();

    let inputs = processor.discover_inputs(&[input_dir]).unwrap();
    assert_eq!(inputs.len(), 2);

    let report = processor.run(inputs, &output_dir).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.successful + report.failed + report.skipped, report.total);

    assert!(output_dir.join("take1_enhanced.wav").exists());
    assert!(output_dir.join("take2_enhanced.wav").exists());
    assert!(output_dir.join("processing_results.json").exists());

    // Every output respects the preset's peak ceiling
    let enhanced = io::load_wav(&output_dir.join("take1_enhanced.wav")).unwrap();
    assert!(enhanced.peak() <= db_to_linear(-1.0) + 1e-3);
    assert_eq!(enhanced.sample_rate, 16_000);
}

#[tokio::test]
async fn test_batch_skips_existing_outputs() {
    let temp = TempDir::new().unwrap();
    let input_dir = temp.path().join("input");
    let output_dir = temp.path().join("enhanced");
    std::fs::create_dir_all(&input_dir).unwrap();

    write_fixture(&input_dir, "take1.wav", &voice_tone(16_000, 0.5));

    let config = ConfigBuilder::new()
        .with_workers(1)
        .enable_noise_reduction(false)
        .skip_existing(true)
        .build();
    let processor = BatchProcessor::new(config.clone(), "podcast-voice").unwrap();

    let inputs = processor.discover_inputs(&[input_dir.clone()]).unwrap();
    let first = processor.run(inputs.clone(), &output_dir).await.unwrap();
    assert_eq!(first.successful, 1);

    let processor = BatchProcessor::new(config, "podcast-voice").unwrap();
    let second = processor.run(inputs, &output_dir).await.unwrap();
    assert_eq!(second.successful, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn test_batch_records_per_file_failures() {
    let temp = TempDir::new().unwrap();
    let input_dir = temp.path().join("input");
    let output_dir = temp.path().join("enhanced");
    std::fs::create_dir_all(&input_dir).unwrap();

    write_fixture(&input_dir, "good.wav", &voice_tone(16_000, 0.5));
    // Not a real WAV file; the run must keep going past it
    std::fs::write(input_dir.join("broken.wav"), b"not audio").unwrap();

    let config = ConfigBuilder::new()
        .with_workers(2)
        .enable_noise_reduction(false)
        .build();
    let processor = BatchProcessor::new(config, "podcast-voice").unwrap();

    let inputs = processor.discover_inputs(&[input_dir]).unwrap();
    let report = processor.run(inputs, &output_dir).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 1);

    let failure = report
        .results
        .iter()
        .find(|r| r.status == FileStatus::Failed)
        .unwrap();
    assert!(failure.input.ends_with("broken.wav"));
    assert!(failure.error_message.is_some());
}

#[tokio::test]
async fn test_enhanced_output_loudness_from_disk() {
    let temp = TempDir::new().unwrap();
    let input = write_fixture(temp.path(), "long.wav", &voice_tone(48_000, 3.0));

    let preset = PresetLibrary::builtin().get("podcast-voice").unwrap().clone();
    let target = preset.target_lufs as f64;
    let enhancer = Enhancer::new(preset);

    let mut buffer = io::load(&input).await.unwrap();
    enhancer.process(&mut buffer).unwrap();

    let out_path = temp.path().join("long_enhanced.wav");
    io::save_wav(&buffer, &out_path).unwrap();

    let reloaded = io::load_wav(&out_path).unwrap();
    let loudness = integrated_lufs(&reloaded.samples, reloaded.sample_rate).unwrap();
    assert!(loudness <= target + 1.0);
    assert!(loudness >= target - 3.0);
}

#[tokio::test]
async fn test_noise_reduction_cleans_fixture() {
    let temp = TempDir::new().unwrap();
    let input_dir = temp.path().join("input");
    let output_dir = temp.path().join("enhanced");
    std::fs::create_dir_all(&input_dir).unwrap();

    // Tone plus a deterministic hiss floor
    let mut state = 0x1234_5678u32;
    let mut noisy = voice_tone(16_000, 1.0);
    for sample in &mut noisy.samples {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        *sample += ((state >> 8) as f32 / (1 << 24) as f32 * 2.0 - 1.0) * 0.02;
    }
    write_fixture(&input_dir, "hissy.wav", &noisy);

    let config = ConfigBuilder::new()
        .with_workers(1)
        .enable_noise_reduction(true)
        .build();
    let processor = BatchProcessor::new(config, "podcast-voice").unwrap();

    let inputs = processor.discover_inputs(&[input_dir]).unwrap();
    let report = processor.run(inputs, &output_dir).await.unwrap();

    assert_eq!(report.successful, 1);
    let result = &report.results[0];
    let enhance_report = result.report.as_ref().unwrap();
    assert!(enhance_report
        .stages
        .iter()
        .any(|s| s.stage == EnhanceStage::NoiseReduction));
}
