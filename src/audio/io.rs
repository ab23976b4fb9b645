use anyhow::{anyhow, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

use super::{AudioBuffer, AudioError};

/// Extensions decoded natively with hound.
pub const WAV_EXTENSIONS: &[&str] = &["wav"];

/// Extensions handed to ffmpeg for decoding first.
pub const FFMPEG_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "m4a", "aac", "ogg", "opus", "mp4", "mkv", "avi", "mov", "webm", "m4v",
];

pub fn is_wav(path: &Path) -> bool {
    has_extension(path, WAV_EXTENSIONS)
}

pub fn is_ffmpeg_input(path: &Path) -> bool {
    has_extension(path, FFMPEG_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Verify the external decoders are on PATH before a run that needs them.
pub fn ensure_ffmpeg() -> Result<()> {
    which::which("ffmpeg").context("`ffmpeg` not found in PATH")?;
    which::which("ffprobe").context("`ffprobe` not found in PATH")?;
    Ok(())
}

/// Decode an audio file into a mono buffer at its native sample rate.
///
/// WAV files are read directly; anything else goes through an ffmpeg
/// decode into a temporary WAV first.
pub async fn load(path: &Path) -> Result<AudioBuffer> {
    if is_wav(path) {
        return load_wav(path);
    }

    let temp = tempfile::Builder::new()
        .prefix("enhancer_decode_")
        .suffix(".wav")
        .tempfile()
        .context("failed to create temporary decode file")?;
    decode_with_ffmpeg(path, temp.path()).await?;
    let buffer = load_wav(temp.path())
        .with_context(|| format!("failed to read decoded audio for {}", path.display()))?;
    Ok(buffer)
}

/// Read a WAV file into a mono f32 buffer.
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    debug!("Decoding {} ({:?})", path.display(), spec);

    let channels = spec.channels.max(1) as usize;
    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32_768.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 24) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, 32) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
            .collect::<std::result::Result<_, _>>()?,
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat {
                path: path.to_path_buf(),
                bits,
                format: match format {
                    SampleFormat::Float => "float",
                    SampleFormat::Int => "int",
                },
            }
            .into())
        }
    };

    if interleaved.is_empty() {
        return Err(AudioError::Empty(path.to_path_buf()).into());
    }

    let samples = mix_down(&interleaved, channels);
    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

/// Average interleaved channels into a single mono channel.
fn mix_down(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Write a mono buffer as 16-bit PCM WAV.
pub fn save_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in &buffer.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32_767.0).round() as i16)?;
    }
    writer.finalize()?;

    debug!("Wrote {} samples to {}", buffer.samples.len(), path.display());
    Ok(())
}

/// Decode any container ffmpeg understands into a mono WAV at the source
/// sample rate.
async fn decode_with_ffmpeg(input: &Path, output: &Path) -> Result<()> {
    info!("🎵 Decoding with ffmpeg: {}", input.display());

    let output_cmd = tokio::process::Command::new("ffmpeg")
        .args([
            "-i",
            &input.to_string_lossy(),
            "-vn",
            "-acodec",
            "pcm_s16le",
            "-ac",
            "1",
            "-y",
            &output.to_string_lossy(),
        ])
        .output()
        .await
        .context("failed to spawn ffmpeg")?;

    if !output_cmd.status.success() {
        let stderr = String::from_utf8_lossy(&output_cmd.stderr);
        return Err(anyhow!(
            "ffmpeg decode failed for {}: {}",
            input.display(),
            stderr.trim()
        ));
    }

    Ok(())
}

/// Probe a media file's duration in seconds via ffprobe.
pub async fn probe_duration_secs(path: &Path) -> Result<f64> {
    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            &path.to_string_lossy(),
        ])
        .output()
        .await
        .context("failed to spawn ffprobe")?;

    if !output.status.success() {
        return Err(anyhow!("ffprobe failed for {}", path.display()));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    text.trim()
        .parse::<f64>()
        .with_context(|| format!("cannot parse duration for {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_detection() {
        assert!(is_wav(Path::new("take1.wav")));
        assert!(is_wav(Path::new("take1.WAV")));
        assert!(!is_wav(Path::new("take1.mp3")));
        assert!(is_ffmpeg_input(Path::new("lesson.mp4")));
        assert!(!is_ffmpeg_input(Path::new("notes.txt")));
    }

    #[test]
    fn test_mix_down_stereo() {
        let interleaved = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = mix_down(&interleaved, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_wav_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..1600)
            .map(|i| (i as f32 / 1600.0 * std::f32::consts::TAU * 10.0).sin() * 0.25)
            .collect();
        let buffer = AudioBuffer::new(samples.clone(), 16_000);
        save_wav(&buffer, &path).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.sample_rate, 16_000);
        assert_eq!(loaded.samples.len(), samples.len());
        // 16-bit quantization keeps samples within one LSB
        for (a, b) in loaded.samples.iter().zip(samples.iter()) {
            assert!((a - b).abs() < 1.0 / 32_000.0);
        }
    }
}
