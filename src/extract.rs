use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::audio::io::probe_duration_secs;

/// Extensions treated as video containers.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm", "m4v", "flv"];

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pulls the audio track out of a video container as mono 16-bit WAV.
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    /// Resample to this rate; None keeps the source rate
    pub sample_rate: Option<u32>,
}

impl AudioExtractor {
    pub fn new(sample_rate: Option<u32>) -> Self {
        Self { sample_rate }
    }

    /// Extract into `output_dir`, named after the video file.
    pub async fn extract_to_dir(&self, video_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = video_path
            .file_stem()
            .ok_or_else(|| anyhow!("invalid video filename: {}", video_path.display()))?
            .to_string_lossy();
        let audio_path = output_dir.join(format!("{}.wav", stem));

        tokio::fs::create_dir_all(output_dir).await?;
        self.extract(video_path, &audio_path).await?;
        Ok(audio_path)
    }

    /// Extract the audio track to an explicit path.
    pub async fn extract(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("🎵 Extracting audio: {}", video_path.display());
        if let Ok(duration) = probe_duration_secs(video_path).await {
            debug!("Source duration: {:.1}s", duration);
        }

        let mut args: Vec<String> = vec![
            "-i".to_string(),
            video_path.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ac".to_string(),
            "1".to_string(),
        ];
        if let Some(rate) = self.sample_rate {
            args.push("-ar".to_string());
            args.push(rate.to_string());
        }
        args.push("-y".to_string());
        args.push(audio_path.to_string_lossy().into_owned());

        let output = tokio::process::Command::new("ffmpeg")
            .args(&args)
            .output()
            .await
            .context("failed to spawn ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "audio extraction failed for {}: {}",
                video_path.display(),
                stderr.trim()
            ));
        }

        info!("✅ Audio extracted: {}", audio_path.display());
        Ok(())
    }
}

impl Default for AudioExtractor {
    fn default() -> Self {
        Self::new(Some(16_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_detection() {
        assert!(is_video(Path::new("lesson_1.mp4")));
        assert!(is_video(Path::new("raw.MKV")));
        assert!(!is_video(Path::new("take.wav")));
        assert!(!is_video(Path::new("no_extension")));
    }

    #[test]
    fn test_extractor_defaults() {
        let extractor = AudioExtractor::default();
        assert_eq!(extractor.sample_rate, Some(16_000));
    }
}
