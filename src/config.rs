use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::presets::EnhancePreset;

/// Configuration for the audio enhancer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Input/output settings
    #[serde(default)]
    pub io: IoConfig,

    /// Enhancement chain settings
    #[serde(default)]
    pub enhance: EnhanceConfig,

    /// Batch processing settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Subtitle generation settings
    #[serde(default)]
    pub subtitles: SubtitleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    /// Suffix appended to enhanced output filenames
    pub output_suffix: String,

    /// Sample rate for video audio extraction (None keeps the source rate)
    pub extract_sample_rate: Option<u32>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            output_suffix: "_enhanced".to_string(),
            extract_sample_rate: Some(16_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceConfig {
    /// Default preset name
    pub preset: String,

    /// Enable the noise-reduction stage
    pub noise_reduction: bool,

    /// Fraction of gated noise energy removed, 0.0..=1.0
    pub prop_decrease: f32,

    /// User presets layered over the built-ins
    #[serde(default)]
    pub presets: Vec<EnhancePreset>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            preset: "podcast-voice".to_string(),
            noise_reduction: true,
            prop_decrease: 0.9,
            presets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of concurrent workers
    pub max_workers: usize,

    /// Skip inputs whose output file already exists
    pub skip_existing: bool,

    /// Extensions picked up when scanning a directory
    pub supported_extensions: Vec<String>,

    /// Filename of the JSON run report written into the output directory
    pub results_file: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().min(8),
            skip_existing: true,
            supported_extensions: vec![
                "wav".to_string(),
                "mp3".to_string(),
                "flac".to_string(),
                "m4a".to_string(),
                "mp4".to_string(),
                "mkv".to_string(),
                "mov".to_string(),
            ],
            results_file: "processing_results.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// Maximum words per cue
    pub max_words_per_cue: usize,

    /// Maximum cue duration in seconds
    pub max_cue_duration_secs: f64,

    /// Silence between words that forces a cue break
    pub max_word_gap_secs: f64,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            max_words_per_cue: 3,
            max_cue_duration_secs: 5.0,
            max_word_gap_secs: 1.5,
        }
    }
}

impl Config {
    /// Load configuration from the usual locations.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "audio-enhancer.toml",
            "config/audio-enhancer.toml",
            "~/.config/audio-enhancer/config.toml",
            "/etc/audio-enhancer/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read config {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("cannot parse config {}: {}", path.display(), e))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables override file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(workers) = std::env::var("AUDIO_ENHANCER_WORKERS") {
            if let Ok(workers) = workers.parse() {
                self.batch.max_workers = workers;
            }
        }
        if let Ok(preset) = std::env::var("AUDIO_ENHANCER_PRESET") {
            self.enhance.preset = preset;
        }
        if let Ok(suffix) = std::env::var("AUDIO_ENHANCER_OUTPUT_SUFFIX") {
            self.io.output_suffix = suffix;
        }
        if let Ok(value) = std::env::var("AUDIO_ENHANCER_NOISE_REDUCTION") {
            self.enhance.noise_reduction = matches!(value.as_str(), "1" | "true" | "on");
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.batch.max_workers == 0 {
            return Err(anyhow!("max_workers must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.enhance.prop_decrease) {
            return Err(anyhow!("prop_decrease must be between 0.0 and 1.0"));
        }
        if self.subtitles.max_words_per_cue == 0 {
            return Err(anyhow!("max_words_per_cue must be greater than 0"));
        }
        if self.subtitles.max_cue_duration_secs <= 0.0 {
            return Err(anyhow!("max_cue_duration_secs must be positive"));
        }
        for preset in &self.enhance.presets {
            if preset.lowcut_hz >= preset.highcut_hz {
                return Err(anyhow!(
                    "preset '{}': lowcut must be below highcut",
                    preset.name
                ));
            }
            if !(0.0..=1.0).contains(&preset.compression_threshold) {
                return Err(anyhow!(
                    "preset '{}': compression_threshold must be between 0.0 and 1.0",
                    preset.name
                ));
            }
        }
        Ok(())
    }

    /// Get runtime configuration summary.
    pub fn summary(&self) -> String {
        format!(
            "Audio Enhancer Configuration:\n\
            - Workers: {}\n\
            - Default Preset: {}\n\
            - Noise Reduction: {}\n\
            - Output Suffix: {}\n\
            - Supported Extensions: {}\n\
            - Skip Existing: {}",
            self.batch.max_workers,
            self.enhance.preset,
            self.enhance.noise_reduction,
            self.io.output_suffix,
            self.batch.supported_extensions.join(", "),
            self.batch.skip_existing,
        )
    }
}

/// Configuration builder for programmatic config creation.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.batch.max_workers = workers;
        self
    }

    pub fn with_preset(mut self, preset: &str) -> Self {
        self.config.enhance.preset = preset.to_string();
        self
    }

    pub fn with_output_suffix(mut self, suffix: &str) -> Self {
        self.config.io.output_suffix = suffix.to_string();
        self
    }

    pub fn enable_noise_reduction(mut self, enable: bool) -> Self {
        self.config.enhance.noise_reduction = enable;
        self
    }

    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.config.batch.skip_existing = skip;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.enhance.preset, "podcast-voice");
        assert!(config.enhance.noise_reduction);
        assert_eq!(config.subtitles.max_words_per_cue, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_workers(8)
            .with_preset("crisp-vocals")
            .enable_noise_reduction(false)
            .build();

        assert_eq!(config.batch.max_workers, 8);
        assert_eq!(config.enhance.preset, "crisp-vocals");
        assert!(!config.enhance.noise_reduction);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.batch.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.enhance.prop_decrease = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.subtitles.max_cue_duration_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.enhance.preset, config.enhance.preset);
        assert_eq!(parsed.batch.max_workers, config.batch.max_workers);
    }
}
