use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::audio::AudioBuffer;
use crate::dsp::dynamics::{compress, de_ess, peak_ceiling, saturate};
use crate::dsp::filters::band_limit;
use crate::dsp::loudness::{integrated_lufs, normalize_loudness, LoudnessMode};
use crate::dsp::noise::{NoiseProfile, SpectralDenoiser};
use crate::presets::EnhancePreset;

/// Stages of the enhancement chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnhanceStage {
    NoiseReduction,
    Equalization,
    Compression,
    Saturation,
    DeEssing,
    LoudnessNormalization,
}

/// What one pass over a buffer did, for the batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceReport {
    pub preset: String,
    pub stages: Vec<StageTiming>,
    pub input_lufs: Option<f64>,
    pub output_lufs: Option<f64>,
    pub loudness_gain_db: f32,
    pub loudness_mode: LoudnessMode,
    pub ceiling_gain_db: f32,
    pub scrubbed_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: EnhanceStage,
    pub seconds: f64,
}

/// Runs the fixed enhancement sequence with one preset's parameters.
///
/// Every stage is a pure transform over the in-memory waveform; the buffer
/// length and sample rate never change.
#[derive(Debug, Clone)]
pub struct Enhancer {
    preset: EnhancePreset,
    denoiser: Option<SpectralDenoiser>,
    noise_profile: Option<NoiseProfile>,
}

impl Enhancer {
    pub fn new(preset: EnhancePreset) -> Self {
        Self {
            preset,
            denoiser: None,
            noise_profile: None,
        }
    }

    /// Enable the optional noise-reduction stage.
    pub fn with_noise_reduction(mut self, prop_decrease: f32) -> Self {
        self.denoiser = Some(SpectralDenoiser::new(prop_decrease));
        self
    }

    /// Gate against a measured room-tone profile instead of the in-signal
    /// estimate.
    pub fn with_noise_profile(mut self, profile: NoiseProfile) -> Self {
        self.noise_profile = Some(profile);
        self
    }

    pub fn preset(&self) -> &EnhancePreset {
        &self.preset
    }

    /// Build a noise profile from a room-tone clip using this enhancer's
    /// denoiser settings.
    pub fn profile_noise(&self, clip: &AudioBuffer) -> Option<NoiseProfile> {
        self.denoiser.as_ref().map(|d| d.profile(&clip.samples))
    }

    /// Run the full chain over a buffer in place.
    pub fn process(&self, buffer: &mut AudioBuffer) -> Result<EnhanceReport> {
        let preset = &self.preset;
        let mut stages = Vec::new();

        let mut scrubbed = buffer.scrub_non_finite();
        if scrubbed > 0 {
            warn!("Input contained {} non-finite samples, zeroed", scrubbed);
        }

        let input_lufs = integrated_lufs(&buffer.samples, buffer.sample_rate);

        // Noise reduction
        if let Some(denoiser) = &self.denoiser {
            let started = Instant::now();
            debug!("Applying noise reduction");
            buffer.samples = denoiser.reduce(&buffer.samples, self.noise_profile.as_ref());
            stages.push(StageTiming {
                stage: EnhanceStage::NoiseReduction,
                seconds: started.elapsed().as_secs_f64(),
            });
        }

        // Equalization
        let started = Instant::now();
        debug!(
            "Band-limiting to {}-{} Hz",
            preset.lowcut_hz, preset.highcut_hz
        );
        buffer.samples = band_limit(
            &buffer.samples,
            buffer.sample_rate,
            preset.lowcut_hz,
            preset.highcut_hz,
        )?;
        stages.push(StageTiming {
            stage: EnhanceStage::Equalization,
            seconds: started.elapsed().as_secs_f64(),
        });

        // Compression
        let started = Instant::now();
        compress(
            &mut buffer.samples,
            preset.compression_threshold,
            preset.compression_ratio,
        );
        stages.push(StageTiming {
            stage: EnhanceStage::Compression,
            seconds: started.elapsed().as_secs_f64(),
        });

        // Saturation
        let started = Instant::now();
        saturate(&mut buffer.samples, preset.saturation_gain);
        stages.push(StageTiming {
            stage: EnhanceStage::Saturation,
            seconds: started.elapsed().as_secs_f64(),
        });

        // De-essing
        if preset.de_ess.enabled {
            let started = Instant::now();
            match de_ess(
                &buffer.samples,
                buffer.sample_rate,
                preset.de_ess.band_low_hz,
                preset.de_ess.band_high_hz,
                preset.de_ess.amount,
            )? {
                Some(out) => {
                    buffer.samples = out;
                    stages.push(StageTiming {
                        stage: EnhanceStage::DeEssing,
                        seconds: started.elapsed().as_secs_f64(),
                    });
                }
                None => {
                    warn!(
                        "De-esser skipped, {} Hz material cannot represent the sibilance band",
                        buffer.sample_rate
                    );
                }
            }
        }

        scrubbed += buffer.scrub_non_finite();

        // Loudness normalization, then the ceiling
        let started = Instant::now();
        let (loudness_gain_db, loudness_mode) = normalize_loudness(buffer, preset.target_lufs);
        let ceiling_gain_db = peak_ceiling(&mut buffer.samples, preset.peak_ceiling_dbfs);
        stages.push(StageTiming {
            stage: EnhanceStage::LoudnessNormalization,
            seconds: started.elapsed().as_secs_f64(),
        });

        let output_lufs = integrated_lufs(&buffer.samples, buffer.sample_rate);

        info!(
            "✅ Enhanced with '{}': {:.1} -> {:.1} LUFS, peak {:.1} dBFS",
            preset.name,
            input_lufs.unwrap_or(f64::NAN),
            output_lufs.unwrap_or(f64::NAN),
            buffer.peak_dbfs(),
        );

        Ok(EnhanceReport {
            preset: preset.name.clone(),
            stages,
            input_lufs,
            output_lufs,
            loudness_gain_db,
            loudness_mode,
            ceiling_gain_db,
            scrubbed_samples: scrubbed,
        })
    }
}
