use serde::{Deserialize, Serialize};

/// De-esser parameters for a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeEssSettings {
    pub enabled: bool,
    pub band_low_hz: f32,
    pub band_high_hz: f32,
    /// Fraction of the isolated sibilant signal subtracted back out.
    pub amount: f32,
}

impl Default for DeEssSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            band_low_hz: 4_000.0,
            band_high_hz: 8_000.0,
            amount: 0.45,
        }
    }
}

/// One named parameter set for the enhancement chain. Each preset used to
/// be its own copy-pasted script; now it is just data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancePreset {
    pub name: String,

    /// Equalization band
    pub lowcut_hz: f32,
    pub highcut_hz: f32,

    /// Compression threshold as linear amplitude, 0.0..=1.0
    pub compression_threshold: f32,
    /// Soft-limit ratio; omit for the classic hard clip
    #[serde(default)]
    pub compression_ratio: Option<f32>,

    pub saturation_gain: f32,

    #[serde(default)]
    pub de_ess: DeEssSettings,

    pub target_lufs: f32,

    #[serde(default = "default_peak_ceiling")]
    pub peak_ceiling_dbfs: f32,
}

fn default_peak_ceiling() -> f32 {
    -1.0
}

/// Named presets, built-ins first, user entries from the config layered on
/// top (same name wins for the user).
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    presets: Vec<EnhancePreset>,
}

impl PresetLibrary {
    pub fn builtin() -> Self {
        Self {
            presets: vec![
                EnhancePreset {
                    name: "warm-radio".to_string(),
                    lowcut_hz: 100.0,
                    highcut_hz: 6_000.0,
                    compression_threshold: 0.7,
                    compression_ratio: None,
                    saturation_gain: 1.1,
                    de_ess: DeEssSettings::default(),
                    target_lufs: -18.0,
                    peak_ceiling_dbfs: -1.0,
                },
                EnhancePreset {
                    name: "podcast-voice".to_string(),
                    lowcut_hz: 120.0,
                    highcut_hz: 7_500.0,
                    compression_threshold: 0.72,
                    compression_ratio: None,
                    saturation_gain: 1.2,
                    de_ess: DeEssSettings::default(),
                    target_lufs: -16.0,
                    peak_ceiling_dbfs: -1.0,
                },
                EnhancePreset {
                    name: "crisp-vocals".to_string(),
                    lowcut_hz: 150.0,
                    highcut_hz: 8_500.0,
                    compression_threshold: 0.75,
                    compression_ratio: None,
                    saturation_gain: 1.3,
                    de_ess: DeEssSettings::default(),
                    target_lufs: -14.0,
                    peak_ceiling_dbfs: -1.0,
                },
            ],
        }
    }

    /// Built-ins plus user presets; a user preset with a built-in's name
    /// replaces it.
    pub fn with_user_presets(user: &[EnhancePreset]) -> Self {
        let mut library = Self::builtin();
        for preset in user {
            if let Some(existing) = library
                .presets
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&preset.name))
            {
                *existing = preset.clone();
            } else {
                library.presets.push(preset.clone());
            }
        }
        library
    }

    pub fn get(&self, name: &str) -> Option<&EnhancePreset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn presets(&self) -> &[EnhancePreset] {
        &self.presets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_present() {
        let library = PresetLibrary::builtin();
        assert!(library.get("podcast-voice").is_some());
        assert!(library.get("warm-radio").is_some());
        assert!(library.get("crisp-vocals").is_some());
        assert!(library.get("does-not-exist").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let library = PresetLibrary::builtin();
        assert!(library.get("Podcast-Voice").is_some());
    }

    #[test]
    fn test_user_preset_overrides_builtin() {
        let custom = EnhancePreset {
            name: "podcast-voice".to_string(),
            lowcut_hz: 90.0,
            highcut_hz: 7_000.0,
            compression_threshold: 0.8,
            compression_ratio: Some(3.0),
            saturation_gain: 1.0,
            de_ess: DeEssSettings::default(),
            target_lufs: -17.0,
            peak_ceiling_dbfs: -1.5,
        };
        let library = PresetLibrary::with_user_presets(std::slice::from_ref(&custom));
        let preset = library.get("podcast-voice").unwrap();
        assert_eq!(preset.lowcut_hz, 90.0);
        assert_eq!(preset.compression_ratio, Some(3.0));
        assert_eq!(library.presets().len(), 3);
    }

    #[test]
    fn test_user_preset_extends_library() {
        let custom = EnhancePreset {
            name: "hindi-lesson".to_string(),
            lowcut_hz: 110.0,
            highcut_hz: 8_000.0,
            compression_threshold: 0.7,
            compression_ratio: None,
            saturation_gain: 1.15,
            de_ess: DeEssSettings::default(),
            target_lufs: -16.0,
            peak_ceiling_dbfs: -1.0,
        };
        let library = PresetLibrary::with_user_presets(std::slice::from_ref(&custom));
        assert_eq!(library.presets().len(), 4);
        assert!(library.names().contains(&"hindi-lesson"));
    }
}
