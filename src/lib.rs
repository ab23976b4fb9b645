/// Audio Enhancer - Rust Implementation
///
/// Consolidated voice enhancement pipeline for video production work.
/// Replaces a pile of near-identical desktop scripts with one configurable
/// batch processor.

pub mod audio;
pub mod batch;
pub mod config;
pub mod dsp;
pub mod enhance;
pub mod extract;
pub mod presets;
pub mod subtitles;

// Re-export main types for easy access
pub use crate::audio::{AudioBuffer, AudioError};
pub use crate::batch::{BatchProcessor, BatchReport, FileResult, FileStatus};
pub use crate::config::Config;
pub use crate::dsp::noise::{NoiseProfile, SpectralDenoiser};
pub use crate::enhance::{EnhanceReport, EnhanceStage, Enhancer};
pub use crate::extract::AudioExtractor;
pub use crate::presets::{EnhancePreset, PresetLibrary};
pub use crate::subtitles::{Cue, CueSettings, WordStamp};
pub use crate::subtitles::srt::{SrtEntry, SrtFile};
