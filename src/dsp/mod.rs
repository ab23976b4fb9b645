pub mod dynamics;
pub mod filters;
pub mod loudness;
pub mod noise;

pub use dynamics::{compress, de_ess, peak_ceiling, saturate};
pub use filters::{band_limit, band_pass, Biquad};
pub use loudness::{integrated_lufs, normalize_loudness, LoudnessMode};
pub use noise::{NoiseProfile, SpectralDenoiser};
