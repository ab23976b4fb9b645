use ebur128::{EbuR128, Mode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::AudioBuffer;

/// Shortest clip the EBU R128 integrated measurement is trusted for.
/// Anything under one gating block falls back to RMS.
const MIN_LUFS_SECONDS: f64 = 0.4;

/// Which measurement drove a normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoudnessMode {
    Lufs,
    Rms,
}

/// Integrated loudness per EBU R128, if the material is long enough to
/// meter and the measurement is finite.
pub fn integrated_lufs(samples: &[f32], sample_rate: u32) -> Option<f64> {
    if (samples.len() as f64) < MIN_LUFS_SECONDS * sample_rate as f64 {
        return None;
    }
    let mut meter = EbuR128::new(1, sample_rate, Mode::I).ok()?;
    meter.add_frames_f32(samples).ok()?;
    let loudness = meter.loudness_global().ok()?;
    loudness.is_finite().then_some(loudness)
}

/// Scale the buffer to the target loudness. Uses the LUFS measurement when
/// available and falls back to treating the target as an RMS dBFS level for
/// short clips. Returns the applied gain in dB and the mode used.
pub fn normalize_loudness(buffer: &mut AudioBuffer, target_lufs: f32) -> (f32, LoudnessMode) {
    match integrated_lufs(&buffer.samples, buffer.sample_rate) {
        Some(measured) => {
            let gain_db = target_lufs - measured as f32;
            buffer.apply_gain_db(gain_db);
            debug!(
                "Loudness {:.1} LUFS -> target {:.1} LUFS ({:+.1} dB)",
                measured, target_lufs, gain_db
            );
            (gain_db, LoudnessMode::Lufs)
        }
        None => {
            let measured = buffer.rms_dbfs();
            let gain_db = target_lufs - measured;
            buffer.apply_gain_db(gain_db);
            debug!(
                "Clip too short to meter, RMS {:.1} dBFS -> {:.1} dBFS ({:+.1} dB)",
                measured, target_lufs, gain_db
            );
            (gain_db, LoudnessMode::Rms)
        }
    }
}
