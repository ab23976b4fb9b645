pub mod io;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced at the audio decode / DSP boundary.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio samples decoded from {0}")]
    Empty(PathBuf),

    #[error("unsupported sample format ({bits}-bit {format}) in {path}")]
    UnsupportedFormat {
        path: PathBuf,
        bits: u16,
        format: &'static str,
    },

    #[error("cutoff {cutoff} Hz must lie below the Nyquist frequency {nyquist} Hz")]
    CutoffAboveNyquist { cutoff: f32, nyquist: f32 },

    #[error("invalid band: lowcut {lowcut} Hz must be below highcut {highcut} Hz")]
    InvalidBand { lowcut: f32, highcut: f32 },
}

/// In-memory mono waveform, the unit of work for every pipeline stage.
///
/// Samples are `f32` in `[-1.0, 1.0]`; multi-channel sources are mixed down
/// at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Absolute peak sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    pub fn peak_dbfs(&self) -> f32 {
        linear_to_db(self.peak())
    }

    /// Root-mean-square level of the whole buffer.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / self.samples.len() as f64).sqrt() as f32
    }

    pub fn rms_dbfs(&self) -> f32 {
        linear_to_db(self.rms())
    }

    /// Replace NaN/Inf samples with silence. Returns how many were scrubbed.
    pub fn scrub_non_finite(&mut self) -> usize {
        let mut scrubbed = 0;
        for sample in &mut self.samples {
            if !sample.is_finite() {
                *sample = 0.0;
                scrubbed += 1;
            }
        }
        scrubbed
    }

    /// Apply a flat gain in dB to every sample.
    pub fn apply_gain_db(&mut self, gain_db: f32) {
        let factor = db_to_linear(gain_db);
        for sample in &mut self.samples {
            *sample *= factor;
        }
    }
}

/// Convert a linear amplitude to dBFS. Silence maps to a -120 dB floor.
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        return -120.0;
    }
    (20.0 * linear.log10()).max(-120.0)
}

pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}
