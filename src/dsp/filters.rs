use std::f32::consts::{FRAC_1_SQRT_2, PI};

use crate::audio::AudioError;

/// Second-order IIR section (RBJ cookbook coefficients, a0 normalized out).
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Biquad {
    /// Low-pass section at Butterworth Q.
    pub fn lowpass(sample_rate: u32, cutoff_hz: f32) -> Result<Self, AudioError> {
        let omega = normalized_omega(sample_rate, cutoff_hz)?;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * FRAC_1_SQRT_2);

        let b1 = 1.0 - cos_w;
        let b0 = b1 / 2.0;
        Ok(Self::normalized(b0, b1, b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha))
    }

    /// High-pass section at Butterworth Q.
    pub fn highpass(sample_rate: u32, cutoff_hz: f32) -> Result<Self, AudioError> {
        let omega = normalized_omega(sample_rate, cutoff_hz)?;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * FRAC_1_SQRT_2);

        let b1 = -(1.0 + cos_w);
        let b0 = -b1 / 2.0;
        Ok(Self::normalized(b0, b1, b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha))
    }

    /// Band-pass section (constant 0 dB peak gain) centered on the geometric
    /// mean of the band edges.
    pub fn bandpass(sample_rate: u32, low_hz: f32, high_hz: f32) -> Result<Self, AudioError> {
        if low_hz >= high_hz {
            return Err(AudioError::InvalidBand {
                lowcut: low_hz,
                highcut: high_hz,
            });
        }
        let center = (low_hz * high_hz).sqrt();
        let q = center / (high_hz - low_hz);

        let omega = normalized_omega(sample_rate, center)?;
        let (sin_w, cos_w) = omega.sin_cos();
        let alpha = sin_w / (2.0 * q);

        Ok(Self::normalized(
            alpha,
            0.0,
            -alpha,
            1.0 + alpha,
            -2.0 * cos_w,
            1.0 - alpha,
        ))
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Run the section over a block, starting from rest (direct form II
    /// transposed).
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let mut z1 = 0.0f32;
        let mut z2 = 0.0f32;
        input
            .iter()
            .map(|&x| {
                let y = self.b0 * x + z1;
                z1 = self.b1 * x - self.a1 * y + z2;
                z2 = self.b2 * x - self.a2 * y;
                y
            })
            .collect()
    }
}

fn normalized_omega(sample_rate: u32, cutoff_hz: f32) -> Result<f32, AudioError> {
    let nyquist = sample_rate as f32 / 2.0;
    if cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
        return Err(AudioError::CutoffAboveNyquist {
            cutoff: cutoff_hz,
            nyquist,
        });
    }
    Ok(2.0 * PI * cutoff_hz / sample_rate as f32)
}

/// Run a filter cascade forward and backward over the block, cancelling the
/// phase shift (`filtfilt` semantics). Doubles the effective filter order.
pub fn filtfilt(sections: &[Biquad], input: &[f32]) -> Vec<f32> {
    let mut out = input.to_vec();
    for section in sections {
        out = section.apply(&out);
    }
    out.reverse();
    for section in sections {
        out = section.apply(&out);
    }
    out.reverse();
    out
}

/// Band-limit a block to `[lowcut, highcut]` with zero-phase high-pass and
/// low-pass sections. This is the equalization stage of the enhancement
/// chain.
pub fn band_limit(
    input: &[f32],
    sample_rate: u32,
    lowcut_hz: f32,
    highcut_hz: f32,
) -> Result<Vec<f32>, AudioError> {
    if lowcut_hz >= highcut_hz {
        return Err(AudioError::InvalidBand {
            lowcut: lowcut_hz,
            highcut: highcut_hz,
        });
    }
    let sections = [
        Biquad::highpass(sample_rate, lowcut_hz)?,
        Biquad::lowpass(sample_rate, highcut_hz)?,
    ];
    Ok(filtfilt(&sections, input))
}

/// Single-pass band-pass used to isolate a frequency band (sibilance
/// detection).
pub fn band_pass(
    input: &[f32],
    sample_rate: u32,
    low_hz: f32,
    high_hz: f32,
) -> Result<Vec<f32>, AudioError> {
    let section = Biquad::bandpass(sample_rate, low_hz, high_hz)?;
    Ok(section.apply(input))
}
