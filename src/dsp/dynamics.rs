use tracing::debug;

use crate::audio::{db_to_linear, AudioError};

use super::filters::band_pass;

/// Static compression: samples above the threshold are pulled toward it.
///
/// `ratio: None` reproduces the hard clip the original scripts used; a
/// finite ratio divides the overshoot instead.
pub fn compress(samples: &mut [f32], threshold: f32, ratio: Option<f32>) {
    let threshold = threshold.abs().max(1e-6);
    for sample in samples.iter_mut() {
        let magnitude = sample.abs();
        if magnitude <= threshold {
            continue;
        }
        let reduced = match ratio {
            Some(ratio) if ratio > 1.0 => threshold + (magnitude - threshold) / ratio,
            _ => threshold,
        };
        *sample = sample.signum() * reduced;
    }
}

/// Nonlinear tanh shaping for harmonic warmth.
pub fn saturate(samples: &mut [f32], gain: f32) {
    for sample in samples.iter_mut() {
        *sample = (*sample * gain).tanh();
    }
}

/// Attenuate the sibilance band by subtracting a scaled band-pass copy.
///
/// The upper band edge is clamped under Nyquist for low-rate material; if
/// the whole band falls outside the representable range the stage is
/// skipped and `None` is returned.
pub fn de_ess(
    samples: &[f32],
    sample_rate: u32,
    band_low_hz: f32,
    band_high_hz: f32,
    amount: f32,
) -> Result<Option<Vec<f32>>, AudioError> {
    let max_hz = sample_rate as f32 * 0.45;
    if band_low_hz >= max_hz {
        debug!(
            "Sibilance band {}-{} Hz outside {} Hz material, skipping de-esser",
            band_low_hz, band_high_hz, sample_rate
        );
        return Ok(None);
    }
    let high = band_high_hz.min(max_hz);

    let sibilant = band_pass(samples, sample_rate, band_low_hz, high)?;
    let out = samples
        .iter()
        .zip(sibilant.iter())
        .map(|(&x, &s)| x - amount * s)
        .collect();
    Ok(Some(out))
}

/// Enforce a peak ceiling by gain reduction only. A buffer already under the
/// ceiling is left untouched.
pub fn peak_ceiling(samples: &mut [f32], ceiling_dbfs: f32) -> f32 {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    let ceiling = db_to_linear(ceiling_dbfs);
    if peak <= ceiling || peak == 0.0 {
        return 0.0;
    }
    let factor = ceiling / peak;
    for sample in samples.iter_mut() {
        *sample *= factor;
    }
    20.0 * factor.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> Vec<f32> {
        let count = (sample_rate as f32 * seconds) as usize;
        (0..count)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * amplitude)
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_hard_clip() {
        let mut samples = vec![0.2, -0.9, 0.9, 0.74];
        compress(&mut samples, 0.75, None);
        assert_eq!(samples, vec![0.2, -0.75, 0.75, 0.74]);
    }

    #[test]
    fn test_soft_ratio() {
        let mut samples = vec![0.95f32];
        compress(&mut samples, 0.75, Some(2.0));
        assert!((samples[0] - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_saturation_is_bounded() {
        let mut samples = vec![-5.0, -0.5, 0.0, 0.5, 5.0];
        saturate(&mut samples, 1.2);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        assert_eq!(samples[2], 0.0);
        assert!(samples[3] > 0.0 && samples[1] < 0.0);
    }

    #[test]
    fn test_de_ess_reduces_sibilance() {
        let input = sine(6_000.0, 44_100, 0.5, 0.5);
        let output = de_ess(&input, 44_100, 4_000.0, 8_000.0, 0.45)
            .unwrap()
            .unwrap();
        assert_eq!(output.len(), input.len());
        assert!(rms(&output) < 0.8 * rms(&input));
    }

    #[test]
    fn test_de_ess_leaves_voice_band_alone() {
        let input = sine(300.0, 44_100, 0.5, 0.5);
        let output = de_ess(&input, 44_100, 4_000.0, 8_000.0, 0.45)
            .unwrap()
            .unwrap();
        let ratio = rms(&output) / rms(&input);
        assert!(ratio > 0.95, "voice band touched, ratio {ratio}");
    }

    #[test]
    fn test_de_ess_skips_when_band_unrepresentable() {
        let input = sine(1_000.0, 8_000, 0.25, 0.5);
        let result = de_ess(&input, 8_000, 4_000.0, 8_000.0, 0.45).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_peak_ceiling_attenuates_only() {
        let mut loud = vec![0.0, 0.5, -1.0];
        let gain = peak_ceiling(&mut loud, -6.0);
        assert!(gain < 0.0);
        assert!(loud.iter().fold(0.0f32, |a, s| a.max(s.abs())) <= db_to_linear(-6.0) + 1e-6);

        let mut quiet = vec![0.0, 0.1, -0.1];
        let gain = peak_ceiling(&mut quiet, -1.0);
        assert_eq!(gain, 0.0);
        assert_eq!(quiet, vec![0.0, 0.1, -0.1]);
    }
}
