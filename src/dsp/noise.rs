use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use tracing::debug;

const EPSILON: f32 = 1e-10;

/// Per-bin noise magnitude estimate used for spectral gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseProfile {
    fft_size: usize,
    magnitudes: Vec<f32>,
}

impl NoiseProfile {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// STFT spectral-subtraction denoiser.
///
/// Frames are Hann-windowed, gated per frequency bin against a noise
/// profile, and resynthesized by overlap-add with window-sum
/// renormalization. Without an explicit profile the quietest frames of the
/// signal itself stand in for one.
#[derive(Debug, Clone)]
pub struct SpectralDenoiser {
    fft_size: usize,
    hop_size: usize,
    /// Fraction of the gated energy removed, 0.0..=1.0.
    prop_decrease: f32,
    /// Multiplier on the noise profile before gating.
    sensitivity: f32,
}

impl SpectralDenoiser {
    pub fn new(prop_decrease: f32) -> Self {
        Self {
            fft_size: 1024,
            hop_size: 256,
            prop_decrease: prop_decrease.clamp(0.0, 1.0),
            sensitivity: 1.5,
        }
    }

    pub fn with_fft_params(mut self, fft_size: usize, hop_size: usize) -> Self {
        self.fft_size = fft_size.max(64);
        self.hop_size = hop_size.clamp(1, self.fft_size);
        self
    }

    /// Build a noise profile from a recording of room tone.
    pub fn profile(&self, noise_clip: &[f32]) -> NoiseProfile {
        let frames = self.stft(noise_clip);
        let bins = self.fft_size / 2 + 1;
        let mut magnitudes = vec![0.0f32; bins];
        for frame in &frames {
            for (bin, value) in magnitudes.iter_mut().enumerate() {
                *value += frame[bin].norm();
            }
        }
        let count = frames.len().max(1) as f32;
        for value in &mut magnitudes {
            *value /= count;
        }
        NoiseProfile {
            fft_size: self.fft_size,
            magnitudes,
        }
    }

    /// Denoise a block. Output length always equals input length.
    pub fn reduce(&self, samples: &[f32], profile: Option<&NoiseProfile>) -> Vec<f32> {
        if samples.is_empty() || self.prop_decrease == 0.0 {
            return samples.to_vec();
        }

        let mut spectra = self.stft(samples);
        let bins = self.fft_size / 2 + 1;

        let profile = match profile {
            Some(p) if p.fft_size == self.fft_size => p.clone(),
            Some(p) => {
                debug!(
                    "Noise profile FFT size {} does not match denoiser {}, re-estimating",
                    p.fft_size, self.fft_size
                );
                self.estimate_profile(&spectra, bins)
            }
            None => self.estimate_profile(&spectra, bins),
        };

        let floor = 1.0 - self.prop_decrease;
        for frame in &mut spectra {
            let mut gains = vec![1.0f32; bins];
            for bin in 0..bins {
                let magnitude = frame[bin].norm();
                let noise = profile.magnitudes[bin] * self.sensitivity;
                let suppression = (noise / (magnitude + EPSILON)).min(1.0);
                gains[bin] = (1.0 - self.prop_decrease * suppression).max(floor);
            }
            smooth(&mut gains);
            for bin in 0..bins {
                frame[bin] *= gains[bin];
                // Mirror the conjugate half so the inverse transform stays real
                if bin > 0 && bin < self.fft_size - bin {
                    frame[self.fft_size - bin] *= gains[bin];
                }
            }
        }

        self.overlap_add(&spectra, samples.len())
    }

    /// Mean magnitude of the quietest tenth of frames, the stationary-noise
    /// stand-in when no room-tone clip was supplied.
    fn estimate_profile(&self, spectra: &[Vec<Complex<f32>>], bins: usize) -> NoiseProfile {
        let mut energies: Vec<(usize, f32)> = spectra
            .iter()
            .enumerate()
            .map(|(i, frame)| (i, frame[..bins].iter().map(|c| c.norm_sqr()).sum()))
            .collect();
        energies.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let quiet_count = (energies.len() / 10).max(1).min(energies.len());

        let mut magnitudes = vec![0.0f32; bins];
        for &(index, _) in energies.iter().take(quiet_count) {
            for (bin, value) in magnitudes.iter_mut().enumerate() {
                *value += spectra[index][bin].norm();
            }
        }
        for value in &mut magnitudes {
            *value /= quiet_count as f32;
        }
        NoiseProfile {
            fft_size: self.fft_size,
            magnitudes,
        }
    }

    fn stft(&self, samples: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let window = hann_window(self.fft_size);
        let padded_len = samples.len().max(self.fft_size);
        let frame_count = 1 + (padded_len - self.fft_size).div_ceil(self.hop_size);

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(self.fft_size);

        let mut frames = Vec::with_capacity(frame_count);
        for frame_index in 0..frame_count {
            let start = frame_index * self.hop_size;
            let mut buffer = vec![Complex::new(0.0f32, 0.0f32); self.fft_size];
            for (offset, slot) in buffer.iter_mut().enumerate() {
                let sample = samples.get(start + offset).copied().unwrap_or(0.0);
                slot.re = sample * window[offset];
            }
            fft.process(&mut buffer);
            frames.push(buffer);
        }
        frames
    }

    fn overlap_add(&self, spectra: &[Vec<Complex<f32>>], output_len: usize) -> Vec<f32> {
        let window = hann_window(self.fft_size);
        let padded_len = (spectra.len() - 1) * self.hop_size + self.fft_size;

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(self.fft_size);
        let scale = 1.0 / self.fft_size as f32;

        let mut output = vec![0.0f32; padded_len];
        let mut window_sum = vec![0.0f32; padded_len];

        for (frame_index, spectrum) in spectra.iter().enumerate() {
            let start = frame_index * self.hop_size;
            let mut buffer = spectrum.clone();
            ifft.process(&mut buffer);
            for offset in 0..self.fft_size {
                output[start + offset] += buffer[offset].re * scale * window[offset];
                window_sum[start + offset] += window[offset] * window[offset];
            }
        }

        for (sample, &weight) in output.iter_mut().zip(window_sum.iter()) {
            if weight > 1e-8 {
                *sample /= weight;
            }
        }

        output.truncate(output_len);
        output
    }
}

impl Default for SpectralDenoiser {
    fn default() -> Self {
        Self::new(0.9)
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Three-tap smoothing so isolated bins do not gate on and off audibly.
fn smooth(gains: &mut [f32]) {
    if gains.len() < 3 {
        return;
    }
    let original = gains.to_vec();
    for i in 1..gains.len() - 1 {
        gains[i] = (original[i - 1] + original[i] + original[i + 1]) / 3.0;
    }
}
