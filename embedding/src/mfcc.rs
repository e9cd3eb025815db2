use std::f64::consts::PI;

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::EmbeddingError;

/// Configures cepstral feature extraction.
///
/// The defaults (40 coefficients over a 60-band mel filterbank, 25 ms
/// frames with 10 ms shift) are design-time constants tied to the
/// deployed embedding model, not universal truths; a different model
/// artifact needs its own config.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// Input sample rate in Hz (default: 16000).
    pub sample_rate: usize,
    /// Number of cepstral coefficients kept after the DCT (default: 40).
    pub n_mfcc: usize,
    /// Number of mel filterbank channels (default: 60).
    pub n_mels: usize,
    /// Frame length in samples (default: 400 = 25ms @ 16kHz).
    pub frame_length: usize,
    /// Frame shift in samples (default: 160 = 10ms @ 16kHz).
    pub frame_shift: usize,
    /// Low cutoff frequency for mel bins (default: 20 Hz).
    pub low_freq: f64,
    /// High cutoff frequency, non-positive = offset from Nyquist (default: -400).
    pub high_freq: f64,
    /// Floor for mel energies before the log (default: 1e-10).
    pub energy_floor: f64,
    /// Half-width of the delta regression window in frames (default: 2).
    pub delta_window: usize,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_mfcc: 40,
            n_mels: 60,
            frame_length: 400,
            frame_shift: 160,
            low_freq: 20.0,
            high_freq: -400.0,
            energy_floor: 1e-10,
            delta_window: 2,
        }
    }
}

impl MfccConfig {
    /// Width of one feature row: coefficients plus two delta banks.
    pub fn feature_width(&self) -> usize {
        self.n_mfcc * 3
    }
}

/// Computes a normalization-ready feature matrix for one segment.
///
/// Output shape is `frames x (3 * n_mfcc)`: cepstral coefficients with
/// first- and second-order time derivatives appended column-wise. The
/// offline-fitted feature scaler is applied by the caller, not here.
///
/// Fails with [`EmbeddingError::FeatureExtraction`] when the segment is
/// too short to produce a single frame.
pub fn compute_mfcc(samples: &[f32], cfg: &MfccConfig) -> Result<Array2<f32>, EmbeddingError> {
    if cfg.frame_length == 0 || cfg.frame_shift == 0 || cfg.n_mels == 0 || cfg.n_mfcc == 0 {
        return Err(EmbeddingError::FeatureExtraction(
            "frame length, frame shift, mel bands and coefficient count must be positive".into(),
        ));
    }
    if cfg.n_mfcc > cfg.n_mels {
        return Err(EmbeddingError::FeatureExtraction(format!(
            "cannot keep {} coefficients from {} mel bands",
            cfg.n_mfcc, cfg.n_mels
        )));
    }
    if samples.len() < cfg.frame_length {
        return Err(EmbeddingError::FeatureExtraction(format!(
            "segment too short for one frame: {} samples, need {}",
            samples.len(),
            cfg.frame_length
        )));
    }

    let num_frames = (samples.len() - cfg.frame_length) / cfg.frame_shift + 1;

    // FFT size: next power of 2 >= frame_length.
    let fft_size = next_pow2(cfg.frame_length);
    let half_fft = fft_size / 2 + 1;

    let window = hamming_window(cfg.frame_length);

    let high_freq = if cfg.high_freq <= 0.0 {
        cfg.sample_rate as f64 / 2.0 + cfg.high_freq
    } else {
        cfg.high_freq
    };
    let filterbank = mel_filterbank(cfg.n_mels, fft_size, cfg.sample_rate, cfg.low_freq, high_freq);
    let dct = dct_matrix(cfg.n_mfcc, cfg.n_mels);

    let fft = FftPlanner::<f64>::new().plan_fft_forward(fft_size);
    let mut fft_buf = vec![Complex::new(0.0f64, 0.0); fft_size];
    let mut power_spec = vec![0.0f64; half_fft];
    let mut mel_log = vec![0.0f64; cfg.n_mels];

    let mut cepstra = Vec::with_capacity(num_frames);
    for f in 0..num_frames {
        let offset = f * cfg.frame_shift;
        let frame = &samples[offset..offset + cfg.frame_length];

        for v in fft_buf.iter_mut() {
            *v = Complex::new(0.0, 0.0);
        }
        for (i, &s) in frame.iter().enumerate() {
            fft_buf[i] = Complex::new(s as f64 * window[i], 0.0);
        }
        fft.process(&mut fft_buf);

        for (k, p) in power_spec.iter_mut().enumerate() {
            *p = fft_buf[k].norm_sqr();
        }

        for (m, out) in mel_log.iter_mut().enumerate() {
            let mut energy: f64 = 0.0;
            for (k, &w) in filterbank[m].iter().enumerate() {
                energy += w * power_spec[k];
            }
            *out = energy.max(cfg.energy_floor).ln();
        }

        let mut ceps = vec![0.0f64; cfg.n_mfcc];
        for (k, c) in ceps.iter_mut().enumerate() {
            *c = dct[k].iter().zip(&mel_log).map(|(&d, &e)| d * e).sum();
        }
        cepstra.push(ceps);
    }

    let delta1 = delta(&cepstra, cfg.delta_window);
    let delta2 = delta(&delta1, cfg.delta_window);

    let width = cfg.feature_width();
    let mut features = Array2::<f32>::zeros((num_frames, width));
    for t in 0..num_frames {
        for c in 0..cfg.n_mfcc {
            features[[t, c]] = cepstra[t][c] as f32;
            features[[t, cfg.n_mfcc + c]] = delta1[t][c] as f32;
            features[[t, 2 * cfg.n_mfcc + c]] = delta2[t][c] as f32;
        }
    }
    Ok(features)
}

/// Regression-based time derivative over a `+-window` frame span.
/// Edge frames are handled by replicating the boundary frame.
fn delta(frames: &[Vec<f64>], window: usize) -> Vec<Vec<f64>> {
    let t_max = frames.len();
    let n_coef = frames[0].len();
    let window = window.max(1);
    let denom: f64 = 2.0 * (1..=window).map(|n| (n * n) as f64).sum::<f64>();

    let clamp = |t: isize| -> usize { t.clamp(0, t_max as isize - 1) as usize };

    let mut out = Vec::with_capacity(t_max);
    for t in 0..t_max as isize {
        let mut row = vec![0.0f64; n_coef];
        for n in 1..=window as isize {
            let ahead = &frames[clamp(t + n)];
            let behind = &frames[clamp(t - n)];
            for (c, v) in row.iter_mut().enumerate() {
                *v += n as f64 * (ahead[c] - behind[c]);
            }
        }
        for v in row.iter_mut() {
            *v /= denom;
        }
        out.push(row);
    }
    out
}

fn next_pow2(n: usize) -> usize {
    let mut p = 1;
    while p < n {
        p <<= 1;
    }
    p
}

fn hamming_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Computes triangular mel filterbank weights.
/// Returns `[n_mels][half_fft]` weights.
fn mel_filterbank(
    n_mels: usize,
    fft_size: usize,
    sample_rate: usize,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);

    // Equally spaced mel points.
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_low + i as f64 * (mel_high - mel_low) / (n_mels + 1) as f64)
        .collect();

    // Convert back to Hz and then to FFT bin indices.
    let bin_indices: Vec<usize> = mel_points
        .iter()
        .map(|&m| {
            let hz = mel_to_hz(m);
            let bin = (hz * fft_size as f64 / sample_rate as f64).floor() as isize;
            bin.max(0).min(half_fft as isize - 1) as usize
        })
        .collect();

    // Build triangular filters.
    let mut fb = Vec::with_capacity(n_mels);
    for m in 0..n_mels {
        let mut filter = vec![0.0f64; half_fft];
        let left = bin_indices[m];
        let center = bin_indices[m + 1];
        let right = bin_indices[m + 2];

        if center > left {
            for k in left..=center {
                filter[k] = (k - left) as f64 / (center - left) as f64;
            }
        }
        if right > center {
            for k in center..=right {
                filter[k] = (right - k) as f64 / (right - center) as f64;
            }
        }
        fb.push(filter);
    }
    fb
}

/// Orthonormal DCT-II matrix, `n_mfcc` rows over `n_mels` inputs.
fn dct_matrix(n_mfcc: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let mut dct = Vec::with_capacity(n_mfcc);
    for k in 0..n_mfcc {
        let scale = if k == 0 {
            (1.0 / n_mels as f64).sqrt()
        } else {
            (2.0 / n_mels as f64).sqrt()
        };
        let row: Vec<f64> = (0..n_mels)
            .map(|m| scale * (PI / n_mels as f64 * (m as f64 + 0.5) * k as f64).cos())
            .collect();
        dct.push(row);
    }
    dct
}
