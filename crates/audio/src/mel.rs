//! Log-mel filterbank в стиле Kaldi fbank: HTK mel-шкала, ln, окно 25 мс
//! без центрирования (только полные окна внутри сигнала).
//!
//! Фильтры хранятся разреженно: у треугольного фильтра ненулевых бинов
//! единицы-десятки, а не `n_fft / 2 + 1`.

use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use candle_core::{Device, Tensor};
use prep_core::{FeatureExtractorConfig, PrepResult};
use rustfft::{Fft, FftPlanner, num_complex::Complex};

const LOG_FLOOR: f32 = 1e-10;

/// Один треугольный фильтр: веса для бинов `first_bin..first_bin + weights.len()`.
#[derive(Debug, Clone)]
struct MelFilter {
    first_bin: usize,
    weights: Vec<f32>,
}

impl MelFilter {
    fn apply(&self, power: &[f32]) -> f32 {
        power[self.first_bin..]
            .iter()
            .zip(&self.weights)
            .map(|(p, w)| p * w)
            .sum()
    }
}

/// Параметризованный mel-экстрактор. FFT планируется один раз при создании.
pub struct MelSpectrogramExtractor {
    config: FeatureExtractorConfig,
    window: Vec<f32>,
    filters: Vec<MelFilter>,
    fft: Arc<dyn Fft<f32>>,
}

impl fmt::Debug for MelSpectrogramExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MelSpectrogramExtractor")
            .field("config", &self.config)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl MelSpectrogramExtractor {
    pub fn new(config: FeatureExtractorConfig) -> Self {
        let window = padded_hann_window(config.win_length, config.n_fft);
        let filters = mel_filterbank(&config);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(config.n_fft);
        Self {
            config,
            window,
            filters,
            fft,
        }
    }

    pub fn config(&self) -> &FeatureExtractorConfig {
        &self.config
    }

    /// Количество фреймов для сигнала длины `num_samples`.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples < self.config.win_length {
            0
        } else {
            1 + (num_samples - self.config.win_length) / self.config.hop_length
        }
    }

    /// Log-mel признаки формы `[frames, n_mels]`.
    ///
    /// `samples`: mono в [-1, 1] с частотой `config.sample_rate`.
    pub fn extract(&self, samples: &[f32], device: &Device) -> PrepResult<Tensor> {
        let n_mels = self.config.n_mels;
        let num_frames = self.num_frames(samples.len());
        let n_freqs = self.config.n_fft / 2 + 1;

        let mut buffer = vec![Complex::new(0.0_f32, 0.0); self.config.n_fft];
        let mut power = vec![0.0_f32; n_freqs];
        let mut features = Vec::with_capacity(num_frames * n_mels);

        for frame in 0..num_frames {
            self.fill_frame(samples, frame, &mut buffer);
            self.fft.process(&mut buffer);
            for (p, c) in power.iter_mut().zip(&buffer) {
                *p = c.norm_sqr();
            }
            features.extend(
                self.filters
                    .iter()
                    .map(|filter| filter.apply(&power).max(LOG_FLOOR).ln()),
            );
        }

        Ok(Tensor::from_vec(features, (num_frames, n_mels), device)?)
    }

    /// Оконный фрейм `frame` в `buffer`: окно начинается в `frame * hop`.
    fn fill_frame(&self, samples: &[f32], frame: usize, buffer: &mut [Complex<f32>]) {
        let start = frame * self.config.hop_length;
        let signal = &samples[start..(start + self.config.n_fft).min(samples.len())];
        let scale = self.config.input_scale;

        for (i, (slot, &w)) in buffer.iter_mut().zip(&self.window).enumerate() {
            let value = signal.get(i).map_or(0.0, |s| s * scale * w);
            *slot = Complex::new(value, 0.0);
        }
    }
}

/// Periodic Hann window of `win_length`, zero-padded to `n_fft`.
fn padded_hann_window(win_length: usize, n_fft: usize) -> Vec<f32> {
    let win_length = win_length.min(n_fft);
    let mut window: Vec<f32> = (0..win_length)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / win_length as f32).cos()))
        .collect();
    window.resize(n_fft, 0.0);
    window
}

fn hz_to_mel(hz: f32) -> f32 {
    1127.0 * (1.0 + hz / 700.0).ln()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * ((mel / 1127.0).exp() - 1.0)
}

/// Треугольные фильтры, равномерно распределённые по mel-шкале;
/// вершина каждого треугольника равна 1.
fn mel_filterbank(config: &FeatureExtractorConfig) -> Vec<MelFilter> {
    let n_mels = config.n_mels;
    let n_freqs = config.n_fft / 2 + 1;
    let bin_hz = config.sample_rate as f32 / config.n_fft as f32;

    let mel_lo = hz_to_mel(config.f_min);
    let mel_hi = hz_to_mel(config.f_max);
    let step = (mel_hi - mel_lo) / (n_mels + 1) as f32;
    let edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_lo + i as f32 * step))
        .collect();

    edges
        .windows(3)
        .map(|edge| {
            let (left, center, right) = (edge[0], edge[1], edge[2]);
            let weight = |k: usize| {
                let hz = k as f32 * bin_hz;
                if hz >= left && hz < center {
                    (hz - left) / (center - left)
                } else if hz >= center && hz <= right {
                    (right - hz) / (right - center)
                } else {
                    0.0
                }
            };

            let first_bin = (0..n_freqs).find(|&k| weight(k) > 0.0).unwrap_or(n_freqs);
            let last_bin = (first_bin..n_freqs)
                .rev()
                .find(|&k| weight(k) > 0.0)
                .unwrap_or(first_bin);
            let weights = if first_bin < n_freqs {
                (first_bin..=last_bin).map(weight).collect()
            } else {
                Vec::new()
            };
            MelFilter {
                first_bin: first_bin.min(n_freqs),
                weights,
            }
        })
        .collect()
}
