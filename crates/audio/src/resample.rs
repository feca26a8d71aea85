//! Передискретизация через rubato.

use prep_core::{AudioBuffer, PrepError, PrepResult};
use rubato::{FftFixedInOut, Resampler as _};

/// Приводит mono-аудио к целевой частоте дискретизации.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    target_rate: usize,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(16000)
    }
}

impl Resampler {
    pub fn new(target_rate: usize) -> Self {
        Self { target_rate }
    }

    /// Выход содержит ровно `round(len * target / source)` отсчётов;
    /// задержка FFT-фильтра срезается.
    pub fn resample(&self, buffer: &AudioBuffer) -> PrepResult<AudioBuffer> {
        if buffer.sample_rate == self.target_rate {
            return Ok(buffer.clone());
        }
        if buffer.channels != 1 {
            return Err(PrepError::Audio(format!(
                "resampling expects mono audio, got {} channels",
                buffer.channels
            )));
        }
        if buffer.sample_rate == 0 {
            return Err(PrepError::Audio("source sample rate is zero".to_string()));
        }

        let samples = resample_mono(&buffer.samples, buffer.sample_rate, self.target_rate)?;
        Ok(AudioBuffer::new(samples, self.target_rate, 1))
    }
}

fn resample_mono(input: &[f32], from: usize, to: usize) -> PrepResult<Vec<f32>> {
    let rubato_err = |e: &dyn std::fmt::Display| PrepError::Audio(format!("resampler: {e}"));

    let mut resampler = FftFixedInOut::<f32>::new(from, to, 1024, 1).map_err(|e| rubato_err(&e))?;

    // Размер чанка rubato подбирает сам под НОД частот.
    let chunk = resampler.input_frames_next();
    let delay = resampler.output_delay();
    let wanted = (input.len() as f64 * to as f64 / from as f64).round() as usize;

    let mut output = Vec::with_capacity(wanted + delay + resampler.output_frames_next());
    let mut frame = vec![0.0_f32; chunk];
    let mut offset = 0;

    // Хвост сигнала добивается нулями, пока выход не покроет задержку.
    while output.len() < wanted + delay {
        frame.fill(0.0);
        if offset < input.len() {
            let end = (offset + chunk).min(input.len());
            frame[..end - offset].copy_from_slice(&input[offset..end]);
        }
        let processed = resampler
            .process(&[&frame[..]], None)
            .map_err(|e| rubato_err(&e))?;
        output.extend_from_slice(&processed[0]);
        offset += chunk;
    }

    output.drain(..delay);
    output.truncate(wanted);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_passthrough() {
        let buffer = AudioBuffer::new(vec![0.5; 1024], 16000, 1);
        let result = Resampler::new(16000).resample(&buffer).unwrap();
        assert_eq!(result.samples, buffer.samples);
    }

    #[test]
    fn test_48k_to_16k_length() {
        let buffer = AudioBuffer::new(vec![0.25; 48000], 48000, 1);
        let result = Resampler::default().resample(&buffer).unwrap();
        assert_eq!(result.sample_rate, 16000);
        assert_eq!(result.samples.len(), 16000);
    }

    #[test]
    fn test_22050_to_16k_length() {
        let buffer = AudioBuffer::new(vec![0.0; 22050 / 2], 22050, 1);
        let result = Resampler::default().resample(&buffer).unwrap();
        assert_eq!(result.samples.len(), 8000);
    }

    #[test]
    fn test_stereo_rejected() {
        let buffer = AudioBuffer::new(vec![0.0; 4096], 48000, 2);
        assert!(matches!(
            Resampler::new(16000).resample(&buffer),
            Err(PrepError::Audio(_))
        ));
    }
}
