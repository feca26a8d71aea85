//! Integration tests: WAV on disk -> fbank `.npy` on disk.

use std::path::Path;

use audio::{FbankExtractor, load_audio};
use prep_core::FeatureExtractor;

/// Parse a float32 `.npy` file into (shape, data).
fn load_npy_f32(path: impl AsRef<Path>) -> Result<(Vec<usize>, Vec<f32>), String> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| format!("Failed to read file: {}", e))?;

    if bytes.len() < 10 || &bytes[0..6] != b"\x93NUMPY" {
        return Err("Not a valid .npy file".to_string());
    }

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let header = std::str::from_utf8(&bytes[10..10 + header_len]).map_err(|e| e.to_string())?;
    if !header.contains("'<f4'") {
        return Err(format!("Not a float32 array: {header}"));
    }
    let shape_str = header
        .split("'shape': (")
        .nth(1)
        .and_then(|rest| rest.split(')').next())
        .ok_or("No shape in header")?;
    let shape: Vec<usize> = shape_str
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<usize>().map_err(|e| e.to_string()))
        .collect::<Result<_, _>>()?;

    let data = bytes[10 + header_len..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok((shape, data))
}

fn write_sine_wav(path: &Path, sample_rate: u32, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let n = (sample_rate as f32 * seconds) as usize;
    for i in 0..n {
        let t = i as f32 / sample_rate as f32;
        let v = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
        writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_fbank_from_48k_wav() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("sine.wav");
    let npy = dir.path().join("sine.wav.npy");
    write_sine_wav(&wav, 48000, 1.0);

    let audio = load_audio(&wav).unwrap();
    assert_eq!(audio.sample_rate, 48000);

    FbankExtractor::default().extract(&audio, &npy).unwrap();

    let (shape, data) = load_npy_f32(&npy).unwrap();
    // 1 s at 16 kHz, 25 ms window, 10 ms shift
    assert_eq!(shape, vec![98, 80]);
    assert_eq!(data.len(), 98 * 80);
    assert!(data.iter().all(|v| v.is_finite()));
}

#[test]
fn test_fbank_energy_peaks_near_440hz() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("sine.wav");
    let npy = dir.path().join("sine.npy");
    write_sine_wav(&wav, 16000, 0.5);

    let audio = load_audio(&wav).unwrap();
    FbankExtractor::default().extract(&audio, &npy).unwrap();
    let (shape, data) = load_npy_f32(&npy).unwrap();

    // Средний спектр по фреймам: максимум должен быть в нижней четверти бинов.
    let n_mels = shape[1];
    let mut mean = vec![0.0_f32; n_mels];
    for frame in data.chunks_exact(n_mels) {
        for (m, v) in frame.iter().enumerate() {
            mean[m] += v / shape[0] as f32;
        }
    }
    let peak = mean
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert!(peak < n_mels / 4, "peak bin {peak}");
}
