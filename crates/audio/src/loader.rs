//! Audio file loading.

use hound::WavReader;
use prep_core::{AudioBuffer, PrepError, PrepResult};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Load any supported audio file as a mono buffer.
///
/// `.wav` goes through hound, everything else (Common Voice ships mp3)
/// through symphonia.
pub fn load_audio(path: impl AsRef<Path>) -> PrepResult<AudioBuffer> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    let buffer = if is_wav {
        load_wav(path)?
    } else {
        decode_compressed(path)?
    };
    Ok(to_mono(&buffer))
}

/// Load a WAV file and return an AudioBuffer.
pub fn load_wav(path: impl AsRef<Path>) -> PrepResult<AudioBuffer> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|e| {
        PrepError::Audio(format!("Failed to open WAV {}: {}", path.display(), e))
    })?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate as usize;
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(PrepError::Audio(format!(
            "WAV without channels: {}",
            path.display()
        )));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PrepError::Audio(format!("Failed to read samples: {}", e)))?,
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1u32 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PrepError::Audio(format!("Failed to read samples: {}", e)))?
        }
    };

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

/// Декодирование сжатых форматов (mp3 и др.) через symphonia.
fn decode_compressed(path: &Path) -> PrepResult<AudioBuffer> {
    let audio_err = |what: &str, e: &dyn std::fmt::Display| {
        PrepError::Audio(format!("{what} {}: {e}", path.display()))
    };

    let file = File::open(path).map_err(|e| audio_err("Failed to open", &e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| audio_err("Unsupported container", &e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PrepError::Audio(format!("No audio track: {}", path.display())))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.map(|r| r as usize);
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| audio_err("Unsupported codec", &e))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(audio_err("Failed to read packet from", &e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Битый фрейм внутри потока: пропускаем его, как это делает ffmpeg.
            Err(SymphoniaError::DecodeError(msg)) => {
                debug!(path = %path.display(), msg, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(audio_err("Failed to decode", &e)),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate as usize);
        channels = Some(spec.channels.count());

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(PrepError::Audio(format!(
            "Unknown sample rate or channel layout: {}",
            path.display()
        )));
    };
    if samples.is_empty() {
        return Err(PrepError::Audio(format!("No samples decoded: {}", path.display())));
    }

    Ok(AudioBuffer::new(samples, sample_rate, channels.max(1)))
}

/// Convert stereo audio to mono by averaging channels.
pub fn to_mono(buffer: &AudioBuffer) -> AudioBuffer {
    if buffer.channels == 1 {
        return buffer.clone();
    }

    let mono_samples: Vec<f32> = buffer
        .samples
        .chunks(buffer.channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect();

    AudioBuffer::new(mono_samples, buffer.sample_rate, 1)
}
