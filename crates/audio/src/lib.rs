//! # audio
//!
//! Аудио-часть подготовки корпуса: от файла клипа до `.npy` с признаками.
//!
//! - [`load_audio`]: WAV через hound, mp3 и прочее через symphonia, сведение в mono
//! - [`Resampler`]: приведение к 16 кГц (rubato)
//! - [`MelSpectrogramExtractor`]: log-mel filterbank (rustfft)
//! - [`FbankExtractor`]: всё вместе, реализация `FeatureExtractor`

pub mod fbank;
pub mod loader;
pub mod mel;
pub mod resample;

pub use fbank::FbankExtractor;
pub use loader::{load_audio, load_wav, to_mono};
pub use mel::MelSpectrogramExtractor;
pub use resample::Resampler;
