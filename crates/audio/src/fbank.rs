//! Log-mel filterbank признаки, сохраняемые в `.npy`.

use std::path::Path;

use candle_core::Device;
use prep_core::{AudioBuffer, FeatureExtractor, FeatureExtractorConfig, PrepError, PrepResult};
use tracing::debug;

use crate::loader::to_mono;
use crate::mel::MelSpectrogramExtractor;
use crate::resample::Resampler;

/// Экстрактор fbank-признаков: mono → ресемплинг → log-mel → `[n_frames, n_mels]` f32 в `.npy`.
#[derive(Debug)]
pub struct FbankExtractor {
    mel: MelSpectrogramExtractor,
    device: Device,
}

impl FbankExtractor {
    pub fn new(config: FeatureExtractorConfig) -> Self {
        Self {
            mel: MelSpectrogramExtractor::new(config),
            device: Device::Cpu,
        }
    }

    pub fn n_mels(&self) -> usize {
        self.mel.config().n_mels
    }
}

impl Default for FbankExtractor {
    fn default() -> Self {
        Self::new(FeatureExtractorConfig::fbank80())
    }
}

impl FeatureExtractor for FbankExtractor {
    fn extract(&self, audio: &AudioBuffer, destination: &Path) -> PrepResult<()> {
        if audio.channels == 0 {
            return Err(PrepError::Feature("audio buffer without channels".to_string()));
        }
        let mono = to_mono(audio);
        let resampled = Resampler::new(self.mel.config().sample_rate).resample(&mono)?;

        let features = self.mel.extract(&resampled.samples, &self.device)?;
        debug!(
            path = %destination.display(),
            frames = features.dims()[0],
            "Writing fbank features"
        );
        features.write_npy(destination)?;
        Ok(())
    }
}
