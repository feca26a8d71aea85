//! Data-config (`config.yaml`) for speech-to-text training.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use prep_core::{ConfigEmitter, PrepResult, SpecAugmentPolicy};
use serde::{Deserialize, Serialize};
use tracing::info;

/// SpecAugment parameters as the training side expects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecAugmentParams {
    #[serde(rename = "time_wrap_W")]
    pub time_wrap_w: usize,
    #[serde(rename = "freq_mask_N")]
    pub freq_mask_n: usize,
    #[serde(rename = "freq_mask_F")]
    pub freq_mask_f: usize,
    #[serde(rename = "time_mask_N")]
    pub time_mask_n: usize,
    #[serde(rename = "time_mask_T")]
    pub time_mask_t: usize,
    pub time_mask_p: f64,
}

impl SpecAugmentParams {
    pub fn for_policy(policy: SpecAugmentPolicy) -> Self {
        let (freq_mask_n, freq_mask_f, time_mask_n, time_mask_t, time_mask_p) = match policy {
            SpecAugmentPolicy::Lb => (1, 27, 1, 100, 1.0),
            SpecAugmentPolicy::Ld => (2, 27, 2, 100, 1.0),
            SpecAugmentPolicy::Sm => (2, 15, 2, 70, 0.2),
            SpecAugmentPolicy::Ss => (2, 27, 2, 70, 0.2),
        };
        Self {
            time_wrap_w: 0,
            freq_mask_n,
            freq_mask_f,
            time_mask_n,
            time_mask_t,
            time_mask_p,
        }
    }
}

/// Vocabulary model reference.
///
/// `bpe` stays `sentencepiece` so the key layout matches what training configs
/// expect, but `sentencepiece_model` points at a `tokenizers` JSON file
/// (`Tokenizer::from_file`), not a sentencepiece protobuf. Consumers need a
/// loader for that format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpeTokenizerConfig {
    pub bpe: String,
    pub sentencepiece_model: String,
}

/// Contents of `config.yaml`.
///
/// Note: `bpe_tokenizer.sentencepiece_model` is a `tokenizers` JSON file,
/// see [`BpeTokenizerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub vocab_filename: String,
    pub input_channels: usize,
    pub input_feat_per_channel: usize,
    pub specaugment: SpecAugmentParams,
    pub bpe_tokenizer: BpeTokenizerConfig,
    pub sampling_alpha: f64,
    pub transforms: BTreeMap<String, Vec<String>>,
}

impl DataConfig {
    pub fn new(
        root: &Path,
        spm_filename: &str,
        policy: SpecAugmentPolicy,
        input_feat_per_channel: usize,
    ) -> Self {
        let vocab_filename = match spm_filename.strip_suffix(".model") {
            Some(stem) => format!("{stem}.txt"),
            None => format!("{spm_filename}.txt"),
        };

        let mut transforms = BTreeMap::new();
        transforms.insert(
            "_train".to_string(),
            vec!["utterance_cmvn".to_string(), "specaugment".to_string()],
        );
        transforms.insert("*".to_string(), vec!["utterance_cmvn".to_string()]);

        Self {
            vocab_filename,
            input_channels: 1,
            input_feat_per_channel,
            specaugment: SpecAugmentParams::for_policy(policy),
            bpe_tokenizer: BpeTokenizerConfig {
                bpe: "sentencepiece".to_string(),
                sentencepiece_model: root.join(spm_filename).to_string_lossy().into_owned(),
            },
            sampling_alpha: 1.0,
            transforms,
        }
    }
}

/// Writes `{root}/config.yaml`.
#[derive(Debug, Clone)]
pub struct YamlConfigEmitter {
    file_name: String,
    input_feat_per_channel: usize,
}

impl Default for YamlConfigEmitter {
    fn default() -> Self {
        Self {
            file_name: "config.yaml".to_string(),
            input_feat_per_channel: 80,
        }
    }
}

impl YamlConfigEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Число признаков на канал (по числу mel-бинов экстрактора).
    pub fn with_feature_dim(mut self, input_feat_per_channel: usize) -> Self {
        self.input_feat_per_channel = input_feat_per_channel;
        self
    }
}

impl ConfigEmitter for YamlConfigEmitter {
    fn emit(
        &self,
        root: &Path,
        spm_filename: &str,
        specaugment_policy: SpecAugmentPolicy,
    ) -> PrepResult<PathBuf> {
        let config = DataConfig::new(
            root,
            spm_filename,
            specaugment_policy,
            self.input_feat_per_channel,
        );
        let path = root.join(&self.file_name);
        std::fs::write(&path, serde_yaml::to_string(&config)?)?;
        info!(path = %path.display(), policy = %specaugment_policy, "Wrote data config");
        Ok(path)
    }
}
