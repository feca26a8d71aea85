//! Vocabulary and data-config outputs of a preparation run.
//!
//! - [`SubwordTrainer`]: trains `spm_*` vocabularies with `tokenizers`
//! - [`YamlConfigEmitter`]: writes `config.yaml` for speech-to-text training

pub mod config_yaml;
pub mod trainer;

pub use config_yaml::{DataConfig, SpecAugmentParams, YamlConfigEmitter};
pub use trainer::{SPECIAL_SYMBOLS, SubwordTrainer, vocab_prefix};
