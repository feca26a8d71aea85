//! Конфигурационные структуры подготовки корпуса.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

/// Разбиения корпуса, обрабатываемые по умолчанию.
pub const DEFAULT_SPLITS: &[&str] = &["train", "dev", "test"];

/// Колонки TSV-манифеста в фиксированном порядке.
pub const MANIFEST_COLUMNS: &[&str] = &["id", "audio", "n_frames", "tgt_text", "speaker"];

/// Языковой тег корня, для которого обрабатываются не-train разбиения.
pub const DEFAULT_REFERENCE_LANG: &str = "gn";

/// Конфигурация прогона подготовки корпуса.
///
/// Все поля неизменяемы на протяжении прогона и передаются оркестратору
/// целиком, вместо глобальных констант.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Имена разбиений в порядке обработки.
    pub splits: Vec<String>,

    /// Порядок колонок манифеста.
    pub manifest_columns: Vec<String>,

    /// Языковой тег корня, которому разрешены не-train разбиения.
    pub reference_lang: String,

    /// Имя общей директории признаков внутри целевого корня.
    pub feature_dir_name: String,

    /// Имя архива признаков внутри целевого корня.
    pub archive_name: String,

    /// Политика SpecAugment для итогового конфига.
    pub specaugment_policy: SpecAugmentPolicy,

    /// Тип словаря.
    pub vocab_type: VocabType,

    /// Размер словаря (игнорируется в имени для `char`).
    pub vocab_size: usize,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            splits: DEFAULT_SPLITS.iter().map(|s| s.to_string()).collect(),
            manifest_columns: MANIFEST_COLUMNS.iter().map(|s| s.to_string()).collect(),
            reference_lang: DEFAULT_REFERENCE_LANG.to_string(),
            feature_dir_name: "fbank80".to_string(),
            archive_name: "fbank80.zip".to_string(),
            specaugment_policy: SpecAugmentPolicy::Ld,
            vocab_type: VocabType::Unigram,
            vocab_size: 10_000,
        }
    }
}

impl PrepConfig {
    /// Конфигурация по умолчанию с заданным словарём.
    pub fn new(vocab_type: VocabType, vocab_size: usize) -> Self {
        Self {
            vocab_type,
            vocab_size,
            ..Self::default()
        }
    }

    /// Заменить языковой тег для не-train разбиений.
    pub fn with_reference_lang(mut self, lang: impl Into<String>) -> Self {
        self.reference_lang = lang.into();
        self
    }

    /// Заменить политику SpecAugment.
    pub fn with_specaugment_policy(mut self, policy: SpecAugmentPolicy) -> Self {
        self.specaugment_policy = policy;
        self
    }

    /// Проверить конфигурацию до начала работы.
    pub fn validate(&self) -> Result<(), PrepError> {
        if self.splits.is_empty() {
            return Err(PrepError::Config("split list is empty".to_string()));
        }
        if !self.splits.iter().any(|s| s == "train") {
            return Err(PrepError::Config(
                "split list must contain \"train\"".to_string(),
            ));
        }
        if self.manifest_columns.is_empty() {
            return Err(PrepError::Config("manifest column list is empty".to_string()));
        }
        if let Some(unknown) = self
            .manifest_columns
            .iter()
            .find(|c| !MANIFEST_COLUMNS.contains(&c.as_str()))
        {
            return Err(PrepError::Config(format!("unknown manifest column: {unknown}")));
        }
        if self.vocab_type != VocabType::Char && self.vocab_size == 0 {
            return Err(PrepError::Config(format!(
                "vocab size must be positive for {}",
                self.vocab_type
            )));
        }
        Ok(())
    }
}

/// Тип субсловного словаря.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabType {
    /// Byte-pair encoding.
    Bpe,
    /// Unigram language model.
    Unigram,
    /// Посимвольный словарь.
    Char,
}

impl VocabType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VocabType::Bpe => "bpe",
            VocabType::Unigram => "unigram",
            VocabType::Char => "char",
        }
    }
}

impl fmt::Display for VocabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VocabType {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bpe" => Ok(VocabType::Bpe),
            "unigram" => Ok(VocabType::Unigram),
            "char" => Ok(VocabType::Char),
            other => Err(PrepError::Config(format!(
                "unsupported vocab type: {other} (expected: bpe, unigram, char)"
            ))),
        }
    }
}

/// Политика SpecAugment, записываемая в конфиг данных.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecAugmentPolicy {
    /// LibriSpeech basic.
    Lb,
    /// LibriSpeech double.
    Ld,
    /// Switchboard mild.
    Sm,
    /// Switchboard strong.
    Ss,
}

impl SpecAugmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecAugmentPolicy::Lb => "lb",
            SpecAugmentPolicy::Ld => "ld",
            SpecAugmentPolicy::Sm => "sm",
            SpecAugmentPolicy::Ss => "ss",
        }
    }
}

impl fmt::Display for SpecAugmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecAugmentPolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lb" => Ok(SpecAugmentPolicy::Lb),
            "ld" => Ok(SpecAugmentPolicy::Ld),
            "sm" => Ok(SpecAugmentPolicy::Sm),
            "ss" => Ok(SpecAugmentPolicy::Ss),
            other => Err(PrepError::Config(format!(
                "unsupported specaugment policy: {other} (expected: lb, ld, sm, ss)"
            ))),
        }
    }
}

/// Конфигурация mel-спектрограммы.
///
/// Kaldi-стиль: HTK mel-шкала, натуральный логарифм, только полные окна внутри сигнала.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureExtractorConfig {
    /// Целевая частота дискретизации в Гц.
    pub sample_rate: usize,

    /// Размер окна FFT.
    pub n_fft: usize,

    /// Шаг между фреймами.
    pub hop_length: usize,

    /// Длина окна анализа (дополняется нулями до `n_fft`).
    pub win_length: usize,

    /// Количество mel-бинов.
    pub n_mels: usize,

    /// Минимальная частота для mel-фильтра.
    pub f_min: f32,

    /// Максимальная частота для mel-фильтра.
    pub f_max: f32,

    /// Множитель амплитуды перед анализом (32768 для 16-битного диапазона).
    pub input_scale: f32,
}

impl Default for FeatureExtractorConfig {
    fn default() -> Self {
        Self::fbank80()
    }
}

impl FeatureExtractorConfig {
    /// Log-mel filterbank, 80 бинов: окно 25 мс, шаг 10 мс при 16 кГц.
    pub fn fbank80() -> Self {
        Self {
            sample_rate: 16000,
            n_fft: 512,
            hop_length: 160,
            win_length: 400,
            n_mels: 80,
            f_min: 20.0,
            f_max: 8000.0,
            input_scale: 32768.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PrepConfig::default();
        assert_eq!(config.splits, vec!["train", "dev", "test"]);
        assert_eq!(
            config.manifest_columns,
            vec!["id", "audio", "n_frames", "tgt_text", "speaker"]
        );
        assert_eq!(config.reference_lang, "gn");
        assert_eq!(config.archive_name, "fbank80.zip");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vocab_type_parse() {
        assert_eq!("bpe".parse::<VocabType>().unwrap(), VocabType::Bpe);
        assert_eq!("char".parse::<VocabType>().unwrap(), VocabType::Char);
        let err = "wordpiece".parse::<VocabType>().unwrap_err();
        assert!(matches!(err, PrepError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_missing_train() {
        let mut config = PrepConfig::default();
        config.splits = vec!["dev".to_string()];
        assert!(matches!(config.validate(), Err(PrepError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_column() {
        let mut config = PrepConfig::default();
        config.manifest_columns.push("duration".to_string());
        assert!(matches!(config.validate(), Err(PrepError::Config(_))));
    }

    #[test]
    fn test_fbank80_config() {
        let config = FeatureExtractorConfig::fbank80();
        assert_eq!(config.n_mels, 80);
        assert_eq!(config.hop_length, 160);
        assert!(config.win_length <= config.n_fft);
    }
}
