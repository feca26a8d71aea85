//! # prep-core
//!
//! Базовые типы, трейты и определения ошибок для подготовки речевого корпуса.
//!
//! Этот крейт предоставляет фундаментальные абстракции для всех остальных
//! крейтов в workspace:
//!
//! - Общие типы данных (`AudioBuffer`, `Sample`, `ManifestRow`, `ArchiveManifest`)
//! - Конфигурация прогона (`PrepConfig`) и mel-экстрактора (`FeatureExtractorConfig`)
//! - Унифицированная обработка ошибок через `PrepError`
//! - Трейты внешних участников: чтение датасета, извлечение признаков,
//!   архивация, обучение словаря, генерация конфига

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    DEFAULT_REFERENCE_LANG, FeatureExtractorConfig, PrepConfig, SpecAugmentPolicy, VocabType,
};
pub use error::{PrepError, PrepResult};
pub use traits::{Archiver, ConfigEmitter, DatasetReader, FeatureExtractor, ItemIter, VocabularyTrainer};
pub use types::{ArchiveManifest, AudioBuffer, ItemOutcome, ManifestRow, ManifestTable, Sample};
