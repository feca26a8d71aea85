//! Трейты внешних участников подготовки корпуса.
//!
//! Оркестратор знает только эти интерфейсы; конкретные реализации живут в
//! крейтах `audio`, `prep-corpus` и `prep-vocab`, а в тестах подменяются
//! фейками в памяти.

use std::path::{Path, PathBuf};

use crate::config::{SpecAugmentPolicy, VocabType};
use crate::error::PrepResult;
use crate::types::{ArchiveManifest, AudioBuffer, ItemOutcome};

/// Итератор по элементам одного разбиения в порядке корпуса.
pub type ItemIter<'a> = Box<dyn Iterator<Item = ItemOutcome> + 'a>;

/// Чтение разбиения корпуса.
pub trait DatasetReader {
    /// Открыть разбиение `split` корпуса в `root`.
    ///
    /// Ошибка здесь фатальна (нет таблицы разбиения). Ошибки отдельных
    /// элементов возвращаются как [`ItemOutcome::Skipped`].
    fn read<'a>(&'a self, root: &Path, split: &str) -> PrepResult<ItemIter<'a>>;
}

/// Извлечение акустических признаков одной реплики.
pub trait FeatureExtractor {
    /// Посчитать признаки и сохранить их в `destination`.
    fn extract(&self, audio: &AudioBuffer, destination: &Path) -> PrepResult<()>;

    /// Расширение файлов с признаками (без точки).
    fn artifact_extension(&self) -> &str {
        "npy"
    }
}

/// Упаковка директории признаков в один архив.
pub trait Archiver {
    /// Упаковать все артефакты `directory` в `archive_path`.
    fn pack(&self, directory: &Path, archive_path: &Path) -> PrepResult<()>;

    /// Открыть архив и вернуть id → (локатор, число фреймов).
    fn manifest(&self, archive_path: &Path) -> PrepResult<ArchiveManifest>;
}

/// Обучение субсловного словаря.
pub trait VocabularyTrainer {
    /// Обучить словарь на тексте `input` (одна реплика на строку).
    ///
    /// Создаёт файлы `{output_prefix}.*`.
    fn train(
        &self,
        input: &Path,
        output_prefix: &Path,
        vocab_type: VocabType,
        vocab_size: usize,
    ) -> PrepResult<()>;
}

/// Генерация конфига данных для обучения.
pub trait ConfigEmitter {
    /// Записать конфиг в `root`, вернуть путь к нему.
    fn emit(
        &self,
        root: &Path,
        spm_filename: &str,
        specaugment_policy: SpecAugmentPolicy,
    ) -> PrepResult<PathBuf>;
}
