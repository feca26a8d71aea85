//! Общие типы для подготовки корпуса.
//!
//! Содержит базовые структуры данных, используемые всеми крейтами workspace:
//! буферы аудио, элементы датасета, строки манифеста и оглавление архива.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Аудио-буфер
// ---------------------------------------------------------------------------

/// Буфер необработанного аудио.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Аудио-сэмплы (нормализованы к [-1.0, 1.0], каналы чередуются).
    pub samples: Vec<f32>,

    /// Частота дискретизации в Гц.
    pub sample_rate: usize,

    /// Количество каналов.
    pub channels: usize,
}

impl AudioBuffer {
    /// Создать новый буфер аудио.
    pub fn new(samples: Vec<f32>, sample_rate: usize, channels: usize) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Длительность в секундах.
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / (self.sample_rate * self.channels) as f32
    }

    /// Количество сэмплов на канал.
    pub fn num_samples(&self) -> usize {
        self.samples.len() / self.channels
    }
}

// ---------------------------------------------------------------------------
// Элементы датасета
// ---------------------------------------------------------------------------

/// Одна реплика корпуса, успешно прочитанная с диска.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Стабильный идентификатор, производный от пути к аудио.
    pub id: String,

    /// Аудио реплики. Потребляется экстрактором и не хранится дальше.
    pub audio: AudioBuffer,

    /// Транскрипт.
    pub transcript: String,

    /// Идентификатор говорящего.
    pub speaker: String,
}

/// Результат материализации одного элемента датасета.
///
/// Ошибка чтения одного элемента не прерывает прогон: элемент
/// превращается в `Skipped` и дальше не участвует ни в признаках, ни в манифесте.
#[derive(Debug)]
pub enum ItemOutcome {
    Materialized(Sample),
    Skipped {
        /// Позиция элемента в разбиении.
        index: usize,
        /// Причина пропуска.
        reason: String,
    },
}

impl ItemOutcome {
    pub fn skipped(index: usize, reason: impl Into<String>) -> Self {
        ItemOutcome::Skipped {
            index,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Манифест
// ---------------------------------------------------------------------------

/// Строка TSV-манифеста.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub id: String,
    /// Локатор признаков внутри архива (`archive:offset:length`).
    pub audio: String,
    pub n_frames: usize,
    pub tgt_text: String,
    pub speaker: String,
}

impl ManifestRow {
    /// Значение колонки по имени; `None` для неизвестной колонки.
    pub fn field(&self, column: &str) -> Option<String> {
        match column {
            "id" => Some(self.id.clone()),
            "audio" => Some(self.audio.clone()),
            "n_frames" => Some(self.n_frames.to_string()),
            "tgt_text" => Some(self.tgt_text.clone()),
            "speaker" => Some(self.speaker.clone()),
            _ => None,
        }
    }
}

/// Таблица манифеста одного (split, language).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestTable {
    /// Порядок колонок при сохранении.
    pub columns: Vec<String>,
    pub rows: Vec<ManifestRow>,
}

impl ManifestTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ManifestRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Транскрипты в порядке строк.
    pub fn transcripts(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.tgt_text.as_str())
    }
}

// ---------------------------------------------------------------------------
// Оглавление архива признаков
// ---------------------------------------------------------------------------

/// Оглавление архива: id → локатор и id → число фреймов.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveManifest {
    pub locators: HashMap<String, String>,
    pub frame_counts: HashMap<String, usize>,
}

impl ArchiveManifest {
    pub fn insert(&mut self, id: impl Into<String>, locator: String, n_frames: usize) {
        let id = id.into();
        self.locators.insert(id.clone(), locator);
        self.frame_counts.insert(id, n_frames);
    }

    /// Локатор и число фреймов для id, если признаки есть в архиве.
    pub fn lookup(&self, id: &str) -> Option<(&str, usize)> {
        let locator = self.locators.get(id)?;
        let n_frames = *self.frame_counts.get(id)?;
        Some((locator.as_str(), n_frames))
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}
