//! Чтение релиза Common Voice.
//!
//! Структура корня языка:
//! ```text
//! {root}/train.tsv, dev.tsv, test.tsv   таблицы разбиений (TSV с заголовком)
//! {root}/clips/{path}                   аудио реплик
//! ```
//! Идентификатор реплики равен значению колонки `path` как есть.

use std::path::{Path, PathBuf};

use audio::load_audio;
use prep_core::{DatasetReader, ItemIter, ItemOutcome, PrepError, PrepResult, Sample};
use serde::Deserialize;
use tracing::debug;

/// Колонки, без которых таблица разбиения бесполезна.
const REQUIRED_COLUMNS: &[&str] = &["client_id", "path", "sentence"];

#[derive(Debug, Deserialize)]
struct CommonVoiceRow {
    client_id: String,
    path: String,
    #[serde(default)]
    sentence: String,
}

/// Reader for a Common Voice language directory.
#[derive(Debug, Clone)]
pub struct CommonVoiceReader {
    clips_dir: String,
}

impl Default for CommonVoiceReader {
    fn default() -> Self {
        Self {
            clips_dir: "clips".to_string(),
        }
    }
}

impl CommonVoiceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different clips directory name (relative to the root).
    pub fn with_clips_dir(mut self, clips_dir: impl Into<String>) -> Self {
        self.clips_dir = clips_dir.into();
        self
    }

    /// Path of the split table inside `root`.
    pub fn split_table(root: &Path, split: &str) -> PathBuf {
        root.join(format!("{split}.tsv"))
    }

    /// Read metadata rows; a malformed row becomes `Err(reason)` in place.
    fn read_rows(table: &Path) -> PrepResult<Vec<Result<CommonVoiceRow, String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_path(table)?;

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *column) {
                return Err(PrepError::Dataset(format!(
                    "column `{column}` missing in {}",
                    table.display()
                )));
            }
        }

        Ok(reader
            .deserialize::<CommonVoiceRow>()
            .map(|row| row.map_err(|e| format!("malformed row: {e}")))
            .collect())
    }
}

impl DatasetReader for CommonVoiceReader {
    fn read<'a>(&'a self, root: &Path, split: &str) -> PrepResult<ItemIter<'a>> {
        let table = Self::split_table(root, split);
        if !table.is_file() {
            return Err(PrepError::Dataset(format!(
                "split table not found: {}",
                table.display()
            )));
        }

        let rows = Self::read_rows(&table)?;
        debug!(table = %table.display(), rows = rows.len(), "Loaded split table");

        let clips = root.join(&self.clips_dir);
        Ok(Box::new(
            rows.into_iter()
                .enumerate()
                .map(move |(index, row)| materialize(&clips, index, row)),
        ))
    }
}

/// Загрузить аудио одной строки; любая ошибка превращается в `Skipped`.
fn materialize(clips: &Path, index: usize, row: Result<CommonVoiceRow, String>) -> ItemOutcome {
    let row = match row {
        Ok(row) => row,
        Err(reason) => return ItemOutcome::skipped(index, reason),
    };
    if row.path.trim().is_empty() {
        return ItemOutcome::skipped(index, "empty `path` field");
    }

    match load_audio(clips.join(&row.path)) {
        Ok(audio) => ItemOutcome::Materialized(Sample {
            id: row.path,
            audio,
            transcript: row.sentence,
            speaker: row.client_id,
        }),
        Err(e) => ItemOutcome::skipped(index, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, num_samples: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..num_samples {
            writer.write_sample(((i % 100) as i16 - 50) * 100).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn write_root(root: &Path) {
        std::fs::create_dir_all(root.join("clips")).unwrap();
        write_wav(&root.join("clips/a.wav"), 1600);
        write_wav(&root.join("clips/c.wav"), 3200);
        std::fs::write(
            root.join("train.tsv"),
            "client_id\tpath\tsentence\tup_votes\n\
             spk1\ta.wav\thola \"mundo\"\t2\n\
             spk2\tb.wav\tmissing clip\t0\n\
             spk3\tc.wav\tadiós\t1\n",
        )
        .unwrap();
    }

    #[test]
    fn test_read_skips_unreadable_items_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_root(dir.path());

        let reader = CommonVoiceReader::new();
        let outcomes: Vec<ItemOutcome> = reader.read(dir.path(), "train").unwrap().collect();
        assert_eq!(outcomes.len(), 3);

        match &outcomes[0] {
            ItemOutcome::Materialized(sample) => {
                assert_eq!(sample.id, "a.wav");
                assert_eq!(sample.transcript, "hola \"mundo\"");
                assert_eq!(sample.speaker, "spk1");
                assert_eq!(sample.audio.samples.len(), 1600);
            }
            other => panic!("expected materialized sample, got {other:?}"),
        }
        assert!(matches!(outcomes[1], ItemOutcome::Skipped { index: 1, .. }));
        match &outcomes[2] {
            ItemOutcome::Materialized(sample) => assert_eq!(sample.transcript, "adiós"),
            other => panic!("expected materialized sample, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_split_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_root(dir.path());
        let err = CommonVoiceReader::new()
            .read(dir.path(), "dev")
            .err()
            .unwrap();
        assert!(matches!(err, PrepError::Dataset(_)));
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.tsv"), "path\tsentence\na.wav\tx\n").unwrap();
        let err = CommonVoiceReader::new()
            .read(dir.path(), "train")
            .err()
            .unwrap();
        assert!(matches!(err, PrepError::Dataset(_)));
    }
}
