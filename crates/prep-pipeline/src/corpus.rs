//! Текст для обучения словаря.

use std::io::{BufWriter, Write};
use std::path::Path;

use prep_core::{ManifestTable, PrepResult};
use tempfile::NamedTempFile;

/// Транскрипты обучающих разбиений, в порядке строк манифестов.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingCorpus {
    lines: Vec<String>,
}

impl TrainingCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Обучающим считается любое разбиение с префиксом `train`.
    pub fn is_training_split(split: &str) -> bool {
        split.starts_with("train")
    }

    /// Добавить транскрипты таблицы, если разбиение обучающее.
    /// Возвращает число добавленных строк.
    pub fn extend_from(&mut self, split: &str, table: &ManifestTable) -> usize {
        if !Self::is_training_split(split) {
            return 0;
        }
        let before = self.lines.len();
        self.lines.extend(table.transcripts().map(str::to_string));
        self.lines.len() - before
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Записать корпус во временный файл, по строке на транскрипт.
    ///
    /// Файл удаляется при drop возвращённого значения, в том числе
    /// когда обучение завершилось ошибкой.
    pub fn stage(&self) -> PrepResult<ScopedCorpusFile> {
        let mut file = tempfile::Builder::new()
            .prefix("train_text")
            .suffix(".txt")
            .tempfile()?;
        {
            let mut out = BufWriter::new(file.as_file_mut());
            for line in &self.lines {
                writeln!(out, "{line}")?;
            }
            out.flush()?;
        }
        Ok(ScopedCorpusFile { file })
    }
}

/// Временный файл корпуса, живёт до конца обучения словаря.
#[derive(Debug)]
pub struct ScopedCorpusFile {
    file: NamedTempFile,
}

impl ScopedCorpusFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::ManifestRow;

    fn table(texts: &[&str]) -> ManifestTable {
        let mut table = ManifestTable::new(vec!["id".into(), "tgt_text".into()]);
        for (i, text) in texts.iter().enumerate() {
            table.push(ManifestRow {
                id: format!("clip_{i}"),
                audio: format!("fbank80.zip:{i}:1"),
                n_frames: 1,
                tgt_text: text.to_string(),
                speaker: "spk".into(),
            });
        }
        table
    }

    #[test]
    fn test_only_train_splits_contribute() {
        let mut corpus = TrainingCorpus::new();
        assert_eq!(corpus.extend_from("train", &table(&["a", "b"])), 2);
        assert_eq!(corpus.extend_from("dev", &table(&["c"])), 0);
        assert_eq!(corpus.extend_from("test", &table(&["d"])), 0);
        assert_eq!(corpus.extend_from("train_extra", &table(&["e"])), 1);
        assert_eq!(corpus.lines(), &["a", "b", "e"]);
    }

    #[test]
    fn test_stage_writes_one_line_per_transcript_and_cleans_up() {
        let mut corpus = TrainingCorpus::new();
        corpus.extend_from("train", &table(&["che aiko porã", "bonjour"]));

        let staged = corpus.stage().unwrap();
        let path = staged.path().to_path_buf();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "che aiko porã\nbonjour\n");

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_stage_empty_corpus() {
        let staged = TrainingCorpus::new().stage().unwrap();
        assert_eq!(std::fs::metadata(staged.path()).unwrap().len(), 0);
    }
}
