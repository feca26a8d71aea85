//! Обучение субсловного словаря.
//!
//! Выходные файлы для префикса `spm_unigram500`:
//! - `spm_unigram500.model`: сериализованный токенизатор (JSON `tokenizers`)
//! - `spm_unigram500.vocab`: `piece\tid`, по возрастанию id
//! - `spm_unigram500.txt`: словарь fairseq: `piece 1`, без служебных символов

use std::ffi::OsString;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use prep_core::{PrepError, PrepResult, VocabType, VocabularyTrainer};
use tokenizers::models::bpe::{BPE, BpeTrainerBuilder};
use tokenizers::models::unigram::{Unigram, UnigramTrainerBuilder};
use tokenizers::models::{ModelWrapper, TrainerWrapper};
use tokenizers::pre_tokenizers::metaspace::Metaspace;
use tokenizers::{AddedToken, Tokenizer};
use tracing::info;

/// Служебные символы в порядке id: `<s>`=0, `<pad>`=1, `</s>`=2, `<unk>`=3.
pub const SPECIAL_SYMBOLS: &[&str] = &["<s>", "<pad>", "</s>", "<unk>"];

const UNK_SYMBOL: &str = "<unk>";

/// Имя словаря: `spm_{type}{size}`, размер опускается для `char`.
pub fn vocab_prefix(vocab_type: VocabType, vocab_size: usize) -> String {
    match vocab_type {
        VocabType::Char => format!("spm_{vocab_type}"),
        _ => format!("spm_{vocab_type}{vocab_size}"),
    }
}

/// `{prefix}.{ext}` рядом с префиксом.
pub fn prefixed_path(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Тренер словаря на основе `tokenizers` (BPE / Unigram / посимвольный).
#[derive(Debug, Clone, Default)]
pub struct SubwordTrainer {
    show_progress: bool,
}

impl SubwordTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn special_tokens() -> Vec<AddedToken> {
        SPECIAL_SYMBOLS
            .iter()
            .map(|s| AddedToken::from(s.to_string(), true))
            .collect()
    }

    fn build_model(&self, vocab_type: VocabType) -> PrepResult<ModelWrapper> {
        match vocab_type {
            VocabType::Bpe | VocabType::Char => {
                let bpe = BPE::builder()
                    .unk_token(UNK_SYMBOL.to_string())
                    .build()
                    .map_err(|e| PrepError::Vocab(format!("BPE model: {e}")))?;
                Ok(bpe.into())
            }
            VocabType::Unigram => Ok(Unigram::default().into()),
        }
    }

    fn build_trainer(&self, vocab_type: VocabType, vocab_size: usize) -> PrepResult<TrainerWrapper> {
        let trainer: TrainerWrapper = match vocab_type {
            VocabType::Bpe => BpeTrainerBuilder::new()
                .vocab_size(vocab_size)
                .min_frequency(0)
                .show_progress(self.show_progress)
                .special_tokens(Self::special_tokens())
                .build()
                .into(),
            // Ноль слияний: словарь = служебные символы + алфавит корпуса.
            VocabType::Char => BpeTrainerBuilder::new()
                .vocab_size(0)
                .show_progress(self.show_progress)
                .special_tokens(Self::special_tokens())
                .build()
                .into(),
            VocabType::Unigram => {
                let vocab_size = u32::try_from(vocab_size).map_err(|_| {
                    PrepError::Vocab(format!("vocab size {vocab_size} is too large"))
                })?;
                UnigramTrainerBuilder::default()
                    .vocab_size(vocab_size)
                    .show_progress(self.show_progress)
                    .special_tokens(Self::special_tokens())
                    .unk_token(Some(UNK_SYMBOL.to_string()))
                    .build()
                    .map_err(|e| PrepError::Vocab(format!("unigram trainer: {e}")))?
                    .into()
            }
        };
        Ok(trainer)
    }
}

impl VocabularyTrainer for SubwordTrainer {
    fn train(
        &self,
        input: &Path,
        output_prefix: &Path,
        vocab_type: VocabType,
        vocab_size: usize,
    ) -> PrepResult<()> {
        if vocab_type != VocabType::Char && vocab_size <= SPECIAL_SYMBOLS.len() {
            return Err(PrepError::Vocab(format!(
                "vocab size {vocab_size} leaves no room beyond {} special symbols",
                SPECIAL_SYMBOLS.len()
            )));
        }
        if fs::metadata(input)?.len() == 0 {
            return Err(PrepError::Vocab(format!(
                "training corpus is empty: {}",
                input.display()
            )));
        }
        let input_str = input
            .to_str()
            .ok_or_else(|| PrepError::Vocab(format!("non UTF-8 path: {}", input.display())))?
            .to_string();

        let mut tokenizer = Tokenizer::new(self.build_model(vocab_type)?);
        tokenizer.with_pre_tokenizer(Some(Metaspace::default()));
        tokenizer.with_decoder(Some(Metaspace::default()));

        let mut trainer = self.build_trainer(vocab_type, vocab_size)?;
        tokenizer
            .train_from_files(&mut trainer, vec![input_str])
            .map_err(|e| PrepError::Vocab(format!("training failed: {e}")))?;

        let model_path = prefixed_path(output_prefix, "model");
        tokenizer
            .save(&model_path, false)
            .map_err(|e| PrepError::Vocab(format!("saving {}: {e}", model_path.display())))?;

        let mut pieces: Vec<(String, u32)> = tokenizer.get_vocab(true).into_iter().collect();
        pieces.sort_by_key(|(_, id)| *id);
        write_vocab_table(&prefixed_path(output_prefix, "vocab"), &pieces)?;
        write_fairseq_dict(&prefixed_path(output_prefix, "txt"), &pieces)?;

        info!(
            prefix = %output_prefix.display(),
            %vocab_type,
            pieces = pieces.len(),
            "Trained vocabulary"
        );
        Ok(())
    }
}

fn write_vocab_table(path: &Path, pieces: &[(String, u32)]) -> PrepResult<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for (piece, id) in pieces {
        writeln!(out, "{piece}\t{id}")?;
    }
    out.flush()?;
    Ok(())
}

/// Словарь fairseq: служебные символы fairseq добавляет сам, их не пишем.
fn write_fairseq_dict(path: &Path, pieces: &[(String, u32)]) -> PrepResult<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for (piece, _) in pieces {
        if SPECIAL_SYMBOLS.contains(&piece.as_str()) {
            continue;
        }
        writeln!(out, "{piece} 1")?;
    }
    out.flush()?;
    Ok(())
}
