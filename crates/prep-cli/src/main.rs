//!
//! CLI подготовки речевого корпуса: признаки, архив, манифесты, словарь.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use audio::FbankExtractor;
use prep_core::{DEFAULT_REFERENCE_LANG, PrepConfig, SpecAugmentPolicy, VocabType};
use prep_corpus::{CommonVoiceReader, ZipArchiver};
use prep_pipeline::Orchestrator;
use prep_vocab::{SubwordTrainer, YamlConfigEmitter};

/// Тип словаря для CLI.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum VocabTypeArg {
    Bpe,
    Unigram,
    /// Посимвольный словарь (размер игнорируется)
    Char,
}

impl From<VocabTypeArg> for VocabType {
    fn from(v: VocabTypeArg) -> Self {
        match v {
            VocabTypeArg::Bpe => VocabType::Bpe,
            VocabTypeArg::Unigram => VocabType::Unigram,
            VocabTypeArg::Char => VocabType::Char,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SpecAugmentArg {
    Lb,
    Ld,
    Sm,
    Ss,
}

impl From<SpecAugmentArg> for SpecAugmentPolicy {
    fn from(v: SpecAugmentArg) -> Self {
        match v {
            SpecAugmentArg::Lb => SpecAugmentPolicy::Lb,
            SpecAugmentArg::Ld => SpecAugmentPolicy::Ld,
            SpecAugmentArg::Sm => SpecAugmentPolicy::Sm,
            SpecAugmentArg::Ss => SpecAugmentPolicy::Ss,
        }
    }
}

#[derive(Parser)]
#[command(name = "s2t-prep")]
#[command(author, version, about = "Prepare Common Voice releases for speech-to-text training", long_about = None)]
struct Cli {
    /// Корни датасетов через запятую; последний становится корнем консолидации
    #[arg(short = 'o', long, value_delimiter = ',', required = true)]
    output_root: Vec<PathBuf>,

    /// Тип словаря
    #[arg(long, value_enum)]
    vocab_type: VocabTypeArg,

    /// Размер словаря (для bpe и unigram)
    #[arg(long, default_value_t = 10000)]
    vocab_size: usize,

    /// Языковой тег корня, для которого строятся dev/test манифесты
    #[arg(long, default_value = DEFAULT_REFERENCE_LANG)]
    reference_lang: String,

    /// Политика SpecAugment в data-config
    #[arg(long, value_enum, default_value = "ld")]
    specaugment_policy: SpecAugmentArg,

    /// Поддиректория с аудио внутри каждого корня
    #[arg(long, default_value = "clips")]
    clips_dir: String,

    /// Показывать прогресс обучения словаря
    #[arg(long, default_value_t = false)]
    progress: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = PrepConfig::new(cli.vocab_type.into(), cli.vocab_size)
        .with_reference_lang(cli.reference_lang)
        .with_specaugment_policy(cli.specaugment_policy.into());

    let fbank = FbankExtractor::default();
    let emitter = YamlConfigEmitter::new().with_feature_dim(fbank.n_mels());
    let orchestrator = Orchestrator::new(
        config,
        CommonVoiceReader::new().with_clips_dir(cli.clips_dir),
        fbank,
        ZipArchiver::new(),
        SubwordTrainer::new().with_progress(cli.progress),
        emitter,
    )
    .context("invalid preparation config")?;

    info!(roots = ?cli.output_root, "Starting corpus preparation");
    let start = Instant::now();
    let report = orchestrator
        .run(&cli.output_root)
        .context("corpus preparation failed")?;

    println!("Corpus prepared in {:.1}s", start.elapsed().as_secs_f32());
    println!("Root: {}", report.target.display());
    for manifest in &report.manifests {
        println!(
            "  {:<6} {:<4} {:>8} rows  {}",
            manifest.split,
            manifest.lang,
            manifest.rows,
            manifest.path.display()
        );
    }
    println!(
        "Features: {} extracted, {} skipped",
        report.extracted, report.skipped
    );
    println!(
        "Vocabulary: {} ({} training lines)",
        report.vocab_prefix, report.training_lines
    );
    println!("Config: {}", report.config_path.display());

    Ok(())
}
