//! Оркестратор подготовки корпуса.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use prep_core::{
    ArchiveManifest, Archiver, ConfigEmitter, DatasetReader, FeatureExtractor, ItemOutcome,
    ManifestRow, ManifestTable, PrepConfig, PrepResult, VocabularyTrainer,
};
use prep_corpus::tsv;
use prep_vocab::vocab_prefix;
use tracing::{debug, info, warn};

use crate::corpus::TrainingCorpus;
use crate::policy::{InclusionPolicy, RootPlan, lang_tag};

/// Как часто логировать прогресс прохода по разбиению.
const PROGRESS_EVERY: usize = 1000;

/// Один записанный манифест.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    pub split: String,
    pub lang: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Итог прогона.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Корень консолидации (абсолютный путь).
    pub target: PathBuf,
    /// Манифесты в порядке записи.
    pub manifests: Vec<ManifestSummary>,
    /// Число извлечённых артефактов признаков.
    pub extracted: usize,
    /// Элементы, пропущенные при проходе извлечения.
    pub skipped: usize,
    /// Строк в тексте для обучения словаря.
    pub training_lines: usize,
    /// Префикс словаря, например `spm_unigram10000`.
    pub vocab_prefix: String,
    /// Путь к записанному data-config.
    pub config_path: PathBuf,
}

/// Последовательный пакетный прогон подготовки корпуса.
///
/// Фазы выполняются строго по порядку; первая фатальная ошибка прерывает прогон,
/// директория признаков в этом случае остаётся на диске.
pub struct Orchestrator<R, F, A, V, C> {
    config: PrepConfig,
    policy: InclusionPolicy,
    reader: R,
    extractor: F,
    archiver: A,
    trainer: V,
    emitter: C,
}

impl<R, F, A, V, C> Orchestrator<R, F, A, V, C>
where
    R: DatasetReader,
    F: FeatureExtractor,
    A: Archiver,
    V: VocabularyTrainer,
    C: ConfigEmitter,
{
    /// Создать оркестратор. Конфигурация проверяется здесь, до начала прогона.
    pub fn new(
        config: PrepConfig,
        reader: R,
        extractor: F,
        archiver: A,
        trainer: V,
        emitter: C,
    ) -> PrepResult<Self> {
        config.validate()?;
        let policy = InclusionPolicy::new(config.reference_lang.clone());
        Ok(Self {
            config,
            policy,
            reader,
            extractor,
            archiver,
            trainer,
            emitter,
        })
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    /// Выполнить все фазы над упорядоченным списком корней.
    pub fn run(&self, roots: &[PathBuf]) -> PrepResult<RunReport> {
        let plan = self.prepare_roots(roots)?;
        let feature_root = plan.target.join(&self.config.feature_dir_name);
        let archive_path = plan.target.join(&self.config.archive_name);

        let mut report = RunReport {
            target: plan.target.clone(),
            ..RunReport::default()
        };

        self.extract_features(&plan, &feature_root, &mut report)?;
        let archive = self.pack_archive(&feature_root, &archive_path)?;
        let corpus = self.assemble_manifests(&plan, &archive, &mut report)?;
        report.training_lines = corpus.len();
        report.vocab_prefix = self.train_vocabulary(&plan.target, &corpus)?;
        report.config_path = self.emit_config(&plan.target, &report.vocab_prefix)?;
        self.cleanup(&feature_root)?;

        info!(
            target = %report.target.display(),
            manifests = report.manifests.len(),
            extracted = report.extracted,
            skipped = report.skipped,
            "Preparation finished"
        );
        Ok(report)
    }

    fn prepare_roots(&self, roots: &[PathBuf]) -> PrepResult<RootPlan> {
        let plan = RootPlan::from_roots(roots)?.prepare()?;
        for root in &plan.sources {
            let lang = lang_tag(root)?;
            let splits = self.policy.included_splits(&lang, &self.config.splits);
            info!(root = %root.display(), %lang, ?splits, "Root planned");
        }
        info!(target = %plan.target.display(), "Consolidation root");
        Ok(plan)
    }

    /// Первый проход: признаки каждой успешно прочитанной реплики.
    ///
    /// Директория признаков начинается пустой: остатки прерванного прогона
    /// попали бы в архив без строк манифеста.
    fn extract_features(
        &self,
        plan: &RootPlan,
        feature_root: &Path,
        report: &mut RunReport,
    ) -> PrepResult<()> {
        if feature_root.exists() {
            warn!(dir = %feature_root.display(), "Removing stale feature directory");
            fs::remove_dir_all(feature_root)?;
        }
        fs::create_dir_all(feature_root)?;
        let extension = self.extractor.artifact_extension();
        // id -> корень, из которого извлечены признаки
        let mut extracted: HashMap<String, &Path> = HashMap::new();

        for root in &plan.sources {
            let lang = lang_tag(root)?;
            for split in self.policy.included_splits(&lang, &self.config.splits) {
                info!(%lang, split, "Extracting features");
                let mut seen = 0usize;
                for outcome in self.reader.read(root, split)? {
                    seen += 1;
                    if seen % PROGRESS_EVERY == 0 {
                        debug!(%lang, split, seen, "Extraction progress");
                    }

                    let sample = match outcome {
                        ItemOutcome::Materialized(sample) => sample,
                        ItemOutcome::Skipped { index, reason } => {
                            warn!(%lang, split, index, %reason, "Skipping unreadable item");
                            report.skipped += 1;
                            continue;
                        }
                    };

                    if let Some(first) = extracted.get(sample.id.as_str()) {
                        if *first == root.as_path() {
                            debug!(id = %sample.id, "Features already extracted");
                        } else {
                            warn!(
                                id = %sample.id,
                                root = %root.display(),
                                features_from = %first.display(),
                                "Sample id collides across roots, reusing first features"
                            );
                        }
                        continue;
                    }
                    let destination = feature_root.join(format!("{}.{extension}", sample.id));
                    self.extractor.extract(&sample.audio, &destination)?;
                    extracted.insert(sample.id, root);
                }
            }
        }

        report.extracted = extracted.len();
        info!(
            dir = %feature_root.display(),
            extracted = report.extracted,
            skipped = report.skipped,
            "Feature extraction done"
        );
        Ok(())
    }

    fn pack_archive(&self, feature_root: &Path, archive_path: &Path) -> PrepResult<ArchiveManifest> {
        self.archiver.pack(feature_root, archive_path)?;
        let manifest = self.archiver.manifest(archive_path)?;
        info!(
            archive = %archive_path.display(),
            entries = manifest.len(),
            "Archive ready"
        );
        Ok(manifest)
    }

    /// Второй проход: строки манифестов по локаторам архива.
    fn assemble_manifests(
        &self,
        plan: &RootPlan,
        archive: &ArchiveManifest,
        report: &mut RunReport,
    ) -> PrepResult<TrainingCorpus> {
        let mut corpus = TrainingCorpus::new();

        for root in &plan.sources {
            let lang = lang_tag(root)?;
            for split in self.policy.included_splits(&lang, &self.config.splits) {
                let mut table = ManifestTable::new(self.config.manifest_columns.clone());
                let mut seen = 0usize;

                for outcome in self.reader.read(root, split)? {
                    seen += 1;
                    if seen % PROGRESS_EVERY == 0 {
                        debug!(%lang, split, seen, rows = table.len(), "Manifest progress");
                    }
                    let sample = match outcome {
                        ItemOutcome::Materialized(sample) => sample,
                        ItemOutcome::Skipped { index, reason } => {
                            warn!(%lang, split, index, %reason, "Skipping unreadable item");
                            continue;
                        }
                    };
                    // Реплика прочиталась сейчас, но не при извлечении.
                    let Some((locator, n_frames)) = archive.lookup(&sample.id) else {
                        warn!(id = %sample.id, "No features in archive, row dropped");
                        continue;
                    };
                    table.push(ManifestRow {
                        audio: locator.to_string(),
                        n_frames,
                        id: sample.id,
                        tgt_text: sample.transcript,
                        speaker: sample.speaker,
                    });
                }

                let path = tsv::manifest_path(&plan.target, split, &lang);
                tsv::save(&table, &path)?;
                corpus.extend_from(split, &table);
                info!(path = %path.display(), rows = table.len(), "Wrote manifest");

                report.manifests.push(ManifestSummary {
                    split: split.to_string(),
                    lang: lang.clone(),
                    path,
                    rows: table.len(),
                });
            }
        }
        Ok(corpus)
    }

    /// Обучить словарь; временный файл корпуса удаляется при любом исходе.
    fn train_vocabulary(&self, target: &Path, corpus: &TrainingCorpus) -> PrepResult<String> {
        let prefix = vocab_prefix(self.config.vocab_type, self.config.vocab_size);
        let staged = corpus.stage()?;
        info!(
            %prefix,
            lines = corpus.len(),
            corpus = %staged.path().display(),
            "Training vocabulary"
        );
        self.trainer.train(
            staged.path(),
            &target.join(&prefix),
            self.config.vocab_type,
            self.config.vocab_size,
        )?;
        Ok(prefix)
    }

    fn emit_config(&self, target: &Path, prefix: &str) -> PrepResult<PathBuf> {
        self.emitter.emit(
            target,
            &format!("{prefix}.model"),
            self.config.specaugment_policy,
        )
    }

    fn cleanup(&self, feature_root: &Path) -> PrepResult<()> {
        fs::remove_dir_all(feature_root)?;
        info!(dir = %feature_root.display(), "Removed feature directory");
        Ok(())
    }
}
