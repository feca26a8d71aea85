//! Выбор корней и разбиений.
//!
//! Последний корень в списке считается целевым (туда пишутся архив, манифесты, словарь),
//! но признаки извлекаются из всех корней, включая целевой.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use prep_core::{PrepError, PrepResult};

/// Языковой тег корня: последний сегмент пути.
pub fn lang_tag(root: &Path) -> PrepResult<String> {
    root.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            PrepError::Config(format!(
                "cannot derive a language tag from root {}",
                root.display()
            ))
        })
}

/// Правило включения разбиений: `train` для всех корней, остальные
/// только для корня с эталонным языковым тегом.
#[derive(Debug, Clone)]
pub struct InclusionPolicy {
    reference_lang: String,
}

impl InclusionPolicy {
    pub fn new(reference_lang: impl Into<String>) -> Self {
        Self {
            reference_lang: reference_lang.into(),
        }
    }

    pub fn reference_lang(&self) -> &str {
        &self.reference_lang
    }

    pub fn includes(&self, lang: &str, split: &str) -> bool {
        split == "train" || lang == self.reference_lang
    }

    /// Разбиения корня с тегом `lang` в порядке конфигурации.
    pub fn included_splits<'s>(&self, lang: &str, splits: &'s [String]) -> Vec<&'s str> {
        splits
            .iter()
            .map(String::as_str)
            .filter(|split| self.includes(lang, split))
            .collect()
    }
}

/// Упорядоченный план корней прогона.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPlan {
    /// Корень консолидации (последний в списке).
    pub target: PathBuf,
    /// Все корни в исходном порядке, включая целевой.
    pub sources: Vec<PathBuf>,
}

impl RootPlan {
    pub fn from_roots(roots: &[PathBuf]) -> PrepResult<Self> {
        let target = roots
            .last()
            .cloned()
            .ok_or_else(|| PrepError::Config("at least one output root is required".to_string()))?;
        Ok(Self {
            target,
            sources: roots.to_vec(),
        })
    }

    /// Сделать пути абсолютными и создать отсутствующие директории.
    ///
    /// Каждый корень должен давать свой языковой тег: манифесты называются
    /// по тегу, и два корня с одним тегом писали бы в один файл.
    pub fn prepare(self) -> PrepResult<Self> {
        let target = std::path::absolute(&self.target)?;
        let sources = self
            .sources
            .iter()
            .map(std::path::absolute)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen: HashMap<String, &Path> = HashMap::new();
        for root in &sources {
            let lang = lang_tag(root)?;
            if let Some(first) = seen.insert(lang.clone(), root) {
                return Err(PrepError::Config(format!(
                    "roots {} and {} share language tag '{lang}'",
                    first.display(),
                    root.display()
                )));
            }
        }

        std::fs::create_dir_all(&target)?;
        for root in &sources {
            std::fs::create_dir_all(root)?;
        }
        Ok(Self { target, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splits() -> Vec<String> {
        ["train", "dev", "test"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lang_tag() {
        assert_eq!(lang_tag(Path::new("/data/cv/gn")).unwrap(), "gn");
        assert_eq!(lang_tag(Path::new("/data/cv/fr/")).unwrap(), "fr");
        assert!(matches!(lang_tag(Path::new("/")), Err(PrepError::Config(_))));
    }

    #[test]
    fn test_only_reference_root_gets_non_train_splits() {
        let policy = InclusionPolicy::new("gn");
        let splits = splits();
        assert_eq!(policy.included_splits("fr", &splits), vec!["train"]);
        assert_eq!(
            policy.included_splits("gn", &splits),
            vec!["train", "dev", "test"]
        );
    }

    #[test]
    fn test_no_reference_match_means_train_only() {
        let policy = InclusionPolicy::new("gn");
        let splits = splits();
        for lang in ["fr", "es", "de"] {
            assert_eq!(policy.included_splits(lang, &splits), vec!["train"]);
        }
    }

    #[test]
    fn test_root_plan_last_is_target_and_all_are_sources() {
        let roots = vec![PathBuf::from("/d/fr"), PathBuf::from("/d/gn")];
        let plan = RootPlan::from_roots(&roots).unwrap();
        assert_eq!(plan.target, PathBuf::from("/d/gn"));
        assert_eq!(plan.sources, roots);

        let single = RootPlan::from_roots(&[PathBuf::from("/d/gn")]).unwrap();
        assert_eq!(single.sources, vec![PathBuf::from("/d/gn")]);
    }

    #[test]
    fn test_prepare_creates_absolute_roots() {
        let dir = tempfile::tempdir().unwrap();
        let roots = vec![dir.path().join("fr"), dir.path().join("gn")];
        let plan = RootPlan::from_roots(&roots).unwrap().prepare().unwrap();
        assert!(plan.target.is_absolute());
        assert!(plan.sources.iter().all(|r| r.is_dir()));
    }

    #[test]
    fn test_prepare_rejects_shared_language_tag() {
        let dir = tempfile::tempdir().unwrap();
        let roots = vec![
            dir.path().join("a").join("fr"),
            dir.path().join("b").join("fr"),
            dir.path().join("gn"),
        ];
        let err = RootPlan::from_roots(&roots).unwrap().prepare().unwrap_err();
        assert!(matches!(err, PrepError::Config(ref msg) if msg.contains("'fr'")));
        assert!(!dir.path().join("gn").exists());
    }

    #[test]
    fn test_root_plan_requires_a_root() {
        assert!(matches!(
            RootPlan::from_roots(&[]),
            Err(PrepError::Config(_))
        ));
    }
}
