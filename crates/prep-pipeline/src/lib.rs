//! Corpus preparation pipeline.
//!
//! Coordinates the collaborators from `prep-core` root by root, split by split:
//! 1. Extraction pass: dataset → features in a shared directory
//! 2. Packing: shared directory → one archive, reopened for locators
//! 3. Manifest pass: dataset + locators → TSV per (split, language)
//! 4. Training text of all train splits → vocabulary → data config
//! 5. Removal of the shared feature directory

mod corpus;
mod orchestrator;
mod policy;

pub use corpus::{ScopedCorpusFile, TrainingCorpus};
pub use orchestrator::{ManifestSummary, Orchestrator, RunReport};
pub use policy::{InclusionPolicy, RootPlan, lang_tag};
pub use prep_vocab::vocab_prefix;
