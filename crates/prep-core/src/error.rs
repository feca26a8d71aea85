//! Error types for corpus preparation.

use thiserror::Error;

/// Main error type for preparation runs.
///
/// `Audio` and `Dataset` raised while materializing a single item are
/// recovered by the reader (the item is skipped); everything else aborts the run.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Audio decoding errors.
    #[error("Audio error: {0}")]
    Audio(String),

    /// Dataset metadata errors (missing split table, malformed row).
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Feature extraction errors.
    #[error("Feature error: {0}")]
    Feature(String),

    /// Archive packing/reading errors.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Vocabulary training errors.
    #[error("Vocabulary error: {0}")]
    Vocab(String),

    /// Configuration errors, rejected before any work starts.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Candle tensor errors.
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Zip container errors.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// TSV reading/writing errors.
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML serialization errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for preparation operations.
pub type PrepResult<T> = Result<T, PrepError>;
