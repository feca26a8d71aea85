//! Corpus-side collaborators for the preparation pipeline.
//!
//! - [`CommonVoiceReader`]: split tables + clips of a Common Voice release
//! - [`ZipArchiver`]: stored zip over the feature directory and its locator table
//! - [`tsv`]: manifest persistence

pub mod archive;
pub mod commonvoice;
pub mod tsv;

pub use archive::ZipArchiver;
pub use commonvoice::CommonVoiceReader;
