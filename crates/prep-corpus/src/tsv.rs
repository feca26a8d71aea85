//! TSV persistence of manifests.
//!
//! Format: header row with the configured columns, tab separated, no quoting,
//! `\n` line terminators. Transcripts are written verbatim.

use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator};
use prep_core::{ManifestRow, ManifestTable, PrepError, PrepResult};

/// Deterministic manifest file name for a (split, language) pair.
pub fn manifest_path(root: &Path, split: &str, lang: &str) -> PathBuf {
    root.join(format!("{split}_manifest_{lang}.tsv"))
}

/// Write `table` to `path`, replacing any previous file.
pub fn save(table: &ManifestTable, path: &Path) -> PrepResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        let mut record = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let value = row
                .field(column)
                .ok_or_else(|| PrepError::Config(format!("unknown manifest column: {column}")))?;
            if value.contains(['\t', '\n', '\r']) {
                return Err(PrepError::Dataset(format!(
                    "row {}: `{column}` contains a tab or newline",
                    row.id
                )));
            }
            record.push(value);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a manifest written by [`save`].
pub fn load(path: &Path) -> PrepResult<ManifestTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(true)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = ManifestTable::new(columns);
    for row in reader.deserialize::<ManifestRow>() {
        table.push(row?);
    }
    Ok(table)
}
