//! Упаковка признаков в zip и чтение оглавления архива.
//!
//! Архив пишется без сжатия (`Stored`), поэтому локатор
//! `{archive}:{offset}:{length}` адресует сырые байты `.npy` внутри файла.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prep_core::{ArchiveManifest, Archiver, PrepError, PrepResult};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NPY_MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// Zip archiver over a flat directory of feature artifacts.
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    extension: String,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self {
            extension: "npy".to_string(),
        }
    }
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Артефакты верхнего уровня директории, отсортированные по имени.
    fn collect_artifacts(&self, directory: &Path) -> PrepResult<Vec<PathBuf>> {
        let mut artifacts = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.extension);
            if matches {
                artifacts.push(path);
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }
}

impl Archiver for ZipArchiver {
    fn pack(&self, directory: &Path, archive_path: &Path) -> PrepResult<()> {
        let artifacts = self.collect_artifacts(directory)?;
        if let Some(parent) = archive_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut zip = ZipWriter::new(BufWriter::new(File::create(archive_path)?));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for path in &artifacts {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                return Err(PrepError::Archive(format!(
                    "non UTF-8 artifact name: {}",
                    path.display()
                )));
            };
            zip.start_file(name, options)?;
            std::io::copy(&mut File::open(path)?, &mut zip)?;
        }

        let mut writer = zip.finish()?;
        writer.flush()?;

        info!(
            archive = %archive_path.display(),
            entries = artifacts.len(),
            "Packed feature archive"
        );
        Ok(())
    }

    fn manifest(&self, archive_path: &Path) -> PrepResult<ArchiveManifest> {
        let archive_name = archive_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PrepError::Archive(format!("bad archive path: {}", archive_path.display()))
            })?
            .to_string();
        let suffix = format!(".{}", self.extension);

        let mut zip = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
        let mut manifest = ArchiveManifest::default();

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let Some(id) = name.strip_suffix(&suffix) else {
                debug!(entry = %name, "Ignoring foreign archive entry");
                continue;
            };
            if entry.compression() != CompressionMethod::Stored {
                return Err(PrepError::Archive(format!(
                    "entry {name} is compressed, locators need stored entries"
                )));
            }

            let offset = entry.data_start();
            let length = entry.size();
            let n_frames = npy_leading_dim(&mut entry)
                .map_err(|e| PrepError::Archive(format!("entry {name}: {e}")))?;

            manifest.insert(id, format!("{archive_name}:{offset}:{length}"), n_frames);
        }

        Ok(manifest)
    }
}

/// Прочитать заголовок `.npy` и вернуть первую размерность массива (число фреймов).
pub fn npy_leading_dim<R: Read>(reader: &mut R) -> PrepResult<usize> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if magic != NPY_MAGIC_STRING {
        return Err(PrepError::Archive("npy magic string mismatch".to_string()));
    }
    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 | 3 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        other => {
            return Err(PrepError::Archive(format!("unsupported npy version {other}")));
        }
    };
    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8_lossy(&header);

    // {'descr': '<f4', 'fortran_order': False, 'shape': (98, 80), }
    let shape = header
        .split("'shape':")
        .nth(1)
        .and_then(|rest| {
            let rest = rest.trim_start().strip_prefix('(')?;
            rest.split(')').next()
        })
        .ok_or_else(|| PrepError::Archive(format!("no shape in npy header: {header}")))?;

    shape
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .ok_or_else(|| PrepError::Archive("scalar npy array has no frames".to_string()))?
        .parse::<usize>()
        .map_err(|e| PrepError::Archive(format!("bad npy shape `{shape}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npy_leading_dim() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (98,80,), }  \n";
        let mut bytes = NPY_MAGIC_STRING.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());

        assert_eq!(npy_leading_dim(&mut bytes.as_slice()).unwrap(), 98);
    }

    #[test]
    fn test_npy_leading_dim_rejects_scalar_and_garbage() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (), }\n";
        let mut bytes = NPY_MAGIC_STRING.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        assert!(npy_leading_dim(&mut bytes.as_slice()).is_err());

        assert!(npy_leading_dim(&mut &b"PK\x03\x04garbage"[..]).is_err());
    }
}
