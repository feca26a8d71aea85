//! Integration tests for feature archive packing and locator resolution.

use std::collections::BTreeSet;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use audio::FbankExtractor;
use prep_core::{Archiver, AudioBuffer, FeatureExtractor};
use prep_corpus::ZipArchiver;

fn write_features(dir: &Path, id: &str, seconds: f32) {
    let n = (16000.0 * seconds) as usize;
    let samples: Vec<f32> = (0..n)
        .map(|i| (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 16000.0).sin() * 0.3)
        .collect();
    let audio = AudioBuffer::new(samples, 16000, 1);
    FbankExtractor::default()
        .extract(&audio, &dir.join(format!("{id}.npy")))
        .unwrap();
}

/// Parse `name:offset:length`.
fn parse_locator(locator: &str) -> (String, u64, u64) {
    let mut parts = locator.rsplitn(3, ':');
    let length = parts.next().unwrap().parse().unwrap();
    let offset = parts.next().unwrap().parse().unwrap();
    let name = parts.next().unwrap().to_string();
    (name, offset, length)
}

#[test]
fn test_pack_and_resolve_locators() {
    let dir = tempfile::tempdir().unwrap();
    let features = dir.path().join("fbank80");
    std::fs::create_dir_all(&features).unwrap();
    write_features(&features, "common_voice_gn_1.mp3", 1.0);
    write_features(&features, "common_voice_gn_2.mp3", 0.5);
    // Чужой файл в директории признаков не должен попасть в архив.
    std::fs::write(features.join("notes.txt"), "ignore me").unwrap();

    let archive_path = dir.path().join("fbank80.zip");
    let archiver = ZipArchiver::new();
    archiver.pack(&features, &archive_path).unwrap();
    let manifest = archiver.manifest(&archive_path).unwrap();

    let ids: BTreeSet<&str> = manifest.locators.keys().map(String::as_str).collect();
    assert_eq!(
        ids,
        BTreeSet::from(["common_voice_gn_1.mp3", "common_voice_gn_2.mp3"])
    );
    assert_eq!(manifest.frame_counts["common_voice_gn_1.mp3"], 98);
    assert_eq!(manifest.frame_counts["common_voice_gn_2.mp3"], 48);

    // Локатор указывает ровно на байты исходного .npy внутри архива.
    let mut archive = std::fs::File::open(&archive_path).unwrap();
    for id in ids {
        let (name, offset, length) = parse_locator(&manifest.locators[id]);
        assert_eq!(name, "fbank80.zip");

        let original = std::fs::read(features.join(format!("{id}.npy"))).unwrap();
        assert_eq!(length as usize, original.len());

        let mut stored = vec![0u8; length as usize];
        archive.seek(SeekFrom::Start(offset)).unwrap();
        archive.read_exact(&mut stored).unwrap();
        assert_eq!(stored, original);
    }
}

#[test]
fn test_repack_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let features = dir.path().join("fbank80");
    std::fs::create_dir_all(&features).unwrap();
    write_features(&features, "b", 0.3);
    write_features(&features, "a", 0.2);

    let archiver = ZipArchiver::new();
    let first = dir.path().join("first.zip");
    let second = dir.path().join("second.zip");
    archiver.pack(&features, &first).unwrap();
    archiver.pack(&features, &second).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_empty_directory_packs_empty_archive() {
    let dir = tempfile::tempdir().unwrap();
    let features = dir.path().join("fbank80");
    std::fs::create_dir_all(&features).unwrap();

    let archive_path = dir.path().join("fbank80.zip");
    let archiver = ZipArchiver::new();
    archiver.pack(&features, &archive_path).unwrap();
    assert!(archiver.manifest(&archive_path).unwrap().is_empty());
}

#[test]
fn test_manifest_of_missing_archive_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ZipArchiver::new()
        .manifest(&dir.path().join("absent.zip"))
        .is_err());
}
