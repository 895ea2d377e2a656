/*!
 * Tests for file utilities
 */

use anyhow::Result;
use std::path::PathBuf;
use subtrans::file_utils::{FileManager, translated_file_name};

use crate::common;

#[test]
fn test_translatedFileName_withKhmerSuffix_shouldKeepExtension() {
    assert_eq!(translated_file_name("episode 01.srt", "khmer"), "episode 01.khmer.srt");
    assert_eq!(translated_file_name("archive.tar.srt", "km"), "archive.tar.km.srt");
}

#[test]
fn test_generateOutputPath_withRelativeDir_shouldJoin() {
    let path = FileManager::generate_output_path("in/movie.srt", "out", "french");
    assert_eq!(path, PathBuf::from("out/movie.french.srt"));
}

#[test]
fn test_fileExists_withDirectory_shouldBeFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(!FileManager::file_exists(temp_dir.path()));

    let file = common::create_test_file(temp_dir.path(), "a.srt", "x")?;
    assert!(FileManager::file_exists(&file));
    Ok(())
}

#[test]
fn test_ensureDir_shouldBeIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().join("a/b");

    FileManager::ensure_dir(&dir)?;
    FileManager::ensure_dir(&dir)?;
    assert!(dir.is_dir());
    Ok(())
}

#[test]
fn test_readToString_withMissingFile_shouldNameThePath() {
    let err = FileManager::read_to_string("/no/such/file.srt").unwrap_err();
    assert!(err.to_string().contains("file.srt"));
}
