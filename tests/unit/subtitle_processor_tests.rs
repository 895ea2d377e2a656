/*!
 * Tests for SRT parsing and serialization
 */

use anyhow::Result;
use subtrans::subtitle_processor::{SubtitleCollection, SubtitleEntry, parse_srt_string, to_srt_string};

use crate::common;

/// Test subtitle entry display formatting
#[test]
fn test_subtitle_entry_display_withValidEntry_shouldFormatCorrectly() {
    let entry = SubtitleEntry::new(7, "00:00:05,000", "00:00:10,000", "Test subtitle");
    assert_eq!(entry.to_string(), "7\n00:00:05,000 --> 00:00:10,000\nTest subtitle");
}

#[test]
fn test_parse_withCrlfAndMultilineText_shouldNormalize() {
    let content = "1\r\n00:00:01,000 --> 00:00:04,000\r\nFirst line\r\nSecond line\r\n\r\n2\r\n00:00:05,000 --> 00:00:06,000\r\nNext\r\n";
    let entries = parse_srt_string(content);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text(), "First line\nSecond line");
    assert_eq!(entries[0].original_text(), "First line\nSecond line");
    assert_eq!(entries[1].start_time(), "00:00:05,000");
    assert_eq!(entries[1].end_time(), "00:00:06,000");
}

#[test]
fn test_parse_withMalformedBlocks_shouldSkipOnlyThose() {
    let content = "\
1
00:00:01,000 --> 00:00:02,000
Kept

abc
00:00:03,000 --> 00:00:04,000
Bad id

3
00:00:05,000 -> 00:00:06,000
Bad arrow

4
Too short

5
00:00:07,000 --> 00:00:08,000
Also kept
";
    let entries = parse_srt_string(content);
    let ids: Vec<u32> = entries.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![1, 5]);
}

#[test]
fn test_parse_withExtraBlankLines_shouldTreatAsOneSeparator() {
    let content = "\n\n1\n00:00:01,000 --> 00:00:02,000\nA\n\n\n \n2\n00:00:03,000 --> 00:00:04,000\nB\n\n\n";
    let entries = parse_srt_string(content);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].text(), "B");
}

#[test]
fn test_parse_withUtf8BomFile_shouldKeepEveryCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "bom.srt", &format!("\u{feff}{}", common::HELLO_WORLD_SRT))?;

    let collection = SubtitleCollection::from_file(&path)?;
    let ids: Vec<u32> = collection.entries.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(collection.entries[0].text(), "Hello");
    Ok(())
}

#[test]
fn test_parse_withSpacesOnlyLineInsideCue_shouldNotTruncateText() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nHello\n \nWorld\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n";
    let texts: Vec<String> = parse_srt_string(content).iter().map(|e| e.text().to_string()).collect();
    assert_eq!(texts, vec!["Hello\n \nWorld", "B"]);
}

#[test]
fn test_parse_withEmptyOrGarbage_shouldReturnNothing() {
    assert!(parse_srt_string("").is_empty());
    assert!(parse_srt_string("   \n\n  ").is_empty());
    assert!(parse_srt_string("just some text\nwithout any cues").is_empty());
}

#[test]
fn test_parse_withDuplicateIds_shouldKeepBothInOrder() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nA\n\n1\n00:00:03,000 --> 00:00:04,000\nB\n";
    let entries = parse_srt_string(content);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text(), "A");
    assert_eq!(entries[1].text(), "B");
}

#[test]
fn test_serialize_thenParse_shouldPreserveTimingAndText() {
    let source = common::numbered_srt(4);
    let entries = parse_srt_string(&source);
    let rendered = to_srt_string(&entries);

    assert_eq!(rendered, source);
    assert_eq!(parse_srt_string(&rendered), entries);
}

#[test]
fn test_serialize_withNoEntries_shouldBeEmpty() {
    assert_eq!(to_srt_string(&[]), "");
}

#[test]
fn test_collection_fromFile_shouldParseAndRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let collection = SubtitleCollection::from_file(&path)?;
    assert_eq!(collection.len(), 3);
    assert!(!collection.is_empty());
    assert_eq!(collection.entries[2].text(), "For testing purposes.");

    let copy = temp_dir.path().join("copy.srt");
    collection.write_to_srt(&copy)?;
    assert_eq!(SubtitleCollection::from_file(&copy)?.entries, collection.entries);
    Ok(())
}

#[test]
fn test_collection_fromMissingFile_shouldFail() {
    assert!(SubtitleCollection::from_file("/definitely/not/here.srt").is_err());
}
