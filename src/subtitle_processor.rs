use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::file_utils::FileManager;
use crate::translation::TranslationItem;

// @module: Subtitle parsing and serialization (SRT)

// @const: SRT timestamp range, exactly one space either side of the arrow
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})")
        .expect("timestamp pattern is valid")
});

// @const: One or more empty lines between blocks
// A line holding only spaces belongs to the cue text.
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").expect("separator pattern is valid"));

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Cue number from the source file
    id: u32,

    // @field: Start timestamp, HH:MM:SS,mmm
    start_time: String,

    // @field: End timestamp, HH:MM:SS,mmm
    end_time: String,

    // @field: Current display text
    text: String,

    // @field: Text as parsed, never modified
    original_text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry whose text is also its original text
    pub fn new(id: u32, start_time: impl Into<String>, end_time: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        SubtitleEntry {
            id,
            start_time: start_time.into(),
            end_time: end_time.into(),
            original_text: text.clone(),
            text,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn end_time(&self) -> &str {
        &self.end_time
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Whether the display text differs from the parsed text
    pub fn is_translated(&self) -> bool {
        self.text != self.original_text
    }

    /// Request payload for the translation port
    pub fn to_translation_item(&self) -> TranslationItem {
        TranslationItem::new(self.id, self.text.clone())
    }

    // Only the pipeline merge step replaces text
    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Try to build an entry from one block of lines
    fn from_block(block: &str) -> Option<Self> {
        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() < 3 {
            debug!("Dropping block with {} line(s)", lines.len());
            return None;
        }

        let id = match lines[0].trim().parse::<u32>() {
            Ok(id) => id,
            Err(_) => {
                debug!("Dropping block with invalid id line: {:?}", lines[0]);
                return None;
            }
        };

        let Some(caps) = TIMESTAMP_REGEX.captures(lines[1].trim()) else {
            debug!("Dropping block {} with invalid timing line: {:?}", id, lines[1]);
            return None;
        };

        let text = lines[2..].join("\n").trim().to_string();
        Some(SubtitleEntry::new(id, &caps[1], &caps[2], text))
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.id)?;
        writeln!(f, "{} --> {}", self.start_time, self.end_time)?;
        write!(f, "{}", self.text)
    }
}

/// Parse SRT content into subtitle entries, in source order
///
/// Line endings are normalized and a leading byte order mark is dropped
/// first. Blocks are separated by empty lines. Blocks that are too short, carry a
/// non-numeric id or a malformed timing line are skipped; the rest of the
/// file is still parsed. An empty result is not an error here, callers decide
/// what an empty file means.
pub fn parse_srt_string(content: &str) -> Vec<SubtitleEntry> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = normalized.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let entries: Vec<SubtitleEntry> = BLOCK_SEPARATOR
        .split(trimmed)
        .map(str::trim_start)
        .filter_map(SubtitleEntry::from_block)
        .collect();

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &entries {
        if !seen.insert(entry.id) {
            warn!("Duplicate subtitle id {} found, keeping both entries", entry.id);
        }
    }

    entries
}

/// Serialize entries back into SRT, one blank line between blocks
pub fn to_srt_string(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Collection of subtitle entries with the file they came from
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Read and parse an SRT file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries: parse_srt_string(&content),
        })
    }

    /// Write subtitles to an SRT file
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        FileManager::write_to_file(path, &to_srt_string(&self.entries))
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
