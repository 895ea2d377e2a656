/*!
 * Batch partitioning.
 *
 * Splits the ordered subtitle entries into fixed-size groups that are sent to
 * the translation port one at a time.
 */

use std::ops::Range;

use log::debug;

use crate::errors::PipelineError;
use crate::subtitle_processor::SubtitleEntry;

use super::port::TranslationItem;

/// A contiguous slice of the entry sequence, captured once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of this batch in the run (0-based)
    pub index: usize,

    /// Entry positions covered by this batch
    pub range: Range<usize>,

    /// Request payload for the covered entries
    pub items: Vec<TranslationItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split a slice into consecutive groups of at most `size` elements
///
/// Concatenating the result yields the input. `size` must be non-zero.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Result<Vec<Vec<T>>, PipelineError> {
    if size == 0 {
        return Err(PipelineError::InvalidBatchSize(size));
    }
    Ok(items.chunks(size).map(|c| c.to_vec()).collect())
}

/// Partition entries into batches of at most `size` entries
pub fn split_into_batches(entries: &[SubtitleEntry], size: usize) -> Result<Vec<Batch>, PipelineError> {
    let groups = chunk(entries, size)?;

    let mut start = 0;
    let batches: Vec<Batch> = groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let range = start..start + group.len();
            start = range.end;
            Batch {
                index,
                range,
                items: group.iter().map(SubtitleEntry::to_translation_item).collect(),
            }
        })
        .collect();

    debug!("Split {} entries into {} batch(es) of up to {}", entries.len(), batches.len(), size);
    Ok(batches)
}
