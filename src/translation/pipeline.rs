/*!
 * Pausable, resumable batch translation runs.
 *
 * A [`TranslationPipeline`] owns the state of one run: the parsed entries,
 * the batches derived from them and a cursor pointing at the next batch.
 * Batches are sent to the [`TranslationPort`] strictly one after another.
 * Other tasks steer a run through a cloneable [`PipelineControl`] and watch
 * it through [`PipelineSnapshot`]s published on a `tokio::sync::watch` channel.
 *
 * ```text
 * Idle --load--> Parsing --+--> Ready --start--> Translating --+--> Complete
 *                          |                      ^     |      |
 *                          +--> Failed            |   pause    +--> Failed
 *                                              resume   |
 *                                                 +-- Paused
 * ```
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::{debug, error, info, warn};
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::file_utils::translated_file_name;
use crate::subtitle_processor::{SubtitleEntry, parse_srt_string, to_srt_string};

use super::batch::{Batch, split_into_batches};
use super::port::{TranslationItem, TranslationPort};

/// Message recorded when a file yields no usable subtitle blocks
pub const NO_VALID_BLOCKS: &str = "No valid subtitle blocks found in this file.";

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Parsing,
    Ready,
    Translating,
    Paused,
    Complete,
    Failed,
}

impl Phase {
    /// Complete and Failed end a run; only `load` or `reset` leave them
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Parsing => "parsing",
            Phase::Ready => "ready",
            Phase::Translating => "translating",
            Phase::Paused => "paused",
            Phase::Complete => "complete",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State of the current run
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    run_id: Option<Uuid>,
    phase: Phase,
    cursor: usize,
    records: Vec<SubtitleEntry>,
    batches: Vec<Batch>,
    error: Option<PipelineError>,
    file_name: String,
}

impl PipelineState {
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the next batch to translate
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn records(&self) -> &[SubtitleEntry] {
        &self.records
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn total_batches(&self) -> usize {
        self.batches.len()
    }

    /// Present only when the run failed
    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Percentage of batches done; 100 is reserved for a completed run
    pub fn progress(&self) -> u8 {
        if self.phase == Phase::Complete {
            return 100;
        }
        let total = self.batches.len();
        if total == 0 {
            return 0;
        }
        let percent = (100.0 * self.cursor as f64 / total as f64).round() as u8;
        percent.min(99)
    }

    /// 1-based number of the batch in flight, failed, or last finished
    pub fn current_batch(&self) -> usize {
        match self.phase {
            Phase::Translating | Phase::Failed => (self.cursor + 1).min(self.batches.len()),
            _ => self.cursor,
        }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            run_id: self.run_id,
            phase: self.phase,
            progress: self.progress(),
            cursor: self.cursor,
            current_batch: self.current_batch(),
            total_batches: self.batches.len(),
            error: self.error.as_ref().map(|e| e.to_string()),
            records: self.records.clone(),
            file_name: self.file_name.clone(),
        }
    }
}

/// Read-only view of a run, published after every transition and batch
#[derive(Debug, Clone, Default)]
pub struct PipelineSnapshot {
    pub run_id: Option<Uuid>,
    pub phase: Phase,
    pub progress: u8,
    pub cursor: usize,
    pub current_batch: usize,
    pub total_batches: usize,
    pub error: Option<String>,
    pub records: Vec<SubtitleEntry>,
    pub file_name: String,
}

#[derive(Debug, Default)]
struct ControlFlags {
    pause_requested: AtomicBool,
    generation: AtomicU64,
}

/// Handle for steering a run from other tasks
///
/// Requests are cooperative: neither a pause nor a reset interrupts a batch
/// that is already in flight. A pause stops the run before the next batch is
/// submitted. A reset makes the run drop whatever the in-flight batch returns
/// and go back to idle.
#[derive(Debug, Clone, Default)]
pub struct PipelineControl {
    flags: Arc<ControlFlags>,
}

impl PipelineControl {
    pub fn request_pause(&self) {
        self.flags.pause_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_pause_requested(&self) -> bool {
        self.flags.pause_requested.load(Ordering::SeqCst)
    }

    /// Ask the pipeline to abandon its run
    ///
    /// Only the pipeline applies a reset. While it is between runs (`Ready`
    /// or `Paused`) the request stays pending: state and observers keep the
    /// old run until the next `start` or `resume`, which then discards it and
    /// reports `InvalidTransition` from `Idle`.
    pub fn request_reset(&self) {
        self.flags.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Incremented by every reset request
    pub fn generation(&self) -> u64 {
        self.flags.generation.load(Ordering::SeqCst)
    }

    fn take_pause(&self) -> bool {
        self.flags.pause_requested.swap(false, Ordering::SeqCst)
    }

    fn clear_pause(&self) {
        self.flags.pause_requested.store(false, Ordering::SeqCst);
    }
}

/// Drives one subtitle file through the translation port, batch by batch
pub struct TranslationPipeline<T: TranslationPort> {
    translator: T,
    batch_size: usize,
    state: PipelineState,
    control: PipelineControl,
    // Generation the current state belongs to
    generation: u64,
    observer: watch::Sender<PipelineSnapshot>,
}

impl<T: TranslationPort> TranslationPipeline<T> {
    /// Create an idle pipeline
    pub fn new(translator: T, batch_size: usize) -> Result<Self, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize(batch_size));
        }
        let (observer, _) = watch::channel(PipelineSnapshot::default());
        Ok(Self {
            translator,
            batch_size,
            state: PipelineState::default(),
            control: PipelineControl::default(),
            generation: 0,
            observer,
        })
    }

    pub fn control(&self) -> PipelineControl {
        self.control.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.observer.subscribe()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.snapshot()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Start a new run from subtitle text, discarding any previous run
    ///
    /// Ends in `Ready`, or in `Failed` with a content error when no block parses.
    pub fn load(&mut self, file_name: impl Into<String>, content: &str) -> Phase {
        self.reset_state();

        let run_id = Uuid::new_v4();
        self.state.run_id = Some(run_id);
        self.state.file_name = file_name.into();
        self.set_phase(Phase::Parsing);

        let records = parse_srt_string(content);
        if records.is_empty() {
            warn!("Run {}: {} ({})", run_id, NO_VALID_BLOCKS, self.state.file_name);
            self.fail(PipelineError::Content(NO_VALID_BLOCKS.to_string()));
            return self.state.phase;
        }

        match split_into_batches(&records, self.batch_size) {
            Ok(batches) => {
                info!(
                    "Run {}: loaded {} subtitle(s) from {} into {} batch(es)",
                    run_id,
                    records.len(),
                    self.state.file_name,
                    batches.len()
                );
                self.state.records = records;
                self.state.batches = batches;
                self.set_phase(Phase::Ready);
            }
            Err(e) => self.fail(e),
        }
        self.state.phase
    }

    /// Begin translating a loaded file
    ///
    /// Returns the phase the run stopped in: `Paused`, `Complete`, `Failed`,
    /// or `Idle` if a reset was requested while a batch was in flight.
    pub async fn start(&mut self) -> Result<Phase, PipelineError> {
        self.enter_translating(Phase::Ready, "start")?;
        Ok(self.run_batches().await)
    }

    /// Continue a paused run from its cursor
    pub async fn resume(&mut self) -> Result<Phase, PipelineError> {
        self.enter_translating(Phase::Paused, "resume")?;
        Ok(self.run_batches().await)
    }

    /// Discard the current run and go back to idle
    pub fn reset(&mut self) {
        if let Some(run_id) = self.state.run_id {
            info!("Run {}: reset", run_id);
        }
        self.reset_state();
        self.publish();
    }

    /// Current entries rendered as SRT
    pub fn output_text(&self) -> String {
        to_srt_string(&self.state.records)
    }

    /// Output file name for the loaded file, e.g. `movie.khmer.srt`
    pub fn output_file_name(&self, suffix: &str) -> String {
        translated_file_name(&self.state.file_name, suffix)
    }

    fn enter_translating(&mut self, expected: Phase, action: &'static str) -> Result<(), PipelineError> {
        self.apply_pending_reset();
        if self.state.phase != expected {
            return Err(PipelineError::InvalidTransition { from: self.state.phase, action });
        }
        self.control.clear_pause();
        self.set_phase(Phase::Translating);
        Ok(())
    }

    async fn run_batches(&mut self) -> Phase {
        let total = self.state.batches.len();

        while self.state.cursor < total {
            if self.is_stale() {
                self.discard_run();
                return self.state.phase;
            }
            if self.control.take_pause() {
                info!(
                    "Run {}: paused after batch {}/{}",
                    self.run_label(),
                    self.state.cursor,
                    total
                );
                self.set_phase(Phase::Paused);
                return self.state.phase;
            }

            let index = self.state.cursor;
            debug!(
                "Run {}: submitting batch {}/{} ({} cue(s))",
                self.run_label(),
                index + 1,
                total,
                self.state.batches[index].len()
            );

            let result = self.translator.translate(&self.state.batches[index].items).await;

            if self.is_stale() {
                debug!("Run {}: dropping result of batch {} after reset", self.run_label(), index + 1);
                self.discard_run();
                return self.state.phase;
            }

            match result {
                Ok(items) => {
                    self.merge(index, items);
                    self.state.cursor += 1;
                    self.publish();
                }
                Err(e) => {
                    error!("Run {}: batch {}/{} failed: {}", self.run_label(), index + 1, total, e);
                    self.fail(PipelineError::Boundary {
                        batch_index: index,
                        message: e.to_string(),
                    });
                    return self.state.phase;
                }
            }
        }

        info!("Run {}: all {} batch(es) translated", self.run_label(), total);
        self.set_phase(Phase::Complete);
        self.state.phase
    }

    /// Overlay translated text onto the entries of one batch, matching by id
    fn merge(&mut self, index: usize, items: Vec<TranslationItem>) {
        let range = self.state.batches[index].range.clone();
        let requested = range.len();

        let overlay: HashMap<u32, String> = items.into_iter().map(|item| (item.id, item.text)).collect();

        let mut applied = 0;
        for entry in &mut self.state.records[range] {
            if let Some(text) = overlay.get(&entry.id()) {
                entry.set_text(text.clone());
                applied += 1;
            }
        }
        debug!("Run {}: batch {} merged {}/{} cue(s)", self.run_label(), index + 1, applied, requested);
    }

    fn fail(&mut self, error: PipelineError) {
        self.state.error = Some(error);
        self.set_phase(Phase::Failed);
    }

    fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        if phase != Phase::Failed {
            self.state.error = None;
        }
        self.publish();
    }

    fn publish(&self) {
        self.observer.send_replace(self.state.snapshot());
    }

    fn is_stale(&self) -> bool {
        self.generation != self.control.generation()
    }

    fn apply_pending_reset(&mut self) {
        if self.is_stale() {
            self.discard_run();
        }
    }

    fn discard_run(&mut self) {
        info!("Run {}: reset requested, discarding run", self.run_label());
        self.reset_state();
        self.publish();
    }

    fn reset_state(&mut self) {
        self.state = PipelineState::default();
        self.generation = self.control.generation();
        self.control.clear_pause();
    }

    fn run_label(&self) -> String {
        self.state.run_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
    }
}
