use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app_config::{Config, TranslationProvider};
use crate::errors::{AppError, PipelineError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::anthropic::Anthropic;
use crate::providers::gemini::Gemini;
use crate::providers::ollama::Ollama;
use crate::providers::Provider;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::translation::{
    Phase, PipelineControl, PipelineSnapshot, ProviderTranslator, TranslationPipeline, TranslationPort,
    split_into_batches,
};
use crate::translation::pipeline::NO_VALID_BLOCKS;

// @module: Application controller for subtitle processing

/// What to do with a paused run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseDecision {
    Resume,
    Abort,
}

/// Decides how a paused run continues
#[async_trait]
pub trait PausePrompt: Send {
    async fn on_pause(&mut self, snapshot: &PipelineSnapshot) -> PauseDecision;

    /// Whether Ctrl-C should steer the run while this prompt is in charge
    fn handles_interrupts(&self) -> bool {
        false
    }
}

/// Asks on the terminal: Enter resumes, Ctrl-C aborts
pub struct TerminalPrompt;

#[async_trait]
impl PausePrompt for TerminalPrompt {
    async fn on_pause(&mut self, snapshot: &PipelineSnapshot) -> PauseDecision {
        eprintln!(
            "Paused after batch {}/{} ({}%). Press Enter to resume or Ctrl-C to abort.",
            snapshot.cursor, snapshot.total_batches, snapshot.progress
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(_)) => PauseDecision::Resume,
                // stdin closed, nobody can resume
                _ => PauseDecision::Abort,
            },
            _ = tokio::signal::ctrl_c() => PauseDecision::Abort,
        }
    }

    fn handles_interrupts(&self) -> bool {
        true
    }
}

/// Resumes every pause straight away
pub struct AutoResume;

#[async_trait]
impl PausePrompt for AutoResume {
    async fn on_pause(&mut self, _snapshot: &PipelineSnapshot) -> PauseDecision {
        PauseDecision::Resume
    }
}

/// Counts of a parsed subtitle file
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub source_file: PathBuf,
    pub cue_count: usize,
    pub batch_count: usize,
    pub batch_size: usize,
    pub preview: Vec<SubtitleEntry>,
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(anyhow::anyhow!("batch_size must be at least 1"));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the translation port for the configured provider
    pub fn build_translator(&self) -> Result<Box<dyn TranslationPort>> {
        let translation = &self.config.translation;
        let model = translation.get_model();
        let endpoint = translation.get_endpoint();
        let timeout = translation.get_timeout_secs();

        let translator: Box<dyn TranslationPort> = match translation.provider {
            TranslationProvider::Gemini => {
                self.wrap(Gemini::new(translation.get_api_key(), endpoint, model, timeout))?
            }
            TranslationProvider::Ollama => self.wrap(Ollama::new(endpoint, model, timeout))?,
            TranslationProvider::Anthropic => {
                self.wrap(Anthropic::new(translation.get_api_key(), endpoint, model, timeout))?
            }
        };
        Ok(translator)
    }

    fn wrap<P: Provider + 'static>(&self, provider: P) -> Result<Box<dyn TranslationPort>> {
        let source = language_utils::prompt_language_name(&self.config.source_language)?;
        let target = language_utils::get_language_name(&self.config.target_language)?;
        let common = &self.config.translation.common;

        let translator = ProviderTranslator::new(provider, &common.system_prompt, &source, &target)
            .with_temperature(common.temperature);
        Ok(Box::new(translator))
    }

    /// Run the main workflow: translate one SRT file and write the result
    ///
    /// Returns the path of the written file.
    pub async fn run(&self, input_file: PathBuf, output_dir: Option<PathBuf>, force_overwrite: bool) -> Result<PathBuf, AppError> {
        let translator = self.build_translator()?;
        self.run_with(translator, &mut TerminalPrompt, input_file, output_dir, force_overwrite)
            .await
    }

    /// Run the workflow with a given translation port and pause prompt
    pub async fn run_with<T, P>(
        &self,
        translator: T,
        prompt: &mut P,
        input_file: PathBuf,
        output_dir: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<PathBuf, AppError>
    where
        T: TranslationPort,
        P: PausePrompt + ?Sized,
    {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(AppError::File(format!("Input file does not exist: {}", input_file.display())));
        }

        let output_path = self.output_path(&input_file, output_dir.as_deref());
        if output_path.exists() && !force_overwrite {
            return Err(AppError::File(format!(
                "Output file already exists: {} (use -f to force overwrite)",
                output_path.display()
            )));
        }

        let content = FileManager::read_to_string(&input_file)?;
        let file_name = input_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        info!(
            "Translating {} with {} - {}",
            file_name,
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        // Fail before any batch is sent if the provider cannot be reached
        translator.test_connection().await.map_err(|e| {
            error!("Provider connection test failed: {}", e);
            AppError::Provider(e)
        })?;

        let mut pipeline = TranslationPipeline::new(translator, self.config.batch_size)?;
        let progress = spawn_progress_bar(pipeline.subscribe());
        let interrupts = prompt
            .handles_interrupts()
            .then(|| spawn_interrupt_listener(pipeline.control()));

        let outcome = translate_file(&mut pipeline, &file_name, &content, prompt).await;

        if let Some(interrupts) = interrupts {
            interrupts.abort();
        }
        drop(pipeline);
        if let Err(e) = progress.await {
            warn!("Progress display task ended abnormally: {}", e);
        }

        let entries = outcome?;
        let translated = SubtitleCollection {
            source_file: input_file.clone(),
            entries,
        };
        translated.write_to_srt(&output_path)?;

        info!(
            "Translation completed in {}: {}",
            Self::format_duration(start_time.elapsed()),
            output_path.display()
        );
        Ok(output_path)
    }

    /// Parse a file and report how it would be batched
    pub fn inspect(&self, input_file: &Path, preview: usize) -> Result<FileSummary, AppError> {
        let collection = SubtitleCollection::from_file(input_file)?;
        if collection.is_empty() {
            return Err(AppError::Pipeline(PipelineError::Content(NO_VALID_BLOCKS.to_string())));
        }
        let batches = split_into_batches(&collection.entries, self.config.batch_size)?;
        debug!("{}", collection);

        Ok(FileSummary {
            source_file: collection.source_file.clone(),
            cue_count: collection.len(),
            batch_count: batches.len(),
            batch_size: self.config.batch_size,
            preview: collection.entries.into_iter().take(preview).collect(),
        })
    }

    /// Where the translation of `input_file` is written
    pub fn output_path(&self, input_file: &Path, output_dir: Option<&Path>) -> PathBuf {
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input_file.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        FileManager::generate_output_path(input_file, dir, &self.config.output_suffix())
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Load `content` into the pipeline and drive it to completion
///
/// Pauses are handed to `prompt`. Returns the translated entries, the run's
/// error if it failed, or `AppError::Aborted` if it was reset or abandoned.
pub async fn translate_file<T, P>(
    pipeline: &mut TranslationPipeline<T>,
    file_name: &str,
    content: &str,
    prompt: &mut P,
) -> Result<Vec<SubtitleEntry>, AppError>
where
    T: TranslationPort,
    P: PausePrompt + ?Sized,
{
    if pipeline.load(file_name, content) == Phase::Failed {
        return Err(failure(pipeline));
    }

    let mut phase = pipeline.start().await?;
    loop {
        match phase {
            Phase::Complete => return Ok(pipeline.state().records().to_vec()),
            Phase::Paused => match prompt.on_pause(&pipeline.snapshot()).await {
                PauseDecision::Resume => {
                    info!("Resuming at batch {}/{}", pipeline.state().cursor() + 1, pipeline.state().total_batches());
                    phase = match pipeline.resume().await {
                        // A reset requested while paused wins over the resume
                        Err(PipelineError::InvalidTransition { from: Phase::Idle, .. }) => {
                            return Err(AppError::Aborted);
                        }
                        other => other?,
                    };
                }
                PauseDecision::Abort => {
                    warn!("Translation of {} aborted while paused", file_name);
                    pipeline.reset();
                    return Err(AppError::Aborted);
                }
            },
            Phase::Failed => return Err(failure(pipeline)),
            Phase::Idle => return Err(AppError::Aborted),
            other => return Err(AppError::Unknown(format!("Run stopped in unexpected phase: {}", other))),
        }
    }
}

fn failure<T: TranslationPort>(pipeline: &TranslationPipeline<T>) -> AppError {
    match pipeline.state().error() {
        Some(error) => AppError::Pipeline(error.clone()),
        None => AppError::Unknown("Run failed without an error".to_string()),
    }
}

// First Ctrl-C pauses after the in-flight batch, a second one resets the run
fn spawn_interrupt_listener(control: PipelineControl) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if control.is_pause_requested() {
                warn!("Interrupted again, abandoning the run");
                control.request_reset();
            } else {
                warn!("Pause requested, finishing the current batch");
                control.request_pause();
            }
        }
    })
}

// Mirrors published snapshots on a progress bar until the pipeline is dropped
fn spawn_progress_bar(mut snapshots: watch::Receiver<PipelineSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("#>-"));

        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            progress_bar.set_length(snapshot.total_batches as u64);
            progress_bar.set_position(snapshot.cursor as u64);
            progress_bar.set_message(snapshot.phase.to_string());
            if snapshot.phase.is_terminal() {
                break;
            }
        }
        progress_bar.finish();
    })
}
