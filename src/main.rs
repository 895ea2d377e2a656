// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;

use subtrans::app_config::{self, Config, TranslationProvider};
use subtrans::app_controller::Controller;
use subtrans::errors::AppError;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    Ollama,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an SRT file (default command)
    Translate(TranslateArgs),

    /// Parse an SRT file and show how it would be batched
    Inspect {
        /// Subtitle file to inspect
        #[arg(value_name = "FILE")]
        input_file: PathBuf,

        /// Number of cues to print
        #[arg(long, default_value_t = 5)]
        preview: usize,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Generate shell completions for subtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options that override values from the config file
#[derive(Args, Debug, Clone)]
struct SettingsArgs {
    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code, or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'km', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Number of subtitles per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input SRT file
    #[arg(value_name = "FILE")]
    input_file: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Directory for the translated file (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// subtrans - batch subtitle translation with AI
///
/// Translates SRT subtitle files through an LLM provider, a batch of cues at a time.
#[derive(Parser, Debug)]
#[command(name = "subtrans")]
#[command(version)]
#[command(about = "AI-powered SRT subtitle translation tool")]
#[command(long_about = "subtrans translates SRT subtitle files with an LLM provider, one batch of cues at a time.

EXAMPLES:
    subtrans movie.srt                          # Translate using default config
    subtrans -f movie.srt                       # Force overwrite existing output
    subtrans -p ollama -m llama3.2:3b movie.srt # Use specific provider and model
    subtrans -t es -b 50 movie.srt              # Translate to Spanish, 50 cues per request
    subtrans inspect movie.srt                  # Show cue and batch counts
    subtrans completions bash > subtrans.bash   # Generate bash completions

Press Ctrl-C once to pause after the current batch, then Enter to resume.
A second Ctrl-C abandons the run without writing anything.

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini API (default: gemini-2.5-flash, requires GEMINI_API_KEY or API_KEY)
    ollama    - Local Ollama server (default: llama3.2:3b)
    anthropic - Anthropic Claude API (requires ANTHROPIC_API_KEY or API_KEY)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file
    #[arg(value_name = "FILE")]
    input_file: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Directory for the translated file (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    settings: SettingsArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Everything passes the logger, log::set_max_level does the filtering
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    if let Err(e) = run(CommandLineOptions::parse()).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Inspect { input_file, preview, settings }) => {
            let config = load_config(&settings)?;
            run_inspect(config, input_file, preview)
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args
            let input_file = cli
                .input_file
                .ok_or_else(|| anyhow!("FILE is required when no subcommand is specified"))?;

            run_translate(TranslateArgs {
                input_file,
                force_overwrite: cli.force_overwrite,
                output_dir: cli.output_dir,
                settings: cli.settings,
            })
            .await
        }
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &SettingsArgs) -> Result<Config> {
    // Apply a command line log level before the config is read
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level((&level).into());
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(batch_size) = options.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    log::set_max_level((&config.log_level).into());
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let config = load_config(&options.settings)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    match controller
        .run(options.input_file, options.output_dir, options.force_overwrite)
        .await
    {
        Ok(output_path) => {
            info!("Success: {}", output_path.display());
            Ok(())
        }
        Err(AppError::Aborted) => {
            info!("Translation aborted, nothing was written");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_inspect(config: Config, input_file: PathBuf, preview: usize) -> Result<()> {
    let controller = Controller::with_config(config)?;
    let summary = controller.inspect(&input_file, preview)?;

    println!("File:    {}", summary.source_file.display());
    println!("Cues:    {}", summary.cue_count);
    println!("Batches: {} (batch size {})", summary.batch_count, summary.batch_size);
    for entry in &summary.preview {
        println!();
        println!("{}", entry);
    }
    Ok(())
}
