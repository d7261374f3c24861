// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use tagguard::app_config::{self, Config, TranslationProvider};
use tagguard::app_controller::{Controller, RunMode, RunOptions};
use tagguard::markup::abstract_segment;
use tagguard::translation::ExportPolicy;
use tagguard::validation::{QaStatus, ValidationService};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Abstract a raw segment and print the tokens as JSON
    Abstract {
        /// Raw segment content with inline markup
        #[arg(value_name = "RAW")]
        raw: String,
    },

    /// Validate an abstracted target against an abstracted source
    Validate {
        /// Abstracted source, e.g. "Hello {1}world{2}"
        #[arg(long)]
        source: String,

        /// Abstracted target
        #[arg(long)]
        target: String,
    },

    /// Translate a JSON batch of units
    Translate(RunArgs),

    /// Repair flagged units of a JSON batch
    Repair(RunArgs),

    /// Rewrite one unit's translation following an instruction
    Refine {
        #[command(flatten)]
        args: RunArgs,

        /// Id of the unit to refine
        #[arg(long)]
        id: String,

        /// Free-form instruction, e.g. "use the formal form of address"
        #[arg(long)]
        instruction: String,
    },

    /// Generate shell completions for tagguard
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Input unit batch (JSON)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output file (JSON)
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Export even when units still have QA errors (their source is exported)
    #[arg(short, long)]
    force: bool,

    /// Re-translate units that already passed QA
    #[arg(long)]
    retranslate: bool,
}

/// tagguard - token-safe AI translation for XLIFF segments
///
/// Translates segments with inline markup through AI providers while
/// guaranteeing that every marker survives.
#[derive(Parser, Debug)]
#[command(name = "tagguard")]
#[command(version)]
#[command(about = "Token-safe AI translation for XLIFF segments")]
#[command(long_about = "tagguard abstracts inline XLIFF markup into numbered tokens, translates the text with AI providers, validates and repairs the tokens, and restores the original markup.

EXAMPLES:
    tagguard abstract '<bpt id=\"1\">&lt;b&gt;</bpt>Save<ept id=\"1\">&lt;/b&gt;</ept>'
    tagguard validate --source 'Hello {1}world{2}' --target 'Bonjour {1}monde'
    tagguard translate -i units.json -o out.json           # Translate using default config
    tagguard -p openai -m gpt-4o translate -i units.json -o out.json
    tagguard -s en -t de-CH translate -i units.json -o out.json
    tagguard repair -i out-units.json -o fixed.json --force
    tagguard refine -i out-units.json -o out.json --id 12 --instruction 'Use formal address'
    tagguard completions bash > tagguard.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API key for the selected provider
    #[arg(long, env = "TAGGUARD_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Source language tag (e.g., 'en', 'fr-CA')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language tag (e.g., 'de', 'pt-BR')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
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

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Emoji prefix for log level
    fn emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => "",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {}{}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                Self::emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The max level is lowered or raised once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();
    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "tagguard", &mut std::io::stdout());
            Ok(())
        }
        Commands::Abstract { raw } => {
            let abstraction = abstract_segment(raw)?;
            println!("{}", serde_json::to_string_pretty(&abstraction)?);
            Ok(())
        }
        Commands::Validate { source, target } => {
            let config = load_config(&cli)?;
            let qa = ValidationService::new(config.validation).validate(source, target);
            println!("{}", serde_json::to_string_pretty(&qa)?);
            if qa.status == QaStatus::Error {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Translate(args) => run(&cli, args, RunMode::Translate).await,
        Commands::Repair(args) => run(&cli, args, RunMode::Repair).await,
        Commands::Refine { args, id, instruction } => refine(&cli, args, id, instruction).await,
    }
}

async fn refine(cli: &CommandLineOptions, args: &RunArgs, id: &str, instruction: &str) -> Result<()> {
    let config = load_config(cli)?;
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let policy = if args.force { ExportPolicy::Warn } else { ExportPolicy::Strict };
    let qa = controller
        .refine(&args.input, &args.output, id, instruction, policy)
        .await?;
    info!("Unit {} refined ({:?}, {})", id, qa.status, qa.tag_stats);
    Ok(())
}

async fn run(cli: &CommandLineOptions, args: &RunArgs, mode: RunMode) -> Result<()> {
    let config = load_config(cli)?;
    config.validate().context("Configuration validation failed")?;

    info!(
        "tagguard: {} {} -> {}",
        config.translation.provider.display_name(),
        config.source_language,
        config.target_language
    );

    let controller = Controller::with_config(config)?;
    let options = RunOptions {
        mode,
        retranslate: args.retranslate,
        export_policy: if args.force { ExportPolicy::Warn } else { ExportPolicy::Strict },
    };
    let summary = controller.run(&args.input, &args.output, options).await?;

    if summary.failed > 0 && !args.force {
        return Err(anyhow!("{} unit(s) failed", summary.failed));
    }
    Ok(())
}

/// Load or create the configuration and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }
    let active = config.translation.provider.clone();
    if let Some(model) = &cli.model {
        config.translation.provider_config_mut(&active).model = model.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.translation.provider_config_mut(&active).api_key = api_key.clone();
    }
    if let Some(source_lang) = &cli.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &cli.target_language {
        config.target_language = target_lang.clone();
    }

    match &cli.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }

    Ok(config)
}
