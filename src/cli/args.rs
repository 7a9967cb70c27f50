//! CLI argument definitions
//!
//! All Clap derive structs for `deckhand` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::{LogFormat, LogTarget};

// ============================================================================
// Root CLI
// ============================================================================

/// Terminal slide presenter with interactive scenario slides.
#[derive(Parser, Debug)]
#[command(name = "deckhand", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "DECKHAND_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true, env = "DECKHAND_LOG_FORMAT")]
    pub log_format: LogFormatArg,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true, env = "DECKHAND_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Where logs should go for this invocation.
    ///
    /// The interactive terminal owns the screen, so it only logs when a log
    /// file was given.
    #[must_use]
    pub fn log_target(&self) -> LogTarget {
        if let Some(path) = &self.log_file {
            return LogTarget::File(path.clone());
        }
        match &self.command {
            _ if self.quiet => LogTarget::Disabled,
            Commands::Present(args) if !args.headless => LogTarget::Disabled,
            _ => LogTarget::Stderr,
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Present a deck.
    Present(PresentArgs),

    /// Validate deck files without presenting them.
    Validate(ValidateArgs),

    /// List the slides of a deck.
    List(ListArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `present`.
#[derive(Args, Debug)]
pub struct PresentArgs {
    /// Deck file. The built-in deck is used when omitted.
    #[arg(env = "DECKHAND_DECK")]
    pub deck: Option<PathBuf>,

    /// Slide to start on (1-based, clamped to the deck).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub start: u32,

    /// Read a script of inputs from stdin and emit events on stdout
    /// instead of drawing to the terminal. Mouse side buttons (`button 3`,
    /// `button 4`) are only available here.
    #[arg(long)]
    pub headless: bool,

    /// Write the JSONL event stream to this file.
    #[arg(long, env = "DECKHAND_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on `127.0.0.1:<port>`.
    #[arg(long, env = "DECKHAND_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Seed every scenario's RNG for reproducible runs.
    #[arg(long, env = "DECKHAND_SEED")]
    pub seed: Option<u64>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Deck files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Deck file. The built-in deck is used when omitted.
    pub deck: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Log format as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable lines.
    #[default]
    Human,
    /// Newline-delimited JSON.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Human => Self::Human,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
