//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use polyglot_core::ResponseOptions;
use std::path::PathBuf;

/// Polyglot CLI - batch and pivot translation with local models
///
/// Loads translation models from YAML configurations, translates text
/// directly or through an intermediate language, and validates model
/// configurations before they are deployed.
#[derive(Parser, Debug)]
#[command(
    name = "polyglot",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "POLYGLOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate text with a model, optionally pivoting through a second one
    Translate(TranslateArgs),

    /// Load and validate a model configuration
    Validate(ValidateArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the translate command
#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Model configuration (YAML) for the source language
    #[arg(short, long, value_name = "MODEL_CONFIG")]
    pub model: PathBuf,

    /// Second model configuration; the first model's output is translated again
    #[arg(short, long, value_name = "MODEL_CONFIG")]
    pub pivot: Option<PathBuf>,

    /// Number of cached translations (0 disables the cache)
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Directory that relative paths in model configurations are resolved against
    #[arg(long, value_name = "DIR")]
    pub paths_dir: Option<PathBuf>,

    /// Treat inputs as HTML and leave markup untouched
    #[arg(long)]
    pub html: bool,

    /// Report a quality score per translated word
    #[arg(long)]
    pub scores: bool,

    /// Report word alignments
    #[arg(long)]
    pub alignment: bool,

    /// Report source and target sentence ranges
    #[arg(long)]
    pub sentence_mappings: bool,

    /// Texts to translate; each line of stdin is translated when omitted
    #[arg(value_name = "TEXT")]
    pub texts: Vec<String>,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the model configuration (YAML)
    #[arg(value_name = "MODEL_CONFIG")]
    pub model_config: PathBuf,

    /// Directory that relative paths in the configuration are resolved against
    #[arg(long, value_name = "DIR")]
    pub paths_dir: Option<PathBuf>,
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl TranslateArgs {
    /// Response annotations requested on the command line
    pub fn response_options(&self) -> ResponseOptions {
        ResponseOptions {
            html: self.html,
            quality_scores: self.scores,
            alignment: self.alignment,
            sentence_mappings: self.sentence_mappings,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
