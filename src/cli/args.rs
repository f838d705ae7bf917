//! CLI argument definitions.
//!
//! All Clap derive structs for `respite` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::logging::{ColorChoice, LogFormat};

// ============================================================================
// Root CLI
// ============================================================================

/// Downed-state and revive lifecycle tooling for tick-based simulations.
#[derive(Parser, Debug)]
#[command(name = "respite", author, version, about)]
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

    /// Log output format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "RESPITE_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect or clear durable pending-action markers.
    Pending(PendingCommand),

    /// Validate configuration files.
    Config(ConfigCommand),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Pending Command
// ============================================================================

/// Pending marker management commands.
#[derive(Args, Debug)]
pub struct PendingCommand {
    /// Pending subcommand.
    #[command(subcommand)]
    pub subcommand: PendingSubcommand,
}

/// Pending marker subcommands.
#[derive(Subcommand, Debug)]
pub enum PendingSubcommand {
    /// List pending markers in a store directory.
    List(PendingListArgs),

    /// Remove pending markers without replaying them.
    Clear(PendingClearArgs),
}

/// Arguments for `pending list`.
#[derive(Args, Debug)]
pub struct PendingListArgs {
    /// Marker store directory.
    #[arg(short, long, env = "RESPITE_MARKER_DIR")]
    pub dir: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `pending clear`.
#[derive(Args, Debug)]
pub struct PendingClearArgs {
    /// Marker store directory.
    #[arg(short, long, env = "RESPITE_MARKER_DIR")]
    pub dir: PathBuf,

    /// Entity id to clear. Clears every marker when omitted.
    pub id: Option<u64>,
}

// ============================================================================
// Config Command
// ============================================================================

/// Configuration commands.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Config subcommand.
    #[command(subcommand)]
    pub subcommand: ConfigSubcommand,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Parse configuration files and report problems without running anything.
    Check(ConfigCheckArgs),
}

/// Arguments for `config check`.
#[derive(Args, Debug)]
pub struct ConfigCheckArgs {
    /// Configuration files to check.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Version
// ============================================================================

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

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
