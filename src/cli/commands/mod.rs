//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod config;
pub mod pending;
pub mod version;

use crate::cli::args::{Cli, Commands, ConfigSubcommand, PendingSubcommand};
use crate::error::RespiteError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), RespiteError> {
    match cli.command {
        Commands::Pending(cmd) => match cmd.subcommand {
            PendingSubcommand::List(args) => pending::list(&args),
            PendingSubcommand::Clear(args) => pending::clear(&args),
        },
        Commands::Config(cmd) => match cmd.subcommand {
            ConfigSubcommand::Check(args) => config::check(&args),
        },
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}
