//! `respite` — downed-state lifecycle tooling.

use clap::Parser;

use respite::cli::args::Cli;
use respite::cli::commands;
use respite::error::ExitCode;
use respite::observability::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    match commands::dispatch(cli) {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
