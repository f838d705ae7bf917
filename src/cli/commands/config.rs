//! Configuration command handlers.
//!
//! Implements `config check`.

use serde_json::json;

use crate::cli::args::{ConfigCheckArgs, OutputFormat};
use crate::config::RespiteConfig;
use crate::error::{ConfigError, RespiteError};

/// Parse configuration files and report problems.
///
/// With `--strict`, any warning fails the check.
///
/// # Errors
///
/// Returns a config error for the first file that fails to parse, or
/// whose warnings are rejected by `--strict`.
pub fn check(args: &ConfigCheckArgs) -> Result<(), RespiteError> {
    for path in &args.files {
        tracing::info!(file = %path.display(), "checking configuration");
        let config = RespiteConfig::load(path)?;
        let warnings = config.warnings();

        match args.format {
            OutputFormat::Human => {
                for warning in &warnings {
                    println!("{}: warning: {warning}", path.display());
                }
                if warnings.is_empty() {
                    println!("{}: ok", path.display());
                }
            }
            OutputFormat::Json => {
                let report = json!({
                    "file": path.display().to_string(),
                    "ok": warnings.is_empty(),
                    "warnings": warnings,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        if args.strict && !warnings.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: path.display().to_string(),
                value: format!("{} warning(s)", warnings.len()),
                expected: "no warnings in strict mode".to_string(),
            }
            .into());
        }
    }

    Ok(())
}
