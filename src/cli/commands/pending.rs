//! Pending marker command handlers.
//!
//! Implements `pending list` and `pending clear` against a file-backed
//! marker store.

use serde_json::json;

use crate::cli::args::{OutputFormat, PendingClearArgs, PendingListArgs};
use crate::error::RespiteError;
use crate::pending::store::FileMarkerStore;
use crate::pending::{PendingAction, PendingTracker};

/// List pending markers in a store directory.
///
/// Unparseable markers are reported rather than silently dropped so an
/// operator can see corrupt records before entities reconnect.
///
/// # Errors
///
/// Returns a store error if the directory cannot be opened or read.
pub fn list(args: &PendingListArgs) -> Result<(), RespiteError> {
    let store = FileMarkerStore::open(&args.dir)?;
    let tracker = PendingTracker::new(Box::new(store));
    let entries = tracker.pending_entries()?;

    match args.format {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("no pending markers in {}", args.dir.display());
                return Ok(());
            }
            for (id, action) in &entries {
                match action {
                    Some(PendingAction::ExecuteDeath) => println!("{id}\tdeath"),
                    Some(PendingAction::RestoreDowned {
                        remaining_seconds,
                        location,
                    }) => match location {
                        Some(loc) => println!(
                            "{id}\trestore\t{remaining_seconds}s\t({}, {}, {})",
                            loc.x, loc.y, loc.z
                        ),
                        None => println!("{id}\trestore\t{remaining_seconds}s"),
                    },
                    None => println!("{id}\t<corrupt>"),
                }
            }
        }
        OutputFormat::Json => {
            let items: Vec<_> = entries
                .iter()
                .map(|(id, action)| match action {
                    Some(PendingAction::ExecuteDeath) => json!({
                        "entity": id.0,
                        "action": "death",
                    }),
                    Some(PendingAction::RestoreDowned {
                        remaining_seconds,
                        location,
                    }) => json!({
                        "entity": id.0,
                        "action": "restore",
                        "remaining_seconds": remaining_seconds,
                        "location": location.as_ref().map(|l| json!([l.x, l.y, l.z])),
                    }),
                    None => json!({
                        "entity": id.0,
                        "action": "corrupt",
                    }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }

    Ok(())
}

/// Remove pending markers without replaying them.
///
/// # Errors
///
/// Returns a store error if the directory cannot be opened or a marker
/// cannot be deleted.
pub fn clear(args: &PendingClearArgs) -> Result<(), RespiteError> {
    let store = FileMarkerStore::open(&args.dir)?;
    let tracker = PendingTracker::new(Box::new(store));

    if let Some(raw) = args.id {
        let id = crate::entity::EntityId(raw);
        tracker.clear(id)?;
        tracing::info!(entity = %id, "cleared pending marker");
    } else {
        let entries = tracker.pending_entries()?;
        let count = entries.len();
        for (id, _) in entries {
            tracker.clear(id)?;
        }
        tracing::info!(count, "cleared all pending markers");
    }

    Ok(())
}
