//! Durable pending-action tracking.
//!
//! When a combatant becomes unreachable while downed (disconnect, crash,
//! server restart), the in-memory countdown is lost. The tracker persists a
//! single marker per entity recording what must happen the next time that
//! entity becomes reachable: execute death, or restore the downed state
//! with a specific remaining time and location.
//!
//! Read semantics are read-once: [`PendingTracker::check_and_clear`]
//! always deletes the record it returns. A corrupt or half-written record
//! is logged, deleted, and treated as no pending action — a combatant must
//! never be blocked from connecting by a bad marker.
//!
//! Marker grammar, one record per entity:
//!
//! ```text
//! DEATH
//! RESTORE:<remainingSeconds>
//! RESTORE:<remainingSeconds>:<x>:<y>:<z>
//! ```

pub mod store;

use tracing::{debug, warn};

use crate::entity::{EntityId, Location};
use crate::error::StoreError;

pub use store::{FileMarkerStore, MarkerStore, MemoryMarkerStore};

/// What must happen to an entity the next time it becomes reachable.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Execute death immediately (the entity logged out while downed).
    ExecuteDeath,
    /// Restore the downed state with the given remaining time.
    RestoreDowned {
        /// Seconds that were left on the countdown.
        remaining_seconds: u32,
        /// Where the entity went down, if known.
        location: Option<Location>,
    },
}

impl PendingAction {
    /// Encodes this action into the marker grammar.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::ExecuteDeath => "DEATH".to_string(),
            Self::RestoreDowned {
                remaining_seconds,
                location: None,
            } => format!("RESTORE:{remaining_seconds}"),
            Self::RestoreDowned {
                remaining_seconds,
                location: Some(loc),
            } => format!("RESTORE:{remaining_seconds}:{}:{}:{}", loc.x, loc.y, loc.z),
        }
    }

    /// Parses a raw marker. `None` means the record is not valid.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == "DEATH" {
            return Some(Self::ExecuteDeath);
        }
        let rest = raw.strip_prefix("RESTORE:")?;
        let parts: Vec<&str> = rest.split(':').collect();
        let remaining_seconds = parts.first()?.parse::<u32>().ok()?;

        // Location is optional; all three coordinates must parse or the
        // whole location is dropped.
        let location = if parts.len() >= 4 {
            match (
                parts[1].parse::<f64>(),
                parts[2].parse::<f64>(),
                parts[3].parse::<f64>(),
            ) {
                (Ok(x), Ok(y), Ok(z)) => Some(Location::new(x, y, z)),
                _ => None,
            }
        } else {
            None
        };

        Some(Self::RestoreDowned {
            remaining_seconds,
            location,
        })
    }
}

/// Tracker binding the marker grammar to a [`MarkerStore`].
///
/// Writes happen only at disconnect boundaries and reads only at connect
/// boundaries — never on the simulation tick thread.
pub struct PendingTracker {
    store: Box<dyn MarkerStore>,
}

impl PendingTracker {
    #[must_use]
    pub fn new(store: Box<dyn MarkerStore>) -> Self {
        Self { store }
    }

    /// Persists an `ExecuteDeath` marker, overwriting any prior marker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be written.
    pub fn mark_for_death(&self, id: EntityId) -> Result<(), StoreError> {
        self.store.put(id, &PendingAction::ExecuteDeath.encode())?;
        debug!(entity = %id, "marked for death on next connect");
        Ok(())
    }

    /// Persists a `RestoreDowned` marker, overwriting any prior marker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be written.
    pub fn mark_for_restore(
        &self,
        id: EntityId,
        remaining_seconds: u32,
        location: Option<Location>,
    ) -> Result<(), StoreError> {
        let action = PendingAction::RestoreDowned {
            remaining_seconds,
            location,
        };
        self.store.put(id, &action.encode())?;
        debug!(
            entity = %id,
            remaining_seconds,
            "marked for downed-state restore on next connect"
        );
        Ok(())
    }

    /// Atomically reads and clears the pending action for an entity.
    ///
    /// Returns `None` when nothing is pending. A record that cannot be
    /// read or parsed is logged, removed, and reported as `None`.
    pub fn check_and_clear(&self, id: EntityId) -> Option<PendingAction> {
        let raw = match self.store.get(id) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(entity = %id, "pending marker unreadable, discarding: {e}");
                self.discard(id);
                return None;
            }
        };

        // Clear before acting so the record can never be replayed twice.
        self.discard(id);

        match PendingAction::parse(&raw) {
            Some(action) => {
                debug!(entity = %id, ?action, "pending action found");
                Some(action)
            }
            None => {
                warn!(entity = %id, marker = %raw.trim(), "corrupt pending marker discarded");
                None
            }
        }
    }

    /// Number of entities with a pending marker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be listed.
    pub fn pending_count(&self) -> Result<usize, StoreError> {
        Ok(self.store.list()?.len())
    }

    /// Entity ids with a pending marker, with the raw record for each.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be listed.
    pub fn pending_entries(&self) -> Result<Vec<(EntityId, Option<PendingAction>)>, StoreError> {
        let mut entries = Vec::new();
        for id in self.store.list()? {
            let action = self.store.get(id)?.as_deref().and_then(PendingAction::parse);
            entries.push((id, action));
        }
        Ok(entries)
    }

    /// Deletes the marker for an entity without reading it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be written.
    pub fn clear(&self, id: EntityId) -> Result<(), StoreError> {
        self.store.delete(id)
    }

    fn discard(&self, id: EntityId) {
        if let Err(e) = self.store.delete(id) {
            warn!(entity = %id, "failed to delete pending marker: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> PendingTracker {
        PendingTracker::new(Box::new(MemoryMarkerStore::new()))
    }

    #[test]
    fn test_encode_death() {
        assert_eq!(PendingAction::ExecuteDeath.encode(), "DEATH");
    }

    #[test]
    fn test_encode_restore_without_location() {
        let action = PendingAction::RestoreDowned {
            remaining_seconds: 42,
            location: None,
        };
        assert_eq!(action.encode(), "RESTORE:42");
    }

    #[test]
    fn test_encode_restore_with_location() {
        let action = PendingAction::RestoreDowned {
            remaining_seconds: 42,
            location: Some(Location::new(1.0, 2.0, 3.0)),
        };
        assert_eq!(action.encode(), "RESTORE:42:1:2:3");
    }

    #[test]
    fn test_parse_round_trip() {
        for action in [
            PendingAction::ExecuteDeath,
            PendingAction::RestoreDowned {
                remaining_seconds: 7,
                location: None,
            },
            PendingAction::RestoreDowned {
                remaining_seconds: 0,
                location: Some(Location::new(-1.5, 64.0, 200.25)),
            },
        ] {
            assert_eq!(PendingAction::parse(&action.encode()), Some(action));
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            PendingAction::parse("  DEATH\n"),
            Some(PendingAction::ExecuteDeath)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(PendingAction::parse(""), None);
        assert_eq!(PendingAction::parse("KEEP"), None);
        assert_eq!(PendingAction::parse("RESTORE:"), None);
        assert_eq!(PendingAction::parse("RESTORE:abc"), None);
        assert_eq!(PendingAction::parse("DEATH:extra"), None);
    }

    #[test]
    fn test_parse_drops_incomplete_location() {
        // Partial coordinates: keep the time, drop the location
        assert_eq!(
            PendingAction::parse("RESTORE:9:1.0:nope:3.0"),
            Some(PendingAction::RestoreDowned {
                remaining_seconds: 9,
                location: None,
            })
        );
    }

    #[test]
    fn test_check_and_clear_is_read_once() {
        let tracker = tracker();
        tracker.mark_for_death(EntityId(1)).unwrap();
        assert_eq!(
            tracker.check_and_clear(EntityId(1)),
            Some(PendingAction::ExecuteDeath)
        );
        assert_eq!(tracker.check_and_clear(EntityId(1)), None);
    }

    #[test]
    fn test_mark_overwrites_prior_marker() {
        let tracker = tracker();
        tracker.mark_for_death(EntityId(1)).unwrap();
        tracker.mark_for_restore(EntityId(1), 30, None).unwrap();
        assert_eq!(
            tracker.check_and_clear(EntityId(1)),
            Some(PendingAction::RestoreDowned {
                remaining_seconds: 30,
                location: None,
            })
        );
    }

    #[test]
    fn test_pending_count_and_entries() {
        let tracker = tracker();
        tracker.mark_for_death(EntityId(2)).unwrap();
        tracker.mark_for_restore(EntityId(4), 10, None).unwrap();
        assert_eq!(tracker.pending_count().unwrap(), 2);

        let entries = tracker.pending_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, EntityId(2));
        assert_eq!(entries[0].1, Some(PendingAction::ExecuteDeath));
    }

    #[test]
    fn test_corrupt_marker_cleared_and_none() {
        let store = MemoryMarkerStore::new();
        store.put(EntityId(3), "garbage!!").unwrap();
        let tracker = PendingTracker::new(Box::new(store));

        assert_eq!(tracker.check_and_clear(EntityId(3)), None);
        // Record was deleted, not left to be retried
        assert_eq!(tracker.pending_count().unwrap(), 0);
    }
}
