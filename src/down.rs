//! Down manager: authoritative owner of downed combatants.
//!
//! Single-writer design: every mutation happens on the simulation tick
//! thread, so the entry map is a plain `HashMap` with no internal locking.
//! Cross-thread visibility goes through the [`StateIndex`] mirror, which
//! this manager keeps in sync on every transition.
//!
//! All public mutators are idempotent no-ops returning `false` when the
//! precondition does not hold; callers check the boolean.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use tracing::{debug, info};

use crate::config::RespiteConfig;
use crate::entity::{Aggressor, Downable, EntityId};
use crate::index::StateIndex;
use crate::revive::ReviveManager;

/// Authoritative record of one downed combatant.
pub struct DownedEntry {
    handle: Arc<dyn Downable>,
    remaining_ticks: u32,
    aggressor: Aggressor,
}

impl DownedEntry {
    /// Ticks left on the countdown.
    #[must_use]
    pub const fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// Who is credited with the down.
    #[must_use]
    pub const fn aggressor(&self) -> &Aggressor {
        &self.aggressor
    }

    /// The downed combatant.
    #[must_use]
    pub fn handle(&self) -> &Arc<dyn Downable> {
        &self.handle
    }
}

/// Owns the downed map and advances countdowns once per simulation tick.
pub struct DownManager {
    entries: HashMap<EntityId, DownedEntry>,
    death_on_timeout: bool,
    index: Arc<StateIndex>,
}

impl DownManager {
    #[must_use]
    pub fn new(config: &RespiteConfig, index: Arc<StateIndex>) -> Self {
        Self {
            entries: HashMap::new(),
            death_on_timeout: config.downed.death_on_timeout,
            index,
        }
    }

    /// Puts a combatant into the downed state.
    ///
    /// Returns `false` (no mutation) if it is already downed. Otherwise
    /// fires `on_down` and starts the countdown at the combatant's full
    /// duration.
    pub fn down(&mut self, target: &Arc<dyn Downable>, aggressor: Aggressor) -> bool {
        let id = target.id();
        if self.entries.contains_key(&id) {
            debug!(entity = %id, "down rejected: already downed");
            return false;
        }

        target.on_down(&aggressor);
        let remaining_ticks = target.down_duration_ticks();
        self.entries.insert(
            id,
            DownedEntry {
                handle: Arc::clone(target),
                remaining_ticks,
                aggressor: aggressor.clone(),
            },
        );
        self.index.set_downed(id);

        info!(entity = %id, %aggressor, remaining_ticks, "combatant downed");
        counter!("respite_downs_total").increment(1);
        self.update_gauge();
        true
    }

    /// Takes a combatant out of the downed state alive.
    ///
    /// Returns `false` if it is not downed.
    pub fn revive(&mut self, id: EntityId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        entry.handle.on_revived();
        self.index.set_not_downed(id);

        info!(entity = %id, "combatant revived");
        counter!("respite_revives_total").increment(1);
        self.update_gauge();
        true
    }

    /// Resolves a downed combatant into death.
    ///
    /// Used for countdown timeout, explicit give-up, and damage sources
    /// that are permitted to be lethal while downed. Returns `false` if
    /// the combatant is not downed.
    pub fn kill(&mut self, id: EntityId, reason: &str) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        info!(entity = %id, reason, "downed combatant killed");
        entry.handle.on_death();
        self.index.set_not_downed(id);

        counter!("respite_deaths_total").increment(1);
        self.update_gauge();
        true
    }

    /// Clears the downed state because death happened through an external
    /// path (some other system already decided the combatant dies).
    ///
    /// Fires only `on_cancel_down` — never the death hook, and never
    /// re-enters `kill` or `revive` — so host death logic cannot
    /// double-fire.
    pub fn on_external_death(&mut self, id: EntityId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        debug!(entity = %id, "downed state cleared by external death");
        entry.handle.on_cancel_down();
        self.index.set_not_downed(id);
        self.update_gauge();
        true
    }

    /// Drops the entry without firing any hook.
    ///
    /// Disconnect path only: the outcome has already been persisted and the
    /// handle is about to be destroyed.
    pub fn discard(&mut self, id: EntityId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            debug!(entity = %id, "downed entry discarded");
            self.index.set_not_downed(id);
            self.update_gauge();
        }
        removed
    }

    /// Overrides the remaining countdown, bypassing the full-duration
    /// reset. Restore-after-reconnect path.
    pub fn set_remaining_ticks(&mut self, id: EntityId, ticks: u32) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        debug!(entity = %id, ticks, "countdown overridden");
        entry.remaining_ticks = ticks;
        true
    }

    /// Advances every countdown by one tick.
    ///
    /// Entities with an active revive attempt are skipped entirely, which
    /// is what freezes their countdown — no locking involved. At zero the
    /// timeout policy fires: death when `death_on_timeout`, auto-revive
    /// otherwise.
    pub fn tick(&mut self, revive: &ReviveManager) {
        if self.entries.is_empty() {
            return;
        }

        let ids: Vec<EntityId> = self.entries.keys().copied().collect();
        for id in ids {
            if revive.is_being_revived(id) {
                continue;
            }
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };

            let handle = Arc::clone(&entry.handle);
            entry.remaining_ticks = entry.remaining_ticks.saturating_sub(1);
            let expired = entry.remaining_ticks == 0;

            // Per-entity bookkeeping hook (give-up counters and the like)
            handle.on_tick();

            if expired {
                if self.death_on_timeout {
                    self.kill(id, "countdown expired");
                    counter!("respite_timeouts_total").increment(1);
                } else {
                    self.revive(id);
                }
            }
        }
    }

    /// Whether the combatant is currently downed.
    #[must_use]
    pub fn is_downed(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Remaining countdown in ticks, 0 if not downed.
    #[must_use]
    pub fn time_remaining_ticks(&self, id: EntityId) -> u32 {
        self.entries.get(&id).map_or(0, |e| e.remaining_ticks)
    }

    /// Progress of the countdown in `[0, 1]`: 0 just downed, 1 at expiry.
    /// Returns 0 for a combatant that is not downed.
    #[must_use]
    pub fn progress(&self, id: EntityId) -> f64 {
        self.entries.get(&id).map_or(0.0, |e| {
            let duration = f64::from(e.handle.down_duration_ticks());
            if duration <= 0.0 {
                return 0.0;
            }
            (1.0 - f64::from(e.remaining_ticks) / duration).clamp(0.0, 1.0)
        })
    }

    /// Aggressor credited for a downed combatant.
    #[must_use]
    pub fn aggressor_of(&self, id: EntityId) -> Option<&Aggressor> {
        self.entries.get(&id).map(DownedEntry::aggressor)
    }

    /// Entry for a downed combatant.
    #[must_use]
    pub fn entry(&self, id: EntityId) -> Option<&DownedEntry> {
        self.entries.get(&id)
    }

    /// Ids of all downed combatants.
    #[must_use]
    pub fn downed_ids(&self) -> Vec<EntityId> {
        self.entries.keys().copied().collect()
    }

    /// Number of downed combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn update_gauge(&self) {
        #[allow(clippy::cast_precision_loss)]
        gauge!("respite_downed_current").set(self.entries.len() as f64);
    }
}
