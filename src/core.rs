//! The core context: explicit dependency wiring and connection lifecycle.
//!
//! [`RespiteCore`] owns every collaborator-facing piece — registry, both
//! managers, the state index, the damage gate, and the pending tracker —
//! and is handed to host collaborators at construction. Nothing in this
//! crate is reachable through ambient global state.
//!
//! The connect/disconnect/reconnect orchestration lives here because its
//! ordering matters: a disconnecting downed combatant must have its
//! outcome persisted *before* any authoritative state is dropped, and a
//! reconnecting one must have its pending action replayed *before* normal
//! setup.

use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::config::RespiteConfig;
use crate::damage::DamageGate;
use crate::down::DownManager;
use crate::entity::{Aggressor, DisconnectClass, Downable, EntityId, Location};
use crate::index::StateIndex;
use crate::pending::{FileMarkerStore, MarkerStore, PendingAction, PendingTracker};
use crate::registry::{CombatantHandle, EntityRegistry};
use crate::revive::ReviveManager;

/// What a reconnect replay did, reported to the lifecycle collaborator so
/// it can run the host side (respawn flow, teleport to location, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    /// Nothing was pending; normal connect.
    Nothing,
    /// The combatant logged out while downed: death was replayed and the
    /// host should run its respawn flow.
    Death,
    /// The downed state was restored with the exact persisted countdown.
    Restored {
        /// Ticks put back on the countdown.
        remaining_ticks: u32,
        /// Where the combatant went down, if it was recorded.
        location: Option<Location>,
    },
}

/// Dependency-injection context owning the whole downed/revive lifecycle.
pub struct RespiteCore {
    config: RespiteConfig,
    registry: EntityRegistry,
    down: DownManager,
    revive: ReviveManager,
    index: Arc<StateIndex>,
    gate: DamageGate,
    pending: PendingTracker,
}

impl RespiteCore {
    /// Builds a core from configuration and a marker store.
    #[must_use]
    pub fn new(config: RespiteConfig, store: Box<dyn MarkerStore>) -> Self {
        let index = Arc::new(StateIndex::new());
        let down = DownManager::new(&config, Arc::clone(&index));
        let revive = ReviveManager::new(&config);
        let gate = DamageGate::new(
            config.downed.allowed_damage.clone(),
            config.downed.health_floor_percent,
        );
        Self {
            registry: EntityRegistry::new(),
            down,
            revive,
            index,
            gate,
            pending: PendingTracker::new(store),
            config,
        }
    }

    /// Builds a core persisting markers as one file per entity under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker directory cannot be created.
    pub fn with_marker_dir(
        config: RespiteConfig,
        dir: impl AsRef<Path>,
    ) -> Result<Self, crate::error::StoreError> {
        let store = FileMarkerStore::open(dir.as_ref())?;
        Ok(Self::new(config, Box::new(store)))
    }

    /// Registers a connecting combatant and replays any pending action.
    ///
    /// The pending check runs before the handle is handed back, so by the
    /// time the host finishes its normal setup the replay has already
    /// happened.
    pub fn connect(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
    ) -> (Arc<CombatantHandle>, ReplayOutcome) {
        let handle = self.registry.add(id, name, &self.config);
        let outcome = self.replay_pending(id, &handle);
        (handle, outcome)
    }

    /// Deregisters a disconnecting combatant.
    ///
    /// If the combatant is downed, the outcome is persisted *first*:
    /// an intentional disconnect resolves to death on the next connect,
    /// anything else preserves the downed state with its exact remaining
    /// time and location. Only then are the authoritative entry, index
    /// entries, and registry handle dropped. Returns `false` for an
    /// unknown id.
    pub fn disconnect(
        &mut self,
        id: EntityId,
        class: DisconnectClass,
        location: Option<Location>,
    ) -> bool {
        if !self.registry.contains(id) {
            return false;
        }

        // Anyone reviving this combatant, or being revived by it, stops.
        self.revive.cancel_involving(id);

        if self.down.is_downed(id) {
            let remaining = self.down.time_remaining_ticks(id);
            let result = match class {
                DisconnectClass::Intentional => {
                    info!(entity = %id, "downed combatant logged out; death pending");
                    self.pending.mark_for_death(id)
                }
                DisconnectClass::Unknown => {
                    let seconds = self.remaining_seconds(remaining);
                    info!(
                        entity = %id,
                        seconds,
                        "downed combatant lost; downed state pending restore"
                    );
                    self.pending.mark_for_restore(id, seconds, location)
                }
            };
            if let Err(e) = result {
                // The combatant is leaving either way; a lost marker means
                // a clean next login rather than corrupted state.
                warn!(entity = %id, "failed to persist pending action: {e}");
            }
            self.down.discard(id);
        }

        self.index.remove(id);
        self.registry.remove(id);
        true
    }

    /// Advances the whole lifecycle by one simulation tick.
    ///
    /// Revive attempts first (completions hand targets back to the down
    /// manager within the same tick), then countdowns.
    pub fn tick(&mut self) {
        self.revive.tick(&mut self.down);
        self.down.tick(&self.revive);
    }

    /// Resolves a held give-up gesture into death, if it has been held
    /// long enough.
    pub fn give_up(&mut self, id: EntityId) -> bool {
        let Some(handle) = self.registry.get(id) else {
            return false;
        };
        if !self.down.is_downed(id) || !handle.give_up_ready() {
            return false;
        }
        self.down.kill(id, "gave up")
    }

    /// Simulation configuration.
    #[must_use]
    pub const fn config(&self) -> &RespiteConfig {
        &self.config
    }

    /// Connected-combatant registry.
    #[must_use]
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Down manager (authoritative downed map).
    #[must_use]
    pub const fn down(&self) -> &DownManager {
        &self.down
    }

    /// Down manager, mutable (tick thread only).
    pub fn down_mut(&mut self) -> &mut DownManager {
        &mut self.down
    }

    /// Revive manager (authoritative attempt map).
    #[must_use]
    pub const fn revive(&self) -> &ReviveManager {
        &self.revive
    }

    /// Both managers, mutably and simultaneously (tick thread only).
    /// Needed by collaborators that start attempts and finish them against
    /// the down manager.
    pub fn managers_mut(&mut self) -> (&mut DownManager, &mut ReviveManager) {
        (&mut self.down, &mut self.revive)
    }

    /// Shareable read index for non-tick threads.
    #[must_use]
    pub fn index(&self) -> Arc<StateIndex> {
        Arc::clone(&self.index)
    }

    /// Lethal-damage gate for the combat collaborator.
    #[must_use]
    pub const fn damage_gate(&self) -> &DamageGate {
        &self.gate
    }

    /// Pending-action tracker. Host collaborators should rarely need this
    /// directly; `connect`/`disconnect` drive it.
    #[must_use]
    pub const fn pending(&self) -> &PendingTracker {
        &self.pending
    }

    fn replay_pending(&mut self, id: EntityId, handle: &Arc<CombatantHandle>) -> ReplayOutcome {
        match self.pending.check_and_clear(id) {
            None => ReplayOutcome::Nothing,
            Some(PendingAction::ExecuteDeath) => {
                info!(entity = %id, "replaying pending death");
                handle.on_death();
                counter!("respite_pending_death_replays_total").increment(1);
                ReplayOutcome::Death
            }
            Some(PendingAction::RestoreDowned {
                remaining_seconds,
                location,
            }) => {
                // The marker is external input: an absurd seconds value must
                // not overflow, and never restores more than a full countdown.
                let full = self.config.down_duration_ticks().max(1);
                let remaining_ticks = remaining_seconds
                    .saturating_mul(self.config.sim.ticks_per_second)
                    .clamp(1, full);
                let downable: Arc<dyn Downable> = Arc::clone(handle) as Arc<dyn Downable>;
                self.down
                    .down(&downable, Aggressor::Environment("restored".to_string()));
                self.down.set_remaining_ticks(id, remaining_ticks);
                info!(entity = %id, remaining_ticks, "restored downed state");
                counter!("respite_pending_restore_replays_total").increment(1);
                ReplayOutcome::Restored {
                    remaining_ticks,
                    location,
                }
            }
        }
    }

    /// Converts a tick countdown to whole seconds, rounding up so a live
    /// countdown never persists as zero.
    fn remaining_seconds(&self, remaining_ticks: u32) -> u32 {
        let tps = self.config.sim.ticks_per_second.max(1);
        remaining_ticks.div_ceil(tps)
    }
}
