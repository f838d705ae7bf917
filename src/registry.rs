//! Connected-combatant registry.
//!
//! One [`CombatantHandle`] is allocated per connection and lives exactly as
//! long as it. The handle is the concrete capability bundle: it implements
//! [`Downable`] and [`Reviver`] and exposes the aggressor identity facet,
//! so the managers, the damage gate, and the host all share the same
//! allocation instead of three wrapper objects.
//!
//! Hook state lives behind atomics and a mutex because managers hold the
//! handle as `Arc<dyn Downable>` / `Arc<dyn Reviver>` and hooks take
//! `&self`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::debug;

use crate::config::RespiteConfig;
use crate::entity::{Aggressor, Downable, EntityId, Reviver};

/// Capability bundle for one connected combatant.
pub struct CombatantHandle {
    id: EntityId,
    name: String,
    down_duration_ticks: u32,
    revive_duration_ticks: u32,
    give_up_after_ticks: u32,

    /// Life flags mirrored from lifecycle hooks so handle-local predicates
    /// need no manager access.
    downed: AtomicBool,
    dead: AtomicBool,
    reviving: AtomicBool,
    aggressor: Mutex<Option<Aggressor>>,

    /// Give-up input: the host reports whether the gesture is held; the
    /// per-tick hook counts held ticks while downed.
    give_up_held: AtomicBool,
    give_up_ticks: AtomicU32,
}

impl CombatantHandle {
    /// Creates a handle with durations resolved from configuration.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, config: &RespiteConfig) -> Self {
        Self {
            id,
            name: name.into(),
            down_duration_ticks: config.down_duration_ticks(),
            revive_duration_ticks: config.revive_duration_ticks(),
            give_up_after_ticks: config.downed.give_up_ticks,
            downed: AtomicBool::new(false),
            dead: AtomicBool::new(false),
            reviving: AtomicBool::new(false),
            aggressor: Mutex::new(None),
            give_up_held: AtomicBool::new(false),
            give_up_ticks: AtomicU32::new(0),
        }
    }

    /// Aggressor identity facet: how this combatant is credited when it
    /// downs someone else.
    #[must_use]
    pub fn as_aggressor(&self) -> Aggressor {
        Aggressor::Combatant(self.id)
    }

    /// The aggressor credited with downing this combatant, while downed.
    #[must_use]
    pub fn aggressor(&self) -> Option<Aggressor> {
        self.lock_aggressor().clone()
    }

    /// Whether this combatant currently has an active revive attempt.
    #[must_use]
    pub fn is_reviving_someone(&self) -> bool {
        self.reviving.load(Ordering::SeqCst)
    }

    /// Reports whether the give-up gesture is currently held. Host input
    /// collaborator calls this; the countdown is advanced by `on_tick`.
    pub fn set_give_up_held(&self, held: bool) {
        self.give_up_held.store(held, Ordering::SeqCst);
        if !held {
            self.give_up_ticks.store(0, Ordering::SeqCst);
        }
    }

    /// Whether the give-up gesture has been held long enough to count as
    /// an explicit request to die.
    #[must_use]
    pub fn give_up_ready(&self) -> bool {
        self.give_up_after_ticks > 0
            && self.give_up_ticks.load(Ordering::SeqCst) >= self.give_up_after_ticks
    }

    /// Clears the dead flag once the host's respawn flow has produced a
    /// fresh life.
    pub fn respawn(&self) {
        self.dead.store(false, Ordering::SeqCst);
    }

    fn lock_aggressor(&self) -> std::sync::MutexGuard<'_, Option<Aggressor>> {
        self.aggressor
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn clear_down_state(&self) {
        self.downed.store(false, Ordering::SeqCst);
        self.give_up_held.store(false, Ordering::SeqCst);
        self.give_up_ticks.store(0, Ordering::SeqCst);
    }
}

impl Downable for CombatantHandle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn is_downed(&self) -> bool {
        self.downed.load(Ordering::SeqCst)
    }

    fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    fn down_duration_ticks(&self) -> u32 {
        self.down_duration_ticks
    }

    fn on_down(&self, aggressor: &Aggressor) {
        debug!(entity = %self.id, name = %self.name, %aggressor, "went down");
        *self.lock_aggressor() = Some(aggressor.clone());
        self.downed.store(true, Ordering::SeqCst);
        self.give_up_ticks.store(0, Ordering::SeqCst);
    }

    fn on_death(&self) {
        debug!(entity = %self.id, name = %self.name, "died while downed");
        self.clear_down_state();
        self.dead.store(true, Ordering::SeqCst);
    }

    fn on_revived(&self) {
        debug!(entity = %self.id, name = %self.name, "revived");
        self.clear_down_state();
        *self.lock_aggressor() = None;
    }

    fn on_cancel_down(&self) {
        debug!(entity = %self.id, name = %self.name, "downed state cancelled");
        self.clear_down_state();
        *self.lock_aggressor() = None;
    }

    fn can_be_revived_by(&self, _reviver: &dyn Reviver) -> bool {
        self.is_downed() && !self.is_dead()
    }

    fn can_die(&self) -> bool {
        !self.is_dead()
    }

    fn on_tick(&self) {
        if self.give_up_held.load(Ordering::SeqCst) {
            self.give_up_ticks.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Reviver for CombatantHandle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn can_revive(&self, target: &dyn Downable) -> bool {
        // Spatial checks (range, stance) belong to the host's input
        // collaborator, which decides when to call start at all.
        self.is_alive()
            && !self.is_reviving_someone()
            && target.id() != self.id
            && target.can_be_revived_by(self)
    }

    fn revive_duration_ticks(&self) -> u32 {
        self.revive_duration_ticks
    }

    fn on_start_revive(&self, target: &dyn Downable) {
        debug!(
            entity = %self.id,
            target = %target.id(),
            "started reviving"
        );
        self.reviving.store(true, Ordering::SeqCst);
    }

    fn on_cancel_revive(&self) {
        debug!(entity = %self.id, "revive attempt cancelled");
        self.reviving.store(false, Ordering::SeqCst);
    }

    fn on_finish_revive(&self) {
        debug!(entity = %self.id, "revive attempt finished");
        self.reviving.store(false, Ordering::SeqCst);
    }
}

/// Registry of connected combatants, keyed by entity id.
///
/// Created on connect, destroyed on disconnect; a side table from stable
/// id to handle so no map ever keys on object identity.
#[derive(Default)]
pub struct EntityRegistry {
    handles: DashMap<EntityId, Arc<CombatantHandle>>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a handle for a newly connected combatant.
    ///
    /// A stale handle under the same id (host reused an id without a
    /// disconnect) is replaced.
    pub fn add(
        &self,
        id: EntityId,
        name: impl Into<String>,
        config: &RespiteConfig,
    ) -> Arc<CombatantHandle> {
        let handle = Arc::new(CombatantHandle::new(id, name, config));
        if self.handles.insert(id, Arc::clone(&handle)).is_some() {
            debug!(entity = %id, "replaced stale combatant handle");
        }
        handle
    }

    /// Removes and returns the handle for a disconnecting combatant.
    pub fn remove(&self, id: EntityId) -> Option<Arc<CombatantHandle>> {
        self.handles.remove(&id).map(|(_, handle)| handle)
    }

    /// Handle for a connected combatant.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Arc<CombatantHandle>> {
        self.handles.get(&id).map(|h| Arc::clone(&h))
    }

    /// Whether the id is currently connected.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Number of connected combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Ids of all connected combatants.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.handles.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Aggressor;

    fn handle(id: u64) -> CombatantHandle {
        CombatantHandle::new(EntityId(id), format!("combatant-{id}"), &RespiteConfig::default())
    }

    #[test]
    fn test_fresh_handle_is_alive() {
        let h = handle(1);
        assert!(h.is_alive());
        assert!(!h.is_downed());
        assert!(!h.is_dead());
        assert_eq!(h.aggressor(), None);
    }

    #[test]
    fn test_down_hook_mirrors_state() {
        let h = handle(1);
        h.on_down(&Aggressor::Environment("fall".to_string()));
        assert!(h.is_downed());
        assert!(!h.is_alive());
        assert_eq!(
            h.aggressor(),
            Some(Aggressor::Environment("fall".to_string()))
        );
    }

    #[test]
    fn test_death_and_respawn() {
        let h = handle(1);
        h.on_down(&Aggressor::Combatant(EntityId(2)));
        h.on_death();
        assert!(h.is_dead());
        assert!(!h.is_downed());
        h.respawn();
        assert!(h.is_alive());
    }

    #[test]
    fn test_revived_clears_aggressor() {
        let h = handle(1);
        h.on_down(&Aggressor::Combatant(EntityId(2)));
        h.on_revived();
        assert!(h.is_alive());
        assert_eq!(h.aggressor(), None);
    }

    #[test]
    fn test_give_up_requires_held_ticks() {
        let config = RespiteConfig::default(); // give_up_ticks = 80
        let h = CombatantHandle::new(EntityId(1), "c", &config);
        h.on_down(&Aggressor::Environment("test".to_string()));

        h.set_give_up_held(true);
        for _ in 0..79 {
            h.on_tick();
        }
        assert!(!h.give_up_ready());
        h.on_tick();
        assert!(h.give_up_ready());

        // Releasing the gesture resets the countdown
        h.set_give_up_held(false);
        assert!(!h.give_up_ready());
    }

    #[test]
    fn test_cannot_revive_self() {
        let h = handle(1);
        h.on_down(&Aggressor::Environment("fall".to_string()));
        assert!(!h.can_revive(&h));
    }

    #[test]
    fn test_downed_reviver_cannot_revive() {
        let r = handle(1);
        let t = handle(2);
        t.on_down(&Aggressor::Environment("fall".to_string()));
        assert!(r.can_revive(&t));

        r.on_down(&Aggressor::Environment("fall".to_string()));
        assert!(!r.can_revive(&t));
    }

    #[test]
    fn test_registry_add_get_remove() {
        let config = RespiteConfig::default();
        let registry = EntityRegistry::new();
        let h = registry.add(EntityId(1), "alice", &config);
        assert!(registry.contains(EntityId(1)));
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&h, &registry.get(EntityId(1)).unwrap()));

        let removed = registry.remove(EntityId(1)).unwrap();
        assert!(Arc::ptr_eq(&h, &removed));
        assert!(registry.is_empty());
        assert!(registry.get(EntityId(1)).is_none());
    }

    #[test]
    fn test_registry_replaces_stale_handle() {
        let config = RespiteConfig::default();
        let registry = EntityRegistry::new();
        let first = registry.add(EntityId(1), "alice", &config);
        let second = registry.add(EntityId(1), "alice", &config);
        assert_eq!(registry.len(), 1);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &registry.get(EntityId(1)).unwrap()));
    }
}
