//! Thread-safe read index of downed state.
//!
//! The authoritative maps in the down/revive managers are confined to the
//! simulation tick thread. Non-tick threads (packet filters, presentation)
//! still need to answer "is this combatant downed?" and resolve auxiliary
//! ids without stalling the simulation, so the tick thread mirrors the
//! relevant facts into this index.
//!
//! Writer discipline: only the tick thread writes. Every other thread is a
//! reader, and the query surface cannot fail — an unknown id reads as
//! not-downed / `None`.

use dashmap::{DashMap, DashSet};

use crate::entity::{EntityId, SurrogateId};

/// Concurrently readable mirror of downed membership and id mappings.
#[derive(Debug, Default)]
pub struct StateIndex {
    /// Entities currently downed.
    downed: DashSet<EntityId>,
    /// Entity id -> host network id.
    network_ids: DashMap<EntityId, u32>,
    /// Presentation-layer surrogate -> owning entity.
    surrogates: DashMap<SurrogateId, EntityId>,
}

impl StateIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an entity as downed. Tick thread only.
    pub fn set_downed(&self, id: EntityId) {
        self.downed.insert(id);
    }

    /// Marks an entity as not downed. Tick thread only.
    pub fn set_not_downed(&self, id: EntityId) {
        self.downed.remove(&id);
    }

    /// Whether the entity is downed. Safe from any thread.
    #[must_use]
    pub fn is_downed(&self, id: EntityId) -> bool {
        self.downed.contains(&id)
    }

    /// Number of downed entities. Safe from any thread.
    #[must_use]
    pub fn downed_count(&self) -> usize {
        self.downed.len()
    }

    /// Records the host network id for an entity. Tick thread only.
    pub fn set_network_id(&self, id: EntityId, network_id: u32) {
        self.network_ids.insert(id, network_id);
    }

    /// Host network id for an entity, if tracked. Safe from any thread.
    #[must_use]
    pub fn network_id(&self, id: EntityId) -> Option<u32> {
        self.network_ids.get(&id).map(|v| *v)
    }

    /// Registers a presentation surrogate for an owner. Tick thread only.
    pub fn register_surrogate(&self, surrogate: SurrogateId, owner: EntityId) {
        self.surrogates.insert(surrogate, owner);
    }

    /// Unregisters a surrogate. Tick thread only.
    pub fn unregister_surrogate(&self, surrogate: SurrogateId) {
        self.surrogates.remove(&surrogate);
    }

    /// Owner of a surrogate, if registered. Safe from any thread.
    #[must_use]
    pub fn owner_of(&self, surrogate: SurrogateId) -> Option<EntityId> {
        self.surrogates.get(&surrogate).map(|v| *v)
    }

    /// Whether the id names a registered surrogate. Safe from any thread.
    #[must_use]
    pub fn is_surrogate(&self, surrogate: SurrogateId) -> bool {
        self.surrogates.contains_key(&surrogate)
    }

    /// Clears every entry for an entity, including surrogates it owns.
    /// Called on disconnect, tick thread only.
    pub fn remove(&self, id: EntityId) {
        self.downed.remove(&id);
        self.network_ids.remove(&id);
        self.surrogates.retain(|_, owner| *owner != id);
    }
}
