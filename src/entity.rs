//! Capability interfaces and identity types.
//!
//! The managers never see a concrete combatant type. They operate on the
//! [`Downable`] and [`Reviver`] traits and key every map by [`EntityId`],
//! a stable opaque id supplied by the host on connect. This keeps the state
//! machine independent of the host's entity/component machinery.

use std::fmt;

/// Stable opaque identifier for one combatant.
///
/// Assigned by the host when the connection is registered and used as the
/// key for every authoritative map, the state index, and the pending-action
/// store. Identity of capability objects is never used as a key.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a presentation-layer stand-in object (e.g. the visible
/// body left where a combatant went down), mapped back to its owner by the
/// state index.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SurrogateId(pub u64);

impl fmt::Display for SurrogateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The entity or cause credited with downing a combatant.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggressor {
    /// Another registered combatant.
    Combatant(EntityId),
    /// A non-combatant cause (fall, fire, "unknown", ...).
    Environment(String),
}

impl fmt::Display for Aggressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combatant(id) => write!(f, "combatant {id}"),
            Self::Environment(label) => write!(f, "environment ({label})"),
        }
    }
}

/// World position carried opaquely through persistence.
///
/// The core does no spatial math; this exists only so a restore can put a
/// combatant back where it went down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Coarse classification of a disconnect, supplied by the host's connection
/// lifecycle. The core does not need the host's full reason taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectClass {
    /// The combatant chose to leave; a downed state resolves to death.
    Intentional,
    /// Crash, timeout, unload — anything that might not be deliberate;
    /// a downed state is preserved for the next connect.
    Unknown,
}

/// A combatant that can be put into, and taken out of, the downed state.
///
/// Hooks take `&self`: implementations keep their mutable state behind
/// atomics or a mutex so the managers can hold shared references.
pub trait Downable: Send + Sync {
    /// Stable id of this combatant.
    fn id(&self) -> EntityId;

    /// Human-readable name for logs.
    fn display_name(&self) -> String;

    /// Whether this combatant is currently downed.
    fn is_downed(&self) -> bool;

    /// Whether this combatant is dead.
    fn is_dead(&self) -> bool;

    /// Whether this combatant is alive (not downed, not dead).
    fn is_alive(&self) -> bool {
        !self.is_downed() && !self.is_dead()
    }

    /// Full downed countdown for this combatant, in simulation ticks.
    fn down_duration_ticks(&self) -> u32;

    /// Called when the combatant transitions into the downed state.
    fn on_down(&self, aggressor: &Aggressor);

    /// Called when the downed countdown resolves into death.
    fn on_death(&self);

    /// Called when a revive completes (or timeout policy auto-revives).
    fn on_revived(&self);

    /// Called when the downed state is discarded without firing death or
    /// revive logic (external death, disconnect flush).
    fn on_cancel_down(&self);

    /// Eligibility predicate checked by the revive manager before an
    /// attempt starts. Range and similar spatial checks belong to the
    /// reviver side; this covers target-local conditions.
    fn can_be_revived_by(&self, reviver: &dyn Reviver) -> bool;

    /// Whether death is currently permitted for this combatant.
    fn can_die(&self) -> bool;

    /// Per-entity bookkeeping hook, called once per simulation tick while
    /// downed (and not being revived).
    fn on_tick(&self);
}

/// A combatant that can attempt to revive a [`Downable`].
pub trait Reviver: Send + Sync {
    /// Stable id of this combatant.
    fn id(&self) -> EntityId;

    /// Human-readable name for logs.
    fn display_name(&self) -> String;

    /// Eligibility check owned by the implementation (range, stance, ...).
    /// The revive manager additionally enforces attempt exclusivity.
    fn can_revive(&self, target: &dyn Downable) -> bool;

    /// Required attempt length in simulation ticks.
    fn revive_duration_ticks(&self) -> u32;

    /// Called when an attempt by this reviver starts.
    fn on_start_revive(&self, target: &dyn Downable);

    /// Called when this reviver's attempt is cancelled.
    fn on_cancel_revive(&self);

    /// Called when this reviver's attempt completes.
    fn on_finish_revive(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(17).to_string(), "17");
    }

    #[test]
    fn test_aggressor_display() {
        assert_eq!(
            Aggressor::Combatant(EntityId(3)).to_string(),
            "combatant 3"
        );
        assert_eq!(
            Aggressor::Environment("lava".to_string()).to_string(),
            "environment (lava)"
        );
    }

    #[test]
    fn test_location_display() {
        let loc = Location::new(1.0, 2.5, -3.0);
        assert_eq!(loc.to_string(), "(1, 2.5, -3)");
    }

    #[test]
    fn test_disconnect_class_eq() {
        assert_ne!(DisconnectClass::Intentional, DisconnectClass::Unknown);
    }
}
