//! Lethal-damage gate.
//!
//! The combat collaborator owns damage computation; this module only makes
//! the two decisions the downed lifecycle cares about:
//!
//! 1. Damage that would kill a healthy combatant is redirected into the
//!    downed state instead, capped so health lands at the configured floor.
//! 2. While downed, each damage source is allowed through (scaled) or
//!    absorbed according to per-source rules, so e.g. player finishers work
//!    while environmental chip damage does not.
//!
//! [`DamageGate::assess`] is a pure function over the rules; it mutates
//! nothing and the caller applies the verdict.

use serde::{Deserialize, Serialize};

/// Classification of a damage source, as coarse as the gate needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    /// Another player.
    Player,
    /// An AI-controlled creature.
    Mob,
    /// Ambient environment (fall, drowning, fire ticks, ...).
    Environment,
    /// Standing hazards (lava, void). Allowed through by default so a
    /// downed combatant cannot be left permanently stuck inside one.
    Hazard,
}

/// Rule for one damage source against downed combatants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DamageRule {
    /// Whether this source reaches downed combatants at all.
    pub enabled: bool,
    /// Multiplier applied when it does.
    pub multiplier: f64,
}

impl Default for DamageRule {
    fn default() -> Self {
        Self {
            enabled: false,
            multiplier: 0.6,
        }
    }
}

impl DamageRule {
    #[must_use]
    const fn allowing(multiplier: f64) -> Self {
        Self {
            enabled: true,
            multiplier,
        }
    }
}

/// Per-source rules for damage against downed combatants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DamageRules {
    pub player: DamageRule,
    pub mob: DamageRule,
    pub environment: DamageRule,
    pub hazard: DamageRule,
}

impl Default for DamageRules {
    fn default() -> Self {
        Self {
            player: DamageRule::allowing(0.6),
            mob: DamageRule::allowing(0.6),
            environment: DamageRule::default(),
            hazard: DamageRule::allowing(1.0),
        }
    }
}

impl DamageRules {
    /// Rule for the given source.
    #[must_use]
    pub const fn rule(&self, source: DamageSource) -> DamageRule {
        match source {
            DamageSource::Player => self.player,
            DamageSource::Mob => self.mob,
            DamageSource::Environment => self.environment,
            DamageSource::Hazard => self.hazard,
        }
    }
}

/// What the combat collaborator should do with one damage event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageVerdict {
    /// Apply the damage unchanged; the target stays healthy.
    PassThrough,
    /// The damage would have been lethal: put the target into the downed
    /// state and apply only `capped` so health lands at the floor.
    DownInstead {
        /// Damage amount that brings health exactly to the floor.
        capped: f64,
    },
    /// Target is downed and this source is allowed: apply `scaled`
    /// (which may reach zero health, at which point the caller kills).
    Allow {
        /// Damage after the per-source multiplier.
        scaled: f64,
    },
    /// Target is downed and this source is denied: apply nothing.
    Absorb,
}

/// Stateless decision function over the configured rules.
#[derive(Debug, Clone)]
pub struct DamageGate {
    rules: DamageRules,
    /// Fraction of max health a combatant lands at when downed.
    floor_percent: f64,
}

impl DamageGate {
    #[must_use]
    pub fn new(rules: DamageRules, floor_percent: f32) -> Self {
        Self {
            rules,
            floor_percent: f64::from(floor_percent).clamp(0.0, 1.0),
        }
    }

    /// Decides what to do with a damage event.
    ///
    /// `health`/`max_health` describe the target before the damage lands.
    #[must_use]
    pub fn assess(
        &self,
        is_downed: bool,
        health: f64,
        max_health: f64,
        amount: f64,
        source: DamageSource,
    ) -> DamageVerdict {
        if is_downed {
            let rule = self.rules.rule(source);
            if rule.enabled {
                return DamageVerdict::Allow {
                    scaled: amount * rule.multiplier,
                };
            }
            return DamageVerdict::Absorb;
        }

        if health - amount > 0.0 {
            return DamageVerdict::PassThrough;
        }

        // Lethal: redirect into the downed state at the health floor.
        let floor = max_health * self.floor_percent;
        DamageVerdict::DownInstead {
            capped: (health - floor).max(0.0),
        }
    }
}
