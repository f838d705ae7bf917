//! Revive manager: authoritative owner of active revive attempts.
//!
//! Exclusivity is structural: a per-reviver map plus a target index make
//! "one attempt per reviver" and "one primary attempt per target" hold by
//! construction. Completion is the single path back into the down manager
//! (`finish` → [`DownManager::revive`]), keeping the dependency one-way.
//!
//! Multi-reviver acceleration is a policy knob, not a structural feature:
//! in [`MultiReviverMode::Speedup`] later revivers attach as *assists* that
//! scale the primary attempt's per-tick advance; in the default
//! [`MultiReviverMode::FirstOnly`] they are rejected outright.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use tracing::{debug, info};

use crate::config::{MultiReviverMode, RespiteConfig};
use crate::down::DownManager;
use crate::entity::{Downable, EntityId, Reviver};

/// One active primary revive attempt.
struct ReviveAttempt {
    reviver: Arc<dyn Reviver>,
    target: Arc<dyn Downable>,
    elapsed: f64,
    required: f64,
}

/// A secondary reviver accelerating an existing attempt (`Speedup` only).
struct Assist {
    reviver: Arc<dyn Reviver>,
    target_id: EntityId,
}

/// Owns revive attempts and advances them once per simulation tick.
pub struct ReviveManager {
    /// Primary attempts, keyed by reviver id.
    attempts: HashMap<EntityId, ReviveAttempt>,
    /// Target id -> primary reviver id.
    by_target: HashMap<EntityId, EntityId>,
    /// Assists, keyed by assisting reviver id.
    assists: HashMap<EntityId, Assist>,
    mode: MultiReviverMode,
    speedup_per_reviver: f64,
    heal_percent: f32,
}

impl ReviveManager {
    #[must_use]
    pub fn new(config: &RespiteConfig) -> Self {
        Self {
            attempts: HashMap::new(),
            by_target: HashMap::new(),
            assists: HashMap::new(),
            mode: config.revive.multi_reviver,
            speedup_per_reviver: config.revive.speedup_per_reviver.max(0.0),
            heal_percent: config.revive.heal_percent,
        }
    }

    /// Fraction of max health a freshly revived combatant comes back with.
    ///
    /// The managers track no health; the host's combat collaborator reads
    /// this when it handles `on_revived` / `on_finish_revive`.
    #[must_use]
    pub const fn heal_percent(&self) -> f32 {
        self.heal_percent
    }

    /// Starts a revive attempt.
    ///
    /// Fails if the reviver already has an attempt or assist running, if
    /// the reviver's own eligibility check rejects the target, or if the
    /// target already has a primary reviver and the policy is `FirstOnly`.
    /// With `Speedup`, a busy target gains an assist instead.
    pub fn start(&mut self, reviver: &Arc<dyn Reviver>, target: &Arc<dyn Downable>) -> bool {
        let reviver_id = reviver.id();
        let target_id = target.id();

        if self.attempts.contains_key(&reviver_id) || self.assists.contains_key(&reviver_id) {
            debug!(reviver = %reviver_id, "start rejected: reviver busy");
            return false;
        }
        if !reviver.can_revive(&**target) {
            debug!(reviver = %reviver_id, target = %target_id, "start rejected: not eligible");
            return false;
        }

        if self.by_target.contains_key(&target_id) {
            match self.mode {
                MultiReviverMode::FirstOnly => {
                    debug!(target = %target_id, "start rejected: already being revived");
                    return false;
                }
                MultiReviverMode::Speedup => {
                    self.assists.insert(
                        reviver_id,
                        Assist {
                            reviver: Arc::clone(reviver),
                            target_id,
                        },
                    );
                    reviver.on_start_revive(&**target);
                    info!(reviver = %reviver_id, target = %target_id, "revive assist joined");
                    counter!("respite_revive_assists_total").increment(1);
                    return true;
                }
            }
        }

        self.attempts.insert(
            reviver_id,
            ReviveAttempt {
                reviver: Arc::clone(reviver),
                target: Arc::clone(target),
                elapsed: 0.0,
                required: f64::from(reviver.revive_duration_ticks()),
            },
        );
        self.by_target.insert(target_id, reviver_id);
        reviver.on_start_revive(&**target);

        info!(reviver = %reviver_id, target = %target_id, "revive attempt started");
        counter!("respite_revive_attempts_total").increment(1);
        self.update_gauge();
        true
    }

    /// Cancels a reviver's attempt or assist.
    ///
    /// Cancelling a primary attempt promotes one of its assists (if any)
    /// so an in-progress group revive survives the first reviver walking
    /// away. Returns `false` if the reviver has nothing active.
    pub fn cancel(&mut self, reviver_id: EntityId) -> bool {
        if let Some(attempt) = self.attempts.remove(&reviver_id) {
            let target_id = attempt.target.id();
            self.by_target.remove(&target_id);
            attempt.reviver.on_cancel_revive();
            self.promote_assist(target_id, &attempt);

            info!(reviver = %reviver_id, target = %target_id, "revive attempt cancelled");
            counter!("respite_revive_cancels_total").increment(1);
            self.update_gauge();
            return true;
        }

        if let Some(assist) = self.assists.remove(&reviver_id) {
            assist.reviver.on_cancel_revive();
            debug!(reviver = %reviver_id, target = %assist.target_id, "revive assist left");
            return true;
        }

        false
    }

    /// Completes a primary attempt: clears it (and its assists), hands the
    /// target back to the down manager, and fires the finish hooks.
    ///
    /// This is the only path by which a successful revive propagates into
    /// [`DownManager::revive`], which fires the target's revived hook
    /// exactly once. Returns `false` if the reviver has no primary attempt.
    pub fn finish(&mut self, reviver_id: EntityId, down: &mut DownManager) -> bool {
        let Some(attempt) = self.attempts.remove(&reviver_id) else {
            return false;
        };
        let target_id = attempt.target.id();
        self.by_target.remove(&target_id);

        let assist_ids: Vec<EntityId> = self
            .assists
            .iter()
            .filter(|(_, a)| a.target_id == target_id)
            .map(|(id, _)| *id)
            .collect();
        for id in assist_ids {
            if let Some(assist) = self.assists.remove(&id) {
                assist.reviver.on_finish_revive();
            }
        }

        down.revive(target_id);
        attempt.reviver.on_finish_revive();

        info!(
            reviver = %reviver_id,
            target = %target_id,
            heal_percent = self.heal_percent,
            "revive completed"
        );
        counter!("respite_revive_completions_total").increment(1);
        self.update_gauge();
        true
    }

    /// Advances every active attempt by one tick.
    ///
    /// With `Speedup`, each assist adds `speedup_per_reviver` to the
    /// attempt's per-tick rate. Attempts reaching their required duration
    /// finish within the same tick.
    pub fn tick(&mut self, down: &mut DownManager) {
        if self.attempts.is_empty() {
            return;
        }

        let reviver_ids: Vec<EntityId> = self.attempts.keys().copied().collect();
        for reviver_id in reviver_ids {
            let Some(attempt) = self.attempts.get_mut(&reviver_id) else {
                continue;
            };
            let target_id = attempt.target.id();

            let rate = match self.mode {
                MultiReviverMode::FirstOnly => 1.0,
                MultiReviverMode::Speedup => {
                    let assists = self
                        .assists
                        .values()
                        .filter(|a| a.target_id == target_id)
                        .count();
                    #[allow(clippy::cast_precision_loss)]
                    {
                        1.0 + assists as f64 * self.speedup_per_reviver
                    }
                }
            };

            attempt.elapsed += rate;
            if attempt.elapsed >= attempt.required {
                self.finish(reviver_id, down);
            }
        }
    }

    /// Progress of a reviver's attempt in `[0, 1]`.
    ///
    /// Assists report the progress of the attempt they accelerate. A
    /// non-positive required duration reads as 0 (guards divide-by-zero).
    #[must_use]
    pub fn progress(&self, reviver_id: EntityId) -> f64 {
        if let Some(attempt) = self.attempts.get(&reviver_id) {
            if attempt.required <= 0.0 {
                return 0.0;
            }
            return (attempt.elapsed / attempt.required).clamp(0.0, 1.0);
        }
        self.assists
            .get(&reviver_id)
            .and_then(|a| self.by_target.get(&a.target_id))
            .map_or(0.0, |primary| self.progress(*primary))
    }

    /// Whether the reviver has an active attempt or assist.
    #[must_use]
    pub fn is_reviving(&self, reviver_id: EntityId) -> bool {
        self.attempts.contains_key(&reviver_id) || self.assists.contains_key(&reviver_id)
    }

    /// Whether the target has an active primary attempt against it.
    #[must_use]
    pub fn is_being_revived(&self, target_id: EntityId) -> bool {
        self.by_target.contains_key(&target_id)
    }

    /// Primary reviver of a target.
    #[must_use]
    pub fn reviver_of(&self, target_id: EntityId) -> Option<EntityId> {
        self.by_target.get(&target_id).copied()
    }

    /// Target of a reviver's attempt or assist.
    #[must_use]
    pub fn target_of(&self, reviver_id: EntityId) -> Option<EntityId> {
        if let Some(attempt) = self.attempts.get(&reviver_id) {
            return Some(attempt.target.id());
        }
        self.assists.get(&reviver_id).map(|a| a.target_id)
    }

    /// Number of revivers (primary and assisting) working on a target.
    #[must_use]
    pub fn reviver_count(&self, target_id: EntityId) -> usize {
        let primary = usize::from(self.by_target.contains_key(&target_id));
        primary
            + self
                .assists
                .values()
                .filter(|a| a.target_id == target_id)
                .count()
    }

    /// Cancels every attempt and assist the entity is involved in, as
    /// reviver or as target. Disconnect path.
    pub fn cancel_involving(&mut self, id: EntityId) {
        // As a reviver (primary or assist)
        self.cancel(id);

        // As a target: cancel the primary (promotion would re-target the
        // leaving entity, so drain assists first)
        let assist_ids: Vec<EntityId> = self
            .assists
            .iter()
            .filter(|(_, a)| a.target_id == id)
            .map(|(rid, _)| *rid)
            .collect();
        for rid in assist_ids {
            self.cancel(rid);
        }
        if let Some(primary) = self.by_target.get(&id).copied() {
            self.cancel(primary);
        }
    }

    /// Number of active primary attempts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Moves an assist up to be the primary attempt, carrying the elapsed
    /// progress of the attempt it was accelerating.
    fn promote_assist(&mut self, target_id: EntityId, cancelled: &ReviveAttempt) {
        let Some(next_id) = self
            .assists
            .iter()
            .find(|(_, a)| a.target_id == target_id)
            .map(|(id, _)| *id)
        else {
            return;
        };
        let Some(assist) = self.assists.remove(&next_id) else {
            return;
        };
        debug!(reviver = %next_id, target = %target_id, "assist promoted to primary");
        self.attempts.insert(
            next_id,
            ReviveAttempt {
                reviver: assist.reviver,
                target: Arc::clone(&cancelled.target),
                elapsed: cancelled.elapsed,
                required: cancelled.required,
            },
        );
        self.by_target.insert(target_id, next_id);
    }

    fn update_gauge(&self) {
        #[allow(clippy::cast_precision_loss)]
        gauge!("respite_revive_attempts_current").set(self.attempts.len() as f64);
    }
}
