//! Shared integration-test harness: a hook-counting combatant so tests can
//! assert exactly which lifecycle hooks fired and how often.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use respite::config::RespiteConfig;
use respite::entity::{Aggressor, Downable, EntityId, Reviver};

/// Counting combatant implementing both capability traits.
///
/// Every hook increments its counter; state flags mirror the hooks the
/// same way a host implementation would.
pub struct CountingCombatant {
    id: EntityId,
    down_duration_ticks: u32,
    revive_duration_ticks: u32,

    downed: AtomicBool,
    dead: AtomicBool,
    reviving: AtomicBool,

    pub downs: AtomicU32,
    pub deaths: AtomicU32,
    pub revives: AtomicU32,
    pub cancels: AtomicU32,
    pub ticks: AtomicU32,
    pub revive_starts: AtomicU32,
    pub revive_cancels: AtomicU32,
    pub revive_finishes: AtomicU32,
}

impl CountingCombatant {
    pub fn new(id: u64, config: &RespiteConfig) -> Arc<Self> {
        Arc::new(Self {
            id: EntityId(id),
            down_duration_ticks: config.down_duration_ticks(),
            revive_duration_ticks: config.revive_duration_ticks(),
            downed: AtomicBool::new(false),
            dead: AtomicBool::new(false),
            reviving: AtomicBool::new(false),
            downs: AtomicU32::new(0),
            deaths: AtomicU32::new(0),
            revives: AtomicU32::new(0),
            cancels: AtomicU32::new(0),
            ticks: AtomicU32::new(0),
            revive_starts: AtomicU32::new(0),
            revive_cancels: AtomicU32::new(0),
            revive_finishes: AtomicU32::new(0),
        })
    }

    pub fn down_count(&self) -> u32 {
        self.downs.load(Ordering::SeqCst)
    }

    pub fn death_count(&self) -> u32 {
        self.deaths.load(Ordering::SeqCst)
    }

    pub fn revive_count(&self) -> u32 {
        self.revives.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn as_downable(self: &Arc<Self>) -> Arc<dyn Downable> {
        Arc::clone(self) as Arc<dyn Downable>
    }

    pub fn as_reviver(self: &Arc<Self>) -> Arc<dyn Reviver> {
        Arc::clone(self) as Arc<dyn Reviver>
    }
}

impl Downable for CountingCombatant {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        format!("counting-{}", self.id)
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

    fn on_down(&self, _aggressor: &Aggressor) {
        self.downs.fetch_add(1, Ordering::SeqCst);
        self.downed.store(true, Ordering::SeqCst);
    }

    fn on_death(&self) {
        self.deaths.fetch_add(1, Ordering::SeqCst);
        self.downed.store(false, Ordering::SeqCst);
        self.dead.store(true, Ordering::SeqCst);
    }

    fn on_revived(&self) {
        self.revives.fetch_add(1, Ordering::SeqCst);
        self.downed.store(false, Ordering::SeqCst);
    }

    fn on_cancel_down(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.downed.store(false, Ordering::SeqCst);
    }

    fn can_be_revived_by(&self, _reviver: &dyn Reviver) -> bool {
        self.is_downed() && !self.is_dead()
    }

    fn can_die(&self) -> bool {
        !self.is_dead()
    }

    fn on_tick(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
    }
}

impl Reviver for CountingCombatant {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> String {
        format!("counting-{}", self.id)
    }

    fn can_revive(&self, target: &dyn Downable) -> bool {
        self.is_alive()
            && !self.reviving.load(Ordering::SeqCst)
            && target.id() != self.id
            && target.can_be_revived_by(self)
    }

    fn revive_duration_ticks(&self) -> u32 {
        self.revive_duration_ticks
    }

    fn on_start_revive(&self, _target: &dyn Downable) {
        self.revive_starts.fetch_add(1, Ordering::SeqCst);
        self.reviving.store(true, Ordering::SeqCst);
    }

    fn on_cancel_revive(&self) {
        self.revive_cancels.fetch_add(1, Ordering::SeqCst);
        self.reviving.store(false, Ordering::SeqCst);
    }

    fn on_finish_revive(&self) {
        self.revive_finishes.fetch_add(1, Ordering::SeqCst);
        self.reviving.store(false, Ordering::SeqCst);
    }
}

/// One-tick-per-second config so test durations read directly in ticks.
pub fn tick_config(downed_secs: u32, revive_secs: u32) -> RespiteConfig {
    let mut config = RespiteConfig::default();
    config.sim.ticks_per_second = 1;
    config.downed.timer_seconds = downed_secs;
    config.revive.timer_seconds = revive_secs;
    config
}
