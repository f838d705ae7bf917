//! Metric descriptions for the lifecycle managers.
//!
//! The managers emit counters and gauges through the `metrics` facade; the
//! host process decides which recorder (if any) to install. When no recorder
//! is present the macros are no-ops, so emission is always safe.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{describe_counter, describe_gauge};

/// Guard so descriptions are registered at most once per process.
static METRICS_DESCRIBED: AtomicBool = AtomicBool::new(false);

/// Registers descriptions for every metric this crate emits.
///
/// Call after installing a recorder. Safe to call more than once; repeat
/// calls are ignored.
pub fn describe_metrics() {
    if METRICS_DESCRIBED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already described, skipping");
        return;
    }
    describe_counter!(
        "respite_downs_total",
        "Total number of entities entering the downed state"
    );
    describe_counter!(
        "respite_revives_total",
        "Total number of downed entities restored to normal play"
    );
    describe_counter!(
        "respite_deaths_total",
        "Total number of downed entities that died"
    );
    describe_counter!(
        "respite_timeouts_total",
        "Total number of downed timers that expired"
    );
    describe_counter!(
        "respite_revive_attempts_total",
        "Total number of revive attempts started"
    );
    describe_counter!(
        "respite_revive_assists_total",
        "Total number of assist revivers joining an in-progress attempt"
    );
    describe_counter!(
        "respite_revive_cancels_total",
        "Total number of revive attempts cancelled before completion"
    );
    describe_counter!(
        "respite_revive_completions_total",
        "Total number of revive attempts that ran to completion"
    );
    describe_counter!(
        "respite_pending_death_replays_total",
        "Deferred deaths executed when the entity reconnected"
    );
    describe_counter!(
        "respite_pending_restore_replays_total",
        "Downed states restored when the entity reconnected"
    );
    describe_gauge!(
        "respite_downed_current",
        "Number of entities currently downed"
    );
    describe_gauge!(
        "respite_revive_attempts_current",
        "Number of revive attempts currently in progress"
    );
}
