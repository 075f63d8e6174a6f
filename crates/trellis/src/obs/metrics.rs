use std::cell::RefCell;

///
/// OpCounters
///
/// Process-local operation counters. Saturating adds; counters never
/// wrap.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OpCounters {
    pub query_calls: u64,
    pub rows_scanned: u64,
    pub rows_hydrated: u64,
    pub plan_ids: u64,
    pub plan_relation: u64,
    pub plan_structure: u64,
    pub plan_full_scan: u64,
}

thread_local! {
    static STATE: RefCell<OpCounters> = RefCell::new(OpCounters::default());
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut OpCounters) -> R) -> R {
    STATE.with_borrow_mut(f)
}

/// Snapshot the current counters for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> OpCounters {
    STATE.with_borrow(|state| *state)
}

/// Reset all counters.
pub fn metrics_reset_all() {
    STATE.with_borrow_mut(|state| *state = OpCounters::default());
}
