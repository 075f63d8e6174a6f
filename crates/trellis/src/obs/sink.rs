//! Metrics sink boundary.
//!
//! Query logic MUST NOT depend on `obs::metrics` directly.
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.
//!
//! This module is the only bridge between execution logic and the
//! process-local metrics state.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// PlanKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlanKind {
    Ids,
    Relation,
    Structure,
    FullScan,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    QueryStart,
    QueryFinish { rows: u64 },
    RowsScanned { rows: u64 },
    RowsHydrated { rows: u64 },
    Plan { kind: PlanKind },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::QueryStart => {
                metrics::with_state_mut(|m| {
                    m.query_calls = m.query_calls.saturating_add(1);
                });
            }

            MetricsEvent::QueryFinish { .. } => {}

            MetricsEvent::RowsScanned { rows } => {
                metrics::with_state_mut(|m| {
                    m.rows_scanned = m.rows_scanned.saturating_add(rows);
                });
            }

            MetricsEvent::RowsHydrated { rows } => {
                metrics::with_state_mut(|m| {
                    m.rows_hydrated = m.rows_hydrated.saturating_add(rows);
                });
            }

            MetricsEvent::Plan { kind } => {
                metrics::with_state_mut(|m| match kind {
                    PlanKind::Ids => m.plan_ids = m.plan_ids.saturating_add(1),
                    PlanKind::Relation => m.plan_relation = m.plan_relation.saturating_add(1),
                    PlanKind::Structure => m.plan_structure = m.plan_structure.saturating_add(1),
                    PlanKind::FullScan => {
                        m.plan_full_scan = m.plan_full_scan.saturating_add(1);
                    }
                });
            }
        }
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0.take();
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let outer = Rc::new(CountingSink { calls: Cell::new(0) });
        let inner = Rc::new(CountingSink { calls: Cell::new(0) });

        with_metrics_sink(outer.clone(), || {
            record(MetricsEvent::QueryStart);
            assert_eq!(outer.calls.get(), 1);

            with_metrics_sink(inner.clone(), || {
                record(MetricsEvent::QueryStart);
            });

            // Inner override was restored to outer override.
            record(MetricsEvent::QueryStart);
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);

        // Outer override was restored to previous (none).
        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn with_metrics_sink_restores_override_on_panic() {
        SINK_OVERRIDE.with(|cell| {
            *cell.borrow_mut() = None;
        });

        let sink = Rc::new(CountingSink { calls: Cell::new(0) });

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(sink.clone(), || {
                record(MetricsEvent::QueryStart);
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();
        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);

        // Guard restored the slot after unwind.
        SINK_OVERRIDE.with(|cell| {
            assert!(cell.borrow().is_none());
        });
    }

    #[test]
    fn global_sink_accumulates_counters() {
        metrics::metrics_reset_all();

        record(MetricsEvent::QueryStart);
        record(MetricsEvent::RowsScanned { rows: 7 });
        record(MetricsEvent::Plan {
            kind: PlanKind::Relation,
        });

        let report = metrics::metrics_report();
        assert_eq!(report.query_calls, 1);
        assert_eq!(report.rows_scanned, 7);
        assert_eq!(report.plan_relation, 1);
    }
}
