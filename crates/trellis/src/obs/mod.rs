pub mod metrics;
pub mod sink;

pub use metrics::{OpCounters, metrics_report, metrics_reset_all};
pub use sink::{MetricsEvent, MetricsSink, PlanKind, with_metrics_sink};
