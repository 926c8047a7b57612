//! Event types published to the dashboard frontend during probing and
//! metrics runs.
//!
//! Events are serialized as tagged JSON and mirrored into TypeScript via
//! ts-rs, so the dashboard can subscribe to the same shapes the engine
//! emits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::metrics::CategoryMetrics;
use super::validity::{ProbeTally, ValidityRecord};

/// Snapshot of probe progress, published after every processed slug so the
/// frontend observes a monotonic stream rather than a single final result.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProbeProgress {
    pub tally: ProbeTally,
    /// Progress percentage in `[0, 100]`.
    pub percentage: f64,
    pub current_slug: String,
    pub timestamp: DateTime<Utc>,
}

impl ProbeProgress {
    pub fn from_tally(tally: ProbeTally, current_slug: impl Into<String>) -> Self {
        Self {
            percentage: tally.percentage(),
            tally,
            current_slug: current_slug.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Events emitted during a validity probe run.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
#[ts(export)]
pub enum ProbeEvent {
    /// A probe run started for `total` slugs.
    Started { session_id: String, total: u32 },
    /// Running tally, published after every slug.
    Progress(ProbeProgress),
    /// A single slug finished classification.
    Record(ValidityRecord),
    /// The run finished (or was cancelled with a partial tally).
    Completed {
        session_id: String,
        tally: ProbeTally,
        cancelled: bool,
        duration_ms: u64,
    },
}

impl ProbeEvent {
    /// Stable event name used as the frontend subscription channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "probe-started",
            Self::Progress(_) => "probe-progress",
            Self::Record(_) => "probe-record",
            Self::Completed { .. } => "probe-completed",
        }
    }
}

/// Events emitted during metrics computation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
#[ts(export)]
pub enum MetricsEvent {
    Started { slug: String },
    Computed { slug: String, metrics: CategoryMetrics },
    /// Computation yielded no data for the slug; the batch keeps going.
    NoData { slug: String, reason: String },
    BatchCompleted { computed: u32, skipped: u32 },
}

impl MetricsEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "metrics-started",
            Self::Computed { .. } => "metrics-computed",
            Self::NoData { .. } => "metrics-no-data",
            Self::BatchCompleted { .. } => "metrics-batch-completed",
        }
    }
}

/// Union of everything the engine publishes on its event channel.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "event")]
#[ts(export)]
pub enum EngineEvent {
    Probe(ProbeEvent),
    Metrics(MetricsEvent),
}

impl EngineEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Probe(event) => event.event_name(),
            Self::Metrics(event) => event.event_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_snapshot_carries_tally_percentage() {
        let mut tally = ProbeTally::new(4);
        tally.record(crate::domain::validity::ValidityStatus::Ok);

        let progress = ProbeProgress::from_tally(tally, "mugs");
        assert_eq!(progress.percentage, 25.0);
        assert_eq!(progress.current_slug, "mugs");
    }

    #[test]
    fn event_names_are_stable() {
        let event = EngineEvent::Probe(ProbeEvent::Started {
            session_id: "s".into(),
            total: 1,
        });
        assert_eq!(event.event_name(), "probe-started");

        let event = EngineEvent::Metrics(MetricsEvent::BatchCompleted {
            computed: 1,
            skipped: 0,
        });
        assert_eq!(event.event_name(), "metrics-batch-completed");
    }

    #[test]
    fn probe_event_serializes_tagged() {
        let event = ProbeEvent::Started {
            session_id: "abc".into(),
            total: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Started");
        assert_eq!(json["payload"]["total"], 3);
    }
}
