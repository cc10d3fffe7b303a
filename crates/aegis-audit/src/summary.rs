//! Read-side aggregation for compliance dashboards.
//!
//! Summaries are derived and eventually consistent; the raw events in the
//! durable sink remain the source of truth.

use aegis_core::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::event::AuditEvent;

/// Aggregated counts over a set of audit events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Total events considered.
    pub total: u64,
    /// Events with a success outcome.
    pub successes: u64,
    /// Events with a failure outcome.
    pub failures: u64,
    /// Counts per risk level.
    pub by_risk: HashMap<RiskLevel, u64>,
    /// Counts per action label.
    pub by_action: HashMap<String, u64>,
    /// Counts per tenant.
    pub by_tenant: HashMap<String, u64>,
}

impl AuditSummary {
    /// Aggregate a slice of events.
    #[must_use]
    pub fn from_events(events: &[AuditEvent]) -> Self {
        let mut summary = Self::default();
        for event in events {
            summary.total = summary.total.saturating_add(1);
            if event.outcome.is_success() {
                summary.successes = summary.successes.saturating_add(1);
            } else {
                summary.failures = summary.failures.saturating_add(1);
            }
            bump(summary.by_risk.entry(event.risk).or_default());
            bump(
                summary
                    .by_action
                    .entry(event.action.label().to_string())
                    .or_default(),
            );
            bump(
                summary
                    .by_tenant
                    .entry(event.tenant_id.as_str().to_string())
                    .or_default(),
            );
        }
        summary
    }

    /// Count of events at or above the given risk level.
    #[must_use]
    pub fn at_or_above(&self, level: RiskLevel) -> u64 {
        self.by_risk
            .iter()
            .filter(|(risk, _)| **risk >= level)
            .map(|(_, count)| *count)
            .fold(0, u64::saturating_add)
    }
}

fn bump(count: &mut u64) {
    *count = count.saturating_add(1);
}
