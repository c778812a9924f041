//! Failure and recovery state transitions

use chrono::{DateTime, Utc};
use tracing::info;

use crate::service::CheckOutcome;

/// Names of the services that changed state during one run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransitionSummary {
    /// Services that newly failed and need an alert.
    pub failed: Vec<String>,
    /// Services that recovered from an alerted outage.
    pub recovered: Vec<String>,
}

/// Apply the per-service transition rules to a completed probe pass.
///
/// Each enabled service takes exactly one of three paths: a new failure
/// raises the alert bookkeeping and lands on the failed list, an
/// already-alerted failure stays untouched so the outage is reported only
/// once, and a success refreshes `last_success_at` (clearing `triggered` and
/// landing on the recovered list when an alert was outstanding). Disabled
/// services are never mutated. List order follows snapshot order.
pub fn apply_transitions(
    outcomes: &mut [CheckOutcome],
    now: DateTime<Utc>,
) -> TransitionSummary {
    let mut summary = TransitionSummary::default();

    for outcome in outcomes.iter_mut() {
        let record = &mut outcome.record;
        if !record.enabled {
            continue;
        }

        if outcome.failed {
            if !record.triggered {
                record.last_alert_at = Some(now);
                record.triggered = true;
                record.alert_count += 1;
                info!(
                    "service {} failed, raising alert #{}",
                    record.name, record.alert_count
                );
                summary.failed.push(record.name.clone());
            }
            // Already alerted: the ongoing outage stays silent.
        } else {
            record.last_success_at = Some(now);
            if record.triggered {
                record.triggered = false;
                info!("service {} recovered", record.name);
                summary.recovered.push(record.name.clone());
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{CheckAction, ServiceRecord};

    fn outcome(name: &str, enabled: bool, triggered: bool, failed: bool) -> CheckOutcome {
        CheckOutcome {
            record: ServiceRecord {
                id: format!("id-{}", name),
                name: name.to_string(),
                endpoint: "example.org".to_string(),
                port: Some(80),
                action: CheckAction::Get,
                enabled,
                triggered,
                alert_count: 0,
                last_alert_at: None,
                last_success_at: None,
            },
            failed,
        }
    }

    #[test]
    fn new_failure_raises_alert() {
        let now = Utc::now();
        let mut outcomes = vec![outcome("api", true, false, true)];

        let summary = apply_transitions(&mut outcomes, now);

        let record = &outcomes[0].record;
        assert!(record.triggered);
        assert_eq!(record.alert_count, 1);
        assert_eq!(record.last_alert_at, Some(now));
        assert!(record.last_success_at.is_none());
        assert_eq!(summary.failed, vec!["api".to_string()]);
        assert!(summary.recovered.is_empty());
    }

    #[test]
    fn ongoing_outage_is_not_realerted() {
        let now = Utc::now();
        let mut outcomes = vec![outcome("api", true, true, true)];
        outcomes[0].record.alert_count = 4;

        let summary = apply_transitions(&mut outcomes, now);

        let record = &outcomes[0].record;
        assert!(record.triggered);
        assert_eq!(record.alert_count, 4);
        assert!(record.last_alert_at.is_none());
        assert!(summary.failed.is_empty());
        assert!(summary.recovered.is_empty());
    }

    #[test]
    fn recovery_clears_trigger_and_is_reported() {
        let now = Utc::now();
        let mut outcomes = vec![outcome("api", true, true, false)];

        let summary = apply_transitions(&mut outcomes, now);

        let record = &outcomes[0].record;
        assert!(!record.triggered);
        assert_eq!(record.last_success_at, Some(now));
        assert!(summary.failed.is_empty());
        assert_eq!(summary.recovered, vec!["api".to_string()]);
    }

    #[test]
    fn plain_success_only_refreshes_timestamp() {
        let now = Utc::now();
        let mut outcomes = vec![outcome("api", true, false, false)];

        let summary = apply_transitions(&mut outcomes, now);

        let record = &outcomes[0].record;
        assert!(!record.triggered);
        assert_eq!(record.last_success_at, Some(now));
        assert_eq!(record.alert_count, 0);
        assert!(summary.failed.is_empty());
        assert!(summary.recovered.is_empty());
    }

    #[test]
    fn disabled_service_is_untouched() {
        let now = Utc::now();
        let mut outcomes = vec![outcome("api", false, false, true)];

        let summary = apply_transitions(&mut outcomes, now);

        let record = &outcomes[0].record;
        assert!(!record.triggered);
        assert_eq!(record.alert_count, 0);
        assert!(record.last_alert_at.is_none());
        assert!(record.last_success_at.is_none());
        assert!(summary.failed.is_empty());
        assert!(summary.recovered.is_empty());
    }

    #[test]
    fn lists_preserve_snapshot_order() {
        let now = Utc::now();
        let mut outcomes = vec![
            outcome("alpha", true, false, true),
            outcome("beta", true, true, false),
            outcome("gamma", true, false, true),
            outcome("delta", true, true, false),
        ];

        let summary = apply_transitions(&mut outcomes, now);

        assert_eq!(summary.failed, vec!["alpha".to_string(), "gamma".to_string()]);
        assert_eq!(summary.recovered, vec!["beta".to_string(), "delta".to_string()]);
    }

    #[test]
    fn alert_count_increments_once_per_outage() {
        let mut outcomes = vec![outcome("api", true, false, true)];

        // Fail, stay failed, recover, fail again.
        apply_transitions(&mut outcomes, Utc::now());
        assert_eq!(outcomes[0].record.alert_count, 1);

        apply_transitions(&mut outcomes, Utc::now());
        assert_eq!(outcomes[0].record.alert_count, 1);

        outcomes[0].failed = false;
        apply_transitions(&mut outcomes, Utc::now());
        assert!(!outcomes[0].record.triggered);

        outcomes[0].failed = true;
        apply_transitions(&mut outcomes, Utc::now());
        assert_eq!(outcomes[0].record.alert_count, 2);
    }
}
