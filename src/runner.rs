//! Check orchestration: one complete monitoring run

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::notify::AlertNotifier;
use crate::probes::Prober;
use crate::service::{CheckAction, CheckOutcome, ServiceRecord};
use crate::store::ServiceStore;
use crate::transitions::{TransitionSummary, apply_transitions};

/// Summary of one completed monitoring run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    /// Enabled services that were probed this run.
    pub checked: usize,
    pub failed: Vec<String>,
    pub recovered: Vec<String>,
}

/// Orchestrates a run: load the snapshot, fan out one probe task per enabled
/// service, join them, apply the state transitions, then dispatch
/// notifications concurrently with persisting the mutated set.
pub struct CheckRunner {
    store: Arc<dyn ServiceStore>,
    notifier: Arc<dyn AlertNotifier>,
    prober: Arc<Prober>,
}

impl CheckRunner {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        notifier: Arc<dyn AlertNotifier>,
        prober: Arc<Prober>,
    ) -> Self {
        Self {
            store,
            notifier,
            prober,
        }
    }

    /// Execute one monitoring run over the current registry snapshot.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let mut services = self.store.load().await?;
        info!(
            "run {} checking {} registered services",
            run_id,
            services.len()
        );

        // Bad action data disables itself instead of failing the run.
        for service in services.iter_mut() {
            if service.enabled && service.action == CheckAction::Unknown {
                warn!(
                    "service {} has an unrecognized action, disabling it",
                    service.name
                );
                service.enabled = false;
            }
        }

        let mut outcomes = self.probe_all(services).await;
        let summary = apply_transitions(&mut outcomes, Utc::now());

        let checked = outcomes.iter().filter(|o| o.record.enabled).count();
        let records: Vec<ServiceRecord> = outcomes.into_iter().map(|o| o.record).collect();

        let ((), save_result) =
            tokio::join!(self.dispatch(&summary), self.store.save(&records));
        if let Err(e) = save_result {
            error!("run {} could not persist the registry snapshot: {}", run_id, e);
        }

        info!(
            "run {} complete: {} checked, {} newly failed, {} recovered",
            run_id,
            checked,
            summary.failed.len(),
            summary.recovered.len()
        );

        Ok(RunReport {
            run_id,
            checked,
            failed: summary.failed,
            recovered: summary.recovered,
        })
    }

    /// Fan out one probe task per enabled service and wait for all of them.
    async fn probe_all(&self, services: Vec<ServiceRecord>) -> Vec<CheckOutcome> {
        let mut indices = Vec::new();
        let mut handles = Vec::new();
        for (index, service) in services.iter().enumerate() {
            if !service.enabled {
                continue;
            }
            let prober = Arc::clone(&self.prober);
            let record = service.clone();
            indices.push(index);
            handles.push(tokio::spawn(async move { prober.check(&record).await }));
        }

        let mut failed_flags = vec![false; services.len()];
        for (index, joined) in indices.into_iter().zip(join_all(handles).await) {
            failed_flags[index] = match joined {
                Ok(failed) => failed,
                Err(e) => {
                    error!(
                        "probe task for service {} aborted: {}",
                        services[index].name, e
                    );
                    true
                }
            };
        }

        services
            .into_iter()
            .zip(failed_flags)
            .map(|(record, failed)| CheckOutcome { record, failed })
            .collect()
    }

    /// Send the alert and recovery batches; failures are logged, never raised.
    async fn dispatch(&self, summary: &TransitionSummary) {
        let (alert_result, recovery_result) = tokio::join!(
            self.notifier.send_alert(&summary.failed),
            self.notifier.send_recovery(&summary.recovered),
        );

        if let Err(e) = alert_result {
            error!(
                "alert notification for {} services failed: {}",
                summary.failed.len(),
                e
            );
        }
        if let Err(e) = recovery_result {
            error!(
                "recovery notification for {} services failed: {}",
                summary.recovered.len(),
                e
            );
        }
    }
}
