//! Service registry persistence

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::Result;
use crate::service::ServiceRecord;

/// Persistence seam for the monitored-service registry.
///
/// The orchestrator loads one snapshot at run start and writes the mutated
/// set back once at run end.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn load(&self) -> Result<Vec<ServiceRecord>>;
    async fn save(&self, services: &[ServiceRecord]) -> Result<()>;
}

/// Registry backed by a JSON document on disk.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ServiceStore for FileStore {
    async fn load(&self) -> Result<Vec<ServiceRecord>> {
        if !Path::new(&self.path).exists() {
            debug!(
                "registry file {} does not exist yet, starting with an empty set",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let raw = tokio::fs::read_to_string(&self.path).await?;
        let services = serde_json::from_str(&raw)?;
        Ok(services)
    }

    async fn save(&self, services: &[ServiceRecord]) -> Result<()> {
        let raw = serde_json::to_string_pretty(services)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!(
            "persisted {} services to {}",
            services.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CheckAction;
    use chrono::Utc;

    fn sample_service() -> ServiceRecord {
        ServiceRecord {
            id: "svc-1".to_string(),
            name: "payments".to_string(),
            endpoint: "payments.internal".to_string(),
            port: Some(443),
            action: CheckAction::Get,
            enabled: true,
            triggered: true,
            alert_count: 2,
            last_alert_at: Some(Utc::now()),
            last_success_at: None,
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("services.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("services.json"));

        let services = vec![sample_service()];
        store.save(&services).await.unwrap();

        assert_eq!(store.load().await.unwrap(), services);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        assert!(FileStore::new(path).load().await.is_err());
    }

    #[tokio::test]
    async fn unknown_actions_in_the_file_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        tokio::fs::write(
            &path,
            r#"[{
                "id": "svc-9",
                "name": "legacy",
                "endpoint": "legacy.internal",
                "action": "GOPHER",
                "enabled": true
            }]"#,
        )
        .await
        .unwrap();

        let services = FileStore::new(path).load().await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].action, CheckAction::Unknown);
    }
}
