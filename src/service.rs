//! Service registry data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Protocol used to probe a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckAction {
    /// HTTP reachability check against endpoint:port
    Get,
    /// ICMP echo reachability check against the endpoint host
    Ping,
    /// TCP connect reachability check against endpoint:port
    Socket,
    /// Any action string this build does not recognize
    #[serde(other)]
    Unknown,
}

/// A monitored service as persisted in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub action: CheckAction,
    pub enabled: bool,
    /// An alert is outstanding for the current outage.
    #[serde(default)]
    pub triggered: bool,
    /// Alerts raised over the lifetime of this record.
    #[serde(default)]
    pub alert_count: u64,
    #[serde(default)]
    pub last_alert_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Outcome of probing one service within a single run.
///
/// The failure verdict lives here instead of on the record so it can never
/// leak into the persisted registry.
#[derive(Debug)]
pub struct CheckOutcome {
    pub record: ServiceRecord,
    pub failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_use_uppercase_wire_form() {
        assert_eq!(
            serde_json::to_string(&CheckAction::Get).unwrap(),
            "\"GET\""
        );
        assert_eq!(
            serde_json::from_str::<CheckAction>("\"SOCKET\"").unwrap(),
            CheckAction::Socket
        );
    }

    #[test]
    fn unrecognized_action_loads_as_unknown() {
        assert_eq!(
            serde_json::from_str::<CheckAction>("\"FTP\"").unwrap(),
            CheckAction::Unknown
        );
    }

    #[test]
    fn record_tolerates_missing_state_fields() {
        let raw = r#"{
            "id": "svc-1",
            "name": "billing",
            "endpoint": "billing.internal",
            "action": "PING",
            "enabled": true
        }"#;

        let record: ServiceRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.action, CheckAction::Ping);
        assert!(record.port.is_none());
        assert!(!record.triggered);
        assert_eq!(record.alert_count, 0);
        assert!(record.last_alert_at.is_none());
        assert!(record.last_success_at.is_none());
    }
}
