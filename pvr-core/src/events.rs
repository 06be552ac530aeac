use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::models::ClientId;
use crate::models::ConnectionState;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStateChanged {
    pub client_id: ClientId,
    pub connection_string: String,
    pub state: ConnectionState,
    pub message: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingNotification {
    pub client_id: ClientId,
    pub client_name: String,
    pub name: String,
    pub file_name: String,
    pub started: bool,
    pub timestamp: DateTime<Utc>,
}

/// Events recorded in the host's audit log.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum AuditEvent {
    ConnectionStateChanged(ConnectionStateChanged),
    RecordingNotification(RecordingNotification),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_log::test;

    #[test]
    fn test_audit_event_json() {
        let event = AuditEvent::ConnectionStateChanged(ConnectionStateChanged {
            client_id: 1.into(),
            connection_string: "localhost:9981".to_string(),
            state: ConnectionState::ServerUnreachable,
            message: "Server is unreachable".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "connection-state-changed",
                "data": {
                    "clientId": 1,
                    "connectionString": "localhost:9981",
                    "state": "server-unreachable",
                    "message": "Server is unreachable",
                },
            })
        );
    }
}
