//! Audit log repository: a best-effort sink for safe request metadata.
//!
//! Audit failures must never interrupt the request being audited, so
//! `record` swallows errors after logging them. Never store passwords,
//! raw tokens, or card data here.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::entities::audit_logs;

/// One auditable request event.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// The authenticated user, if the request carried a valid token.
    pub user_id: Option<Uuid>,
    /// Source IP of the request.
    pub ip: Option<String>,
    /// HTTP method.
    pub method: String,
    /// Request route/path.
    pub route: String,
    /// Small, safe metadata object (e.g. amount, account ids).
    pub meta: Value,
}

impl AuditEvent {
    /// Creates an event with empty metadata.
    #[must_use]
    pub fn new(user_id: Option<Uuid>, ip: Option<String>, method: &str, route: &str) -> Self {
        Self {
            user_id,
            ip,
            method: method.to_string(),
            route: route.to_string(),
            meta: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attaches a metadata object to the event.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = meta;
        self
    }
}

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an audit event. Failures are logged and swallowed.
    pub async fn record(&self, event: AuditEvent) {
        let log = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(event.user_id),
            ip: Set(event.ip),
            method: Set(event.method),
            route: Set(event.route),
            meta: Set(event.meta),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = log.insert(&self.db).await {
            warn!(error = %e, "failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_defaults_to_empty_meta() {
        let event = AuditEvent::new(None, None, "GET", "/api/v1/accounts");
        assert_eq!(event.meta, json!({}));
        assert_eq!(event.method, "GET");
    }

    #[test]
    fn test_event_with_meta() {
        let event = AuditEvent::new(Some(Uuid::new_v4()), Some("127.0.0.1".into()), "POST", "/t")
            .with_meta(json!({ "amount": "500" }));
        assert_eq!(event.meta["amount"], "500");
    }
}
