//! Audit log stub: one structured tracing event per mutation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::DataEnvironment;
use crate::tenancy::TenantContext;
use crate::types::{Entity, Operation};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub tenant_id: Uuid,
    pub actor_id: Uuid,
    pub environment: DataEnvironment,
    pub action: Operation,
    pub entity: Entity,
    pub entity_id: Option<Uuid>,
    pub at: DateTime<Utc>,
    pub detail: Value,
}

impl AuditEvent {
    pub fn new(ctx: &TenantContext, action: Operation, entity: Entity, entity_id: Option<Uuid>) -> Self {
        Self {
            tenant_id: ctx.tenant_id,
            actor_id: ctx.user_id,
            environment: ctx.environment,
            action,
            entity,
            entity_id,
            at: Utc::now(),
            detail: Value::Null,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Emits events on the `audit` tracing target
#[derive(Debug, Clone)]
pub struct TracingAuditSink {
    enabled: bool,
}

impl TracingAuditSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.enabled {
            tracing::info!(
                target: "audit",
                tenant_id = %event.tenant_id,
                actor_id = %event.actor_id,
                environment = %event.environment,
                action = %event.action,
                entity = %event.entity,
                entity_id = ?event.entity_id,
                detail = %event.detail,
                "audit"
            );
        } else {
            tracing::debug!(action = %event.action, entity = %event.entity, entity_id = ?event.entity_id, "audit (disabled)");
        }
    }
}

/// Keeps events in memory so tests can assert on them
#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_carry_tenant_context() {
        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), DataEnvironment::Test);
        let id = Uuid::new_v4();
        let sink = RecordingAuditSink::default();
        sink.record(
            AuditEvent::new(&ctx, Operation::Update, Entity::CatalogItem, Some(id))
                .with_detail(json!({ "version_number": 2 })),
        );
        TracingAuditSink::new(true).record(AuditEvent::new(&ctx, Operation::Delete, Entity::Resource, None));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tenant_id, ctx.tenant_id);
        assert_eq!(events[0].environment, DataEnvironment::Test);
        assert_eq!(events[0].detail["version_number"], 2);
    }
}
