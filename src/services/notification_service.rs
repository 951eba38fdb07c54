use std::sync::Arc;

use serde_json::json;

use crate::audit::{AuditEvent, AuditSink};
use crate::error::ApiError;
use crate::notify::{DeliveryReceipt, Notifier, SendWhatsAppRequest};
use crate::tenancy::TenantContext;
use crate::types::{Entity, Operation};
use crate::validation::validate_whatsapp;

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
    default_language: String,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, audit: Arc<dyn AuditSink>, default_language: impl Into<String>) -> Self {
        Self { notifier, audit, default_language: default_language.into() }
    }

    pub async fn send_whatsapp(
        &self,
        ctx: &TenantContext,
        req: SendWhatsAppRequest,
    ) -> Result<DeliveryReceipt, ApiError> {
        let message = validate_whatsapp(req, &self.default_language)?;
        let receipt = self.notifier.send_whatsapp(&message).await?;

        self.audit.record(
            AuditEvent::new(ctx, Operation::Notify, Entity::WhatsAppMessage, None).with_detail(json!({
                "provider": receipt.provider,
                "template_name": message.template_name,
                "recipients": message.recipients.len(),
            })),
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;
    use crate::models::DataEnvironment;
    use crate::notify::LogNotifier;
    use uuid::Uuid;

    #[tokio::test]
    async fn sends_and_audits() {
        let audit = RecordingAuditSink::default();
        let service = NotificationService::new(Arc::new(LogNotifier), Arc::new(audit.clone()), "en");
        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), DataEnvironment::Live);

        let receipt = service
            .send_whatsapp(
                &ctx,
                SendWhatsAppRequest {
                    recipients: Some(vec!["+919876543210".into()]),
                    template_name: Some("booking_confirmed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.accepted, 1);
        assert_eq!(audit.events()[0].action, Operation::Notify);

        let err = service.send_whatsapp(&ctx, SendWhatsAppRequest::default()).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("recipients"));
        assert_eq!(audit.events().len(), 1);
    }
}
