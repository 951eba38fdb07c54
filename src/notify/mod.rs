//! Outbound WhatsApp notifications.

use std::collections::BTreeMap;

use async_graphql::{InputObject, SimpleObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub mod msg91;

pub use msg91::Msg91Notifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("notification provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Template message request as sent by clients
#[derive(Debug, Clone, Default, Deserialize, ToSchema, InputObject)]
#[graphql(name = "SendWhatsAppInput")]
pub struct SendWhatsAppRequest {
    /// E.164 numbers, e.g. `+919876543210`
    pub recipients: Option<Vec<String>>,
    pub template_name: Option<String>,
    /// `en` or `en_US`; defaults to the configured language
    pub language: Option<String>,
    /// Template component values keyed by component name (`body_1`, `header_1`, ...)
    pub variables: Option<BTreeMap<String, String>>,
}

/// Validated template message
#[derive(Debug, Clone, PartialEq)]
pub struct WhatsAppMessage {
    pub recipients: Vec<String>,
    pub template_name: String,
    pub language: String,
    pub variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, SimpleObject)]
pub struct DeliveryReceipt {
    pub provider: String,
    pub accepted: usize,
    pub request_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> Result<DeliveryReceipt, NotifyError>;
}

/// Used when no provider is configured; the message only reaches the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> Result<DeliveryReceipt, NotifyError> {
        tracing::info!(
            template = %message.template_name,
            language = %message.language,
            recipients = message.recipients.len(),
            "WhatsApp provider not configured; message logged only"
        );
        Ok(DeliveryReceipt {
            provider: "log".to_string(),
            accepted: message.recipients.len(),
            request_id: None,
            sent_at: Utc::now(),
        })
    }
}
