//! MSG91 WhatsApp bulk template API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::{DeliveryReceipt, NotifyError, Notifier, WhatsAppMessage};
use crate::config::NotificationConfig;

const BULK_PATH: &str = "/api/v5/whatsapp/whatsapp-outbound-message/bulk/";

pub struct Msg91Notifier {
    client: Client,
    base_url: String,
    auth_key: String,
    integrated_number: String,
}

impl Msg91Notifier {
    pub fn new(base_url: &str, auth_key: &str, integrated_number: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create MSG91 HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_key: auth_key.to_string(),
            integrated_number: integrated_number.to_string(),
        })
    }

    /// `None` unless both the auth key and integrated number are configured
    pub fn from_config(config: &NotificationConfig) -> anyhow::Result<Option<Self>> {
        match (&config.msg91_auth_key, &config.msg91_integrated_number) {
            (Some(key), Some(number)) => Ok(Some(Self::new(&config.msg91_base_url, key, number)?)),
            _ => Ok(None),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, BULK_PATH)
    }

    pub(crate) fn payload(&self, message: &WhatsAppMessage) -> Value {
        // MSG91 expects bare digits without the leading '+'
        let to: Vec<&str> = message
            .recipients
            .iter()
            .map(|r| r.trim_start_matches('+'))
            .collect();
        let components: Map<String, Value> = message
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), json!({ "type": "text", "value": value })))
            .collect();

        json!({
            "integrated_number": self.integrated_number,
            "content_type": "template",
            "payload": {
                "messaging_product": "whatsapp",
                "type": "template",
                "template": {
                    "name": message.template_name,
                    "language": { "code": message.language, "policy": "deterministic" },
                    "to_and_components": [
                        { "to": to, "components": components }
                    ]
                }
            }
        })
    }
}

#[async_trait]
impl Notifier for Msg91Notifier {
    async fn send_whatsapp(&self, message: &WhatsAppMessage) -> Result<DeliveryReceipt, NotifyError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("authkey", &self.auth_key)
            .json(&self.payload(message))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "MSG91 rejected WhatsApp message");
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }

        let request_id = serde_json::from_str::<Value>(&body).ok().and_then(|v| {
            v.get("request_id")
                .or_else(|| v.pointer("/data/request_id"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        tracing::info!(template = %message.template_name, recipients = message.recipients.len(), "WhatsApp message accepted by MSG91");

        Ok(DeliveryReceipt {
            provider: "msg91".to_string(),
            accepted: message.recipients.len(),
            request_id,
            sent_at: Utc::now(),
        })
    }
}
