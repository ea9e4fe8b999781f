use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::models::usage::UsagePeriod;
use crate::models::warning::UsageWarning;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    pub user_id: Uuid,
    pub usage: UsagePeriod,
    pub warnings: Vec<UsageWarning>,
    pub emitted_at: DateTime<Utc>,
}

/// Receives usage-changed events. Implementations must not block and must
/// not fail the caller; delivery problems are theirs to log.
pub trait UsageNotifier: Send + Sync {
    fn notify(&self, event: UsageEvent);
}

/// Used when no real-time channel is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl UsageNotifier for LogNotifier {
    fn notify(&self, event: UsageEvent) {
        log::debug!(
            "Usage changed for user {}: {} services, {} warnings",
            event.user_id,
            event.usage.services_used,
            event.warnings.len()
        );
    }
}

/// Pushes signed events to the real-time delivery service over HTTP.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    secret: String,
}

impl WebhookNotifier {
    pub fn new(url: String, secret: String) -> Self {
        Self {
            client: Client::new(),
            url,
            secret,
        }
    }

    /// Hex HMAC-SHA256 of `body` under the shared secret.
    pub fn calculate_signature(&self, body: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| anyhow!("Invalid webhook secret: {}", e))?;
        mac.update(body);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn deliver(client: Client, url: String, signature: String, body: Vec<u8>) -> Result<()> {
        let response = client
            .post(&url)
            .header("content-type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Usage webhook rejected ({}): {}", status, error_text));
        }
        Ok(())
    }
}

impl UsageNotifier for WebhookNotifier {
    fn notify(&self, event: UsageEvent) {
        let user_id = event.user_id;
        let body = match serde_json::to_vec(&event) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Could not encode usage event for user {}: {}", user_id, e);
                return;
            }
        };
        let signature = match self.calculate_signature(&body) {
            Ok(sig) => sig,
            Err(e) => {
                log::warn!("Could not sign usage event for user {}: {}", user_id, e);
                return;
            }
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("No async runtime; dropping usage event for user {}", user_id);
                return;
            }
        };

        let client = self.client.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            if let Err(e) = Self::deliver(client, url, signature, body).await {
                log::warn!("Usage event delivery failed for user {}: {}", user_id, e);
            }
        });
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;
