//! Outbound webhook delivery for session lifecycle events.
//!
//! Events are posted as JSON to `{base_url}/{session_id}`. Delivery is
//! fire-and-forget: a failed POST is logged and never affects the session.

use log::{debug, warn};
use serde_json::{json, Value};
use std::time::Duration;

/// Posts lifecycle events to a configured webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl WebhookNotifier {
    /// Create a notifier. With `base_url` unset, all notifications are no-ops.
    pub fn new(base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.filter(|url| !url.is_empty()),
        }
    }

    /// Whether a webhook endpoint is configured.
    pub fn enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Post one event for a session. Returns immediately; the request runs
    /// on its own task.
    pub fn notify(&self, session_id: &str, data_type: &str, data: Value) {
        let Some(base) = &self.base_url else {
            return;
        };
        let url = format!("{}/{}", base.trim_end_matches('/'), session_id);
        let body = json!({
            "sessionId": session_id,
            "dataType": data_type,
            "data": data,
        });
        let client = self.client.clone();
        let data_type = data_type.to_string();
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("Delivered {} webhook for session {}", data_type, session_id);
                }
                Ok(resp) => {
                    warn!(
                        "Webhook for session {} returned {} ({})",
                        session_id,
                        resp.status(),
                        data_type
                    );
                }
                Err(e) => {
                    warn!("Webhook delivery failed for session {}: {}", session_id, e);
                }
            }
        });
    }
}
