//! Notification fan-out
//!
//! The core hands every non-empty [`Notification`] to a `Notifier`, which
//! logs it and optionally POSTs the serialized payload to a configured
//! webhook. Delivery failures are logged and never fed back into the
//! pipeline.

use reqwest::Client;
use tracing::{error, info, instrument, warn};

use crate::Notification;
use crate::config::WebhookConfig;

#[derive(Debug, Clone)]
pub struct Notifier {
    client: Client,
    webhook: Option<WebhookConfig>,
}

impl Notifier {
    pub fn new(webhook: Option<WebhookConfig>) -> Self {
        Self {
            client: Client::new(),
            webhook,
        }
    }

    /// Announce one notification. `Notification::None` is silently ignored.
    #[instrument(skip(self, notification))]
    pub async fn publish(&self, notification: &Notification) {
        match notification {
            Notification::None => return,

            Notification::Alert {
                target,
                availability,
                start_date,
            } => {
                warn!(
                    "website {target} is down. availability={:.2}%, since={start_date}",
                    availability * 100.0
                );
            }

            Notification::Recovery {
                target,
                availability,
                start_date,
                end_date,
            } => {
                info!(
                    "website {target} recovered from alert. availability={:.2}%, down from {start_date} to {end_date}",
                    availability * 100.0
                );
            }
        }

        if let Some(webhook) = &self.webhook {
            self.send_webhook(webhook, notification).await;
        }
    }

    #[instrument(skip(self, webhook, notification))]
    async fn send_webhook(&self, webhook: &WebhookConfig, notification: &Notification) {
        match self.client.post(&webhook.url).json(notification).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent webhook notification");
                } else {
                    error!(
                        "Webhook notification failed with status: {}",
                        response.status()
                    );
                }
            }
            Err(e) => {
                error!("Failed to send webhook notification: {}", e);
            }
        }
    }
}
