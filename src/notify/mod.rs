//! Notification side-channel.
//!
//! Delivery outcomes are always reported back to the caller, never
//! silently discarded.

use crate::config::NotifyConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

/// A message addressed to a lookup contact.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub contact: String,
    pub subject: String,
    pub body: String,
}

/// Evidence of a delivery attempt that succeeded.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub contact: String,
    pub detail: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<DeliveryReceipt>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts notifications to a JSON webhook endpoint.
pub struct WebhookNotifier {
    http: reqwest::Client,
    endpoint: String,
    sender: String,
}

impl WebhookNotifier {
    /// Returns `None` when no endpoint is configured.
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        config.endpoint.as_ref().map(|endpoint| Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.clone(),
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<DeliveryReceipt> {
        let payload = WebhookPayload {
            from: &self.sender,
            to: &notification.contact,
            subject: &notification.subject,
            body: &notification.body,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .context("notification request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            anyhow::bail!("notification endpoint returned {}: {}", status, body);
        }

        tracing::info!(
            "[WebhookNotifier] delivered notification to {}",
            notification.contact
        );

        Ok(DeliveryReceipt {
            contact: notification.contact.clone(),
            detail: format!("delivered via {}", self.endpoint),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: Option<String>) -> NotifyConfig {
        NotifyConfig {
            endpoint,
            sender: "snackroute@localhost".to_string(),
        }
    }

    #[test]
    fn notifier_is_disabled_without_an_endpoint() {
        assert!(WebhookNotifier::from_config(&config(None)).is_none());
    }

    #[tokio::test]
    async fn delivers_and_returns_a_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::from_config(&config(Some(format!("{}/hook", server.uri()))))
                .unwrap();

        let receipt = notifier
            .deliver(&Notification {
                contact: "arjun@email.com".to_string(),
                subject: "User preference info".to_string(),
                body: "Arjun's weather preference is Snowy.".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(receipt.contact, "arjun@email.com");
    }

    #[tokio::test]
    async fn failed_delivery_surfaces_the_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::from_config(&config(Some(format!("{}/hook", server.uri()))))
                .unwrap();

        let err = notifier
            .deliver(&Notification {
                contact: "arjun@email.com".to_string(),
                subject: "subject".to_string(),
                body: "body".to_string(),
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("503"));
    }
}
