//! Hand-off of due reminders to the messaging endpoint

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::ReminderEntry;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("messaging endpoint rejected reminder: HTTP {status}")]
    Rejected { status: u16 },
}

/// JSON body sent to the messaging endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderMessage<'a> {
    pub pill_name: &'a str,
    pub time: &'a str,
    pub phone_number: &'a str,
    pub sent: bool,
}

impl<'a> From<&'a ReminderEntry> for ReminderMessage<'a> {
    fn from(entry: &'a ReminderEntry) -> Self {
        Self {
            pill_name: &entry.pill_name,
            time: &entry.scheduled_time,
            phone_number: &entry.phone_number,
            sent: entry.sent,
        }
    }
}

#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send(&self, reminder: &ReminderEntry) -> Result<(), DeliveryError>;
}

/// POSTs reminders as JSON
#[derive(Debug, Clone)]
pub struct HttpReminderSender {
    client: reqwest::Client,
    url: String,
}

impl HttpReminderSender {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReminderSender for HttpReminderSender {
    async fn send(&self, reminder: &ReminderEntry) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ReminderMessage::from(reminder))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{serve_once, test_client};

    fn entry() -> ReminderEntry {
        ReminderEntry {
            id: 1,
            pill_name: "Aspirin".to_string(),
            scheduled_time: "08:00".to_string(),
            phone_number: "+919876543210".to_string(),
            sent: false,
        }
    }

    #[test]
    fn test_message_shape() {
        let reminder = entry();
        let json = serde_json::to_value(ReminderMessage::from(&reminder)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pillName": "Aspirin",
                "time": "08:00",
                "phoneNumber": "+919876543210",
                "sent": false
            })
        );
    }

    #[tokio::test]
    async fn test_send_accepted() {
        let url = serve_once("200 OK", r#"{"success": true}"#).await;
        let sender = HttpReminderSender::new(test_client(), url);
        sender.send(&entry()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let url = serve_once("500 Internal Server Error", r#"{"error": "twilio down"}"#).await;
        let sender = HttpReminderSender::new(test_client(), url);

        match sender.send(&entry()).await {
            Err(DeliveryError::Rejected { status }) => assert_eq!(status, 500),
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
