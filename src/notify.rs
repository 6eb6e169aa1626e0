use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::config::TelegramConfig;
use crate::types::ValidatedRequest;

/// Telegram answers well inside this bound under normal conditions; the
/// result is discarded either way, so a stuck call must not hold up the
/// caller's response any longer.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam over the chat-webhook collaborator. Failures here are logged by the
/// caller and never affect the primary response.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> anyhow::Result<()>;
}

/// Best-effort delivery-status reporter posting to the Telegram bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .context("failed to build notification client")?;

        Ok(Self {
            client,
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .context("telegram request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("telegram responded with {}", response.status());
        }
        Ok(())
    }
}

pub fn success_report(req: &ValidatedRequest, message_id: &str) -> String {
    format!(
        "✅ *Email delivered*\n{}\nMessage-ID: {}",
        request_summary(req),
        message_id
    )
}

pub fn failure_report(req: &ValidatedRequest, error: &str) -> String {
    format!("❌ *Email failed*\n{}\nError: {}", request_summary(req), error)
}

fn request_summary(req: &ValidatedRequest) -> String {
    let mut summary = format!("To: {}\nSubject: {}", req.to_email, req.subject);
    if let Some(number) = &req.number {
        summary.push_str(&format!("\nNumber: {number}"));
    }
    if let Some(user_id) = &req.user_id {
        summary.push_str(&format!("\nUser ID: {user_id}"));
    }
    if let Some(username) = &req.username {
        summary.push_str(&format!("\nUsername: {username}"));
    }
    summary.push_str(&format!("\nTime: {}", Utc::now().to_rfc3339()));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ValidatedRequest {
        ValidatedRequest {
            to_email: "a@b.com".to_string(),
            subject: "Hi".to_string(),
            body: "Line1\nLine2".to_string(),
            number: Some("123".to_string()),
            user_id: Some("42".to_string()),
            username: Some("alice".to_string()),
        }
    }

    #[test]
    fn success_report_carries_request_fields_and_message_id() {
        let text = success_report(&request(), "<id@mail-relay>");

        assert!(text.contains("Email delivered"));
        assert!(text.contains("To: a@b.com"));
        assert!(text.contains("Subject: Hi"));
        assert!(text.contains("Number: 123"));
        assert!(text.contains("User ID: 42"));
        assert!(text.contains("Username: alice"));
        assert!(text.contains("<id@mail-relay>"));
        assert!(text.contains("Time: "));
    }

    #[test]
    fn failure_report_carries_error_text() {
        let text = failure_report(&request(), "connection refused");

        assert!(text.contains("Email failed"));
        assert!(text.contains("Error: connection refused"));
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let mut req = request();
        req.number = None;
        req.user_id = None;
        req.username = None;

        let text = success_report(&req, "<id@mail-relay>");

        assert!(!text.contains("Number:"));
        assert!(!text.contains("User ID:"));
        assert!(!text.contains("Username:"));
    }
}
