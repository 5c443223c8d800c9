//! Outgoing email.
//!
//! Delivery is best effort: [`send_templated_email`] renders and sends, and
//! any failure is logged and swallowed so the triggering operation still
//! succeeds.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use adminpanel_ui::{RenderError, Renderer};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail render error: {0}")]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    pub name: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub from: Address,
    pub to: Address,
    pub subject: String,
    pub html: String,
}

/// Mail transport seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes every email to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            from = %email.from.email,
            to = %email.to.email,
            subject = %email.subject,
            bytes = email.html.len(),
            "email sent (log transport)"
        );
        Ok(())
    }
}

/// Keeps sent emails in memory. Used by tests and local development.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<Email>>,
    failing: bool,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects every message.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Transport("outbox is configured to fail".into()));
        }
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".into()))?
            .push(email);
        Ok(())
    }
}

/// Render `template` with `context` and send it. Never fails: errors are
/// logged at `error` and reported as `false`.
pub async fn send_templated_email(
    mailer: &dyn Mailer,
    renderer: &dyn Renderer,
    from: Address,
    to: Address,
    subject: &str,
    template: &str,
    context: &serde_json::Value,
) -> bool {
    let result = async {
        let html = renderer.render(template, context)?;
        mailer
            .send(Email {
                from,
                to: to.clone(),
                subject: subject.to_string(),
                html,
            })
            .await
    }
    .await;

    match result {
        Ok(()) => {
            tracing::info!(to = %to.email, template, "email sent");
            true
        }
        Err(err) => {
            tracing::error!(to = %to.email, template, error = %err, "failed to send email");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use adminpanel_ui::{PanelRenderer, templates};

    use super::*;

    fn addresses() -> (Address, Address) {
        (
            Address::new("admin@acme.test", Some("Acme".into())),
            Address::new("user@example.com", None),
        )
    }

    #[tokio::test]
    async fn rendered_email_lands_in_outbox() {
        let mailer = OutboxMailer::new();
        let (from, to) = addresses();
        let ctx = json!({ "resetUrl": "http://x/admin/login/reset/abc", "expireMinutes": 60 });

        let sent = send_templated_email(
            &mailer,
            &PanelRenderer,
            from,
            to,
            "Reset password",
            templates::EMAIL_RESET_PASSWORD,
            &ctx,
        )
        .await;

        assert!(sent);
        let outbox = mailer.sent();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to.email, "user@example.com");
        assert!(outbox[0].html.contains("/admin/login/reset/abc"));
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let mailer = OutboxMailer::failing();
        let (from, to) = addresses();
        let ctx = json!({ "resetUrl": "http://x" });

        let sent = send_templated_email(
            &mailer,
            &PanelRenderer,
            from,
            to,
            "Reset password",
            templates::EMAIL_RESET_PASSWORD,
            &ctx,
        )
        .await;

        assert!(!sent);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn render_failure_is_swallowed() {
        let mailer = OutboxMailer::new();
        let (from, to) = addresses();

        let sent = send_templated_email(
            &mailer,
            &PanelRenderer,
            from,
            to,
            "Welcome",
            templates::EMAIL_WELCOME,
            &json!({}),
        )
        .await;

        assert!(!sent);
        assert!(mailer.sent().is_empty());
    }
}
