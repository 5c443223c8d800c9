//! Self-service password reset.
//!
//! ```text
//! NONE ── issue ──▶ ISSUED ── reset_password ──▶ USED
//!                     │
//!                     └── now >= expire_at ──▶ EXPIRED (derived, never stored)
//! ```
//!
//! Issuing deletes every earlier token for the email first, so at most one
//! usable token exists per email. The delete and the insert are separate
//! statements.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use adminpanel_auth::{AuthError, PanelUser, ResetToken, password, reset_token};
use adminpanel_ui::{Renderer, templates};

use crate::config::PanelConfig;
use crate::mail::{Address, Mailer, send_templated_email};
use crate::store::{ResetTokenStore, UserStore};
use crate::StoreError;

/// Reply to every reset request, whether or not the email has an account.
pub const RESET_REQUESTED: &str = "If the email belongs to an account, a reset link is on its way.";
pub const PASSWORD_RESET_DONE: &str = "Your password has been reset. Please log in.";

/// Path prefix of the reset form; the token is appended.
pub const RESET_PATH: &str = "/admin/login/reset";

/// Reset workflow failures. The `Display` text is shown to the user.
///
/// Unknown, expired and consumed tokens all report `TokenDoesNotExist`.
#[derive(Debug, Error)]
pub enum ResetError {
    #[error("Token does not exist")]
    TokenDoesNotExist,

    #[error("Email does not match token")]
    EmailMismatch,

    #[error("Passwords do not match")]
    PasswordsDoNotMatch,

    #[error("Password is required")]
    PasswordRequired,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Fields posted by the "choose a new password" form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSubmission {
    pub token: String,
    pub email: String,
    pub password: String,
    pub password_repeat: String,
}

pub struct PasswordResetService<U: PanelUser> {
    users: Arc<dyn UserStore<U>>,
    tokens: Arc<dyn ResetTokenStore>,
    mailer: Arc<dyn Mailer>,
    renderer: Arc<dyn Renderer>,
    config: Arc<PanelConfig>,
}

impl<U: PanelUser> Clone for PasswordResetService<U> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            tokens: Arc::clone(&self.tokens),
            mailer: Arc::clone(&self.mailer),
            renderer: Arc::clone(&self.renderer),
            config: Arc::clone(&self.config),
        }
    }
}

impl<U: PanelUser> PasswordResetService<U> {
    pub fn new(
        users: Arc<dyn UserStore<U>>,
        tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn Renderer>,
        config: Arc<PanelConfig>,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            renderer,
            config,
        }
    }

    /// Handle "forgot password" for `email`.
    ///
    /// Succeeds the same way whether or not an account exists; a token is
    /// only issued (and mailed) for a live user.
    #[instrument(skip(self))]
    pub async fn request_reset(&self, email: &str, now: DateTime<Utc>) -> Result<(), ResetError> {
        let email = email.trim();
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::info!("reset requested for unknown email");
            return Ok(());
        };

        let token = self.issue(user.email(), now).await?;

        match &self.config.email {
            Some(sender) => {
                let context = json!({
                    "name": self.config.panel_name,
                    "resetUrl": self.reset_url(&token.token),
                    "expireMinutes": reset_token::token_lifetime().num_minutes(),
                    "user": { "name": user.name(), "email": user.email() },
                });
                send_templated_email(
                    self.mailer.as_ref(),
                    self.renderer.as_ref(),
                    Address::new(sender.address.clone(), Some(sender.name.clone())),
                    Address::new(user.email(), Some(user.name().to_string())),
                    "Reset password",
                    templates::EMAIL_RESET_PASSWORD,
                    &context,
                )
                .await;
            }
            None => tracing::warn!("email disabled; reset token issued but not sent"),
        }

        Ok(())
    }

    /// Replace any earlier token for `email` with a fresh one.
    #[instrument(skip(self))]
    pub async fn issue(&self, email: &str, now: DateTime<Utc>) -> Result<ResetToken, ResetError> {
        let removed = self.tokens.delete_for_email(email).await?;
        let token = ResetToken::issue(email, now);
        self.tokens.save(&token).await?;
        tracing::debug!(removed, "reset token issued");
        Ok(token)
    }

    /// Look up a token that can still be used.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<ResetToken, ResetError> {
        match self.tokens.find_by_token(token).await? {
            Some(found) if found.can_be_used(now) => Ok(found),
            _ => Err(ResetError::TokenDoesNotExist),
        }
    }

    /// Mark the token used. Callers validate first.
    pub async fn consume(&self, token: &mut ResetToken, now: DateTime<Utc>) -> Result<(), ResetError> {
        token.mark_used(now);
        self.tokens.save(token).await?;
        Ok(())
    }

    /// Apply a submitted reset.
    ///
    /// Checks run in order and stop at the first failure, leaving the user's
    /// password untouched: token usable, token bound to the submitted email,
    /// passwords present and equal, account exists. Only then is the hash
    /// replaced and the token consumed. A successful reset also clears the
    /// forced-reset flag.
    #[instrument(skip_all, fields(email = %submission.email))]
    pub async fn reset_password(
        &self,
        submission: &ResetSubmission,
        now: DateTime<Utc>,
    ) -> Result<U, ResetError> {
        let mut token = self.validate(&submission.token, now).await?;

        if !token.email.eq_ignore_ascii_case(submission.email.trim()) {
            return Err(ResetError::EmailMismatch);
        }
        if submission.password.is_empty() {
            return Err(ResetError::PasswordRequired);
        }
        if submission.password != submission.password_repeat {
            return Err(ResetError::PasswordsDoNotMatch);
        }

        let mut user = self
            .users
            .find_by_email(&token.email)
            .await?
            .ok_or(ResetError::UserNotFound)?;

        user.set_password_hash(password::hash_password(&submission.password)?);
        user.set_should_reset_password(false);
        self.users.save(&user).await?;

        self.consume(&mut token, now).await?;
        tracing::info!("password reset completed");
        Ok(user)
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!("{}{RESET_PATH}/{token}", self.config.base_url)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use adminpanel_auth::AdminUser;
    use adminpanel_ui::PanelRenderer;

    use super::*;
    use crate::config::EmailSender;
    use crate::mail::OutboxMailer;
    use crate::store::{InMemoryResetTokenStore, InMemoryUserStore};

    struct Fixture {
        service: PasswordResetService<AdminUser>,
        users: Arc<InMemoryUserStore<AdminUser>>,
        tokens: Arc<InMemoryResetTokenStore>,
        outbox: Arc<OutboxMailer>,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::<AdminUser>::new());
        let tokens = Arc::new(InMemoryResetTokenStore::new());
        let outbox = Arc::new(OutboxMailer::new());
        let config = PanelConfig {
            base_url: "https://panel.test".into(),
            email: Some(EmailSender {
                address: "noreply@panel.test".into(),
                name: "Panel".into(),
            }),
            ..PanelConfig::default()
        };

        let user = AdminUser::new(
            "User",
            "Tester",
            "user@example.com",
            password::hash_password("old-password").unwrap(),
            "User",
            true,
        );
        users.save(&user).await.unwrap();

        Fixture {
            service: PasswordResetService::new(
                users.clone(),
                tokens.clone(),
                outbox.clone(),
                Arc::new(PanelRenderer),
                Arc::new(config),
            ),
            users,
            tokens,
            outbox,
        }
    }

    fn submission(token: &str) -> ResetSubmission {
        ResetSubmission {
            token: token.to_string(),
            email: "user@example.com".into(),
            password: "new-password".into(),
            password_repeat: "new-password".into(),
        }
    }

    #[tokio::test]
    async fn unknown_email_creates_nothing() {
        let f = fixture().await;
        f.service
            .request_reset("ghost@example.com", Utc::now())
            .await
            .unwrap();

        assert!(f.tokens.find_by_email("ghost@example.com").await.unwrap().is_empty());
        assert!(f.outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn request_mails_a_link_to_the_token() {
        let f = fixture().await;
        let now = Utc::now();
        f.service.request_reset("user@example.com", now).await.unwrap();

        let tokens = f.tokens.find_by_email("user@example.com").await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].expire_at, now + Duration::minutes(60));

        let sent = f.outbox.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains(&format!(
            "https://panel.test/admin/login/reset/{}",
            tokens[0].token
        )));
    }

    #[tokio::test]
    async fn second_issue_invalidates_the_first() {
        let f = fixture().await;
        let now = Utc::now();
        let first = f.service.issue("user@example.com", now).await.unwrap();
        let second = f.service.issue("user@example.com", now).await.unwrap();

        assert!(matches!(
            f.service.validate(&first.token, now).await,
            Err(ResetError::TokenDoesNotExist)
        ));
        assert_eq!(f.service.validate(&second.token, now).await.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn expired_and_consumed_tokens_fail_alike() {
        let f = fixture().await;
        let now = Utc::now();

        let expired = f.service.issue("user@example.com", now - Duration::hours(2)).await.unwrap();
        let expired_err = f.service.validate(&expired.token, now).await.unwrap_err();

        let mut used = f.service.issue("user@example.com", now).await.unwrap();
        f.service.consume(&mut used, now).await.unwrap();
        assert!(!used.can_be_used(now));
        let used_err = f.service.validate(&used.token, now).await.unwrap_err();

        let missing_err = f.service.validate("nope", now).await.unwrap_err();

        assert_eq!(expired_err.to_string(), "Token does not exist");
        assert_eq!(used_err.to_string(), expired_err.to_string());
        assert_eq!(missing_err.to_string(), expired_err.to_string());
    }

    #[tokio::test]
    async fn successful_reset_changes_hash_and_burns_token() {
        let f = fixture().await;
        let now = Utc::now();
        let token = f.service.issue("user@example.com", now).await.unwrap();

        let user = f.service.reset_password(&submission(&token.token), now).await.unwrap();
        assert!(password::verify_password("new-password", &user.password_hash).unwrap());
        assert!(!user.should_reset_password);

        let stored = f.users.find_by_email("user@example.com").await.unwrap().unwrap();
        assert!(password::verify_password("new-password", &stored.password_hash).unwrap());

        let replay = f.service.reset_password(&submission(&token.token), now).await;
        assert!(matches!(replay, Err(ResetError::TokenDoesNotExist)));
    }

    #[tokio::test]
    async fn failed_preconditions_leave_password_and_token_alone() {
        let f = fixture().await;
        let now = Utc::now();
        let token = f.service.issue("user@example.com", now).await.unwrap();

        let wrong_email = ResetSubmission {
            email: "other@example.com".into(),
            ..submission(&token.token)
        };
        assert!(matches!(
            f.service.reset_password(&wrong_email, now).await,
            Err(ResetError::EmailMismatch)
        ));

        let mismatch = ResetSubmission {
            password_repeat: "something-else".into(),
            ..submission(&token.token)
        };
        assert!(matches!(
            f.service.reset_password(&mismatch, now).await,
            Err(ResetError::PasswordsDoNotMatch)
        ));

        let stored = f.users.find_by_email("user@example.com").await.unwrap().unwrap();
        assert!(password::verify_password("old-password", &stored.password_hash).unwrap());
        assert!(f.service.validate(&token.token, now).await.is_ok());
    }

    #[tokio::test]
    async fn deleted_account_is_reported_after_token_checks() {
        let f = fixture().await;
        let now = Utc::now();
        let token = f.service.issue("user@example.com", now).await.unwrap();

        let mut user = f.users.find_by_email("user@example.com").await.unwrap().unwrap();
        adminpanel_core::SoftDeletable::soft_delete(&mut user, now);
        f.users.save(&user).await.unwrap();

        assert!(matches!(
            f.service.reset_password(&submission(&token.token), now).await,
            Err(ResetError::UserNotFound)
        ));
        assert!(f.service.validate(&token.token, now).await.is_ok());
    }
}
