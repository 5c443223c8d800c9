//! Data-access seams for users, reset tokens, sessions and the activity feed.
//!
//! Each seam has an in-memory implementation for tests/dev and, behind the
//! `postgres` feature, an sqlx-backed one. Statements are independent: no
//! operation here wraps several writes in a transaction.

use async_trait::async_trait;

use adminpanel_auth::{PanelUser, ResetToken, Role};
use adminpanel_core::UserId;

use crate::StoreError;
use crate::activity::Activity;
use crate::session::Session;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{
    InMemoryActivityStore, InMemoryResetTokenStore, InMemorySessionStore, InMemoryUserStore,
};
#[cfg(feature = "postgres")]
pub use postgres::{
    PostgresActivityStore, PostgresResetTokenStore, PostgresSessionStore, PostgresUserStore,
    migrate,
};

/// Panel users. Lookups only see live (not soft-deleted) users unless the
/// method name says otherwise.
#[async_trait]
pub trait UserStore<U: PanelUser>: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<U>, StoreError>;

    async fn find_by_id_with_deleted(&self, id: &UserId) -> Result<Option<U>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<U>, StoreError>;

    /// Oldest live user.
    async fn first(&self) -> Result<Option<U>, StoreError>;

    /// All live users, oldest first.
    async fn list(&self) -> Result<Vec<U>, StoreError>;

    /// Insert or update. Fails with `Conflict` when another live user owns
    /// the same email.
    async fn save(&self, user: &U) -> Result<(), StoreError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<U>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|u| u.role() == Some(role))
            .collect())
    }

    /// Whether a live user other than `except` already uses `email`.
    async fn email_taken(&self, email: &str, except: Option<&UserId>) -> Result<bool, StoreError> {
        Ok(self
            .find_by_email(email)
            .await?
            .is_some_and(|u| Some(u.id()) != except))
    }
}

/// Password reset tokens.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<ResetToken>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<ResetToken>, StoreError>;

    /// Remove every token issued for `email`; returns how many were removed.
    async fn delete_for_email(&self, email: &str) -> Result<u64, StoreError>;

    /// Insert or update by token id.
    async fn save(&self, token: &ResetToken) -> Result<(), StoreError>;
}

/// Server-side session records keyed by the cookie value.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError>;

    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Append-only activity log.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record(&self, activity: &Activity) -> Result<(), StoreError>;

    /// Up to `limit` entries, newest first.
    async fn latest(&self, limit: usize) -> Result<Vec<Activity>, StoreError>;
}
