//! In-memory stores for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use adminpanel_auth::{PanelUser, ResetToken};
use adminpanel_core::{Entity, TokenId, UserId};

use super::{ActivityStore, ResetTokenStore, SessionStore, UserStore};
use crate::StoreError;
use crate::activity::Activity;
use crate::session::Session;

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct InMemoryUserStore<U> {
    inner: RwLock<HashMap<UserId, U>>,
}

impl<U> InMemoryUserStore<U> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<U> Default for InMemoryUserStore<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: PanelUser> InMemoryUserStore<U> {
    fn live_sorted(&self) -> Result<Vec<U>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned("users"))?;
        let mut users: Vec<U> = map.values().filter(|u| !u.is_deleted()).cloned().collect();
        users.sort_by_key(|u| (u.created_at(), *u.id()));
        Ok(users)
    }
}

#[async_trait]
impl<U: PanelUser> UserStore<U> for InMemoryUserStore<U> {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<U>, StoreError> {
        Ok(self
            .find_by_id_with_deleted(id)
            .await?
            .filter(|u| !u.is_deleted()))
    }

    async fn find_by_id_with_deleted(&self, id: &UserId) -> Result<Option<U>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned("users"))?;
        Ok(map.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<U>, StoreError> {
        Ok(self.live_sorted()?.into_iter().find(|u| u.email() == email))
    }

    async fn first(&self) -> Result<Option<U>, StoreError> {
        Ok(self.live_sorted()?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<U>, StoreError> {
        self.live_sorted()
    }

    async fn save(&self, user: &U) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned("users"))?;

        if !user.is_deleted() {
            let taken = map
                .values()
                .any(|u| !u.is_deleted() && u.email() == user.email() && u.id() != user.id());
            if taken {
                return Err(StoreError::Conflict(format!(
                    "email {} already in use",
                    user.email()
                )));
            }
        }

        map.insert(*user.id(), user.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reset tokens
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryResetTokenStore {
    inner: RwLock<HashMap<TokenId, ResetToken>>,
}

impl InMemoryResetTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResetTokenStore for InMemoryResetTokenStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<ResetToken>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned("reset tokens"))?;
        Ok(map.values().find(|t| t.token == token).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<ResetToken>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned("reset tokens"))?;
        Ok(map.values().filter(|t| t.email == email).cloned().collect())
    }

    async fn delete_for_email(&self, email: &str) -> Result<u64, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned("reset tokens"))?;
        let before = map.len();
        map.retain(|_, t| t.email != email);
        Ok((before - map.len()) as u64)
    }

    async fn save(&self, token: &ResetToken) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned("reset tokens"))?;
        map.insert(*token.id(), token.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned("sessions"))?;
        Ok(map.get(id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned("sessions"))?;
        map.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned("sessions"))?;
        map.remove(id);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Activities
// ─────────────────────────────────────────────────────────────────────────────

/// Activities in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    inner: RwLock<Vec<Activity>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn record(&self, activity: &Activity) -> Result<(), StoreError> {
        let mut log = self.inner.write().map_err(|_| StoreError::poisoned("activities"))?;
        log.push(activity.clone());
        Ok(())
    }

    async fn latest(&self, limit: usize) -> Result<Vec<Activity>, StoreError> {
        let log = self.inner.read().map_err(|_| StoreError::poisoned("activities"))?;
        Ok(log.iter().rev().take(limit).cloned().collect())
    }
}
