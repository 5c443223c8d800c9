use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use adminpanel_core::{Entity, TokenId};

use crate::random::random_string;

/// Length of the opaque token string.
pub const TOKEN_LENGTH: usize = 64;

/// How long an issued token stays usable.
pub fn token_lifetime() -> Duration {
    Duration::hours(1)
}

/// Single-use password reset token bound to an email.
///
/// # Invariants
/// - Usable iff `used_at` is unset and `now < expire_at`.
/// - Expiry is never stored as a state; it is evaluated lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub id: TokenId,
    pub email: String,
    pub token: String,
    pub expire_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    /// Fresh random token for `email`, expiring one hour after `now`.
    ///
    /// Persisting it (and removing earlier tokens for the same email) is the
    /// store's job.
    pub fn issue(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: TokenId::new(),
            email: email.into(),
            token: random_string(TOKEN_LENGTH),
            expire_at: now + token_lifetime(),
            used_at: None,
            created_at: now,
        }
    }

    pub fn can_be_used(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expire_at
    }

    /// Mark the token consumed. Callers re-check [`Self::can_be_used`] first.
    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        self.used_at = Some(now);
    }
}

impl Entity for ResetToken {
    type Id = TokenId;

    fn id(&self) -> &TokenId {
        &self.id
    }
}
