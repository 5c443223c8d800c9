use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use adminpanel_auth::random::random_string;
use adminpanel_core::UserId;
use adminpanel_ui::Flash;

/// Length of the opaque session id stored in the cookie.
pub const SESSION_ID_LENGTH: usize = 48;

/// Server-side session state.
///
/// `flash` and `fieldset` are one-shot: they are written by one response and
/// consumed by the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: Option<UserId>,
    pub flash: Vec<Flash>,
    pub fieldset: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: random_string(SESSION_ID_LENGTH),
            user_id: None,
            flash: Vec::new(),
            fieldset: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Remove and return the pending flash messages and fieldset.
    pub fn take_one_shot(&mut self) -> (Vec<Flash>, Option<serde_json::Value>) {
        (std::mem::take(&mut self.flash), self.fieldset.take())
    }

    /// Untouched for longer than `idle`.
    pub fn is_expired(&self, now: DateTime<Utc>, idle: Duration) -> bool {
        now - self.updated_at > idle
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.flash.is_empty() && self.fieldset.is_none()
    }
}
