//! Activity feed: short audit lines written by user-management actions and
//! shown on authenticated pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use adminpanel_auth::PanelUser;
use adminpanel_core::{ActivityId, UserId};

use crate::StoreError;
use crate::store::{ActivityStore, UserStore};

/// Number of entries exposed to rendered pages.
pub const FEED_LENGTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    /// Author name at the time of the action.
    pub name: String,
    pub user_id: UserId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn new<U: PanelUser>(author: &U, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ActivityId::new(),
            name: author.name().to_string(),
            user_id: *author.id(),
            message: message.into(),
            created_at: now,
        }
    }
}

/// Record an activity. Failures are logged and swallowed: the action that
/// triggered the report already happened.
pub async fn report<U: PanelUser>(
    store: &dyn ActivityStore,
    author: &U,
    message: impl Into<String>,
) {
    let activity = Activity::new(author, message, Utc::now());
    if let Err(e) = store.record(&activity).await {
        tracing::error!(error = %e, user_id = %activity.user_id, "failed to record activity");
    }
}

/// The latest [`FEED_LENGTH`] activities, newest first, each with its
/// author's view attached (`null` when the author no longer exists).
pub async fn feed<U: PanelUser>(
    activities: &dyn ActivityStore,
    users: &dyn UserStore<U>,
) -> Result<Vec<Value>, StoreError> {
    let mut out = Vec::new();
    for activity in activities.latest(FEED_LENGTH).await? {
        let author = users
            .find_by_id_with_deleted(&activity.user_id)
            .await?
            .map(|u| u.view());
        out.push(json!({
            "id": activity.id.to_string(),
            "name": activity.name,
            "message": activity.message,
            "createdAt": activity.created_at.to_rfc3339(),
            "author": author,
        }));
    }
    Ok(out)
}
