use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;

use adminpanel_auth::PanelUser;
use adminpanel_ui::Flash;

use crate::app::errors::ApiError;

/// Authenticated panel user for a request.
///
/// Inserted by the session middleware when the session points at a live user.
#[derive(Debug, Clone)]
pub struct ActorContext<U> {
    user: U,
}

impl<U: PanelUser> ActorContext<U> {
    pub fn new(user: U) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &U {
        &self.user
    }
}

/// One-shot state carried over from the previous response, plus the path
/// used for sidebar highlighting.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub path: String,
    pub flash: Vec<Flash>,
    pub fieldset: Option<Value>,
    /// Latest activity feed entries; only loaded for authenticated requests.
    pub actions: Vec<Value>,
}

/// Extractor for handlers that need a logged-in user.
///
/// Rejects with [`ApiError::AuthenticationRequired`], which the session guard
/// turns into a login redirect.
#[derive(Debug, Clone)]
pub struct Actor<U>(pub U);

#[axum::async_trait]
impl<S, U> FromRequestParts<S> for Actor<U>
where
    S: Send + Sync,
    U: PanelUser,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext<U>>()
            .map(|ctx| Actor(ctx.user().clone()))
            .ok_or(ApiError::AuthenticationRequired)
    }
}
