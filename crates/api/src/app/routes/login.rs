use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Query},
    response::Response,
};
use serde_json::json;

use adminpanel_auth::{PanelUser, password, post_login_target};
use adminpanel_ui::{Flash, templates};

use crate::app::dto::{LoginBody, NextQuery};
use crate::app::errors::{ApiError, boundary};
use crate::app::reply::{FlashResponse, SessionChange, redirect};
use crate::app::services::AppServices;
use crate::context::{ActorContext, PageState};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// `GET /` and `GET /admin`.
pub async fn landing<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    actor: Option<Extension<ActorContext<U>>>,
) -> Result<Response, ApiError> {
    if actor.is_some() {
        return Ok(redirect(&services.config.dashboard_path));
    }
    services.render(templates::LOGIN, &page, None, json!({ "collapse": true }))
}

/// `GET /admin/login?next=...`
pub async fn show<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    actor: Option<Extension<ActorContext<U>>>,
    Query(query): Query<NextQuery>,
) -> Result<Response, ApiError> {
    if actor.is_some() {
        let target = post_login_target(query.next.as_deref(), &services.config.dashboard_path);
        return Ok(redirect(target));
    }
    services.render(
        templates::LOGIN,
        &page,
        None,
        json!({ "next": query.next.unwrap_or_default() }),
    )
}

/// `POST /admin/login`
pub async fn submit<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Form(body): Form<LoginBody>,
) -> Result<Response, ApiError> {
    let config = &services.config;
    const ACTION: &str = "Failed to log in";

    let user = services
        .users
        .find_by_email(body.email.trim())
        .await
        .map_err(boundary(config, ACTION, &config.login_path))?;

    let verified = match &user {
        Some(user) => password::verify_password(&body.password, user.password_hash())
            .map_err(boundary(config, ACTION, &config.login_path))?,
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!("login rejected");
        let back = match body.next.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(next) => services.guard.login_redirect(next),
            None => config.login_path.clone(),
        };
        return Ok(redirect(&back).flash(Flash::error(INVALID_CREDENTIALS)));
    };

    tracing::info!(user_id = %user.id(), "logged in");
    let target = post_login_target(body.next.as_deref(), &config.dashboard_path);
    Ok(redirect(target).session(SessionChange::Login(*user.id())))
}
