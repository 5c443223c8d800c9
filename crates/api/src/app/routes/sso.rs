//! Single sign-on.
//!
//! Local environments (or requests to a localhost host) skip the identity
//! provider and log in as the oldest user. Everywhere else the browser goes
//! to the provider, which calls back with `token` and `email`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, header},
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use adminpanel_auth::{PanelUser, sso};
use adminpanel_ui::Flash;

use crate::app::dto::SsoCallbackQuery;
use crate::app::errors::{ApiError, boundary};
use crate::app::reply::{FlashResponse, SessionChange, redirect};
use crate::app::services::AppServices;

pub const NO_USERS: &str = "No users found. Run the seeder first.";

/// `GET /admin/login/sso`
pub async fn login<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let config = &services.config;
    let Some(sso_config) = &config.sso else {
        return Err(ApiError::NotFound);
    };

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if config.env.is_local() || sso::is_localhost(host) {
        let first = services
            .users
            .first()
            .await
            .map_err(boundary(config, "Failed to log in", &config.login_path))?;

        return Ok(match first {
            Some(user) => redirect(&config.dashboard_path)
                .flash(Flash::success(format!("Logged in as {}", user.email())))
                .session(SessionChange::Login(*user.id())),
            None => redirect(&config.login_path).flash(Flash::error(NO_USERS)),
        });
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    let callback = format!("{scheme}://{host}{}", sso_config.callback_path);

    Ok(redirect(&format!(
        "{}?redirect_url={}",
        sso_config.redirect_url,
        utf8_percent_encode(&callback, NON_ALPHANUMERIC)
    )))
}

/// `GET|POST /admin/login/sso/callback?token=...&email=...`
pub async fn callback<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Query(query): Query<SsoCallbackQuery>,
) -> Result<Response, ApiError> {
    let config = &services.config;
    let Some(sso_config) = &config.sso else {
        return Err(ApiError::NotFound);
    };

    let email = query.email.as_deref().map(str::trim);
    if let Err(err) = sso::verify_callback(&sso_config.salt, email, query.token.as_deref()) {
        tracing::warn!(error = %err, "sso callback rejected");
        return Ok(redirect(&config.login_path).flash(Flash::error(err.to_string())));
    }
    let email = email.unwrap_or_default();

    const ACTION: &str = "Failed to log in";
    let existing = services
        .users
        .find_by_email(email)
        .await
        .map_err(boundary(config, ACTION, &config.login_path))?;

    let user = match existing {
        Some(user) => user,
        None => {
            let user = U::make_sso_user(email).map_err(boundary(config, ACTION, &config.login_path))?;
            services
                .users
                .save(&user)
                .await
                .map_err(boundary(config, ACTION, &config.login_path))?;
            tracing::info!(user_id = %user.id(), "provisioned sso user");
            user
        }
    };

    Ok(redirect(&config.dashboard_path)
        .flash(Flash::success(format!("Logged in as {}", user.email())))
        .session(SessionChange::Login(*user.id())))
}
