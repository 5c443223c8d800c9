use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Path},
    response::Response,
};
use chrono::Utc;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::json;

use adminpanel_auth::PanelUser;
use adminpanel_infra::reset::{PASSWORD_RESET_DONE, RESET_PATH, RESET_REQUESTED};
use adminpanel_infra::ResetError;
use adminpanel_ui::{Flash, templates};

use crate::app::dto::{ResetChangeBody, ResetRequestBody};
use crate::app::errors::{ApiError, boundary};
use crate::app::reply::{FlashResponse, redirect};
use crate::app::services::AppServices;
use crate::context::PageState;

/// `GET /admin/login/reset`
pub async fn show<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
) -> Result<Response, ApiError> {
    services.render(templates::RESET_REQUEST, &page, None, json!({}))
}

/// `POST /admin/login/reset`. Same answer whether or not the email exists.
pub async fn request<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Form(body): Form<ResetRequestBody>,
) -> Result<Response, ApiError> {
    services
        .reset
        .request_reset(&body.email, Utc::now())
        .await
        .map_err(boundary(&services.config, "Failed to request password reset", RESET_PATH))?;

    Ok(redirect(&services.config.login_path).flash(Flash::success(RESET_REQUESTED)))
}

/// `GET /admin/login/reset/:token`
pub async fn form<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    match services.reset.validate(&token, Utc::now()).await {
        Ok(found) => services.render(
            templates::RESET_CHANGE,
            &page,
            None,
            json!({ "token": found.token }),
        ),
        Err(ResetError::TokenDoesNotExist) => Ok(redirect(&services.config.login_path)
            .flash(Flash::error(ResetError::TokenDoesNotExist.to_string()))),
        Err(err) => Err(boundary(&services.config, "Failed to load password reset", RESET_PATH)(err)),
    }
}

/// `POST /admin/login/reset/change`
pub async fn change<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Form(body): Form<ResetChangeBody>,
) -> Result<Response, ApiError> {
    let config = &services.config;
    let back = format!(
        "{RESET_PATH}/{}",
        utf8_percent_encode(&body.token, NON_ALPHANUMERIC)
    );

    match services.reset.reset_password(&body.into(), Utc::now()).await {
        Ok(_) => Ok(redirect(&config.login_path).flash(Flash::success(PASSWORD_RESET_DONE))),
        Err(
            err @ (ResetError::EmailMismatch
            | ResetError::PasswordsDoNotMatch
            | ResetError::PasswordRequired),
        ) => Ok(redirect(&back).flash(Flash::error(err.to_string()))),
        Err(err @ (ResetError::TokenDoesNotExist | ResetError::UserNotFound)) => {
            Ok(redirect(&config.login_path).flash(Flash::error(err.to_string())))
        }
        Err(err) => Err(boundary(config, "Failed to reset password", &back)(err)),
    }
}
