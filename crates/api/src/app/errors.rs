//! Error boundary for panel handlers.
//!
//! | ApiError | Response | Recovered by |
//! |---|---|---|
//! | `NotFound` | 404 + [`NotFoundSignal`] | not-found middleware: redirect to dashboard |
//! | `AuthenticationRequired` | 401 + [`AuthenticationRequiredSignal`] | session guard: redirect to login with `next` |
//! | `Failed` | redirect + error flash | n/a |
//! | `Render` | 500 | n/a |

use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use adminpanel_core::DomainError;
use adminpanel_infra::PanelConfig;
use adminpanel_ui::{Flash, RenderError};

use crate::app::reply::{FlashResponse, redirect};

/// Response marker: the handler reported "not found" (or "not allowed").
#[derive(Debug, Clone, Copy)]
pub struct NotFoundSignal;

/// Response marker: the handler needs an authenticated actor.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticationRequiredSignal;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("authentication required")]
    AuthenticationRequired,

    /// Caught at the controller boundary; shown to the user as a flash.
    #[error("{message}")]
    Failed { message: String, redirect: String },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::AuthenticationRequired => ApiError::AuthenticationRequired,
            _ => ApiError::NotFound,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => {
                let mut res = (StatusCode::NOT_FOUND, Html("Not found")).into_response();
                res.extensions_mut().insert(NotFoundSignal);
                res
            }
            ApiError::AuthenticationRequired => {
                let mut res =
                    (StatusCode::UNAUTHORIZED, Html("Authentication required")).into_response();
                res.extensions_mut().insert(AuthenticationRequiredSignal);
                res
            }
            ApiError::Failed { message, redirect: to } => {
                redirect(&to).flash(Flash::error(message))
            }
            ApiError::Render(err) => {
                tracing::error!(error = %err, "failed to render page");
                (StatusCode::INTERNAL_SERVER_ERROR, Html("Internal server error")).into_response()
            }
        }
    }
}

/// User-facing text for an unexpected failure while performing `action`.
///
/// Production hides the cause; every other environment shows it.
pub fn boundary_message(action: &str, err: &dyn Display, production: bool) -> String {
    if production {
        format!("{action}: internal server error.")
    } else {
        format!("{action}: {err}")
    }
}

/// Map an unexpected error into a redirect to `to` with a boundary flash.
///
/// Intended for `map_err`: `.map_err(boundary(&config, "Failed to create user", path))?`.
pub fn boundary<E: Display>(
    config: &PanelConfig,
    action: &str,
    to: &str,
) -> impl FnOnce(E) -> ApiError {
    let production = config.env.is_production();
    let action = action.to_string();
    let to = to.to_string();
    move |err| {
        tracing::error!(action = %action, error = %err, "request failed");
        ApiError::Failed {
            message: boundary_message(&action, &err, production),
            redirect: to,
        }
    }
}
