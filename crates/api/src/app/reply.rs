//! Response-side session effects.
//!
//! Handlers never touch the session directly. They attach flash messages,
//! a fieldset or a login/logout change to the response, and the session
//! middleware persists them once the handler has returned.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use adminpanel_core::UserId;
use adminpanel_ui::Flash;

/// Flash messages to show on the next rendered page.
#[derive(Debug, Clone, Default)]
pub struct FlashOut(pub Vec<Flash>);

/// Form state to restore on the next rendered page.
#[derive(Debug, Clone)]
pub struct FieldsetOut(pub Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Login(UserId),
    Logout,
}

/// Marks a response as a rendered page, which consumes pending one-shot state.
#[derive(Debug, Clone, Copy)]
pub struct Rendered;

/// `303 See Other` to `location`. A target that cannot be a header value
/// (user-supplied `next`, for instance) falls back to `/`.
pub fn redirect(location: &str) -> Response {
    let value = HeaderValue::from_str(location).unwrap_or_else(|_| {
        tracing::warn!(location, "unusable redirect target");
        HeaderValue::from_static("/")
    });
    (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response()
}

pub trait FlashResponse {
    fn flash(self, flash: Flash) -> Response;
    fn fieldset(self, fieldset: Value) -> Response;
    fn session(self, change: SessionChange) -> Response;
}

impl FlashResponse for Response {
    fn flash(mut self, flash: Flash) -> Response {
        match self.extensions_mut().get_mut::<FlashOut>() {
            Some(out) => out.0.push(flash),
            None => {
                self.extensions_mut().insert(FlashOut(vec![flash]));
            }
        }
        self
    }

    fn fieldset(mut self, fieldset: Value) -> Response {
        self.extensions_mut().insert(FieldsetOut(fieldset));
        self
    }

    fn session(mut self, change: SessionChange) -> Response {
        self.extensions_mut().insert(change);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashes_accumulate_on_a_redirect() {
        let res = redirect("/admin/login")
            .flash(Flash::info("Logged out"))
            .flash(Flash::error("Second"));

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/admin/login");
        let out = res.extensions().get::<FlashOut>().unwrap();
        assert_eq!(out.0.len(), 2);
        assert_eq!(out.0[0].message, "Logged out");
    }

    #[test]
    fn unusable_target_falls_back_to_root() {
        let res = redirect("/admin/\nx");
        assert_eq!(res.headers()["location"], "/");
    }
}
