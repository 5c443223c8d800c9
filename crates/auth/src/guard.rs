//! Per-request session guard.
//!
//! The guard is a pure decision procedure; the HTTP layer runs
//! [`AuthSessionGuard::before`] ahead of every secured handler and uses
//! [`AuthSessionGuard::login_redirect`] to recover an authentication-required
//! signal raised by the handler.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use adminpanel_core::UserId;

use crate::PanelUser;

/// Flash shown when a user is forced to the password edit page.
pub const PASSWORD_RESET_REQUIRED: &str = "Please update your password";

/// Characters escaped in the `next` query value. `/` stays readable.
const NEXT_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// Outcome of the pre-handler check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Run the wrapped handler.
    Pass,
    /// Skip the handler and redirect to the actor's password edit page.
    ForcePasswordReset { location: String },
}

type EditPathFn = dyn Fn(&UserId) -> String + Send + Sync;

#[derive(Clone)]
pub struct AuthSessionGuard {
    login_path: String,
    password_edit_path: Arc<EditPathFn>,
}

impl fmt::Debug for AuthSessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSessionGuard")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

impl AuthSessionGuard {
    pub fn new(
        login_path: impl Into<String>,
        password_edit_path: impl Fn(&UserId) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            login_path: login_path.into(),
            password_edit_path: Arc::new(password_edit_path),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn password_edit_path(&self, id: &UserId) -> String {
        (self.password_edit_path)(id)
    }

    /// Decide whether the handler may run for `actor` on `path`.
    ///
    /// Only an authenticated actor flagged `should_reset_password` is
    /// diverted, and never while already on their own edit page. Paths are
    /// compared with surrounding slashes stripped.
    pub fn before<U: PanelUser>(&self, actor: Option<&U>, path: &str) -> GuardDecision {
        let Some(actor) = actor else {
            return GuardDecision::Pass;
        };
        if !actor.should_reset_password() {
            return GuardDecision::Pass;
        }

        let location = self.password_edit_path(actor.id());
        if trim_slashes(&location) == trim_slashes(path) {
            GuardDecision::Pass
        } else {
            GuardDecision::ForcePasswordReset { location }
        }
    }

    /// Login URL that returns to `original` after a successful login.
    pub fn login_redirect(&self, original: &str) -> String {
        format!(
            "{}?next={}",
            self.login_path,
            utf8_percent_encode(original, NEXT_VALUE)
        )
    }
}

/// Where to send a user after login: the captured `next` when it is a
/// non-empty local path, `default` otherwise.
pub fn post_login_target<'a>(next: Option<&'a str>, default: &'a str) -> &'a str {
    match next.map(str::trim) {
        Some(next) if is_local_path(next) => next,
        _ => default,
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

// Leading and trailing only; interior slashes stay significant.
fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdminUser;

    fn guard() -> AuthSessionGuard {
        AuthSessionGuard::new("/admin/login", |id| {
            format!("/admin/backend/users/{id}/edit")
        })
    }

    fn flagged_user() -> AdminUser {
        AdminUser::new("A", "T", "a@example.com", "hash", "User", true)
    }

    #[test]
    fn anonymous_requests_pass() {
        assert_eq!(
            guard().before::<AdminUser>(None, "/admin/dashboard"),
            GuardDecision::Pass
        );
    }

    #[test]
    fn unflagged_actor_passes() {
        let user = AdminUser::new("A", "T", "a@example.com", "hash", "User", false);
        assert_eq!(guard().before(Some(&user), "/admin/dashboard"), GuardDecision::Pass);
    }

    #[test]
    fn flagged_actor_is_forced_to_edit_page_from_anywhere() {
        let user = flagged_user();
        let expected = format!("/admin/backend/users/{}/edit", user.id);

        for path in ["/admin/dashboard", "/admin/dashboard/", "/", "/admin/backend/users"] {
            assert_eq!(
                guard().before(Some(&user), path),
                GuardDecision::ForcePasswordReset {
                    location: expected.clone()
                },
                "path {path}"
            );
        }
    }

    #[test]
    fn own_edit_page_is_reachable_with_or_without_trailing_slash() {
        let user = flagged_user();
        let edit = format!("/admin/backend/users/{}/edit", user.id);

        assert_eq!(guard().before(Some(&user), &edit), GuardDecision::Pass);
        assert_eq!(guard().before(Some(&user), &format!("{edit}/")), GuardDecision::Pass);
        assert_eq!(
            guard().before(Some(&user), edit.trim_start_matches('/')),
            GuardDecision::Pass
        );
    }

    #[test]
    fn login_redirect_carries_original_path() {
        assert_eq!(
            guard().login_redirect("/admin/backend/users"),
            "/admin/login?next=/admin/backend/users"
        );
        assert_eq!(
            guard().login_redirect("/admin/x?a=1&b=2"),
            "/admin/login?next=/admin/x%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn post_login_target_prefers_local_next() {
        let default = "/admin/dashboard";
        assert_eq!(post_login_target(Some("/admin/backend/users"), default), "/admin/backend/users");
        assert_eq!(post_login_target(Some(""), default), default);
        assert_eq!(post_login_target(None, default), default);
        assert_eq!(post_login_target(Some("https://evil.example"), default), default);
        assert_eq!(post_login_target(Some("//evil.example"), default), default);
    }
}
