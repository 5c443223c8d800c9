//! Request pipeline: session, guard and not-found recovery.
//!
//! Outermost first:
//!
//! 0. [`trim_trailing_slash`] runs before routing.
//! 1. [`session_middleware`] loads the session, resolves the actor (and the
//!    activity feed for it) and persists whatever the response asks for.
//! 2. [`recover_not_found`] turns "not found" into a dashboard redirect.
//! 3. [`guard_middleware`] (secured routes only) forces password resets and
//!    turns "authentication required" into a login redirect.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, Uri, header, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use cookie::{Cookie, SameSite};

use adminpanel_auth::{GuardDecision, PanelUser, guard::PASSWORD_RESET_REQUIRED};
use adminpanel_infra::{Session, activity};
use adminpanel_ui::Flash;

use crate::app::errors::{AuthenticationRequiredSignal, NotFoundSignal};
use crate::app::reply::{FieldsetOut, FlashOut, FlashResponse, Rendered, SessionChange, redirect};
use crate::app::services::AppServices;
use crate::context::{ActorContext, PageState};

pub const SESSION_COOKIE: &str = "adminpanel_session";
pub const PAGE_NOT_FOUND: &str = "Page not found";

pub async fn session_middleware<U: PanelUser>(
    State(services): State<Arc<AppServices<U>>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let now = Utc::now();

    let loaded = match session_cookie(req.headers()) {
        Some(id) => services.sessions.load(&id).await,
        None => Ok(None),
    };
    let (mut session, mut is_new) = match loaded {
        Ok(Some(expired)) if expired.is_expired(now, services.config.session_idle_timeout) => {
            tracing::debug!("session expired");
            if let Err(err) = services.sessions.delete(&expired.id).await {
                tracing::error!(error = %err, "failed to drop expired session");
            }
            (Session::new(now), true)
        }
        Ok(Some(session)) => (session, false),
        Ok(None) => (Session::new(now), true),
        Err(err) => {
            tracing::error!(error = %err, "failed to load session");
            (Session::new(now), true)
        }
    };

    let (flash, fieldset) = session.take_one_shot();

    let mut actions = Vec::new();
    if let Some(user_id) = session.user_id {
        match services.users.find_by_id(&user_id).await {
            Ok(Some(user)) => {
                let feed =
                    activity::feed(services.activities.as_ref(), services.users.as_ref()).await;
                actions = feed.unwrap_or_else(|err| {
                    tracing::error!(error = %err, "failed to load activity feed");
                    Vec::new()
                });
                req.extensions_mut().insert(ActorContext::new(user));
            }
            Ok(None) => {
                tracing::debug!(%user_id, "session user no longer live");
                session.user_id = None;
            }
            Err(err) => tracing::error!(error = %err, "failed to resolve session user"),
        }
    }

    let path = req.uri().path().to_string();
    req.extensions_mut().insert(PageState {
        path,
        flash: flash.clone(),
        fieldset: fieldset.clone(),
        actions,
    });

    let mut res = next.run(req).await;

    // Only a rendered page consumes the pending one-shot state.
    if res.extensions().get::<Rendered>().is_none() {
        session.flash = flash;
        session.fieldset = fieldset;
    }
    if let Some(FlashOut(items)) = res.extensions_mut().remove::<FlashOut>() {
        session.flash.extend(items);
    }
    if let Some(FieldsetOut(value)) = res.extensions_mut().remove::<FieldsetOut>() {
        session.fieldset = Some(value);
    }

    match res.extensions_mut().remove::<SessionChange>() {
        Some(SessionChange::Login(user_id)) => {
            // Fresh id on login.
            if !is_new {
                if let Err(err) = services.sessions.delete(&session.id).await {
                    tracing::error!(error = %err, "failed to drop previous session");
                }
            }
            let mut fresh = Session::new(now);
            fresh.user_id = Some(user_id);
            fresh.flash = std::mem::take(&mut session.flash);
            fresh.fieldset = session.fieldset.take();
            session = fresh;
            is_new = true;
        }
        Some(SessionChange::Logout) => session.user_id = None,
        None => {}
    }

    // Nothing worth keeping: never store it, and drop a stored one.
    if session.is_empty() {
        if !is_new {
            if let Err(err) = services.sessions.delete(&session.id).await {
                tracing::error!(error = %err, "failed to drop empty session");
            }
            let mut removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
            removal.make_removal();
            set_cookie(&mut res, &removal);
        }
        return res;
    }

    session.updated_at = now;
    if let Err(err) = services.sessions.save(&session).await {
        tracing::error!(error = %err, "failed to save session");
        return res;
    }

    if is_new {
        let cookie = Cookie::build((SESSION_COOKIE, session.id.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        set_cookie(&mut res, &cookie);
    }

    res
}

fn set_cookie(res: &mut Response, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(err) => tracing::error!(error = %err, "invalid session cookie"),
    }
}

pub async fn guard_middleware<U: PanelUser>(
    State(services): State<Arc<AppServices<U>>>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let original = req
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let decision = {
        let actor = req.extensions().get::<ActorContext<U>>();
        services.guard.before(actor.map(|a| a.user()), &path)
    };

    match decision {
        GuardDecision::ForcePasswordReset { location } => {
            tracing::debug!(%path, "password reset required");
            redirect(&location).flash(Flash::error(PASSWORD_RESET_REQUIRED))
        }
        GuardDecision::Pass => {
            let res = next.run(req).await;
            if res.extensions().get::<AuthenticationRequiredSignal>().is_some() {
                redirect(&services.guard.login_redirect(&original))
            } else {
                res
            }
        }
    }
}

pub async fn recover_not_found<U: PanelUser>(
    State(services): State<Arc<AppServices<U>>>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let res = next.run(req).await;
    if res.extensions().get::<NotFoundSignal>().is_some() {
        return redirect(&services.config.dashboard_path).flash(Flash::error(PAGE_NOT_FOUND));
    }
    res
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Drop trailing slashes from the path (`/admin/users/` -> `/admin/users`),
/// keeping the query string.
pub async fn trim_trailing_slash(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(uri) = trimmed_uri(req.uri()) {
        *req.uri_mut() = uri;
    }
    next.run(req).await
}

fn trimmed_uri(uri: &Uri) -> Option<Uri> {
    let path = uri.path();
    if path.len() <= 1 || !path.ends_with('/') {
        return None;
    }
    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    let rebuilt = match uri.query() {
        Some(query) => format!("{trimmed}?{query}"),
        None => trimmed.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(rebuilt).ok()?);
    Uri::from_parts(parts).ok()
}
