//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, mailer, renderer and config shared by handlers
//! - `routes/`: handlers, one file per panel area
//! - `dto.rs`: form bodies and query strings
//! - `errors.rs` / `reply.rs`: error mapping and response-side session effects

use std::sync::Arc;

use axum::{
    Extension, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};

use adminpanel_auth::PanelUser;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod reply;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app<U: PanelUser>(services: Arc<AppServices<U>>) -> Router {
    // Secured routes: force password resets, redirect anonymous users to login.
    let secured = routes::secured::<U>().layer(from_fn_with_state(
        Arc::clone(&services),
        middleware::guard_middleware::<U>,
    ));

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public::<U>())
        .merge(secured)
        .fallback(routes::system::not_found)
        .layer(Extension(Arc::clone(&services)))
        .layer(from_fn_with_state(
            Arc::clone(&services),
            middleware::recover_not_found::<U>,
        ))
        .layer(from_fn_with_state(services, middleware::session_middleware::<U>));

    // Route matching is exact, so `/admin/dashboard/` must become
    // `/admin/dashboard` before the inner router sees it.
    Router::new()
        .fallback_service(app)
        .layer(from_fn(middleware::trim_trailing_slash))
}
