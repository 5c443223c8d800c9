use axum::{
    Router,
    routing::{get, post},
};

use adminpanel_auth::PanelUser;

pub mod dashboard;
pub mod login;
pub mod reset;
pub mod sso;
pub mod system;
pub mod users;

/// Routes reachable without a session: login, password reset and SSO.
pub fn public<U: PanelUser>() -> Router {
    Router::new()
        .route("/", get(login::landing::<U>))
        .route("/admin", get(login::landing::<U>))
        .route("/admin/login", get(login::show::<U>).post(login::submit::<U>))
        .route("/admin/login/reset", get(reset::show::<U>).post(reset::request::<U>))
        .route("/admin/login/reset/change", post(reset::change::<U>))
        .route("/admin/login/reset/:token", get(reset::form::<U>))
        .route("/admin/login/sso", get(sso::login::<U>))
        .route(
            "/admin/login/sso/callback",
            get(sso::callback::<U>).post(sso::callback::<U>),
        )
}

/// Routes behind the session guard.
pub fn secured<U: PanelUser>() -> Router {
    Router::new()
        .route("/admin/dashboard", get(dashboard::index::<U>))
        .merge(users::router::<U>())
}
