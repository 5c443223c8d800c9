use std::sync::Arc;

use axum::{extract::Extension, response::Response};
use serde_json::json;

use adminpanel_auth::PanelUser;
use adminpanel_ui::templates;

use crate::app::errors::{ApiError, boundary};
use crate::app::services::AppServices;
use crate::context::{Actor, PageState};

pub async fn index<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    Actor(actor): Actor<U>,
) -> Result<Response, ApiError> {
    let users = services
        .users
        .list()
        .await
        .map_err(boundary(&services.config, "Failed to load dashboard", &services.config.login_path))?;

    services.render(
        templates::DASHBOARD,
        &page,
        Some(&actor),
        json!({ "stats": { "users": users.len() } }),
    )
}
