//! Backend user management.
//!
//! Listing, creating, deleting and restoring need `Admin`. Editing is open to
//! admins and to the user themself; a user never changes their own role.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Form, Path},
    response::Response,
    routing::get,
};
use chrono::Utc;
use serde_json::{Value, json};

use adminpanel_auth::{
    Fieldset, Gate, PanelUser, Role, UserForm, form::EMAIL_TAKEN, password, random::random_string,
};
use adminpanel_core::UserId;
use adminpanel_infra::{Address, StoreError};
use adminpanel_ui::{Flash, templates};

use crate::app::dto::UserFormBody;
use crate::app::errors::{ApiError, boundary};
use crate::app::reply::{FlashResponse, SessionChange, redirect};
use crate::app::services::AppServices;
use crate::context::{Actor, PageState};

pub const USERS_PATH: &str = "/admin/backend/users";
pub const USER_NOT_FOUND: &str = "User not found";
pub const VALIDATION_ERROR: &str = "Validation error";
pub const PICK_NEW_PASSWORD: &str = "Please pick a new password";
pub const CANNOT_DELETE_SELF: &str = "Cannot delete yourself";
pub const ROLE_NOT_ALLOWED: &str = "You are not allowed to assign this role.";

const GENERATED_PASSWORD_LENGTH: usize = 12;

pub fn router<U: PanelUser>() -> Router {
    Router::new()
        .route(USERS_PATH, get(index::<U>))
        .route("/admin/backend/users/create", get(create::<U>))
        .route("/admin/backend/users/store", axum::routing::post(store::<U>))
        .route("/admin/backend/users/logout", get(logout::<U>))
        .route(
            "/admin/backend/users/:id/edit",
            get(edit::<U>).post(update::<U>),
        )
        .route("/admin/backend/users/:id/delete", get(delete::<U>))
        .route("/admin/backend/users/:id/restore", get(restore::<U>))
}

fn edit_path(id: &UserId) -> String {
    format!("{USERS_PATH}/{id}/edit")
}

fn user_not_found() -> Response {
    redirect(USERS_PATH).flash(Flash::error(USER_NOT_FOUND))
}

fn invalid(to: &str, fieldset: &Fieldset) -> Response {
    redirect(to)
        .flash(Flash::error(VALIDATION_ERROR))
        .fieldset(fieldset.to_json())
}

fn views<U: PanelUser>(users: &[U]) -> Vec<Value> {
    users.iter().map(|u| u.view()).collect()
}

/// Live user by path id, or `None` when the id is malformed or unknown.
async fn find_user<U: PanelUser>(
    services: &AppServices<U>,
    raw_id: &str,
) -> Result<Option<U>, StoreError> {
    match raw_id.parse::<UserId>() {
        Ok(id) => services.users.find_by_id(&id).await,
        Err(_) => Ok(None),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Index / create
// ─────────────────────────────────────────────────────────────────────────────

pub async fn index<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    Actor(actor): Actor<U>,
) -> Result<Response, ApiError> {
    Gate::assert_allowed(&actor, Role::Admin)?;

    let fail = "Failed to load users";
    let dashboard = &services.config.dashboard_path;
    let super_admins = services
        .users
        .list_by_role(Role::SuperAdmin)
        .await
        .map_err(boundary(&services.config, fail, dashboard))?;
    let admins = services
        .users
        .list_by_role(Role::Admin)
        .await
        .map_err(boundary(&services.config, fail, dashboard))?;
    let users = services
        .users
        .list_by_role(Role::User)
        .await
        .map_err(boundary(&services.config, fail, dashboard))?;

    services.render(
        templates::USERS_INDEX,
        &page,
        Some(&actor),
        json!({
            "superAdmins": views(&super_admins),
            "admins": views(&admins),
            "users": views(&users),
        }),
    )
}

pub async fn create<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    Actor(actor): Actor<U>,
) -> Result<Response, ApiError> {
    Gate::assert_allowed(&actor, Role::Admin)?;

    let fieldset = page
        .fieldset
        .clone()
        .unwrap_or_else(|| UserForm::default().empty_fieldset().to_json());

    services.render(
        templates::USERS_EDIT,
        &page,
        Some(&actor),
        json!({ "user": null, "fieldset": fieldset }),
    )
}

pub async fn store<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Actor(actor): Actor<U>,
    Form(body): Form<UserFormBody>,
) -> Result<Response, ApiError> {
    Gate::assert_allowed(&actor, Role::Admin)?;

    const ACTION: &str = "Failed to create user";
    let config = &services.config;
    let create_path = format!("{USERS_PATH}/create");
    let form: UserForm = body.into();

    let taken = services
        .users
        .email_taken(&form.email, None)
        .await
        .map_err(boundary(config, ACTION, &create_path))?;

    let mut fieldset = form.validate(false, taken);
    if !fieldset.has_errors() && !Gate::allow_names(actor.role_name(), form.role.trim()) {
        fieldset.add_error("role", ROLE_NOT_ALLOWED);
    }
    if fieldset.has_errors() {
        return Ok(invalid(&create_path, &fieldset));
    }

    let generated = form.password.is_empty();
    let plain = if generated {
        random_string(GENERATED_PASSWORD_LENGTH)
    } else {
        form.password.clone()
    };
    let hash = password::hash_password(&plain).map_err(boundary(config, ACTION, &create_path))?;

    let mut user = U::from_form(&form, hash, form.should_reset_password || generated);
    if let Some(role) = Role::parse(form.role.trim()) {
        user.set_role_name(role.as_str().to_string());
    }

    match services.users.save(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            fieldset.add_error("email", EMAIL_TAKEN);
            return Ok(invalid(&create_path, &fieldset));
        }
        Err(err) => return Err(boundary(config, ACTION, &create_path)(err)),
    }
    tracing::info!(user_id = %user.id(), created_by = %actor.id(), "user created");
    services
        .report(&actor, format!("Created user {}", user.email()))
        .await;

    if form.should_send_email && config.is_email_enabled() {
        let mut context = json!({
            "user": user.view(),
            "name": config.panel_name,
            "url": config.base_url,
        });
        if generated {
            context["password"] = json!(plain);
        }
        services
            .send_email(
                Address::new(user.email(), Some(user.name().to_string())),
                "Welcome to Admin Panel",
                templates::EMAIL_WELCOME,
                &context,
            )
            .await;
    }

    Ok(redirect(USERS_PATH).flash(Flash::success("Successfully created user")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit / update
// ─────────────────────────────────────────────────────────────────────────────

fn may_edit<U: PanelUser>(actor: &U, user: &U) -> bool {
    Gate::allow_user(actor, Role::Admin) || actor.id() == user.id()
}

pub async fn edit<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Extension(page): Extension<PageState>,
    Actor(actor): Actor<U>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let found = find_user(&services, &raw_id)
        .await
        .map_err(boundary(&services.config, "Failed to load user", USERS_PATH))?;
    let Some(user) = found else {
        return Ok(user_not_found());
    };
    if !may_edit(&actor, &user) {
        return Err(ApiError::NotFound);
    }

    let fieldset = page
        .fieldset
        .clone()
        .unwrap_or_else(|| user.to_form().empty_fieldset().to_json());

    services.render(
        templates::USERS_EDIT,
        &page,
        Some(&actor),
        json!({ "user": user.view(), "fieldset": fieldset }),
    )
}

pub async fn update<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Actor(actor): Actor<U>,
    Path(raw_id): Path<String>,
    Form(body): Form<UserFormBody>,
) -> Result<Response, ApiError> {
    const ACTION: &str = "Failed to update user";
    let config = &services.config;

    let found = find_user(&services, &raw_id)
        .await
        .map_err(boundary(config, ACTION, USERS_PATH))?;
    let Some(mut user) = found else {
        return Ok(user_not_found());
    };
    if !may_edit(&actor, &user) {
        return Err(ApiError::NotFound);
    }

    let back = edit_path(user.id());
    let form: UserForm = body.into();

    let taken = services
        .users
        .email_taken(&form.email, Some(user.id()))
        .await
        .map_err(boundary(config, ACTION, &back))?;
    let mut fieldset = form.validate(true, taken);
    if fieldset.has_errors() {
        return Ok(invalid(&back, &fieldset));
    }

    if user.should_reset_password() {
        let unchanged = form.password.is_empty()
            || password::verify_password(&form.password, user.password_hash())
                .map_err(boundary(config, ACTION, &back))?;
        if unchanged {
            return Ok(redirect(&back)
                .flash(Flash::error(PICK_NEW_PASSWORD))
                .fieldset(fieldset.to_json()));
        }
        user.set_should_reset_password(false);
    }

    user.update_non_password_values(&form);

    if !form.password.is_empty() {
        let hash = password::hash_password(&form.password).map_err(boundary(config, ACTION, &back))?;
        user.set_password_hash(hash);
    }

    let is_self = actor.id() == user.id();
    if !is_self {
        let requested = Role::parse(form.role.trim());
        if let Some(role) = requested.filter(|r| Gate::allow_user(&actor, *r)) {
            user.set_role_name(role.as_str().to_string());
        }
    }

    match services.users.save(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            fieldset.add_error("email", EMAIL_TAKEN);
            return Ok(invalid(&back, &fieldset));
        }
        Err(err) => return Err(boundary(config, ACTION, &back)(err)),
    }
    tracing::info!(user_id = %user.id(), updated_by = %actor.id(), "user updated");
    services
        .report(&actor, format!("Updated user {}", user.email()))
        .await;

    let done = if Gate::allow_user(&actor, Role::Admin) {
        USERS_PATH.to_string()
    } else {
        back
    };
    Ok(redirect(&done).flash(Flash::success("User has been updated")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete / restore / logout
// ─────────────────────────────────────────────────────────────────────────────

pub async fn delete<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Actor(actor): Actor<U>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    Gate::assert_allowed(&actor, Role::Admin)?;

    const ACTION: &str = "Failed to delete user";
    let config = &services.config;

    let found = find_user(&services, &raw_id)
        .await
        .map_err(boundary(config, ACTION, USERS_PATH))?;
    let Some(mut user) = found else {
        return Ok(user_not_found());
    };
    if actor.id() == user.id() {
        return Ok(redirect(USERS_PATH).flash(Flash::error(CANNOT_DELETE_SELF)));
    }

    user.soft_delete(Utc::now());
    services
        .users
        .save(&user)
        .await
        .map_err(boundary(config, ACTION, USERS_PATH))?;
    tracing::info!(user_id = %user.id(), deleted_by = %actor.id(), "user deleted");
    services
        .report(&actor, format!("Deleted user {}", user.email()))
        .await;

    Ok(redirect(USERS_PATH).flash(
        Flash::warning("User has been deleted.")
            .with_link(format!("{USERS_PATH}/{}/restore", user.id()), "Undo"),
    ))
}

pub async fn restore<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
    Actor(actor): Actor<U>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    Gate::assert_allowed(&actor, Role::Admin)?;

    const ACTION: &str = "Failed to restore user";
    let config = &services.config;

    let found = match raw_id.parse::<UserId>() {
        Ok(id) => services
            .users
            .find_by_id_with_deleted(&id)
            .await
            .map_err(boundary(config, ACTION, USERS_PATH))?,
        Err(_) => None,
    };
    let Some(mut user) = found else {
        return Ok(user_not_found());
    };

    user.restore();
    match services.users.save(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Ok(redirect(USERS_PATH).flash(Flash::error(EMAIL_TAKEN)));
        }
        Err(err) => return Err(boundary(config, ACTION, USERS_PATH)(err)),
    }
    tracing::info!(user_id = %user.id(), restored_by = %actor.id(), "user restored");
    services
        .report(&actor, format!("Restored user {}", user.email()))
        .await;

    Ok(redirect(USERS_PATH).flash(Flash::success("User has been restored")))
}

pub async fn logout<U: PanelUser>(
    Extension(services): Extension<Arc<AppServices<U>>>,
) -> Response {
    redirect(&services.config.login_path)
        .flash(Flash::info("Logged out"))
        .session(SessionChange::Logout)
}
