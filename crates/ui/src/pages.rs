//! Built-in page and email bodies.
//!
//! Each page reads what it needs from the JSON context assembled by the HTTP
//! layer:
//!
//! - `adminPanel`: `name`, `skin`, `isEmailEnabled`, `isStorageEnabled`, `isSsoEnabled`
//! - `request.path`: current path, used for sidebar highlighting
//! - `actor`: the logged-in user's view, if any
//! - `flash`: pending flash messages
//! - `fieldset`: form state carried over from the previous request

use chrono::{DateTime, Utc};
use serde_json::Value;

use adminpanel_auth::{Fieldset, Role};

use crate::tags::{self, form};
use crate::{Flash, RenderError, escape, templates};

const DEFAULT_PANEL_NAME: &str = "Admin Panel";
const DEFAULT_SKIN: &str = "skin-blue";
const LOGIN_PATH: &str = "/admin/login";
const DASHBOARD_PATH: &str = "/admin/dashboard";
const USERS_PATH: &str = "/admin/backend/users";

// ─────────────────────────────────────────────────────────────────────────────
// Context helpers
// ─────────────────────────────────────────────────────────────────────────────

fn str_at<'a>(ctx: &'a Value, pointer: &str) -> Option<&'a str> {
    ctx.pointer(pointer).and_then(Value::as_str)
}

fn bool_at(ctx: &Value, pointer: &str) -> bool {
    ctx.pointer(pointer).and_then(Value::as_bool).unwrap_or(false)
}

fn require<'a>(ctx: &'a Value, template: &str, pointer: &str) -> Result<&'a str, RenderError> {
    str_at(ctx, pointer).ok_or_else(|| RenderError::MissingContext {
        template: template.to_string(),
        key: pointer.trim_start_matches('/').replace('/', "."),
    })
}

fn panel_name(ctx: &Value) -> &str {
    str_at(ctx, "/adminPanel/name").unwrap_or(DEFAULT_PANEL_NAME)
}

fn fieldset(ctx: &Value) -> Fieldset {
    ctx.get("fieldset")
        .cloned()
        .and_then(Fieldset::from_json)
        .unwrap_or_default()
}

fn flashes(ctx: &Value) -> String {
    ctx.get("flash")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<Flash>(item.clone()).ok())
                .map(|flash| flash.to_html())
                .collect()
        })
        .unwrap_or_default()
}

fn current_path(ctx: &Value) -> Option<&str> {
    str_at(ctx, "/request/path")
}

fn actor_role(ctx: &Value) -> &str {
    str_at(ctx, "/actor/role").unwrap_or("")
}

// ─────────────────────────────────────────────────────────────────────────────
// Layouts
// ─────────────────────────────────────────────────────────────────────────────

fn head(ctx: &Value, title: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{} | {}</title>\
         <link rel=\"stylesheet\" href=\"/admin-panel/dist/css/admin-panel.css\"></head>",
        escape(title),
        escape(panel_name(ctx))
    )
}

fn layout(ctx: &Value, title: &str, content: &str) -> String {
    let skin = str_at(ctx, "/adminPanel/skin").unwrap_or(DEFAULT_SKIN);
    let current = current_path(ctx);
    let role = actor_role(ctx);

    let user_links = [
        tags::sidebar_link("All users", USERS_PATH, None, current),
        tags::sidebar_link("Create user", &format!("{USERS_PATH}/create"), None, current),
    ]
    .concat();

    let sidebar = [
        tags::sidebar_header("Navigation"),
        tags::sidebar_link("Dashboard", DASHBOARD_PATH, Some("dashboard"), current),
        tags::gate_allow(
            role,
            Role::Admin.as_str(),
            &tags::sidebar_container(
                "Users",
                Some("fa fa-users"),
                &["/admin/backend/users*"],
                current,
                &user_links,
            ),
        ),
    ]
    .concat();

    let account = match str_at(ctx, "/actor/id") {
        Some(id) => tags::menu_toggle(
            "user",
            str_at(ctx, "/actor/name").unwrap_or(""),
            None,
            &[
                tags::menu_footer("Profile", &format!("{USERS_PATH}/{id}/edit")),
                tags::menu_footer("Sign out", &format!("{USERS_PATH}/logout")),
            ]
            .concat(),
        ),
        None => String::new(),
    };

    format!(
        "{}<body class=\"hold-transition {} sidebar-mini\"><div class=\"wrapper\">\
         <header class=\"main-header\"><a href=\"{DASHBOARD_PATH}\" class=\"logo\">{}</a>\
         <nav class=\"navbar navbar-static-top\"><ul class=\"nav navbar-nav\">{account}</ul></nav></header>\
         <aside class=\"main-sidebar\"><section class=\"sidebar\"><ul class=\"sidebar-menu\">{sidebar}</ul></section></aside>\
         <div class=\"content-wrapper\"><section class=\"content-header\"><h1>{}</h1></section>\
         <section class=\"content\">{}{content}</section></div></div></body></html>",
        head(ctx, title),
        escape(skin),
        escape(panel_name(ctx)),
        escape(title),
        flashes(ctx),
    )
}

fn auth_layout(ctx: &Value, title: &str, content: &str) -> String {
    format!(
        "{}<body class=\"hold-transition login-page\"><div class=\"login-box\">\
         <div class=\"login-logo\"><b>{}</b></div><div class=\"login-box-body\">\
         <p class=\"login-box-msg\">{}</p>{}{content}</div></div></body></html>",
        head(ctx, title),
        escape(panel_name(ctx)),
        escape(title),
        flashes(ctx),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Login and password reset
// ─────────────────────────────────────────────────────────────────────────────

pub fn login(ctx: &Value) -> String {
    let next = str_at(ctx, "/next").unwrap_or("");
    let sso = if bool_at(ctx, "/adminPanel/isSsoEnabled") {
        format!(
            "<a href=\"{LOGIN_PATH}/sso\" class=\"btn btn-default btn-block\">Sign in with SSO</a>"
        )
    } else {
        String::new()
    };

    let body = [
        form::form_open(LOGIN_PATH, "post", false),
        format!("<input type=\"hidden\" name=\"next\" value=\"{}\">", escape(next)),
        form::email_group("email", "", None, None, &[("placeholder", "Email")]),
        form::password_group("password", None, None, &[("placeholder", "Password")]),
        "<button type=\"submit\" class=\"btn btn-primary btn-block btn-flat\">Sign in</button>".to_string(),
        form::form_close().to_string(),
        sso,
        format!("<a href=\"{LOGIN_PATH}/reset\">I forgot my password</a>"),
    ]
    .concat();

    auth_layout(ctx, "Sign in to start your session", &body)
}

pub fn reset_request(ctx: &Value) -> String {
    let body = [
        form::form_open(&format!("{LOGIN_PATH}/reset"), "post", false),
        form::email_group("email", "", None, None, &[("placeholder", "Email")]),
        "<button type=\"submit\" class=\"btn btn-primary btn-block btn-flat\">Send reset link</button>".to_string(),
        form::form_close().to_string(),
        format!("<a href=\"{LOGIN_PATH}\">Back to login</a>"),
    ]
    .concat();

    auth_layout(ctx, "Reset your password", &body)
}

pub fn reset_change(ctx: &Value) -> Result<String, RenderError> {
    let token = require(ctx, templates::RESET_CHANGE, "/token")?;
    let fieldset = fieldset(ctx);

    let body = [
        form::form_open(&format!("{LOGIN_PATH}/reset/change"), "post", false),
        format!("<input type=\"hidden\" name=\"token\" value=\"{}\">", escape(token)),
        form::email_group("email", "", fieldset.get("email"), None, &[]),
        form::password_group("password", fieldset.get("password"), None, &[]),
        form::password_group("passwordRepeat", fieldset.get("passwordRepeat"), None, &[]),
        "<button type=\"submit\" class=\"btn btn-primary btn-block btn-flat\">Change password</button>".to_string(),
        form::form_close().to_string(),
    ]
    .concat();

    Ok(auth_layout(ctx, "Choose a new password", &body))
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard
// ─────────────────────────────────────────────────────────────────────────────

pub fn dashboard(ctx: &Value) -> String {
    let name = str_at(ctx, "/actor/name").unwrap_or("");
    let users = ctx
        .pointer("/stats/users")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let body = [
        tags::box_wrap(
            Some("Welcome"),
            Some("primary"),
            &format!("<p>Logged in as {}.</p>", escape(name)),
        ),
        tags::gate_allow(
            actor_role(ctx),
            Role::Admin.as_str(),
            &tags::infobox("Users", &users.to_string(), Some("aqua"), Some("fa fa-users")),
        ),
        activity_feed(ctx),
    ]
    .concat();

    layout(ctx, "Dashboard", &body)
}

/// Recent actions from `ctx.actions`; nothing when the feed is empty.
fn activity_feed(ctx: &Value) -> String {
    let Some(actions) = ctx
        .get("actions")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
    else {
        return String::new();
    };
    let now = Utc::now();

    let rows = tags::table_rows(actions.as_slice(), |_, action: &Value| {
        let author = str_at(action, "/author/name")
            .or_else(|| str_at(action, "/name"))
            .unwrap_or("");
        let when = str_at(action, "/createdAt")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| tags::time_since(d.with_timezone(&Utc), now, None, None))
            .unwrap_or_default();
        format!(
            "<td>{}</td><td>{}</td><td>{}</td>",
            escape(author),
            escape(str_at(action, "/message").unwrap_or("")),
            when
        )
    });

    tags::solid_box(
        Some("Recent activity"),
        Some("default"),
        &format!("<table class=\"table table-condensed\"><tbody>{rows}</tbody></table>"),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend users
// ─────────────────────────────────────────────────────────────────────────────

fn user_rows(ctx: &Value, key: &str) -> Vec<Vec<String>> {
    let role = actor_role(ctx);
    let actor_id = str_at(ctx, "/actor/id");
    let now = Utc::now();

    ctx.get(key)
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .map(|user| {
                    let id = str_at(user, "/id").unwrap_or("");
                    let created = str_at(user, "/createdAt")
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                        .map(|d| tags::time_since(d.with_timezone(&Utc), now, None, None))
                        .unwrap_or_default();

                    let mut actions = format!(
                        "<a href=\"{USERS_PATH}/{}/edit\" class=\"btn btn-box-tool\"><span class=\"fa fa-pencil\"></span></a>",
                        escape(id)
                    );
                    if actor_id != Some(id) {
                        actions.push_str(&tags::gate_allow(
                            role,
                            Role::Admin.as_str(),
                            &tags::button_delete(
                                &format!("{USERS_PATH}/{id}/delete"),
                                Some("Delete user"),
                                Some("Are you sure you want to delete this user?"),
                            ),
                        ));
                    }

                    vec![
                        tags::image_round(
                            str_at(user, "/avatarUrl").unwrap_or(""),
                            Some("img-sm"),
                            &[("alt", "avatar")],
                        ),
                        escape(str_at(user, "/name").unwrap_or("")),
                        escape(str_at(user, "/email").unwrap_or("")),
                        escape(str_at(user, "/title").unwrap_or("")),
                        tags::label(str_at(user, "/role").unwrap_or(""), Some("primary")),
                        created,
                        actions,
                    ]
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn users_index(ctx: &Value) -> String {
    let headers = ["", "Name", "Email", "Title", "Role", "Created", ""];
    let create = tags::gate_allow(
        actor_role(ctx),
        Role::Admin.as_str(),
        &format!("<a href=\"{USERS_PATH}/create\" class=\"btn btn-primary\">Create user</a>"),
    );

    let mut body = create;
    for (title, key) in [
        ("Super admins", "superAdmins"),
        ("Admins", "admins"),
        ("Users", "users"),
    ] {
        let rows = user_rows(ctx, key);
        if tags::if_not_empty(ctx.get(key)) {
            body.push_str(&tags::box_wrap(
                Some(title),
                Some("primary"),
                &tags::table(&headers, &rows),
            ));
        }
    }

    layout(ctx, "Users", &body)
}

pub fn users_edit(ctx: &Value) -> String {
    let fieldset = fieldset(ctx);
    let user = ctx.get("user").filter(|u| !u.is_null());
    let editing_id = user.and_then(|u| str_at(u, "/id"));
    let default = |key: &str| {
        user.and_then(|u| u.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let action = match editing_id {
        Some(id) => format!("{USERS_PATH}/{id}/edit"),
        None => format!("{USERS_PATH}/store"),
    };

    let is_self = editing_id.is_some() && editing_id == str_at(ctx, "/actor/id");
    let role_select = if is_self {
        String::new()
    } else {
        let actor_role = actor_role(ctx);
        let options: Vec<&str> = Role::names()
            .into_iter()
            .filter(|r| adminpanel_auth::Gate::allow_names(actor_role, r))
            .collect();
        form::select_group(
            &options,
            "role",
            Some(&default("role")),
            fieldset.get("role"),
            None,
        )
    };

    let send_email = if editing_id.is_none() && bool_at(ctx, "/adminPanel/isEmailEnabled") {
        form::checkbox_group("shouldSendEmail", true, fieldset.get("shouldSendEmail"), None)
    } else {
        String::new()
    };

    let inner = [
        form::text_group("name", &default("name"), fieldset.get("name"), None, &[]),
        form::email_group("email", &default("email"), fieldset.get("email"), None, &[]),
        form::text_group("title", &default("title"), fieldset.get("title"), None, &[]),
        form::password_group("password", fieldset.get("password"), None, &[]),
        form::password_group("passwordRepeat", fieldset.get("passwordRepeat"), None, &[]),
        role_select,
        form::checkbox_group(
            "shouldResetPassword",
            false,
            fieldset.get("shouldResetPassword"),
            None,
        ),
        send_email,
    ]
    .concat();

    let body = [
        form::form_open(&action, "post", false),
        tags::box_open(
            Some(if editing_id.is_some() { "Edit user" } else { "Create user" }),
            Some("primary"),
            None,
        ),
        tags::box_close().to_string(),
        tags::box_close().to_string(),
        tags::box_body(&inner),
        tags::box_footer("<button type=\"submit\" class=\"btn btn-primary\">Save</button>"),
        tags::box_close().to_string(),
        form::form_close().to_string(),
    ]
    .concat();

    let title = if editing_id.is_some() { "Edit user" } else { "Create user" };
    layout(ctx, title, &body)
}

// ─────────────────────────────────────────────────────────────────────────────
// Emails
// ─────────────────────────────────────────────────────────────────────────────

pub fn email_welcome(ctx: &Value) -> Result<String, RenderError> {
    let name = require(ctx, templates::EMAIL_WELCOME, "/user/name")?;
    let email = require(ctx, templates::EMAIL_WELCOME, "/user/email")?;
    let url = str_at(ctx, "/url").unwrap_or("");
    let sender = str_at(ctx, "/name").unwrap_or(DEFAULT_PANEL_NAME);

    let password = match str_at(ctx, "/password") {
        Some(password) => format!(
            "<p>Your temporary password is <strong>{}</strong>. You will be asked to change it on first login.</p>",
            escape(password)
        ),
        None => String::new(),
    };

    Ok(format!(
        "<html><body><h1>Welcome, {}</h1>\
         <p>An account has been created for <strong>{}</strong>.</p>{password}\
         <p><a href=\"{}{LOGIN_PATH}\">Sign in</a></p><p>{}</p></body></html>",
        escape(name),
        escape(email),
        escape(url),
        escape(sender),
    ))
}

pub fn email_reset_password(ctx: &Value) -> Result<String, RenderError> {
    let link = require(ctx, templates::EMAIL_RESET_PASSWORD, "/resetUrl")?;
    let minutes = ctx
        .get("expireMinutes")
        .and_then(Value::as_i64)
        .unwrap_or(60);
    let sender = str_at(ctx, "/name").unwrap_or(DEFAULT_PANEL_NAME);

    Ok(format!(
        "<html><body><h1>Password reset</h1>\
         <p>Someone requested a password reset for your account. \
         Follow the link below within {minutes} minutes to choose a new password.</p>\
         <p><a href=\"{l}\">{l}</a></p>\
         <p>If you did not request this, you can ignore this email.</p><p>{}</p></body></html>",
        escape(sender),
        l = escape(link),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{PanelRenderer, Renderer};

    fn admin_ctx() -> Value {
        json!({
            "adminPanel": { "name": "Acme", "skin": "skin-red", "isEmailEnabled": true },
            "request": { "path": "/admin/backend/users" },
            "actor": { "id": "a1", "name": "Ada", "role": "Admin" },
            "flash": [{ "level": "success", "message": "Saved" }],
        })
    }

    #[test]
    fn layout_carries_panel_config_and_flash() {
        let html = dashboard(&admin_ctx());
        assert!(html.contains("<title>Dashboard | Acme</title>"));
        assert!(html.contains("skin-red"));
        assert!(html.contains("alert-success"));
        assert!(html.contains("treeview active menu-open"));
    }

    #[test]
    fn dashboard_lists_recent_activity_escaped() {
        let mut ctx = admin_ctx();
        ctx["actions"] = json!([{
            "name": "Ada",
            "message": "Created user <b>@example.com",
            "createdAt": Utc::now().to_rfc3339(),
            "author": null,
        }]);
        let html = dashboard(&ctx);
        assert!(html.contains("Recent activity"));
        assert!(html.contains("<td>Ada</td>"));
        assert!(html.contains("Created user &lt;b&gt;@example.com"));
    }

    #[test]
    fn dashboard_without_activity_has_no_feed() {
        assert!(!dashboard(&admin_ctx()).contains("Recent activity"));
    }

    #[test]
    fn plain_users_do_not_see_user_management() {
        let mut ctx = admin_ctx();
        ctx["actor"]["role"] = json!("User");
        let html = dashboard(&ctx);
        assert!(!html.contains("treeview"));
        assert!(!html.contains("info-box"));
    }

    #[test]
    fn login_keeps_next_and_escapes_it() {
        let html = login(&json!({ "next": "/admin/x\"><script>" }));
        assert!(html.contains("name=\"next\" value=\"/admin/x&quot;&gt;&lt;script&gt;\""));
    }

    #[test]
    fn reset_change_requires_token() {
        assert_eq!(
            reset_change(&json!({})),
            Err(RenderError::MissingContext {
                template: templates::RESET_CHANGE.into(),
                key: "token".into()
            })
        );
        assert!(reset_change(&json!({ "token": "abc" })).unwrap().contains("value=\"abc\""));
    }

    #[test]
    fn users_index_groups_by_role_and_hides_self_delete() {
        let mut ctx = admin_ctx();
        ctx["admins"] = json!([{ "id": "a1", "name": "Ada", "email": "ada@example.com", "role": "Admin" }]);
        ctx["users"] = json!([{ "id": "u2", "name": "Bob", "email": "bob@example.com", "role": "User" }]);
        let html = users_index(&ctx);

        assert!(html.contains("<h3 class=\"box-title\">Admins</h3>"));
        assert!(html.contains("<h3 class=\"box-title\">Users</h3>"));
        assert!(!html.contains("Super admins"));
        assert!(html.contains("/admin/backend/users/u2/delete"));
        assert!(!html.contains("/admin/backend/users/a1/delete"));
    }

    #[test]
    fn edit_form_hides_role_for_self() {
        let mut ctx = admin_ctx();
        ctx["user"] = json!({ "id": "a1", "name": "Ada", "email": "ada@example.com", "role": "Admin" });
        let html = users_edit(&ctx);
        assert!(html.contains("action=\"/admin/backend/users/a1/edit\""));
        assert!(!html.contains("name=\"role\""));
    }

    #[test]
    fn create_form_offers_only_allowed_roles() {
        let html = users_edit(&admin_ctx());
        assert!(html.contains("action=\"/admin/backend/users/store\""));
        assert!(!html.contains("<option value=\"Super Admin\""));
        assert!(html.contains("<option value=\"User\""));
        assert!(html.contains("shouldSendEmail"));
    }

    #[test]
    fn welcome_email_mentions_generated_password() {
        let ctx = json!({
            "user": { "name": "Bob", "email": "bob@example.com" },
            "name": "Acme", "url": "https://admin.example.com", "password": "Xy12",
        });
        let html = PanelRenderer.render(templates::EMAIL_WELCOME, &ctx).unwrap();
        assert!(html.contains("<strong>Xy12</strong>"));
        assert!(html.contains("https://admin.example.com/admin/login"));
    }

    #[test]
    fn reset_email_contains_link() {
        let ctx = json!({ "resetUrl": "http://127.0.0.1:8080/admin/login/reset/abc" });
        let html = email_reset_password(&ctx).unwrap();
        assert!(html.contains("href=\"http://127.0.0.1:8080/admin/login/reset/abc\""));
        assert!(html.contains("60 minutes"));
    }
}
