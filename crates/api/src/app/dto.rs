//! Form bodies posted by the panel pages.

use serde::Deserialize;

use adminpanel_auth::UserForm;
use adminpanel_infra::ResetSubmission;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResetRequestBody {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetChangeBody {
    pub token: String,
    pub email: String,
    pub password: String,
    pub password_repeat: String,
}

impl From<ResetChangeBody> for ResetSubmission {
    fn from(body: ResetChangeBody) -> Self {
        ResetSubmission {
            token: body.token,
            email: body.email,
            password: body.password,
            password_repeat: body.password_repeat,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SsoCallbackQuery {
    pub token: Option<String>,
    pub email: Option<String>,
}

/// Create/edit user form. Checkboxes are absent from the body when unchecked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserFormBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_repeat: String,
    pub title: String,
    pub role: String,
    pub should_reset_password: bool,
    pub should_send_email: bool,
}

impl From<UserFormBody> for UserForm {
    fn from(body: UserFormBody) -> Self {
        UserForm {
            name: body.name,
            email: body.email.trim().to_string(),
            password: body.password,
            password_repeat: body.password_repeat,
            title: body.title,
            role: body.role,
            should_reset_password: body.should_reset_password,
            should_send_email: body.should_send_email,
        }
    }
}
