use std::sync::Arc;

use serde_json::Value;

use crate::{RenderError, pages};

/// Template names understood by [`PanelRenderer`].
pub mod templates {
    pub const LOGIN: &str = "Login/index";
    pub const RESET_REQUEST: &str = "Login/reset";
    pub const RESET_CHANGE: &str = "Login/reset-change";
    pub const DASHBOARD: &str = "Dashboard/index";
    pub const USERS_INDEX: &str = "BackendUser/index";
    pub const USERS_EDIT: &str = "BackendUser/edit";
    pub const EMAIL_WELCOME: &str = "Emails/welcome";
    pub const EMAIL_RESET_PASSWORD: &str = "Emails/reset-password";
}

/// Renders a named template against a JSON context into HTML.
///
/// Used for page responses and for email bodies.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

impl<R> Renderer for Arc<R>
where
    R: Renderer + ?Sized,
{
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        (**self).render(template, context)
    }
}

/// Built-in AdminLTE pages and emails.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanelRenderer;

impl PanelRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for PanelRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        tracing::debug!(template, "rendering");
        match template {
            templates::LOGIN => Ok(pages::login(context)),
            templates::RESET_REQUEST => Ok(pages::reset_request(context)),
            templates::RESET_CHANGE => pages::reset_change(context),
            templates::DASHBOARD => Ok(pages::dashboard(context)),
            templates::USERS_INDEX => Ok(pages::users_index(context)),
            templates::USERS_EDIT => Ok(pages::users_edit(context)),
            templates::EMAIL_WELCOME => pages::email_welcome(context),
            templates::EMAIL_RESET_PASSWORD => pages::email_reset_password(context),
            other => Err(RenderError::TemplateNotFound(other.to_string())),
        }
    }
}
