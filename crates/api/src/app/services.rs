//! Service wiring shared by every handler.

use std::sync::Arc;

use axum::response::{Html, IntoResponse, Response};
use serde_json::{Value, json};

use adminpanel_auth::{AdminUser, AuthSessionGuard, PanelUser};
use adminpanel_infra::{
    ActivityStore, Address, InMemoryActivityStore, InMemoryResetTokenStore, InMemorySessionStore,
    InMemoryUserStore, Mailer, PanelConfig, PasswordResetService, ResetTokenStore, SessionStore,
    UserStore, activity, send_templated_email,
};
use adminpanel_ui::{PanelRenderer, Renderer};

use crate::app::errors::ApiError;
use crate::app::reply::Rendered;
use crate::context::PageState;

pub struct AppServices<U: PanelUser> {
    pub config: Arc<PanelConfig>,
    pub guard: AuthSessionGuard,
    pub users: Arc<dyn UserStore<U>>,
    pub sessions: Arc<dyn SessionStore>,
    pub activities: Arc<dyn ActivityStore>,
    pub reset: PasswordResetService<U>,
    pub mailer: Arc<dyn Mailer>,
    pub renderer: Arc<dyn Renderer>,
}

impl<U: PanelUser> AppServices<U> {
    pub fn new(
        config: PanelConfig,
        users: Arc<dyn UserStore<U>>,
        tokens: Arc<dyn ResetTokenStore>,
        sessions: Arc<dyn SessionStore>,
        activities: Arc<dyn ActivityStore>,
        mailer: Arc<dyn Mailer>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let config = Arc::new(config);
        let reset = PasswordResetService::new(
            Arc::clone(&users),
            tokens,
            Arc::clone(&mailer),
            Arc::clone(&renderer),
            Arc::clone(&config),
        );

        Self {
            guard: config.guard(),
            config,
            users,
            sessions,
            activities,
            reset,
            mailer,
            renderer,
        }
    }

    /// Everything in memory; the built-in pages render the UI.
    pub fn in_memory(config: PanelConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserStore::<U>::new()),
            Arc::new(InMemoryResetTokenStore::new()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryActivityStore::new()),
            mailer,
            Arc::new(PanelRenderer::new()),
        )
    }

    /// Render a page with the shared context (`adminPanel`, `request`,
    /// `actor`, `flash`, `fieldset`, `actions`) merged with `extra`.
    pub fn render(
        &self,
        template: &str,
        page: &PageState,
        actor: Option<&U>,
        extra: Value,
    ) -> Result<Response, ApiError> {
        let mut context = json!({
            "adminPanel": self.config.view(),
            "request": { "path": page.path },
            "actor": actor.map(|u| u.view()),
            "flash": page.flash,
            "fieldset": page.fieldset,
            "actions": page.actions,
        });
        if let (Some(base), Value::Object(extra)) = (context.as_object_mut(), extra) {
            base.extend(extra);
        }

        let html = self.renderer.render(template, &context)?;
        let mut res = Html(html).into_response();
        res.extensions_mut().insert(Rendered);
        Ok(res)
    }

    /// Best-effort activity record authored by `actor`.
    pub async fn report(&self, actor: &U, message: impl Into<String>) {
        activity::report(self.activities.as_ref(), actor, message).await;
    }

    /// Best-effort templated email from the configured sender. Does nothing
    /// when email is disabled.
    pub async fn send_email(
        &self,
        to: Address,
        subject: &str,
        template: &str,
        context: &Value,
    ) -> bool {
        let Some(sender) = &self.config.email else {
            return false;
        };
        send_templated_email(
            self.mailer.as_ref(),
            self.renderer.as_ref(),
            Address::new(sender.address.clone(), Some(sender.name.clone())),
            to,
            subject,
            template,
            context,
        )
        .await
    }
}

#[cfg(feature = "postgres")]
pub async fn build_postgres_services(
    config: PanelConfig,
    database_url: &str,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<AppServices<AdminUser>> {
    use adminpanel_infra::store::{
        PostgresActivityStore, PostgresResetTokenStore, PostgresSessionStore, PostgresUserStore,
        migrate,
    };
    use anyhow::Context;

    let pool = sqlx::PgPool::connect(database_url)
        .await
        .context("failed to connect to postgres")?;
    migrate(&pool).await.context("failed to run migrations")?;

    Ok(AppServices::new(
        config,
        Arc::new(PostgresUserStore::new(pool.clone())),
        Arc::new(PostgresResetTokenStore::new(pool.clone())),
        Arc::new(PostgresSessionStore::new(pool.clone())),
        Arc::new(PostgresActivityStore::new(pool)),
        mailer,
        Arc::new(PanelRenderer::new()),
    ))
}

/// Default wiring for the binary: Postgres when `DATABASE_URL` is set and the
/// `postgres` feature is on, memory otherwise.
pub async fn build_services(
    config: PanelConfig,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<AppServices<AdminUser>> {
    match config.database_url.clone() {
        Some(url) => from_database_url(config, &url, mailer).await,
        None => Ok(AppServices::in_memory(config, mailer)),
    }
}

#[cfg(feature = "postgres")]
async fn from_database_url(
    config: PanelConfig,
    url: &str,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<AppServices<AdminUser>> {
    build_postgres_services(config, url, mailer).await
}

#[cfg(not(feature = "postgres"))]
async fn from_database_url(
    config: PanelConfig,
    _url: &str,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<AppServices<AdminUser>> {
    tracing::warn!("DATABASE_URL set but the postgres feature is disabled; using memory");
    Ok(AppServices::in_memory(config, mailer))
}
