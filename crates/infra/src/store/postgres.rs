//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | live email already taken |
//! | Database (other) | Any other | `Storage` | other database errors |
//! | Other | N/A | `Storage` | pool closed, network, decode failures |
//!
//! The user store is implemented for [`AdminUser`]; hosts with their own
//! user type provide their own `UserStore` implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;

use adminpanel_auth::{AdminUser, ResetToken};
use adminpanel_core::{ActivityId, TokenId, UserId};
use adminpanel_ui::Flash;

use super::{ActivityStore, ResetTokenStore, SessionStore, UserStore};
use crate::StoreError;
use crate::activity::Activity;
use crate::session::Session;

const SCHEMA: &str = include_str!("../../migrations/0001_admin_panel.sql");

/// Create the admin panel tables if they do not exist.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("migrate", e))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code.as_ref() == "23505" => StoreError::Conflict(msg),
                _ => StoreError::Storage(msg),
            }
        }
        other => StoreError::Storage(format!("{operation}: {other}")),
    }
}

fn decode_error(operation: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Storage(format!("{operation}: failed to decode row: {e}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "id, name, title, email, password_hash, role, should_reset_password, \
                            avatar, created_at, updated_at, deleted_at";

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_one_where(
        &self,
        operation: &str,
        clause: &str,
        bind: impl for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
    ) -> Result<Option<AdminUser>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM admin_panel_users WHERE {clause} ORDER BY created_at ASC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(bind)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.map(|r| user_from_row(&r).map_err(decode_error(operation)))
            .transpose()
    }
}

fn user_from_row(row: &PgRow) -> Result<AdminUser, sqlx::Error> {
    Ok(AdminUser {
        id: UserId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        title: row.try_get("title")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        should_reset_password: row.try_get("should_reset_password")?,
        avatar: row.try_get("avatar")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl UserStore<AdminUser> for PostgresUserStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<AdminUser>, StoreError> {
        self.fetch_one_where("find_user_by_id", "id = $1 AND deleted_at IS NULL", *id.as_uuid())
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id_with_deleted(&self, id: &UserId) -> Result<Option<AdminUser>, StoreError> {
        self.fetch_one_where("find_user_by_id_with_deleted", "id = $1", *id.as_uuid())
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminUser>, StoreError> {
        self.fetch_one_where(
            "find_user_by_email",
            "email = $1 AND deleted_at IS NULL",
            email.to_string(),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn first(&self) -> Result<Option<AdminUser>, StoreError> {
        Ok(self.list().await?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<AdminUser>, StoreError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM admin_panel_users WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter()
            .map(|r| user_from_row(r).map_err(decode_error("list_users")))
            .collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save(&self, user: &AdminUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO admin_panel_users (
                id, name, title, email, password_hash, role,
                should_reset_password, avatar, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                title = EXCLUDED.title,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                should_reset_password = EXCLUDED.should_reset_password,
                avatar = EXCLUDED.avatar,
                updated_at = EXCLUDED.updated_at,
                deleted_at = EXCLUDED.deleted_at
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.title)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.should_reset_password)
        .bind(&user.avatar)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("save_user", e))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reset tokens
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresResetTokenStore {
    pool: Arc<PgPool>,
}

impl PostgresResetTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn token_from_row(row: &PgRow) -> Result<ResetToken, sqlx::Error> {
    Ok(ResetToken {
        id: TokenId::from_uuid(row.try_get("id")?),
        email: row.try_get("email")?,
        token: row.try_get("token")?,
        expire_at: row.try_get::<DateTime<Utc>, _>("expire_at")?,
        used_at: row.try_get("used_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ResetTokenStore for PostgresResetTokenStore {
    #[instrument(skip(self, token))]
    async fn find_by_token(&self, token: &str) -> Result<Option<ResetToken>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, token, expire_at, used_at, created_at \
             FROM admin_panel_user_reset_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_reset_token", e))?;
        row.map(|r| token_from_row(&r).map_err(decode_error("find_reset_token")))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<ResetToken>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, email, token, expire_at, used_at, created_at \
             FROM admin_panel_user_reset_tokens WHERE email = $1 ORDER BY created_at ASC",
        )
        .bind(email)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_reset_tokens", e))?;
        rows.iter()
            .map(|r| token_from_row(r).map_err(decode_error("list_reset_tokens")))
            .collect()
    }

    #[instrument(skip(self))]
    async fn delete_for_email(&self, email: &str) -> Result<u64, StoreError> {
        sqlx::query("DELETE FROM admin_panel_user_reset_tokens WHERE email = $1")
            .bind(email)
            .execute(&*self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| map_sqlx_error("delete_reset_tokens", e))
    }

    #[instrument(skip(self, token), fields(email = %token.email))]
    async fn save(&self, token: &ResetToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO admin_panel_user_reset_tokens (id, email, token, expire_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET used_at = EXCLUDED.used_at, expire_at = EXCLUDED.expire_at
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(&token.email)
        .bind(&token.token)
        .bind(token.expire_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("save_reset_token", e))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: Arc<PgPool>,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, flash, fieldset, created_at, updated_at \
             FROM admin_panel_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_session", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = decode_error("load_session");
        let flash: serde_json::Value = row.try_get("flash").map_err(&decode)?;
        let flash: Vec<Flash> = serde_json::from_value(flash)
            .map_err(|e| StoreError::Storage(format!("load_session: invalid flash payload: {e}")))?;

        Ok(Some(Session {
            id: row.try_get("id").map_err(&decode)?,
            user_id: row
                .try_get::<Option<uuid::Uuid>, _>("user_id")
                .map_err(&decode)?
                .map(UserId::from_uuid),
            flash,
            fieldset: row.try_get("fieldset").map_err(&decode)?,
            created_at: row.try_get("created_at").map_err(&decode)?,
            updated_at: row.try_get("updated_at").map_err(&decode)?,
        }))
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let flash = serde_json::to_value(&session.flash)
            .map_err(|e| StoreError::Storage(format!("save_session: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO admin_panel_sessions (id, user_id, flash, fieldset, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET
                user_id = EXCLUDED.user_id,
                flash = EXCLUDED.flash,
                fieldset = EXCLUDED.fieldset,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id.map(|id| *id.as_uuid()))
        .bind(flash)
        .bind(&session.fieldset)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("save_session", e))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM admin_panel_sessions WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("delete_session", e))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Activities
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresActivityStore {
    pool: Arc<PgPool>,
}

impl PostgresActivityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ActivityStore for PostgresActivityStore {
    #[instrument(skip(self, activity))]
    async fn record(&self, activity: &Activity) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO admin_panel_actions (id, name, user_id, message, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*activity.id.as_uuid())
        .bind(&activity.name)
        .bind(*activity.user_id.as_uuid())
        .bind(&activity.message)
        .bind(activity.created_at)
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("record_activity", e))
    }

    #[instrument(skip(self))]
    async fn latest(&self, limit: usize) -> Result<Vec<Activity>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, user_id, message, created_at FROM admin_panel_actions \
             ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("latest_activities", e))?;

        let decode = decode_error("latest_activities");
        rows.iter()
            .map(|row| {
                Ok(Activity {
                    id: ActivityId::from_uuid(row.try_get("id").map_err(&decode)?),
                    name: row.try_get("name").map_err(&decode)?,
                    user_id: UserId::from_uuid(row.try_get("user_id").map_err(&decode)?),
                    message: row.try_get("message").map_err(&decode)?,
                    created_at: row.try_get("created_at").map_err(&decode)?,
                })
            })
            .collect()
    }
}
