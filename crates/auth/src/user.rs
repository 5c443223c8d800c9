//! Panel users: the capability set the admin panel needs from a user entity,
//! plus the default `AdminUser` implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adminpanel_core::{Entity, SoftDeletable, UserId};

use crate::{AuthError, Role, UserForm, password, random};

/// Placeholder avatar service used when a user never uploaded one.
const AVATAR_FALLBACK: &str = "https://api.adorable.io/avatars/150";

// ─────────────────────────────────────────────────────────────────────────────
// Capability trait
// ─────────────────────────────────────────────────────────────────────────────

/// What the admin panel requires from an application-supplied user entity.
///
/// A panel user is authenticatable (email + password hash), role-bearing
/// (stored role name, parsed by [`Role::parse`]) and form-constructible.
/// Host applications with their own user type implement this trait and plug
/// the type into the stores, services and controllers generically.
pub trait PanelUser:
    Entity<Id = UserId> + SoftDeletable + Clone + Send + Sync + core::fmt::Debug + 'static
{
    fn email(&self) -> &str;
    fn name(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    fn role_name(&self) -> &str;
    fn set_role_name(&mut self, role: String);

    fn password_hash(&self) -> &str;
    fn set_password_hash(&mut self, hash: String);

    fn should_reset_password(&self) -> bool;
    fn set_should_reset_password(&mut self, value: bool);

    /// Build a new user from a validated form and an already hashed password.
    fn from_form(form: &UserForm, password_hash: String, should_reset_password: bool) -> Self;

    /// Copy every form field except password and role onto the user.
    fn update_non_password_values(&mut self, form: &UserForm);

    /// Pre-filled form for the edit page.
    fn to_form(&self) -> UserForm;

    /// The default account inserted by the seeder.
    fn make_seeded_user() -> Result<Self, AuthError>;

    /// Account provisioned on first single-sign-on login.
    fn make_sso_user(email: &str) -> Result<Self, AuthError>;

    /// Template-facing representation (never includes the password hash).
    fn view(&self) -> serde_json::Value;

    fn role(&self) -> Option<Role> {
        Role::parse(self.role_name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AdminUser
// ─────────────────────────────────────────────────────────────────────────────

/// Default panel user.
///
/// # Invariants
/// - `email` is unique among live (not soft-deleted) users; checked at
///   validation time by the caller against the store.
/// - `password_hash` is always a PHC string, never a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: UserId,
    pub name: String,
    pub title: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub should_reset_password: bool,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AdminUser {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: impl Into<String>,
        should_reset_password: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            title: title.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: role.into(),
            should_reset_password,
            avatar: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(avatar) => avatar.clone(),
            None => format!("{AVATAR_FALLBACK}/{}.png", self.email),
        }
    }
}

impl Entity for AdminUser {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl SoftDeletable for AdminUser {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
}

impl PanelUser for AdminUser {
    fn email(&self) -> &str {
        &self.email
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn role_name(&self) -> &str {
        &self.role
    }

    fn set_role_name(&mut self, role: String) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.updated_at = Utc::now();
    }

    fn should_reset_password(&self) -> bool {
        self.should_reset_password
    }

    fn set_should_reset_password(&mut self, value: bool) {
        self.should_reset_password = value;
    }

    fn from_form(form: &UserForm, password_hash: String, should_reset_password: bool) -> Self {
        Self::new(
            form.name.trim(),
            form.title.trim(),
            form.email.trim(),
            password_hash,
            form.role.trim(),
            should_reset_password,
        )
    }

    fn update_non_password_values(&mut self, form: &UserForm) {
        self.name = form.name.trim().to_string();
        self.title = form.title.trim().to_string();
        self.email = form.email.trim().to_string();
        self.updated_at = Utc::now();
    }

    fn to_form(&self) -> UserForm {
        UserForm {
            name: self.name.clone(),
            email: self.email.clone(),
            title: self.title.clone(),
            role: self.role.clone(),
            should_reset_password: self.should_reset_password,
            ..Default::default()
        }
    }

    fn make_seeded_user() -> Result<Self, AuthError> {
        Ok(Self::new(
            "Admin",
            "Default admin account",
            "admin@admin.com",
            password::hash_password("admin")?,
            Role::SuperAdmin.as_str(),
            false,
        ))
    }

    fn make_sso_user(email: &str) -> Result<Self, AuthError> {
        Ok(Self::new(
            "Admin",
            "Nodes Admin",
            email,
            password::hash_password(&random::random_string(16))?,
            Role::SuperAdmin.as_str(),
            false,
        ))
    }

    fn view(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.to_string(),
            "name": self.name,
            "title": self.title,
            "email": self.email,
            "role": self.role,
            "avatarUrl": self.avatar_url(),
            "createdAt": self.created_at.to_rfc3339(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
