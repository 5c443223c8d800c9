//! Panel configuration.
//!
//! Loaded from `ADMIN_PANEL_*` environment variables. Missing optional
//! sections fall back to "disabled" with a warning; half-configured sections
//! are rejected so a typo never silently turns a feature off.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use thiserror::Error;

use adminpanel_auth::AuthSessionGuard;
use adminpanel_core::UserId;

pub const DEFAULT_PANEL_NAME: &str = "Admin Panel";
pub const DEFAULT_BASE_URL: &str = "127.0.0.1:8080";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";
pub const DEFAULT_DASHBOARD_PATH: &str = "/admin/dashboard";
pub const DEFAULT_SESSION_IDLE_MINUTES: i64 = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid ADMIN_PANEL_ENV: {0} (expected production, development, testing or local)")]
    InvalidEnvironment(String),

    #[error("incomplete email configuration: {0} is not set")]
    IncompleteEmail(&'static str),

    #[error("incomplete SSO configuration: {0} is not set")]
    IncompleteSso(&'static str),

    #[error("invalid ADMIN_PANEL_SESSION_IDLE_MINUTES: {0} (expected a positive number of minutes)")]
    InvalidSessionIdle(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
    Testing,
    Local,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Local => "local",
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn is_local(self) -> bool {
        self == Environment::Local
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "development" => Ok(Environment::Development),
            "testing" => Ok(Environment::Testing),
            "local" => Ok(Environment::Local),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Skin
// ─────────────────────────────────────────────────────────────────────────────

/// AdminLTE colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skin {
    #[default]
    Blue,
    BlueLight,
    Yellow,
    YellowLight,
    Green,
    GreenLight,
    Purple,
    PurpleLight,
    Red,
    RedLight,
    Black,
    BlackLight,
}

impl Skin {
    pub const ALL: [Skin; 12] = [
        Skin::Blue,
        Skin::BlueLight,
        Skin::Yellow,
        Skin::YellowLight,
        Skin::Green,
        Skin::GreenLight,
        Skin::Purple,
        Skin::PurpleLight,
        Skin::Red,
        Skin::RedLight,
        Skin::Black,
        Skin::BlackLight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Skin::Blue => "blue",
            Skin::BlueLight => "blue-light",
            Skin::Yellow => "yellow",
            Skin::YellowLight => "yellow-light",
            Skin::Green => "green",
            Skin::GreenLight => "green-light",
            Skin::Purple => "purple",
            Skin::PurpleLight => "purple-light",
            Skin::Red => "red",
            Skin::RedLight => "red-light",
            Skin::Black => "black",
            Skin::BlackLight => "black-light",
        }
    }

    pub fn css_class(self) -> String {
        format!("skin-{}", self.as_str())
    }

    pub fn parse(value: &str) -> Option<Skin> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|skin| skin.as_str() == value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// Sender used for every outgoing panel email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSender {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoConfig {
    pub redirect_url: String,
    pub salt: String,
    pub callback_path: String,
}

type EditPathFn = dyn Fn(&UserId) -> String + Send + Sync;

/// Everything the panel needs to know about its host.
#[derive(Clone)]
pub struct PanelConfig {
    pub env: Environment,
    pub panel_name: String,
    pub base_url: String,
    pub skin: Skin,
    pub email: Option<EmailSender>,
    pub sso: Option<SsoConfig>,
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub login_path: String,
    pub dashboard_path: String,
    /// Sessions untouched for longer than this are discarded.
    pub session_idle_timeout: Duration,
    pub(crate) password_edit_path: Arc<EditPathFn>,
}

impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("env", &self.env)
            .field("panel_name", &self.panel_name)
            .field("base_url", &self.base_url)
            .field("skin", &self.skin)
            .field("email", &self.email)
            .field("sso", &self.sso.as_ref().map(|s| &s.redirect_url))
            .field("bind_addr", &self.bind_addr)
            .field("login_path", &self.login_path)
            .field("dashboard_path", &self.dashboard_path)
            .field("session_idle_timeout", &self.session_idle_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            panel_name: DEFAULT_PANEL_NAME.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            skin: Skin::default(),
            email: None,
            sso: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_string(),
            session_idle_timeout: Duration::minutes(DEFAULT_SESSION_IDLE_MINUTES),
            password_edit_path: Arc::new(default_password_edit_path),
        }
    }
}

fn default_password_edit_path(id: &UserId) -> String {
    format!("/admin/backend/users/{id}/edit")
}

impl PanelConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = PanelConfig::default();

        match get("ADMIN_PANEL_ENV") {
            Some(env) => config.env = env.parse()?,
            None => tracing::warn!("ADMIN_PANEL_ENV not set; using development"),
        }

        if let Some(name) = get("ADMIN_PANEL_NAME") {
            config.panel_name = name;
        }

        match get("ADMIN_PANEL_BASE_URL") {
            Some(url) => config.base_url = url.trim_end_matches('/').to_string(),
            None => tracing::warn!(default = DEFAULT_BASE_URL, "ADMIN_PANEL_BASE_URL not set"),
        }

        if let Some(skin) = get("ADMIN_PANEL_SKIN") {
            match Skin::parse(&skin) {
                Some(parsed) => config.skin = parsed,
                None => tracing::warn!(skin = %skin, "unknown ADMIN_PANEL_SKIN; using blue"),
            }
        }

        config.email = match (get("ADMIN_PANEL_FROM_EMAIL"), get("ADMIN_PANEL_FROM_NAME")) {
            (Some(address), Some(name)) => Some(EmailSender { address, name }),
            (Some(_), None) => return Err(ConfigError::IncompleteEmail("ADMIN_PANEL_FROM_NAME")),
            (None, Some(_)) => return Err(ConfigError::IncompleteEmail("ADMIN_PANEL_FROM_EMAIL")),
            (None, None) => {
                tracing::warn!("email not configured; panel emails are disabled");
                None
            }
        };

        let sso_keys = [
            "ADMIN_PANEL_SSO_REDIRECT_URL",
            "ADMIN_PANEL_SSO_SALT",
            "ADMIN_PANEL_SSO_CALLBACK_PATH",
        ];
        config.sso = match sso_keys.map(|key| get(key)) {
            [Some(redirect_url), Some(salt), Some(callback_path)] => Some(SsoConfig {
                redirect_url,
                salt,
                callback_path,
            }),
            [None, None, None] => {
                tracing::warn!("SSO not configured; single sign-on is disabled");
                None
            }
            values => {
                let missing = sso_keys
                    .iter()
                    .zip(values.iter())
                    .find(|(_, v)| v.is_none())
                    .map(|(k, _)| *k)
                    .unwrap_or(sso_keys[0]);
                return Err(ConfigError::IncompleteSso(missing));
            }
        };

        match get("ADMIN_PANEL_BIND") {
            Some(addr) => config.bind_addr = addr,
            None => tracing::warn!(default = DEFAULT_BIND_ADDR, "ADMIN_PANEL_BIND not set"),
        }

        if let Some(raw) = get("ADMIN_PANEL_SESSION_IDLE_MINUTES") {
            match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => config.session_idle_timeout = Duration::minutes(minutes),
                _ => return Err(ConfigError::InvalidSessionIdle(raw)),
            }
        }

        config.database_url = get("DATABASE_URL");

        Ok(config)
    }

    /// Replace the password edit path used by the session guard.
    pub fn with_password_edit_path(
        mut self,
        path: impl Fn(&UserId) -> String + Send + Sync + 'static,
    ) -> Self {
        self.password_edit_path = Arc::new(path);
        self
    }

    pub fn password_edit_path(&self, id: &UserId) -> String {
        (self.password_edit_path)(id)
    }

    pub fn is_email_enabled(&self) -> bool {
        self.email.is_some()
    }

    /// Avatar uploads are not supported.
    pub fn is_storage_enabled(&self) -> bool {
        false
    }

    pub fn is_sso_enabled(&self) -> bool {
        self.sso.is_some()
    }

    /// The `adminPanel` object exposed to every rendered page.
    pub fn view(&self) -> serde_json::Value {
        json!({
            "name": self.panel_name,
            "skin": self.skin.css_class(),
            "isEmailEnabled": self.is_email_enabled(),
            "isStorageEnabled": self.is_storage_enabled(),
            "isSsoEnabled": self.is_sso_enabled(),
        })
    }

    pub fn guard(&self) -> AuthSessionGuard {
        let edit = Arc::clone(&self.password_edit_path);
        AuthSessionGuard::new(self.login_path.clone(), move |id| edit(id))
    }
}
