//! `adminpanel-infra`: storage, mail, configuration and the password reset
//! workflow.

pub mod activity;
pub mod config;
pub mod error;
pub mod mail;
pub mod reset;
pub mod seeder;
pub mod session;
pub mod store;

pub use activity::{Activity, FEED_LENGTH};
pub use config::{ConfigError, EmailSender, Environment, PanelConfig, Skin, SsoConfig};
pub use error::StoreError;
pub use mail::{Address, Email, LogMailer, MailError, Mailer, OutboxMailer, send_templated_email};
pub use reset::{PasswordResetService, ResetError, ResetSubmission};
pub use seeder::{SeedError, SeedOutcome, Seeder};
pub use session::Session;
pub use store::{
    ActivityStore, InMemoryActivityStore, InMemoryResetTokenStore, InMemorySessionStore,
    InMemoryUserStore, ResetTokenStore, SessionStore, UserStore,
};
