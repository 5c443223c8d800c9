//! `adminpanel-auth`: access control and credential logic for the admin panel.
//!
//! This crate is intentionally decoupled from HTTP and storage: every function
//! here is a pure decision over values handed in by the caller.

pub mod error;
pub mod form;
pub mod gate;
pub mod guard;
pub mod password;
pub mod random;
pub mod reset_token;
pub mod roles;
pub mod sso;
pub mod user;

pub use error::AuthError;
pub use form::{FieldState, Fieldset, UserForm};
pub use gate::Gate;
pub use guard::{AuthSessionGuard, GuardDecision, post_login_target};
pub use reset_token::ResetToken;
pub use roles::Role;
pub use sso::SsoError;
pub use user::{AdminUser, PanelUser};
