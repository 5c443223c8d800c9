use adminpanel_core::DomainError;

use crate::{PanelUser, Role};

/// Role-based gate for panel content.
///
/// The gate only knows about roles. Identity rules ("a user may edit
/// themself") belong to the caller.
pub struct Gate;

impl Gate {
    /// Whether `role` is at least as privileged as `required`.
    ///
    /// - No IO
    /// - No panics
    /// - Pure ordinal comparison
    pub fn allow(role: Role, required: Role) -> bool {
        role.ordinal() <= required.ordinal()
    }

    /// String-keyed variant used by templates and stored role names.
    ///
    /// Both sides are parsed case-insensitively; an unknown name on either
    /// side denies.
    pub fn allow_names(role: &str, required: &str) -> bool {
        match (Role::parse(role), Role::parse(required)) {
            (Some(role), Some(required)) => Self::allow(role, required),
            _ => false,
        }
    }

    /// Whether the user's stored role satisfies `required`.
    pub fn allow_user<U: PanelUser>(user: &U, required: Role) -> bool {
        match user.role() {
            Some(role) => Self::allow(role, required),
            None => false,
        }
    }

    /// Deny with `NotFound` so the caller never learns the endpoint exists.
    pub fn assert_allowed<U: PanelUser>(user: &U, required: Role) -> Result<(), DomainError> {
        if Self::allow_user(user, required) {
            Ok(())
        } else {
            tracing::debug!(
                user_role = user.role_name(),
                required = required.as_str(),
                "gate denied"
            );
            Err(DomainError::NotFound)
        }
    }
}
