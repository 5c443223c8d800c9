//! User form validation.
//!
//! Validation never fails hard: it produces a [`Fieldset`] carrying every
//! submitted value together with per-field messages, which the UI re-renders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Role;

const MAX_LEN: usize = 191;
const MIN_PASSWORD_LEN: usize = 8;

pub const EMAIL_TAKEN: &str = "Provided email already exists.";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters.";

/// Submitted values of the create/edit user form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_repeat: String,
    pub title: String,
    pub role: String,
    pub should_reset_password: bool,
    pub should_send_email: bool,
}

/// One rendered form field: label, current value and validation messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub label: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Field key → state, keyed by the HTML input names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fieldset(BTreeMap<String, FieldState>);

impl Fieldset {
    pub fn get(&self, key: &str) -> Option<&FieldState> {
        self.0.get(key)
    }

    pub fn has_errors(&self) -> bool {
        self.0.values().any(|f| !f.errors.is_empty())
    }

    pub fn add_error(&mut self, key: &str, message: impl Into<String>) {
        if let Some(field) = self.0.get_mut(key) {
            field.errors.push(message.into());
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    fn insert(&mut self, key: &str, label: &str, value: serde_json::Value) {
        self.0.insert(
            key.to_string(),
            FieldState {
                label: label.to_string(),
                value,
                errors: Vec::new(),
            },
        );
    }
}

impl UserForm {
    /// Validate every field and return the resulting fieldset.
    ///
    /// - `ignore_role`: the edit flow does not require a role (users cannot
    ///   change their own, and admins may leave it untouched).
    /// - `email_taken`: whether another live user already owns `email`.
    ///
    /// Password values are never echoed back into the fieldset.
    pub fn validate(&self, ignore_role: bool, email_taken: bool) -> Fieldset {
        let mut fieldset = self.empty_fieldset();

        check_length(&mut fieldset, "name", "Name", &self.name);
        check_length(&mut fieldset, "title", "Title", &self.title);

        if !is_valid_email(&self.email) {
            fieldset.add_error("email", "Invalid email address.");
        } else if email_taken {
            fieldset.add_error("email", EMAIL_TAKEN);
        }

        let password_len = self.password.chars().count();
        if password_len != 0 && !(MIN_PASSWORD_LEN..=MAX_LEN).contains(&password_len) {
            fieldset.add_error("password", PASSWORD_TOO_SHORT);
        }
        if self.password != self.password_repeat {
            fieldset.add_error("passwordRepeat", PASSWORDS_DO_NOT_MATCH);
        }

        if !ignore_role {
            check_length(&mut fieldset, "role", "Role", &self.role);
            if !self.role.trim().is_empty() && Role::parse(self.role.trim()).is_none() {
                fieldset.add_error("role", "Unknown role.");
            }
        }

        fieldset
    }

    /// Fieldset with the current values and no messages (used by the edit page).
    pub fn empty_fieldset(&self) -> Fieldset {
        let mut fieldset = Fieldset::default();
        fieldset.insert("name", "Name", self.name.clone().into());
        fieldset.insert("email", "Email", self.email.clone().into());
        fieldset.insert("password", "Password", "".into());
        fieldset.insert("passwordRepeat", "Repeat password", "".into());
        fieldset.insert("title", "Title", self.title.clone().into());
        fieldset.insert("role", "Role", self.role.clone().into());
        fieldset.insert(
            "shouldResetPassword",
            "Should reset password",
            self.should_reset_password.into(),
        );
        fieldset.insert(
            "shouldSendEmail",
            "Send email with info",
            self.should_send_email.into(),
        );
        fieldset
    }
}

fn check_length(fieldset: &mut Fieldset, key: &str, label: &str, value: &str) {
    let len = value.trim().chars().count();
    if !(1..=MAX_LEN).contains(&len) {
        fieldset.add_error(key, format!("{label} must be between 1 and {MAX_LEN} characters."));
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > MAX_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> UserForm {
        UserForm {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "correct horse".into(),
            password_repeat: "correct horse".into(),
            title: "Editor".into(),
            role: "Admin".into(),
            should_reset_password: false,
            should_send_email: true,
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        let fieldset = valid_form().validate(false, false);
        assert!(!fieldset.has_errors(), "{fieldset:?}");
    }

    #[test]
    fn empty_password_is_allowed() {
        let form = UserForm {
            password: String::new(),
            password_repeat: String::new(),
            ..valid_form()
        };
        assert!(!form.validate(false, false).has_errors());
    }

    #[test]
    fn short_password_and_mismatch_are_reported_per_field() {
        let form = UserForm {
            password: "short".into(),
            password_repeat: "other".into(),
            ..valid_form()
        };
        let fieldset = form.validate(false, false);
        assert_eq!(fieldset.get("password").unwrap().errors, vec![PASSWORD_TOO_SHORT]);
        assert_eq!(
            fieldset.get("passwordRepeat").unwrap().errors,
            vec![PASSWORDS_DO_NOT_MATCH]
        );
    }

    #[test]
    fn taken_email_is_a_field_error() {
        let fieldset = valid_form().validate(false, true);
        assert_eq!(fieldset.get("email").unwrap().errors, vec![EMAIL_TAKEN]);
    }

    #[test]
    fn role_is_checked_unless_ignored() {
        let form = UserForm {
            role: "Janitor".into(),
            ..valid_form()
        };
        assert!(form.validate(false, false).get("role").unwrap().errors.len() == 1);
        assert!(!form.validate(true, false).has_errors());
    }

    #[test]
    fn passwords_are_not_echoed() {
        let fieldset = valid_form().validate(false, false);
        assert_eq!(fieldset.get("password").unwrap().value, "");
        assert_eq!(fieldset.get("name").unwrap().value, "Alice");
    }

    #[test]
    fn fieldset_survives_json() {
        let fieldset = valid_form().validate(false, true);
        let back = Fieldset::from_json(fieldset.to_json()).unwrap();
        assert_eq!(back, fieldset);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("admin@admin.com"));
        assert!(is_valid_email(" padded@example.org "));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
