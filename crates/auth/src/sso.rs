//! Single-sign-on callback validation.
//!
//! The identity provider signs the callback with
//! `hex(sha256(salt.replace("#email", email)))`.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Placeholder in the configured salt that is substituted by the email.
pub const EMAIL_PLACEHOLDER: &str = "#email";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SsoError {
    #[error("Missing token")]
    MissingToken,

    #[error("Token did not match. Try again")]
    TokenMismatch,
}

/// Token the identity provider is expected to send for `email`.
pub fn expected_token(salt: &str, email: &str) -> String {
    let digest = Sha256::digest(salt.replace(EMAIL_PLACEHOLDER, email).as_bytes());
    format!("{:x}", digest)
}

/// Check the `token` / `email` pair of a callback. Both must be present and
/// non-empty; the comparison runs in constant time.
pub fn verify_callback(
    salt: &str,
    email: Option<&str>,
    token: Option<&str>,
) -> Result<(), SsoError> {
    let (email, token) = match (email, token) {
        (Some(email), Some(token)) if !email.is_empty() && !token.is_empty() => (email, token),
        _ => return Err(SsoError::MissingToken),
    };

    let expected = expected_token(salt, email);
    if bool::from(expected.as_bytes().ct_eq(token.as_bytes())) {
        Ok(())
    } else {
        Err(SsoError::TokenMismatch)
    }
}

/// Hosts on which the SSO round-trip is skipped.
pub fn is_localhost(host: &str) -> bool {
    let host = host.split(':').next().unwrap_or(host);
    matches!(host, "0.0.0.0" | "127.0.0.1")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "pepper-#email-suffix";

    #[test]
    fn expected_token_substitutes_email() {
        let token = expected_token(SALT, "a@example.com");
        assert_eq!(token.len(), 64);
        assert_eq!(token, expected_token("pepper-a@example.com-suffix", "ignored"));
    }

    #[test]
    fn matching_token_is_accepted() {
        let token = expected_token(SALT, "a@example.com");
        assert_eq!(verify_callback(SALT, Some("a@example.com"), Some(&token)), Ok(()));
    }

    #[test]
    fn token_for_another_email_is_rejected() {
        let token = expected_token(SALT, "b@example.com");
        assert_eq!(
            verify_callback(SALT, Some("a@example.com"), Some(&token)),
            Err(SsoError::TokenMismatch)
        );
    }

    #[test]
    fn missing_parameters() {
        assert_eq!(verify_callback(SALT, None, Some("x")), Err(SsoError::MissingToken));
        assert_eq!(verify_callback(SALT, Some("a@example.com"), None), Err(SsoError::MissingToken));
        assert_eq!(verify_callback(SALT, Some(""), Some("")), Err(SsoError::MissingToken));
    }

    #[test]
    fn localhost_detection_ignores_port() {
        assert!(is_localhost("127.0.0.1:8080"));
        assert!(is_localhost("0.0.0.0"));
        assert!(!is_localhost("admin.example.com"));
    }
}
