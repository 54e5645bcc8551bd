//! Credentials handed to view-models by the hosting shell.

use secrecy::{ExposeSecret, SecretString};

/// Access token and CSRF token for the current user, read once by the shell
/// and injected into every operation. View-models never create, rotate, or
/// delete these values.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    pub token: Option<SecretString>,
    pub csrf_token: Option<SecretString>,
}

impl AuthContext {
    /// Builds a context, treating empty strings as absent.
    #[must_use]
    pub fn new(token: Option<SecretString>, csrf_token: Option<SecretString>) -> Self {
        Self {
            token: token.filter(non_empty),
            csrf_token: csrf_token.filter(non_empty),
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|secret| secret.expose_secret())
    }

    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_ref().map(|secret| secret.expose_secret())
    }
}

fn non_empty(secret: &SecretString) -> bool {
    !secret.expose_secret().trim().is_empty()
}
