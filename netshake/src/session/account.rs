//! Login credentials.

use secrecy::{ExposeSecret, SecretString};

/// Username plus the secrets used during the handshake.
///
/// Secrets are held as [`SecretString`] so they are redacted from `Debug`
/// output and zeroed on drop.
#[derive(Debug, Clone)]
pub struct Account {
    username: String,
    password: SecretString,
    elevation_secret: Option<SecretString>,
}

impl Account {
    /// Create an account with a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            elevation_secret: None,
        }
    }

    /// Set a separate secret for privilege elevation.
    pub fn with_elevation_secret(mut self, secret: impl Into<String>) -> Self {
        self.elevation_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The login password.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// The elevation secret, or the login password when none was set.
    pub fn elevation_secret(&self) -> &SecretString {
        self.elevation_secret.as_ref().unwrap_or(&self.password)
    }

    /// Whether a dedicated elevation secret was set.
    pub fn has_elevation_secret(&self) -> bool {
        self.elevation_secret.is_some()
    }

    pub(crate) fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }

    pub(crate) fn expose_elevation_secret(&self) -> &str {
        self.elevation_secret().expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_secret_falls_back_to_password() {
        let account = Account::new("admin", "secret");
        assert!(!account.has_elevation_secret());
        assert_eq!(account.expose_elevation_secret(), "secret");

        let account = account.with_elevation_secret("enable-me");
        assert_eq!(account.expose_elevation_secret(), "enable-me");
        assert_eq!(account.expose_password(), "secret");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let account = Account::new("admin", "hunter2").with_elevation_secret("s3cret");
        let rendered = format!("{account:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("s3cret"));
    }
}
