use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::errors::AuthError;

/// Shared-secret check for inbound submissions.
#[derive(Clone, Debug)]
pub struct Authenticator {
    expected: SecretString,
}

impl Authenticator {
    pub fn new(expected: SecretString) -> Self {
        Self { expected }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.api_key.clone())
    }

    /// An empty configured key rejects everything.
    pub fn verify(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let provided = match provided {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::Missing),
        };

        let expected = self.expected.expose_secret();
        let matches: bool = expected.as_bytes().ct_eq(provided.as_bytes()).into();
        if expected.is_empty() || !matches {
            return Err(AuthError::Invalid);
        }

        Ok(())
    }
}
