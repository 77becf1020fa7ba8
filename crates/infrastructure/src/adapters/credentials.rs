//! Request credentials

use std::fmt;

use domain::ContactEmail;
use secrecy::{ExposeSecret, SecretString};

/// Identification appended to every outbound E-utilities call
///
/// Kept out of request descriptors so that fingerprints and cached payloads
/// do not depend on who asked.
#[derive(Clone)]
pub struct Credentials {
    email: ContactEmail,
    api_key: Option<SecretString>,
    tool: String,
}

impl Credentials {
    /// Create credentials; a blank API key counts as none
    pub fn new(email: ContactEmail, api_key: Option<SecretString>, tool: impl Into<String>) -> Self {
        let api_key = api_key.filter(|key| !key.expose_secret().trim().is_empty());
        Self {
            email,
            api_key,
            tool: tool.into(),
        }
    }

    pub const fn email(&self) -> &ContactEmail {
        &self.email
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Query parameters: `tool`, `email` and, when configured, `api_key`
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("tool".to_string(), self.tool.clone()),
            ("email".to_string(), self.email.as_str().to_string()),
        ];
        if let Some(key) = &self.api_key {
            pairs.push(("api_key".to_string(), key.expose_secret().to_string()));
        }
        pairs
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email.as_str())
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("tool", &self.tool)
            .finish()
    }
}
