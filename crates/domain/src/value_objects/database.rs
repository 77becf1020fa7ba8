//! Entrez database name

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Name of an Entrez database (`pubmed`, `nucleotide`, `protein`, ...)
///
/// Names are lowercased and restricted to ASCII letters, digits and
/// underscores, which covers every database E-utilities exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Database(String);

impl Database {
    /// Create a database name, validating its characters
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains unsupported characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into().trim().to_lowercase();
        if name.is_empty() {
            return Err(DomainError::InvalidDatabase(
                "database name cannot be empty".to_string(),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::InvalidDatabase(name));
        }
        Ok(Self(name))
    }

    /// The PubMed citation database
    pub fn pubmed() -> Self {
        Self("pubmed".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Database {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Database> for String {
    fn from(value: Database) -> Self {
        value.0
    }
}
