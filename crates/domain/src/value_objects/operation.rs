//! E-utilities operations and response modes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Remote operation addressed by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// ESearch: term query returning matching identifiers
    Search,
    /// EFetch: full records for a list of identifiers
    Fetch,
}

impl Operation {
    /// Endpoint path relative to the E-utilities base URL
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Search => "esearch.fcgi",
            Self::Fetch => "efetch.fcgi",
        }
    }

    /// Response mode used when the caller does not pick one
    pub const fn default_response_mode(self) -> ResponseMode {
        match self {
            Self::Search => ResponseMode::Json,
            Self::Fetch => ResponseMode::Xml,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => write!(f, "esearch"),
            Self::Fetch => write!(f, "efetch"),
        }
    }
}

/// Value of the `retmode` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Json,
    Xml,
    Text,
}

impl ResponseMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResponseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid response mode: {s}. Use 'json', 'xml' or 'text'")),
        }
    }
}
