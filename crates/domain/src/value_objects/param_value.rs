//! Request parameter values

use serde::{Deserialize, Serialize};

/// A single request parameter value
///
/// Lists keep their order: identifier lists are order-sensitive for
/// E-utilities, so `[1, 2, 3]` and `[3, 2, 1]` are different requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Render the value the way it travels in a query string
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::List(values) => values.join(","),
        }
    }

    /// Normalize into a list, splitting a comma-separated single value
    ///
    /// `"1, 2"` and `["1", "2"]` become the same value. Order is kept and
    /// empty items are dropped.
    #[must_use]
    pub fn into_list(self) -> Self {
        match self {
            Self::Single(value) => Self::List(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(ToString::to_string)
                    .collect(),
            ),
            list @ Self::List(_) => list,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<&[String]> for ParamValue {
    fn from(values: &[String]) -> Self {
        Self::List(values.to_vec())
    }
}
