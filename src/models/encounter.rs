//! Encounter identifiers
//!
//! An encounter block is an opaque identifier that scopes every windowing and
//! grouping operation. Source tables carry it either as an integer or as text.

use std::fmt;

/// Identifier of one continuous episode of care
///
/// Integer identifiers sort numerically and text identifiers lexically. A table
/// holds one kind or the other; in a mixed collection integers sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncounterId {
    /// Integer-typed encounter block
    Int(i64),
    /// String-typed encounter block
    Text(String),
}

impl EncounterId {
    /// Whether the identifier came from an integer column
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EncounterId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for EncounterId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for EncounterId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}
