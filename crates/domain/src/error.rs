//! Domain error types.

use thiserror::Error;

/// Errors surfaced by a [`crate::services::PolicyStore`] or [`crate::services::JobQueue`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// A stored string did not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl From<ParseEnumError> for StoreError {
    fn from(err: ParseEnumError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enum_error_display() {
        let err = ParseEnumError::new("assignment level", "galaxy");
        assert_eq!(err.to_string(), "unknown assignment level value: galaxy");
    }

    #[test]
    fn test_parse_enum_error_into_store_error() {
        let err: StoreError = ParseEnumError::new("feature type", "dns").into();
        assert!(matches!(err, StoreError::Corrupt(ref msg) if msg.contains("dns")));
    }

    #[test]
    fn test_store_error_from_sqlx() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
