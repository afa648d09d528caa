use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds relayed to pod callers alongside the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Decode,
    Argument,
    NotFound,
    Store,
    Canceled,
    UnknownOperation,
}

#[derive(Debug, Error)]
pub enum PodError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Argument error: {0}")]
    Argument(String),

    #[error("no documents in result")]
    NotFound,

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("operation canceled")]
    Canceled,

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl PodError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Argument(_) => ErrorKind::Argument,
            Self::NotFound => ErrorKind::NotFound,
            Self::Store { .. } => ErrorKind::Store,
            Self::Canceled => ErrorKind::Canceled,
            Self::UnknownOperation(_) => ErrorKind::UnknownOperation,
        }
    }

    pub(crate) fn store(context: &'static str, source: StoreError) -> Self {
        Self::Store { context, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_kebab_case() {
        let s = serde_json::to_string(&PodError::NotFound.kind()).unwrap();
        assert_eq!(s, "\"not-found\"");
        let s = serde_json::to_string(&ErrorKind::UnknownOperation).unwrap();
        assert_eq!(s, "\"unknown-operation\"");
    }

    #[test]
    fn store_error_keeps_context_and_source() {
        let e = PodError::store("findOne failed with", StoreError::Driver("socket closed".into()));
        assert_eq!(e.kind(), ErrorKind::Store);
        assert_eq!(e.to_string(), "findOne failed with: Driver error: socket closed");
        assert!(std::error::Error::source(&e).is_some());
    }
}
