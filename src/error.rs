//! Typed errors for collection cycles.

use std::error::Error as StdError;

/// Broad class of a [`CollectError`]; the scheduler matches on this at the cycle boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An account or role could not be assumed.
    Access,
    /// Listing, paginating, parsing, or uploading failed. Retried next cycle.
    Transient,
    /// Invalid configuration. Not recoverable by retrying.
    Config,
}

#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    #[error("access denied for account {account}: {message}")]
    AccessDenied { account: String, message: String },

    #[error("{context}")]
    Transient {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    #[error("remote error: {0}")]
    Remote(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type CollectResult<T> = std::result::Result<T, CollectError>;

impl CollectError {
    pub fn access_denied(account: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccessDenied {
            account: account.into(),
            message: message.into(),
        }
    }

    /// Wrap any error as transient, keeping the source chain.
    pub fn transient(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transient {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied { .. } => ErrorKind::Access,
            Self::Transient { .. } | Self::Remote(_) => ErrorKind::Transient,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        self.kind() == ErrorKind::Access
    }
}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        Self::transient("i/o error", e)
    }
}

impl From<rusqlite::Error> for CollectError {
    fn from(e: rusqlite::Error) -> Self {
        Self::transient("inventory database error", e)
    }
}

impl From<serde_json::Error> for CollectError {
    fn from(e: serde_json::Error) -> Self {
        Self::transient("malformed record", e)
    }
}
