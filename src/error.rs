use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Errors raised while parsing or validating policy rows.
///
/// These are load-time failures; an engine is never built from rows that
/// produced one.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyError {
    #[error("failed to parse policy: {0}")]
    ParseError(String),

    #[error("line {line}: invalid resource pattern '{pattern}' (expected '-', '*' or an exact identifier)")]
    InvalidResourcePattern { line: usize, pattern: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Failures of a [`PolicyStore`](crate::store::PolicyStore) or of the
/// context guarding a store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tag for [`AuthzError`], so callers can branch without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    PolicyLoadFailure,
    StoreWriteFailure,
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("access denied: {subject} may not {action} {} in {service}", resource_label(.resource))]
    AccessDenied {
        subject: String,
        service: String,
        resource: String,
        action: String,
    },

    #[error("failed to load policy: {0}")]
    PolicyLoad(#[source] StoreError),

    #[error("failed to add {member} to group {group}: {source}")]
    StoreWrite {
        member: String,
        group: String,
        #[source]
        source: StoreError,
    },
}

impl AuthzError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthzError::AccessDenied { .. } => ErrorKind::AccessDenied,
            AuthzError::PolicyLoad(_) => ErrorKind::PolicyLoadFailure,
            AuthzError::StoreWrite { .. } => ErrorKind::StoreWriteFailure,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        self.kind() == ErrorKind::AccessDenied
    }
}

impl From<PolicyError> for AuthzError {
    fn from(err: PolicyError) -> Self {
        AuthzError::PolicyLoad(StoreError::Policy(err))
    }
}

/// Configuration values that could not be interpreted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

fn resource_label(resource: &str) -> &str {
    if resource.is_empty() { "-" } else { resource }
}
