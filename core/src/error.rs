use std::path::PathBuf;

use thiserror::Error;

/// Stable machine-readable codes, shared by the bot's logs and the CLI output.
pub mod codes {
    pub const UNKNOWN_ACTIVITY: &str = "unknown_activity";
    pub const SESSION_NOT_FOUND: &str = "session_not_found";
    pub const SESSION_EXPIRED: &str = "session_expired";
    pub const MAPPING_UNREADABLE: &str = "mapping_unreadable";
    pub const MAPPING_INVALID: &str = "mapping_invalid";
    pub const RECORD_NOT_FOUND: &str = "record_not_found";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const PLATFORM_ERROR: &str = "platform_error";
}

/// Errors raised while driving a selection session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("activity '{0}' is not in the catalog")]
    UnknownActivity(String),
    #[error("no selection session is open for this interaction")]
    SessionNotFound,
    #[error("selection session expired after inactivity")]
    SessionExpired,
}

impl FlowError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownActivity(_) => codes::UNKNOWN_ACTIVITY,
            Self::SessionNotFound => codes::SESSION_NOT_FOUND,
            Self::SessionExpired => codes::SESSION_EXPIRED,
        }
    }
}

/// Why the activity → provider mapping could not be used.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("cannot read mapping file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mapping file is not a JSON object: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("mapping entry '{activity}' has a non-numeric identity: {value}")]
    InvalidIdentity { activity: String, value: String },
}

impl AssignmentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => codes::MAPPING_UNREADABLE,
            Self::Parse(_) | Self::InvalidIdentity { .. } => codes::MAPPING_INVALID,
        }
    }
}

/// Failure reported by the chat platform behind a surface trait.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("target not found on the platform")]
    NotFound,
    #[error("platform request failed: {0}")]
    Platform(String),
}

/// I/O failures that end a validation attempt. Authorization and recovery
/// misses are outcomes, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("could not read ticket channel history: {0}")]
    History(#[source] SurfaceError),
    #[error("could not post the fulfillment notice: {0}")]
    Notice(#[source] SurfaceError),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        codes::PLATFORM_ERROR
    }
}
