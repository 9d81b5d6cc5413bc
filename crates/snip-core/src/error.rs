use thiserror::Error;

/// Result type for constructing core values.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while constructing core values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid validity: {0}")]
    InvalidValidity(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Per-entry allocation failures.
///
/// These are returned as values so a batch can collect one outcome per
/// entry. The `Display` output is the message shown next to the entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Invalid URL format")]
    InvalidUrl { url: String, reason: String },
    #[error("Validity must be between 1 and 525,600 minutes")]
    InvalidValidity { reason: String },
    #[error("Custom code must be 3-20 characters (alphanumeric, hyphens, underscores only)")]
    InvalidCustomCode { code: String, reason: String },
    #[error("Custom code is already in use")]
    CodeTaken { code: String },
}

impl AllocationError {
    /// Returns a diagnostic string with the rejected input, for logs.
    pub fn detail(&self) -> String {
        match self {
            AllocationError::InvalidUrl { url, reason } => format!("{url}: {reason}"),
            AllocationError::InvalidValidity { reason } => reason.clone(),
            AllocationError::InvalidCustomCode { code, reason } => format!("{code}: {reason}"),
            AllocationError::CodeTaken { code } => code.clone(),
        }
    }
}
