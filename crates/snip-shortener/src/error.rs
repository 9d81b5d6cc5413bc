use jiff::Timestamp;
use snip_core::LinkId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The click pointed at a link that no longer exists.
    #[error("click references unknown link: {0}")]
    OrphanReference(LinkId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FollowError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("This URL has expired and cannot be accessed.")]
    Expired { code: String, expired_at: Timestamp },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("a batch holds at most {max} entries, got {given}")]
    TooManyEntries { given: usize, max: usize },
}
