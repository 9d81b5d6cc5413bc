use crate::error::{CoreError, Result};
use crate::shortcode::ShortCode;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;
use std::str::FromStr;

/// Opaque identifier of a [`LinkRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(SmolStr);

impl LinkId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(SmolStr::new(uuid::Uuid::new_v4().simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LinkId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifetime of a link in whole minutes, in `[1, 525600]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Validity(u32);

impl Validity {
    pub const MIN_MINUTES: i64 = 1;
    /// One year in minutes.
    pub const MAX_MINUTES: i64 = 525_600;

    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if !(Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&minutes) {
            return Err(CoreError::InvalidValidity(format!(
                "must be between {} and {} minutes, got {}",
                Self::MIN_MINUTES,
                Self::MAX_MINUTES,
                minutes
            )));
        }
        // bounded above, cannot truncate
        Ok(Self(minutes as u32))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> SignedDuration {
        SignedDuration::from_mins(i64::from(self.0))
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self(30)
    }
}

impl TryFrom<i64> for Validity {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_minutes(value)
    }
}

impl From<Validity> for i64 {
    fn from(value: Validity) -> Self {
        i64::from(value.0)
    }
}

impl FromStr for Validity {
    type Err = CoreError;

    /// Parses a whole number of minutes. Fractions and non-numeric input
    /// are rejected rather than rounded.
    fn from_str(s: &str) -> Result<Self> {
        let minutes = s.trim().parse::<i64>().map_err(|_| {
            CoreError::InvalidValidity(format!("not a whole number of minutes: '{}'", s))
        })?;
        Self::from_minutes(minutes)
    }
}

impl Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// Checks that `url` is an absolute URL with both a scheme and a host.
pub fn validate_destination(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url.trim())
        .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", url, e)))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(CoreError::InvalidUrl(format!(
            "URL must have a valid scheme and host: {}",
            url
        )));
    }

    Ok(())
}

/// A shortened link.
///
/// Every field except the click counter is fixed at creation. Whether the
/// link is active is derived from `expires_at` on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    id: LinkId,
    original_url: String,
    short_code: ShortCode,
    validity: Validity,
    created_at: Timestamp,
    expires_at: Timestamp,
    click_count: u64,
}

impl LinkRecord {
    /// Creates a fresh record with no clicks, expiring `validity` after `created_at`.
    pub fn new(
        original_url: impl Into<String>,
        short_code: ShortCode,
        validity: Validity,
        created_at: Timestamp,
    ) -> Result<Self> {
        let expires_at = created_at
            .checked_add(validity.as_duration())
            .map_err(|e| CoreError::InvalidValidity(format!("expiry out of range: {e}")))?;

        Ok(Self {
            id: LinkId::generate(),
            original_url: original_url.into(),
            short_code,
            validity,
            created_at,
            expires_at,
            click_count: 0,
        })
    }

    /// Reassembles a record read back from storage.
    ///
    /// The stored `expires_at` is kept as-is, never recomputed.
    pub fn restore(
        id: LinkId,
        original_url: String,
        short_code: ShortCode,
        validity: Validity,
        created_at: Timestamp,
        expires_at: Timestamp,
        click_count: u64,
    ) -> Self {
        Self {
            id,
            original_url,
            short_code,
            validity,
            created_at,
            expires_at,
            click_count,
        }
    }

    pub fn id(&self) -> &LinkId {
        &self.id
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn short_code(&self) -> &ShortCode {
        &self.short_code
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn click_count(&self) -> u64 {
        self.click_count
    }

    /// A link is active strictly before its expiry instant.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    pub fn short_url(&self, base_url: &str) -> String {
        self.short_code.to_url(base_url)
    }

    /// Bumps the click counter by one. Only the click ledger calls this,
    /// alongside appending the matching event.
    pub fn register_click(&mut self) {
        self.click_count = self.click_count.saturating_add(1);
    }
}
