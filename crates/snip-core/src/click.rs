use crate::link::LinkId;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// Maximum number of characters kept from a client string.
pub const CLIENT_MAX_CHARS: usize = 50;

/// Opaque identifier of a [`ClickEvent`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClickId(SmolStr);

impl ClickId {
    pub fn generate() -> Self {
        Self(SmolStr::new(uuid::Uuid::new_v4().simple().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClickId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl Display for ClickId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally supplied details about who followed a link.
///
/// None of these values are validated: the location is a coarse label and
/// the network address is a display string, not a parsed IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickMetadata {
    pub location: String,
    pub network_address: String,
    pub client: String,
}

impl ClickMetadata {
    /// Builds metadata, shortening `client` to [`CLIENT_MAX_CHARS`] plus `...`.
    pub fn new(
        location: impl Into<String>,
        network_address: impl Into<String>,
        client: &str,
    ) -> Self {
        Self {
            location: location.into(),
            network_address: network_address.into(),
            client: truncate_client(client),
        }
    }
}

fn truncate_client(client: &str) -> String {
    let mut truncated: String = client.chars().take(CLIENT_MAX_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// A single recorded click. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub id: ClickId,
    /// Weak reference; the link may have been deleted since.
    pub link_id: LinkId,
    pub timestamp: Timestamp,
    pub location: String,
    pub network_address: String,
    pub client: String,
    /// Denormalized copy of the destination at click time.
    pub original_url: Option<String>,
}

impl ClickEvent {
    pub fn new(
        link_id: LinkId,
        timestamp: Timestamp,
        metadata: ClickMetadata,
        original_url: Option<String>,
    ) -> Self {
        Self {
            id: ClickId::generate(),
            link_id,
            timestamp,
            location: metadata.location,
            network_address: metadata.network_address,
            client: metadata.client,
            original_url,
        }
    }
}
