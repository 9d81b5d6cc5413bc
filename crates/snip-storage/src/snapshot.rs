//! Persisted layouts of the link and click collections.
//!
//! Field names follow the stored JSON (`camelCase`), timestamps are
//! RFC 3339 strings. `isActive` is written for readers of the raw data
//! only; it is recomputed from `expiresAt` and ignored on load.

use crate::error::{Result, StorageError};
use crate::store::KeyValueStore;
use jiff::Timestamp;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use snip_core::{ClickEvent, ClickId, LinkId, LinkRecord, ShortCode, Validity};

/// Store key of the link collection.
pub const LINKS_KEY: &str = "shortenedUrls";
/// Store key of the click collection.
pub const CLICKS_KEY: &str = "urlClickData";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
    pub id: String,
    pub original_url: String,
    pub shortened_url: String,
    pub short_code: String,
    #[serde(deserialize_with = "minutes")]
    pub validity: i64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub clicks: u64,
    #[serde(default)]
    pub is_active: bool,
}

impl LinkEntry {
    pub fn from_record(record: &LinkRecord, base_url: &str, now: Timestamp) -> Self {
        Self {
            id: record.id().to_string(),
            original_url: record.original_url().to_owned(),
            shortened_url: record.short_url(base_url),
            short_code: record.short_code().to_string(),
            validity: i64::from(record.validity().minutes()),
            created_at: record.created_at(),
            expires_at: record.expires_at(),
            clicks: record.click_count(),
            is_active: record.is_active_at(now),
        }
    }

    pub fn into_record(self) -> Result<LinkRecord> {
        let validity = Validity::from_minutes(self.validity).map_err(|e| {
            StorageError::InvalidData(format!("link {}: {e}", self.id))
        })?;

        Ok(LinkRecord::restore(
            LinkId::from(self.id.as_str()),
            self.original_url,
            ShortCode::new_unchecked(&self.short_code),
            validity,
            self.created_at,
            self.expires_at,
            self.clicks,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEntry {
    pub id: String,
    pub url_id: String,
    pub timestamp: Timestamp,
    pub location: String,
    pub ip: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl From<&ClickEvent> for ClickEntry {
    fn from(event: &ClickEvent) -> Self {
        Self {
            id: event.id.to_string(),
            url_id: event.link_id.to_string(),
            timestamp: event.timestamp,
            location: event.location.clone(),
            ip: event.network_address.clone(),
            user_agent: event.client.clone(),
            original_url: event.original_url.clone(),
        }
    }
}

impl From<ClickEntry> for ClickEvent {
    fn from(entry: ClickEntry) -> Self {
        ClickEvent {
            id: ClickId::from(entry.id.as_str()),
            link_id: LinkId::from(entry.url_id.as_str()),
            timestamp: entry.timestamp,
            location: entry.location,
            network_address: entry.ip,
            client: entry.user_agent,
            original_url: entry.original_url,
        }
    }
}

/// Reads the JSON array stored under `key`. A missing key is an empty collection.
pub fn read_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Vec<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StorageError::InvalidData(format!("{key}: {e}"))),
        None => Ok(Vec::new()),
    }
}

/// Replaces the collection under `key` with `entries`.
pub fn write_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    entries: &[T],
) -> Result<()> {
    let raw = serde_json::to_string(entries)
        .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))?;
    store.set(key, &raw)
}

pub fn load_links(store: &dyn KeyValueStore) -> Result<Vec<LinkRecord>> {
    read_collection::<LinkEntry>(store, LINKS_KEY)?
        .into_iter()
        .map(LinkEntry::into_record)
        .collect()
}

pub fn save_links(
    store: &dyn KeyValueStore,
    records: &[LinkRecord],
    base_url: &str,
    now: Timestamp,
) -> Result<()> {
    let entries: Vec<LinkEntry> = records
        .iter()
        .map(|record| LinkEntry::from_record(record, base_url, now))
        .collect();
    write_collection(store, LINKS_KEY, &entries)
}

pub fn load_clicks(store: &dyn KeyValueStore) -> Result<Vec<ClickEvent>> {
    Ok(read_collection::<ClickEntry>(store, CLICKS_KEY)?
        .into_iter()
        .map(ClickEvent::from)
        .collect())
}

pub fn save_clicks(store: &dyn KeyValueStore, events: &[ClickEvent]) -> Result<()> {
    let entries: Vec<ClickEntry> = events.iter().map(ClickEntry::from).collect();
    write_collection(store, CLICKS_KEY, &entries)
}

/// Older data stored the validity exactly as typed, so accept `30` or `"30"`.
fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Minutes {
        Number(i64),
        Text(String),
    }

    match Minutes::deserialize(deserializer)? {
        Minutes::Number(n) => Ok(n),
        Minutes::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("validity is not a whole number: '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use snip_core::ClickMetadata;

    fn at(second: i64) -> Timestamp {
        Timestamp::from_second(second).unwrap()
    }

    fn sample_record() -> LinkRecord {
        LinkRecord::new(
            "https://example.com",
            ShortCode::new("abc123").unwrap(),
            Validity::from_minutes(30).unwrap(),
            at(1_700_000_000),
        )
        .unwrap()
    }

    #[test]
    fn link_entry_uses_stored_field_names() {
        let record = sample_record();
        let entry = LinkEntry::from_record(&record, "http://localhost:5174", at(1_700_000_000));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["originalUrl"], "https://example.com");
        assert_eq!(json["shortenedUrl"], "http://localhost:5174/s/abc123");
        assert_eq!(json["shortCode"], "abc123");
        assert_eq!(json["validity"], 30);
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
        assert_eq!(json["expiresAt"], "2023-11-14T22:43:20Z");
        assert_eq!(json["clicks"], 0);
        assert_eq!(json["isActive"], true);
    }

    #[test]
    fn is_active_reflects_save_time() {
        let record = sample_record();
        let entry = LinkEntry::from_record(&record, "http://x", record.expires_at());
        assert!(!entry.is_active);
    }

    #[test]
    fn link_entry_accepts_text_validity() {
        let raw = r#"{
            "id": "1712345678abc",
            "originalUrl": "https://example.com",
            "shortenedUrl": "http://localhost:5174/s/abc123",
            "shortCode": "abc123",
            "validity": "45",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "expiresAt": "2024-01-01T00:45:00.000Z",
            "clicks": 2,
            "isActive": true
        }"#;

        let record = serde_json::from_str::<LinkEntry>(raw)
            .unwrap()
            .into_record()
            .unwrap();

        assert_eq!(record.validity().minutes(), 45);
        assert_eq!(record.click_count(), 2);
        assert_eq!(record.id().as_str(), "1712345678abc");
    }

    #[test]
    fn out_of_range_validity_is_invalid_data() {
        let mut entry = LinkEntry::from_record(&sample_record(), "http://x", at(0));
        entry.validity = 0;
        assert!(matches!(
            entry.into_record(),
            Err(StorageError::InvalidData(_))
        ));
    }

    #[test]
    fn click_entry_uses_stored_field_names() {
        let event = ClickEvent::new(
            LinkId::from("link-1"),
            at(1_700_000_000),
            ClickMetadata::new("Pune, India", "192.168.1.1", "agent"),
            None,
        );
        let json = serde_json::to_value(ClickEntry::from(&event)).unwrap();

        assert_eq!(json["urlId"], "link-1");
        assert_eq!(json["ip"], "192.168.1.1");
        assert_eq!(json["userAgent"], "agent...");
        assert!(json.get("originalUrl").is_none());
    }

    #[test]
    fn missing_key_is_empty_collection() {
        let store = InMemoryStore::new();
        assert!(load_links(&store).unwrap().is_empty());
        assert!(load_clicks(&store).unwrap().is_empty());
    }

    #[test]
    fn corrupt_collection_is_invalid_data() {
        let store = InMemoryStore::new();
        store.set(LINKS_KEY, "{not json").unwrap();

        assert!(matches!(
            load_links(&store),
            Err(StorageError::InvalidData(_))
        ));
    }

    #[test]
    fn links_round_trip() {
        let store = InMemoryStore::new();
        let records = vec![sample_record()];

        save_links(&store, &records, "http://localhost:5174", at(0)).unwrap();

        assert_eq!(load_links(&store).unwrap(), records);
    }
}
