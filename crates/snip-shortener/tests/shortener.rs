use jiff::{SignedDuration, Timestamp};
use snip_core::{AllocationError, ManualClock};
use snip_generator::{Generator, RandomGenerator, ScriptedGenerator};
use snip_shortener::{
    FixedMetadata, Shortener, ShortenerSettings, SimulatedMetadata, SubmissionEntry,
};
use snip_storage::{FileStore, InMemoryStore, KeyValueStore, StorageError};
use std::collections::HashSet;
use std::sync::Arc;

fn start() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

fn open<G: Generator>(
    store: Arc<dyn KeyValueStore>,
    generator: G,
    clock: ManualClock,
) -> Shortener<G, ManualClock, FixedMetadata> {
    Shortener::open(
        store,
        generator,
        clock,
        FixedMetadata::new("Pune, India", "192.168.1.1", "integration"),
        ShortenerSettings::default(),
    )
}

/// Rejects every write; reads see an empty store.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> snip_storage::Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> snip_storage::Result<()> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn delete(&self, _key: &str) -> snip_storage::Result<bool> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

#[tokio::test]
async fn batch_with_blank_entry_yields_two_distinct_links() {
    let shortener = open(
        Arc::new(InMemoryStore::new()),
        RandomGenerator::seeded(1),
        ManualClock::new(start()),
    );

    let report = shortener
        .create_batch(vec![
            SubmissionEntry::new("https://a.com", 30),
            SubmissionEntry::new("", 30),
            SubmissionEntry::new("https://b.com", 30),
        ])
        .await
        .unwrap();

    let codes: HashSet<_> = report
        .succeeded()
        .map(|link| link.short_code().clone())
        .collect();
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(codes.len(), 2);
    assert_eq!(shortener.links().len(), 2);
}

#[tokio::test]
async fn colliding_generator_still_yields_unique_codes() {
    let generator = ScriptedGenerator::new(["AAAAAA", "AAAAAA", "AAAAAA", "BBBBBB", "AAAAAA", "CCCCCC"]);
    let shortener = open(
        Arc::new(InMemoryStore::new()),
        generator,
        ManualClock::new(start()),
    );

    let report = shortener
        .create_batch(vec![
            SubmissionEntry::new("https://a.com", 30),
            SubmissionEntry::new("https://b.com", 30),
            SubmissionEntry::new("https://c.com", 30),
        ])
        .await
        .unwrap();

    let codes: HashSet<String> = report
        .succeeded()
        .map(|link| link.short_code().to_string())
        .collect();
    assert_eq!(
        codes,
        HashSet::from(["AAAAAA".to_string(), "BBBBBB".to_string(), "CCCCCC".to_string()])
    );
}

#[tokio::test]
async fn concurrent_batches_share_one_namespace() {
    let shortener = Arc::new(open(
        Arc::new(InMemoryStore::new()),
        ScriptedGenerator::new(["AAAAAA", "BBBBBB", "CCCCCC", "DDDDDD"]),
        ManualClock::new(start()),
    ));

    let first = {
        let shortener = Arc::clone(&shortener);
        tokio::spawn(async move {
            shortener
                .create_batch(vec![
                    SubmissionEntry::new("https://a.com", 30).with_custom_code("shared"),
                    SubmissionEntry::new("https://b.com", 30),
                ])
                .await
        })
    };
    let second = {
        let shortener = Arc::clone(&shortener);
        tokio::spawn(async move {
            shortener
                .create_batch(vec![
                    SubmissionEntry::new("https://c.com", 30).with_custom_code("shared"),
                    SubmissionEntry::new("https://d.com", 30),
                ])
                .await
        })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let shared_wins = first
        .outcomes
        .iter()
        .chain(&second.outcomes)
        .filter(|o| matches!(&o.result, Ok(link) if link.short_code().as_str() == "shared"))
        .count();
    let shared_losses = first
        .outcomes
        .iter()
        .chain(&second.outcomes)
        .filter(|o| matches!(o.result, Err(AllocationError::CodeTaken { .. })))
        .count();
    assert_eq!(shared_wins, 1);
    assert_eq!(shared_losses, 1);

    let codes: HashSet<_> = shortener
        .links()
        .iter()
        .map(|link| link.short_code().clone())
        .collect();
    assert_eq!(codes.len(), shortener.links().len());
    assert_eq!(codes.len(), 3);
}

#[tokio::test]
async fn custom_code_used_twice() {
    let shortener = open(
        Arc::new(InMemoryStore::new()),
        RandomGenerator::seeded(2),
        ManualClock::new(start()),
    );

    let first = shortener
        .create_batch(vec![SubmissionEntry::new("https://a.com", 30).with_custom_code("my-link")])
        .await
        .unwrap();
    let second = shortener
        .create_batch(vec![SubmissionEntry::new("https://b.com", 30).with_custom_code("my-link")])
        .await
        .unwrap();

    assert_eq!(first.succeeded().count(), 1);
    let errors: Vec<_> = second.failed().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1.to_string(), "Custom code is already in use");
}

#[tokio::test]
async fn delete_after_clicks_removes_everything() {
    let shortener = open(
        Arc::new(InMemoryStore::new()),
        RandomGenerator::seeded(3),
        ManualClock::new(start()),
    );
    let report = shortener
        .create_batch(vec![SubmissionEntry::new("https://a.com", 30)])
        .await
        .unwrap();
    let link = report.succeeded().next().unwrap().clone();

    for _ in 0..3 {
        shortener.simulate_click(link.id()).unwrap();
    }
    assert_eq!(shortener.clicks_for(link.id()).len(), 3);

    assert!(shortener.delete_link(link.id()));
    assert!(shortener.clicks_for(link.id()).is_empty());
    assert!(shortener.registry().is_code_available(link.short_code().as_str()));

    assert!(!shortener.delete_link(link.id()));
    assert!(shortener.links().is_empty());
}

#[tokio::test]
async fn state_survives_reopen_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(start());

    let (link, click) = {
        let shortener = open(
            Arc::new(FileStore::open(dir.path()).unwrap()),
            RandomGenerator::seeded(4),
            clock.clone(),
        );
        let report = shortener
            .create_batch(vec![SubmissionEntry::new("https://a.com", 90).with_custom_code("disk")])
            .await
            .unwrap();
        let link = report.succeeded().next().unwrap().clone();
        let click = shortener.simulate_click(link.id()).unwrap();
        (link, click)
    };

    let reopened = open(
        Arc::new(FileStore::open(dir.path()).unwrap()),
        RandomGenerator::seeded(5),
        clock,
    );

    let links = reopened.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].id(), link.id());
    assert_eq!(links[0].short_code().as_str(), "disk");
    assert_eq!(links[0].expires_at(), link.expires_at());
    assert_eq!(links[0].click_count(), 1);
    assert_eq!(reopened.clicks_for(link.id()), vec![click]);
    assert!(reopened.persistence_warning().is_none());
}

#[tokio::test]
async fn failing_store_keeps_changes_in_memory() {
    let shortener = open(
        Arc::new(ReadOnlyStore),
        RandomGenerator::seeded(6),
        ManualClock::new(start()),
    );

    let report = shortener
        .create_batch(vec![SubmissionEntry::new("https://a.com", 30)])
        .await
        .unwrap();

    assert_eq!(report.succeeded().count(), 1);
    assert!(matches!(
        report.persistence_warning,
        Some(StorageError::Unavailable(_))
    ));
    assert_eq!(shortener.links().len(), 1);
    assert!(shortener.persistence_warning().is_some());
}

#[tokio::test]
async fn expired_link_cannot_be_followed_but_stays_listed() {
    let clock = ManualClock::new(start());
    let shortener = open(
        Arc::new(InMemoryStore::new()),
        RandomGenerator::seeded(7),
        clock.clone(),
    );
    let report = shortener
        .create_batch(vec![SubmissionEntry::new("https://a.com", 1).with_custom_code("brief")])
        .await
        .unwrap();
    let link = report.succeeded().next().unwrap().clone();

    assert!(shortener.follow("brief").is_ok());
    clock.advance(SignedDuration::from_secs(61));

    assert!(shortener.follow("brief").is_err());
    assert_eq!(shortener.links().len(), 1);
    assert!(!shortener.registry().is_code_available("brief"));
    assert_eq!(shortener.summary().active_links, 0);
    assert_eq!(shortener.registry().get(link.id()).unwrap().click_count(), 1);
}

#[tokio::test]
async fn simulated_clicks_use_known_locations() {
    let shortener = Shortener::open(
        Arc::new(InMemoryStore::new()),
        RandomGenerator::seeded(8),
        ManualClock::new(start()),
        SimulatedMetadata::seeded(8),
        ShortenerSettings::default(),
    );
    let report = shortener
        .create_batch(vec![SubmissionEntry::new("https://a.com", 30)])
        .await
        .unwrap();
    let link = report.succeeded().next().unwrap().clone();

    for _ in 0..20 {
        shortener.simulate_click(link.id()).unwrap();
    }

    let breakdown = shortener.location_breakdown(link.id());
    let total: usize = breakdown.iter().map(|share| share.clicks).sum();
    assert_eq!(total, 20);
    assert!(breakdown
        .iter()
        .all(|share| snip_shortener::metadata::GLOBAL_LOCATIONS.contains(&share.location.as_str())));
}
