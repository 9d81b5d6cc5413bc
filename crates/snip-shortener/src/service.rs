use crate::batch::{BatchCoordinator, BatchReport, SubmissionEntry};
use crate::error::{BatchError, FollowError};
use crate::ledger::{ClickLedger, LocationShare};
use crate::metadata::MetadataProvider;
use crate::registry::LinkRegistry;
use crate::settings::ShortenerSettings;
use snip_core::{ClickEvent, Clock, LinkId, LinkRecord};
use snip_generator::Generator;
use snip_storage::{KeyValueStore, StorageError};
use snip_telemetry::{EventSink, Level, LogEvent, NoopSink, Package};
use std::sync::Arc;
use tracing::{info, warn};

/// Where a followed short code leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub click: ClickEvent,
}

/// Figures shown on the statistics page.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_links: usize,
    pub active_links: usize,
    pub total_clicks: u64,
    pub most_clicked: Option<LinkRecord>,
    pub recent_clicks: Vec<ClickEvent>,
    pub top_locations: Vec<(String, usize)>,
}

/// The shortener as its users see it: shorten, list, delete, click and
/// follow, plus the statistics summary.
pub struct Shortener<G, C, M> {
    registry: Arc<LinkRegistry<G, C>>,
    ledger: ClickLedger<C>,
    coordinator: BatchCoordinator<G, C>,
    metadata: M,
    events: Arc<dyn EventSink>,
    settings: ShortenerSettings,
}

impl<G, C, M> Shortener<G, C, M>
where
    G: Generator,
    C: Clock + Clone,
    M: MetadataProvider,
{
    /// Loads both collections from `store`.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        generator: G,
        clock: C,
        metadata: M,
        settings: ShortenerSettings,
    ) -> Self {
        let registry = Arc::new(LinkRegistry::load(
            Arc::clone(&store),
            generator,
            clock.clone(),
            settings.base_url.clone(),
        ));
        let ledger = ClickLedger::load(store, clock);
        let coordinator = BatchCoordinator::new(Arc::clone(&registry));

        Self {
            registry,
            ledger,
            coordinator,
            metadata,
            events: Arc::new(NoopSink),
            settings,
        }
    }

    /// Reports user actions to `sink` as well as to `tracing`.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn registry(&self) -> &LinkRegistry<G, C> {
        &self.registry
    }

    pub fn ledger(&self) -> &ClickLedger<C> {
        &self.ledger
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Shortens up to five URLs concurrently.
    pub async fn create_batch(
        &self,
        entries: Vec<SubmissionEntry>,
    ) -> Result<BatchReport, BatchError> {
        self.report(Level::Info, Package::Page, "Starting bulk URL shortening process");

        let report = match self.coordinator.submit_batch(entries).await {
            Ok(report) => report,
            Err(err) => {
                self.report(
                    Level::Error,
                    Package::Page,
                    format!("Error in bulk URL shortening: {err}"),
                );
                return Err(err);
            }
        };

        if report.outcomes.is_empty() {
            self.report(Level::Warn, Package::Component, "No URLs provided for shortening");
        }
        for link in report.succeeded() {
            self.report(
                Level::Info,
                Package::Api,
                format!(
                    "URL shortened successfully: {} -> {}",
                    link.original_url(),
                    link.short_url(&self.settings.base_url)
                ),
            );
        }
        for (slot, err) in report.failed() {
            self.report(
                Level::Warn,
                Package::Api,
                format!("Error shortening URL in slot {slot}: {}", err.detail()),
            );
        }
        self.report(
            Level::Info,
            Package::Page,
            format!(
                "Bulk shortening completed. Success: {}/{}",
                report.succeeded().count(),
                report.outcomes.len()
            ),
        );

        Ok(report)
    }

    /// Every link, newest first.
    pub fn links(&self) -> Vec<LinkRecord> {
        self.registry.list_all()
    }

    /// Deletes a link and its clicks. Returns `false` if it did not exist.
    pub fn delete_link(&self, link_id: &LinkId) -> bool {
        let deleted = self.registry.delete(link_id, &self.ledger);
        if deleted {
            self.report(
                Level::Info,
                Package::Component,
                format!("URL and associated click data deleted: {link_id}"),
            );
        }
        deleted
    }

    /// Records a click with provider metadata, whether or not the link has
    /// expired. Returns `None` if the link does not exist.
    pub fn simulate_click(&self, link_id: &LinkId) -> Option<ClickEvent> {
        match self.ledger.record(&*self.registry, link_id, self.metadata.metadata()) {
            Ok(event) => {
                self.report(
                    Level::Info,
                    Package::Component,
                    format!("Click recorded for URL: {link_id} from {}", event.location),
                );
                Some(event)
            }
            Err(err) => {
                self.report(
                    Level::Error,
                    Package::Component,
                    format!("Error recording click: {err}"),
                );
                None
            }
        }
    }

    /// Resolves `code` and counts the visit.
    ///
    /// Expired links are refused and their visits are not counted.
    pub fn follow(&self, code: &str) -> Result<Redirect, FollowError> {
        let link = self
            .registry
            .find_by_code(code)
            .ok_or_else(|| FollowError::NotFound(code.to_string()))?;

        if !link.is_active_at(self.registry.now()) {
            warn!(code, expired_at = %link.expires_at(), "expired link followed");
            self.report(
                Level::Warn,
                Package::Page,
                format!("Attempted to access expired URL: {code}"),
            );
            return Err(FollowError::Expired {
                code: code.to_string(),
                expired_at: link.expires_at(),
            });
        }

        let click = self
            .ledger
            .record(&*self.registry, link.id(), self.metadata.metadata())
            // deleted between lookup and record
            .map_err(|_| FollowError::NotFound(code.to_string()))?;

        let target = redirect_target(link.original_url());
        info!(code, destination = %target, "redirecting");
        self.report(
            Level::Info,
            Package::Page,
            format!("Redirecting to: {}", link.original_url()),
        );

        Ok(Redirect { target, click })
    }

    /// Clicks of one link, newest first.
    pub fn clicks_for(&self, link_id: &LinkId) -> Vec<ClickEvent> {
        let mut events = self.ledger.events_for(link_id);
        events.reverse();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events
    }

    pub fn location_breakdown(&self, link_id: &LinkId) -> Vec<LocationShare> {
        self.ledger.location_breakdown(link_id)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total_links: self.registry.total_count(),
            active_links: self.registry.active_count(),
            total_clicks: self.registry.total_clicks(),
            most_clicked: self.registry.most_clicked(),
            recent_clicks: self
                .ledger
                .recent_events(&*self.registry, self.settings.recent_clicks_limit),
            top_locations: self
                .ledger
                .location_histogram(&*self.registry, self.settings.top_locations),
        }
    }

    /// Whether `link` is still active on this shortener's clock.
    pub fn is_active(&self, link: &LinkRecord) -> bool {
        link.is_active_at(self.registry.now())
    }

    /// The most recent save failure of either collection, if any.
    pub fn persistence_warning(&self) -> Option<StorageError> {
        self.registry
            .persistence_warning()
            .or_else(|| self.ledger.persistence_warning())
    }

    fn report(&self, level: Level, package: Package, message: impl AsRef<str>) {
        self.events.log(LogEvent::backend(level, package, message));
    }
}

/// Stored URLs without an http(s) scheme are sent to their https form.
fn redirect_target(original_url: &str) -> String {
    let lower = original_url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        original_url.to_string()
    } else {
        format!("https://{original_url}")
    }
}
