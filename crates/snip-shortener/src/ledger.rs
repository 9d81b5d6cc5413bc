use crate::error::LedgerError;
use crate::registry::LinkRegistry;
use parking_lot::Mutex;
use snip_core::{ClickEvent, ClickMetadata, Clock, LinkId};
use snip_generator::Generator;
use snip_storage::{snapshot, KeyValueStore, StorageError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Share of a link's clicks that came from one location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationShare {
    pub location: String,
    pub clicks: usize,
    /// Percent of the link's clicks, rounded to one decimal place.
    pub percentage: f64,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Recording order.
    events: Vec<ClickEvent>,
    persistence_warning: Option<StorageError>,
}

/// Append-only log of click events.
///
/// Events are only ever removed together with the link they belong to.
pub struct ClickLedger<C> {
    store: Arc<dyn KeyValueStore>,
    clock: C,
    state: Mutex<LedgerState>,
}

impl<C: Clock> ClickLedger<C> {
    /// Loads the click collection from `store`, starting empty (with a
    /// persistence warning) if it cannot be read.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: C) -> Self {
        let mut state = LedgerState::default();

        match snapshot::load_clicks(store.as_ref()) {
            Ok(events) => {
                info!(clicks = events.len(), "loaded click collection");
                state.events = events;
            }
            Err(err) => {
                warn!(error = %err, "click collection unavailable; starting empty");
                state.persistence_warning = Some(err);
            }
        }

        Self {
            store,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Records one click against `link_id` and bumps the link's counter.
    ///
    /// Both happen while the ledger lock is held, so the counter always
    /// matches the number of stored events for the link.
    pub fn record<G: Generator, R: Clock>(
        &self,
        registry: &LinkRegistry<G, R>,
        link_id: &LinkId,
        metadata: ClickMetadata,
    ) -> Result<ClickEvent, LedgerError> {
        let mut state = self.state.lock();

        let Some(link) = registry.register_click(link_id) else {
            warn!(link_id = %link_id, "click for unknown link ignored");
            return Err(LedgerError::OrphanReference(link_id.clone()));
        };

        let event = ClickEvent::new(
            link_id.clone(),
            self.clock.now(),
            metadata,
            Some(link.original_url().to_string()),
        );
        state.events.push(event.clone());
        self.persist(&mut state);

        debug!(
            link_id = %link_id,
            click_id = %event.id,
            location = %event.location,
            clicks = link.click_count(),
            "click recorded"
        );
        Ok(event)
    }

    /// Every event of one link, in recording order.
    pub fn events_for(&self, link_id: &LinkId) -> Vec<ClickEvent> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|event| &event.link_id == link_id)
            .cloned()
            .collect()
    }

    /// The `limit` newest events across all links. Events whose link is no
    /// longer in `registry` are left out.
    pub fn recent_events<G: Generator, R: Clock>(
        &self,
        registry: &LinkRegistry<G, R>,
        limit: usize,
    ) -> Vec<ClickEvent> {
        self.recent_events_where(limit, |event| registry.contains(&event.link_id))
    }

    fn recent_events_where<F>(&self, limit: usize, keep: F) -> Vec<ClickEvent>
    where
        F: Fn(&ClickEvent) -> bool,
    {
        let mut events: Vec<ClickEvent> = self
            .state
            .lock()
            .events
            .iter()
            .rev()
            .filter(|event| keep(*event))
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-recorded first
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        events
    }

    /// The `top_n` most frequent locations with their counts, over events
    /// whose link is still in `registry`. Ties keep first-seen order.
    pub fn location_histogram<G: Generator, R: Clock>(
        &self,
        registry: &LinkRegistry<G, R>,
        top_n: usize,
    ) -> Vec<(String, usize)> {
        self.location_histogram_where(top_n, |event| registry.contains(&event.link_id))
    }

    fn location_histogram_where<F>(&self, top_n: usize, keep: F) -> Vec<(String, usize)>
    where
        F: Fn(&ClickEvent) -> bool,
    {
        let state = self.state.lock();
        let mut histogram = count_locations(state.events.iter().filter(|event| keep(*event)));
        drop(state);

        histogram.sort_by(|a, b| b.1.cmp(&a.1));
        histogram.truncate(top_n);
        histogram
    }

    /// Per-location share of one link's clicks, most frequent first.
    pub fn location_breakdown(&self, link_id: &LinkId) -> Vec<LocationShare> {
        let state = self.state.lock();
        let events: Vec<&ClickEvent> = state
            .events
            .iter()
            .filter(|event| &event.link_id == link_id)
            .collect();
        let total = events.len();
        let mut histogram = count_locations(events.into_iter());
        drop(state);

        histogram.sort_by(|a, b| b.1.cmp(&a.1));
        histogram
            .into_iter()
            .map(|(location, clicks)| LocationShare {
                location,
                clicks,
                percentage: (clicks as f64 * 1000.0 / total as f64).round() / 10.0,
            })
            .collect()
    }

    pub fn total_events(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Drops every event of `link_id`. Returns how many were removed.
    pub fn cascade_delete(&self, link_id: &LinkId) -> usize {
        let mut state = self.state.lock();
        let before = state.events.len();
        state.events.retain(|event| &event.link_id != link_id);
        let removed = before - state.events.len();

        if removed > 0 {
            self.persist(&mut state);
            info!(link_id = %link_id, removed, "click events removed with link");
        }
        removed
    }

    /// The last save failure, cleared by the next successful save.
    pub fn persistence_warning(&self) -> Option<StorageError> {
        self.state.lock().persistence_warning.clone()
    }

    fn persist(&self, state: &mut LedgerState) {
        match snapshot::save_clicks(self.store.as_ref(), &state.events) {
            Ok(()) => state.persistence_warning = None,
            Err(err) => {
                warn!(error = %err, "failed to persist clicks; changes kept in memory only");
                state.persistence_warning = Some(err);
            }
        }
    }
}

/// Groups events by location in first-seen order.
fn count_locations<'a>(events: impl Iterator<Item = &'a ClickEvent>) -> Vec<(String, usize)> {
    let mut histogram: Vec<(String, usize)> = Vec::new();
    for event in events {
        match histogram.iter_mut().find(|(location, _)| *location == event.location) {
            Some((_, count)) => *count += 1,
            None => histogram.push((event.location.clone(), 1)),
        }
    }
    histogram
}
