use parking_lot::Mutex;
use snip_core::link::validate_destination;
use snip_core::{AllocationError, Clock, LinkId, LinkRecord, ShortCode, Validity};
use snip_generator::Generator;
use snip_storage::{snapshot, KeyValueStore, StorageError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A submission that passed validation and is ready to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationRequest {
    pub original_url: String,
    pub validity: Validity,
    pub custom_code: Option<ShortCode>,
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Creation order.
    links: Vec<LinkRecord>,
    codes: HashSet<ShortCode>,
    persistence_warning: Option<StorageError>,
}

/// Owns every [`LinkRecord`] and keeps short codes unique.
///
/// All state sits behind one lock. Checking a code and inserting the record
/// that uses it happen under the same guard, so concurrent allocations can
/// never both claim a code.
pub struct LinkRegistry<G, C> {
    store: Arc<dyn KeyValueStore>,
    generator: G,
    clock: C,
    base_url: String,
    state: Mutex<RegistryState>,
}

impl<G: Generator, C: Clock> LinkRegistry<G, C> {
    /// Loads the link collection from `store`.
    ///
    /// An unreadable collection leaves the registry empty and sets the
    /// persistence warning; the store is not touched until the next change.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        generator: G,
        clock: C,
        base_url: impl Into<String>,
    ) -> Self {
        let mut state = RegistryState::default();

        match snapshot::load_links(store.as_ref()) {
            Ok(links) => {
                for link in &links {
                    if !state.codes.insert(link.short_code().clone()) {
                        warn!(code = %link.short_code(), "stored links share a short code");
                    }
                }
                info!(links = links.len(), "loaded link collection");
                state.links = links;
            }
            Err(err) => {
                warn!(error = %err, "link collection unavailable; starting empty");
                state.persistence_warning = Some(err);
            }
        }

        Self {
            store,
            generator,
            clock,
            base_url: base_url.into(),
            state: Mutex::new(state),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True iff no existing link uses `code`. Expired links still hold
    /// their code until deleted.
    pub fn is_code_available(&self, code: &str) -> bool {
        !self.state.lock().codes.contains(code)
    }

    /// Produces a candidate code. It may already be taken.
    pub fn generate_code(&self) -> ShortCode {
        self.generator.generate().into()
    }

    /// Checks a submission without touching registry state.
    pub fn validate(
        original_url: &str,
        validity_minutes: i64,
        custom_code: Option<&str>,
    ) -> Result<AllocationRequest, AllocationError> {
        validate_destination(original_url).map_err(|e| AllocationError::InvalidUrl {
            url: original_url.to_string(),
            reason: e.to_string(),
        })?;

        let validity = Validity::from_minutes(validity_minutes)
            .map_err(|e| AllocationError::InvalidValidity { reason: e.to_string() })?;

        let custom_code = custom_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| {
                ShortCode::new(code).map_err(|e| AllocationError::InvalidCustomCode {
                    code: code.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(AllocationRequest {
            original_url: original_url.trim().to_string(),
            validity,
            custom_code,
        })
    }

    /// Validates and registers a new link in one step.
    pub fn allocate(
        &self,
        original_url: &str,
        validity_minutes: i64,
        custom_code: Option<&str>,
    ) -> Result<LinkRecord, AllocationError> {
        let request = Self::validate(original_url, validity_minutes, custom_code)?;
        self.register(request)
    }

    /// Picks the final code and inserts the record, atomically with respect
    /// to every other allocation.
    pub fn register(&self, request: AllocationRequest) -> Result<LinkRecord, AllocationError> {
        let mut state = self.state.lock();

        let code = match request.custom_code {
            Some(code) => {
                if state.codes.contains(&code) {
                    debug!(code = %code, "custom code already in use");
                    return Err(AllocationError::CodeTaken {
                        code: code.to_string(),
                    });
                }
                code
            }
            None => loop {
                let candidate = self.generate_code();
                if !state.codes.contains(&candidate) {
                    break candidate;
                }
                trace!(code = %candidate, "generated code collided, retrying");
            },
        };

        let record = LinkRecord::new(
            request.original_url,
            code,
            request.validity,
            self.clock.now(),
        )
        .map_err(|e| AllocationError::InvalidValidity { reason: e.to_string() })?;

        state.codes.insert(record.short_code().clone());
        state.links.push(record.clone());
        self.persist(&mut state);

        info!(
            link_id = %record.id(),
            code = %record.short_code(),
            expires_at = %record.expires_at(),
            "link registered"
        );
        Ok(record)
    }

    /// Removes a link, then drops its clicks from `ledger`.
    ///
    /// Returns `false` (and changes nothing) if the link does not exist.
    pub fn delete<L: Clock>(&self, link_id: &LinkId, ledger: &crate::ClickLedger<L>) -> bool {
        {
            let mut state = self.state.lock();
            let Some(position) = state.links.iter().position(|link| link.id() == link_id) else {
                debug!(link_id = %link_id, "delete of unknown link ignored");
                return false;
            };

            let removed = state.links.remove(position);
            // stored data may hold duplicates; the code stays taken while any holder remains
            let still_held = state
                .links
                .iter()
                .any(|link| link.short_code() == removed.short_code());
            if !still_held {
                state.codes.remove(removed.short_code());
            }
            self.persist(&mut state);
            info!(link_id = %link_id, code = %removed.short_code(), "link deleted");
        }

        ledger.cascade_delete(link_id);
        true
    }

    pub fn get(&self, link_id: &LinkId) -> Option<LinkRecord> {
        self.state
            .lock()
            .links
            .iter()
            .find(|link| link.id() == link_id)
            .cloned()
    }

    pub fn find_by_code(&self, code: &str) -> Option<LinkRecord> {
        self.state
            .lock()
            .links
            .iter()
            .find(|link| link.short_code().as_str() == code)
            .cloned()
    }

    pub fn contains(&self, link_id: &LinkId) -> bool {
        self.state.lock().links.iter().any(|link| link.id() == link_id)
    }

    /// Every link, newest first.
    pub fn list_all(&self) -> Vec<LinkRecord> {
        let mut links: Vec<LinkRecord> = self.state.lock().links.iter().rev().cloned().collect();
        links.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        links
    }

    pub fn total_count(&self) -> usize {
        self.state.lock().links.len()
    }

    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        self.state
            .lock()
            .links
            .iter()
            .filter(|link| link.is_active_at(now))
            .count()
    }

    pub fn total_clicks(&self) -> u64 {
        self.state
            .lock()
            .links
            .iter()
            .map(LinkRecord::click_count)
            .sum()
    }

    /// The link with the most clicks; the earliest created wins a tie.
    pub fn most_clicked(&self) -> Option<LinkRecord> {
        let state = self.state.lock();
        let mut best: Option<&LinkRecord> = None;
        for link in &state.links {
            match best {
                Some(current) if link.click_count() <= current.click_count() => {}
                _ => best = Some(link),
            }
        }
        best.cloned()
    }

    pub fn now(&self) -> jiff::Timestamp {
        self.clock.now()
    }

    /// The last save failure, cleared by the next successful save.
    pub fn persistence_warning(&self) -> Option<StorageError> {
        self.state.lock().persistence_warning.clone()
    }

    /// Counts one click against `link_id` and returns the updated record,
    /// or `None` if the link does not exist.
    pub(crate) fn register_click(&self, link_id: &LinkId) -> Option<LinkRecord> {
        let mut state = self.state.lock();
        let link = state.links.iter_mut().find(|link| link.id() == link_id)?;
        link.register_click();
        let updated = link.clone();
        self.persist(&mut state);
        Some(updated)
    }

    fn persist(&self, state: &mut RegistryState) {
        match snapshot::save_links(
            self.store.as_ref(),
            &state.links,
            &self.base_url,
            self.clock.now(),
        ) {
            Ok(()) => state.persistence_warning = None,
            Err(err) => {
                warn!(error = %err, "failed to persist links; changes kept in memory only");
                state.persistence_warning = Some(err);
            }
        }
    }
}
