use crate::error::BatchError;
use crate::registry::LinkRegistry;
use futures::future::join_all;
use snip_core::{AllocationError, Clock, LinkRecord};
use snip_generator::Generator;
use snip_storage::StorageError;
use std::sync::Arc;
use tracing::{debug, trace};

/// Most entries a single batch may carry, blank ones included.
pub const MAX_BATCH_SIZE: usize = 5;

/// One row of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEntry {
    pub url: String,
    pub validity_minutes: i64,
    pub custom_code: Option<String>,
}

impl SubmissionEntry {
    pub fn new(url: impl Into<String>, validity_minutes: i64) -> Self {
        Self {
            url: url.into(),
            validity_minutes,
            custom_code: None,
        }
    }

    pub fn with_custom_code(mut self, code: impl Into<String>) -> Self {
        self.custom_code = Some(code.into());
        self
    }

    fn is_blank(&self) -> bool {
        self.url.trim().is_empty()
    }
}

/// Progress of one slot in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Validating,
    Allocating,
    Succeeded,
    Failed,
}

/// Terminal result for one non-blank entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Position of the entry in the submitted batch.
    pub slot: usize,
    pub state: SlotState,
    pub result: Result<LinkRecord, AllocationError>,
}

/// Outcomes of a batch, in submission order, blank entries left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<SubmissionOutcome>,
    /// Set when the registry could not save after this batch.
    pub persistence_warning: Option<StorageError>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &LinkRecord> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (usize, &AllocationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.slot, e)))
    }

    /// `"Successfully shortened N URL(s)"`, or `None` if nothing succeeded.
    pub fn summary(&self) -> Option<String> {
        match self.succeeded().count() {
            0 => None,
            n => Some(format!("Successfully shortened {n} URL(s)")),
        }
    }

    pub fn results(&self) -> Vec<Result<LinkRecord, AllocationError>> {
        self.outcomes.iter().map(|o| o.result.clone()).collect()
    }
}

/// Runs the entries of a batch concurrently against one registry.
///
/// Slots never wait on each other; uniqueness across slots (and across
/// concurrent batches) comes from [`LinkRegistry::register`].
pub struct BatchCoordinator<G, C> {
    registry: Arc<LinkRegistry<G, C>>,
}

impl<G: Generator, C: Clock> BatchCoordinator<G, C> {
    pub fn new(registry: Arc<LinkRegistry<G, C>>) -> Self {
        Self { registry }
    }

    pub async fn submit_batch(
        &self,
        entries: Vec<SubmissionEntry>,
    ) -> Result<BatchReport, BatchError> {
        if entries.len() > MAX_BATCH_SIZE {
            return Err(BatchError::TooManyEntries {
                given: entries.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let slots = entries
            .into_iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_blank())
            .map(|(slot, entry)| self.run_slot(slot, entry));
        let outcomes = join_all(slots).await;

        debug!(
            submitted = outcomes.len(),
            succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count(),
            "batch finished"
        );

        Ok(BatchReport {
            outcomes,
            persistence_warning: self.registry.persistence_warning(),
        })
    }

    async fn run_slot(&self, slot: usize, entry: SubmissionEntry) -> SubmissionOutcome {
        let mut state = SlotState::Idle;
        transition(slot, &mut state, SlotState::Validating);

        let request = LinkRegistry::<G, C>::validate(
            &entry.url,
            entry.validity_minutes,
            entry.custom_code.as_deref(),
        );

        let result = match request {
            Ok(request) => {
                transition(slot, &mut state, SlotState::Allocating);
                // let sibling slots validate before any of them allocates
                tokio::task::yield_now().await;
                self.registry.register(request)
            }
            Err(err) => Err(err),
        };

        let terminal = if result.is_ok() {
            SlotState::Succeeded
        } else {
            SlotState::Failed
        };
        transition(slot, &mut state, terminal);

        SubmissionOutcome {
            slot,
            state,
            result,
        }
    }
}

fn transition(slot: usize, state: &mut SlotState, next: SlotState) {
    trace!(slot, from = ?*state, to = ?next, "slot transition");
    *state = next;
}
