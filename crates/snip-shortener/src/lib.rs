//! Link shortening and click analytics.
//!
//! Two owned collections make up the state: the [`LinkRegistry`] (links and
//! short-code uniqueness) and the [`ClickLedger`] (click events). Both load
//! their working set from a [`KeyValueStore`](snip_storage::KeyValueStore)
//! when opened and write it back after every change. The
//! [`BatchCoordinator`] shortens up to five URLs at once, and [`Shortener`]
//! ties everything together behind the four user actions.

pub mod batch;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod registry;
pub mod service;
pub mod settings;

pub use batch::{BatchCoordinator, BatchReport, SlotState, SubmissionEntry, SubmissionOutcome};
pub use error::{BatchError, FollowError, LedgerError};
pub use ledger::{ClickLedger, LocationShare};
pub use metadata::{FixedMetadata, MetadataProvider, SimulatedMetadata};
pub use registry::{AllocationRequest, LinkRegistry};
pub use service::{Redirect, Shortener, Summary};
pub use settings::ShortenerSettings;
