//! Core types for the Snip link shortener.
//!
//! This crate provides the domain types shared by the generator, storage
//! and shortener crates: validated short codes, link records, click events
//! and the clock capability used to stamp them.

pub mod click;
pub mod clock;
pub mod error;
pub mod link;
pub mod shortcode;

pub use click::{ClickEvent, ClickId, ClickMetadata};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AllocationError, CoreError};
pub use link::{LinkId, LinkRecord, Validity};
pub use shortcode::ShortCode;
