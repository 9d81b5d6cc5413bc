//! Durable key-value storage for Snip.
//!
//! The shortener only needs "load all records" and "save all records", so
//! the backing store is a plain string key-value map. Each collection is
//! stored under one key as a JSON array of flat entries.

pub mod error;
pub mod file;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use snapshot::{ClickEntry, LinkEntry, CLICKS_KEY, LINKS_KEY};
pub use store::KeyValueStore;
