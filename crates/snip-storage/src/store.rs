use crate::error::Result;

/// A durable string key-value store with synchronous access.
///
/// Implementations must make `set` durable before returning. There is no
/// external concurrent writer; each collection has exactly one owner.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> Result<bool>;
}

impl<S: KeyValueStore> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }
}
