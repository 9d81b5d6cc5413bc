pub mod random;
pub mod scripted;

pub use random::RandomGenerator;
pub use scripted::ScriptedGenerator;

use snip_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// A generated code is only a candidate: the caller must still check it
/// against the registry before using it.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;
    /// Produces the next candidate short code.
    fn generate(&self) -> Self::Output;
}

impl<G: Generator> Generator for std::sync::Arc<G> {
    type Output = G::Output;

    fn generate(&self) -> Self::Output {
        (**self).generate()
    }
}
