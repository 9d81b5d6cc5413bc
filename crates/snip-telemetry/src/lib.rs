//! Logging for Snip.
//!
//! Local diagnostics go through `tracing`. Separately, user-facing actions
//! are reported as [`LogEvent`]s to an [`EventSink`], which may forward them
//! to a remote collector. Remote delivery is best effort and never affects
//! the caller.

pub mod error;
pub mod event;
pub mod sink;
pub mod subscriber;
pub mod transport;

pub use error::TelemetryError;
pub use event::{Level, LogEvent, Package, Stack};
pub use sink::{EventSink, MemorySink, NoopSink, RemoteLogger};
pub use subscriber::{init_tracing, LogFormat};
pub use transport::{HttpTransport, LogTransport};
