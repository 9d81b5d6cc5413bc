use crate::event::LogEvent;
use crate::transport::LogTransport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Something that accepts structured log events.
///
/// `log` must never block or fail the caller; sinks that do I/O hand the
/// work off and report problems through `tracing` only.
pub trait EventSink: Send + Sync + 'static {
    fn log(&self, event: LogEvent);

    /// Logs from loosely typed strings. Values outside the allow-lists are
    /// never sent; a local diagnostic is emitted instead.
    fn emit(&self, stack: &str, level: &str, message: &str, package: &str) {
        match LogEvent::parse(stack, level, message, package) {
            Ok(event) => self.log(event),
            Err(err) => warn!(error = %err, "dropping invalid log event"),
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn log(&self, event: LogEvent) {
        (**self).log(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log(&self, _event: LogEvent) {}
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for MemorySink {
    fn log(&self, event: LogEvent) {
        self.events.lock().push(event);
    }
}

/// Fire-and-forget forwarding to a remote collector.
///
/// Each event is delivered on its own task on the current tokio runtime.
/// Failures are swallowed after a local warning. Deliveries still in flight
/// can be awaited with [`RemoteLogger::flush`] before the runtime shuts down.
pub struct RemoteLogger<T> {
    transport: Arc<T>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: LogTransport> RemoteLogger<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of deliveries that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.pending.lock().iter().filter(|task| !task.is_finished()).count()
    }

    /// Waits up to `timeout` for every delivery started so far.
    ///
    /// Deliveries still running when the timeout expires are abandoned.
    pub async fn flush(&self, timeout: Duration) {
        let tasks = std::mem::take(&mut *self.pending.lock());
        if tasks.is_empty() {
            return;
        }

        let count = tasks.len();
        let waited = tokio::time::timeout(timeout, async {
            for task in tasks {
                if let Err(err) = task.await {
                    warn!(error = %err, "remote log delivery task failed");
                }
            }
        })
        .await;

        match waited {
            Ok(()) => debug!(count, "remote log deliveries flushed"),
            Err(_) => warn!(
                count,
                timeout_ms = timeout.as_millis() as u64,
                "remote log deliveries still pending after timeout"
            ),
        }
    }
}

impl<T: LogTransport> EventSink for RemoteLogger<T> {
    fn log(&self, event: LogEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(message = %event.message, "no async runtime; remote log event dropped");
            return;
        };

        let transport = Arc::clone(&self.transport);
        let task = runtime.spawn(async move {
            if let Err(err) = transport.send(&event).await {
                warn!(error = %err, message = %event.message, "remote log delivery failed");
            }
        });

        let mut pending = self.pending.lock();
        pending.retain(|task| !task.is_finished());
        pending.push(task);
    }
}
