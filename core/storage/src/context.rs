//! Per-request context carrying the lazily attached client handle.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::backend::ObjectBackend;

/// State for one logical caller request.
///
/// Holds at most one backend client. The client is attached by the first
/// operation run against the context and reused by every later one; it is
/// released when the context is dropped.
pub struct RequestContext {
    id: Uuid,
    started: Instant,
    client: Option<Arc<dyn ObjectBackend>>,
}

impl RequestContext {
    /// Create a fresh context with no client attached.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            client: None,
        }
    }

    /// Request identifier used to correlate log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Milliseconds since the context was created.
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Whether a client has been attached.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// The attached client, if any.
    pub fn client(&self) -> Option<&Arc<dyn ObjectBackend>> {
        self.client.as_ref()
    }

    pub(crate) fn attach(&mut self, client: Arc<dyn ObjectBackend>) {
        self.client = Some(client);
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("id", &self.id)
            .field("elapsed_ms", &self.elapsed_ms())
            .field("client", &self.client.as_ref().map(|c| c.name()))
            .finish()
    }
}
