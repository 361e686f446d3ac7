//! Client factories and the per-context client provider.

use std::sync::Arc;
use tracing::debug;

use cloudfiles_common::StorageConfig;

use crate::backend::ObjectBackend;
use crate::context::RequestContext;
use crate::report::timing_audit;
use crate::s3::S3Backend;

/// Builds a backend client from configuration.
pub trait ClientFactory: Send + Sync {
    fn create(&self, config: &StorageConfig) -> Arc<dyn ObjectBackend>;
}

impl<F> ClientFactory for F
where
    F: Fn(&StorageConfig) -> Arc<dyn ObjectBackend> + Send + Sync,
{
    fn create(&self, config: &StorageConfig) -> Arc<dyn ObjectBackend> {
        self(config)
    }
}

/// Factory producing one S3 client per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3ClientFactory;

impl ClientFactory for S3ClientFactory {
    fn create(&self, config: &StorageConfig) -> Arc<dyn ObjectBackend> {
        Arc::new(S3Backend::new(config))
    }
}

/// Factory handing out the same backend to every context.
#[derive(Clone)]
pub struct SharedClientFactory(pub Arc<dyn ObjectBackend>);

impl ClientFactory for SharedClientFactory {
    fn create(&self, _config: &StorageConfig) -> Arc<dyn ObjectBackend> {
        self.0.clone()
    }
}

/// Attaches clients to request contexts on first use.
pub struct ClientProvider {
    config: StorageConfig,
    factory: Box<dyn ClientFactory>,
}

impl ClientProvider {
    pub fn new(config: StorageConfig, factory: impl ClientFactory + 'static) -> Self {
        Self {
            config,
            factory: Box::new(factory),
        }
    }

    /// Configuration new clients are built with.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Attach a client to `ctx` unless one is already attached.
    ///
    /// Safe to call at the top of every operation.
    pub fn ensure_client(&self, ctx: &mut RequestContext) {
        if !ctx.has_client() {
            self.attach_new(ctx);
        }
    }

    /// Ensure a client and return a handle to it.
    pub(crate) fn client(&self, ctx: &mut RequestContext) -> Arc<dyn ObjectBackend> {
        match ctx.client().cloned() {
            Some(client) => client,
            None => self.attach_new(ctx),
        }
    }

    fn attach_new(&self, ctx: &mut RequestContext) -> Arc<dyn ObjectBackend> {
        timing_audit(ctx, "Init-Start", "Storage client connection");
        let client = self.factory.create(&self.config);
        debug!(
            request_id = %ctx.id(),
            backend = client.name(),
            region = %self.config.region,
            "Storage client initialized"
        );
        ctx.attach(client.clone());
        timing_audit(ctx, "Init-End", "Storage client connection");
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_client_created_once_per_context() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let provider = ClientProvider::new(
            StorageConfig::default(),
            move |_: &StorageConfig| -> Arc<dyn ObjectBackend> {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(MemoryBackend::new())
            },
        );

        let mut ctx = RequestContext::new();
        assert!(!ctx.has_client());

        provider.ensure_client(&mut ctx);
        provider.ensure_client(&mut ctx);
        let first = provider.client(&mut ctx);
        let second = provider.client(&mut ctx);

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        let mut other = RequestContext::new();
        provider.ensure_client(&mut other);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_receives_current_config() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = seen.clone();
        let config = StorageConfig {
            region: "eu-north-1".to_string(),
            ..Default::default()
        };
        let provider = ClientProvider::new(config, move |c: &StorageConfig| -> Arc<dyn ObjectBackend> {
            *sink.lock().unwrap() = Some(c.region.clone());
            Arc::new(MemoryBackend::new())
        });

        provider.ensure_client(&mut RequestContext::new());
        assert_eq!(seen.lock().unwrap().as_deref(), Some("eu-north-1"));
    }

    #[test]
    fn test_shared_factory_reuses_backend() {
        let backend: Arc<dyn ObjectBackend> = Arc::new(MemoryBackend::new());
        let provider = ClientProvider::new(
            StorageConfig::default(),
            SharedClientFactory(backend.clone()),
        );

        let mut a = RequestContext::new();
        let mut b = RequestContext::new();
        assert!(Arc::ptr_eq(&provider.client(&mut a), &backend));
        assert!(Arc::ptr_eq(&provider.client(&mut b), &backend));
    }
}
