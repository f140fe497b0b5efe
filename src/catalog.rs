//! Model catalog cache
//!
//! Keeps the backend's model list in memory with a TTL. Refreshes go through
//! the light retry profile; when a refresh fails and a stale copy exists, the
//! stale copy is served and the next refresh is deferred for a short window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    backend::{InferenceBackend, ModelInfo},
    resilience::{InvokeError, ResilientInvoker},
};

/// Longest wait before retrying a refresh after serving a stale catalog
pub const DEFAULT_STALE_WINDOW: Duration = Duration::from_secs(30);

struct CachedCatalog {
    expires_at: Instant,
    models: Arc<Vec<ModelInfo>>,
}

/// TTL cache over `InferenceBackend::list_models`
pub struct CatalogCache {
    backend: Arc<dyn InferenceBackend>,
    invoker: ResilientInvoker,
    ttl: Duration,
    stale_window: Duration,
    entry: RwLock<Option<CachedCatalog>>,
}

impl CatalogCache {
    pub fn new(backend: Arc<dyn InferenceBackend>, invoker: ResilientInvoker, ttl: Duration) -> Self {
        Self {
            backend,
            invoker,
            ttl,
            stale_window: ttl.min(DEFAULT_STALE_WINDOW),
            entry: RwLock::new(None),
        }
    }

    /// Override how long a stale catalog is served before the next refresh
    pub fn with_stale_window(mut self, stale_window: Duration) -> Self {
        self.stale_window = stale_window;
        self
    }

    /// Get the catalog, fetching it when missing or expired
    #[instrument(skip(self, cancel))]
    pub async fn get_models(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Vec<ModelInfo>>, InvokeError> {
        {
            let entry = self.entry.read().await;
            if let Some(cached) = entry.as_ref() {
                if Instant::now() < cached.expires_at {
                    debug!(models = cached.models.len(), "Catalog cache hit");
                    return Ok(Arc::clone(&cached.models));
                }
            }
        }

        debug!("Catalog cache miss, fetching from backend");
        let backend = Arc::clone(&self.backend);
        let fetched = self
            .invoker
            .execute(|| backend.list_models(), cancel, None)
            .await;

        let mut entry = self.entry.write().await;
        match fetched {
            Ok(invoked) => {
                let models = Arc::new(invoked.result);
                *entry = Some(CachedCatalog {
                    expires_at: Instant::now() + self.ttl,
                    models: Arc::clone(&models),
                });
                debug!(models = models.len(), retries = invoked.retry.attempts, "Catalog cached");
                Ok(models)
            }
            Err(err) => match entry.as_mut() {
                Some(stale) if !err.is_cancelled() => {
                    warn!(
                        error = %err,
                        retry_in_ms = self.stale_window.as_millis() as u64,
                        "Catalog refresh failed, serving stale catalog"
                    );
                    stale.expires_at = Instant::now() + self.stale_window;
                    Ok(Arc::clone(&stale.models))
                }
                _ => Err(err),
            },
        }
    }

    /// Force the next lookup to refetch
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}
