//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::models::Product;
use crate::services::notify::ReceiptMailer;

const CATALOG_CACHE_KEY: &str = "products:all";

/// Shared state for all request handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    mailer: Option<ReceiptMailer>,
    /// Product listing cache. Admin catalog writes invalidate it; the TTL
    /// bounds staleness from direct database edits.
    catalog_cache: Cache<String, Arc<Vec<Product>>>,
}

impl AppState {
    /// Create application state over the shared pool.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool, mailer: Option<ReceiptMailer>) -> Self {
        let catalog_cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
                catalog_cache,
            }),
        }
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// The shared database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The receipt mailer, when SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<ReceiptMailer> {
        self.inner.mailer.clone()
    }

    /// The cached product listing, if present.
    pub async fn cached_catalog(&self) -> Option<Arc<Vec<Product>>> {
        self.inner.catalog_cache.get(CATALOG_CACHE_KEY).await
    }

    /// Replace the cached product listing.
    pub async fn cache_catalog(&self, products: Arc<Vec<Product>>) {
        self.inner
            .catalog_cache
            .insert(CATALOG_CACHE_KEY.to_string(), products)
            .await;
    }

    /// Drop the cached product listing. Called after catalog writes.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog_cache.invalidate(CATALOG_CACHE_KEY).await;
    }
}
