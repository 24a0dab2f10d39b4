//! Dependency initialization and wiring for the book search commands.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::AppError;
use book_search_ingest::{LoaderConfig, SeedLoader};
use book_search_repository::{BookSearcher, ElasticsearchClient, SearchEngineClient};

/// Container for the backend client and the settings it was built from.
pub struct Dependencies {
    pub settings: Settings,
    pub client: Arc<dyn SearchEngineClient>,
}

impl Dependencies {
    /// Build the backend client from `settings`.
    ///
    /// No request is sent; use [`Dependencies::verify`] to check the backend
    /// is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If the client configuration is invalid
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        info!(
            elasticsearch_url = %settings.elasticsearch_url,
            books_index = %settings.books_index,
            "Initializing dependencies"
        );

        let config = settings.client_config()?;
        let client = ElasticsearchClient::new(&config).map_err(|e| {
            AppError::config(format!("Failed to create search backend client: {}", e))
        })?;

        Ok(Self::with_client(settings, Arc::new(client)))
    }

    /// Wire an existing client.
    pub fn with_client(settings: Settings, client: Arc<dyn SearchEngineClient>) -> Self {
        Self { settings, client }
    }

    /// Verify the backend is reachable and healthy.
    pub async fn verify(&self) -> Result<(), AppError> {
        let healthy = self
            .client
            .health_check()
            .await
            .map_err(|e| AppError::config(format!("Search backend health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::config("Search backend cluster is unhealthy"));
        }

        info!("Search backend connection verified");
        Ok(())
    }

    /// Build a searcher over the configured index. Runs the compatibility gate.
    pub async fn searcher(&self) -> Result<BookSearcher, AppError> {
        let searcher = match BookSearcher::new(self.client.clone()).await {
            Ok(searcher) => searcher,
            Err(e) if e.is_compatibility_error() => {
                warn!(error = %e, "Search backend failed the compatibility gate");
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(searcher.with_index(self.settings.books_index.clone())?)
    }

    /// Build a seed loader for the configured index.
    pub fn seed_loader(&self) -> SeedLoader {
        SeedLoader::with_config(
            self.client.clone(),
            LoaderConfig {
                index: self.settings.books_index.clone(),
                fetch_timeout: Some(self.settings.http_timeout),
                batch_size: self.settings.bulk_batch_size,
            },
        )
    }
}
