//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::content::{BlockTypeRegistry, CollectionManager, ContentStore, PageComposer};
use crate::db;
use crate::file::{BlobStorage, LocalBlobStorage, UploadService};
use crate::middleware::RateLimiter;
use crate::models::CollectionKind;
use crate::services::auth::TokenAuthenticator;
use crate::services::lead::LeadIntake;
use crate::services::notify::{self, Notifier};
use crate::storage::{Persistence, PgStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Storage backend handles.
    persistence: Persistence,

    /// Singleton documents.
    content: ContentStore,

    services: CollectionManager,
    articles: CollectionManager,
    gallery: CollectionManager,

    /// Block catalog and page storage.
    pages: PageComposer,

    /// Admin credential check and token signing.
    auth: TokenAuthenticator,

    /// Sliding-window throttle for mutating requests.
    rate_limiter: Arc<RateLimiter>,

    /// Contact-form intake.
    leads: LeadIntake,

    /// Image uploads.
    uploads: UploadService,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Connects to PostgreSQL and applies migrations when `DATABASE_URL` is
    /// set; otherwise everything is kept in memory.
    pub async fn new(config: &Config) -> Result<Self> {
        let persistence = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections)
                    .await
                    .context("failed to create database pool")?;
                db::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                Persistence::new(Arc::new(PgStore::new(pool)))
            }
            None => {
                warn!("DATABASE_URL not set, content is kept in memory and lost on restart");
                Persistence::in_memory()
            }
        };
        info!(backend = persistence.backend(), "persistence ready");

        let blobs = build_blob_storage(config).await?;
        info!(backend = blobs.scheme(), "upload storage ready");

        let notifier: Arc<dyn Notifier> = Arc::from(
            notify::from_config(config).context("failed to configure lead notifications")?,
        );
        if config.smtp_host.is_none() {
            info!("SMTP_HOST not set, lead notifications disabled");
        }

        Ok(Self::from_parts(config, persistence, blobs, notifier))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        config: &Config,
        persistence: Persistence,
        blobs: Arc<dyn BlobStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let timeout = config.store_timeout;
        let content = ContentStore::new(persistence.documents.clone(), timeout);
        let collection =
            |kind| CollectionManager::new(kind, persistence.records.clone(), timeout);

        let pages = PageComposer::new(
            content.clone(),
            Arc::new(BlockTypeRegistry::with_standard_types()),
        );

        let auth = TokenAuthenticator::new(
            config.admin_email.clone(),
            config.admin_password.clone(),
            config.jwt_secret.as_bytes(),
            config.jwt_expire,
        );

        let leads = LeadIntake::new(
            persistence.leads.clone(),
            notifier,
            config.leads_to_email.clone(),
            timeout,
            config.notify_timeout,
        );

        let inner = AppStateInner {
            services: collection(CollectionKind::Service),
            articles: collection(CollectionKind::Article),
            gallery: collection(CollectionKind::Gallery),
            content,
            pages,
            auth,
            rate_limiter: Arc::new(RateLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
            leads,
            uploads: UploadService::new(blobs, timeout),
            persistence,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.inner.persistence
    }

    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// The manager for one collection kind.
    pub fn collection(&self, kind: CollectionKind) -> &CollectionManager {
        match kind {
            CollectionKind::Service => &self.inner.services,
            CollectionKind::Article => &self.inner.articles,
            CollectionKind::Gallery => &self.inner.gallery,
        }
    }

    pub fn pages(&self) -> &PageComposer {
        &self.inner.pages
    }

    pub fn auth(&self) -> &TokenAuthenticator {
        &self.inner.auth
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.inner.rate_limiter
    }

    pub fn leads(&self) -> &LeadIntake {
        &self.inner.leads
    }

    pub fn uploads(&self) -> &UploadService {
        &self.inner.uploads
    }

    /// Check whether the storage backend answers.
    pub async fn store_healthy(&self) -> bool {
        self.inner.persistence.healthy().await
    }
}

#[cfg(feature = "s3")]
async fn build_blob_storage(config: &Config) -> Result<Arc<dyn BlobStorage>> {
    if let Some(bucket) = &config.s3_bucket {
        let public_url = config
            .s3_public_url
            .clone()
            .context("S3_PUBLIC_URL is required when S3_BUCKET is set")?;
        let storage = crate::file::S3BlobStorage::new(
            config.s3_endpoint.as_deref(),
            bucket.clone(),
            config.s3_prefix.clone(),
            public_url,
        )
        .await
        .context("failed to configure S3 storage")?;
        return Ok(Arc::new(storage));
    }
    Ok(local_blob_storage(config))
}

#[cfg(not(feature = "s3"))]
async fn build_blob_storage(config: &Config) -> Result<Arc<dyn BlobStorage>> {
    if config.s3_bucket.is_some() {
        warn!("S3_BUCKET is set but this build lacks the `s3` feature; using local uploads");
    }
    Ok(local_blob_storage(config))
}

fn local_blob_storage(config: &Config) -> Arc<dyn BlobStorage> {
    Arc::new(LocalBlobStorage::new(
        config.uploads_dir.clone(),
        config.files_url.clone(),
    ))
}
