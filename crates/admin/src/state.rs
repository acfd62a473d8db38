//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;

use crate::config::AdminConfig;
use crate::services::{DemoApiClient, DemoApiError, EmailService, ImageStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    demo_api: DemoApiClient,
    email: Option<EmailService>,
    images: ImageStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Email is optional: a broken SMTP configuration is logged and the
    /// dashboard runs without welcome emails.
    ///
    /// # Errors
    ///
    /// Returns an error if the demo API HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, DemoApiError> {
        let demo_api = DemoApiClient::new(&config.demo_api)?;

        let email = config.email.as_ref().and_then(|email_config| {
            EmailService::new(email_config, &config.base_url)
                .inspect_err(|e| warn!(error = %e, "SMTP misconfigured, welcome emails disabled"))
                .ok()
        });

        let images = ImageStore::new(config.upload_dir.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                demo_api,
                email,
                images,
            }),
        })
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the demo API client.
    #[must_use]
    pub fn demo_api(&self) -> &DemoApiClient {
        &self.inner.demo_api
    }

    /// The email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    /// Undo window for deleted users.
    #[must_use]
    pub fn undo_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inner.config.dashboard.undo_window_seconds)
    }
}
