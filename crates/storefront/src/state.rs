//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::db::users::PgIdentityStore;
use crate::services::accounts::AccountService;
use crate::services::mailer::SmtpMailer;
use crate::services::moderation::ContentPolicy;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, the account service, and the
/// content moderation policy.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    accounts: AccountService,
    policy: ContentPolicy,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Site configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be configured.
    pub fn new(
        config: SiteConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let mailer = SmtpMailer::new(&config.mail)?;
        let store = PgIdentityStore::new(pool.clone());
        let accounts = AccountService::new(
            Arc::new(store),
            Arc::new(mailer),
            config.base_url.clone(),
        );
        let policy = ContentPolicy::new(&config.forbidden_words);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                accounts,
                policy,
            }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the account lifecycle service.
    #[must_use]
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    /// Get a reference to the content moderation policy.
    #[must_use]
    pub fn policy(&self) -> &ContentPolicy {
        &self.inner.policy
    }
}
