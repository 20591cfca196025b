//! Session middleware configuration.
//!
//! Login state lives in `PostgreSQL`-backed tower-sessions; the cookie only
//! carries the session id. The backing table is created by the store's own
//! `migrate()` during startup.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::SiteConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "oakwood_session";

/// Sessions expire after two weeks without activity.
const SESSION_IDLE_DAYS: i64 = 14;

/// Build the session layer over the shared connection pool.
///
/// The Secure cookie flag follows the configured base URL: HTTPS
/// deployments get it, local HTTP development does not.
#[must_use]
pub fn session_layer(pool: &PgPool, config: &SiteConfig) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_IDLE_DAYS)))
        .with_secure(config.base_url.starts_with("https://"))
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
