//! Casebook: practice-management core for aesthetic clinics.
//!
//! Three subsystems carry the design weight: the case search (a dynamic
//! filter-to-predicate compiler over the SQLite store), the before/after
//! photo pairing, and the cursor-driven PDF report compositor. Everything
//! else is the plumbing they stand on: models, repositories, migrations,
//! clinic settings and the shared cost rollup.

pub mod config;
pub mod costs;
pub mod db;
pub mod models;
pub mod pairing;
pub mod report;
pub mod search;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the embedding application. Call once at startup;
/// repeated calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);
}
