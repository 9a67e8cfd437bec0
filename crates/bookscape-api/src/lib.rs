pub mod auth;
pub mod bookings;
pub mod breaker;
pub mod contact;
pub mod error;
pub mod routes;
pub mod subscribe;
pub mod validate;

use std::sync::Arc;

use bookscape_db::{Database, MemorySubscriberStore};
use tracing::error;

pub use breaker::BreakerConfig;
pub use error::ApiError;
pub use subscribe::SubscriptionManager;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub subscriptions: SubscriptionManager,
}

impl AppStateInner {
    /// Wire the durable store and a fresh, empty fallback list.
    pub fn new(db: Database, breaker: BreakerConfig) -> AppState {
        let db = Arc::new(db);
        let subscriptions =
            SubscriptionManager::new(db.clone(), Arc::new(MemorySubscriberStore::new()), breaker);
        Arc::new(Self { db, subscriptions })
    }
}

/// Run blocking store work (SQLite, Argon2) off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    })?
}
