//! In-memory session store using moka
//!
//! Each open dispatch form has one `FormSession`. Sessions expire after a
//! period of inactivity; an expired session simply starts over.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::dispatch::FormSession;

/// Live form sessions keyed by id
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, Arc<FormSession>>,
}

impl SessionStore {
    /// Create a store holding at most `max_capacity` sessions, each evicted
    /// after `idle` without access
    pub fn new(max_capacity: u64, idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_idle(idle)
                .build(),
        }
    }

    pub async fn insert(&self, session: Arc<FormSession>) {
        self.sessions.insert(session.id(), session).await;
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<FormSession>> {
        self.sessions.get(id).await
    }

    pub async fn invalidate(&self, id: &Uuid) {
        self.sessions.invalidate(id).await;
        info!("Session removed: {}", id);
    }

    /// Get store statistics for monitoring
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            active_sessions: self.sessions.entry_count(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(1000, Duration::from_secs(2 * 60 * 60))
    }
}

/// Session statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub active_sessions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DebounceSettings;
    use crate::pricing::models::{DistanceSnapshot, PricingConfig};
    use crate::pricing::providers::{ConfigVehicleCatalog, DistanceFailure, DistanceProvider};
    use crate::pricing::PricingSession;
    use async_trait::async_trait;

    struct NoDistance;

    #[async_trait]
    impl DistanceProvider for NoDistance {
        async fn distance(&self, _: &str, _: &str) -> Result<DistanceSnapshot, DistanceFailure> {
            Err(DistanceFailure::RequestDenied)
        }
    }

    fn session() -> Arc<FormSession> {
        let config = Arc::new(PricingConfig::default());
        let pricing = PricingSession::new(
            config.clone(),
            Arc::new(ConfigVehicleCatalog::new(config)),
            Arc::new(NoDistance),
            Duration::from_secs(1),
        );
        Arc::new(FormSession::new(Uuid::new_v4(), pricing, DebounceSettings::default()))
    }

    #[tokio::test]
    async fn test_insert_get_invalidate() {
        let store = SessionStore::default();
        let session = session();
        let id = session.id();

        store.insert(session).await;
        assert!(store.get(&id).await.is_some());
        assert!(store.get(&Uuid::new_v4()).await.is_none());

        store.invalidate(&id).await;
        assert!(store.get(&id).await.is_none());
    }
}
