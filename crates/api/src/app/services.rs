use std::sync::Arc;

use thiserror::Error;

use calendar_infra::store::{EventStore, InMemoryEventStore, PostgresEventStore, StoreError};
use calendar_infra::{CalendarService, ServiceError, StoreConfig, StoreRepository};

pub type SharedStore = Arc<dyn EventStore>;
pub type AppCalendarService = CalendarService<StoreRepository<SharedStore>>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Everything the HTTP handlers share.
pub struct AppServices {
    pub calendar: AppCalendarService,
    pub backend: &'static str,
}

impl AppServices {
    pub fn new(store: SharedStore, backend: &'static str) -> Result<Self, ServiceError> {
        let calendar = CalendarService::builder()
            .repository(StoreRepository::new(store))
            .build()?;
        Ok(Self { calendar, backend })
    }

    pub fn in_memory() -> Result<Self, ServiceError> {
        Self::new(Arc::new(InMemoryEventStore::new()), "memory")
    }
}

/// Run one calendar service call on the blocking pool.
///
/// The service is synchronous and serialises callers on its repository lock;
/// store backends may block a thread on IO while holding it, so async workers
/// never call it directly.
pub async fn run_calendar<T, F>(services: Arc<AppServices>, op: F) -> Result<T, RunError>
where
    F: FnOnce(&AppCalendarService) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&services.calendar))
        .await
        .map_err(|e| RunError::Join(e.to_string()))?
        .map_err(RunError::Service)
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Service(ServiceError),

    #[error("calendar task failed: {0}")]
    Join(String),
}

/// Construct the configured store and the calendar service over it.
pub async fn build_services(config: &StoreConfig) -> Result<AppServices, BuildError> {
    match config {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory calendar store");
            Ok(AppServices::in_memory()?)
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresEventStore::connect(database_url, *max_connections).await?;
            tracing::info!(max_connections, "connected to postgres calendar store");
            Ok(AppServices::new(Arc::new(store), "postgres")?)
        }
    }
}
