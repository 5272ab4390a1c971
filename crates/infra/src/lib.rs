//! Infrastructure layer: event stores, the repository adapter, the calendar
//! service and configuration.

pub mod calendar_service;
pub mod config;
pub mod repository;
pub mod store;

pub use calendar_service::{CalendarService, CalendarServiceBuilder, QueryOutcome, ServiceError};
pub use config::{AppConfig, ConfigError, StoreConfig};
pub use repository::{CalendarEventRepository, RepositoryError, StoreRepository};
