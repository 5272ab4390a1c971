//! Calendar event service (application-level orchestration).
//!
//! The service is the only place with decision logic. It translates between
//! [`CalendarEventView`] (what callers pass) and [`CalendarEvent`] (what the
//! repository persists), keeps identities fixed on update, and dispatches
//! single-filter queries.
//!
//! ```text
//! caller ── view ──▶ CalendarService ── entity ──▶ CalendarEventRepository ──▶ EventStore
//! ```
//!
//! Every operation runs at most one read followed by one conditional commit
//! while holding the repository lock, so staged changes from concurrent
//! callers never share a commit. There is no concurrency token: two updates of
//! the same event race and the last commit wins.

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use calendar_core::EventId;
use calendar_events::{CalendarEvent, CalendarEventView, EventFilter};

use crate::repository::{CalendarEventRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required collaborator was not supplied when building the service.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Storage failed; surfaced as-is (no retry, no compensation).
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A previous operation panicked while holding the repository.
    #[error("repository lock poisoned")]
    Poisoned,
}

/// Result of a filtered read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Id or name lookup: at most one event.
    Single(Option<CalendarEventView>),
    /// Organizer or location lookup: every match.
    Many(Vec<CalendarEventView>),
    /// No filter was supplied.
    NoFilter,
}

/// Builder for [`CalendarService`]; `build` fails if the repository is missing.
#[derive(Debug)]
pub struct CalendarServiceBuilder<R> {
    repository: Option<R>,
}

impl<R> Default for CalendarServiceBuilder<R> {
    fn default() -> Self {
        Self { repository: None }
    }
}

impl<R> CalendarServiceBuilder<R>
where
    R: CalendarEventRepository,
{
    pub fn repository(mut self, repository: R) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build(self) -> Result<CalendarService<R>, ServiceError> {
        let repository = self
            .repository
            .ok_or(ServiceError::MissingCollaborator("repository"))?;
        Ok(CalendarService::new(repository))
    }
}

/// Business-logic orchestrator for calendar events.
#[derive(Debug)]
pub struct CalendarService<R> {
    repository: Mutex<R>,
}

impl<R> CalendarService<R>
where
    R: CalendarEventRepository,
{
    pub fn new(repository: R) -> Self {
        Self {
            repository: Mutex::new(repository),
        }
    }

    pub fn builder() -> CalendarServiceBuilder<R> {
        CalendarServiceBuilder::default()
    }

    fn repo(&self) -> Result<MutexGuard<'_, R>, ServiceError> {
        self.repository.lock().map_err(|_| ServiceError::Poisoned)
    }

    pub fn get(&self, id: EventId) -> Result<Option<CalendarEventView>, ServiceError> {
        Ok(self.repo()?.get_by_id(id)?.map(CalendarEventView::from))
    }

    /// Persist a new event and return it under its store-assigned id.
    pub fn add(&self, view: CalendarEventView) -> Result<CalendarEventView, ServiceError> {
        let mut repo = self.repo()?;
        let event = repo.add(CalendarEvent::from(view))?;
        repo.save()?;
        tracing::info!(event_id = %event.id, "calendar event created");
        Ok(event.into())
    }

    /// Overwrite every field except the id. Returns `false` if `id` is unknown.
    ///
    /// The stored id always wins over `view.id`; callers are expected to have
    /// checked that they agree.
    pub fn update(&self, id: EventId, view: &CalendarEventView) -> Result<bool, ServiceError> {
        let mut repo = self.repo()?;
        let Some(mut event) = repo.get_by_id(id)? else {
            return Ok(false);
        };
        if view.id != id {
            tracing::warn!(event_id = %id, view_id = %view.id, "ignoring mismatched id on update");
        }

        event.apply_view(view);
        repo.update(event);
        repo.save()?;
        tracing::info!(event_id = %id, "calendar event updated");
        Ok(true)
    }

    /// Remove the event. Returns `false` if `id` is unknown.
    pub fn delete(&self, id: EventId) -> Result<bool, ServiceError> {
        let mut repo = self.repo()?;
        let Some(event) = repo.get_by_id(id)? else {
            return Ok(false);
        };

        repo.remove(&event);
        repo.save()?;
        tracing::info!(event_id = %id, "calendar event deleted");
        Ok(true)
    }

    pub fn get_all(&self) -> Result<Vec<CalendarEventView>, ServiceError> {
        Ok(map_all(self.repo()?.get_all()?))
    }

    pub fn get_by_organizer(&self, organizer: &str) -> Result<Vec<CalendarEventView>, ServiceError> {
        Ok(map_all(self.repo()?.get_by_organizer(organizer)?))
    }

    pub fn get_by_location(&self, location: &str) -> Result<Vec<CalendarEventView>, ServiceError> {
        Ok(map_all(self.repo()?.get_by_location(location)?))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<CalendarEventView>, ServiceError> {
        Ok(self.repo()?.get_by_name(name)?.map(CalendarEventView::from))
    }

    pub fn get_all_sorted_by_time_descending(&self) -> Result<Vec<CalendarEventView>, ServiceError> {
        Ok(map_all(self.repo()?.get_all_sorted_by_time_descending()?))
    }

    /// Run the one lookup `filter` selects.
    pub fn query(&self, filter: &EventFilter) -> Result<QueryOutcome, ServiceError> {
        let outcome = match filter {
            EventFilter::ById(id) => QueryOutcome::Single(self.get(*id)?),
            EventFilter::ByName(name) => QueryOutcome::Single(self.get_by_name(name)?),
            EventFilter::ByOrganizer(organizer) => {
                QueryOutcome::Many(self.get_by_organizer(organizer)?)
            }
            EventFilter::ByLocation(location) => QueryOutcome::Many(self.get_by_location(location)?),
            EventFilter::None => QueryOutcome::NoFilter,
        };
        Ok(outcome)
    }
}

fn map_all(events: Vec<CalendarEvent>) -> Vec<CalendarEventView> {
    events.into_iter().map(CalendarEventView::from).collect()
}
