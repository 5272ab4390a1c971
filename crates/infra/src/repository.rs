//! Calendar event repository: the typed storage surface the service depends on.
//!
//! The repository owns no business rules. It forwards reads to the committed
//! state of an [`EventStore`] and collects writes until [`save`] commits them
//! as one batch.
//!
//! [`save`]: CalendarEventRepository::save

use thiserror::Error;

use calendar_core::EventId;
use calendar_events::CalendarEvent;

use crate::store::{Change, EventField, EventStore, StoreError};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store failed (reads, identity reservation or commit).
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Storage access for calendar events.
///
/// Writes (`add`, `update`, `remove`) are staged and invisible to every read
/// until `save` succeeds.
pub trait CalendarEventRepository: Send {
    fn get_all(&self) -> Result<Vec<CalendarEvent>, RepositoryError>;

    /// Stage an insert. The store assigns the identity; any id carried by
    /// `event` is overwritten, and the returned record carries the new one.
    fn add(&mut self, event: CalendarEvent) -> Result<CalendarEvent, RepositoryError>;

    /// Stage an overwrite of the stored record with `event.id`.
    fn update(&mut self, event: CalendarEvent);

    /// Stage removal of `event`.
    fn remove(&mut self, event: &CalendarEvent);

    fn get_by_id(&self, id: EventId) -> Result<Option<CalendarEvent>, RepositoryError>;

    /// First event (in storage order) named exactly `name`.
    fn get_by_name(&self, name: &str) -> Result<Option<CalendarEvent>, RepositoryError>;

    fn get_by_organizer(&self, organizer: &str) -> Result<Vec<CalendarEvent>, RepositoryError>;

    fn get_by_location(&self, location: &str) -> Result<Vec<CalendarEvent>, RepositoryError>;

    fn get_all_sorted_by_time_descending(&self) -> Result<Vec<CalendarEvent>, RepositoryError>;

    /// Commit staged changes. Staged changes are dropped whether or not the
    /// commit succeeds.
    fn save(&mut self) -> Result<bool, RepositoryError>;
}

/// [`CalendarEventRepository`] over an explicit store handle.
#[derive(Debug)]
pub struct StoreRepository<S> {
    store: S,
    pending: Vec<Change>,
}

impl<S> StoreRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            pending: Vec::new(),
        }
    }

    /// Changes staged since the last `save`.
    pub fn pending(&self) -> &[Change] {
        &self.pending
    }
}

impl<S> CalendarEventRepository for StoreRepository<S>
where
    S: EventStore,
{
    fn get_all(&self) -> Result<Vec<CalendarEvent>, RepositoryError> {
        Ok(self.store.list()?)
    }

    fn add(&mut self, event: CalendarEvent) -> Result<CalendarEvent, RepositoryError> {
        let id = self.store.next_id()?;
        let event = event.with_id(id);
        self.pending.push(Change::Insert(event.clone()));
        Ok(event)
    }

    fn update(&mut self, event: CalendarEvent) {
        self.pending.push(Change::Update(event));
    }

    fn remove(&mut self, event: &CalendarEvent) {
        self.pending.push(Change::Delete(event.id));
    }

    fn get_by_id(&self, id: EventId) -> Result<Option<CalendarEvent>, RepositoryError> {
        Ok(self.store.get(id)?)
    }

    fn get_by_name(&self, name: &str) -> Result<Option<CalendarEvent>, RepositoryError> {
        Ok(self.store.find_first_by(EventField::Name, name)?)
    }

    fn get_by_organizer(&self, organizer: &str) -> Result<Vec<CalendarEvent>, RepositoryError> {
        Ok(self.store.find_by(EventField::EventOrganizer, organizer)?)
    }

    fn get_by_location(&self, location: &str) -> Result<Vec<CalendarEvent>, RepositoryError> {
        Ok(self.store.find_by(EventField::Location, location)?)
    }

    fn get_all_sorted_by_time_descending(&self) -> Result<Vec<CalendarEvent>, RepositoryError> {
        Ok(self.store.list_by_time_desc()?)
    }

    fn save(&mut self) -> Result<bool, RepositoryError> {
        let changes = std::mem::take(&mut self.pending);
        self.store.commit(changes)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::InMemoryEventStore;

    fn draft(name: &str, time: i64, organizer: &str, location: &str) -> CalendarEvent {
        CalendarEvent {
            id: EventId::new(777),
            name: name.to_string(),
            time,
            location: location.to_string(),
            members: "ana,bo".to_string(),
            event_organizer: organizer.to_string(),
        }
    }

    fn repository() -> StoreRepository<Arc<InMemoryEventStore>> {
        StoreRepository::new(Arc::new(InMemoryEventStore::new()))
    }

    #[test]
    fn add_assigns_store_identity_over_caller_id() {
        let mut repo = repository();
        let added = repo.add(draft("Standup", 10, "ana", "HQ")).unwrap();

        assert!(added.id.is_assigned());
        assert_ne!(added.id, EventId::new(777));
        assert_eq!(repo.pending(), &[Change::Insert(added)]);
    }

    #[test]
    fn staged_writes_are_invisible_until_save() {
        let mut repo = repository();
        let added = repo.add(draft("Standup", 10, "ana", "HQ")).unwrap();

        assert!(repo.get_by_id(added.id).unwrap().is_none());
        assert!(repo.get_all().unwrap().is_empty());

        assert!(repo.save().unwrap());
        assert_eq!(repo.get_by_id(added.id).unwrap(), Some(added));
        assert!(repo.pending().is_empty());
    }

    #[test]
    fn get_by_name_returns_first_match() {
        let mut repo = repository();
        let first = repo.add(draft("Standup", 10, "ana", "HQ")).unwrap();
        repo.add(draft("Standup", 20, "bo", "Lab")).unwrap();
        repo.save().unwrap();

        assert_eq!(repo.get_by_name("Standup").unwrap(), Some(first));
        assert_eq!(repo.get_by_name("Retro").unwrap(), None);
    }

    #[test]
    fn organizer_and_location_lookups_return_all_exact_matches() {
        let mut repo = repository();
        repo.add(draft("A", 1, "ana", "HQ")).unwrap();
        repo.add(draft("B", 2, "bo", "HQ")).unwrap();
        repo.add(draft("C", 3, "ana", "Lab")).unwrap();
        repo.save().unwrap();

        let by_ana: Vec<_> = repo.get_by_organizer("ana").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(by_ana, vec!["A", "C"]);

        let at_hq: Vec<_> = repo.get_by_location("HQ").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(at_hq, vec!["A", "B"]);

        assert!(repo.get_by_location("hq").unwrap().is_empty());
    }

    #[test]
    fn update_and_remove_apply_on_save() {
        let mut repo = repository();
        let added = repo.add(draft("Standup", 10, "ana", "HQ")).unwrap();
        repo.save().unwrap();

        let mut changed = added.clone();
        changed.time = 99;
        repo.update(changed);
        assert_eq!(repo.get_by_id(added.id).unwrap().unwrap().time, 10);
        repo.save().unwrap();
        assert_eq!(repo.get_by_id(added.id).unwrap().unwrap().time, 99);

        repo.remove(&added);
        repo.save().unwrap();
        assert!(repo.get_by_id(added.id).unwrap().is_none());
    }

    #[test]
    fn failed_save_surfaces_store_error_and_clears_staging() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut repo = StoreRepository::new(store.clone());
        repo.remove(&draft("Ghost", 1, "ana", "HQ"));

        let err = repo.save().unwrap_err();
        assert!(matches!(err, RepositoryError::Store(StoreError::Conflict(_))));
        assert!(repo.pending().is_empty());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn save_with_nothing_staged_succeeds() {
        let mut repo = repository();
        assert!(repo.save().unwrap());
    }
}
