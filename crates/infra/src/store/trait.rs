use std::sync::Arc;

use thiserror::Error;

use calendar_core::EventId;
use calendar_events::CalendarEvent;

/// Text field of a calendar event that supports exact-match lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventField {
    Name,
    Location,
    EventOrganizer,
}

impl EventField {
    /// Read this field off an event.
    pub fn of<'a>(&self, event: &'a CalendarEvent) -> &'a str {
        match self {
            EventField::Name => &event.name,
            EventField::Location => &event.location,
            EventField::EventOrganizer => &event.event_organizer,
        }
    }

    /// Column name in the persisted `calendar_events` table.
    pub fn column(&self) -> &'static str {
        match self {
            EventField::Name => "name",
            EventField::Location => "location",
            EventField::EventOrganizer => "event_organizer",
        }
    }
}

/// A staged write, applied by [`EventStore::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Insert a record under its (already reserved) identity.
    Insert(CalendarEvent),
    /// Overwrite the record with the same identity.
    Update(CalendarEvent),
    /// Remove the record with this identity.
    Delete(EventId),
}

impl Change {
    pub fn event_id(&self) -> EventId {
        match self {
            Change::Insert(e) | Change::Update(e) => e.id,
            Change::Delete(id) => *id,
        }
    }
}

/// Event store operation error.
///
/// These are **infrastructure errors**. Lookup misses are not errors; they come
/// back as `None` or an empty `Vec`.
///
/// - **Conflict**: the batch referenced a record that is missing (update/delete)
///   or already present (insert), typically because another commit won a race
/// - **InvalidId**: an identity the store never assigned was handed back
/// - **Backend**: the underlying storage failed (connection, query, lock)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("commit conflict: {0}")]
    Conflict(String),

    #[error("invalid event id: {0}")]
    InvalidId(EventId),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Calendar event persistence: one logical table keyed by [`EventId`].
///
/// ## Read Semantics
///
/// Reads only ever observe committed state. "Storage order" is ascending id,
/// which is also insertion order because ids are reserved monotonically.
///
/// ## Write Semantics
///
/// `commit()` applies a batch of [`Change`]s atomically: every change is
/// validated against the current state first, and either all of them land or
/// none do.
pub trait EventStore: Send + Sync {
    /// Reserve a fresh, never-before-used identity.
    fn next_id(&self) -> Result<EventId, StoreError>;

    /// Load one committed record.
    fn get(&self, id: EventId) -> Result<Option<CalendarEvent>, StoreError>;

    /// All committed records, in storage order.
    fn list(&self) -> Result<Vec<CalendarEvent>, StoreError>;

    /// Records whose `field` equals `value` exactly, in storage order.
    fn find_by(&self, field: EventField, value: &str) -> Result<Vec<CalendarEvent>, StoreError>;

    /// The first record (storage order) whose `field` equals `value`.
    fn find_first_by(&self, field: EventField, value: &str) -> Result<Option<CalendarEvent>, StoreError>;

    /// All committed records ordered by `time` descending; equal times keep storage order.
    fn list_by_time_desc(&self) -> Result<Vec<CalendarEvent>, StoreError>;

    /// Apply a batch of changes atomically. Returns the number of changes applied.
    fn commit(&self, changes: Vec<Change>) -> Result<usize, StoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn next_id(&self) -> Result<EventId, StoreError> {
        (**self).next_id()
    }

    fn get(&self, id: EventId) -> Result<Option<CalendarEvent>, StoreError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        (**self).list()
    }

    fn find_by(&self, field: EventField, value: &str) -> Result<Vec<CalendarEvent>, StoreError> {
        (**self).find_by(field, value)
    }

    fn find_first_by(&self, field: EventField, value: &str) -> Result<Option<CalendarEvent>, StoreError> {
        (**self).find_first_by(field, value)
    }

    fn list_by_time_desc(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        (**self).list_by_time_desc()
    }

    fn commit(&self, changes: Vec<Change>) -> Result<usize, StoreError> {
        (**self).commit(changes)
    }
}
