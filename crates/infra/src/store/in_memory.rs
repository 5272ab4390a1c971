use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use calendar_core::EventId;
use calendar_events::CalendarEvent;

use super::r#trait::{Change, EventField, EventStore, StoreError};

/// In-memory calendar event store.
///
/// Intended for tests/dev. Not optimized for performance: a commit works on a
/// copy of the table and swaps it in only once every change has applied.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: RwLock<BTreeMap<EventId, CalendarEvent>>,
    last_id: AtomicI64,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<EventId, CalendarEvent>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn apply(table: &mut BTreeMap<EventId, CalendarEvent>, change: Change) -> Result<(), StoreError> {
        match change {
            Change::Insert(event) => {
                if !event.id.is_assigned() {
                    return Err(StoreError::InvalidId(event.id));
                }
                if table.contains_key(&event.id) {
                    return Err(StoreError::Conflict(format!("event {} already exists", event.id)));
                }
                table.insert(event.id, event);
            }
            Change::Update(event) => match table.get_mut(&event.id) {
                Some(slot) => *slot = event,
                None => {
                    return Err(StoreError::Conflict(format!(
                        "event {} no longer exists",
                        event.id
                    )));
                }
            },
            Change::Delete(id) => {
                if table.remove(&id).is_none() {
                    return Err(StoreError::Conflict(format!("event {id} no longer exists")));
                }
            }
        }
        Ok(())
    }
}

impl EventStore for InMemoryEventStore {
    fn next_id(&self) -> Result<EventId, StoreError> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(EventId::new(id))
    }

    fn get(&self, id: EventId) -> Result<Option<CalendarEvent>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn find_by(&self, field: EventField, value: &str) -> Result<Vec<CalendarEvent>, StoreError> {
        Ok(self
            .read()?
            .values()
            .filter(|e| field.of(e) == value)
            .cloned()
            .collect())
    }

    fn find_first_by(&self, field: EventField, value: &str) -> Result<Option<CalendarEvent>, StoreError> {
        Ok(self.read()?.values().find(|e| field.of(e) == value).cloned())
    }

    fn list_by_time_desc(&self) -> Result<Vec<CalendarEvent>, StoreError> {
        let mut events = self.list()?;
        // Stable sort: equal times stay in id order.
        events.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(events)
    }

    fn commit(&self, changes: Vec<Change>) -> Result<usize, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        let mut next = records.clone();
        let applied = changes.len();
        for change in changes {
            Self::apply(&mut next, change)?;
        }
        *records = next;

        tracing::debug!(applied, "committed calendar event changes");
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: EventId, name: &str, time: i64) -> CalendarEvent {
        CalendarEvent {
            id,
            name: name.to_string(),
            time,
            location: "HQ".to_string(),
            members: "ana".to_string(),
            event_organizer: "ana".to_string(),
        }
    }

    fn insert(store: &InMemoryEventStore, name: &str, time: i64) -> EventId {
        let id = store.next_id().unwrap();
        store.commit(vec![Change::Insert(event(id, name, time))]).unwrap();
        id
    }

    #[test]
    fn next_id_is_monotonic_and_non_zero() {
        let store = InMemoryEventStore::new();
        let a = store.next_id().unwrap();
        let b = store.next_id().unwrap();
        assert!(a.is_assigned());
        assert!(b > a);
    }

    #[test]
    fn insert_then_get_and_list() {
        let store = InMemoryEventStore::new();
        let a = insert(&store, "A", 10);
        let b = insert(&store, "B", 20);

        assert_eq!(store.get(a).unwrap().unwrap().name, "A");
        let names: Vec<_> = store.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(store.get(EventId::new(b.value() + 1)).unwrap().is_none());
    }

    #[test]
    fn find_by_matches_exactly() {
        let store = InMemoryEventStore::new();
        insert(&store, "Standup", 10);
        insert(&store, "standup", 20);
        insert(&store, "Standup", 30);

        let found = store.find_by(EventField::Name, "Standup").unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|e| e.name == "Standup"));
        assert!(found[0].id < found[1].id);
    }

    #[test]
    fn find_first_by_returns_lowest_id_match() {
        let store = InMemoryEventStore::new();
        insert(&store, "standup", 5);
        let first = insert(&store, "Standup", 10);
        insert(&store, "Standup", 30);

        let found = store.find_first_by(EventField::Name, "Standup").unwrap().unwrap();
        assert_eq!(found.id, first);
        assert!(store.find_first_by(EventField::Name, "Retro").unwrap().is_none());
    }

    #[test]
    fn time_desc_keeps_id_order_for_ties() {
        let store = InMemoryEventStore::new();
        let a = insert(&store, "A", 10);
        let b = insert(&store, "B", 30);
        let c = insert(&store, "C", 10);

        let ids: Vec<_> = store.list_by_time_desc().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn failed_commit_leaves_table_untouched() {
        let store = InMemoryEventStore::new();
        let a = insert(&store, "A", 10);

        let fresh = store.next_id().unwrap();
        let err = store
            .commit(vec![
                Change::Insert(event(fresh, "B", 20)),
                Change::Delete(EventId::new(999)),
            ])
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn update_of_missing_record_conflicts() {
        let store = InMemoryEventStore::new();
        let err = store
            .commit(vec![Change::Update(event(EventId::new(5), "X", 1))])
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn insert_requires_assigned_id() {
        let store = InMemoryEventStore::new();
        let err = store
            .commit(vec![Change::Insert(event(EventId::UNASSIGNED, "X", 1))])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }
}
