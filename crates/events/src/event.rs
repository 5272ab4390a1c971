use serde::{Deserialize, Serialize};

use calendar_core::EventId;

use crate::view::CalendarEventView;

/// Storage entity: one calendar event as the store persists it.
///
/// Events are opaque records. `time` is an arbitrary orderable timestamp and
/// `members` is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub name: String,
    pub time: i64,
    pub location: String,
    pub members: String,
    pub event_organizer: String,
}

impl CalendarEvent {
    /// Overwrite every mutable field from `view`. The identity is left untouched.
    pub fn apply_view(&mut self, view: &CalendarEventView) {
        self.name.clone_from(&view.name);
        self.time = view.time;
        self.location.clone_from(&view.location);
        self.members.clone_from(&view.members);
        self.event_organizer.clone_from(&view.event_organizer);
    }

    /// Same record under a store-assigned identity.
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }
}
