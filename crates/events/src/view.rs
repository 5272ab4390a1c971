use serde::{Deserialize, Serialize};

use calendar_core::{DomainError, DomainResult, EventId};

use crate::event::CalendarEvent;

/// Transfer representation of a calendar event, used across the service boundary.
///
/// Field-identical to [`CalendarEvent`]. Only `id` may be absent from JSON, in
/// which case it carries [`EventId::UNASSIGNED`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventView {
    #[serde(default)]
    pub id: EventId,
    pub name: String,
    pub time: i64,
    pub location: String,
    pub members: String,
    pub event_organizer: String,
}

impl CalendarEventView {
    /// Check that every required text field is present and non-blank.
    ///
    /// The service trusts its callers; boundaries run this before handing a view in.
    pub fn validate(&self) -> DomainResult<()> {
        let required = [
            ("name", &self.name),
            ("location", &self.location),
            ("members", &self.members),
            ("eventOrganizer", &self.event_organizer),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

impl From<CalendarEvent> for CalendarEventView {
    fn from(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            name: event.name,
            time: event.time,
            location: event.location,
            members: event.members,
            event_organizer: event.event_organizer,
        }
    }
}

impl From<CalendarEventView> for CalendarEvent {
    fn from(view: CalendarEventView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            time: view.time,
            location: view.location,
            members: view.members,
            event_organizer: view.event_organizer,
        }
    }
}
