use serde::Deserialize;

use calendar_core::{DomainError, DomainResult, EventId};
use calendar_events::{CalendarEventView, EventFilter};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/calendar` and `PUT /api/calendar/:id`.
///
/// Text fields default to empty so `validate` names the missing one; `time`
/// has no usable default and must be sent.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalendarEventRequest {
    pub id: EventId,
    pub name: String,
    pub time: Option<i64>,
    pub location: String,
    pub members: String,
    pub event_organizer: String,
}

impl CalendarEventRequest {
    pub fn into_view(self) -> DomainResult<CalendarEventView> {
        let time = self
            .time
            .ok_or_else(|| DomainError::validation("time is required"))?;
        let view = CalendarEventView {
            id: self.id,
            name: self.name,
            time,
            location: self.location,
            members: self.members,
            event_organizer: self.event_organizer,
        };
        view.validate()?;
        Ok(view)
    }
}

/// Query string of `GET /api/calendar/query`.
///
/// The id stays a string here so a malformed value becomes a 400 with a JSON
/// body instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQueryParams {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "eventOrganizer")]
    pub event_organizer: Option<String>,
    pub location: Option<String>,
}

impl CalendarQueryParams {
    /// A blank `id` counts as absent; blank text filters are still supplied.
    pub fn into_filter(self) -> DomainResult<EventFilter> {
        let id = match self.id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<EventId>()?),
        };
        Ok(EventFilter::from_params(
            id,
            self.name,
            self.event_organizer,
            self.location,
        ))
    }
}
