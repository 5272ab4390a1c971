//! Single-filter query model.
//!
//! A filtered read honors exactly one criterion per call. When several are
//! supplied the highest-priority one wins: id, then name, then organizer, then
//! location. Supplying none is its own outcome, not "all events".

use calendar_core::EventId;

/// The one lookup criterion a filtered read dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    ById(EventId),
    ByName(String),
    ByOrganizer(String),
    ByLocation(String),
    None,
}

impl EventFilter {
    /// Select the highest-priority criterion present; lower ones are ignored.
    pub fn from_params(
        id: Option<EventId>,
        name: Option<String>,
        organizer: Option<String>,
        location: Option<String>,
    ) -> Self {
        if let Some(id) = id {
            Self::ById(id)
        } else if let Some(name) = name {
            Self::ByName(name)
        } else if let Some(organizer) = organizer {
            Self::ByOrganizer(organizer)
        } else if let Some(location) = location {
            Self::ByLocation(location)
        } else {
            Self::None
        }
    }
}
