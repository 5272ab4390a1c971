//! Calendar events domain module.
//!
//! This crate contains the calendar event record, its transfer-facing view and
//! the single-filter query model. Pure data and mapping (no IO, no HTTP, no storage).

pub mod event;
pub mod filter;
pub mod view;

pub use event::CalendarEvent;
pub use filter::EventFilter;
pub use view::CalendarEventView;
