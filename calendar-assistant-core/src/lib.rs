//! Calendar Assistant Core Library
//!
//! Event repositories over a calendar provider, free-time scheduling across
//! several calendars, and selection of the meeting to join right now.

pub mod assistant;
pub mod auth;
pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod event_set;
pub mod factory;
pub mod interval;
pub mod meeting;
pub mod repository;
pub mod scheduler;
pub mod time;

#[cfg(test)]
mod testing;

// Re-export core types and error handling
pub use assistant::CalendarAssistant;
pub use error::{Error, Result};
pub use event::{Event, Location, ResponseStatus};
pub use event_set::{EventSet, EventSource, Predicate, Predicates};
pub use time::TimeRange;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        assistant::*, auth::*, client::*, config::*, date::*, event::*, event_set::*, factory::*,
        meeting::*, repository::*, scheduler::*, time::*,
    };
}
