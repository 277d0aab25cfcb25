pub mod base;
pub mod lint;
pub mod location;
pub mod standard;

use std::fmt;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    event_set::{EventSet, EventSource, Predicates},
    time::TimeRange,
};

pub use base::RepositoryBase;
pub use lint::LintEventRepository;
pub use location::LocationEventRepository;
pub use standard::StandardEventRepository;

/// Which flavour of repository to build for a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    #[default]
    Default,
    Lint,
    Location,
}

impl RepositoryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Lint => "lint",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queries and writes against a single calendar.
///
/// Implementations hold no event data of their own; every call reflects the
/// provider's current state.
#[async_trait]
pub trait EventRepository: Send + Sync {
    fn calendar_id(&self) -> &str;

    fn kind(&self) -> RepositoryKind;

    /// The timezone the calendar is configured with.
    async fn time_zone(&self) -> Result<Tz>;

    /// Events overlapping `range` that satisfy `predicates`, by start time.
    async fn find(&self, range: &TimeRange, predicates: &Predicates) -> Result<EventSet>;

    /// Write events for `range` carrying `payload`. Every call writes; two
    /// identical calls create two sets of events.
    async fn create(
        &self,
        _range: &TimeRange,
        _payload: &str,
        _predicates: &Predicates,
    ) -> Result<EventSet> {
        Err(Error::Unsupported {
            operation: "create",
            repository: self.kind().as_str(),
        })
    }

    fn source(&self) -> EventSource {
        EventSource::Repository {
            calendar_id: self.calendar_id().to_string(),
            kind: self.kind(),
        }
    }
}
