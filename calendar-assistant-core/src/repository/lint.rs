use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;

use crate::{
    Result,
    client::CalendarClient,
    event_set::{EventSet, Predicate, Predicates},
    repository::{EventRepository, RepositoryBase, RepositoryKind},
    time::TimeRange,
};

/// Finds events that look structurally wrong: zero length, or still waiting
/// for the user's answer. Read-only.
pub struct LintEventRepository {
    base: RepositoryBase,
}

impl LintEventRepository {
    pub fn new(client: Arc<dyn CalendarClient>, calendar_id: impl Into<String>) -> Self {
        Self {
            base: RepositoryBase::new(client, calendar_id),
        }
    }

    /// Predicates applied before the caller's own.
    pub fn default_predicates() -> Predicates {
        Predicates::new().with(Predicate::Suspect, true)
    }
}

#[async_trait]
impl EventRepository for LintEventRepository {
    fn calendar_id(&self) -> &str {
        &self.base.calendar_id
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Lint
    }

    async fn time_zone(&self) -> Result<Tz> {
        self.base.time_zone().await
    }

    async fn find(&self, range: &TimeRange, predicates: &Predicates) -> Result<EventSet> {
        let events = self.base.list(range).await?;
        let predicates = Self::default_predicates().merged(predicates);
        Ok(EventSet::new(self.source(), events).filter_by(&predicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error,
        event::{Event, LintIssue, ResponseStatus},
        testing::{MemoryCalendarClient, range, utc},
    };

    fn client() -> MemoryCalendarClient {
        let at = utc("2024-07-13T09:00:00Z");
        MemoryCalendarClient::new()
            .with_event("primary", Event::new("primary", at, at).with_summary("blip"))
            .with_event(
                "primary",
                Event::new("primary", utc("2024-07-13T10:00:00Z"), utc("2024-07-13T11:00:00Z"))
                    .with_summary("invite")
                    .with_response_status(ResponseStatus::NeedsAction),
            )
            .with_event(
                "primary",
                Event::new("primary", utc("2024-07-13T12:00:00Z"), utc("2024-07-13T13:00:00Z"))
                    .with_summary("lunch"),
            )
    }

    #[tokio::test]
    async fn test_find_reports_only_suspect_events() {
        let repo = LintEventRepository::new(Arc::new(client()), "primary");
        let day = range("2024-07-13T00:00:00Z", "2024-07-14T00:00:00Z");
        let found = repo.find(&day, &Predicates::new()).await.unwrap();

        let titles: Vec<_> = found.iter().map(Event::title).collect();
        assert_eq!(titles, vec!["blip", "invite"]);
        assert_eq!(found.events()[0].lint_issues(), vec![LintIssue::ZeroDuration]);
        assert_eq!(found.events()[1].lint_issues(), vec![LintIssue::AwaitingResponse]);
    }

    #[tokio::test]
    async fn test_caller_predicates_override_defaults() {
        let repo = LintEventRepository::new(Arc::new(client()), "primary");
        let day = range("2024-07-13T00:00:00Z", "2024-07-14T00:00:00Z");
        let clean = repo
            .find(&day, &Predicates::new().with(Predicate::Suspect, false))
            .await
            .unwrap();
        let titles: Vec<_> = clean.iter().map(Event::title).collect();
        assert_eq!(titles, vec!["lunch"]);
    }

    #[tokio::test]
    async fn test_create_is_unsupported() {
        let client = Arc::new(client());
        let repo = LintEventRepository::new(client.clone(), "primary");
        let slot = range("2024-07-13T09:00:00Z", "2024-07-13T10:00:00Z");
        let err = repo.create(&slot, "x", &Predicates::new()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Unsupported {
                operation: "create",
                repository: "lint"
            }
        ));
        assert!(client.inserted().is_empty());
    }
}
