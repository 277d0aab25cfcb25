use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    client::CalendarClient,
    repository::{
        EventRepository, LintEventRepository, LocationEventRepository, RepositoryKind,
        StandardEventRepository,
    },
};

/// Options for [`EventRepositoryFactory::new_event_repository`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryOptions {
    pub kind: RepositoryKind,
}

impl RepositoryOptions {
    pub const fn kind(kind: RepositoryKind) -> Self {
        Self { kind }
    }
}

type RepositoryKey = (String, RepositoryKind);

/// Builds repositories and hands out the same instance for the same
/// `(calendar_id, kind)` pair.
pub struct EventRepositoryFactory {
    repositories: Mutex<HashMap<RepositoryKey, Arc<dyn EventRepository>>>,
}

impl EventRepositoryFactory {
    /// Create new factory
    pub fn new() -> Self {
        Self {
            repositories: Mutex::new(HashMap::new()),
        }
    }

    /// The cached repository for `calendar_id` and `options.kind`, built on
    /// first use. The lock is held while building so concurrent callers never
    /// create duplicates.
    pub fn new_event_repository(
        &self,
        client: &Arc<dyn CalendarClient>,
        calendar_id: &str,
        options: RepositoryOptions,
    ) -> Arc<dyn EventRepository> {
        let mut repositories = self
            .repositories
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        repositories
            .entry((calendar_id.to_string(), options.kind))
            .or_insert_with(|| {
                tracing::debug!(calendar_id, kind = %options.kind, "building event repository");
                build(client.clone(), calendar_id, options.kind)
            })
            .clone()
    }
}

impl Default for EventRepositoryFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn build(
    client: Arc<dyn CalendarClient>,
    calendar_id: &str,
    kind: RepositoryKind,
) -> Arc<dyn EventRepository> {
    match kind {
        RepositoryKind::Default => Arc::new(StandardEventRepository::new(client, calendar_id)),
        RepositoryKind::Lint => Arc::new(LintEventRepository::new(client, calendar_id)),
        RepositoryKind::Location => Arc::new(LocationEventRepository::new(client, calendar_id)),
    }
}
