//! Run-level summary and the order-independent fold that produces it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ProviderKey, ScrapeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Done,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Done => "done",
        }
    }
}

/// Task counts keyed by terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ok: u32,
    pub blocked: u32,
    pub error: u32,
    pub parse_error: u32,
}

impl StatusCounts {
    #[must_use]
    pub fn with(mut self, status: ScrapeStatus) -> Self {
        let slot = match status {
            ScrapeStatus::Ok => &mut self.ok,
            ScrapeStatus::Blocked => &mut self.blocked,
            ScrapeStatus::Error => &mut self.error,
            ScrapeStatus::ParseError => &mut self.parse_error,
        };
        *slot = slot.saturating_add(1);
        self
    }

    #[must_use]
    pub fn get(&self, status: ScrapeStatus) -> u32 {
        match status {
            ScrapeStatus::Ok => self.ok,
            ScrapeStatus::Blocked => self.blocked,
            ScrapeStatus::Error => self.error,
            ScrapeStatus::ParseError => self.parse_error,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.ok
            .saturating_add(self.blocked)
            .saturating_add(self.error)
            .saturating_add(self.parse_error)
    }
}

/// Global and per-provider counts for a set of completed tasks.
///
/// Built by folding task outcomes in any order; the result only depends on
/// the multiset of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTally {
    pub counts: StatusCounts,
    pub providers: BTreeMap<ProviderKey, StatusCounts>,
}

impl RunTally {
    #[must_use]
    pub fn with(mut self, provider: ProviderKey, status: ScrapeStatus) -> Self {
        self.counts = self.counts.with(status);
        let entry = self.providers.entry(provider).or_default();
        *entry = entry.with(status);
        self
    }

    pub fn fold<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (ProviderKey, ScrapeStatus)>,
    {
        outcomes
            .into_iter()
            .fold(Self::default(), |tally, (provider, status)| {
                tally.with(provider, status)
            })
    }
}

/// One orchestrator invocation, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub counts: StatusCounts,
    pub providers: BTreeMap<ProviderKey, StatusCounts>,
}

impl RunSummary {
    /// A fresh run in `running` state with zeroed counts.
    #[must_use]
    pub fn start(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: None,
            status: RunStatus::Running,
            counts: StatusCounts::default(),
            providers: BTreeMap::new(),
        }
    }

    /// The completed run with `tally` as its final counts.
    #[must_use]
    pub fn finish(self, tally: RunTally, finished_at: DateTime<Utc>) -> Self {
        Self {
            finished_at: Some(finished_at),
            status: RunStatus::Done,
            counts: tally.counts,
            providers: tally.providers,
            ..self
        }
    }
}
