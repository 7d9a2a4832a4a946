//! Generation counters telling a front end which data categories to re-fetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::domain::feedback::{DataRefresher, DataScope};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSnapshot {
    pub proposals: u64,
    pub issues: u64,
    pub proposals_refreshed_at: Option<DateTime<Utc>>,
    pub issues_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct RefreshTracker {
    proposals: AtomicU64,
    issues: AtomicU64,
    stamps: Mutex<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>,
}

impl RefreshTracker {
    pub fn generation(&self, scope: DataScope) -> u64 {
        self.counter(scope).load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> RefreshSnapshot {
        let stamps = self.stamps.lock().unwrap_or_else(|e| e.into_inner());
        RefreshSnapshot {
            proposals: self.generation(DataScope::Proposals),
            issues: self.generation(DataScope::Issues),
            proposals_refreshed_at: stamps.0,
            issues_refreshed_at: stamps.1,
        }
    }

    fn counter(&self, scope: DataScope) -> &AtomicU64 {
        match scope {
            DataScope::Proposals => &self.proposals,
            DataScope::Issues => &self.issues,
        }
    }
}

#[async_trait]
impl DataRefresher for RefreshTracker {
    async fn load(&self, scope: DataScope) -> anyhow::Result<()> {
        let generation = self.counter(scope).fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        {
            let mut stamps = self.stamps.lock().unwrap_or_else(|e| e.into_inner());
            match scope {
                DataScope::Proposals => stamps.0 = Some(now),
                DataScope::Issues => stamps.1 = Some(now),
            }
        }
        debug!(?scope, generation, "data refresh requested");
        Ok(())
    }
}
