//! Teardown across many resource groups

use crate::coordinator::GroupTeardownCoordinator;
use crate::error::{CoreError, Result};
use crate::outcome::{FleetReport, GroupOutcome};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const DEFAULT_GROUP_CONCURRENCY: usize = 4;

/// Which groups a run targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
    All,
    Named(String),
}

/// How groups are scheduled relative to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One group finishes before the next starts
    Sequential,
    /// Independent groups run side by side, bounded by the group concurrency
    Concurrent,
}

pub struct FleetOrchestrator {
    coordinator: GroupTeardownCoordinator,
    group_concurrency: usize,
}

impl FleetOrchestrator {
    pub fn new(coordinator: GroupTeardownCoordinator) -> Self {
        Self {
            coordinator,
            group_concurrency: DEFAULT_GROUP_CONCURRENCY,
        }
    }

    pub fn with_group_concurrency(mut self, limit: usize) -> Self {
        self.group_concurrency = limit.max(1);
        self
    }

    pub fn coordinator(&self) -> &GroupTeardownCoordinator {
        &self.coordinator
    }

    /// Tear down every group selected by `filter`
    ///
    /// Groups are isolated from each other: a blocked group never stops the
    /// run. Once `cancel` fires, groups that have not started end `Blocked`
    /// with reason "cancelled" without any client call.
    pub async fn run_fleet(
        &self,
        filter: &GroupFilter,
        mode: ExecutionMode,
        cancel: &CancellationToken,
    ) -> Result<FleetReport> {
        let started_at = Utc::now();
        let mut groups = self.coordinator.client().list_resource_groups().await?;

        if let GroupFilter::Named(name) = filter {
            groups.retain(|g| g.name.eq_ignore_ascii_case(name));
            if groups.is_empty() {
                return Err(CoreError::GroupNotFound(name.clone()));
            }
        }
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        info!(groups = groups.len(), mode = ?mode, "fleet run started");

        let mut outcomes: Vec<GroupOutcome> = match mode {
            ExecutionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(groups.len());
                for group in &groups {
                    outcomes.push(self.coordinator.teardown(group, cancel).await);
                }
                outcomes
            }
            ExecutionMode::Concurrent => {
                stream::iter(groups.iter())
                    .map(|group| self.coordinator.teardown(group, cancel))
                    .buffer_unordered(self.group_concurrency)
                    .collect()
                    .await
            }
        };
        outcomes.sort_by(|a, b| a.group.cmp(&b.group));

        let report = FleetReport {
            started_at,
            finished_at: Utc::now(),
            mode,
            groups: outcomes,
        };
        info!(
            protected = report.protected_count(),
            deleted = report.deleted_count(),
            blocked = report.blocked_count(),
            "fleet run finished"
        );
        Ok(report)
    }
}
