//! Per-group teardown state machine
//!
//! ```text
//! Discovered ─┬─▶ Protected
//!             └─▶ Planning ─┬─▶ Planned                      (dry run)
//!                           └─▶ Executing(1..N) ─┬─▶ Cleaned (cleanup mode)
//!                                                └─▶ FinalDeleting ─┬─▶ Deleted
//!                                                                   └─▶ Blocked
//! ```

use crate::confirm::ConfirmationPolicy;
use crate::executor::StageExecutor;
use crate::options::TeardownOptions;
use crate::outcome::{
    GroupOutcome, GroupState, MAX_REASON_LEN, RemovalOutcome, StageReport, sanitize_reason,
};
use crate::plan::{DependencyResolver, Phase};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::retry::RetryFallbackController;
use crate::strategy::{RemovalContext, StrategyRegistry};
use rgsweep_cloud::{CloudError, CloudResourceClient, GroupDeleteOptions, ResourceGroupHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Tears down one resource group end to end
pub struct GroupTeardownCoordinator {
    client: Arc<dyn CloudResourceClient>,
    resolver: DependencyResolver,
    executor: StageExecutor,
    options: TeardownOptions,
    confirm: Arc<dyn ConfirmationPolicy>,
    progress: ProgressSink,
}

impl GroupTeardownCoordinator {
    pub fn new(
        client: Arc<dyn CloudResourceClient>,
        options: TeardownOptions,
        confirm: Arc<dyn ConfirmationPolicy>,
    ) -> Self {
        Self {
            client,
            resolver: DependencyResolver::new(Arc::new(StrategyRegistry::with_defaults())),
            executor: StageExecutor::new(options.effective_stage_concurrency()),
            options,
            confirm,
            progress: ProgressSink::disabled(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<StrategyRegistry>) -> Self {
        self.resolver = DependencyResolver::new(registry);
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub fn client(&self) -> &dyn CloudResourceClient {
        self.client.as_ref()
    }

    pub fn options(&self) -> &TeardownOptions {
        &self.options
    }

    fn transition(&self, group: &ResourceGroupHandle, state: GroupState) -> GroupState {
        info!(group = %group.name, state = %state, "group state changed");
        self.progress.emit(ProgressEvent::GroupStateChanged {
            group: group.name.clone(),
            state: state.clone(),
        });
        state
    }

    fn finish(&self, group: &ResourceGroupHandle, state: GroupState) -> GroupOutcome {
        GroupOutcome::new(&group.name, self.transition(group, state))
    }

    fn blocked(reason: impl AsRef<str>) -> GroupState {
        GroupState::Blocked {
            reason: sanitize_reason(reason.as_ref(), MAX_REASON_LEN),
        }
    }

    /// Run the state machine for `group` to a terminal state
    ///
    /// With a group timeout configured, hitting it cancels the group's own
    /// token: running calls finish, nothing new starts, and the group ends
    /// `Blocked` with reason "timed out".
    pub async fn teardown(
        &self,
        group: &ResourceGroupHandle,
        cancel: &CancellationToken,
    ) -> GroupOutcome {
        self.transition(group, GroupState::Discovered);
        if group.is_protected_by(&self.options.protection_tag) {
            return self.finish(group, GroupState::Protected);
        }

        let token = cancel.child_token();
        let timed_out = AtomicBool::new(false);
        let run = self.run(group, &token, &timed_out);

        match self.options.group_timeout {
            Some(limit) => {
                tokio::pin!(run);
                tokio::select! {
                    outcome = &mut run => outcome,
                    _ = tokio::time::sleep(limit) => {
                        warn!(
                            group = %group.name,
                            timeout_secs = limit.as_secs(),
                            "group timed out"
                        );
                        timed_out.store(true, Ordering::SeqCst);
                        token.cancel();
                        run.await
                    }
                }
            }
            None => run.await,
        }
    }

    async fn run(
        &self,
        group: &ResourceGroupHandle,
        cancel: &CancellationToken,
        timed_out: &AtomicBool,
    ) -> GroupOutcome {
        let interrupted = || {
            if timed_out.load(Ordering::SeqCst) {
                Self::blocked("timed out")
            } else {
                Self::blocked("cancelled")
            }
        };

        if cancel.is_cancelled() {
            return self.finish(group, interrupted());
        }

        self.transition(group, GroupState::Planning);
        let client = self.client.as_ref();
        let retry = RetryFallbackController::new(&self.options.retry, cancel);
        let plan = self
            .resolver
            .plan(client, group, self.options.only, &retry)
            .await;

        if self.options.dry_run {
            let mut outcome = self.finish(group, GroupState::Planned);
            outcome.plan = Some(plan.summary());
            return outcome;
        }

        let ctx = RemovalContext {
            client,
            group,
            options: &self.options,
            confirm: self.confirm.as_ref(),
            cancel,
            phase: Phase::Delete,
        };

        let total = plan.stages.len();
        let mut reports: Vec<StageReport> = Vec::new();
        for (index, planned) in plan.stages.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            // Listed again right before running; stages empty at planning
            // time may have gained resources since.
            let listed = self
                .resolver
                .materialize(client, group, planned.kind, &retry)
                .await;
            if matches!(&listed, Ok(stage) if stage.is_empty()) {
                continue;
            }
            self.transition(
                group,
                GroupState::Executing {
                    stage: index + 1,
                    of: total,
                },
            );

            let report = match listed {
                Ok(stage) => {
                    self.progress.emit(ProgressEvent::StageStarted {
                        group: group.name.clone(),
                        stage: stage.kind,
                        tasks: stage.tasks.len(),
                    });
                    self.executor.run_stage(&stage, &ctx, &self.progress).await
                }
                Err(e) => {
                    warn!(
                        group = %group.name,
                        stage = %planned.kind,
                        error = %e,
                        "stage enumeration failed"
                    );
                    StageReport {
                        stage: planned.kind,
                        outcomes: vec![RemovalOutcome::failed(
                            &group.id,
                            format!("enumeration failed: {}", e),
                        )],
                        duration_ms: 0,
                    }
                }
            };

            if report.is_degraded() {
                warn!(
                    group = %group.name,
                    stage = %report.stage,
                    failed = report.failed_count(),
                    "stage degraded; continuing"
                );
            }
            self.progress.emit(ProgressEvent::StageFinished {
                group: group.name.clone(),
                stage: report.stage,
                failed: report.failed_count(),
                total: report.outcomes.len(),
                duration_ms: report.duration_ms,
            });
            reports.push(report);
        }

        let state = if cancel.is_cancelled() {
            interrupted()
        } else if self.options.only.is_some() {
            GroupState::Cleaned
        } else {
            self.transition(group, GroupState::FinalDeleting);
            self.final_delete(group).await
        };

        let mut outcome = self.finish(group, state);
        outcome.stages = reports;
        outcome
    }

    /// Delete the group; on conflict retry once with force deletion types
    async fn final_delete(&self, group: &ResourceGroupHandle) -> GroupState {
        match self.delete_group(group, &GroupDeleteOptions::default()).await {
            Ok(()) => GroupState::Deleted,
            Err(e) if e.is_not_found() => GroupState::Deleted,
            Err(e) if e.is_conflict() => {
                warn!(
                    group = %group.name,
                    error = %e,
                    "group delete conflicted; retrying with force deletion"
                );
                let forced = GroupDeleteOptions::forced(self.options.force_deletion_types.clone());
                match self.delete_group(group, &forced).await {
                    Ok(()) => GroupState::Deleted,
                    Err(e) if e.is_not_found() => GroupState::Deleted,
                    Err(e) => Self::blocked(e.to_string()),
                }
            }
            Err(e) => Self::blocked(e.to_string()),
        }
    }

    async fn delete_group(
        &self,
        group: &ResourceGroupHandle,
        options: &GroupDeleteOptions,
    ) -> rgsweep_cloud::Result<()> {
        let timeout = self.options.retry.operation_timeout;
        let delete = self.client.delete_resource_group(&group.name, options);
        match tokio::time::timeout(timeout, delete).await {
            Ok(result) => result,
            Err(_) => Err(CloudError::Timeout(format!(
                "group delete did not finish within {:?}",
                timeout
            ))),
        }
    }
}
