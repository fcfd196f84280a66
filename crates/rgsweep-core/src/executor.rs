//! Runs the tasks of one stage with bounded concurrency

use crate::options::MAX_STAGE_CONCURRENCY;
use crate::outcome::{RemovalOutcome, RemovalStatus, StageReport};
use crate::plan::Stage;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::strategy::RemovalContext;
use futures_util::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct StageExecutor {
    concurrency: usize,
}

impl StageExecutor {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.clamp(1, MAX_STAGE_CONCURRENCY),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every task of `stage` and collect all outcomes
    ///
    /// Failures never stop sibling tasks. Once `ctx.cancel` fires, tasks
    /// that have not started yet report `Skipped("cancelled")`; tasks
    /// already running finish normally.
    pub async fn run_stage(
        &self,
        stage: &Stage,
        ctx: &RemovalContext<'_>,
        progress: &ProgressSink,
    ) -> StageReport {
        let started = Instant::now();
        let ctx = ctx.with_phase(stage.kind.phase());
        let group = ctx.group.name.as_str();

        let outcomes: Vec<RemovalOutcome> = stream::iter(stage.tasks.iter())
            .map(|task| async move {
                if ctx.cancel.is_cancelled() {
                    return RemovalOutcome::skipped(&task.resource.id, "cancelled");
                }

                let outcome = task.strategy.remove(&ctx, &task.resource).await;
                match &outcome.status {
                    RemovalStatus::Removed => info!(
                        group,
                        stage = %stage.kind,
                        resource = %outcome.resource_id,
                        attempts = outcome.attempts_made,
                        strategy = outcome.strategy_used.as_deref().unwrap_or_default(),
                        "removed"
                    ),
                    RemovalStatus::Failed(error) => warn!(
                        group,
                        stage = %stage.kind,
                        resource = %outcome.resource_id,
                        attempts = outcome.attempts_made,
                        error = %error,
                        "removal failed"
                    ),
                    other => debug!(
                        group,
                        stage = %stage.kind,
                        resource = %outcome.resource_id,
                        status = %other,
                        "no removal needed"
                    ),
                }
                progress.emit(ProgressEvent::ResourceOutcome {
                    group: group.to_string(),
                    stage: stage.kind,
                    outcome: outcome.clone(),
                });
                outcome
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        StageReport {
            stage: stage.kind,
            outcomes,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}
