use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::plan::Phase;
use async_trait::async_trait;
use rgsweep_cloud::{ChildRelation, ResourceDescriptor, ResourceKind};

/// NetApp account hierarchy
///
/// Stages already run bottom-up (volumes, pools, policies, backups, backup
/// vaults, accounts). Within a stage, anything still hanging below the
/// resource is removed first: backups referencing a volume, volumes of a
/// pool, backups held in a backup vault.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetAppStrategy;

impl NetAppStrategy {
    async fn delete_children(
        &self,
        ctx: &RemovalContext<'_>,
        run: &mut StepRun,
        parent_id: &str,
        relation: ChildRelation,
    ) {
        match ctx.children(parent_id, relation).await {
            Ok(children) => {
                for child in &children {
                    run.record(&relation.to_string(), ctx.delete(&child.id).await);
                }
            }
            Err(e) => run.fail(&relation.to_string(), e),
        }
    }

    async fn remove_volume(&self, ctx: &RemovalContext<'_>, volume_id: &str) -> RemovalOutcome {
        let mut run = StepRun::new(volume_id);
        self.delete_children(ctx, &mut run, volume_id, ChildRelation::NetAppVolumeBackups)
            .await;
        run.finish(ctx.delete(volume_id).await)
    }
}

#[async_trait]
impl RemovalStrategy for NetAppStrategy {
    fn name(&self) -> &'static str {
        "netapp"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        if ctx.phase == Phase::Prepare {
            return RemovalOutcome::skipped(&resource.id, "nothing to prepare")
                .attributed(self.name());
        }

        let id = resource.id.as_str();
        let outcome = match resource.kind {
            ResourceKind::NetAppVolume => self.remove_volume(ctx, id).await,
            ResourceKind::NetAppPool => {
                let mut run = StepRun::new(id);
                match ctx.children(id, ChildRelation::NetAppPoolVolumes).await {
                    Ok(volumes) => {
                        for volume in &volumes {
                            run.record("volume", self.remove_volume(ctx, &volume.id).await);
                        }
                    }
                    Err(e) => run.fail("volumes", e),
                }
                if run.is_clean() {
                    run.finish(ctx.delete(id).await)
                } else {
                    run.done(RemovalStatus::Removed)
                }
            }
            ResourceKind::NetAppBackupVault => {
                let mut run = StepRun::new(id);
                self.delete_children(ctx, &mut run, id, ChildRelation::NetAppVaultBackups)
                    .await;
                run.finish(ctx.delete(id).await)
            }
            _ => ctx.delete(id).await,
        };
        outcome.attributed(self.name())
    }
}
