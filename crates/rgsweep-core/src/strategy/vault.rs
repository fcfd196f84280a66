use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::plan::Phase;
use crate::retry::Technique;
use async_trait::async_trait;
use rgsweep_cloud::resource_id::management_url;
use rgsweep_cloud::{ChildRelation, ResourceAction, ResourceDescriptor, WorkloadType};
use tracing::{info, warn};

const VAULT_API_VERSION: &str = "2024-04-01";
const SOFT_DELETED: &str = "SoftDeleted";

/// Site-recovery collections, innermost first
const REPLICATION_RELATIONS: [ChildRelation; 4] = [
    ChildRelation::ReplicationProtectedItems,
    ChildRelation::ReplicationContainerMappings,
    ChildRelation::ReplicationNetworkMappings,
    ChildRelation::ReplicationFabrics,
];

async fn invoke(
    ctx: &RemovalContext<'_>,
    id: &str,
    action: ResourceAction,
    technique: &'static str,
) -> RemovalOutcome {
    let client = ctx.client;
    let techniques = [Technique::new(technique, move || client.invoke_action(id, action))];
    ctx.retry().execute(id, &techniques).await
}

fn is_soft_deleted(item: &ResourceDescriptor) -> bool {
    item.property_str("/protectionState") == Some(SOFT_DELETED)
}

/// Stop protection of a backup item and delete its data
///
/// A soft-deleted item is restored first. Success is only reported once the
/// item is actually gone; with vault soft delete still on, the item lingers
/// in the soft-deleted state and this fails.
async fn unprotect_item(ctx: &RemovalContext<'_>, item: &ResourceDescriptor) -> RemovalOutcome {
    let id = item.id.as_str();
    let mut run = StepRun::new(id);

    if is_soft_deleted(item) {
        run.record(
            "undo soft delete",
            invoke(ctx, id, ResourceAction::UndoSoftDelete, "undo-soft-delete").await,
        );
    }

    let stop = ResourceAction::DisableProtection {
        delete_backup_data: true,
    };
    if !run.record(
        "disable protection",
        invoke(ctx, id, stop, "disable-protection").await,
    ) {
        return run.done(RemovalStatus::Removed);
    }

    match ctx.client.get_resource(id).await {
        Err(e) if e.is_not_found() => {}
        Ok(remaining) if is_soft_deleted(&remaining) => {
            run.fail("verify", "item is soft-deleted; vault soft delete is still enabled")
        }
        Ok(_) => run.fail("verify", "item still present after protection was stopped"),
        Err(e) => run.fail("verify", e),
    }
    run.done(RemovalStatus::Removed)
}

/// Recovery-services vaults
///
/// Prepare turns off soft delete, restores soft-deleted items and turns off
/// enhanced security. Delete empties the vault (protected items and
/// containers for every workload type, site-recovery registrations,
/// private endpoints) and deletes it, falling back to a raw REST delete when
/// the vault survives the normal call.
#[derive(Debug, Default, Clone, Copy)]
pub struct VaultStrategy;

impl VaultStrategy {
    async fn prepare(
        &self,
        ctx: &RemovalContext<'_>,
        vault: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let id = vault.id.as_str();
        let mut run = StepRun::new(id);

        run.record(
            "disable soft delete",
            invoke(ctx, id, ResourceAction::DisableSoftDelete, "disable-soft-delete").await,
        );

        for workload in WorkloadType::ALL {
            match ctx.children(id, ChildRelation::BackupItems(workload)).await {
                Ok(items) => {
                    for item in items.iter().filter(|i| is_soft_deleted(i)) {
                        let undone = invoke(
                            ctx,
                            &item.id,
                            ResourceAction::UndoSoftDelete,
                            "undo-soft-delete",
                        )
                        .await;
                        run.record("undo soft delete", undone);
                    }
                }
                Err(e) => run.fail(&format!("list {} items", workload), e),
            }
        }

        run.record(
            "disable security features",
            invoke(
                ctx,
                id,
                ResourceAction::DisableSecurityFeatures,
                "disable-security-features",
            )
            .await,
        );
        run.done(RemovalStatus::Removed)
    }

    async fn delete(&self, ctx: &RemovalContext<'_>, vault: &ResourceDescriptor) -> RemovalOutcome {
        let id = vault.id.as_str();
        let mut run = StepRun::new(id);

        for workload in WorkloadType::ALL {
            match ctx.children(id, ChildRelation::BackupItems(workload)).await {
                Ok(items) => {
                    for item in &items {
                        run.record("unprotect item", unprotect_item(ctx, item).await);
                    }
                }
                Err(e) => run.fail(&format!("list {} items", workload), e),
            }
            match ctx.children(id, ChildRelation::BackupContainers(workload)).await {
                Ok(containers) => {
                    for container in &containers {
                        run.record(
                            "unregister container",
                            invoke(
                                ctx,
                                &container.id,
                                ResourceAction::UnregisterContainer,
                                "unregister",
                            )
                            .await,
                        );
                    }
                }
                Err(e) => run.fail(&format!("list {} containers", workload), e),
            }
        }

        for relation in REPLICATION_RELATIONS {
            match ctx.children(id, relation).await {
                Ok(children) => {
                    for child in &children {
                        run.record(&relation.to_string(), ctx.delete(&child.id).await);
                    }
                }
                Err(e) => run.fail(&relation.to_string(), e),
            }
        }

        match ctx.children(id, ChildRelation::PrivateEndpointConnections).await {
            Ok(connections) => {
                for connection in &connections {
                    run.record("private endpoint connection", ctx.delete(&connection.id).await);
                    if let Some(endpoint) = connection.property_str("/privateEndpoint/id") {
                        run.record("private endpoint", ctx.delete(endpoint).await);
                    }
                }
            }
            Err(e) => run.fail("private endpoint connections", e),
        }

        if !run.is_clean() {
            warn!(
                group = %ctx.group.name,
                resource = id,
                "vault not fully emptied; attempting delete anyway"
            );
        }

        let primary = ctx.delete(id).await;
        if primary.status != RemovalStatus::Removed {
            return run.finish(primary);
        }
        match ctx.client.get_resource(id).await {
            Ok(_) => {
                info!(resource = id, "vault survived delete; retrying through REST");
                run.record("delete", primary);
                let url = management_url(id, VAULT_API_VERSION);
                let url = url.as_str();
                let client = ctx.client;
                let techniques = [Technique::new("rest-delete", move || client.delete_by_url(url))];
                run.finish(ctx.retry().execute(id, &techniques).await)
            }
            Err(_) => run.finish(primary),
        }
    }
}

#[async_trait]
impl RemovalStrategy for VaultStrategy {
    fn name(&self) -> &'static str {
        "vault"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let outcome = match ctx.phase {
            Phase::Prepare => self.prepare(ctx, resource).await,
            Phase::Delete => self.delete(ctx, resource).await,
        };
        outcome.attributed(self.name())
    }
}

/// Protected backup items
#[derive(Debug, Default, Clone, Copy)]
pub struct BackupItemStrategy;

#[async_trait]
impl RemovalStrategy for BackupItemStrategy {
    fn name(&self) -> &'static str {
        "backup-item"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let outcome = match ctx.phase {
            Phase::Prepare => RemovalOutcome::skipped(&resource.id, "nothing to prepare"),
            Phase::Delete => match ctx.snapshot(&resource.id).await {
                Ok(item) => unprotect_item(ctx, &item).await,
                Err(outcome) => outcome,
            },
        };
        outcome.attributed(self.name())
    }
}
