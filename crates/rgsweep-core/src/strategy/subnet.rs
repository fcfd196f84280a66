use super::nic::{NicRelease, release_nic};
use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::options::CrossGroupDecline;
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::retry::Technique;
use async_trait::async_trait;
use rgsweep_cloud::{DeleteOptions, ResourceDescriptor, ResourceId, ResourceKind, ResourcePatch};
use tracing::warn;

/// NIC IDs behind a subnet's `ipConfigurations` references
fn bound_nics(subnet: &ResourceDescriptor) -> Vec<String> {
    let mut nics: Vec<String> = subnet
        .property_ids("/ipConfigurations")
        .into_iter()
        .filter_map(|config| {
            let at = config.to_ascii_lowercase().find("/ipconfigurations/")?;
            Some(config[..at].to_string())
        })
        .collect();
    nics.sort();
    nics.dedup();
    nics
}

/// Empty a subnet and remove it from its VNet
///
/// Order: release bound NICs, clear delegations, deal with subnet-scoped
/// locks, delete network profiles that reference the subnet, then remove the
/// subnet definition.
///
/// Only a declined cross-group VM deletion is subject to
/// [`CrossGroupDecline`]; an orphaned NIC the user chose to keep is left in
/// place and the subnet removal still runs.
pub(crate) async fn clean_subnet(
    ctx: &RemovalContext<'_>,
    subnet: &ResourceDescriptor,
) -> RemovalOutcome {
    let id = subnet.id.as_str();
    let parsed = match ResourceId::parse(id) {
        Ok(parsed) => parsed,
        Err(e) => return RemovalOutcome::failed(id, e.to_string()),
    };
    let Some(vnet_id) = parsed.parent() else {
        return RemovalOutcome::failed(id, "subnet ID has no parent network");
    };
    let name = parsed.name().to_string();
    let client = ctx.client;
    let retry = ctx.retry();
    let mut run = StepRun::new(id);

    for nic_id in bound_nics(subnet) {
        match release_nic(ctx, &nic_id).await {
            NicRelease::Released(outcome) => {
                run.record("release nic", outcome);
            }
            NicRelease::OrphanKept(_) => {
                warn!(resource = id, nic = %nic_id, "orphaned NIC left in subnet");
            }
            NicRelease::CrossGroupDeclined(outcome) => match ctx.options.cross_group_decline {
                CrossGroupDecline::AbortSubnet => {
                    let reason = match outcome.status {
                        RemovalStatus::Skipped(reason) => reason,
                        other => other.to_string(),
                    };
                    return RemovalOutcome::skipped(
                        id,
                        format!("subnet cleanup aborted: NIC {}: {}", nic_id, reason),
                    )
                    .with_attempts(run.attempts());
                }
                CrossGroupDecline::SkipNic => {
                    warn!(resource = id, nic = %nic_id, "declined NIC left in subnet");
                }
            },
        }
    }

    let delegated = subnet
        .properties
        .get("delegations")
        .and_then(|d| d.as_array())
        .is_some_and(|d| !d.is_empty());
    if delegated {
        let patch = ResourcePatch::ClearSubnetDelegations { subnet: name.clone() };
        let (vnet, patch) = (vnet_id.as_str(), &patch);
        let techniques = [Technique::new("update-vnet", move || {
            client.update_resource(vnet, patch)
        })];
        run.record("clear delegations", retry.execute(id, &techniques).await);
    }

    match client.list_locks(id).await {
        Ok(locks) if !locks.is_empty() && !ctx.options.remove_locks => {
            for lock in &locks {
                warn!(resource = id, lock = %lock.name, "subnet lock left in place");
            }
            let names: Vec<&str> = locks.iter().map(|l| l.name.as_str()).collect();
            return RemovalOutcome::skipped(
                id,
                format!("locked by {}; lock removal not enabled", names.join(", ")),
            )
            .with_attempts(run.attempts() + 1);
        }
        Ok(locks) => {
            for lock in &locks {
                let lock_id = lock.id.as_str();
                let techniques = [Technique::new("delete-lock", move || {
                    client.delete_lock(lock_id)
                })];
                run.record("delete lock", retry.execute(lock_id, &techniques).await);
            }
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => run.fail("list locks", e),
    }

    match client
        .list_resources(&ctx.group.name, Some(&[ResourceKind::NetworkProfile]))
        .await
    {
        Ok(profiles) => {
            for profile in profiles.iter().filter(|p| p.references(id)) {
                run.record("delete network profile", ctx.delete(&profile.id).await);
            }
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => run.fail("list network profiles", e),
    }

    let patch = ResourcePatch::RemoveSubnet { subnet: name };
    let (vnet, patch) = (vnet_id.as_str(), &patch);
    let techniques = [
        Technique::new("remove-subnet", move || client.update_resource(vnet, patch)),
        Technique::new("delete", move || {
            client.delete_resource(id, DeleteOptions::default())
        }),
    ];
    run.finish(retry.execute(id, &techniques).await)
}

/// Subnets
#[derive(Debug, Default, Clone, Copy)]
pub struct SubnetStrategy;

#[async_trait]
impl RemovalStrategy for SubnetStrategy {
    fn name(&self) -> &'static str {
        "subnet"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let outcome = match ctx.snapshot(&resource.id).await {
            Ok(subnet) => clean_subnet(ctx, &subnet).await,
            Err(outcome) => outcome,
        };
        outcome.attributed(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bound_nics_strips_ip_configuration() {
        let subnet = ResourceDescriptor::new("/s/subnets/default", ResourceKind::Subnet, "rg")
            .with_properties(json!({
                "ipConfigurations": [
                    { "id": "/nics/a/ipConfigurations/ipconfig1" },
                    { "id": "/nics/a/IPConfigurations/ipconfig2" },
                    { "id": "/nics/b/ipConfigurations/primary" },
                ]
            }));
        assert_eq!(bound_nics(&subnet), vec!["/nics/a", "/nics/b"]);
    }
}
