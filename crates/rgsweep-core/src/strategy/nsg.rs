use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::confirm::{ConfirmationKind, ConfirmationRequest};
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::plan::Phase;
use crate::retry::Technique;
use async_trait::async_trait;
use rgsweep_cloud::{ResourceDescriptor, ResourceId, ResourcePatch};
use tracing::info;

/// Network security groups
///
/// Prepare clears every subnet and NIC association through an update on the
/// owning resource (the subnet's VNet, or the NIC). Delete only goes ahead
/// once no association is left.
#[derive(Debug, Default, Clone, Copy)]
pub struct NsgStrategy;

impl NsgStrategy {
    async fn disassociate(
        &self,
        ctx: &RemovalContext<'_>,
        nsg: &ResourceDescriptor,
        subnets: &[String],
        nics: &[String],
    ) -> RemovalOutcome {
        let associations: Vec<String> = subnets.iter().chain(nics).cloned().collect();
        let request = ConfirmationRequest::new(
            ConfirmationKind::NsgDisassociation,
            &nsg.id,
            format!("remove {} association(s) of NSG {}", associations.len(), nsg.name),
        )
        .with_resources(associations);
        if !ctx.confirm.confirm(&request).await {
            return RemovalOutcome::skipped(&nsg.id, "disassociation declined");
        }

        let mut run = StepRun::new(&nsg.id);
        let client = ctx.client;
        let retry = ctx.retry();

        for subnet_id in subnets {
            let parsed = match ResourceId::parse(subnet_id) {
                Ok(parsed) => parsed,
                Err(e) => {
                    run.fail("subnet", e);
                    continue;
                }
            };
            let Some(vnet_id) = parsed.parent() else {
                run.fail("subnet", format!("{} has no parent network", subnet_id));
                continue;
            };
            let patch = ResourcePatch::ClearSubnetNsg {
                subnet: parsed.name().to_string(),
            };
            let (vnet_id, patch) = (&vnet_id, &patch);
            let techniques = [Technique::new("update-vnet", move || {
                client.update_resource(vnet_id, patch)
            })];
            let outcome = retry.execute(subnet_id, &techniques).await;
            run.record("clear subnet association", outcome);
        }

        for nic_id in nics {
            let nic_id = nic_id.as_str();
            let techniques = [Technique::new("update-nic", move || {
                client.update_resource(nic_id, &ResourcePatch::ClearNicNsg)
            })];
            let outcome = retry.execute(nic_id, &techniques).await;
            run.record("clear nic association", outcome);
        }

        if run.is_clean() {
            info!(
                group = %ctx.group.name,
                resource = %nsg.id,
                subnets = subnets.len(),
                nics = nics.len(),
                "nsg disassociated"
            );
        }
        run.done(RemovalStatus::Removed)
    }
}

#[async_trait]
impl RemovalStrategy for NsgStrategy {
    fn name(&self) -> &'static str {
        "nsg"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let nsg = match ctx.snapshot(&resource.id).await {
            Ok(nsg) => nsg,
            Err(outcome) => return outcome.attributed(self.name()),
        };
        let subnets = nsg.property_ids("/subnets");
        let nics = nsg.property_ids("/networkInterfaces");

        let outcome = match ctx.phase {
            Phase::Prepare if subnets.is_empty() && nics.is_empty() => {
                RemovalOutcome::skipped(&nsg.id, "no associations")
            }
            Phase::Prepare => self.disassociate(ctx, &nsg, &subnets, &nics).await,
            Phase::Delete if !subnets.is_empty() || !nics.is_empty() => RemovalOutcome::skipped(
                &nsg.id,
                format!("{} association(s) remain", subnets.len() + nics.len()),
            ),
            Phase::Delete => ctx.delete(&nsg.id).await,
        };
        outcome.attributed(self.name())
    }
}
