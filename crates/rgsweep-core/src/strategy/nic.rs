use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::confirm::{ConfirmationKind, ConfirmationRequest};
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::retry::Technique;
use async_trait::async_trait;
use rgsweep_cloud::{DeleteOptions, ResourceDescriptor, ResourceId, ResourcePatch};
use tracing::warn;

/// How releasing a NIC ended
pub(crate) enum NicRelease {
    /// The NIC is gone, or removing it failed outright
    Released(RemovalOutcome),
    /// Deleting the VM in another group was declined; the NIC stays
    CrossGroupDeclined(RemovalOutcome),
    /// Deleting an unattached NIC was declined; the NIC stays
    OrphanKept(RemovalOutcome),
}

impl NicRelease {
    pub fn into_outcome(self) -> RemovalOutcome {
        match self {
            NicRelease::Released(outcome)
            | NicRelease::CrossGroupDeclined(outcome)
            | NicRelease::OrphanKept(outcome) => outcome,
        }
    }
}

/// Free a NIC from whatever holds it, then delete it
///
/// - attached to a VM in this group: detach it from the VM (or delete the VM
///   when detaching is rejected), then delete the NIC
/// - attached to a VM in another group: delete VM and NIC only on confirmation
/// - owned by a private endpoint: delete the endpoint, which takes the NIC along
/// - attached to nothing: delete on confirmation
pub(crate) async fn release_nic(ctx: &RemovalContext<'_>, nic_id: &str) -> NicRelease {
    let nic = match ctx.snapshot(nic_id).await {
        Ok(nic) => nic,
        Err(outcome) => return NicRelease::Released(outcome),
    };
    let client = ctx.client;
    let retry = ctx.retry();

    if let Some(vm_id) = nic.property_str("/virtualMachine/id") {
        let vm_group = ResourceId::parse(vm_id)
            .map(|id| id.resource_group)
            .unwrap_or_default();
        let mut run = StepRun::new(nic_id);

        if !vm_group.eq_ignore_ascii_case(&ctx.group.name) {
            let request = ConfirmationRequest::new(
                ConfirmationKind::CrossGroupVm,
                vm_id,
                format!(
                    "NIC {} is attached to a VM in resource group {}; delete that VM and the NIC",
                    nic.name, vm_group
                ),
            )
            .with_resources(vec![vm_id.to_string(), nic_id.to_string()]);
            if !ctx.confirm.confirm(&request).await {
                warn!(
                    group = %ctx.group.name,
                    resource = nic_id,
                    vm = vm_id,
                    "cross-group VM deletion declined"
                );
                return NicRelease::CrossGroupDeclined(RemovalOutcome::skipped(
                    nic_id,
                    format!("attached to VM in group {}; deletion declined", vm_group),
                ));
            }
            if !run.record("delete cross-group vm", ctx.delete(vm_id).await) {
                return NicRelease::Released(run.done(RemovalStatus::Removed));
            }
        } else {
            let patch = ResourcePatch::DetachNic {
                nic_id: nic_id.to_string(),
            };
            let patch = &patch;
            let techniques = [
                Technique::new("detach-nic", move || client.update_resource(vm_id, patch)),
                Technique::new("delete-vm", move || {
                    client.delete_resource(vm_id, DeleteOptions::default())
                }),
            ];
            if !run.record("detach", retry.execute(nic_id, &techniques).await) {
                return NicRelease::Released(run.done(RemovalStatus::Removed));
            }
        }
        return NicRelease::Released(run.finish(ctx.delete(nic_id).await));
    }

    if let Some(endpoint_id) = nic.property_str("/privateEndpoint/id") {
        let techniques = [Technique::new("delete-private-endpoint", move || {
            client.delete_resource(endpoint_id, DeleteOptions::default())
        })];
        return NicRelease::Released(retry.execute(nic_id, &techniques).await);
    }

    let request = ConfirmationRequest::new(
        ConfirmationKind::OrphanedNic,
        nic_id,
        format!("NIC {} is not attached to anything; delete it", nic.name),
    )
    .with_resources(vec![nic_id.to_string()]);
    if !ctx.confirm.confirm(&request).await {
        return NicRelease::OrphanKept(RemovalOutcome::skipped(nic_id, "orphaned NIC kept"));
    }
    NicRelease::Released(ctx.delete(nic_id).await)
}

/// Network interfaces
#[derive(Debug, Default, Clone, Copy)]
pub struct NicStrategy;

#[async_trait]
impl RemovalStrategy for NicStrategy {
    fn name(&self) -> &'static str {
        "nic"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        release_nic(ctx, &resource.id)
            .await
            .into_outcome()
            .attributed(self.name())
    }
}
