use super::subnet::clean_subnet;
use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::outcome::{RemovalOutcome, RemovalStatus};
use async_trait::async_trait;
use rgsweep_cloud::ResourceDescriptor;

/// Virtual networks
///
/// Any subnet still present is cleaned first; the VNet delete is only
/// issued once every subnet is gone.
#[derive(Debug, Default, Clone, Copy)]
pub struct VnetStrategy;

#[async_trait]
impl RemovalStrategy for VnetStrategy {
    fn name(&self) -> &'static str {
        "vnet"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let vnet = match ctx.snapshot(&resource.id).await {
            Ok(vnet) => vnet,
            Err(outcome) => return outcome.attributed(self.name()),
        };

        let mut run = StepRun::new(&vnet.id);
        for subnet_id in vnet.property_ids("/subnets") {
            let subnet = match ctx.snapshot(&subnet_id).await {
                Ok(subnet) => subnet,
                Err(outcome) => {
                    run.record("subnet", outcome);
                    continue;
                }
            };
            let outcome = clean_subnet(ctx, &subnet).await;
            if let RemovalStatus::Skipped(reason) = &outcome.status {
                let reason = format!("subnet {}: {}", subnet.name, reason);
                return RemovalOutcome::skipped(&vnet.id, reason)
                    .with_attempts(run.attempts() + outcome.attempts_made)
                    .attributed(self.name());
            }
            run.record("subnet", outcome);
        }

        if !run.is_clean() {
            return run.done(RemovalStatus::Removed).attributed(self.name());
        }
        run.finish(ctx.delete(&vnet.id).await).attributed(self.name())
    }
}
