use super::{RemovalContext, RemovalStrategy};
use crate::outcome::RemovalOutcome;
use crate::plan::Phase;
use async_trait::async_trait;
use rgsweep_cloud::ResourceDescriptor;

/// Retried delete by ID, for kinds without ordering quirks
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericStrategy;

#[async_trait]
impl RemovalStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let outcome = match ctx.phase {
            Phase::Prepare => RemovalOutcome::skipped(&resource.id, "nothing to prepare"),
            Phase::Delete => ctx.delete(&resource.id).await,
        };
        outcome.attributed(self.name())
    }
}
