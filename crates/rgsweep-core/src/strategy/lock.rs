use super::{RemovalContext, RemovalStrategy};
use crate::outcome::RemovalOutcome;
use crate::retry::Technique;
use async_trait::async_trait;
use rgsweep_cloud::ResourceDescriptor;
use tracing::warn;

/// Removes management locks, but only when the caller opted in
///
/// Without opt-in the lock is reported and left in place; the final group
/// delete is then expected to fail on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockStrategy;

#[async_trait]
impl RemovalStrategy for LockStrategy {
    fn name(&self) -> &'static str {
        "lock"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        if !ctx.options.remove_locks {
            warn!(
                group = %ctx.group.name,
                resource = %resource.id,
                "lock left in place; it will block the group delete"
            );
            return RemovalOutcome::skipped(
                &resource.id,
                "lock held; lock removal not enabled",
            )
            .attributed(self.name());
        }

        let client = ctx.client;
        let id = resource.id.as_str();
        let techniques = [Technique::new("delete-lock", move || client.delete_lock(id))];
        ctx.retry()
            .execute(id, &techniques)
            .await
            .attributed(self.name())
    }
}
