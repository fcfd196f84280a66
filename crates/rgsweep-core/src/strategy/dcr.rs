use super::{RemovalContext, RemovalStrategy, StepRun};
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::plan::Phase;
use crate::retry::Technique;
use async_trait::async_trait;
use rgsweep_cloud::resource_id::{management_url, split_extension_id};
use rgsweep_cloud::{DeleteOptions, ResourceDescriptor, ResourceId};
use tracing::info;

const ASSOCIATION_TYPE: &str = "Microsoft.Insights/dataCollectionRuleAssociations";
const ASSOCIATION_API_VERSION: &str = "2022-06-01";

/// Data-collection rules
///
/// Prepare removes every association of the rule. The association's target
/// is taken from the association ID itself, and each removal walks a
/// fallback chain: typed delete by name and target, raw REST delete, delete
/// by full ID.
#[derive(Debug, Default, Clone, Copy)]
pub struct DcrStrategy;

impl DcrStrategy {
    async fn remove_associations(
        &self,
        ctx: &RemovalContext<'_>,
        rule: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let parsed = match ResourceId::parse(&rule.id) {
            Ok(parsed) => parsed,
            Err(e) => return RemovalOutcome::failed(&rule.id, e.to_string()),
        };
        let associations = match ctx
            .client
            .list_dcr_associations(&parsed.resource_group, parsed.name())
            .await
        {
            Ok(associations) => associations,
            Err(e) if e.is_not_found() => {
                return RemovalOutcome::not_found(&rule.id).with_attempts(1);
            }
            Err(e) => return RemovalOutcome::failed(&rule.id, e.to_string()).with_attempts(1),
        };
        if associations.is_empty() {
            return RemovalOutcome::skipped(&rule.id, "no associations").with_attempts(1);
        }

        let client = ctx.client;
        let retry = ctx.retry();
        let mut run = StepRun::new(&rule.id);
        run.record("list", RemovalOutcome::removed(&rule.id).with_attempts(1));

        for association in &associations {
            let id = association.id.as_str();
            let Some((target, name)) = split_extension_id(id, ASSOCIATION_TYPE) else {
                run.fail("association", format!("unrecognised association ID {}", id));
                continue;
            };
            let url = management_url(id, ASSOCIATION_API_VERSION);
            let url = url.as_str();
            let techniques = [
                Technique::new("association-delete", move || {
                    client.delete_dcr_association(name, target)
                }),
                Technique::new("rest-delete", move || client.delete_by_url(url)),
                Technique::new("delete-by-id", move || {
                    client.delete_resource(id, DeleteOptions::default())
                }),
            ];
            let outcome = retry.execute(id, &techniques).await;
            if outcome.status.is_gone() {
                info!(
                    group = %ctx.group.name,
                    resource = id,
                    strategy = outcome.strategy_used.as_deref().unwrap_or_default(),
                    "dcr association removed"
                );
            }
            run.record("association", outcome);
        }
        run.done(RemovalStatus::Removed)
    }
}

#[async_trait]
impl RemovalStrategy for DcrStrategy {
    fn name(&self) -> &'static str {
        "dcr"
    }

    async fn remove(
        &self,
        ctx: &RemovalContext<'_>,
        resource: &ResourceDescriptor,
    ) -> RemovalOutcome {
        let outcome = match ctx.phase {
            Phase::Prepare => self.remove_associations(ctx, resource).await,
            Phase::Delete => ctx.delete(&resource.id).await,
        };
        outcome.attributed(self.name())
    }
}
