//! Per-kind removal strategies
//!
//! Each resource kind that needs more than a plain delete has its own
//! [`RemovalStrategy`]. The [`StrategyRegistry`] maps kinds to strategies and
//! falls back to [`GenericStrategy`] for everything else, so supporting a new
//! kind means registering one more implementation.

mod dcr;
mod generic;
mod lock;
mod netapp;
mod nic;
mod nsg;
mod subnet;
mod vault;
mod vnet;

pub use dcr::DcrStrategy;
pub use generic::GenericStrategy;
pub use lock::LockStrategy;
pub use netapp::NetAppStrategy;
pub use nic::NicStrategy;
pub use nsg::NsgStrategy;
pub use subnet::SubnetStrategy;
pub use vault::{BackupItemStrategy, VaultStrategy};
pub use vnet::VnetStrategy;

use crate::confirm::ConfirmationPolicy;
use crate::options::TeardownOptions;
use crate::outcome::{RemovalOutcome, RemovalStatus};
use crate::plan::Phase;
use crate::retry::{RetryFallbackController, Technique};
use async_trait::async_trait;
use rgsweep_cloud::{
    ChildRelation, CloudResourceClient, DeleteOptions, ResourceDescriptor, ResourceGroupHandle,
    ResourceKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait RemovalStrategy: Send + Sync {
    /// Short name used in outcome attribution
    fn name(&self) -> &'static str;

    /// Detach or delete `resource` according to `ctx.phase`
    ///
    /// Never returns an error: every failure ends up in the outcome.
    async fn remove(&self, ctx: &RemovalContext<'_>, resource: &ResourceDescriptor)
    -> RemovalOutcome;
}

/// Everything a strategy may use while removing one resource
#[derive(Clone, Copy)]
pub struct RemovalContext<'a> {
    pub client: &'a dyn CloudResourceClient,
    pub group: &'a ResourceGroupHandle,
    pub options: &'a TeardownOptions,
    pub confirm: &'a dyn ConfirmationPolicy,
    pub cancel: &'a CancellationToken,
    pub phase: Phase,
}

impl<'a> RemovalContext<'a> {
    pub fn with_phase(self, phase: Phase) -> Self {
        Self { phase, ..self }
    }

    pub fn retry(&self) -> RetryFallbackController<'a> {
        RetryFallbackController::new(&self.options.retry, self.cancel)
    }

    /// Plain delete by ID under the retry policy
    pub async fn delete(&self, id: &str) -> RemovalOutcome {
        let client = self.client;
        let techniques = [Technique::new("delete", move || {
            client.delete_resource(id, DeleteOptions::default())
        })];
        self.retry().execute(id, &techniques).await
    }

    /// Fresh snapshot of a resource; `Err` carries the finished outcome
    pub async fn snapshot(&self, id: &str) -> Result<ResourceDescriptor, RemovalOutcome> {
        match self.client.get_resource(id).await {
            Ok(resource) => Ok(resource),
            Err(e) if e.is_not_found() => Err(RemovalOutcome::not_found(id).with_attempts(1)),
            Err(e) => Err(RemovalOutcome::failed(id, e.to_string()).with_attempts(1)),
        }
    }

    /// List a child collection, treating a vanished parent as empty
    pub async fn children(
        &self,
        parent_id: &str,
        relation: ChildRelation,
    ) -> rgsweep_cloud::Result<Vec<ResourceDescriptor>> {
        match self.client.list_children(parent_id, relation).await {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }
}

/// Accumulates the sub-steps of a multi-call removal into one outcome
pub(crate) struct StepRun {
    resource_id: String,
    attempts: u32,
    failures: Vec<String>,
}

impl StepRun {
    pub fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            attempts: 0,
            failures: Vec::new(),
        }
    }

    /// Fold in a sub-step; true when the step left its target gone or done
    pub fn record(&mut self, step: &str, outcome: RemovalOutcome) -> bool {
        self.attempts += outcome.attempts_made;
        match outcome.status {
            RemovalStatus::Failed(reason) => {
                self.failures.push(format!("{}: {}", step, reason));
                false
            }
            RemovalStatus::Skipped(_) => false,
            RemovalStatus::Removed | RemovalStatus::NotFound => true,
        }
    }

    pub fn fail(&mut self, step: &str, reason: impl std::fmt::Display) {
        self.attempts += 1;
        self.failures.push(format!("{}: {}", step, reason));
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Close with a fixed status unless a sub-step failed
    pub fn done(self, status: RemovalStatus) -> RemovalOutcome {
        let status = if self.failures.is_empty() {
            status
        } else {
            RemovalStatus::Failed(self.failures.join("; "))
        };
        RemovalOutcome::new(self.resource_id, status).with_attempts(self.attempts)
    }

    /// Close with the outcome of the final call
    pub fn finish(self, last: RemovalOutcome) -> RemovalOutcome {
        let attempts = self.attempts + last.attempts_made;
        let status = match last.status {
            RemovalStatus::Failed(reason) if !self.failures.is_empty() => {
                RemovalStatus::Failed(format!("{}; {}", self.failures.join("; "), reason))
            }
            status => status,
        };
        RemovalOutcome {
            resource_id: self.resource_id,
            status,
            attempts_made: attempts,
            strategy_used: last.strategy_used,
        }
    }
}

/// Maps resource kinds to their strategy
pub struct StrategyRegistry {
    strategies: HashMap<ResourceKind, Arc<dyn RemovalStrategy>>,
    fallback: Arc<dyn RemovalStrategy>,
}

impl StrategyRegistry {
    /// Registry where every kind uses the generic strategy
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: Arc::new(GenericStrategy),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        let netapp: Arc<dyn RemovalStrategy> = Arc::new(NetAppStrategy);
        for kind in [
            ResourceKind::NetAppAccount,
            ResourceKind::NetAppPool,
            ResourceKind::NetAppVolume,
            ResourceKind::NetAppBackupPolicy,
            ResourceKind::NetAppBackupVault,
            ResourceKind::NetAppBackup,
        ] {
            registry.register_shared(kind, Arc::clone(&netapp));
        }
        registry.register(ResourceKind::NetworkSecurityGroup, NsgStrategy);
        registry.register(ResourceKind::NetworkInterface, NicStrategy);
        registry.register(ResourceKind::Subnet, SubnetStrategy);
        registry.register(ResourceKind::VirtualNetwork, VnetStrategy);
        registry.register(ResourceKind::DataCollectionRule, DcrStrategy);
        registry.register(ResourceKind::RecoveryVault, VaultStrategy);
        registry.register(ResourceKind::BackupItem, BackupItemStrategy);
        registry.register(ResourceKind::Lock, LockStrategy);
        registry
    }

    pub fn register(&mut self, kind: ResourceKind, strategy: impl RemovalStrategy + 'static) {
        self.strategies.insert(kind, Arc::new(strategy));
    }

    pub fn register_shared(&mut self, kind: ResourceKind, strategy: Arc<dyn RemovalStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    pub fn get(&self, kind: ResourceKind) -> Arc<dyn RemovalStrategy> {
        self.strategies
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_dispatch() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.get(ResourceKind::NetworkSecurityGroup).name(), "nsg");
        assert_eq!(registry.get(ResourceKind::NetAppPool).name(), "netapp");
        assert_eq!(registry.get(ResourceKind::DataCollectionEndpoint).name(), "generic");
        assert_eq!(registry.get(ResourceKind::Generic).name(), "generic");

        let empty = StrategyRegistry::empty();
        assert_eq!(empty.get(ResourceKind::Lock).name(), "generic");
    }

    #[test]
    fn test_step_run_joins_failures() {
        let mut run = StepRun::new("/vault");
        assert!(run.record("soft-delete", RemovalOutcome::removed("/vault").with_attempts(1)));
        assert!(!run.record(
            "unregister",
            RemovalOutcome::failed("/c", "Conflict").with_attempts(3)
        ));
        let last = RemovalOutcome::failed("/vault", "still has items").with_attempts(2);
        let outcome = run.finish(last);

        assert_eq!(outcome.attempts_made, 6);
        assert_eq!(
            outcome.status,
            RemovalStatus::Failed("unregister: Conflict; still has items".into())
        );
    }
}
