//! Stage ordering table and the resolver that turns a group into a plan
//!
//! Ordering is static: platform deletion constraints are known per resource
//! kind, so each kind is mapped to a fixed stage rather than discovered from
//! live references. A stage holds resources of one kind that do not depend
//! on each other, which lets the executor run them in any order.

use crate::error::Result;
use crate::retry::RetryFallbackController;
use crate::strategy::{RemovalStrategy, StrategyRegistry};
use rgsweep_cloud::{CloudResourceClient, ResourceDescriptor, ResourceGroupHandle, ResourceKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Families of stages that cleanup mode can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageFamily {
    NetApp,
    Network,
    DataCollection,
    Vault,
    Locks,
}

impl StageFamily {
    pub fn name(self) -> &'static str {
        match self {
            StageFamily::NetApp => "netapp",
            StageFamily::Network => "network",
            StageFamily::DataCollection => "data-collection",
            StageFamily::Vault => "vault",
            StageFamily::Locks => "locks",
        }
    }
}

impl std::fmt::Display for StageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StageFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "netapp" => Ok(StageFamily::NetApp),
            "network" => Ok(StageFamily::Network),
            "data-collection" | "dcr" => Ok(StageFamily::DataCollection),
            "vault" => Ok(StageFamily::Vault),
            "locks" | "lock" => Ok(StageFamily::Locks),
            other => Err(format!(
                "unknown stage family '{}' (expected netapp, network, data-collection, vault or locks)",
                other
            )),
        }
    }
}

/// What a strategy is asked to do with a resource in a given stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Detach, disassociate or unprotect; the resource itself stays
    Prepare,
    /// Remove the resource
    Delete,
}

/// One row of the stage ordering table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    NetAppVolumes,
    NetAppPools,
    NetAppBackupPolicies,
    NetAppBackups,
    NetAppBackupVaults,
    NetAppAccounts,
    NsgDisassociate,
    NicDetach,
    SubnetCleanup,
    NsgDelete,
    VnetDelete,
    DcrAssociations,
    DcrDelete,
    DceDelete,
    VaultPrepare,
    BackupUnprotect,
    VaultDelete,
    LockRemoval,
}

impl StageKind {
    /// Every stage, in execution order
    pub const ALL: [StageKind; 18] = [
        StageKind::NetAppVolumes,
        StageKind::NetAppPools,
        StageKind::NetAppBackupPolicies,
        StageKind::NetAppBackups,
        StageKind::NetAppBackupVaults,
        StageKind::NetAppAccounts,
        StageKind::NsgDisassociate,
        StageKind::NicDetach,
        StageKind::SubnetCleanup,
        StageKind::NsgDelete,
        StageKind::VnetDelete,
        StageKind::DcrAssociations,
        StageKind::DcrDelete,
        StageKind::DceDelete,
        StageKind::VaultPrepare,
        StageKind::BackupUnprotect,
        StageKind::VaultDelete,
        StageKind::LockRemoval,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::NetAppVolumes => "netapp-volumes",
            StageKind::NetAppPools => "netapp-pools",
            StageKind::NetAppBackupPolicies => "netapp-backup-policies",
            StageKind::NetAppBackups => "netapp-backups",
            StageKind::NetAppBackupVaults => "netapp-backup-vaults",
            StageKind::NetAppAccounts => "netapp-accounts",
            StageKind::NsgDisassociate => "nsg-disassociate",
            StageKind::NicDetach => "nic-detach",
            StageKind::SubnetCleanup => "subnet-cleanup",
            StageKind::NsgDelete => "nsg-delete",
            StageKind::VnetDelete => "vnet-delete",
            StageKind::DcrAssociations => "dcr-associations",
            StageKind::DcrDelete => "dcr-delete",
            StageKind::DceDelete => "dce-delete",
            StageKind::VaultPrepare => "vault-prepare",
            StageKind::BackupUnprotect => "backup-unprotect",
            StageKind::VaultDelete => "vault-delete",
            StageKind::LockRemoval => "lock-removal",
        }
    }

    pub fn family(self) -> StageFamily {
        match self {
            StageKind::NetAppVolumes
            | StageKind::NetAppPools
            | StageKind::NetAppBackupPolicies
            | StageKind::NetAppBackups
            | StageKind::NetAppBackupVaults
            | StageKind::NetAppAccounts => StageFamily::NetApp,
            StageKind::NsgDisassociate
            | StageKind::NicDetach
            | StageKind::SubnetCleanup
            | StageKind::NsgDelete
            | StageKind::VnetDelete => StageFamily::Network,
            StageKind::DcrAssociations | StageKind::DcrDelete | StageKind::DceDelete => {
                StageFamily::DataCollection
            }
            StageKind::VaultPrepare | StageKind::BackupUnprotect | StageKind::VaultDelete => {
                StageFamily::Vault
            }
            StageKind::LockRemoval => StageFamily::Locks,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            StageKind::NsgDisassociate | StageKind::DcrAssociations | StageKind::VaultPrepare => {
                Phase::Prepare
            }
            _ => Phase::Delete,
        }
    }

    /// Resource kind enumerated for this stage
    pub fn kind(self) -> ResourceKind {
        match self {
            StageKind::NetAppVolumes => ResourceKind::NetAppVolume,
            StageKind::NetAppPools => ResourceKind::NetAppPool,
            StageKind::NetAppBackupPolicies => ResourceKind::NetAppBackupPolicy,
            StageKind::NetAppBackups => ResourceKind::NetAppBackup,
            StageKind::NetAppBackupVaults => ResourceKind::NetAppBackupVault,
            StageKind::NetAppAccounts => ResourceKind::NetAppAccount,
            StageKind::NsgDisassociate | StageKind::NsgDelete => {
                ResourceKind::NetworkSecurityGroup
            }
            StageKind::NicDetach => ResourceKind::NetworkInterface,
            StageKind::SubnetCleanup => ResourceKind::Subnet,
            StageKind::VnetDelete => ResourceKind::VirtualNetwork,
            StageKind::DcrAssociations | StageKind::DcrDelete => ResourceKind::DataCollectionRule,
            StageKind::DceDelete => ResourceKind::DataCollectionEndpoint,
            StageKind::VaultPrepare | StageKind::VaultDelete => ResourceKind::RecoveryVault,
            StageKind::BackupUnprotect => ResourceKind::BackupItem,
            StageKind::LockRemoval => ResourceKind::Lock,
        }
    }

    /// Position in the ordering table
    pub fn index(self) -> usize {
        StageKind::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or(StageKind::ALL.len())
    }

    /// Stage that handles `kind` in `phase`, if any
    pub fn for_kind(kind: ResourceKind, phase: Phase) -> Option<StageKind> {
        StageKind::ALL
            .into_iter()
            .find(|s| s.kind() == kind && s.phase() == phase)
    }

    /// Stages in execution order, optionally restricted to one family
    pub fn ordered(only: Option<StageFamily>) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|s| only.is_none_or(|f| s.family() == f))
            .collect()
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A "must be handled before" relation between two (kind, phase) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub before: (ResourceKind, Phase),
    pub after: (ResourceKind, Phase),
}

const fn edge(
    before: ResourceKind,
    before_phase: Phase,
    after: ResourceKind,
    after_phase: Phase,
) -> DependencyEdge {
    DependencyEdge {
        before: (before, before_phase),
        after: (after, after_phase),
    }
}

/// Known platform deletion constraints
pub const DEPENDENCY_EDGES: &[DependencyEdge] = &[
    edge(
        ResourceKind::NetAppBackup,
        Phase::Delete,
        ResourceKind::NetAppBackupVault,
        Phase::Delete,
    ),
    edge(
        ResourceKind::NetAppVolume,
        Phase::Delete,
        ResourceKind::NetAppPool,
        Phase::Delete,
    ),
    edge(
        ResourceKind::NetAppPool,
        Phase::Delete,
        ResourceKind::NetAppAccount,
        Phase::Delete,
    ),
    edge(
        ResourceKind::NetAppBackupVault,
        Phase::Delete,
        ResourceKind::NetAppAccount,
        Phase::Delete,
    ),
    edge(
        ResourceKind::NetworkInterface,
        Phase::Delete,
        ResourceKind::Subnet,
        Phase::Delete,
    ),
    edge(
        ResourceKind::Subnet,
        Phase::Delete,
        ResourceKind::VirtualNetwork,
        Phase::Delete,
    ),
    edge(
        ResourceKind::NetworkInterface,
        Phase::Delete,
        ResourceKind::VirtualNetwork,
        Phase::Delete,
    ),
    edge(
        ResourceKind::NetworkSecurityGroup,
        Phase::Prepare,
        ResourceKind::NetworkSecurityGroup,
        Phase::Delete,
    ),
    edge(
        ResourceKind::DataCollectionRule,
        Phase::Prepare,
        ResourceKind::DataCollectionRule,
        Phase::Delete,
    ),
    edge(
        ResourceKind::DataCollectionRule,
        Phase::Delete,
        ResourceKind::DataCollectionEndpoint,
        Phase::Delete,
    ),
    edge(
        ResourceKind::RecoveryVault,
        Phase::Prepare,
        ResourceKind::BackupItem,
        Phase::Delete,
    ),
    edge(
        ResourceKind::BackupItem,
        Phase::Delete,
        ResourceKind::RecoveryVault,
        Phase::Delete,
    ),
];

impl DependencyEdge {
    /// Whether `order` handles the predecessor in a strictly earlier stage
    pub fn satisfied_by(&self, order: &[StageKind]) -> bool {
        let position = |(kind, phase): (ResourceKind, Phase)| {
            order
                .iter()
                .position(|s| s.kind() == kind && s.phase() == phase)
        };
        match (position(self.before), position(self.after)) {
            (Some(before), Some(after)) => before < after,
            _ => false,
        }
    }
}

/// One resource paired with the strategy that removes it
#[derive(Clone)]
pub struct RemovalTask {
    pub resource: ResourceDescriptor,
    pub strategy: Arc<dyn RemovalStrategy>,
}

impl std::fmt::Debug for RemovalTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalTask")
            .field("resource", &self.resource.id)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// A set of mutually independent removal tasks
#[derive(Debug, Clone)]
pub struct Stage {
    pub kind: StageKind,
    pub tasks: Vec<RemovalTask>,
    /// Why the stage could not be listed, if it could not
    pub error: Option<String>,
}

impl Stage {
    pub fn new(kind: StageKind, tasks: Vec<RemovalTask>) -> Self {
        Self {
            kind,
            tasks,
            error: None,
        }
    }

    /// A stage whose enumeration failed; it runs nothing
    pub fn unlisted(kind: StageKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            tasks: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Has tasks or a listing error worth reporting
    pub fn is_notable(&self) -> bool {
        !self.is_empty() || self.error.is_some()
    }
}

/// Serializable view of a planned stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStage {
    pub stage: StageKind,
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered stages for one group
///
/// Holds every stage of the selected families, empty ones included, so
/// execution lists each of them again right before it runs.
#[derive(Debug, Clone)]
pub struct TeardownPlan {
    pub group: String,
    pub stages: Vec<Stage>,
}

impl TeardownPlan {
    /// Nothing to remove and nothing that failed to list
    pub fn is_empty(&self) -> bool {
        !self.stages.iter().any(Stage::is_notable)
    }

    pub fn task_count(&self) -> usize {
        self.stages.iter().map(|s| s.tasks.len()).sum()
    }

    /// Stages with work or a listing error, for display
    pub fn summary(&self) -> Vec<PlannedStage> {
        self.stages
            .iter()
            .filter(|s| s.is_notable())
            .map(|s| PlannedStage {
                stage: s.kind,
                resources: s.tasks.iter().map(|t| t.resource.id.clone()).collect(),
                error: s.error.clone(),
            })
            .collect()
    }
}

/// Builds teardown plans from live cloud state
pub struct DependencyResolver {
    registry: Arc<StrategyRegistry>,
}

impl DependencyResolver {
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self { registry }
    }

    /// Enumerate every stage of the group in execution order
    ///
    /// A stage that cannot be listed stays in the plan with its error
    /// recorded; the stages after it are still enumerated.
    pub async fn plan(
        &self,
        client: &dyn CloudResourceClient,
        group: &ResourceGroupHandle,
        only: Option<StageFamily>,
        retry: &RetryFallbackController<'_>,
    ) -> TeardownPlan {
        let mut stages = Vec::new();
        for kind in StageKind::ordered(only) {
            let stage = match self.materialize(client, group, kind, retry).await {
                Ok(stage) => stage,
                Err(e) => {
                    warn!(group = %group.name, stage = %kind, error = %e, "stage listing failed");
                    Stage::unlisted(kind, e.to_string())
                }
            };
            stages.push(stage);
        }

        let plan = TeardownPlan {
            group: group.name.clone(),
            stages,
        };
        debug!(
            group = %group.name,
            tasks = plan.task_count(),
            unlisted = plan.stages.iter().filter(|s| s.error.is_some()).count(),
            "teardown plan resolved"
        );
        plan
    }

    /// Enumerate one stage's resources fresh from the client
    ///
    /// Transient listing errors are retried under the policy of `retry`.
    /// A group that no longer exists has no resources.
    pub async fn materialize(
        &self,
        client: &dyn CloudResourceClient,
        group: &ResourceGroupHandle,
        kind: StageKind,
        retry: &RetryFallbackController<'_>,
    ) -> Result<Stage> {
        let (name, scope) = (group.name.as_str(), group.id.as_str());
        let resources = if kind == StageKind::LockRemoval {
            retry
                .fetch("list locks", move || client.list_locks(scope))
                .await
                .map(|locks| locks.iter().map(|l| l.to_descriptor(name)).collect())
        } else {
            let kinds = [kind.kind()];
            let kinds = &kinds[..];
            retry
                .fetch("list resources", move || client.list_resources(name, Some(kinds)))
                .await
        };

        let resources = match resources {
            Ok(resources) => resources,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let strategy = self.registry.get(kind.kind());
        let tasks = resources
            .into_iter()
            .map(|resource| RemovalTask {
                resource,
                strategy: Arc::clone(&strategy),
            })
            .collect();
        Ok(Stage::new(kind, tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_edge_is_honoured_by_the_table() {
        let order = StageKind::ordered(None);
        for edge in DEPENDENCY_EDGES {
            assert!(edge.satisfied_by(&order), "edge violated: {:?}", edge);
        }
    }

    #[test]
    fn test_reversed_order_violates_edges() {
        let mut order = StageKind::ordered(None);
        order.reverse();
        assert!(DEPENDENCY_EDGES.iter().any(|e| !e.satisfied_by(&order)));
    }

    #[test]
    fn test_backup_items_before_vault_delete() {
        let items = StageKind::for_kind(ResourceKind::BackupItem, Phase::Delete).unwrap();
        let vault = StageKind::for_kind(ResourceKind::RecoveryVault, Phase::Delete).unwrap();
        assert!(items.index() < vault.index());
        assert!(StageKind::VaultPrepare.index() < items.index());
    }

    #[test]
    fn test_family_filter() {
        let vault = StageKind::ordered(Some(StageFamily::Vault));
        assert_eq!(
            vault,
            vec![
                StageKind::VaultPrepare,
                StageKind::BackupUnprotect,
                StageKind::VaultDelete
            ]
        );
        assert!(
            StageKind::ordered(Some(StageFamily::NetApp))
                .iter()
                .all(|s| s.family() == StageFamily::NetApp)
        );
        assert_eq!(StageKind::ordered(None).len(), StageKind::ALL.len());
    }

    #[test]
    fn test_stage_family_parsing() {
        assert_eq!("netapp".parse::<StageFamily>(), Ok(StageFamily::NetApp));
        assert_eq!(
            "Data-Collection".parse::<StageFamily>(),
            Ok(StageFamily::DataCollection)
        );
        assert!("storage".parse::<StageFamily>().is_err());
    }

    #[test]
    fn test_locks_are_last() {
        assert_eq!(StageKind::ALL.last(), Some(&StageKind::LockRemoval));
        assert_eq!(StageKind::LockRemoval.kind(), ResourceKind::Lock);
    }
}
