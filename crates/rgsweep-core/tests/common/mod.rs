use rgsweep_cloud::{ChildRelation, MemoryCloud, ResourceGroupHandle, ResourceKind, WorkloadType};
use rgsweep_core::{
    AutoApprove, AutoDeny, ConfirmationPolicy, GroupTeardownCoordinator, Phase, RemovalContext,
    RetryPolicy, TeardownOptions,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options with a short retry schedule; `force` approves every confirmation
pub fn fast_options() -> TeardownOptions {
    TeardownOptions {
        force: true,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            operation_timeout: Duration::from_secs(5),
        },
        ..TeardownOptions::default()
    }
}

pub fn coordinator(cloud: &Arc<MemoryCloud>, options: TeardownOptions) -> GroupTeardownCoordinator {
    let confirm: Arc<dyn ConfirmationPolicy> = if options.force {
        Arc::new(AutoApprove)
    } else {
        Arc::new(AutoDeny)
    };
    GroupTeardownCoordinator::new(cloud.clone(), options, confirm)
}

#[allow(dead_code)]
pub fn context<'a>(
    cloud: &'a MemoryCloud,
    group: &'a ResourceGroupHandle,
    options: &'a TeardownOptions,
    cancel: &'a CancellationToken,
    phase: Phase,
) -> RemovalContext<'a> {
    RemovalContext {
        client: cloud,
        group,
        options,
        confirm: &AutoApprove,
        cancel,
        phase,
    }
}

#[allow(dead_code)]
pub struct NsgFixture {
    pub group: ResourceGroupHandle,
    pub nsg: String,
    pub vnet: String,
    pub subnets: Vec<String>,
    pub nic: String,
}

/// One NSG associated with two subnets and one unattached NIC
#[allow(dead_code)]
pub fn nsg_scenario(cloud: &MemoryCloud, group: &str) -> NsgFixture {
    let handle = cloud.add_group(group, &[]);
    let nsg = cloud.add_resource(group, ResourceKind::NetworkSecurityGroup, "nsg-web", json!({}));
    let vnet = cloud.add_resource(group, ResourceKind::VirtualNetwork, "vnet-main", json!({}));
    let association = json!({ "networkSecurityGroup": { "id": nsg } });
    let subnets = vec![
        cloud.add_child(&vnet, ResourceKind::Subnet, "frontend", association.clone()),
        cloud.add_child(&vnet, ResourceKind::Subnet, "backend", association),
    ];
    let nic = cloud.add_resource(
        group,
        ResourceKind::NetworkInterface,
        "nic-web",
        json!({
            "networkSecurityGroup": { "id": nsg },
            "subnet": { "id": subnets[0] },
        }),
    );
    NsgFixture {
        group: handle,
        nsg,
        vnet,
        subnets,
        nic,
    }
}

#[allow(dead_code)]
pub struct VaultFixture {
    pub group: ResourceGroupHandle,
    pub vault: String,
    pub items: Vec<String>,
    pub container: String,
    pub private_endpoint: String,
}

/// A vault with soft delete on, one soft-deleted item, a SQL item, a
/// registered container, site-recovery fabric and a private endpoint
#[allow(dead_code)]
pub fn vault_scenario(cloud: &MemoryCloud, group: &str) -> VaultFixture {
    let handle = cloud.add_group(group, &[]);
    let vault = cloud.add_resource(
        group,
        ResourceKind::RecoveryVault,
        "rsv-main",
        json!({ "softDeleteFeatureState": "Enabled", "enhancedSecurityState": "Enabled" }),
    );
    let items = vec![
        cloud.add_related(
            &vault,
            ChildRelation::BackupItems(WorkloadType::AzureVm),
            "vm-app",
            json!({ "protectionState": "SoftDeleted" }),
        ),
        cloud.add_related(
            &vault,
            ChildRelation::BackupItems(WorkloadType::Mssql),
            "sql-db",
            json!({}),
        ),
    ];
    let container = cloud.add_related(
        &vault,
        ChildRelation::BackupContainers(WorkloadType::Mars),
        "mars-agent",
        json!({}),
    );
    cloud.add_related(&vault, ChildRelation::ReplicationFabrics, "fabric-1", json!({}));
    let private_endpoint =
        cloud.add_resource(group, ResourceKind::PrivateEndpoint, "pe-vault", json!({}));
    cloud.add_related(
        &vault,
        ChildRelation::PrivateEndpointConnections,
        "pe-conn",
        json!({ "privateEndpoint": { "id": private_endpoint } }),
    );
    VaultFixture {
        group: handle,
        vault,
        items,
        container,
        private_endpoint,
    }
}

#[allow(dead_code)]
pub struct NetAppFixture {
    pub group: ResourceGroupHandle,
    pub account: String,
    pub pool: String,
    pub volume: String,
    pub backup_vault: String,
    pub backup: String,
    pub policy: String,
}

/// Account → pool → volume, with a backup of the volume in a backup vault
#[allow(dead_code)]
pub fn netapp_scenario(cloud: &MemoryCloud, group: &str) -> NetAppFixture {
    let handle = cloud.add_group(group, &[]);
    let account = cloud.add_resource(group, ResourceKind::NetAppAccount, "anf", json!({}));
    let pool = cloud.add_child(&account, ResourceKind::NetAppPool, "pool-1", json!({}));
    let volume = cloud.add_child(&pool, ResourceKind::NetAppVolume, "vol-1", json!({}));
    let backup_vault =
        cloud.add_child(&account, ResourceKind::NetAppBackupVault, "bv-1", json!({}));
    let backup = cloud.add_child(
        &backup_vault,
        ResourceKind::NetAppBackup,
        "vol-1-daily",
        json!({ "volumeResourceId": volume }),
    );
    let policy = cloud.add_child(&account, ResourceKind::NetAppBackupPolicy, "daily", json!({}));
    NetAppFixture {
        group: handle,
        account,
        pool,
        volume,
        backup_vault,
        backup,
        policy,
    }
}
