//! Resource model shared by clients and the teardown engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a cloud resource, as far as teardown ordering is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    NetworkSecurityGroup,
    VirtualNetwork,
    Subnet,
    NetworkInterface,
    PrivateEndpoint,
    NetworkProfile,
    VirtualMachine,
    DataCollectionRule,
    DataCollectionRuleAssociation,
    DataCollectionEndpoint,
    RecoveryVault,
    BackupItem,
    BackupContainer,
    NetAppAccount,
    NetAppPool,
    NetAppVolume,
    NetAppBackupPolicy,
    NetAppBackupVault,
    NetAppBackup,
    Lock,
    Generic,
}

const KIND_TYPES: &[(ResourceKind, &str)] = &[
    (
        ResourceKind::NetworkSecurityGroup,
        "Microsoft.Network/networkSecurityGroups",
    ),
    (ResourceKind::VirtualNetwork, "Microsoft.Network/virtualNetworks"),
    (ResourceKind::Subnet, "Microsoft.Network/virtualNetworks/subnets"),
    (
        ResourceKind::NetworkInterface,
        "Microsoft.Network/networkInterfaces",
    ),
    (ResourceKind::PrivateEndpoint, "Microsoft.Network/privateEndpoints"),
    (ResourceKind::NetworkProfile, "Microsoft.Network/networkProfiles"),
    (ResourceKind::VirtualMachine, "Microsoft.Compute/virtualMachines"),
    (
        ResourceKind::DataCollectionRule,
        "Microsoft.Insights/dataCollectionRules",
    ),
    (
        ResourceKind::DataCollectionRuleAssociation,
        "Microsoft.Insights/dataCollectionRuleAssociations",
    ),
    (
        ResourceKind::DataCollectionEndpoint,
        "Microsoft.Insights/dataCollectionEndpoints",
    ),
    (ResourceKind::RecoveryVault, "Microsoft.RecoveryServices/vaults"),
    (
        ResourceKind::BackupItem,
        "Microsoft.RecoveryServices/vaults/backupFabrics/protectionContainers/protectedItems",
    ),
    (
        ResourceKind::BackupContainer,
        "Microsoft.RecoveryServices/vaults/backupFabrics/protectionContainers",
    ),
    (ResourceKind::NetAppAccount, "Microsoft.NetApp/netAppAccounts"),
    (
        ResourceKind::NetAppPool,
        "Microsoft.NetApp/netAppAccounts/capacityPools",
    ),
    (
        ResourceKind::NetAppVolume,
        "Microsoft.NetApp/netAppAccounts/capacityPools/volumes",
    ),
    (
        ResourceKind::NetAppBackupPolicy,
        "Microsoft.NetApp/netAppAccounts/backupPolicies",
    ),
    (
        ResourceKind::NetAppBackupVault,
        "Microsoft.NetApp/netAppAccounts/backupVaults",
    ),
    (
        ResourceKind::NetAppBackup,
        "Microsoft.NetApp/netAppAccounts/backupVaults/backups",
    ),
    (ResourceKind::Lock, "Microsoft.Authorization/locks"),
];

impl ResourceKind {
    /// Map a provider type string (e.g. `Microsoft.Network/virtualNetworks`) to a kind.
    ///
    /// Matching is case-insensitive; unknown types are [`ResourceKind::Generic`].
    pub fn from_type(resource_type: &str) -> Self {
        KIND_TYPES
            .iter()
            .find(|(_, t)| t.eq_ignore_ascii_case(resource_type))
            .map(|(k, _)| *k)
            .unwrap_or(ResourceKind::Generic)
    }

    /// Provider type string for this kind (empty for `Generic`)
    pub fn resource_type(self) -> &'static str {
        KIND_TYPES
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, t)| *t)
            .unwrap_or("")
    }

    /// Last path segment of the provider type, used when building nested IDs
    pub fn type_segment(self) -> &'static str {
        self.resource_type().rsplit('/').next().unwrap_or("")
    }

    /// Whether the provider type is nested below another resource type
    pub fn is_nested(self) -> bool {
        self.resource_type().matches('/').count() > 1
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::NetworkSecurityGroup => "nsg",
            ResourceKind::VirtualNetwork => "vnet",
            ResourceKind::Subnet => "subnet",
            ResourceKind::NetworkInterface => "nic",
            ResourceKind::PrivateEndpoint => "private-endpoint",
            ResourceKind::NetworkProfile => "network-profile",
            ResourceKind::VirtualMachine => "vm",
            ResourceKind::DataCollectionRule => "dcr",
            ResourceKind::DataCollectionRuleAssociation => "dcr-association",
            ResourceKind::DataCollectionEndpoint => "dce",
            ResourceKind::RecoveryVault => "recovery-vault",
            ResourceKind::BackupItem => "backup-item",
            ResourceKind::BackupContainer => "backup-container",
            ResourceKind::NetAppAccount => "netapp-account",
            ResourceKind::NetAppPool => "netapp-pool",
            ResourceKind::NetAppVolume => "netapp-volume",
            ResourceKind::NetAppBackupPolicy => "netapp-backup-policy",
            ResourceKind::NetAppBackupVault => "netapp-backup-vault",
            ResourceKind::NetAppBackup => "netapp-backup",
            ResourceKind::Lock => "lock",
            ResourceKind::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

/// A discovered resource
///
/// Descriptors are snapshots: they are never mutated and are re-enumerated
/// before every stage since earlier stages change attachment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Fully-qualified resource ID
    pub id: String,

    /// Resource name (last ID segment)
    pub name: String,

    /// Teardown kind
    pub kind: ResourceKind,

    /// Provider type string as reported by the platform
    pub resource_type: String,

    /// Owning resource group
    pub group: String,

    /// Raw provider-specific properties
    pub properties: serde_json::Value,
}

impl ResourceDescriptor {
    pub fn new(id: impl Into<String>, kind: ResourceKind, group: impl Into<String>) -> Self {
        let id = id.into();
        let name = id.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            id,
            name,
            kind,
            resource_type: kind.resource_type().to_string(),
            group: group.into(),
            properties: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    /// String property at a JSON pointer (e.g. `/virtualMachine/id`)
    pub fn property_str(&self, pointer: &str) -> Option<&str> {
        self.properties
            .pointer(pointer)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// IDs from an array of `{ "id": ... }` objects at a JSON pointer
    pub fn property_ids(&self, pointer: &str) -> Vec<String> {
        self.properties
            .pointer(pointer)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("id").and_then(|id| id.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any string anywhere in the properties equals `id` (case-insensitive)
    pub fn references(&self, id: &str) -> bool {
        fn walk(value: &serde_json::Value, id: &str) -> bool {
            match value {
                serde_json::Value::String(s) => s.eq_ignore_ascii_case(id),
                serde_json::Value::Array(items) => items.iter().any(|v| walk(v, id)),
                serde_json::Value::Object(map) => map.values().any(|v| walk(v, id)),
                _ => false,
            }
        }
        walk(&self.properties, id)
    }
}

/// Tag that marks a resource group as protected from teardown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionTag {
    pub key: String,
    pub value: String,
}

impl Default for ProtectionTag {
    fn default() -> Self {
        Self {
            key: "keep".to_string(),
            value: "true".to_string(),
        }
    }
}

/// A resource group as discovered at the start of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroupHandle {
    /// Group name
    pub name: String,

    /// Fully-qualified group ID, used as lock scope
    pub id: String,

    /// Tags on the group
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl ResourceGroupHandle {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            tags: HashMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Whether the group carries the default `keep=true` protection tag
    pub fn is_protected(&self) -> bool {
        self.is_protected_by(&ProtectionTag::default())
    }

    /// Whether the group carries the given protection tag (key and value case-insensitive)
    pub fn is_protected_by(&self, tag: &ProtectionTag) -> bool {
        self.tags.iter().any(|(k, v)| {
            k.eq_ignore_ascii_case(&tag.key) && v.trim().eq_ignore_ascii_case(&tag.value)
        })
    }
}

/// Lock severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockLevel {
    CanNotDelete,
    ReadOnly,
}

/// A management lock held on a scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLock {
    /// Lock ID (`{scope}/providers/Microsoft.Authorization/locks/{name}`)
    pub id: String,
    pub name: String,
    pub level: LockLevel,
    /// Scope the lock is held on
    pub scope: String,
    pub notes: Option<String>,
}

impl ResourceLock {
    pub fn new(scope: impl Into<String>, name: impl Into<String>, level: LockLevel) -> Self {
        let scope = scope.into();
        let name = name.into();
        Self {
            id: format!("{}/providers/Microsoft.Authorization/locks/{}", scope, name),
            name,
            level,
            scope,
            notes: None,
        }
    }

    /// View the lock as a resource so it can flow through a removal stage
    pub fn to_descriptor(&self, group: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(self.id.clone(), ResourceKind::Lock, group).with_properties(
            serde_json::json!({
                "level": self.level,
                "scope": self.scope,
                "notes": self.notes,
            }),
        )
    }
}

/// Backup workload types a recovery-services vault can protect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadType {
    AzureVm,
    Mssql,
    SapHana,
    AzureFiles,
    Mars,
    Mabs,
    Dpm,
}

impl WorkloadType {
    pub const ALL: [WorkloadType; 7] = [
        WorkloadType::AzureVm,
        WorkloadType::Mssql,
        WorkloadType::SapHana,
        WorkloadType::AzureFiles,
        WorkloadType::Mars,
        WorkloadType::Mabs,
        WorkloadType::Dpm,
    ];

    /// Backup management type as the platform names it
    pub fn backup_management_type(self) -> &'static str {
        match self {
            WorkloadType::AzureVm => "AzureIaasVM",
            WorkloadType::Mssql | WorkloadType::SapHana => "AzureWorkload",
            WorkloadType::AzureFiles => "AzureStorage",
            WorkloadType::Mars => "MAB",
            WorkloadType::Mabs => "AzureBackupServer",
            WorkloadType::Dpm => "DPM",
        }
    }

    /// Workload type as the platform names it
    pub fn workload_name(self) -> &'static str {
        match self {
            WorkloadType::AzureVm => "VM",
            WorkloadType::Mssql => "MSSQL",
            WorkloadType::SapHana => "SAPHANA",
            WorkloadType::AzureFiles => "AzureFileShare",
            WorkloadType::Mars => "FileFolder",
            WorkloadType::Mabs | WorkloadType::Dpm => "AzureSqlDb",
        }
    }
}

impl std::fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkloadType::AzureVm => "AzureVM",
            WorkloadType::Mssql => "MSSQL",
            WorkloadType::SapHana => "SAPHana",
            WorkloadType::AzureFiles => "AzureFiles",
            WorkloadType::Mars => "MARS",
            WorkloadType::Mabs => "MABS",
            WorkloadType::Dpm => "DPM",
        };
        write!(f, "{}", name)
    }
}

/// Child collections a parent resource exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildRelation {
    /// Protected items of one workload type in a recovery-services vault
    BackupItems(WorkloadType),
    /// Registered containers / management servers of one workload type
    BackupContainers(WorkloadType),
    ReplicationProtectedItems,
    ReplicationContainerMappings,
    ReplicationNetworkMappings,
    ReplicationFabrics,
    PrivateEndpointConnections,
    /// Volumes of a NetApp capacity pool
    NetAppPoolVolumes,
    /// Backups referencing a NetApp volume
    NetAppVolumeBackups,
    /// Backups stored in a NetApp backup vault
    NetAppVaultBackups,
}

impl std::fmt::Display for ChildRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChildRelation::BackupItems(w) => write!(f, "backup-items({})", w),
            ChildRelation::BackupContainers(w) => write!(f, "backup-containers({})", w),
            ChildRelation::ReplicationProtectedItems => write!(f, "replication-protected-items"),
            ChildRelation::ReplicationContainerMappings => {
                write!(f, "replication-container-mappings")
            }
            ChildRelation::ReplicationNetworkMappings => write!(f, "replication-network-mappings"),
            ChildRelation::ReplicationFabrics => write!(f, "replication-fabrics"),
            ChildRelation::PrivateEndpointConnections => write!(f, "private-endpoint-connections"),
            ChildRelation::NetAppPoolVolumes => write!(f, "netapp-pool-volumes"),
            ChildRelation::NetAppVolumeBackups => write!(f, "netapp-volume-backups"),
            ChildRelation::NetAppVaultBackups => write!(f, "netapp-vault-backups"),
        }
    }
}

/// In-place modifications issued against an owning resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ResourcePatch {
    /// Clear the NSG reference of a subnet (target: the parent VNet)
    ClearSubnetNsg { subnet: String },
    /// Clear the NSG reference of a NIC (target: the NIC)
    ClearNicNsg,
    /// Clear all delegations of a subnet (target: the parent VNet)
    ClearSubnetDelegations { subnet: String },
    /// Remove a subnet definition from the VNet (target: the parent VNet)
    RemoveSubnet { subnet: String },
    /// Detach a NIC from the VM network profile (target: the VM)
    DetachNic { nic_id: String },
}

impl std::fmt::Display for ResourcePatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourcePatch::ClearSubnetNsg { subnet } => write!(f, "clear nsg of subnet {}", subnet),
            ResourcePatch::ClearNicNsg => write!(f, "clear nic nsg"),
            ResourcePatch::ClearSubnetDelegations { subnet } => {
                write!(f, "clear delegations of subnet {}", subnet)
            }
            ResourcePatch::RemoveSubnet { subnet } => write!(f, "remove subnet {}", subnet),
            ResourcePatch::DetachNic { nic_id } => write!(f, "detach nic {}", nic_id),
        }
    }
}

/// Control-plane actions that are neither update nor delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    /// Turn off vault soft delete (target: vault)
    DisableSoftDelete,
    /// Restore a soft-deleted backup item to stopped protection (target: backup item)
    UndoSoftDelete,
    /// Turn off enhanced security features (target: vault)
    DisableSecurityFeatures,
    /// Stop protection of a backup item (target: backup item)
    DisableProtection { delete_backup_data: bool },
    /// Unregister a backup container or management server (target: container)
    UnregisterContainer,
}

impl std::fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceAction::DisableSoftDelete => write!(f, "disable-soft-delete"),
            ResourceAction::UndoSoftDelete => write!(f, "undo-soft-delete"),
            ResourceAction::DisableSecurityFeatures => write!(f, "disable-security-features"),
            ResourceAction::DisableProtection { .. } => write!(f, "disable-protection"),
            ResourceAction::UnregisterContainer => write!(f, "unregister-container"),
        }
    }
}

/// Options for a single resource delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOptions {
    pub force: bool,
    pub no_wait: bool,
}

/// Options for the final resource group delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDeleteOptions {
    /// Resource types the platform may force-delete (e.g. virtual machines)
    pub force_deletion_types: Vec<String>,
}

impl GroupDeleteOptions {
    pub fn forced(types: Vec<String>) -> Self {
        Self {
            force_deletion_types: types,
        }
    }

    pub fn is_forced(&self) -> bool {
        !self.force_deletion_types.is_empty()
    }
}
