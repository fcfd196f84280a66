//! `CloudResourceClient` implementation on top of the az CLI

use crate::az::AzCli;
use async_trait::async_trait;
use rgsweep_cloud::resource_id::management_url;
use rgsweep_cloud::{
    ChildRelation, CloudError, CloudResourceClient, DeleteOptions, GroupDeleteOptions, LockLevel,
    ResourceAction, ResourceDescriptor, ResourceGroupHandle, ResourceId, ResourceKind,
    ResourceLock, ResourcePatch, Result, WorkloadType,
};
use serde_json::{Map, Value};
use tracing::debug;

/// API version for site-recovery collections listed through `az rest`
const RECOVERY_API_VERSION: &str = "2024-04-01";

const LOCK_MARKER: &str = "/providers/microsoft.authorization/locks/";

/// Azure client driving the az CLI
///
/// Nested kinds (subnets, NetApp pools/volumes/backups, backup items and
/// containers) are expanded from their parents, since `az resource list`
/// only returns top-level resources.
pub struct AzureCliClient {
    az: AzCli,
}

impl AzureCliClient {
    pub fn new(subscription: Option<String>) -> Self {
        Self::with_cli(AzCli::new(subscription))
    }

    pub fn with_cli(az: AzCli) -> Self {
        Self { az }
    }

    pub fn cli(&self) -> &AzCli {
        &self.az
    }

    /// Check that az is installed and logged in; returns the account name
    pub async fn check_auth(&self) -> Result<String> {
        Ok(self.az.check_auth().await?)
    }

    async fn descriptors(&self, args: &[&str]) -> Result<Vec<ResourceDescriptor>> {
        let items = self.az.list(args).await?;
        Ok(items.iter().filter_map(descriptor).collect())
    }

    async fn subnets(&self, group: &str, vnet: &str) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "network", "vnet", "subnet", "list", "--resource-group", group, "--vnet-name", vnet,
        ])
        .await
    }

    async fn pools(&self, group: &str, account: &str) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "netappfiles", "pool", "list", "--resource-group", group, "--account-name", account,
        ])
        .await
    }

    async fn volumes(
        &self,
        group: &str,
        account: &str,
        pool: &str,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "netappfiles",
            "volume",
            "list",
            "--resource-group",
            group,
            "--account-name",
            account,
            "--pool-name",
            pool,
        ])
        .await
    }

    async fn backup_policies(&self, group: &str, account: &str) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "netappfiles",
            "account",
            "backup-policy",
            "list",
            "--resource-group",
            group,
            "--account-name",
            account,
        ])
        .await
    }

    async fn backup_vaults(&self, group: &str, account: &str) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "netappfiles",
            "account",
            "backup-vault",
            "list",
            "--resource-group",
            group,
            "--account-name",
            account,
        ])
        .await
    }

    async fn vault_backups(
        &self,
        group: &str,
        account: &str,
        backup_vault: &str,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "netappfiles",
            "account",
            "backup-vault",
            "backup",
            "list",
            "--resource-group",
            group,
            "--account-name",
            account,
            "--backup-vault-name",
            backup_vault,
        ])
        .await
    }

    async fn backup_items(
        &self,
        group: &str,
        vault: &str,
        workload: WorkloadType,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "backup",
            "item",
            "list",
            "--resource-group",
            group,
            "--vault-name",
            vault,
            "--backup-management-type",
            workload.backup_management_type(),
            "--workload-type",
            workload.workload_name(),
        ])
        .await
    }

    async fn backup_containers(
        &self,
        group: &str,
        vault: &str,
        workload: WorkloadType,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "backup",
            "container",
            "list",
            "--resource-group",
            group,
            "--vault-name",
            vault,
            "--backup-management-type",
            workload.backup_management_type(),
        ])
        .await
    }

    /// Site-recovery collection of a vault, read through the REST API
    async fn recovery_collection(
        &self,
        vault_id: &str,
        segment: &str,
    ) -> Result<Vec<ResourceDescriptor>> {
        let url = management_url(&format!("{}/{}", vault_id, segment), RECOVERY_API_VERSION);
        self.descriptors(&["rest", "--method", "get", "--url", &url]).await
    }

    async fn group_locks(&self, group: &str) -> Result<Vec<ResourceLock>> {
        let items = self
            .az
            .list(&["lock", "list", "--resource-group", group])
            .await?;
        Ok(items.iter().filter_map(lock_from).collect())
    }

    async fn show_backup_resource(&self, id: &str, what: &str) -> Result<ResourceDescriptor> {
        let value = self.az.json(&["backup", what, "show", "--ids", id]).await?;
        descriptor(&value).ok_or_else(|| CloudError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl CloudResourceClient for AzureCliClient {
    fn name(&self) -> &str {
        "azure-cli"
    }

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroupHandle>> {
        let groups = self.az.list(&["group", "list"]).await?;
        Ok(groups.iter().filter_map(group_handle).collect())
    }

    async fn list_resources(
        &self,
        group: &str,
        kinds: Option<&[ResourceKind]>,
    ) -> Result<Vec<ResourceDescriptor>> {
        let wanted = |kind: ResourceKind| kinds.is_none_or(|ks| ks.contains(&kind));
        let top = self
            .descriptors(&["resource", "list", "--resource-group", group])
            .await?;
        let of_kind = |kind: ResourceKind| top.iter().filter(move |r| r.kind == kind);

        let mut found: Vec<ResourceDescriptor> = top
            .iter()
            .filter(|r| {
                !r.kind.is_nested() && r.kind != ResourceKind::NetworkProfile && wanted(r.kind)
            })
            .cloned()
            .collect();

        // `az resource list` carries no properties; profiles are matched on them
        if wanted(ResourceKind::NetworkProfile) {
            found.extend(
                self.descriptors(&["network", "profile", "list", "--resource-group", group])
                    .await?,
            );
        }

        if wanted(ResourceKind::Subnet) {
            for vnet in of_kind(ResourceKind::VirtualNetwork) {
                found.extend(self.subnets(group, &vnet.name).await?);
            }
        }

        for account in of_kind(ResourceKind::NetAppAccount) {
            let account = account.name.as_str();
            if wanted(ResourceKind::NetAppPool) || wanted(ResourceKind::NetAppVolume) {
                let pools = self.pools(group, account).await?;
                if wanted(ResourceKind::NetAppVolume) {
                    for pool in &pools {
                        found.extend(self.volumes(group, account, &pool.name).await?);
                    }
                }
                if wanted(ResourceKind::NetAppPool) {
                    found.extend(pools);
                }
            }
            if wanted(ResourceKind::NetAppBackupPolicy) {
                found.extend(self.backup_policies(group, account).await?);
            }
            if wanted(ResourceKind::NetAppBackupVault) || wanted(ResourceKind::NetAppBackup) {
                let backup_vaults = self.backup_vaults(group, account).await?;
                if wanted(ResourceKind::NetAppBackup) {
                    for backup_vault in &backup_vaults {
                        found.extend(self.vault_backups(group, account, &backup_vault.name).await?);
                    }
                }
                if wanted(ResourceKind::NetAppBackupVault) {
                    found.extend(backup_vaults);
                }
            }
        }

        for vault in of_kind(ResourceKind::RecoveryVault) {
            for workload in WorkloadType::ALL {
                if wanted(ResourceKind::BackupItem) {
                    found.extend(self.backup_items(group, &vault.name, workload).await?);
                }
                if wanted(ResourceKind::BackupContainer) {
                    found.extend(self.backup_containers(group, &vault.name, workload).await?);
                }
            }
        }

        if wanted(ResourceKind::Lock) {
            found.extend(
                self.group_locks(group)
                    .await?
                    .iter()
                    .map(|lock| lock.to_descriptor(group)),
            );
        }

        // Workloads sharing a management type list the same containers
        found.sort_by(|a, b| a.id.to_ascii_lowercase().cmp(&b.id.to_ascii_lowercase()));
        found.dedup_by(|a, b| a.id.eq_ignore_ascii_case(&b.id));
        debug!(group, resources = found.len(), "resources listed");
        Ok(found)
    }

    async fn get_resource(&self, id: &str) -> Result<ResourceDescriptor> {
        match kind_of(id) {
            ResourceKind::BackupItem => self.show_backup_resource(id, "item").await,
            ResourceKind::BackupContainer => self.show_backup_resource(id, "container").await,
            _ => {
                let value = self.az.json(&["resource", "show", "--ids", id]).await?;
                descriptor(&value).ok_or_else(|| CloudError::NotFound(id.to_string()))
            }
        }
    }

    async fn list_children(
        &self,
        parent_id: &str,
        relation: ChildRelation,
    ) -> Result<Vec<ResourceDescriptor>> {
        let parent = ResourceId::parse(parent_id)?;
        let group = parent.resource_group.as_str();

        match relation {
            ChildRelation::BackupItems(workload) => {
                self.backup_items(group, parent.name(), workload).await
            }
            ChildRelation::BackupContainers(workload) => {
                self.backup_containers(group, parent.name(), workload).await
            }
            ChildRelation::ReplicationProtectedItems => {
                self.recovery_collection(parent_id, "replicationProtectedItems")
                    .await
            }
            ChildRelation::ReplicationContainerMappings => {
                self.recovery_collection(parent_id, "replicationProtectionContainerMappings")
                    .await
            }
            ChildRelation::ReplicationNetworkMappings => {
                self.recovery_collection(parent_id, "replicationNetworkMappings")
                    .await
            }
            ChildRelation::ReplicationFabrics => {
                self.recovery_collection(parent_id, "replicationFabrics").await
            }
            ChildRelation::PrivateEndpointConnections => {
                self.descriptors(&[
                    "network",
                    "private-endpoint-connection",
                    "list",
                    "--id",
                    parent_id,
                ])
                .await
            }
            ChildRelation::NetAppPoolVolumes => {
                let account = segment(&parent, parent_id, 0)?;
                self.volumes(group, account, parent.name()).await
            }
            ChildRelation::NetAppVaultBackups => {
                let account = segment(&parent, parent_id, 0)?;
                self.vault_backups(group, account, parent.name()).await
            }
            ChildRelation::NetAppVolumeBackups => {
                let account = segment(&parent, parent_id, 0)?;
                let mut backups = Vec::new();
                for backup_vault in self.backup_vaults(group, account).await? {
                    let held = self.vault_backups(group, account, &backup_vault.name).await?;
                    backups.extend(held.into_iter().filter(|b| {
                        b.property_str("/volumeResourceId")
                            .is_some_and(|v| v.eq_ignore_ascii_case(parent_id))
                    }));
                }
                Ok(backups)
            }
        }
    }

    async fn list_dcr_associations(
        &self,
        rule_group: &str,
        rule_name: &str,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.descriptors(&[
            "monitor",
            "data-collection",
            "rule",
            "association",
            "list",
            "--resource-group",
            rule_group,
            "--rule-name",
            rule_name,
        ])
        .await
    }

    async fn delete_dcr_association(&self, name: &str, target_id: &str) -> Result<()> {
        Ok(self
            .az
            .exec(&[
                "monitor",
                "data-collection",
                "rule",
                "association",
                "delete",
                "--name",
                name,
                "--resource",
                target_id,
                "--yes",
            ])
            .await?)
    }

    async fn delete_resource(&self, id: &str, options: DeleteOptions) -> Result<()> {
        let mut args = if kind_of(id) == ResourceKind::VirtualMachine {
            let mut args = vec!["vm", "delete", "--ids", id, "--yes"];
            if options.force {
                args.extend(["--force-deletion", "true"]);
            }
            args
        } else {
            vec!["resource", "delete", "--ids", id]
        };
        if options.no_wait {
            args.push("--no-wait");
        }
        Ok(self.az.exec(&args).await?)
    }

    async fn delete_by_url(&self, url: &str) -> Result<()> {
        Ok(self
            .az
            .exec(&["rest", "--method", "delete", "--url", url])
            .await?)
    }

    async fn update_resource(&self, id: &str, patch: &ResourcePatch) -> Result<()> {
        let target = ResourceId::parse(id)?;
        let group = target.resource_group.as_str();
        let owner = target.name();

        let args: Vec<&str> = match patch {
            ResourcePatch::ClearSubnetNsg { subnet } => vec![
                "network",
                "vnet",
                "subnet",
                "update",
                "--resource-group",
                group,
                "--vnet-name",
                owner,
                "--name",
                subnet.as_str(),
                "--remove",
                "networkSecurityGroup",
            ],
            ResourcePatch::ClearNicNsg => vec![
                "network",
                "nic",
                "update",
                "--ids",
                id,
                "--remove",
                "networkSecurityGroup",
            ],
            ResourcePatch::ClearSubnetDelegations { subnet } => vec![
                "network",
                "vnet",
                "subnet",
                "update",
                "--resource-group",
                group,
                "--vnet-name",
                owner,
                "--name",
                subnet.as_str(),
                "--remove",
                "delegations",
            ],
            ResourcePatch::RemoveSubnet { subnet } => vec![
                "network",
                "vnet",
                "subnet",
                "delete",
                "--resource-group",
                group,
                "--vnet-name",
                owner,
                "--name",
                subnet.as_str(),
            ],
            ResourcePatch::DetachNic { nic_id } => vec![
                "vm",
                "nic",
                "remove",
                "--resource-group",
                group,
                "--vm-name",
                owner,
                "--nics",
                nic_id.as_str(),
            ],
        };
        Ok(self.az.exec(&args).await?)
    }

    async fn invoke_action(&self, id: &str, action: ResourceAction) -> Result<()> {
        let target = ResourceId::parse(id)?;
        let group = target.resource_group.as_str();
        let vault = segment(&target, id, 0)?;

        match action {
            ResourceAction::DisableSoftDelete => {
                self.az
                    .exec(&[
                        "backup",
                        "vault",
                        "backup-properties",
                        "set",
                        "--resource-group",
                        group,
                        "--name",
                        vault,
                        "--soft-delete-feature-state",
                        "Disable",
                    ])
                    .await?
            }
            ResourceAction::DisableSecurityFeatures => {
                self.az
                    .exec(&[
                        "backup",
                        "vault",
                        "backup-properties",
                        "set",
                        "--resource-group",
                        group,
                        "--name",
                        vault,
                        "--hybrid-backup-security-features",
                        "Disable",
                    ])
                    .await?
            }
            ResourceAction::UndoSoftDelete => {
                let item = self.show_backup_resource(id, "item").await?;
                let container = named_segment(&target, "protectionContainers")
                    .ok_or_else(|| CloudError::InvalidResourceId(id.to_string()))?;
                let management = item.property_str("/backupManagementType").unwrap_or_default();
                let workload = item.property_str("/workloadType").unwrap_or_default();
                self.az
                    .exec(&[
                        "backup",
                        "protection",
                        "undelete",
                        "--resource-group",
                        group,
                        "--vault-name",
                        vault,
                        "--container-name",
                        container,
                        "--item-name",
                        target.name(),
                        "--backup-management-type",
                        management,
                        "--workload-type",
                        workload,
                    ])
                    .await?
            }
            ResourceAction::DisableProtection { delete_backup_data } => {
                let delete_data = if delete_backup_data { "true" } else { "false" };
                self.az
                    .exec(&[
                        "backup",
                        "protection",
                        "disable",
                        "--ids",
                        id,
                        "--delete-backup-data",
                        delete_data,
                        "--yes",
                    ])
                    .await?
            }
            ResourceAction::UnregisterContainer => {
                let container = self.show_backup_resource(id, "container").await?;
                let management = container
                    .property_str("/backupManagementType")
                    .unwrap_or_default();
                self.az
                    .exec(&[
                        "backup",
                        "container",
                        "unregister",
                        "--resource-group",
                        group,
                        "--vault-name",
                        vault,
                        "--container-name",
                        target.name(),
                        "--backup-management-type",
                        management,
                        "--yes",
                    ])
                    .await?
            }
        }
        Ok(())
    }

    async fn delete_resource_group(
        &self,
        name: &str,
        options: &GroupDeleteOptions,
    ) -> Result<()> {
        let mut args = vec!["group", "delete", "--name", name, "--yes"];
        if options.is_forced() {
            args.push("--force-deletion-types");
            args.extend(options.force_deletion_types.iter().map(String::as_str));
        }
        Ok(self.az.exec(&args).await?)
    }

    async fn list_locks(&self, scope: &str) -> Result<Vec<ResourceLock>> {
        let parsed = ResourceId::parse(scope)?;
        let locks = self.group_locks(&parsed.resource_group).await?;
        Ok(locks
            .into_iter()
            .filter(|lock| is_within(&lock.scope, scope))
            .collect())
    }

    async fn delete_lock(&self, lock_id: &str) -> Result<()> {
        Ok(self.az.exec(&["lock", "delete", "--ids", lock_id]).await?)
    }
}

fn kind_of(id: &str) -> ResourceKind {
    ResourceId::parse(id)
        .ok()
        .and_then(|parsed| parsed.resource_type())
        .map(|t| ResourceKind::from_type(&t))
        .unwrap_or(ResourceKind::Generic)
}

fn segment<'a>(parsed: &'a ResourceId, id: &str, index: usize) -> Result<&'a str> {
    parsed
        .segments
        .get(index)
        .map(|(_, name)| name.as_str())
        .ok_or_else(|| CloudError::InvalidResourceId(id.to_string()))
}

fn named_segment<'a>(parsed: &'a ResourceId, segment_type: &str) -> Option<&'a str> {
    parsed
        .segments
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(segment_type))
        .map(|(_, name)| name.as_str())
}

/// `scope` itself or anything beneath it (case-insensitive)
fn is_within(candidate: &str, scope: &str) -> bool {
    let candidate = candidate.to_ascii_lowercase();
    let scope = scope.trim_end_matches('/').to_ascii_lowercase();
    candidate == scope || candidate.starts_with(&format!("{}/", scope))
}

/// Build a descriptor from az JSON
///
/// Fields under `properties` are lifted to the top level so property
/// pointers read the same whether az returned a flattened or an ARM-shaped
/// document.
pub(crate) fn descriptor(value: &Value) -> Option<ResourceDescriptor> {
    let object = value.as_object()?;
    let id = object.get("id")?.as_str()?;
    let parsed = ResourceId::parse(id).ok();

    let resource_type = object
        .get("type")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .or_else(|| parsed.as_ref().and_then(|p| p.resource_type()))
        .unwrap_or_default();
    let group = parsed
        .map(|p| p.resource_group)
        .or_else(|| {
            object
                .get("resourceGroup")
                .and_then(|g| g.as_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    Some(
        ResourceDescriptor::new(id, ResourceKind::from_type(&resource_type), group)
            .with_resource_type(resource_type)
            .with_properties(flatten(object)),
    )
}

fn flatten(object: &Map<String, Value>) -> Value {
    let mut flat: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| key.as_str() != "properties")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if let Some(Value::Object(properties)) = object.get("properties") {
        for (key, value) in properties {
            flat.insert(key.clone(), value.clone());
        }
    }
    Value::Object(flat)
}

fn group_handle(value: &Value) -> Option<ResourceGroupHandle> {
    let name = value.get("name")?.as_str()?;
    let id = value.get("id")?.as_str()?;
    let mut handle = ResourceGroupHandle::new(name, id);
    if let Some(tags) = value.get("tags").and_then(|t| t.as_object()) {
        for (key, tag) in tags {
            if let Some(tag) = tag.as_str() {
                handle = handle.with_tag(key.as_str(), tag);
            }
        }
    }
    Some(handle)
}

fn lock_from(value: &Value) -> Option<ResourceLock> {
    let id = value.get("id")?.as_str()?;
    let name = value.get("name")?.as_str()?;
    let at = id.to_ascii_lowercase().rfind(LOCK_MARKER)?;
    let level = match value.get("level").and_then(|l| l.as_str()) {
        Some(level) if level.eq_ignore_ascii_case("ReadOnly") => LockLevel::ReadOnly,
        _ => LockLevel::CanNotDelete,
    };

    let mut lock = ResourceLock::new(&id[..at], name, level);
    lock.id = id.to_string();
    lock.notes = value
        .get("notes")
        .and_then(|n| n.as_str())
        .map(str::to_string);
    Some(lock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VNET: &str =
        "/subscriptions/s1/resourceGroups/rg-net/providers/Microsoft.Network/virtualNetworks/vnet1";

    #[test]
    fn test_descriptor_lifts_properties() {
        let value = json!({
            "id": format!("{}/subnets/default", VNET),
            "name": "default",
            "type": "Microsoft.Network/virtualNetworks/subnets",
            "properties": {
                "ipConfigurations": [{ "id": "/nic1/ipConfigurations/ipconfig1" }],
                "networkSecurityGroup": { "id": "/nsg1" }
            }
        });
        let resource = descriptor(&value).unwrap();

        assert_eq!(resource.kind, ResourceKind::Subnet);
        assert_eq!(resource.group, "rg-net");
        assert_eq!(resource.name, "default");
        assert_eq!(resource.property_str("/networkSecurityGroup/id"), Some("/nsg1"));
        assert_eq!(resource.property_ids("/ipConfigurations").len(), 1);
    }

    #[test]
    fn test_descriptor_keeps_flattened_documents() {
        // az network コマンドはプロパティを平坦化して返す
        let value = json!({
            "id": VNET,
            "name": "vnet1",
            "type": "Microsoft.Network/virtualNetworks",
            "resourceGroup": "rg-net",
            "subnets": [{ "id": format!("{}/subnets/a", VNET) }]
        });
        let resource = descriptor(&value).unwrap();

        assert_eq!(resource.kind, ResourceKind::VirtualNetwork);
        assert_eq!(resource.property_ids("/subnets").len(), 1);
    }

    #[test]
    fn test_descriptor_type_falls_back_to_id() {
        let value = json!({ "id": format!("{}/subnets/default", VNET) });
        let resource = descriptor(&value).unwrap();
        assert_eq!(resource.kind, ResourceKind::Subnet);

        assert!(descriptor(&json!({ "name": "no-id" })).is_none());
        assert!(descriptor(&Value::Null).is_none());
    }

    #[test]
    fn test_group_handle_reads_tags() {
        let value = json!({
            "id": "/subscriptions/s1/resourceGroups/rg-keep",
            "name": "rg-keep",
            "tags": { "Keep": "TRUE", "owner": null }
        });
        let group = group_handle(&value).unwrap();
        assert!(group.is_protected());
        assert_eq!(group.tags.len(), 1);
    }

    #[test]
    fn test_lock_from_splits_scope() {
        let value = json!({
            "id": format!("{}/subnets/default/providers/Microsoft.Authorization/locks/hold", VNET),
            "name": "hold",
            "level": "ReadOnly",
            "notes": "platform team"
        });
        let lock = lock_from(&value).unwrap();

        assert_eq!(lock.scope, format!("{}/subnets/default", VNET));
        assert_eq!(lock.level, LockLevel::ReadOnly);
        assert_eq!(lock.notes.as_deref(), Some("platform team"));
        assert!(is_within(&lock.scope, VNET));
        assert!(!is_within(&lock.scope, &format!("{}2", VNET)));
    }

    #[test]
    fn test_kind_of_nested_ids() {
        let item = "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.RecoveryServices/vaults/rsv/backupFabrics/Azure/protectionContainers/iaasvmcontainer;vm1/protectedItems/vm;vm1";
        assert_eq!(kind_of(item), ResourceKind::BackupItem);

        let parsed = ResourceId::parse(item).unwrap();
        assert_eq!(
            named_segment(&parsed, "protectionContainers"),
            Some("iaasvmcontainer;vm1")
        );
        assert_eq!(segment(&parsed, item, 0).unwrap(), "rsv");
        assert_eq!(kind_of(VNET), ResourceKind::VirtualNetwork);
    }
}
