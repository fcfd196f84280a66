//! In-memory simulated cloud
//!
//! [`MemoryCloud`] implements [`CloudResourceClient`] over a small model of
//! the platform's deletion-blocking rules:
//!
//! - a lock on a scope (or any ancestor scope) blocks deletes beneath it
//! - a resource with live child resources (`{id}/...`) cannot be deleted
//! - a resource referenced by another resource (NSG, subnet, rule, volume,
//!   endpoint references) cannot be deleted
//! - a NIC attached to a VM or managed by a private endpoint cannot be deleted
//! - a subnet with delegations cannot be removed
//! - stopping protection while vault soft delete is enabled leaves the item
//!   soft-deleted instead of removing it
//!
//! Every call is recorded, and failures can be scripted per operation and
//! target so retry and fallback paths can be exercised deterministically.

use crate::client::CloudResourceClient;
use crate::error::{CloudError, Result};
use crate::model::{
    ChildRelation, DeleteOptions, GroupDeleteOptions, LockLevel, ResourceAction,
    ResourceDescriptor, ResourceGroupHandle, ResourceKind, ResourceLock, ResourcePatch,
};
use crate::resource_id::{ResourceId, group_scope};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Subscription used for every ID the simulation builds
pub const MEMORY_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const DCR_ASSOCIATION_TYPE: &str = "Microsoft.Insights/dataCollectionRuleAssociations";

/// Pointers whose value is the ID of a resource the holder depends on
const REFERENCE_POINTERS: &[&str] = &[
    "/networkSecurityGroup/id",
    "/subnet/id",
    "/volumeResourceId",
    "/dataCollectionRuleId",
    "/dataCollectionEndpointId",
];

/// Operations of the client, for call recording and failure scripting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListGroups,
    ListResources,
    GetResource,
    ListChildren,
    ListDcrAssociations,
    DeleteDcrAssociation,
    DeleteResource,
    DeleteByUrl,
    UpdateResource,
    InvokeAction,
    DeleteResourceGroup,
    ListLocks,
    DeleteLock,
}

impl Operation {
    pub fn is_mutating(self) -> bool {
        matches!(
            self,
            Operation::DeleteDcrAssociation
                | Operation::DeleteResource
                | Operation::DeleteByUrl
                | Operation::UpdateResource
                | Operation::InvokeAction
                | Operation::DeleteResourceGroup
                | Operation::DeleteLock
        )
    }
}

/// Failure to inject into a scripted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Conflict,
    Throttled,
    Timeout,
    ShapeMismatch,
    PermissionDenied,
    Api,
    /// Never completes
    Hang,
    /// Reports success without changing anything
    Ignore,
}

/// A recorded client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub op: Operation,
    pub target: String,
    /// Patch or action applied, or the kinds a listing asked for
    pub detail: Option<String>,
}

#[derive(Debug)]
struct ScriptedFailure {
    op: Operation,
    target: Option<String>,
    /// Matched against the call's detail, when set
    detail: Option<String>,
    kind: FailureKind,
    remaining: Option<u32>,
}

#[derive(Default)]
struct State {
    groups: BTreeMap<String, ResourceGroupHandle>,
    resources: BTreeMap<String, ResourceDescriptor>,
    locks: Vec<ResourceLock>,
    failures: Vec<ScriptedFailure>,
    calls: Vec<CallRecord>,
}

/// Simulated control plane
#[derive(Default)]
pub struct MemoryCloud {
    state: Mutex<State>,
}

/// Call detail recorded for a resource listing (`nic,subnet` or `all`)
fn listing_detail(kinds: Option<&[ResourceKind]>) -> String {
    match kinds {
        Some(kinds) => kinds
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(","),
        None => "all".to_string(),
    }
}

fn same(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn is_beneath(id: &str, scope: &str) -> bool {
    id.len() > scope.len()
        && id.as_bytes()[scope.len()] == b'/'
        && same(&id[..scope.len()], scope)
}

fn relation_segment(relation: ChildRelation) -> &'static str {
    match relation {
        ChildRelation::BackupItems(_) => "backupProtectedItems",
        ChildRelation::BackupContainers(_) => "backupContainers",
        ChildRelation::ReplicationProtectedItems => "replicationProtectedItems",
        ChildRelation::ReplicationContainerMappings => "replicationProtectionContainerMappings",
        ChildRelation::ReplicationNetworkMappings => "replicationNetworkMappings",
        ChildRelation::ReplicationFabrics => "replicationFabrics",
        ChildRelation::PrivateEndpointConnections => "privateEndpointConnections",
        ChildRelation::NetAppPoolVolumes => "volumes",
        ChildRelation::NetAppVolumeBackups | ChildRelation::NetAppVaultBackups => "backups",
    }
}

fn relation_kind(relation: ChildRelation) -> ResourceKind {
    match relation {
        ChildRelation::BackupItems(_) => ResourceKind::BackupItem,
        ChildRelation::BackupContainers(_) => ResourceKind::BackupContainer,
        ChildRelation::NetAppPoolVolumes => ResourceKind::NetAppVolume,
        ChildRelation::NetAppVolumeBackups | ChildRelation::NetAppVaultBackups => {
            ResourceKind::NetAppBackup
        }
        _ => ResourceKind::Generic,
    }
}

fn relation_workload(relation: ChildRelation) -> Option<String> {
    match relation {
        ChildRelation::BackupItems(w) | ChildRelation::BackupContainers(w) => Some(w.to_string()),
        _ => None,
    }
}

fn set_property(resource: &mut ResourceDescriptor, key: &str, value: Value) {
    if !resource.properties.is_object() {
        resource.properties = Value::Object(Default::default());
    }
    if let Some(map) = resource.properties.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}

fn merge_properties(base: Value, extra: Value) -> Value {
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    if let Value::Object(extra) = extra {
        merged.extend(extra);
    }
    Value::Object(merged)
}

impl State {
    fn find_key(&self, id: &str) -> Option<String> {
        self.resources.keys().find(|k| same(k, id)).cloned()
    }

    fn get(&self, id: &str) -> Option<&ResourceDescriptor> {
        self.resources
            .iter()
            .find(|(k, _)| same(k, id))
            .map(|(_, r)| r)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ResourceDescriptor> {
        self.resources
            .iter_mut()
            .find(|(k, _)| same(k, id))
            .map(|(_, r)| r)
    }

    fn exists(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Resource with derived back-reference properties filled in
    fn snapshot(&self, resource: &ResourceDescriptor) -> ResourceDescriptor {
        let mut snapshot = resource.clone();
        let id = resource.id.as_str();
        let refs = |kind: ResourceKind, pointer: &str| -> Vec<Value> {
            self.resources
                .values()
                .filter(|r| r.kind == kind)
                .filter(|r| r.property_str(pointer).is_some_and(|v| same(v, id)))
                .map(|r| json!({ "id": r.id }))
                .collect()
        };

        match resource.kind {
            ResourceKind::VirtualNetwork => {
                let subnets: Vec<Value> = self
                    .resources
                    .values()
                    .filter(|r| r.kind == ResourceKind::Subnet && is_beneath(&r.id, id))
                    .map(|r| json!({ "id": r.id }))
                    .collect();
                set_property(&mut snapshot, "subnets", Value::Array(subnets));
            }
            ResourceKind::NetworkSecurityGroup => {
                let subnets = refs(ResourceKind::Subnet, "/networkSecurityGroup/id");
                let nics = refs(ResourceKind::NetworkInterface, "/networkSecurityGroup/id");
                set_property(&mut snapshot, "subnets", Value::Array(subnets));
                set_property(&mut snapshot, "networkInterfaces", Value::Array(nics));
            }
            ResourceKind::Subnet => {
                let ip_configs: Vec<Value> = self
                    .resources
                    .values()
                    .filter(|r| r.kind == ResourceKind::NetworkInterface)
                    .filter(|r| r.property_str("/subnet/id").is_some_and(|v| same(v, id)))
                    .map(|r| json!({ "id": format!("{}/ipConfigurations/ipconfig1", r.id) }))
                    .collect();
                set_property(&mut snapshot, "ipConfigurations", Value::Array(ip_configs));
            }
            _ => {}
        }
        snapshot
    }

    /// Why a delete of `id` would be rejected, if it would
    fn delete_blocker(&self, id: &str) -> Option<String> {
        if let Some(lock) = self
            .locks
            .iter()
            .find(|l| same(&l.scope, id) || is_beneath(id, &l.scope))
        {
            return Some(format!(
                "ScopeLocked: the scope '{}' cannot perform delete operation because following scope(s) are locked: '{}' (lock '{}')",
                id, lock.scope, lock.name
            ));
        }

        if let Some(child) = self
            .resources
            .values()
            .find(|r| {
                r.kind != ResourceKind::DataCollectionRuleAssociation && is_beneath(&r.id, id)
            })
        {
            return Some(format!(
                "ResourceInUse: '{}' still contains child resource '{}'",
                id, child.id
            ));
        }

        if let Some(holder) = self.resources.values().find(|r| {
            !same(&r.id, id)
                && REFERENCE_POINTERS
                    .iter()
                    .any(|p| r.property_str(p).is_some_and(|v| same(v, id)))
        }) {
            return Some(format!(
                "InUse: '{}' is referenced by '{}'",
                id, holder.id
            ));
        }

        let resource = self.get(id)?;
        if let Some(vm) = resource
            .property_str("/virtualMachine/id")
            .filter(|vm| self.exists(vm))
        {
            return Some(format!("NicInUse: '{}' is attached to VM '{}'", id, vm));
        }
        if let Some(pe) = resource
            .property_str("/privateEndpoint/id")
            .filter(|pe| self.exists(pe))
        {
            return Some(format!(
                "CannotDeleteNicManagedByPrivateEndpoint: '{}' belongs to '{}'",
                id, pe
            ));
        }
        if resource.kind == ResourceKind::Subnet
            && resource
                .properties
                .get("delegations")
                .and_then(|d| d.as_array())
                .is_some_and(|d| !d.is_empty())
        {
            return Some(format!("SubnetHasDelegations: '{}' is delegated", id));
        }
        None
    }

    fn remove(&mut self, id: &str) -> Result<()> {
        let key = self
            .find_key(id)
            .ok_or_else(|| CloudError::NotFound(id.to_string()))?;
        if let Some(reason) = self.delete_blocker(&key) {
            return Err(CloudError::Conflict(reason));
        }
        let removed = self.resources.remove(&key);

        match removed.map(|r| r.kind) {
            Some(ResourceKind::VirtualMachine) => {
                for nic in self.resources.values_mut() {
                    if nic.property_str("/virtualMachine/id").is_some_and(|v| same(v, &key)) {
                        set_property(nic, "virtualMachine", Value::Null);
                    }
                }
            }
            Some(ResourceKind::PrivateEndpoint) => {
                self.resources.retain(|_, r| {
                    !r.property_str("/privateEndpoint/id")
                        .is_some_and(|v| same(v, &key))
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn vault_of(&self, item_id: &str) -> Option<&ResourceDescriptor> {
        self.resources
            .values()
            .find(|r| r.kind == ResourceKind::RecoveryVault && is_beneath(item_id, &r.id))
    }
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// ID of a group in the simulated subscription
    pub fn group_id(name: &str) -> String {
        group_scope(MEMORY_SUBSCRIPTION, name)
    }

    /// Register a resource group
    pub fn add_group(&self, name: &str, tags: &[(&str, &str)]) -> ResourceGroupHandle {
        let mut group = ResourceGroupHandle::new(name, Self::group_id(name));
        for (k, v) in tags {
            group = group.with_tag(*k, *v);
        }
        self.lock().groups.insert(name.to_string(), group.clone());
        group
    }

    /// Register a top-level resource and return its ID
    pub fn add_resource(
        &self,
        group: &str,
        kind: ResourceKind,
        name: &str,
        properties: Value,
    ) -> String {
        let id = format!(
            "{}/providers/{}/{}",
            Self::group_id(group),
            kind.resource_type(),
            name
        );
        self.insert(ResourceDescriptor::new(&id, kind, group).with_properties(properties));
        id
    }

    /// Register a resource of an arbitrary provider type and return its ID
    pub fn add_typed_resource(
        &self,
        group: &str,
        resource_type: &str,
        name: &str,
        properties: Value,
    ) -> String {
        let id = format!("{}/providers/{}/{}", Self::group_id(group), resource_type, name);
        self.insert(
            ResourceDescriptor::new(&id, ResourceKind::from_type(resource_type), group)
                .with_resource_type(resource_type)
                .with_properties(properties),
        );
        id
    }

    /// Register a nested resource (subnet, pool, volume, ...) under its parent
    pub fn add_child(
        &self,
        parent_id: &str,
        kind: ResourceKind,
        name: &str,
        properties: Value,
    ) -> String {
        let id = format!("{}/{}/{}", parent_id, kind.type_segment(), name);
        let group = self.group_of(parent_id);
        self.insert(ResourceDescriptor::new(&id, kind, group).with_properties(properties));
        id
    }

    /// Register a member of a parent's child collection
    pub fn add_related(
        &self,
        parent_id: &str,
        relation: ChildRelation,
        name: &str,
        properties: Value,
    ) -> String {
        let id = format!("{}/{}/{}", parent_id, relation_segment(relation), name);
        let group = self.group_of(parent_id);
        let mut properties = properties;
        if let Some(workload) = relation_workload(relation) {
            properties = merge_properties(json!({ "workloadType": workload }), properties);
        }
        if relation_kind(relation) == ResourceKind::BackupItem
            && properties.get("protectionState").is_none()
        {
            properties = merge_properties(properties, json!({ "protectionState": "Protected" }));
        }
        let kind = relation_kind(relation);
        self.insert(ResourceDescriptor::new(&id, kind, group).with_properties(properties));
        id
    }

    /// Associate a data-collection rule with a target resource
    pub fn add_dcr_association(&self, rule_id: &str, target_id: &str, name: &str) -> String {
        let id = format!("{}/providers/{}/{}", target_id, DCR_ASSOCIATION_TYPE, name);
        let group = self.group_of(target_id);
        self.insert(
            ResourceDescriptor::new(&id, ResourceKind::DataCollectionRuleAssociation, group)
                .with_properties(json!({ "dataCollectionRuleId": rule_id })),
        );
        id
    }

    /// Place a `CanNotDelete` lock on a scope and return the lock ID
    pub fn add_lock(&self, scope: &str, name: &str) -> String {
        let lock = ResourceLock::new(scope, name, LockLevel::CanNotDelete);
        let id = lock.id.clone();
        self.lock().locks.push(lock);
        id
    }

    /// Overwrite a single top-level property of a resource
    pub fn set_property(&self, id: &str, key: &str, value: Value) {
        if let Some(resource) = self.lock().get_mut(id) {
            set_property(resource, key, value);
        }
    }

    /// Fail the next `times` matching calls
    pub fn fail_times(&self, op: Operation, target: Option<&str>, kind: FailureKind, times: u32) {
        self.script(op, target, kind, Some(times));
    }

    /// Fail every matching call
    pub fn fail_always(&self, op: Operation, target: Option<&str>, kind: FailureKind) {
        self.script(op, target, kind, None);
    }

    /// Fail listings of one resource kind in `group` (`None` = every time)
    pub fn fail_listing(
        &self,
        group: &str,
        resource: ResourceKind,
        kind: FailureKind,
        times: Option<u32>,
    ) {
        self.lock().failures.push(ScriptedFailure {
            op: Operation::ListResources,
            target: Some(group.to_string()),
            detail: Some(listing_detail(Some(&[resource]))),
            kind,
            remaining: times,
        });
    }

    fn script(
        &self,
        op: Operation,
        target: Option<&str>,
        kind: FailureKind,
        remaining: Option<u32>,
    ) {
        self.lock().failures.push(ScriptedFailure {
            op,
            target: target.map(str::to_string),
            detail: None,
            kind,
            remaining,
        });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().exists(id)
    }

    pub fn group_exists(&self, name: &str) -> bool {
        self.lock().groups.keys().any(|g| same(g, name))
    }

    pub fn lock_exists(&self, lock_id: &str) -> bool {
        self.lock().locks.iter().any(|l| same(&l.id, lock_id))
    }

    /// Current stored state of a resource (with derived properties)
    pub fn resource(&self, id: &str) -> Option<ResourceDescriptor> {
        let state = self.lock();
        state.get(id).map(|r| state.snapshot(r))
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> Vec<CallRecord> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op.is_mutating())
            .cloned()
            .collect()
    }

    pub fn count_calls(&self, op: Operation) -> usize {
        self.lock().calls.iter().filter(|c| c.op == op).count()
    }

    fn insert(&self, resource: ResourceDescriptor) {
        self.lock().resources.insert(resource.id.clone(), resource);
    }

    fn group_of(&self, id: &str) -> String {
        ResourceId::parse(id)
            .map(|r| r.resource_group)
            .unwrap_or_default()
    }

    /// Record the call and apply any scripted failure
    async fn enter(&self, op: Operation, target: &str) -> Result<bool> {
        self.enter_with(op, target, None).await
    }

    async fn enter_with(
        &self,
        op: Operation,
        target: &str,
        detail: Option<String>,
    ) -> Result<bool> {
        let injected = {
            let mut state = self.lock();
            let hit = state.failures.iter_mut().find(|f| {
                f.op == op
                    && f.remaining != Some(0)
                    && f.target.as_deref().is_none_or(|t| same(t, target))
                    && f.detail.as_deref().is_none_or(|d| detail.as_deref() == Some(d))
            });
            let injected = hit.map(|f| {
                if let Some(n) = f.remaining.as_mut() {
                    *n -= 1;
                }
                f.kind
            });
            state.calls.push(CallRecord {
                op,
                target: target.to_string(),
                detail,
            });
            injected
        };

        if let Some(kind) = injected {
            tracing::debug!(?op, target, ?kind, "injecting scripted failure");
        }
        let message = format!("{:?} {}", op, target);
        match injected {
            None => Ok(true),
            Some(FailureKind::Ignore) => Ok(false),
            Some(FailureKind::Hang) => {
                std::future::pending::<()>().await;
                Ok(false)
            }
            Some(FailureKind::Conflict) => Err(CloudError::Conflict(message)),
            Some(FailureKind::Throttled) => Err(CloudError::Throttled(message)),
            Some(FailureKind::Timeout) => Err(CloudError::Timeout(message)),
            Some(FailureKind::ShapeMismatch) => Err(CloudError::ShapeMismatch(format!(
                "unrecognized arguments: {}",
                message
            ))),
            Some(FailureKind::PermissionDenied) => Err(CloudError::PermissionDenied(message)),
            Some(FailureKind::Api) => Err(CloudError::Api(message)),
        }
    }
}

#[async_trait]
impl CloudResourceClient for MemoryCloud {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroupHandle>> {
        self.enter(Operation::ListGroups, "").await?;
        Ok(self.lock().groups.values().cloned().collect())
    }

    async fn list_resources(
        &self,
        group: &str,
        kinds: Option<&[ResourceKind]>,
    ) -> Result<Vec<ResourceDescriptor>> {
        let detail = Some(listing_detail(kinds));
        self.enter_with(Operation::ListResources, group, detail).await?;
        let state = self.lock();
        if !state.groups.keys().any(|g| same(g, group)) {
            return Err(CloudError::NotFound(format!("resource group '{}'", group)));
        }
        Ok(state
            .resources
            .values()
            .filter(|r| same(&r.group, group))
            .filter(|r| kinds.is_none_or(|k| k.contains(&r.kind)))
            .map(|r| state.snapshot(r))
            .collect())
    }

    async fn get_resource(&self, id: &str) -> Result<ResourceDescriptor> {
        self.enter(Operation::GetResource, id).await?;
        let state = self.lock();
        state
            .get(id)
            .map(|r| state.snapshot(r))
            .ok_or_else(|| CloudError::NotFound(id.to_string()))
    }

    async fn list_children(
        &self,
        parent_id: &str,
        relation: ChildRelation,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.enter(Operation::ListChildren, parent_id).await?;
        let state = self.lock();
        if !state.exists(parent_id) {
            return Err(CloudError::NotFound(parent_id.to_string()));
        }

        let children = match relation {
            ChildRelation::NetAppVolumeBackups => state
                .resources
                .values()
                .filter(|r| r.kind == ResourceKind::NetAppBackup)
                .filter(|r| {
                    r.property_str("/volumeResourceId")
                        .is_some_and(|v| same(v, parent_id))
                })
                .cloned()
                .collect(),
            _ => {
                let prefix = format!("{}/{}", parent_id, relation_segment(relation));
                let workload = relation_workload(relation);
                state
                    .resources
                    .values()
                    .filter(|r| {
                        is_beneath(&r.id, &prefix) && !r.id[prefix.len() + 1..].contains('/')
                    })
                    .filter(|r| {
                        workload
                            .as_deref()
                            .is_none_or(|w| r.property_str("/workloadType") == Some(w))
                    })
                    .cloned()
                    .collect()
            }
        };
        Ok(children)
    }

    async fn list_dcr_associations(
        &self,
        rule_group: &str,
        rule_name: &str,
    ) -> Result<Vec<ResourceDescriptor>> {
        self.enter(Operation::ListDcrAssociations, rule_name).await?;
        let state = self.lock();
        Ok(state
            .resources
            .values()
            .filter(|r| r.kind == ResourceKind::DataCollectionRuleAssociation)
            .filter(|r| {
                r.property_str("/dataCollectionRuleId")
                    .and_then(|rule| ResourceId::parse(rule).ok())
                    .is_some_and(|rule| {
                        same(&rule.resource_group, rule_group) && same(rule.name(), rule_name)
                    })
            })
            .cloned()
            .collect())
    }

    async fn delete_dcr_association(&self, name: &str, target_id: &str) -> Result<()> {
        let id = format!("{}/providers/{}/{}", target_id, DCR_ASSOCIATION_TYPE, name);
        if !self.enter(Operation::DeleteDcrAssociation, &id).await? {
            return Ok(());
        }
        self.lock().remove(&id)
    }

    async fn delete_resource(&self, id: &str, _options: DeleteOptions) -> Result<()> {
        if !self.enter(Operation::DeleteResource, id).await? {
            return Ok(());
        }
        self.lock().remove(id)
    }

    async fn delete_by_url(&self, url: &str) -> Result<()> {
        if !self.enter(Operation::DeleteByUrl, url).await? {
            return Ok(());
        }
        let path = url.strip_prefix(MANAGEMENT_ENDPOINT).unwrap_or(url);
        let id = path.split('?').next().unwrap_or(path);
        self.lock().remove(id)
    }

    async fn update_resource(&self, id: &str, patch: &ResourcePatch) -> Result<()> {
        if !self
            .enter_with(Operation::UpdateResource, id, Some(patch.to_string()))
            .await?
        {
            return Ok(());
        }
        let mut state = self.lock();
        if !state.exists(id) {
            return Err(CloudError::NotFound(id.to_string()));
        }

        let subnet_of = |subnet: &str| format!("{}/subnets/{}", id, subnet);
        match patch {
            ResourcePatch::ClearSubnetNsg { subnet } => {
                let subnet_id = subnet_of(subnet);
                let resource = state
                    .get_mut(&subnet_id)
                    .ok_or(CloudError::NotFound(subnet_id))?;
                set_property(resource, "networkSecurityGroup", Value::Null);
            }
            ResourcePatch::ClearSubnetDelegations { subnet } => {
                let subnet_id = subnet_of(subnet);
                let resource = state
                    .get_mut(&subnet_id)
                    .ok_or(CloudError::NotFound(subnet_id))?;
                set_property(resource, "delegations", json!([]));
            }
            ResourcePatch::RemoveSubnet { subnet } => {
                state.remove(&subnet_of(subnet))?;
            }
            ResourcePatch::ClearNicNsg => {
                if let Some(resource) = state.get_mut(id) {
                    set_property(resource, "networkSecurityGroup", Value::Null);
                }
            }
            ResourcePatch::DetachNic { nic_id } => {
                let nic = state
                    .get_mut(nic_id)
                    .ok_or_else(|| CloudError::NotFound(nic_id.clone()))?;
                set_property(nic, "virtualMachine", Value::Null);
            }
        }
        Ok(())
    }

    async fn invoke_action(&self, id: &str, action: ResourceAction) -> Result<()> {
        if !self
            .enter_with(Operation::InvokeAction, id, Some(action.to_string()))
            .await?
        {
            return Ok(());
        }
        let mut state = self.lock();
        if !state.exists(id) {
            return Err(CloudError::NotFound(id.to_string()));
        }

        match action {
            ResourceAction::DisableSoftDelete => {
                if let Some(vault) = state.get_mut(id) {
                    set_property(vault, "softDeleteFeatureState", json!("Disabled"));
                }
            }
            ResourceAction::DisableSecurityFeatures => {
                if let Some(vault) = state.get_mut(id) {
                    set_property(vault, "enhancedSecurityState", json!("Disabled"));
                }
            }
            ResourceAction::UndoSoftDelete => {
                if let Some(item) = state.get_mut(id) {
                    if item.property_str("/protectionState") == Some("SoftDeleted") {
                        set_property(item, "protectionState", json!("ProtectionStopped"));
                    }
                }
            }
            ResourceAction::DisableProtection { delete_backup_data } => {
                let soft_delete_on = state
                    .vault_of(id)
                    .map(|v| v.property_str("/softDeleteFeatureState") != Some("Disabled"))
                    .unwrap_or(false);
                if delete_backup_data && !soft_delete_on {
                    state.remove(id)?;
                } else if let Some(item) = state.get_mut(id) {
                    let next = if delete_backup_data {
                        "SoftDeleted"
                    } else {
                        "ProtectionStopped"
                    };
                    set_property(item, "protectionState", json!(next));
                }
            }
            ResourceAction::UnregisterContainer => {
                state.remove(id)?;
            }
        }
        Ok(())
    }

    async fn delete_resource_group(
        &self,
        name: &str,
        options: &GroupDeleteOptions,
    ) -> Result<()> {
        if !self.enter(Operation::DeleteResourceGroup, name).await? {
            return Ok(());
        }
        let mut state = self.lock();
        let key = state
            .groups
            .keys()
            .find(|g| same(g, name))
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("resource group '{}'", name)))?;
        let scope = Self::group_id(&key);

        if let Some(lock) = state
            .locks
            .iter()
            .find(|l| same(&l.scope, &scope) || is_beneath(&l.scope, &scope))
        {
            return Err(CloudError::Conflict(format!(
                "ScopeLocked: the scope '{}' cannot perform delete operation because following scope(s) are locked: '{}' (lock '{}')",
                scope, lock.scope, lock.name
            )));
        }

        if let Some(blocked) = state.resources.values().find(|r| {
            same(&r.group, &key)
                && r.properties.get("deletionBlocked") == Some(&Value::Bool(true))
                && !options
                    .force_deletion_types
                    .iter()
                    .any(|t| same(t, &r.resource_type))
        }) {
            return Err(CloudError::Conflict(format!(
                "Conflict: resource '{}' could not be deleted while deleting group '{}'",
                blocked.id, key
            )));
        }

        state.resources.retain(|_, r| !same(&r.group, &key));
        state.groups.remove(&key);
        Ok(())
    }

    async fn list_locks(&self, scope: &str) -> Result<Vec<ResourceLock>> {
        self.enter(Operation::ListLocks, scope).await?;
        Ok(self
            .lock()
            .locks
            .iter()
            .filter(|l| same(&l.scope, scope) || is_beneath(&l.scope, scope))
            .cloned()
            .collect())
    }

    async fn delete_lock(&self, lock_id: &str) -> Result<()> {
        if !self.enter(Operation::DeleteLock, lock_id).await? {
            return Ok(());
        }
        let mut state = self.lock();
        let before = state.locks.len();
        state.locks.retain(|l| !same(&l.id, lock_id));
        if state.locks.len() == before {
            return Err(CloudError::NotFound(lock_id.to_string()));
        }
        Ok(())
    }
}
