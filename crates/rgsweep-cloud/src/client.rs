//! Cloud resource client trait definition

use crate::error::Result;
use crate::model::{
    ChildRelation, DeleteOptions, GroupDeleteOptions, ResourceAction, ResourceDescriptor,
    ResourceGroupHandle, ResourceKind, ResourceLock, ResourcePatch,
};
use async_trait::async_trait;

/// Control-plane capability consumed by the teardown engine
///
/// Implementations handle authentication and token refresh transparently.
/// Every method is a network round-trip; none of them retry on their own,
/// retry and fallback are the caller's business.
#[async_trait]
pub trait CloudResourceClient: Send + Sync {
    /// Returns the client name (e.g. "azure-cli", "memory")
    fn name(&self) -> &str;

    /// List all resource groups visible to the caller
    async fn list_resource_groups(&self) -> Result<Vec<ResourceGroupHandle>>;

    /// List resources in a group, optionally restricted to some kinds
    ///
    /// Nested kinds (subnets, NetApp pools/volumes, backup items) are
    /// expanded from their parents by the implementation.
    async fn list_resources(
        &self,
        group: &str,
        kinds: Option<&[ResourceKind]>,
    ) -> Result<Vec<ResourceDescriptor>>;

    /// Fetch a fresh snapshot of a single resource
    async fn get_resource(&self, id: &str) -> Result<ResourceDescriptor>;

    /// List a child collection of a parent resource
    async fn list_children(
        &self,
        parent_id: &str,
        relation: ChildRelation,
    ) -> Result<Vec<ResourceDescriptor>>;

    /// List associations of a data-collection rule, addressed by rule group and name
    async fn list_dcr_associations(
        &self,
        rule_group: &str,
        rule_name: &str,
    ) -> Result<Vec<ResourceDescriptor>>;

    /// Delete a data-collection-rule association by name and target resource
    async fn delete_dcr_association(&self, name: &str, target_id: &str) -> Result<()>;

    /// Delete a resource by ID
    async fn delete_resource(&self, id: &str, options: DeleteOptions) -> Result<()>;

    /// Delete through a raw management REST URL
    async fn delete_by_url(&self, url: &str) -> Result<()>;

    /// Apply an in-place modification to an owning resource
    async fn update_resource(&self, id: &str, patch: &ResourcePatch) -> Result<()>;

    /// Invoke a non-CRUD control-plane action
    async fn invoke_action(&self, id: &str, action: ResourceAction) -> Result<()>;

    /// Delete a whole resource group
    async fn delete_resource_group(&self, name: &str, options: &GroupDeleteOptions)
    -> Result<()>;

    /// List locks held on a scope or anywhere beneath it
    async fn list_locks(&self, scope: &str) -> Result<Vec<ResourceLock>>;

    /// Delete a lock by ID
    async fn delete_lock(&self, lock_id: &str) -> Result<()>;
}
