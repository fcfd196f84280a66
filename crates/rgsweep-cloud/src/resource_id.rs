//! Fully-qualified resource ID parsing
//!
//! IDs have the shape
//! `/subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}[/{type}/{name}]*`.
//! Extension resources (locks, rule associations) append another
//! `/providers/...` section to the ID of the resource they are attached to.

use crate::error::{CloudError, Result};

const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Parsed resource ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription: String,
    pub resource_group: String,
    /// Provider namespace, `None` for a bare resource group ID
    pub namespace: Option<String>,
    /// `(type, name)` pairs from outermost to innermost
    pub segments: Vec<(String, String)>,
}

impl ResourceId {
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = || CloudError::InvalidResourceId(id.to_string());
        let parts: Vec<&str> = id.trim_matches('/').split('/').collect();

        if parts.len() < 4
            || !parts[0].eq_ignore_ascii_case("subscriptions")
            || !parts[2].eq_ignore_ascii_case("resourceGroups")
        {
            return Err(invalid());
        }

        let subscription = parts[1].to_string();
        let resource_group = parts[3].to_string();
        let rest = &parts[4..];

        if rest.is_empty() {
            return Ok(Self {
                subscription,
                resource_group,
                namespace: None,
                segments: Vec::new(),
            });
        }

        // Extension resources are not modelled here; only the base resource is parsed.
        if !rest[0].eq_ignore_ascii_case("providers") || rest.len() < 4 {
            return Err(invalid());
        }

        let namespace = rest[1].to_string();
        let mut segments = Vec::new();
        let mut pairs = rest[2..].chunks(2);
        for pair in pairs.by_ref() {
            if pair.len() != 2 || pair[0].eq_ignore_ascii_case("providers") {
                break;
            }
            segments.push((pair[0].to_string(), pair[1].to_string()));
        }

        if segments.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            subscription,
            resource_group,
            namespace: Some(namespace),
            segments,
        })
    }

    /// Innermost resource name (group name for a bare group ID)
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(|(_, n)| n.as_str())
            .unwrap_or(&self.resource_group)
    }

    /// Provider type string, e.g. `Microsoft.Network/virtualNetworks/subnets`
    pub fn resource_type(&self) -> Option<String> {
        let namespace = self.namespace.as_ref()?;
        let types: Vec<&str> = self.segments.iter().map(|(t, _)| t.as_str()).collect();
        Some(format!("{}/{}", namespace, types.join("/")))
    }

    /// ID of the owning resource group
    pub fn group_scope(&self) -> String {
        group_scope(&self.subscription, &self.resource_group)
    }

    /// Name of the outermost resource (e.g. the VNet of a subnet)
    pub fn root_name(&self) -> Option<&str> {
        self.segments.first().map(|(_, n)| n.as_str())
    }

    /// ID of the parent resource for nested resources
    pub fn parent(&self) -> Option<String> {
        if self.segments.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent.to_string())
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription, self.resource_group
        )?;
        if let Some(namespace) = &self.namespace {
            write!(f, "/providers/{}", namespace)?;
            for (t, n) in &self.segments {
                write!(f, "/{}/{}", t, n)?;
            }
        }
        Ok(())
    }
}

/// ID of a resource group
pub fn group_scope(subscription: &str, group: &str) -> String {
    format!("/subscriptions/{}/resourceGroups/{}", subscription, group)
}

/// Split an extension resource ID into `(target_id, name)`
///
/// For `{target}/providers/Microsoft.Insights/dataCollectionRuleAssociations/{name}`
/// and `extension_type = "Microsoft.Insights/dataCollectionRuleAssociations"` this
/// returns the target resource ID and the association name. The match on the
/// extension type is case-insensitive.
pub fn split_extension_id<'a>(id: &'a str, extension_type: &str) -> Option<(&'a str, &'a str)> {
    let marker = format!("/providers/{}/", extension_type).to_ascii_lowercase();
    let lowered = id.to_ascii_lowercase();
    let at = lowered.rfind(&marker)?;
    let target = &id[..at];
    let name = &id[at + marker.len()..];
    if target.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((target, name))
}

/// Management REST URL for a resource ID
pub fn management_url(id: &str, api_version: &str) -> String {
    format!("{}{}?api-version={}", MANAGEMENT_ENDPOINT, id, api_version)
}
