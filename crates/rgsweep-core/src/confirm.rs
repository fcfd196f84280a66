//! Confirmation capability threaded through strategies
//!
//! Strategies never prompt on their own. When an action needs consent
//! (disassociating an NSG, deleting a VM owned by another group, deleting an
//! orphaned NIC) they describe it in a [`ConfirmationRequest`] and ask the
//! policy they were handed.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// Clear every association of a network security group
    NsgDisassociation,
    /// Delete a VM (and its NIC) that lives in a different group
    CrossGroupVm,
    /// Delete a NIC attached to nothing
    OrphanedNic,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationRequest {
    pub kind: ConfirmationKind,
    /// Resource the action is about
    pub subject: String,
    /// One-line description of the action
    pub reason: String,
    /// Resources affected by the action
    pub resources: Vec<String>,
}

impl ConfirmationRequest {
    pub fn new(
        kind: ConfirmationKind,
        subject: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            reason: reason.into(),
            resources: Vec::new(),
        }
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }
}

#[async_trait]
pub trait ConfirmationPolicy: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> bool;
}

/// Approves everything (`--force`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationPolicy for AutoApprove {
    async fn confirm(&self, _request: &ConfirmationRequest) -> bool {
        true
    }
}

/// Declines everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDeny;

#[async_trait]
impl ConfirmationPolicy for AutoDeny {
    async fn confirm(&self, _request: &ConfirmationRequest) -> bool {
        false
    }
}

/// Delegates the decision to a closure
pub struct Callback<F>(pub F);

#[async_trait]
impl<F> ConfirmationPolicy for Callback<F>
where
    F: Fn(&ConfirmationRequest) -> bool + Send + Sync,
{
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        (self.0)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_callback_sees_request() {
        let policy = Callback(|request: &ConfirmationRequest| {
            request.kind == ConfirmationKind::OrphanedNic && request.resources.len() == 1
        });
        let request = ConfirmationRequest::new(ConfirmationKind::OrphanedNic, "/nic", "delete")
            .with_resources(vec!["/nic".into()]);

        assert!(policy.confirm(&request).await);
        assert!(AutoApprove.confirm(&request).await);
        assert!(!AutoDeny.confirm(&request).await);
    }
}
