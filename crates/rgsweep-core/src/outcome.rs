//! Removal outcomes and their roll-ups per stage, group and fleet run

use crate::fleet::ExecutionMode;
use crate::plan::{PlannedStage, StageKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default bound for error text carried into reports
pub const MAX_REASON_LEN: usize = 300;

/// Terminal status of one resource removal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RemovalStatus {
    Removed,
    NotFound,
    Skipped(String),
    Failed(String),
}

impl RemovalStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RemovalStatus::Failed(_))
    }

    /// The resource is gone (or was never there)
    pub fn is_gone(&self) -> bool {
        matches!(self, RemovalStatus::Removed | RemovalStatus::NotFound)
    }
}

impl std::fmt::Display for RemovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalStatus::Removed => write!(f, "removed"),
            RemovalStatus::NotFound => write!(f, "not-found"),
            RemovalStatus::Skipped(reason) => write!(f, "skipped ({})", reason),
            RemovalStatus::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Result of removing one resource, with attribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemovalOutcome {
    pub resource_id: String,
    pub status: RemovalStatus,
    /// Client calls made, summed over retries and fallback techniques
    pub attempts_made: u32,
    /// Technique that produced the status, prefixed with the strategy name
    pub strategy_used: Option<String>,
}

impl RemovalOutcome {
    pub fn new(resource_id: impl Into<String>, status: RemovalStatus) -> Self {
        Self {
            resource_id: resource_id.into(),
            status,
            attempts_made: 0,
            strategy_used: None,
        }
    }

    pub fn removed(resource_id: impl Into<String>) -> Self {
        Self::new(resource_id, RemovalStatus::Removed)
    }

    pub fn not_found(resource_id: impl Into<String>) -> Self {
        Self::new(resource_id, RemovalStatus::NotFound)
    }

    pub fn skipped(resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(resource_id, RemovalStatus::Skipped(reason.into()))
    }

    pub fn failed(resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(resource_id, RemovalStatus::Failed(reason.into()))
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts_made = attempts;
        self
    }

    pub fn with_technique(mut self, technique: impl Into<String>) -> Self {
        self.strategy_used = Some(technique.into());
        self
    }

    /// Prefix the technique with the strategy that ran it (`nsg/delete`)
    pub fn attributed(mut self, strategy: &str) -> Self {
        let prefix = format!("{}/", strategy);
        self.strategy_used = Some(match self.strategy_used.take() {
            Some(technique) if technique.starts_with(&prefix) => technique,
            Some(technique) => format!("{}{}", prefix, technique),
            None => strategy.to_string(),
        });
        self
    }
}

/// Outcomes of one executed stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub outcomes: Vec<RemovalOutcome>,
    pub duration_ms: u64,
}

impl StageReport {
    /// Any task failed; the plan carries on regardless
    pub fn is_degraded(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_failed())
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failed()).count()
    }
}

/// Teardown state machine of one resource group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GroupState {
    Discovered,
    Protected,
    Planning,
    Executing { stage: usize, of: usize },
    FinalDeleting,
    Deleted,
    Blocked { reason: String },
    /// Dry run: plan computed, nothing mutated
    Planned,
    /// Cleanup mode: stages of one family ran, group delete not attempted
    Cleaned,
}

impl GroupState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GroupState::Protected
                | GroupState::Deleted
                | GroupState::Blocked { .. }
                | GroupState::Planned
                | GroupState::Cleaned
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupState::Discovered => "discovered",
            GroupState::Protected => "protected",
            GroupState::Planning => "planning",
            GroupState::Executing { .. } => "executing",
            GroupState::FinalDeleting => "final-deleting",
            GroupState::Deleted => "deleted",
            GroupState::Blocked { .. } => "blocked",
            GroupState::Planned => "planned",
            GroupState::Cleaned => "cleaned",
        }
    }
}

impl std::fmt::Display for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupState::Executing { stage, of } => write!(f, "executing ({}/{})", stage, of),
            GroupState::Blocked { reason } => write!(f, "blocked: {}", reason),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Where one group ended up, and how it got there
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub group: String,
    pub state: GroupState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageReport>,
    /// Planned stages, filled for dry runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<PlannedStage>>,
}

impl GroupOutcome {
    pub fn new(group: impl Into<String>, state: GroupState) -> Self {
        Self {
            group: group.into(),
            state,
            stages: Vec::new(),
            plan: None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.state {
            GroupState::Blocked { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &RemovalOutcome> {
        self.stages.iter().flat_map(|s| s.outcomes.iter())
    }

    pub fn stage(&self, kind: StageKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == kind)
    }
}

/// Aggregate result of a fleet run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub mode: ExecutionMode,
    pub groups: Vec<GroupOutcome>,
}

impl FleetReport {
    fn count(&self, label: &str) -> usize {
        self.groups.iter().filter(|g| g.state.label() == label).count()
    }

    pub fn protected_count(&self) -> usize {
        self.count("protected")
    }

    pub fn deleted_count(&self) -> usize {
        self.count("deleted")
    }

    pub fn blocked_count(&self) -> usize {
        self.count("blocked")
    }

    pub fn planned_count(&self) -> usize {
        self.count("planned")
    }

    pub fn cleaned_count(&self) -> usize {
        self.count("cleaned")
    }

    pub fn has_blocked(&self) -> bool {
        self.blocked_count() > 0
    }

    pub fn group(&self, name: &str) -> Option<&GroupOutcome> {
        self.groups.iter().find(|g| g.group.eq_ignore_ascii_case(name))
    }
}

/// Collapse whitespace and truncate error text for reports
pub fn sanitize_reason(text: &str, max_len: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_len {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(max_len.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_reason_collapses_and_truncates() {
        assert_eq!(
            sanitize_reason("Conflict:\n  scope   locked\t", 300),
            "Conflict: scope locked"
        );

        let long = "x".repeat(400);
        let sanitized = sanitize_reason(&long, 300);
        assert_eq!(sanitized.chars().count(), 300);
        assert!(sanitized.ends_with('…'));
    }

    #[test]
    fn test_attribution_prefixes_once() {
        let outcome = RemovalOutcome::removed("/x")
            .with_technique("delete")
            .attributed("nsg")
            .attributed("nsg");
        assert_eq!(outcome.strategy_used.as_deref(), Some("nsg/delete"));

        let bare = RemovalOutcome::skipped("/x", "nothing to do").attributed("lock");
        assert_eq!(bare.strategy_used.as_deref(), Some("lock"));

        // 戦略名で始まるだけの手法名にも接頭辞を付ける
        let rest = RemovalOutcome::removed("/x")
            .with_technique("nsg-rest")
            .attributed("nsg");
        assert_eq!(rest.strategy_used.as_deref(), Some("nsg/nsg-rest"));
        let nested = RemovalOutcome::removed("/x")
            .with_technique("vault/delete")
            .attributed("vault-item");
        assert_eq!(nested.strategy_used.as_deref(), Some("vault-item/vault/delete"));
    }

    #[test]
    fn test_stage_degradation() {
        let report = StageReport {
            stage: StageKind::NsgDelete,
            outcomes: vec![
                RemovalOutcome::removed("/a"),
                RemovalOutcome::skipped("/b", "declined"),
            ],
            duration_ms: 3,
        };
        assert!(!report.is_degraded());

        let mut degraded = report.clone();
        degraded.outcomes.push(RemovalOutcome::failed("/c", "403"));
        assert!(degraded.is_degraded());
        assert_eq!(degraded.failed_count(), 1);
    }

    #[test]
    fn test_group_state_terminality() {
        assert!(GroupState::Protected.is_terminal());
        assert!(
            GroupState::Blocked {
                reason: "lock".into()
            }
            .is_terminal()
        );
        assert!(!GroupState::Executing { stage: 1, of: 3 }.is_terminal());
        assert_eq!(
            GroupState::Executing { stage: 2, of: 5 }.to_string(),
            "executing (2/5)"
        );
    }
}
