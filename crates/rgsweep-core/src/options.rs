use crate::plan::StageFamily;
use crate::retry::RetryPolicy;
use rgsweep_cloud::ProtectionTag;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resource types the final delete may force-delete by default
pub const DEFAULT_FORCE_DELETION_TYPES: &[&str] = &[
    "Microsoft.Compute/virtualMachines",
    "Microsoft.Compute/virtualMachineScaleSets",
];

pub const DEFAULT_STAGE_CONCURRENCY: usize = 8;
pub const MAX_STAGE_CONCURRENCY: usize = 32;

/// What to do with a subnet when deleting a cross-group VM is declined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossGroupDecline {
    /// Leave the whole subnet in place
    #[default]
    AbortSubnet,
    /// Leave only that NIC and carry on with the subnet
    SkipNic,
}

/// Knobs for one teardown run
#[derive(Debug, Clone)]
pub struct TeardownOptions {
    /// Approve every confirmation
    pub force: bool,

    /// Delete management locks instead of reporting them
    pub remove_locks: bool,

    /// Compute and report the plan without mutating anything
    pub dry_run: bool,

    /// Run only one family of stages and skip the group delete
    pub only: Option<StageFamily>,

    /// Concurrent tasks within a stage
    pub stage_concurrency: usize,

    pub cross_group_decline: CrossGroupDecline,

    /// Types passed to the escalated group delete
    pub force_deletion_types: Vec<String>,

    /// Bound on one group's whole teardown
    pub group_timeout: Option<Duration>,

    pub protection_tag: ProtectionTag,

    pub retry: RetryPolicy,
}

impl Default for TeardownOptions {
    fn default() -> Self {
        Self {
            force: false,
            remove_locks: false,
            dry_run: false,
            only: None,
            stage_concurrency: DEFAULT_STAGE_CONCURRENCY,
            cross_group_decline: CrossGroupDecline::default(),
            force_deletion_types: DEFAULT_FORCE_DELETION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            group_timeout: None,
            protection_tag: ProtectionTag::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl TeardownOptions {
    /// Stage concurrency clamped to the supported range
    pub fn effective_stage_concurrency(&self) -> usize {
        self.stage_concurrency.clamp(1, MAX_STAGE_CONCURRENCY)
    }
}
