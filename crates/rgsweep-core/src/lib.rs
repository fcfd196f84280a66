//! rgsweep teardown engine
//!
//! Deletes resource groups whose members block each other's deletion.
//!
//! # Flow
//!
//! ```text
//! FleetOrchestrator ── list groups, keep/delete classification
//!        │
//!        ▼
//! GroupTeardownCoordinator ── per-group state machine
//!        │
//!        ├─▶ DependencyResolver ── fixed stage table, fresh enumeration per stage
//!        │
//!        ├─▶ StageExecutor ── bounded concurrency inside one stage
//!        │        │
//!        │        ▼
//!        │   RemovalStrategy ── per-kind detach / unprotect / delete
//!        │        │
//!        │        ▼
//!        │   RetryFallbackController ── retry + fallback chain per call
//!        │
//!        └─▶ final group delete (escalates once on conflict)
//! ```

pub mod confirm;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod fleet;
pub mod options;
pub mod outcome;
pub mod plan;
pub mod progress;
pub mod retry;
pub mod strategy;

// Re-exports
pub use confirm::{
    AutoApprove, AutoDeny, Callback, ConfirmationKind, ConfirmationPolicy, ConfirmationRequest,
};
pub use coordinator::GroupTeardownCoordinator;
pub use error::{CoreError, Result};
pub use executor::StageExecutor;
pub use fleet::{ExecutionMode, FleetOrchestrator, GroupFilter};
pub use options::{CrossGroupDecline, TeardownOptions};
pub use outcome::{
    FleetReport, GroupOutcome, GroupState, RemovalOutcome, RemovalStatus, StageReport,
    sanitize_reason,
};
pub use plan::{
    DEPENDENCY_EDGES, DependencyEdge, DependencyResolver, Phase, PlannedStage, RemovalTask,
    Stage, StageFamily, StageKind, TeardownPlan,
};
pub use progress::{ProgressEvent, ProgressSender, ProgressSink};
pub use retry::{RetryFallbackController, RetryPolicy, Technique};
pub use strategy::{RemovalContext, RemovalStrategy, StrategyRegistry};
