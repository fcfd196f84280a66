//! rgsweep cloud layer
//!
//! Resource model and the control-plane capability the teardown engine
//! drives. Provider crates implement [`CloudResourceClient`]; the engine in
//! `rgsweep-core` never talks to a provider directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   rgsweep CLI                    │
//! │                (purge / plan)                    │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 rgsweep-core                     │
//! │   resolver → stage executor → group coordinator  │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 rgsweep-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait CloudResourceClient { ... }       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Resource IDs │  │ MemoryCloud  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────┐
//! │ rgsweep-cloud-    │
//! │ azure (az CLI)    │
//! └───────────────────┘
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod model;
pub mod resource_id;

// Re-exports
pub use client::CloudResourceClient;
pub use error::{CloudError, Result};
pub use memory::{CallRecord, FailureKind, MemoryCloud, Operation};
pub use model::{
    ChildRelation, DeleteOptions, GroupDeleteOptions, LockLevel, ProtectionTag, ResourceAction,
    ResourceDescriptor, ResourceGroupHandle, ResourceKind, ResourceLock, ResourcePatch,
    WorkloadType,
};
pub use resource_id::ResourceId;
