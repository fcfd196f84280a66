//! Azure provider for rgsweep
//!
//! This crate implements the `CloudResourceClient` trait on top of the
//! Azure CLI, so rgsweep can tear down resource groups in an Azure
//! subscription.
//!
//! # Features
//!
//! - Resource group and resource enumeration, including nested kinds
//!   (subnets, NetApp pools/volumes/backups, backup items and containers)
//! - In-place updates (NSG and delegation clearing, NIC detach)
//! - Recovery-services actions (soft delete, stop protection, unregister)
//! - Management locks
//!
//! # Requirements
//!
//! - `az` CLI must be installed and logged in (`az login`)
//! - The `netappfiles` and `monitor` commands must be available
//!
//! # Example
//!
//! ```ignore
//! use rgsweep_cloud::CloudResourceClient;
//! use rgsweep_cloud_azure::AzureCliClient;
//!
//! let client = AzureCliClient::new(Some("my-subscription".into()));
//!
//! // Check authentication
//! let account = client.check_auth().await?;
//!
//! let groups = client.list_resource_groups().await?;
//! ```

pub mod az;
pub mod client;
pub mod error;

pub use az::AzCli;
pub use client::AzureCliClient;
pub use error::{AzureError, Result, classify_stderr};
