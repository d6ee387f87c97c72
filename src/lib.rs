//! # Yandex Cloud Compute service discovery
//!
//! Authenticates to Yandex Cloud with a service account key, lists compute
//! instances of a folder and republishes them as a Prometheus HTTP service
//! discovery document.
//!
//! Modules:
//! - `config` — service configuration, loading and validation
//! - `cache` — IAM token value object and the refreshing token provider
//! - `cloud` — IAM, Compute and Managed Kubernetes REST clients
//! - `discovery` — label derivation and target assembly
//! - `server` — HTTP endpoints

pub mod cache;
pub mod cloud;
pub mod config;
pub mod discovery;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod utils;
#[cfg(test)]
pub mod tests;

pub use crate::config::types::ServiceConfig;
pub use crate::discovery::aggregator::Discovery;
pub use crate::discovery::target::{DiscoveryDocument, ScrapeTarget};
pub use crate::error::SdError;
