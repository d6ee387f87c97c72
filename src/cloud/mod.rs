//! Yandex Cloud REST clients: IAM token exchange, Compute, Managed Kubernetes.

pub mod api;
pub mod compute;
pub mod iam;
pub mod jwt;
pub mod kubernetes;
pub mod model;
