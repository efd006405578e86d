pub mod client;
pub mod cluster;
#[cfg(test)]
pub(crate) mod fake;
pub mod types;

pub use client::K8sClient;
pub use cluster::{ClusterClient, ClusterError};
pub use types::{LabelSelector, Labels, ServiceHandle, ServiceSpec, WorkloadHandle, WorkloadSpec};
