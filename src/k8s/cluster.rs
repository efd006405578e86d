use crate::k8s::types::{
    LabelSelector, Labels, ServiceHandle, ServiceSpec, WorkloadHandle, WorkloadSpec,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// The API server answered and refused the request.
    #[error("{reason} ({code}): {message}")]
    Rejected {
        code: u16,
        reason: String,
        message: String,
    },

    /// The API server could not be reached or its answer could not be read.
    #[error("{0}")]
    Unavailable(String),

    /// The API server accepted the request, but the object it returned does
    /// not reflect the change.
    #[error("inconsistent cluster state: {0}")]
    Inconsistent(String),
}

impl ClusterError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClusterError::Unavailable(_))
    }
}

/// Operations the controller needs from the cluster's object store.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<WorkloadHandle, ClusterError>;

    async fn update_workload_labels(
        &self,
        workload: &WorkloadHandle,
        labels: &Labels,
    ) -> Result<WorkloadHandle, ClusterError>;

    async fn delete_workload(&self, workload: &WorkloadHandle) -> Result<(), ClusterError>;

    async fn create_service_endpoint(
        &self,
        spec: &ServiceSpec,
    ) -> Result<ServiceHandle, ClusterError>;

    async fn list_service_endpoints(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<ServiceHandle>, ClusterError>;
}
