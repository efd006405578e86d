use crate::k8s::ClusterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Invalid project identity: {0}")]
    InvalidProject(String),

    #[error("Failed to launch workload {name}: {source}")]
    LaunchFailed {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("No service found for user {user_id} project {project_name}")]
    NotFound {
        user_id: String,
        project_name: String,
    },

    #[error("{count} services match user {user_id} project {project_name}")]
    AmbiguousResolution {
        user_id: String,
        project_name: String,
        count: usize,
    },

    #[error("Orchestration API unavailable: {0}")]
    OrchestrationUnavailable(String),
}

impl ControllerError {
    /// Stable name of the error kind, used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerError::InvalidProject(_) => "InvalidProject",
            ControllerError::LaunchFailed { .. } => "LaunchFailed",
            ControllerError::NotFound { .. } => "NotFound",
            ControllerError::AmbiguousResolution { .. } => "AmbiguousResolution",
            ControllerError::OrchestrationUnavailable(_) => "OrchestrationUnavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
