use crate::controller::types::{ContainerInfo, Project};
use crate::k8s::{ClusterClient, ClusterError, ServiceSpec, WorkloadHandle, WorkloadSpec};
use crate::{ControllerError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_LAUNCH_PORT: i32 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_LIST_ATTEMPTS: u32 = 3;
const DEFAULT_LIST_BACKOFF: Duration = Duration::from_millis(100);

/// Launches project workloads and resolves their service endpoints.
///
/// All state lives in the cluster; workloads and services are found again
/// through the labels derived from the owning [`Project`].
pub struct ControllerService {
    cluster: Arc<dyn ClusterClient>,
    launch_port: i32,
    request_timeout: Duration,
    list_attempts: u32,
    list_backoff: Duration,
}

impl ControllerService {
    pub fn new(cluster: Arc<dyn ClusterClient>, launch_port: i32) -> Self {
        Self {
            cluster,
            launch_port,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            list_attempts: DEFAULT_LIST_ATTEMPTS,
            list_backoff: DEFAULT_LIST_BACKOFF,
        }
    }

    /// Upper bound for one operation, covering all of its cluster calls and
    /// retries. Cleanup after a failed launch gets the same bound again.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Retry policy for service lookups. Only connectivity failures are
    /// retried; `attempts` is clamped to at least one.
    pub fn with_list_retries(mut self, attempts: u32, initial_backoff: Duration) -> Self {
        self.list_attempts = attempts.max(1);
        self.list_backoff = initial_backoff;
        self
    }

    pub fn launch_port(&self) -> i32 {
        self.launch_port
    }

    /// Creates the workload for `info` and a service routing to it.
    ///
    /// If any step after the workload creation fails, the workload is deleted
    /// again so that a failed launch leaves nothing behind. A second launch
    /// for the same project is rejected by the cluster as a duplicate name.
    pub async fn launch_container(&self, info: &ContainerInfo) -> Result<()> {
        let deadline = Instant::now() + self.request_timeout;
        let project = &info.owner;
        project.validate()?;

        let name = project.identity_key();
        let spec = WorkloadSpec {
            name: name.clone(),
            container_name: name.clone(),
            image: info.image_reference.clone(),
            port: self.launch_port,
        };

        let workload = self
            .bounded(
                deadline,
                "create workload",
                self.cluster.create_workload(&spec),
            )
            .await
            .map_err(|e| launch_error(&name, e))?;
        debug!("Created workload {}", workload.name);

        let labels = project.labels();
        let workload = match self
            .bounded(
                deadline,
                "label workload",
                self.cluster.update_workload_labels(&workload, &labels),
            )
            .await
        {
            Ok(labelled) if project.selector().matches(&labelled.labels) => labelled,
            Ok(labelled) => {
                self.compensate(&labelled).await;
                return Err(ControllerError::LaunchFailed {
                    name,
                    source: ClusterError::Inconsistent(format!(
                        "labels were not applied, workload labels are {:?}",
                        labelled.labels
                    )),
                });
            }
            Err(e) => {
                self.compensate(&workload).await;
                return Err(launch_error(&name, e));
            }
        };

        let service_spec = ServiceSpec {
            name: name.clone(),
            labels: labels.clone(),
            selector: workload.labels.clone(),
            port: self.launch_port,
        };

        if let Err(e) = self
            .bounded(
                deadline,
                "create service",
                self.cluster.create_service_endpoint(&service_spec),
            )
            .await
        {
            self.compensate(&workload).await;
            return Err(launch_error(&name, e));
        }

        info!(
            "Launched {} for user {} project {}",
            info.image_reference, project.user_id, project.project_name
        );

        Ok(())
    }

    /// Resolves the cluster-internal address of the project's service.
    ///
    /// Exactly one matching service must exist; zero or several are errors.
    pub async fn call_service(&self, project: &Project) -> Result<String> {
        let deadline = Instant::now() + self.request_timeout;
        project.validate()?;

        let selector = project.selector();
        let mut backoff = self.list_backoff;
        let mut attempt = 1;

        let services = loop {
            match self
                .bounded(
                    deadline,
                    "list services",
                    self.cluster.list_service_endpoints(&selector),
                )
                .await
            {
                Ok(services) => break services,
                Err(e)
                    if e.is_unavailable()
                        && attempt < self.list_attempts
                        && Instant::now() + backoff < deadline =>
                {
                    warn!(
                        "Service lookup for {} failed (attempt {}/{}): {}, retrying in {:?}",
                        selector, attempt, self.list_attempts, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(ControllerError::OrchestrationUnavailable(format!(
                        "listing services matching {}: {}",
                        selector, e
                    )))
                }
            }
        };

        let not_found = || ControllerError::NotFound {
            user_id: project.user_id.clone(),
            project_name: project.project_name.clone(),
        };

        match services.as_slice() {
            [] => Err(not_found()),
            [service] => {
                let address = service.address().ok_or_else(not_found)?;
                debug!("Resolved {} to {}", selector, address);
                Ok(address)
            }
            many => Err(ControllerError::AmbiguousResolution {
                user_id: project.user_id.clone(),
                project_name: project.project_name.clone(),
                count: many.len(),
            }),
        }
    }

    async fn bounded<T, F>(
        &self,
        deadline: Instant,
        op: &str,
        fut: F,
    ) -> std::result::Result<T, ClusterError>
    where
        F: Future<Output = std::result::Result<T, ClusterError>>,
    {
        match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ClusterError::Unavailable(format!(
                "{} did not finish within {:?}",
                op, self.request_timeout
            ))),
        }
    }

    async fn compensate(&self, workload: &WorkloadHandle) {
        warn!("Launch of {} failed, deleting workload", workload.name);

        let deadline = Instant::now() + self.request_timeout;
        if let Err(e) = self
            .bounded(
                deadline,
                "delete workload",
                self.cluster.delete_workload(workload),
            )
            .await
        {
            warn!(
                "Failed to delete workload {} after failed launch: {}",
                workload.name, e
            );
        }
    }
}

fn launch_error(name: &str, err: ClusterError) -> ControllerError {
    match err {
        ClusterError::Unavailable(msg) => {
            ControllerError::OrchestrationUnavailable(format!("launching {}: {}", name, msg))
        }
        other => ControllerError::LaunchFailed {
            name: name.to_string(),
            source: other,
        },
    }
}
