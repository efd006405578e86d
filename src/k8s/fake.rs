//! In-memory cluster used by unit tests.

use crate::k8s::cluster::{ClusterClient, ClusterError};
use crate::k8s::types::{
    LabelSelector, Labels, ServiceHandle, ServiceSpec, WorkloadHandle, WorkloadSpec,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct State {
    workloads: Vec<WorkloadHandle>,
    services: Vec<ServiceHandle>,
    calls: Vec<String>,
    fail_create_workload: Option<ClusterError>,
    fail_update_labels: Option<ClusterError>,
    fail_create_service: Option<ClusterError>,
    fail_delete_workload: Option<ClusterError>,
    fail_list: VecDeque<ClusterError>,
    list_delay: Option<Duration>,
    ignore_labels: bool,
}

#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

pub fn rejected(reason: &str) -> ClusterError {
    ClusterError::Rejected {
        code: 409,
        reason: reason.to_string(),
        message: format!("{} from fake cluster", reason),
    }
}

pub fn unavailable() -> ClusterError {
    ClusterError::Unavailable("connection refused".to_string())
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn workloads(&self) -> Vec<WorkloadHandle> {
        self.with_state(|s| s.workloads.clone())
    }

    pub fn services(&self) -> Vec<ServiceHandle> {
        self.with_state(|s| s.services.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn insert_service(&self, service: ServiceHandle) {
        self.with_state(|s| s.services.push(service));
    }

    pub fn fail_create_workload(&self, err: ClusterError) {
        self.with_state(|s| s.fail_create_workload = Some(err));
    }

    pub fn fail_update_labels(&self, err: ClusterError) {
        self.with_state(|s| s.fail_update_labels = Some(err));
    }

    pub fn fail_create_service(&self, err: ClusterError) {
        self.with_state(|s| s.fail_create_service = Some(err));
    }

    pub fn fail_delete_workload(&self, err: ClusterError) {
        self.with_state(|s| s.fail_delete_workload = Some(err));
    }

    /// Queues failures for the next list calls, consumed one per call.
    pub fn fail_list(&self, errs: impl IntoIterator<Item = ClusterError>) {
        self.with_state(|s| s.fail_list.extend(errs));
    }

    /// Label updates succeed without changing the stored workload.
    pub fn ignore_label_updates(&self) {
        self.with_state(|s| s.ignore_labels = true);
    }

    pub fn delay_list(&self, delay: Duration) {
        self.with_state(|s| s.list_delay = Some(delay));
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<WorkloadHandle, ClusterError> {
        self.with_state(|s| {
            s.calls.push(format!("create_workload {}", spec.name));
            if let Some(err) = s.fail_create_workload.clone() {
                return Err(err);
            }
            if s.workloads.iter().any(|w| w.name == spec.name) {
                return Err(rejected("AlreadyExists"));
            }

            let workload = WorkloadHandle {
                name: spec.name.clone(),
                labels: Labels::new(),
            };
            s.workloads.push(workload.clone());
            Ok(workload)
        })
    }

    async fn update_workload_labels(
        &self,
        workload: &WorkloadHandle,
        labels: &Labels,
    ) -> Result<WorkloadHandle, ClusterError> {
        self.with_state(|s| {
            s.calls.push(format!("update_workload_labels {}", workload.name));
            if let Some(err) = s.fail_update_labels.clone() {
                return Err(err);
            }

            let stored = s
                .workloads
                .iter_mut()
                .find(|w| w.name == workload.name)
                .ok_or_else(|| rejected("NotFound"))?;
            if !s.ignore_labels {
                stored.labels.extend(labels.clone());
            }
            Ok(stored.clone())
        })
    }

    async fn delete_workload(&self, workload: &WorkloadHandle) -> Result<(), ClusterError> {
        self.with_state(|s| {
            s.calls.push(format!("delete_workload {}", workload.name));
            if let Some(err) = s.fail_delete_workload.clone() {
                return Err(err);
            }
            s.workloads.retain(|w| w.name != workload.name);
            Ok(())
        })
    }

    async fn create_service_endpoint(
        &self,
        spec: &ServiceSpec,
    ) -> Result<ServiceHandle, ClusterError> {
        self.with_state(|s| {
            s.calls.push(format!("create_service_endpoint {}", spec.name));
            if let Some(err) = s.fail_create_service.clone() {
                return Err(err);
            }
            if s.services.iter().any(|svc| svc.name == spec.name) {
                return Err(rejected("AlreadyExists"));
            }

            let service = ServiceHandle {
                name: spec.name.clone(),
                labels: spec.labels.clone(),
                selector: spec.selector.clone(),
                cluster_ip: Some(format!("10.96.0.{}", s.services.len() + 10)),
                port: Some(spec.port),
            };
            s.services.push(service.clone());
            Ok(service)
        })
    }

    async fn list_service_endpoints(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<ServiceHandle>, ClusterError> {
        let delay = self.with_state(|s| {
            s.calls.push(format!("list_service_endpoints {}", selector));
            s.list_delay
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.with_state(|s| {
            if let Some(err) = s.fail_list.pop_front() {
                return Err(err);
            }
            Ok(s.services
                .iter()
                .filter(|svc| selector.matches(&svc.labels))
                .cloned()
                .collect())
        })
    }
}
