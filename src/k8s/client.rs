use crate::k8s::cluster::{ClusterClient, ClusterError};
use crate::k8s::types::{
    LabelSelector, Labels, ServiceHandle, ServiceSpec, WorkloadHandle, WorkloadSpec,
};
use crate::ControllerError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde_json::json;
use tracing::{debug, info};

/// Cluster client backed by the Kubernetes API, scoped to one namespace.
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
    namespace: String,
}

impl K8sClient {
    /// Connects using the ambient kubeconfig or in-cluster configuration and
    /// verifies that the API server answers.
    pub async fn try_default(namespace: &str) -> crate::Result<Self> {
        debug!("Initializing Kubernetes client");

        let client = Client::try_default().await.map_err(|e| {
            ControllerError::OrchestrationUnavailable(format!(
                "Failed to create K8s client: {}",
                e
            ))
        })?;

        let version = client.apiserver_version().await.map_err(|e| {
            ControllerError::OrchestrationUnavailable(format!(
                "Failed to reach Kubernetes API server: {}",
                e
            ))
        })?;

        info!(
            "Successfully connected to Kubernetes cluster (v{}.{}), namespace {}",
            version.major, version.minor, namespace
        );

        Ok(Self::new(client, namespace))
    }

    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

fn cluster_error(e: kube::Error) -> ClusterError {
    match e {
        kube::Error::Api(resp) => ClusterError::Rejected {
            code: resp.code,
            reason: resp.reason,
            message: resp.message,
        },
        other => ClusterError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ClusterClient for K8sClient {
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
    ) -> Result<WorkloadHandle, ClusterError> {
        debug!("Creating pod {}/{}", self.namespace, spec.name);

        let pod = self
            .pods()
            .create(&PostParams::default(), &spec.to_k8s_pod())
            .await
            .map_err(cluster_error)?;

        Ok(WorkloadHandle::from_k8s_pod(&pod))
    }

    async fn update_workload_labels(
        &self,
        workload: &WorkloadHandle,
        labels: &Labels,
    ) -> Result<WorkloadHandle, ClusterError> {
        debug!("Labelling pod {}/{}", self.namespace, workload.name);

        let patch = json!({ "metadata": { "labels": labels } });
        let pod = self
            .pods()
            .patch(&workload.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(cluster_error)?;

        Ok(WorkloadHandle::from_k8s_pod(&pod))
    }

    async fn delete_workload(
        &self,
        workload: &WorkloadHandle,
    ) -> Result<(), ClusterError> {
        debug!("Deleting pod {}/{}", self.namespace, workload.name);

        match self
            .pods()
            .delete(&workload.name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(err)) if err.reason == "NotFound" => Ok(()),
            Err(e) => Err(cluster_error(e)),
        }
    }

    async fn create_service_endpoint(
        &self,
        spec: &ServiceSpec,
    ) -> Result<ServiceHandle, ClusterError> {
        debug!("Creating service {}/{}", self.namespace, spec.name);

        let service = self
            .services()
            .create(&PostParams::default(), &spec.to_k8s_service())
            .await
            .map_err(cluster_error)?;

        Ok(ServiceHandle::from_k8s_service(&service))
    }

    async fn list_service_endpoints(
        &self,
        selector: &LabelSelector,
    ) -> Result<Vec<ServiceHandle>, ClusterError> {
        let selector = selector.to_string();
        debug!("Listing services in {} matching {}", self.namespace, selector);

        let list = self
            .services()
            .list(&ListParams::default().labels(&selector))
            .await
            .map_err(cluster_error)?;

        Ok(list.items.iter().map(ServiceHandle::from_k8s_service).collect())
    }
}
