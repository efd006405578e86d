use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Pod, PodSpec, Service, ServicePort, ServiceSpec as K8sServiceSpec,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

pub const LABEL_USER_ID: &str = "user-id";
pub const LABEL_PROJECT_NAME: &str = "project-name";

pub type Labels = BTreeMap<String, String>;

/// Equality-based label selector, rendered as `k1=v1,k2=v2`.
///
/// Terms keep their insertion order so the rendered form is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    terms: Vec<(String, String)>,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid label selector term: {0:?}")]
pub struct InvalidSelector(pub String);

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.terms.push((key.into(), value.into()));
        self
    }

    pub fn terms(&self) -> &[(String, String)] {
        &self.terms
    }

    pub fn to_labels(&self) -> Labels {
        self.terms.iter().cloned().collect()
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        self.terms
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

impl FromStr for LabelSelector {
    type Err = InvalidSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selector = LabelSelector::new();
        if s.trim().is_empty() {
            return Ok(selector);
        }

        for term in s.split(',') {
            let (key, value) = term
                .split_once('=')
                .ok_or_else(|| InvalidSelector(term.to_string()))?;
            let key = key.trim();
            // `==` is an accepted spelling of equality
            let value = value.strip_prefix('=').unwrap_or(value).trim();
            if key.is_empty() || key.ends_with('!') {
                return Err(InvalidSelector(term.to_string()));
            }
            selector = selector.with(key, value);
        }

        Ok(selector)
    }
}

/// Desired state of a workload before it is submitted to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub name: String,
    pub container_name: String,
    pub image: String,
    pub port: i32,
}

impl WorkloadSpec {
    pub fn to_k8s_pod(&self) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..ObjectMeta::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: self.container_name.clone(),
                    image: Some(self.image.clone()),
                    ports: Some(vec![ContainerPort {
                        container_port: self.port,
                        ..ContainerPort::default()
                    }]),
                    ..Container::default()
                }],
                ..PodSpec::default()
            }),
            ..Pod::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadHandle {
    pub name: String,
    pub labels: Labels,
}

impl WorkloadHandle {
    pub fn from_k8s_pod(pod: &Pod) -> Self {
        Self {
            name: pod.metadata.name.clone().unwrap_or_default(),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
        }
    }
}

/// Desired state of a service endpoint routing to a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    /// Labels on the service object itself, used for lookup.
    pub labels: Labels,
    /// Workload labels the service routes to.
    pub selector: Labels,
    pub port: i32,
}

impl ServiceSpec {
    pub fn to_k8s_service(&self) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                labels: Some(self.labels.clone()),
                ..ObjectMeta::default()
            },
            spec: Some(K8sServiceSpec {
                type_: Some("ClusterIP".to_string()),
                selector: Some(self.selector.clone()),
                ports: Some(vec![ServicePort {
                    port: self.port,
                    target_port: Some(IntOrString::Int(self.port)),
                    ..ServicePort::default()
                }]),
                ..K8sServiceSpec::default()
            }),
            ..Service::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHandle {
    pub name: String,
    pub labels: Labels,
    pub selector: Labels,
    pub cluster_ip: Option<String>,
    pub port: Option<i32>,
}

impl ServiceHandle {
    pub fn from_k8s_service(service: &Service) -> Self {
        let spec = service.spec.as_ref();

        Self {
            name: service.metadata.name.clone().unwrap_or_default(),
            labels: service.metadata.labels.clone().unwrap_or_default(),
            selector: spec.and_then(|s| s.selector.clone()).unwrap_or_default(),
            cluster_ip: spec.and_then(|s| s.cluster_ip.clone()),
            port: spec
                .and_then(|s| s.ports.as_ref())
                .and_then(|ports| ports.first())
                .map(|p| p.port),
        }
    }

    /// Cluster-internal base URL of the service, if an IP has been allocated.
    ///
    /// Headless services report the literal `None` as their cluster IP, which
    /// like any other non-address value yields `None`.
    pub fn address(&self) -> Option<String> {
        let ip: IpAddr = self.cluster_ip.as_deref()?.parse().ok()?;
        let host = match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{}]", v6),
        };

        Some(match self.port {
            Some(port) => format!("http://{}:{}", host, port),
            None => format!("http://{}", host),
        })
    }
}
