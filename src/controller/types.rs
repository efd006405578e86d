use crate::k8s::types::{LabelSelector, Labels, LABEL_PROJECT_NAME, LABEL_USER_ID};
use crate::{ControllerError, Result};
use serde::{Deserialize, Serialize};

/// Maximum length of a Kubernetes object name that is also a DNS label.
const MAX_NAME_LEN: usize = 63;

/// Container registries images may be pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryKind {
    Docker,
}

/// A user's project. `(user_id, project_name)` is the identity key of a
/// launched workload and its service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "userID")]
    pub user_id: String,

    #[serde(rename = "projectName")]
    pub project_name: String,
}

impl Project {
    pub fn new(user_id: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_name: project_name.into(),
        }
    }

    /// Checks that both parts can be used verbatim as label values and that
    /// the derived object name is a valid DNS-1123 label.
    ///
    /// `userID` may not contain `-`, so the first `-` of the derived name
    /// always separates the two parts and distinct projects never share a
    /// name.
    pub fn validate(&self) -> Result<()> {
        validate_part("userID", &self.user_id)?;
        validate_part("projectName", &self.project_name)?;

        if self.user_id.contains('-') {
            return Err(ControllerError::InvalidProject(format!(
                "userID {:?} must not contain '-'",
                self.user_id
            )));
        }

        let name = self.identity_key();
        if name.len() > MAX_NAME_LEN {
            return Err(ControllerError::InvalidProject(format!(
                "derived name {} is {} characters, at most {} allowed",
                name,
                name.len(),
                MAX_NAME_LEN
            )));
        }

        Ok(())
    }

    /// Name shared by the workload, its container and its service.
    pub fn identity_key(&self) -> String {
        format!("{}-{}", self.user_id, self.project_name)
    }

    pub fn labels(&self) -> Labels {
        self.selector().to_labels()
    }

    pub fn selector(&self) -> LabelSelector {
        LabelSelector::new()
            .with(LABEL_USER_ID, &self.user_id)
            .with(LABEL_PROJECT_NAME, &self.project_name)
    }
}

fn validate_part(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ControllerError::InvalidProject(format!(
            "{} must not be empty",
            field
        )));
    }

    let allowed = value
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    let bytes = value.as_bytes();
    let edges_ok =
        bytes[0].is_ascii_alphanumeric() && bytes[bytes.len() - 1].is_ascii_alphanumeric();

    if !allowed || !edges_ok {
        return Err(ControllerError::InvalidProject(format!(
            "{} {:?} must consist of lowercase alphanumerics or '-', and start and end with an alphanumeric",
            field, value
        )));
    }

    Ok(())
}

/// A request to run a container image for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    #[serde(rename = "imageUrl")]
    pub image_reference: String,

    #[serde(rename = "registryName")]
    pub registry_kind: RegistryKind,

    #[serde(rename = "projectInfo")]
    pub owner: Project,
}
