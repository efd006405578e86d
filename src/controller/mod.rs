pub mod service;
pub mod types;

pub use service::ControllerService;
pub use types::{ContainerInfo, Project, RegistryKind};
