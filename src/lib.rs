pub mod api;
pub mod cli;
pub mod controller;
pub mod error;
pub mod k8s;
pub mod metrics;

pub use error::{ControllerError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
