use crate::controller::service::{DEFAULT_LAUNCH_PORT, DEFAULT_REQUEST_TIMEOUT};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "deepcloud-controller")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Launches user container images on Kubernetes and routes callers to them", long_about = None)]
pub struct Cli {
    #[arg(long = "svc-port", env = "SVC_PORT", help = "Port the API listens on")]
    pub svc_port: u16,

    #[arg(
        long,
        env = "DEEPCLOUD_NAMESPACE",
        default_value = "default",
        help = "Kubernetes namespace workloads and services are created in"
    )]
    pub namespace: String,

    #[arg(
        long,
        env = "DEEPCLOUD_LAUNCH_PORT",
        default_value_t = DEFAULT_LAUNCH_PORT,
        value_parser = clap::value_parser!(i32).range(1..=65535),
        help = "Container port exposed by launched workloads and their services"
    )]
    pub launch_port: i32,

    #[arg(
        long,
        env = "DEEPCLOUD_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(),
        help = "Deadline in seconds for each launch or lookup, covering all its Kubernetes API calls"
    )]
    pub request_timeout_secs: u64,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,
}

impl Cli {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.svc_port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
