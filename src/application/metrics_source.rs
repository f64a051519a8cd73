// Source traits for the values a snapshot is built from
use crate::domain::device::DeviceRecord;
use crate::domain::metrics::{AgentStatus, SpeedSample};
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Upstream monitoring metrics for one agent.
///
/// Implementations report failures by returning `None`; a failed call is never
/// retried within the same invocation.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Latest speed test sample
    async fn fetch_speeds(&self) -> Option<SpeedSample>;

    /// Uptime percentage over the trailing 30 days
    async fn fetch_uptime(&self) -> Option<f64>;

    /// Agent connectivity status
    async fn fetch_status(&self) -> Option<AgentStatus>;

    /// Raw device inventory
    async fn fetch_devices(&self) -> Option<Vec<DeviceRecord>>;
}

/// Address of the panel host on its configured network interface.
pub trait AddressResolver: Send + Sync {
    fn local_address(&self) -> Option<Ipv4Addr>;
}
