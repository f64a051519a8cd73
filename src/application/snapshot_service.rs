// Snapshot service - Assembles one cycle's dashboard values
use crate::application::metrics_source::{AddressResolver, MetricsSource};
use crate::domain::device::aggregate;
use crate::domain::snapshot::DashboardSnapshot;
use std::sync::Arc;

#[derive(Clone)]
pub struct SnapshotService {
    metrics: Arc<dyn MetricsSource>,
    resolver: Arc<dyn AddressResolver>,
}

impl SnapshotService {
    pub fn new(metrics: Arc<dyn MetricsSource>, resolver: Arc<dyn AddressResolver>) -> Self {
        Self { metrics, resolver }
    }

    /// Query every source in turn. Each field degrades on its own; the snapshot is always built.
    pub async fn build_snapshot(&self) -> DashboardSnapshot {
        let speeds = self.metrics.fetch_speeds().await;
        let status = self.metrics.fetch_status().await;
        let ip = self.resolver.local_address();
        let uptime = self.metrics.fetch_uptime().await;

        let device_summary = self.metrics.fetch_devices().await.map(|devices| {
            let result = aggregate(&devices);
            tracing::debug!(
                "Aggregated {} devices: {} reachable, {} of {} important down",
                result.summary.total_devices,
                result.reachable.len(),
                result.summary.important_down,
                result.summary.important_total
            );
            result.summary
        });

        DashboardSnapshot::assemble(speeds, uptime, status, ip, device_summary)
    }
}
