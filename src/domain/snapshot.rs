// Dashboard snapshot - one refresh cycle's values with sentinels substituted
use super::device::DeviceSummary;
use super::metrics::{format_decimal, AgentStatus, SpeedSample};
use std::net::Ipv4Addr;

/// Fallback for numeric values (speeds, uptime, device counts).
pub const NOT_AVAILABLE: &str = "N/A";
/// Fallback for the agent status and the local address.
pub const UNKNOWN: &str = "UNKNOWN";

/// Marker selecting the connectivity glyph in the render tuple.
pub const CONNECTION_ICON_MARKER: &str = "c";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub download: String,
    pub upload: String,
    pub uptime: String,
    pub status: String,
    pub ip: String,
    pub total_online: String,
    pub important_down: String,
    /// Full summary, kept even though only two counters are drawn today.
    pub device_summary: Option<DeviceSummary>,
}

impl DashboardSnapshot {
    pub fn assemble(
        speeds: Option<SpeedSample>,
        uptime: Option<f64>,
        status: Option<AgentStatus>,
        ip: Option<Ipv4Addr>,
        device_summary: Option<DeviceSummary>,
    ) -> Self {
        let (download, upload) = match speeds {
            Some(sample) => (
                format_decimal(sample.download_mbps),
                format_decimal(sample.upload_mbps),
            ),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        let (total_online, important_down) = match &device_summary {
            Some(summary) => (
                summary.total_online.to_string(),
                summary.important_down.to_string(),
            ),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        Self {
            download,
            upload,
            uptime: uptime
                .map(format_decimal)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            status: status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            ip: ip
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            total_online,
            important_down,
            device_summary,
        }
    }

    /// The ten ordered values the renderer lays out.
    pub fn render_values(&self) -> Vec<String> {
        vec![
            self.total_online.clone(),
            self.important_down.clone(),
            "Download:".to_string(),
            "Upload:".to_string(),
            format!("{} Mbps", self.download),
            format!("{} Mbps", self.upload),
            self.status.clone(),
            CONNECTION_ICON_MARKER.to_string(),
            self.ip.clone(),
            self.uptime.clone(),
        ]
    }
}
