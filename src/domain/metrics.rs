// Agent metric domain models

/// Bytes per second in one megabit per second, as the upstream API reports it.
pub const BYTES_PER_MBPS: f64 = 1_000_000.0;

/// Most recent speed test result, already converted to Mbps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

impl SpeedSample {
    pub fn from_bytes_per_sec(download: f64, upload: f64) -> Self {
        Self {
            download_mbps: to_mbps(download),
            upload_mbps: to_mbps(upload),
        }
    }
}

/// Connectivity of the monitoring agent as reported by `status.value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    Online,
    Offline,
    Other(String),
}

impl AgentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentStatus::Online => "ONLINE",
            AgentStatus::Offline => "OFFLINE",
            AgentStatus::Other(value) => value,
        }
    }
}

impl From<String> for AgentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ONLINE" => AgentStatus::Online,
            "OFFLINE" => AgentStatus::Offline,
            _ => AgentStatus::Other(value),
        }
    }
}

pub fn to_mbps(bytes_per_sec: f64) -> f64 {
    round2(bytes_per_sec / BYTES_PER_MBPS)
}

/// Round to two decimals, ties away from zero on the binary value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shortest decimal form that always keeps a fractional digit (`2.0`, `0.5`, `99.99`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
