// Monitored device inventory and its summary counters
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Protocol value carried by cluster placeholder entries.
pub const CLUSTER_PROTOCOL: &str = "CLUSTER";

/// Device identifiers arrive as numbers from some API versions and strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum DeviceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceId::Number(n) => write!(f, "{}", n),
            DeviceId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DeviceStatus {
    Online,
    Offline,
    Down,
    Other(String),
}

impl From<String> for DeviceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ONLINE" => DeviceStatus::Online,
            "OFFLINE" => DeviceStatus::Offline,
            "DOWN" => DeviceStatus::Down,
            _ => DeviceStatus::Other(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Importance {
    Vital,
    Floating,
    Other(String),
}

impl From<String> for Importance {
    fn from(value: String) -> Self {
        match value.as_str() {
            "VITAL" => Importance::Vital,
            "FLOATING" => Importance::Floating,
            _ => Importance::Other(value),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    #[serde(default)]
    pub main_id: Option<DeviceId>,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl DeviceRecord {
    pub fn is_cluster(&self) -> bool {
        self.protocol.as_deref() == Some(CLUSTER_PROTOCOL)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Length of the raw inventory, duplicates and cluster entries included.
    pub total_devices: usize,
    pub total_online: usize,
    pub important_total: usize,
    pub important_down: usize,
    pub common_total: usize,
    pub common_down: usize,
}

/// Result of one aggregation pass. `reachable` lists the ONLINE/OFFLINE devices that were counted.
#[derive(Debug, Clone)]
pub struct DeviceAggregate<'a> {
    pub summary: DeviceSummary,
    pub reachable: Vec<&'a DeviceRecord>,
}

/// Deduplicate by `main_id`, drop cluster entries, then tally importance tiers and reachability.
///
/// Rules are applied per device in this order:
/// 1. a `main_id` already seen skips the device; a new one is recorded
/// 2. devices without a status are skipped
/// 3. `CLUSTER` protocol devices are skipped
/// 4. VITAL / FLOATING tallies, with `DOWN` feeding the down counters
/// 5. ONLINE / OFFLINE devices feed `total_online`
pub fn aggregate(devices: &[DeviceRecord]) -> DeviceAggregate<'_> {
    let mut summary = DeviceSummary {
        total_devices: devices.len(),
        ..DeviceSummary::default()
    };
    let mut seen_main_ids: HashSet<&DeviceId> = HashSet::new();
    let mut reachable = Vec::new();

    for device in devices {
        if let Some(main_id) = &device.main_id {
            if !seen_main_ids.insert(main_id) {
                continue;
            }
        }

        let Some(status) = &device.status else {
            continue;
        };

        if device.is_cluster() {
            continue;
        }

        let is_down = *status == DeviceStatus::Down;
        match device.importance {
            Some(Importance::Vital) => {
                summary.important_total += 1;
                if is_down {
                    summary.important_down += 1;
                }
            }
            Some(Importance::Floating) => {
                summary.common_total += 1;
                if is_down {
                    summary.common_down += 1;
                }
            }
            _ => {}
        }

        // DOWN is tallied above and never here; the upstream contract does not say
        // whether it is distinct from OFFLINE, so both paths stay independent.
        if matches!(status, DeviceStatus::Online | DeviceStatus::Offline) {
            tracing::debug!(
                "Reachable device: {} ({})",
                device.display_name.as_deref().unwrap_or_default(),
                device.id
            );
            summary.total_online += 1;
            reachable.push(device);
        }
    }

    DeviceAggregate { summary, reachable }
}
