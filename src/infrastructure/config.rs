use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credentials for the upstream monitoring API, read from the JSON credentials file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub api_url: String,
}

impl ApiConfig {
    pub fn new(
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// All three values present; otherwise every fetch is skipped.
    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty()
            && !self.agent_id.trim().is_empty()
            && !self.api_url.trim().is_empty()
    }

    /// `{api_url}/public-api/v1/agent/{agent_id}`
    pub fn agent_base_url(&self) -> String {
        format!("{}/public-api/v1/agent/{}", self.api_url, self.agent_id)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PanelConfig {
    pub credentials_path: PathBuf,
    pub interface: String,
    pub request_timeout_secs: u64,
    pub warmup_secs: u64,
    pub interval_secs: u64,
    pub assets: AssetSettings,
    pub display: DisplaySettings,
    pub settings: SettingsServer,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetSettings {
    pub black_background: PathBuf,
    pub highlight_background: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplaySettings {
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SettingsServer {
    pub enabled: bool,
    pub bind: String,
}

impl PanelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Panel settings from the optional `config/panel` file and `RACK_PANEL__*` env overrides.
pub fn load_panel_config() -> anyhow::Result<PanelConfig> {
    let settings = panel_defaults()?
        .add_source(config::File::with_name("config/panel").required(false))
        .add_source(config::Environment::with_prefix("RACK_PANEL").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn panel_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("credentials_path", "updateScreen.conf")?
        .set_default("interface", "wlan0")?
        .set_default("request_timeout_secs", 10)?
        .set_default("warmup_secs", 60)?
        .set_default("interval_secs", 1740)?
        .set_default("assets.black_background", "images/domotz_b.bmp")?
        .set_default("assets.highlight_background", "images/domotz_r.bmp")?
        .set_default("display.output_dir", "frames")?
        .set_default("settings.enabled", true)?
        .set_default("settings.bind", "0.0.0.0:5000")?)
}

/// Read the JSON credentials file.
pub fn read_api_config(path: &Path) -> anyhow::Result<ApiConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Json))
        .build()?;

    let raw: ApiConfig = settings.try_deserialize()?;
    Ok(ApiConfig::new(raw.api_key, raw.agent_id, raw.api_url))
}

/// Like [`read_api_config`], but a missing or unreadable file only leaves the panel unconfigured.
pub fn load_api_config(path: &Path) -> ApiConfig {
    match read_api_config(path) {
        Ok(api) => {
            if !api.is_complete() {
                tracing::warn!(
                    "API key, agent ID or API URL missing from {}; metrics will be unavailable",
                    path.display()
                );
            }
            api
        }
        Err(e) => {
            tracing::warn!("Could not load credentials from {}: {:#}", path.display(), e);
            ApiConfig::default()
        }
    }
}

/// Raw JSON object in the credentials file; a missing file reads as empty.
pub async fn read_credentials_object(path: &Path) -> anyhow::Result<Map<String, Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("{} is not a JSON object", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Merge the three credential keys into the file, keeping any other keys, and rewrite it.
pub async fn merge_credentials(path: &Path, api: &ApiConfig) -> anyhow::Result<()> {
    let mut object = read_credentials_object(path).await?;
    object.insert("api_key".to_string(), Value::String(api.api_key.clone()));
    object.insert("agent_id".to_string(), Value::String(api.agent_id.clone()));
    object.insert("api_url".to_string(), Value::String(api.api_url.clone()));

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    object.serialize(&mut serializer)?;

    tokio::fs::write(path, buffer)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
