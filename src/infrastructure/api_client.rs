// Monitoring API client - fetches agent metrics over HTTP
use crate::application::metrics_source::MetricsSource;
use crate::domain::device::DeviceRecord;
use crate::domain::metrics::{round2, AgentStatus, SpeedSample};
use crate::infrastructure::config::ApiConfig;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Window the uptime percentage is computed over.
const UPTIME_WINDOW_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("API key, agent ID or API URL not configured")]
    Unconfigured,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no {0}")]
    Empty(&'static str),
}

/// Numbers show up both as JSON numbers and as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpeedEntry {
    #[serde(default)]
    values: Vec<Numeric>,
}

#[derive(Debug, Deserialize)]
struct UptimeResponse {
    uptime: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
struct AgentResponse {
    status: Option<AgentStatusField>,
}

#[derive(Debug, Deserialize)]
struct AgentStatusField {
    value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    api: ApiConfig,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(api: ApiConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { api, client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        suffix: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        if !self.api.is_complete() {
            return Err(FetchError::Unconfigured);
        }

        let url = format!("{}{}", self.api.agent_base_url(), suffix);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("X-Api-Key", &self.api.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn try_fetch_speeds(&self) -> Result<SpeedSample, FetchError> {
        let history: Vec<SpeedEntry> = self.get_json("/history/network/speed", &[]).await?;
        latest_speed(&history)
    }

    pub async fn try_fetch_uptime(&self) -> Result<f64, FetchError> {
        let from = uptime_window_start(Utc::now());
        let response: UptimeResponse = self
            .get_json("/uptime", &[("from", from.to_string())])
            .await?;
        response
            .uptime
            .and_then(|u| u.as_f64())
            .map(round2)
            .ok_or(FetchError::Empty("uptime"))
    }

    pub async fn try_fetch_status(&self) -> Result<AgentStatus, FetchError> {
        let response: AgentResponse = self.get_json("", &[]).await?;
        response
            .status
            .and_then(|s| s.value)
            .map(AgentStatus::from)
            .ok_or(FetchError::Empty("status.value"))
    }

    pub async fn try_fetch_devices(&self) -> Result<Vec<DeviceRecord>, FetchError> {
        self.get_json("/device", &[]).await
    }
}

/// Unix seconds for the start of the uptime window ending at `now`.
pub fn uptime_window_start(now: DateTime<Utc>) -> i64 {
    (now - ChronoDuration::days(UPTIME_WINDOW_DAYS)).timestamp()
}

/// The last history entry is the most recent; its values are download then upload, in bytes/sec.
fn latest_speed(history: &[SpeedEntry]) -> Result<SpeedSample, FetchError> {
    let latest = history.last().ok_or(FetchError::Empty("speed samples"))?;
    match latest.values.as_slice() {
        [down, up, ..] => match (down.as_f64(), up.as_f64()) {
            (Some(down), Some(up)) => Ok(SpeedSample::from_bytes_per_sec(down, up)),
            _ => Err(FetchError::Empty("numeric speed values")),
        },
        _ => Err(FetchError::Empty("download and upload values")),
    }
}

fn settle<T>(endpoint: &str, result: Result<T, FetchError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{} unavailable: {}", endpoint, e);
            None
        }
    }
}

#[async_trait]
impl MetricsSource for ApiClient {
    async fn fetch_speeds(&self) -> Option<SpeedSample> {
        settle("Speed history", self.try_fetch_speeds().await)
    }

    async fn fetch_uptime(&self) -> Option<f64> {
        settle("Uptime", self.try_fetch_uptime().await)
    }

    async fn fetch_status(&self) -> Option<AgentStatus> {
        settle("Agent status", self.try_fetch_status().await)
    }

    async fn fetch_devices(&self) -> Option<Vec<DeviceRecord>> {
        settle("Device list", self.try_fetch_devices().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::snapshot_service::SnapshotService;
    use crate::application::snapshot_service::tests::FixedAddress;
    use crate::presentation::plane::Plane;
    use crate::presentation::renderer::{
        status_plane, PlaneKind, RenderFields, Renderer, PANEL_HEIGHT, PANEL_WIDTH,
    };
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    const AGENT_PATH: &str = "/public-api/v1/agent/y";

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("x")
            && headers.get("accept").and_then(|v| v.to_str().ok()) == Some("application/json")
    }

    async fn speed(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!([
            {"timestamp": "2024-01-01T00:00:00Z", "values": [1_000_000, 1_000_000]},
            {"timestamp": "2024-01-01T01:00:00Z", "values": [2_000_000, 500_000]}
        ]))
        .into_response()
    }

    async fn uptime(
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let has_window = query.get("from").is_some_and(|f| f.parse::<i64>().is_ok());
        if !authorized(&headers) || !has_window {
            return StatusCode::BAD_REQUEST.into_response();
        }
        Json(json!({"uptime": 99.995})).into_response()
    }

    async fn agent(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!({"id": 1, "status": {"value": "ONLINE"}})).into_response()
    }

    async fn devices(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!([
            {
                "id": 5,
                "status": "DOWN",
                "protocol": "IP",
                "importance": "VITAL",
                "display_name": "NAS"
            }
        ]))
        .into_response()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn healthy_upstream() -> String {
        serve(
            Router::new()
                .route(&format!("{}/history/network/speed", AGENT_PATH), get(speed))
                .route(&format!("{}/uptime", AGENT_PATH), get(uptime))
                .route(AGENT_PATH, get(agent))
                .route(&format!("{}/device", AGENT_PATH), get(devices)),
        )
        .await
    }

    fn client(api_url: &str) -> ApiClient {
        ApiClient::new(ApiConfig::new("x", "y", api_url), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_uptime_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap().timestamp();
        assert_eq!(uptime_window_start(now), expected);
    }

    #[test]
    fn test_latest_speed_uses_last_entry() {
        let history: Vec<SpeedEntry> = serde_json::from_value(json!([
            {"values": [1, 1]},
            {"values": ["125000000", 62500000.0]}
        ]))
        .unwrap();

        let sample = latest_speed(&history).unwrap();
        assert_eq!(sample.download_mbps, 125.0);
        assert_eq!(sample.upload_mbps, 62.5);
    }

    #[test]
    fn test_latest_speed_rejects_empty_or_short() {
        assert!(matches!(latest_speed(&[]), Err(FetchError::Empty(_))));

        let short: Vec<SpeedEntry> = serde_json::from_value(json!([{"values": [10]}])).unwrap();
        assert!(matches!(latest_speed(&short), Err(FetchError::Empty(_))));

        let text: Vec<SpeedEntry> =
            serde_json::from_value(json!([{"values": ["fast", 1]}])).unwrap();
        assert!(latest_speed(&text).is_err());
    }

    #[tokio::test]
    async fn test_fetches_against_upstream() {
        let client = client(&healthy_upstream().await);

        let speeds = client.fetch_speeds().await.unwrap();
        assert_eq!(speeds, SpeedSample { download_mbps: 2.0, upload_mbps: 0.5 });
        assert_eq!(client.fetch_uptime().await, Some(100.0));
        assert_eq!(client.fetch_status().await, Some(AgentStatus::Online));

        let devices = client.fetch_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].display_name.as_deref(), Some("NAS"));
    }

    #[tokio::test]
    async fn test_wrong_key_is_absent() {
        let url = healthy_upstream().await;
        let client =
            ApiClient::new(ApiConfig::new("wrong", "y", url), Duration::from_secs(5)).unwrap();

        assert!(matches!(
            client.try_fetch_status().await,
            Err(FetchError::Status(code)) if code == StatusCode::UNAUTHORIZED
        ));
        assert!(client.fetch_devices().await.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_short_circuits() {
        let api = ApiConfig::new("", "y", "http://127.0.0.1:9");
        let client = ApiClient::new(api, Duration::from_secs(1)).unwrap();

        assert!(matches!(client.try_fetch_speeds().await, Err(FetchError::Unconfigured)));
        assert!(client.fetch_uptime().await.is_none());
        assert!(client.fetch_status().await.is_none());
        assert!(client.fetch_devices().await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_responses_are_absent() {
        let speed_path = format!("{}/history/network/speed", AGENT_PATH);
        let url = serve(
            Router::new()
                .route(
                    &format!("{}/device", AGENT_PATH),
                    get(|| async { "<html>maintenance</html>" }),
                )
                .route(
                    &format!("{}/uptime", AGENT_PATH),
                    get(|| async { Json(json!({"percent": 12})) }),
                )
                .route(AGENT_PATH, get(|| async { Json(json!({"status": {}})) }))
                .route(&speed_path, get(|| async { Json(json!([])) })),
        )
        .await;
        let client = client(&url);

        assert!(matches!(client.try_fetch_devices().await, Err(FetchError::Decode(_))));
        assert!(matches!(client.try_fetch_uptime().await, Err(FetchError::Empty("uptime"))));
        assert!(matches!(client.try_fetch_status().await, Err(FetchError::Empty(_))));
        assert!(client.fetch_speeds().await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_absent() {
        let url = serve(Router::new().route(
            AGENT_PATH,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"status": {"value": "ONLINE"}}))
            }),
        ))
        .await;
        let client =
            ApiClient::new(ApiConfig::new("x", "y", url), Duration::from_millis(200)).unwrap();

        assert!(matches!(client.try_fetch_status().await, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_absent() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{}", addr));
        assert!(client.fetch_speeds().await.is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_snapshot_and_render() {
        let client = client(&healthy_upstream().await);
        let service = SnapshotService::new(Arc::new(client), Arc::new(FixedAddress(None)));

        let snapshot = service.build_snapshot().await;
        let fields = RenderFields::from_values(snapshot.render_values());
        assert_eq!(fields.download, "2.0 Mbps");
        assert_eq!(fields.upload, "0.5 Mbps");
        assert_eq!(fields.uptime, "100.0");
        assert_eq!(fields.status, "ONLINE");
        assert_eq!(fields.important_down, "1");
        assert_eq!(fields.ip, "UNKNOWN");
        assert_eq!(status_plane(&fields.status), PlaneKind::Black);

        let mut black = Plane::new(PANEL_WIDTH, PANEL_HEIGHT);
        let mut highlight = Plane::new(PANEL_WIDTH, PANEL_HEIGHT);
        Renderer::default().render(&fields, &mut black, &mut highlight);
        assert_ne!(black, Plane::new(PANEL_WIDTH, PANEL_HEIGHT));
        assert_ne!(highlight, Plane::new(PANEL_WIDTH, PANEL_HEIGHT));
    }
}
