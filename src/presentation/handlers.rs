// HTTP request handlers for the settings form
use crate::infrastructure::config::{merge_credentials, read_credentials_object, ApiConfig};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub api_key: String,
    pub agent_id: String,
    pub api_url: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(settings_page))
        .route("/update_config", post(update_config))
        .route("/healthz", get(health_check))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Form pre-filled with the current credentials
pub async fn settings_page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let object = match read_credentials_object(&state.credentials_path).await {
        Ok(object) => object,
        Err(e) => {
            tracing::warn!("Showing empty settings form: {:#}", e);
            Default::default()
        }
    };
    let field = |key: &str| {
        object
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Html(settings_html(&field("api_key"), &field("agent_id"), &field("api_url")))
}

/// Merge the submitted credentials into the file. Takes effect on the next panel restart.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> impl IntoResponse {
    let api = ApiConfig::new(form.api_key.trim(), form.agent_id.trim(), form.api_url.trim());

    match merge_credentials(&state.credentials_path, &api).await {
        Ok(()) => {
            tracing::info!("Credentials updated in {}", state.credentials_path.display());
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::error!("Error saving credentials: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Could not save configuration").into_response()
        }
    }
}

fn settings_html(api_key: &str, agent_id: &str, api_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Rack Panel Settings</title></head>
<body>
<h1>Rack Panel Settings</h1>
<form method="post" action="/update_config">
  <label>API Key <input type="text" name="api_key" value="{}"></label><br>
  <label>Agent ID <input type="text" name="agent_id" value="{}"></label><br>
  <label>API URL <input type="text" name="api_url" value="{}"></label><br>
  <button type="submit">Save</button>
</form>
<p>Changes are picked up the next time the panel service starts.</p>
</body>
</html>
"#,
        escape_attr(api_key),
        escape_attr(agent_id),
        escape_attr(api_url)
    )
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::read_api_config;

    async fn serve(state: Arc<AppState>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a"b<c>&'"#), "a&quot;b&lt;c&gt;&amp;&#39;");
    }

    #[tokio::test]
    async fn test_form_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updateScreen.conf");
        std::fs::write(
            &path,
            r#"{"api_key": "old-key", "agent_id": "1", "api_url": "http://old"}"#,
        )
        .unwrap();
        let base = serve(Arc::new(AppState { credentials_path: path.clone() })).await;
        let client = reqwest::Client::new();

        let page = client.get(&base).send().await.unwrap().text().await.unwrap();
        assert!(page.contains(r#"value="old-key""#));

        let response = client
            .post(format!("{}/update_config", base))
            .form(&[
                ("api_key", " new-key "),
                ("agent_id", "99"),
                ("api_url", "https://api.example.com/"),
            ])
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert!(response.text().await.unwrap().contains(r#"value="new-key""#));

        assert_eq!(
            read_api_config(&path).unwrap(),
            ApiConfig::new("new-key", "99", "https://api.example.com")
        );
    }

    #[tokio::test]
    async fn test_missing_file_shows_empty_form() {
        let dir = tempfile::tempdir().unwrap();
        let base = serve(Arc::new(AppState {
            credentials_path: dir.path().join("absent.conf"),
        }))
        .await;

        let page = reqwest::get(&base).await.unwrap().text().await.unwrap();
        assert!(page.contains(r#"name="api_key" value="""#));
        let health = reqwest::get(format!("{}/healthz", base)).await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");
    }
}
