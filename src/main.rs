// Main entry point - Dependency injection and refresh loop startup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::refresh_loop::{RefreshLoop, RefreshSchedule};
use crate::application::snapshot_service::SnapshotService;
use crate::infrastructure::api_client::ApiClient;
use crate::infrastructure::config::{load_api_config, load_panel_config, PanelConfig};
use crate::infrastructure::display::{BackgroundArt, EpaperDisplay, PreviewDisplay};
use crate::infrastructure::local_address::InterfaceResolver;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;
use crate::presentation::renderer::{Fonts, Renderer, PANEL_HEIGHT, PANEL_WIDTH};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration; credentials are read once and never reloaded
    let panel = load_panel_config()?;
    let api = load_api_config(&panel.credentials_path);

    if panel.settings.enabled {
        if let Err(e) = spawn_settings_server(&panel).await {
            tracing::error!("Settings form unavailable: {:#}", e);
        }
    }

    // Metric sources (infrastructure layer)
    let metrics = Arc::new(ApiClient::new(api, panel.request_timeout())?);
    let resolver = Arc::new(InterfaceResolver::new(panel.interface.clone()));

    // Refresh cycle (application layer)
    let snapshots = SnapshotService::new(metrics, resolver);
    let background = BackgroundArt::new(
        panel.assets.black_background.clone(),
        panel.assets.highlight_background.clone(),
        PANEL_WIDTH,
        PANEL_HEIGHT,
    );
    let schedule = RefreshSchedule {
        warmup: panel.warmup(),
        interval: panel.interval(),
    };
    let renderer = Renderer::new(Fonts::default());
    let refresh = RefreshLoop::new(snapshots, renderer, background, schedule);

    let output_dir = panel.display.output_dir.clone();
    refresh
        .run(
            move || {
                let display = PreviewDisplay::new(output_dir, PANEL_WIDTH, PANEL_HEIGHT)?;
                Ok(Box::new(display) as Box<dyn EpaperDisplay>)
            },
            shutdown_signal(),
        )
        .await?;

    Ok(())
}

async fn spawn_settings_server(panel: &PanelConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        credentials_path: panel.credentials_path.clone(),
    });
    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&panel.settings.bind).await?;
    tracing::info!("Settings form listening on {}", listener.local_addr()?);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Settings server stopped: {}", e);
        }
    });
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
