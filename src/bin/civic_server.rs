// src/bin/civic_server.rs

use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use civic_pulse_client::domain::provider::WalletProvider;
use civic_pulse_client::infra::{rpc, telemetry};
use civic_pulse_client::transport;
use civic_pulse_client::{
    CivicApp, ClientConfig, ContractResolver, NotificationBoard, ProviderBinding, RefreshTracker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    telemetry::init_tracing()?;
    let config = ClientConfig::from_env()?;

    // --- Wallet providers ---
    let providers = rpc::wallet_candidates(&config);
    let watchers: Vec<_> = providers
        .iter()
        .map(|p| p.clone().spawn_watcher(config.event_poll))
        .collect();
    for p in &providers {
        info!(kind = ?p.kind(), url = %p.url(), "wallet provider candidate");
    }
    let candidates: Vec<Arc<dyn WalletProvider>> = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn WalletProvider>)
        .collect();

    // --- Session ---
    let board = Arc::new(NotificationBoard::default());
    let refresh = Arc::new(RefreshTracker::default());
    let app = CivicApp::new(
        ProviderBinding::new(candidates),
        ContractResolver::from_path(config.manifest_path.clone()),
        Arc::new(rpc::contract_client(&config)),
        board.clone(),
        refresh.clone(),
    );
    let app = Arc::new(Mutex::new(app));

    // The pump starts regardless: it picks up the provider once any later init or connect binds one.
    match app.lock().await.init().await {
        Ok(()) => info!("session initialized"),
        Err(e) => warn!(error = %e, "session not initialized; POST /session/init to retry"),
    }
    let pump = CivicApp::spawn_event_pump(app.clone()).await;
    let snapshot = app.lock().await.watch_snapshot();

    let app_state = transport::http::AppState {
        app: app.clone(),
        snapshot,
        board,
        refresh,
    };

    // --- API Server ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let router = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.http_bind).await?;
    info!(addr = %listener.local_addr()?, "civic server listening");
    info!("Swagger UI available at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, router) => {
            if let Err(e) = result {
                error!(error = %e, "server stopped");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    for p in &providers {
        p.shutdown();
    }
    for w in watchers {
        let _ = w.await;
    }
    if let Some(pump) = pump {
        pump.abort();
    }
    info!("graceful shutdown complete");
    Ok(())
}
