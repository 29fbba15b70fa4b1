//! tuya-vpd-monitor - VPD monitor and switch controller
//!
//! Polls a Tuya temperature/humidity sensor through the signed cloud
//! OpenAPI, records VPD samples, serves them over HTTP and drives an
//! on/off switch with a hysteresis control loop.

mod api;
mod config;
mod control;
mod db;
mod error;
mod models;
mod recorder;
mod state;
mod tuya;
mod vpd;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::control::ControlLoop;
use crate::recorder::SampleRecorder;
use crate::state::AppState;
use crate::tuya::{AuthTokenProvider, CloudTransport, Credentials, HttpTransport, SignedApiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuya_vpd_monitor=info,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Starting tuya-vpd-monitor...");

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!("Configuration loaded");

    // Cloud API stack: transport -> token provider -> signed client
    let transport: Arc<dyn CloudTransport> = Arc::new(HttpTransport::new(
        &config.tuya.base_url,
        Duration::from_secs(config.tuya.request_timeout_secs),
    )?);
    let tokens = Arc::new(
        AuthTokenProvider::new(
            Credentials::new(&config.tuya.client_id, &config.tuya.client_secret),
            transport.clone(),
        )
        .with_refresh_margin(Duration::from_secs(config.tuya.token_refresh_margin_secs)),
    );
    let client = Arc::new(SignedApiClient::new(tokens, transport));
    tracing::info!("Tuya client ready ({})", config.tuya.base_url);

    // Thresholds are validated here, before anything runs
    let control = Arc::new(ControlLoop::new(
        client.clone(),
        &config.devices,
        &config.control,
    )?);

    let samples = db::connect(&config).await?;

    let app_state = AppState {
        client: client.clone(),
        control: control.clone(),
        samples: samples.clone(),
        sensor_id: config.devices.sensor_id.clone(),
        switch_id: config.devices.switch_id.clone(),
        start_time: std::time::Instant::now(),
    };

    // Background tasks
    if config.control.enabled {
        tokio::spawn(async move {
            control.start().await;
        });
    } else {
        tracing::info!("Control loop disabled");
    }

    if config.recorder.enabled {
        let recorder = Arc::new(SampleRecorder::new(
            client,
            samples,
            config.devices.sensor_id.clone(),
            Duration::from_secs(config.recorder.interval_secs.max(1)),
        ));
        tokio::spawn(async move {
            recorder.start().await;
        });
    }

    tracing::info!("Background tasks started");

    // Build router with static dashboard fallback
    let app = api::routes()
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
