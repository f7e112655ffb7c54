use mcq_practice_backend::{
    config::{get_config, init_config},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;
    init_tracing(config.log_json);

    let app_state = AppState::new(config)?;

    for topic in &config.warmup_topics {
        let scheduled = app_state
            .question_buffer
            .warm_up(topic, app_state.generator.clone());
        info!(topic = %topic, scheduled, "Warm-up refill scheduled");
    }

    let settings = app_state.question_buffer.settings();
    info!(
        capacity = settings.capacity,
        low_water_mark = settings.low_water_mark,
        model = %config.llm_model,
        "Question buffer ready"
    );

    let app = routes::app(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
