//! Points ledger HTTP server binary

use points_ledger::Config;
use points_server::{bootstrap, router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration: POINTS_CONFIG file if set, env overrides on top
    let config = match std::env::var("POINTS_CONFIG") {
        Ok(path) => Config::from_file(path)?.with_env_overrides()?,
        Err(_) => Config::from_env()?,
    };

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_line_number(true)
            .with_env_filter(filter)
            .init();
    }

    info!(
        service = %config.service_name,
        version = %config.service_version,
        policy = %config.spend.policy,
        "Starting points server"
    );

    let points = bootstrap(&config).await?;
    let app = router(AppState {
        points: points.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Listening on: {}", config.listen_addr);
    info!("   GET  /payers/balances - All payer balances");
    info!("   GET  /payers/:payer_id/balances - One payer balance");
    info!("   GET  /payers?search= - List or search payers");
    info!("   POST /payers - Register payer");
    info!("   POST /purchases - Record purchase");
    info!("   POST /rewards/spend - Spend points");
    info!("   GET  /health - Health check");
    info!("   GET  /metrics - Prometheus metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Shutting down points server");
    points.shutdown().await?;
    Ok(())
}
