//! ExamDesk binary entry point

use examdesk::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interval between sweeps of expired login throttle entries
const THROTTLE_PRUNE_INTERVAL_SECS: u64 = 300;

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging from the logging section
/// 3. Initialize AppState
/// 4. Build Axum router
/// 5. Start background tasks (login throttle pruning)
/// 6. Start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging, RUST_LOG overrides logging.level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter_directives().into());

    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting ExamDesk...");
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        database = %config.database.path.display(),
        "Configuration loaded"
    );
    config.log_startup_warnings();

    // 3. Initialize metrics
    examdesk::metrics::init_metrics();

    // 4. Initialize application state
    let state = AppState::new(config.clone()).await?;

    // 5. Build Axum router
    let app = examdesk::build_router(state.clone());

    // 6. Start background tasks
    spawn_throttle_prune_task(state.clone());

    // 7. Start HTTP server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", config.server.base_url());

    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn background task dropping expired login throttle entries
fn spawn_throttle_prune_task(state: AppState) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(THROTTLE_PRUNE_INTERVAL_SECS));

        // Consume the immediate first tick.
        interval.tick().await;

        loop {
            interval.tick().await;
            state.login_throttle.prune_old().await;
        }
    });

    tracing::info!("Login throttle prune task spawned");
}
