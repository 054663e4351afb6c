//! Timer Bell - A local countdown-timer service
//!
//! This is the main entry point for the timer-bell application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use timer_bell::{
    api::create_router,
    config::Config,
    services::{storage::open_store, CommandBackend, DesktopNotifier, SoundSearch},
    state::{Adapters, AppState},
    tasks::countdown_ticker_task,
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_bell={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-bell server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, player={:?}, notifications={}",
        config.host, config.port, config.player, config.notifications
    );

    let audio = CommandBackend::new(&config.player)?;
    let sound_search = SoundSearch::new(config.freesound_token.clone());
    if !sound_search.is_available() {
        warn!("No Freesound token configured, sound search disabled");
    }

    // Create application state
    let adapters = Adapters {
        store: open_store(config.store.clone()),
        notifier: Arc::new(DesktopNotifier::new(config.notifications)),
        audio: Arc::new(audio),
        sound_search,
        clock: Arc::new(SystemClock),
    };
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.grace(),
        adapters,
    ));

    // Start the shared countdown clock
    let ticker_state = Arc::clone(&state);
    tokio::spawn(async move {
        countdown_ticker_task(ticker_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /timers                 - Start a timer");
    info!("  GET    /timers                 - List timers");
    info!("  POST   /timers/:id/pause|resume|toggle|stop");
    info!("  POST   /timers/:id/save        - Save timer as preset");
    info!("  GET    /presets                - List presets");
    info!("  POST   /presets/:id/start      - Start timer from preset");
    info!("  POST   /sounds?name=           - Upload a sound");
    info!("  DELETE /sounds/:id             - Forget an uploaded sound");
    info!("  GET    /sounds/search?q=       - Search remote sounds");
    info!("  POST   /sounds/preview         - Play a search result");
    info!("  DELETE /alarm                  - Silence the alarm");
    info!("  GET    /settings               - Current settings");
    info!("  GET    /status                 - Service status");
    info!("  GET    /health                 - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.silence_alarm() {
        warn!("Failed to release alarm on shutdown: {}", e);
    }
    info!("Server shutdown complete");
    Ok(())
}
