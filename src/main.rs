mod bootstrap;

use crate::bootstrap::{config, logging, router, server};
use anyhow::Result;
use attic_api::AppState;
use attic_events::{AppEvent, EventBus};
use attic_storage::select_backend;

#[tokio::main]
async fn main() -> Result<()> {
    logging::initialize();

    let events = EventBus::new(false);
    events.emit(AppEvent::Starting);

    let config_path = std::env::var("ATTIC_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = config::load(&config_path, &events).await?;

    // Chosen once; every handler shares this handle for the life of the process
    let storage = select_backend(&config.storage).await.map_err(|e| {
        events.emit(AppEvent::Error {
            context: "Storage initialization failed".to_string(),
            error: e.to_string(),
        });
        e
    })?;

    let location = match storage.local_root() {
        Some(root) => root.display().to_string(),
        None => config.storage.remote.bucket().unwrap_or_default().to_string(),
    };
    events.emit(AppEvent::StorageReady {
        backend: storage.kind().to_string(),
        location,
    });

    let app_state = AppState::new(storage, config.server.streaming_threshold_mb);
    if app_state.serves_files() {
        events.emit(AppEvent::FileRouteMounted {
            prefix: config.storage.local.url_prefix.clone(),
        });
    }

    let app = router::build(&config, app_state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = server::bind(&addr).await?;

    events.emit(AppEvent::Ready {
        addr,
        base_url: config.server.base_url.clone(),
    });

    axum::serve(listener, app.into_make_service())
        .tcp_nodelay(config.server.tcp_nodelay)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    events.emit(AppEvent::Shutdown);
    Ok(())
}
