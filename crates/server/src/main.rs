use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderline_core::{
    create_counter, create_queue, load_config, validate_config, CounterRegistry, CounterStore,
    DeadLetterHandler, FulfillmentWorker, OrderStore, SimulatedFulfillment, SqliteCounterStore,
    SqliteOrderStore,
};

use orderline_server::api::create_router;
use orderline_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("ORDERLINE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Create SQLite order store
    let order_store: Arc<dyn OrderStore> = Arc::new(
        SqliteOrderStore::new(&config.database.path).context("Failed to create order store")?,
    );
    info!("Order store initialized");

    // Create SQLite counter store
    let counter_store: Arc<dyn CounterStore> = Arc::new(
        SqliteCounterStore::new(&config.database.path)
            .context("Failed to create counter store")?,
    );
    info!("Counter store initialized");

    // Spawn the counter actor and register it under its logical name
    let (counter_handle, counter_actor) = create_counter(
        config.counter.name.clone(),
        counter_store,
        config.counter.command_buffer,
    );
    tokio::spawn(counter_actor.run());

    let counter_registry = CounterRegistry::new();
    counter_registry.register(config.counter.name.clone(), counter_handle.clone());
    info!("Counter actor '{}' registered", config.counter.name);

    // Create the fulfillment worker and start the queue
    let action = Arc::new(SimulatedFulfillment::new(&config.fulfillment));
    let worker = FulfillmentWorker::new(Arc::clone(&order_store), action)
        .with_counter(counter_handle.clone());

    let (producer, queue_runner, dead_letter_rx) =
        create_queue(config.queue.clone(), Arc::new(worker));
    let queue_handle = tokio::spawn(queue_runner.run());

    let dead_letter_handler = DeadLetterHandler::new(
        dead_letter_rx,
        Arc::clone(&order_store),
        config.queue.dead_letter_name.clone(),
    );
    let dead_letter_handle = tokio::spawn(dead_letter_handler.run());
    info!("Fulfillment queue started");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        order_store,
        counter_registry,
        producer,
    ));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Drop the remaining producer so the queue runner drains and exits, then
    // wait for in-flight batches and dead letters to settle.
    drop(state);
    let _ = queue_handle.await;
    let _ = dead_letter_handle.await;
    info!("Fulfillment queue stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
