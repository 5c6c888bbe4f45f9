//! # gardenhubd: gardenhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize tracing, the `SQLite` connection pool and migrations
//! - Seed the device registry from the config file
//! - Build the pipeline: state cache, dispatcher, automation engine, ingestor
//! - Start the MQTT bridge, the telemetry writer and the advisory job
//! - Share one advisor client between the advisory job and the chat endpoint
//! - Serve the HTTP API until Ctrl-C / SIGTERM, then stop background tasks
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use gardenhub_adapter_advisor_http::{FixedWeather, HttpAdvisor};
use gardenhub_adapter_http_axum::router;
use gardenhub_adapter_http_axum::state::AppState;
use gardenhub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteDeviceRepository, SqliteTelemetrySink,
    SqliteThresholdRuleRepository,
};
use gardenhub_app::advisory_job::AdvisoryJob;
use gardenhub_app::automation_engine::AutomationEngine;
use gardenhub_app::broadcaster::InProcessBroadcaster;
use gardenhub_app::command_dispatcher::CommandDispatcher;
use gardenhub_app::ingest::Ingestor;
use gardenhub_app::services::chat_service::ChatService;
use gardenhub_app::services::command_service::CommandService;
use gardenhub_app::services::device_service::DeviceService;
use gardenhub_app::services::threshold_service::ThresholdService;
use gardenhub_app::state_cache::StateCache;
use gardenhub_app::telemetry_recorder::TelemetryRecorder;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();
    tracing::info!("database ready");

    // Repositories
    let devices = Arc::new(SqliteDeviceRepository::new(pool.clone()));
    let rules = Arc::new(SqliteThresholdRuleRepository::new(pool.clone()));
    let telemetry = SqliteTelemetrySink::new(pool);

    let device_service = DeviceService::new(Arc::clone(&devices));
    for device in config.seed_devices()? {
        device_service.register_device(device).await?;
    }

    // Pipeline
    let updates = Arc::new(InProcessBroadcaster::new(config.automation.broadcast_capacity));
    let (transport, bridge) = gardenhub_adapter_mqtt::connect(&config.mqtt);
    let dispatcher = Arc::new(
        CommandDispatcher::new(
            Arc::new(StateCache::new()),
            transport,
            Arc::clone(&updates),
            config.mqtt.namespace.clone(),
        )
        .with_publish_timeout(config.automation.publish_timeout()),
    );
    let engine = Arc::new(AutomationEngine::new(Arc::clone(&rules), dispatcher));
    let commands = Arc::new(CommandService::new(Arc::clone(&devices), Arc::clone(&engine)));

    let (recorder, telemetry_worker) =
        TelemetryRecorder::spawn(telemetry, config.automation.telemetry_queue_capacity);
    let ingestor = Arc::new(
        Ingestor::new(config.mqtt.namespace.clone(), Arc::clone(&updates), engine)
            .with_recorder(recorder),
    );
    let bridge_task = tokio::spawn(bridge.run(ingestor));

    // Advisor: scheduled job and on-demand chat
    let advisor = Arc::new(HttpAdvisor::new(&config.advisory.advisor)?);
    let chat = Arc::new(ChatService::new(
        Arc::clone(&advisor),
        FixedWeather,
        Arc::clone(&devices),
        Arc::clone(&commands),
        Arc::clone(&updates),
        config.advisory.chat_config(),
    ));
    let advisory_tasks = if config.advisory.enabled {
        let job = Arc::new(AdvisoryJob::new(
            advisor,
            FixedWeather,
            Arc::clone(&devices),
            Arc::clone(&commands),
            Arc::clone(&updates),
            config.advisory.job_config(),
        ));
        job.start(config.advisory.device_ids()?).await?
    } else {
        tracing::info!("advisory job disabled");
        Vec::new()
    };

    // HTTP
    let state = AppState::new(
        device_service,
        ThresholdService::new(rules),
        commands,
        chat,
        updates,
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "gardenhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in advisory_tasks {
        task.abort();
    }
    bridge_task.abort();
    // dropping the bridge drops the last recorder handle; the worker then drains and exits
    let _ = bridge_task.await;
    let _ = telemetry_worker.await;
    tracing::info!("gardenhubd stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
