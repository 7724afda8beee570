//! # Warreport Service
//!
//! Binary entry point for the battle-reporting daemon.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Wires the store, API client, and reconstruction engine
//! - Runs the three pipeline stages until shutdown

mod config;
mod notify;
mod shutdown;
mod stages;

use crate::config::AppConfig;
use crate::notify::{LogNotifier, Notifier, WebhookNotifier};
use crate::shutdown::{install_signal_handlers, ShutdownCoordinator};
use crate::stages::{DiscoveryStage, ReporterStage, WorkerStage};
use screeps_api::{ClientConfig, ScreepsApi, ScreepsClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warreport_core::{
    BattleCandidate, BattleStateStore, DiscoveryCursor, FinalizedBattleReport, IdentityResolver,
    ReconstructionEngine,
};
use warreport_storage::{keys, KeyValueStore, MemoryStore, RotatingQueue};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warreport_service=info,warreport_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting warreport");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order — later sources override earlier ones):
    //  1. /etc/warreport/service.yaml          — system-wide defaults
    //  2. ./config/service.yaml                — deployment-local override
    //  3. Path given by WARREPORT_CONFIG_FILE  — operator-specified file
    //  4. Environment variables prefixed WARREPORT__ (double-underscore
    //     separator), e.g. WARREPORT__DISCOVERY__POLL_INTERVAL_SECS=30
    //
    // Every field carries a serde default, so an unconfigured environment
    // runs with built-in defaults. A malformed file or an uncoercible
    // environment variable IS a hard error.
    // -------------------------------------------------------------------------
    let mut config_builder = ::config::Config::builder()
        .add_source(
            ::config::File::with_name("/etc/warreport/service")
                .required(false)
                .format(::config::FileFormat::Yaml),
        )
        .add_source(
            ::config::File::with_name("config/service")
                .required(false)
                .format(::config::FileFormat::Yaml),
        );

    if let Ok(explicit_path) = std::env::var("WARREPORT_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                ::config::File::with_name(&explicit_path)
                    .required(true)
                    .format(::config::FileFormat::Yaml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    let raw_config = match config_builder
        .add_source(::config::Environment::with_prefix("WARREPORT").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    let app_config: AppConfig = match raw_config.try_deserialize() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = app_config.validate() {
        error!(error = %e, "Configuration is invalid; aborting");
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Wire dependencies
    //
    // The store is the in-memory provider behind the KeyValueStore trait;
    // a Redis-backed provider slots in behind the same trait without
    // touching the pipeline. Queues, caches, and cursors all share it.
    // -------------------------------------------------------------------------
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let client_config = ClientConfig::default()
        .with_api_url(app_config.api.api_url.clone())
        .with_history_url(app_config.api.history_url.clone())
        .with_alliances_url(app_config.api.alliances_url.clone())
        .with_timeout(app_config.api.timeout());
    let api: Arc<dyn ScreepsApi> = match ScreepsClient::new(client_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to construct API client; aborting");
            std::process::exit(3);
        }
    };

    let identity = IdentityResolver::new(api.clone(), store.clone());
    let engine = ReconstructionEngine::new(api.clone(), identity);
    let cursor = DiscoveryCursor::new(store.clone());
    let states = BattleStateStore::new(store.clone());
    let processing: RotatingQueue<BattleCandidate> =
        RotatingQueue::new(store.clone(), &keys::processing_queue());
    let reporting: RotatingQueue<FinalizedBattleReport> =
        RotatingQueue::new(store.clone(), &keys::reporting_queue());

    let notifier: Arc<dyn Notifier> = match &app_config.reporter.webhook_url {
        Some(url) => match WebhookNotifier::new(url.clone(), app_config.api.timeout()) {
            Ok(notifier) => {
                info!("Publishing reports to configured webhook");
                Arc::new(notifier)
            }
            Err(e) => {
                error!(error = %e, "Failed to construct webhook notifier; aborting");
                std::process::exit(3);
            }
        },
        None => {
            warn!("No webhook configured; battle reports will go to the log");
            Arc::new(LogNotifier)
        }
    };

    let shutdown = ShutdownCoordinator::new();
    install_signal_handlers(shutdown.clone());

    // -------------------------------------------------------------------------
    // Run the pipeline
    //
    // The three stages are independent tasks sharing only the queues and
    // the shutdown signal. A stage returning before shutdown was triggered
    // means something is wrong with the process; take the whole service
    // down so the supervisor restarts it.
    // -------------------------------------------------------------------------
    let discovery = DiscoveryStage::new(
        api,
        cursor.clone(),
        states.clone(),
        processing.clone(),
        app_config.discovery.clone(),
        shutdown.clone(),
    );
    let worker = WorkerStage::new(
        engine,
        states,
        cursor,
        processing,
        reporting.clone(),
        app_config.worker.clone(),
        shutdown.clone(),
    );
    let reporter = ReporterStage::new(
        reporting,
        notifier,
        app_config.reporter.clone(),
        shutdown.clone(),
    );

    let mut tasks = tokio::task::JoinSet::new();
    tasks.spawn(discovery.run());
    tasks.spawn(worker.run());
    tasks.spawn(reporter.run());

    tokio::select! {
        _ = shutdown.triggered() => {}
        _ = tasks.join_next() => {
            error!("A pipeline stage exited unexpectedly; shutting down");
            shutdown.trigger();
        }
    }

    // In-flight external calls run to completion; only wait so long.
    let grace = app_config.shutdown.grace();
    info!(grace_secs = grace.as_secs(), "Draining pipeline stages");
    match tokio::time::timeout(grace, async {
        while tasks.join_next().await.is_some() {}
    })
    .await
    {
        Ok(()) => info!("Shutdown complete"),
        Err(_) => {
            error!("Stages did not drain within the grace period; terminating");
            std::process::exit(1);
        }
    }

    Ok(())
}
