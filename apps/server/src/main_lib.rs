use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use storesync_connect::{AdapterRegistry, HttpPlatformAdapter, SyncOrchestrator, SyncServices};
use storesync_core::{
    connections::{ConnectionService, ConnectionServiceTrait},
    sync::{SyncHistoryService, SyncHistoryServiceTrait},
    sync_settings::{SyncSettingsService, SyncSettingsServiceTrait},
};
use storesync_storage_sqlite::{
    db, ConnectionRepository, SyncRunRepository, SyncSettingsRepository,
};

use crate::{
    config::Config,
    events::{EventBus, EventBusProgressReporter},
};

pub type ServerOrchestrator = SyncOrchestrator<EventBusProgressReporter>;

pub struct AppState {
    pub settings_service: Arc<dyn SyncSettingsServiceTrait>,
    pub connection_service: Arc<dyn ConnectionServiceTrait>,
    pub history_service: Arc<dyn SyncHistoryServiceTrait>,
    pub orchestrator: Arc<ServerOrchestrator>,
    pub event_bus: EventBus,
}

pub fn init_tracing() {
    let log_format = std::env::var("SS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// One gateway adapter per configured platform.
pub fn adapters_from_config(config: &Config) -> anyhow::Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    let Some(gateway_url) = config.gateway_url.as_deref() else {
        if !config.platforms.is_empty() {
            tracing::warn!(
                "SS_PLATFORMS is set but SS_PLATFORM_GATEWAY_URL is not; no adapters registered"
            );
        }
        return Ok(registry);
    };

    for platform_id in &config.platforms {
        let adapter =
            HttpPlatformAdapter::with_timeout(gateway_url, platform_id, config.sync.adapter_timeout)?;
        tracing::info!("Platform {} served by {}", platform_id, adapter.endpoint());
        registry.register(Arc::new(adapter));
    }
    Ok(registry)
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let adapters = adapters_from_config(config)?;
    build_state_with_adapters(config, adapters).await
}

pub async fn build_state_with_adapters(
    config: &Config,
    adapters: AdapterRegistry,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer(pool.clone());

    let connection_repository = Arc::new(ConnectionRepository::new(pool.clone(), writer.clone()));
    let settings_repository = Arc::new(SyncSettingsRepository::new(pool.clone(), writer.clone()));
    let run_repository = Arc::new(SyncRunRepository::new(pool.clone(), writer));

    let settings_service: Arc<dyn SyncSettingsServiceTrait> =
        Arc::new(SyncSettingsService::new(settings_repository));
    let connection_service: Arc<dyn ConnectionServiceTrait> =
        Arc::new(ConnectionService::new(connection_repository));
    let history_service: Arc<dyn SyncHistoryServiceTrait> =
        Arc::new(SyncHistoryService::new(run_repository));

    let event_bus = EventBus::new(256);
    if adapters.is_empty() {
        tracing::warn!("No platform adapters registered; every platform will fail to sync");
    }
    let orchestrator = Arc::new(SyncOrchestrator::new(
        SyncServices {
            settings: settings_service.clone(),
            connections: connection_service.clone(),
            history: history_service.clone(),
        },
        adapters,
        Arc::new(EventBusProgressReporter::new(event_bus.clone())),
        config.sync.clone(),
    ));

    // Runs interrupted by a previous shutdown.
    match orchestrator.reap_stale_runs().await {
        Ok(0) => {}
        Ok(reaped) => tracing::info!("Closed {} abandoned sync run(s) at startup", reaped),
        Err(e) => tracing::warn!("Failed to reap stale sync runs: {}", e),
    }

    Ok(Arc::new(AppState {
        settings_service,
        connection_service,
        history_service,
        orchestrator,
        event_bus,
    }))
}
