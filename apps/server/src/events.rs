use serde_json::{json, Value};
use tokio::sync::broadcast;

use storesync_connect::{SyncProgressReporter, SyncResponse, SyncRunResult};
use storesync_core::sync::{PlatformResult, SyncRun};

/// Event names published on the stream.
pub const SYNC_RUN_START: &str = "sync:run-start";
pub const SYNC_PLATFORM_COMPLETE: &str = "sync:platform-complete";
pub const SYNC_RUN_COMPLETE: &str = "sync:run-complete";

/// Serializable envelope that carries event names and optional payloads.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    pub name: &'static str,
    pub payload: Option<Value>,
}

impl ServerEvent {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            payload: None,
        }
    }

    pub fn with_payload(name: &'static str, payload: Value) -> Self {
        Self {
            name,
            payload: Some(payload),
        }
    }
}

/// Lightweight broadcast bus that fans out events to any connected clients.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ServerEvent) {
        // Lagging listeners are ignored to avoid blocking producers.
        let _ = self.sender.send(event);
    }
}

/// Progress reporter that publishes run progress to the EventBus for SSE delivery.
pub struct EventBusProgressReporter {
    event_bus: EventBus,
}

impl EventBusProgressReporter {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

impl SyncProgressReporter for EventBusProgressReporter {
    fn report_run_started(&self, run: &SyncRun) {
        self.event_bus.publish(ServerEvent::with_payload(
            SYNC_RUN_START,
            json!({
                "syncId": run.id,
                "tenantId": run.tenant_id,
                "scope": run.scope,
                "platforms": run.platform_results.len(),
            }),
        ));
    }

    fn report_platform_completed(&self, run_id: &str, result: &PlatformResult) {
        self.event_bus.publish(ServerEvent::with_payload(
            SYNC_PLATFORM_COMPLETE,
            json!({ "syncId": run_id, "platform": result }),
        ));
    }

    fn report_run_completed(&self, result: &SyncRunResult) {
        self.event_bus.publish(ServerEvent::with_payload(
            SYNC_RUN_COMPLETE,
            serde_json::to_value(SyncResponse::from(result)).unwrap_or_default(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storesync_core::sync::{PlatformOutcome, SyncCounts, SyncRunStatus};

    #[tokio::test]
    async fn reporter_publishes_run_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let reporter = EventBusProgressReporter::new(bus.clone());

        let platform = PlatformResult {
            connection_id: "c1".into(),
            platform_id: "shopify".into(),
            display_name: "Shopify".into(),
            outcome: PlatformOutcome::Success,
            detail: None,
            counts: SyncCounts::new(2, 2, 0),
        };
        reporter.report_platform_completed("run-1", &platform);
        reporter.report_run_completed(&SyncRunResult {
            run_id: "run-1".into(),
            tenant_id: "t1".into(),
            status: SyncRunStatus::Success,
            totals: SyncCounts::new(2, 2, 0),
            platform_results: vec![platform],
            duration_seconds: 1,
        });

        let first = rx.recv().await.unwrap();
        assert_eq!(first.name, SYNC_PLATFORM_COMPLETE);
        assert_eq!(first.payload.unwrap()["platform"]["platformId"], "shopify");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.name, SYNC_RUN_COMPLETE);
        assert_eq!(second.payload.unwrap()["details"]["syncId"], "run-1");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        EventBus::new(1).publish(ServerEvent::new(SYNC_RUN_START));
    }
}
