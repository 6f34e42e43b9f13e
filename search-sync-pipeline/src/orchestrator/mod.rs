//! Orchestrator: routes change events from the intake channel to the
//! propagator's per-family entry points.
//!
//! The external transport owns delivery, retry and per-entity ordering;
//! it pushes events through the `EventSender` handle. A failed event is
//! logged and dropped here so the pipeline can redeliver it.

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use crate::errors::PipelineError;
use crate::propagator::ChangePropagator;
use search_sync_shared::{EntityChangeEvent, EntityType};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the event channel buffer.
    pub channel_buffer_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
        }
    }
}

/// Handle the external event pipeline uses to push change events.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<EntityChangeEvent>,
}

impl EventSender {
    pub async fn send(&self, event: EntityChangeEvent) -> Result<(), PipelineError> {
        self.tx
            .send(event)
            .await
            .map_err(|e| PipelineError::channel(e.to_string()))
    }
}

/// Coordinates event intake and propagation until shutdown.
pub struct Orchestrator {
    propagator: ChangePropagator,
    receiver: Option<mpsc::Receiver<EntityChangeEvent>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    pub fn new(propagator: ChangePropagator) -> (Self, EventSender) {
        Self::with_config(propagator, OrchestratorConfig::default())
    }

    pub fn with_config(
        propagator: ChangePropagator,
        config: OrchestratorConfig,
    ) -> (Self, EventSender) {
        let (tx, rx) = mpsc::channel(config.channel_buffer_size);
        let (shutdown_tx, _) = broadcast::channel(1);

        (
            Self {
                propagator,
                receiver: Some(rx),
                shutdown_tx,
            },
            EventSender { tx },
        )
    }

    /// Run the orchestrator until the event stream ends or a shutdown
    /// signal arrives.
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        let mut rx = self
            .receiver
            .take()
            .ok_or_else(|| PipelineError::channel("Orchestrator is already running"))?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("Starting search sync orchestrator");

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(event) => {
                            if let Err(e) = route_event(&self.propagator, &event).await {
                                // The external pipeline decides whether to
                                // redeliver; nothing is rolled back here.
                                error!(
                                    entity_id = %event.entity_id,
                                    entity_type = %event.entity_type,
                                    error = %e,
                                    "Failed to apply change event"
                                );
                            }
                        }
                        None => {
                            info!("Event stream ended");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received interrupt");
                    break;
                }
            }
        }

        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Dispatch one event to the matching per-family entry point.
pub async fn route_event(
    propagator: &ChangePropagator,
    event: &EntityChangeEvent,
) -> Result<(), PipelineError> {
    match event.entity_type {
        EntityType::User | EntityType::Team => propagator.on_user_changed(event).await,
        EntityType::Tag => propagator.on_tag_changed(event).await,
        EntityType::Classification => propagator.on_classification_changed(event).await,
        EntityType::Domain => propagator.on_domain_changed(event).await,
        _ => propagator.on_entity_changed(event).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemorySearchStore;
    use search_sync_shared::entity::{EntityCore, EntityRef, Table};
    use search_sync_shared::{ChangeType, EntitySnapshot, Revision};
    use std::sync::Arc;
    use uuid::Uuid;

    fn table_event(table_id: Uuid, change_type: ChangeType) -> EntityChangeEvent {
        let snapshot = EntitySnapshot::Table(Table {
            core: EntityCore::new(table_id, "orders"),
            service: EntityRef::new(Uuid::new_v4(), EntityType::DatabaseService, "mysql_prod"),
            service_type: Some("Mysql".to_string()),
            database: None,
            database_schema: None,
            columns: vec![],
            sample_data: None,
            usage_summary: None,
            change_description: None,
        });
        EntityChangeEvent::new(EntityType::Table, change_type, snapshot, Revision(1))
    }

    #[tokio::test]
    async fn test_orchestrator_applies_events_until_stream_ends() {
        let store = Arc::new(InMemorySearchStore::new());
        let propagator = ChangePropagator::new(store.clone());
        let (mut orchestrator, sender) = Orchestrator::new(propagator);

        let table_id = Uuid::new_v4();
        let handle = tokio::spawn(async move { orchestrator.run().await });

        sender
            .send(table_event(table_id, ChangeType::Created))
            .await
            .unwrap();
        sender
            .send(table_event(table_id, ChangeType::SoftDeleted))
            .await
            .unwrap();
        drop(sender);

        handle.await.unwrap().unwrap();

        let doc = store
            .get("table_search_index", &table_id.to_string())
            .unwrap();
        assert_eq!(doc["deleted"], true);
    }

    #[tokio::test]
    async fn test_failed_event_does_not_stop_the_loop() {
        let store = Arc::new(InMemorySearchStore::new());
        let propagator = ChangePropagator::new(store.clone());
        let (mut orchestrator, sender) = Orchestrator::new(propagator);

        let handle = tokio::spawn(async move { orchestrator.run().await });

        // A table event with a mismatched snapshot is skipped with a
        // warning; the next event still applies.
        let mismatched = EntityChangeEvent::new(
            EntityType::Table,
            ChangeType::Created,
            EntitySnapshot::Glossary(search_sync_shared::entity::Glossary {
                core: EntityCore::new(Uuid::new_v4(), "business"),
            }),
            Revision(1),
        );
        sender.send(mismatched).await.unwrap();

        let table_id = Uuid::new_v4();
        sender
            .send(table_event(table_id, ChangeType::Created))
            .await
            .unwrap();
        drop(sender);

        handle.await.unwrap().unwrap();
        assert!(store.contains("table_search_index", &table_id.to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_loop() {
        let store = Arc::new(InMemorySearchStore::new());
        let propagator = ChangePropagator::new(store);
        let (mut orchestrator, sender) = Orchestrator::new(propagator);

        let shutdown = orchestrator.shutdown_tx.clone();
        let handle = tokio::spawn(async move { orchestrator.run().await });

        // Wait until the run loop has subscribed, then signal shutdown.
        while shutdown.send(()).is_err() {
            tokio::task::yield_now().await;
        }

        handle.await.unwrap().unwrap();
        drop(sender);
    }
}
