use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entities::{production_order::CostingMethod, unit::Unit};

/// Events emitted by the engine as state changes commit. Consumers
/// (notifications, reporting, sync) subscribe via the processing loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    MaterialCreated {
        store_id: Uuid,
        material_id: Uuid,
    },
    MaterialDeleted {
        store_id: Uuid,
        material_id: Uuid,
    },
    MaterialBatchReceived {
        store_id: Uuid,
        material_id: Uuid,
        batch_id: Uuid,
        quantity: Decimal,
        unit: Unit,
    },
    MaterialBatchDepleted {
        store_id: Uuid,
        material_id: Uuid,
        batch_id: Uuid,
    },
    MaterialShortageDetected {
        store_id: Uuid,
        production_order_id: Uuid,
        material_id: Uuid,
        required: Decimal,
        available: Decimal,
        shortfall: Decimal,
        unit: Unit,
    },
    BomLineAdded {
        store_id: Uuid,
        product_id: Uuid,
        material_id: Uuid,
    },
    BomLineRemoved {
        store_id: Uuid,
        product_id: Uuid,
        material_id: Uuid,
    },
    ProductionOrderCreated {
        store_id: Uuid,
        production_order_id: Uuid,
        product_id: Uuid,
        planned_quantity: Decimal,
        unit: Unit,
    },
    ProductionOrderStarted {
        store_id: Uuid,
        production_order_id: Uuid,
    },
    ProductionOrderFinished {
        store_id: Uuid,
        production_order_id: Uuid,
        product_id: Uuid,
        actual_quantity: Decimal,
        total_cost: Decimal,
        unit_cost: Decimal,
    },
    ProductionOrderCanceled {
        store_id: Uuid,
        production_order_id: Uuid,
    },
    ProductCostCacheUpdated {
        store_id: Uuid,
        product_id: Uuid,
        unit_cost: Decimal,
        costing_method: CostingMethod,
        calculated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event; a full or closed channel is logged rather than
    /// failing the surrounding business operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event dropped: {}", e);
        }
    }
}

/// Creates a channel pair sized for bursty request traffic.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains engine events, logging each one. Runs until every sender is
/// dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processing loop started");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::MaterialShortageDetected {
                production_order_id,
                material_id,
                shortfall,
                unit,
                ..
            } => {
                warn!(
                    "Material shortage: order={} material={} short {} {}",
                    production_order_id, material_id, shortfall, unit
                );
            }
            Event::MaterialBatchDepleted {
                material_id,
                batch_id,
                ..
            } => {
                info!("Batch depleted: material={} batch={}", material_id, batch_id);
            }
            Event::ProductionOrderFinished {
                production_order_id,
                total_cost,
                unit_cost,
                ..
            } => {
                info!(
                    "Production order finished: {} total_cost={} unit_cost={}",
                    production_order_id, total_cost, unit_cost
                );
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}
