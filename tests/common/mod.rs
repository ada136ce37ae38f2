use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use fabrica_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        material, material_batch,
        material_batch::BatchStatus,
        product, product_bom,
        unit::Unit,
    },
    events, EngineState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use uuid::Uuid;

/// Test harness over an in-memory SQLite database. One connection only so
/// every query sees the same database.
pub struct TestEngine {
    pub state: EngineState,
    pub store_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestEngine {
    pub async fn new() -> Self {
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = EngineState::new(
            Arc::new(pool),
            AppConfig::new("sqlite::memory:"),
            event_sender,
        );

        Self {
            state,
            store_id: Uuid::new_v4(),
            _event_task: event_task,
        }
    }

    pub async fn seed_product(&self, name: &str, base_unit: Unit) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(self.store_id),
            name: Set(name.to_string()),
            sku: Set(None),
            base_unit: Set(base_unit),
            cost_price: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_material(
        &self,
        name: &str,
        base_unit: Unit,
        density: Option<Decimal>,
    ) -> material::Model {
        let now = Utc::now();
        material::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(self.store_id),
            name: Set(name.to_string()),
            sku: Set(None),
            base_unit: Set(base_unit),
            density: Set(density),
            minimum_stock: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed material")
    }

    /// Inserts a batch directly so tests can pin `received_at` and control
    /// FIFO order.
    pub async fn seed_batch(
        &self,
        material_id: Uuid,
        quantity: Decimal,
        unit: Unit,
        unit_cost: Decimal,
        received_at: DateTime<Utc>,
    ) -> material_batch::Model {
        let now = Utc::now();
        material_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(self.store_id),
            material_id: Set(material_id),
            quantity_remaining: Set(quantity),
            unit: Set(unit),
            unit_cost: Set(unit_cost),
            total_cost: Set(quantity * unit_cost),
            lot_code: Set(None),
            supplier: Set(None),
            received_at: Set(received_at),
            expires_at: Set(None),
            status: Set(BatchStatus::Available),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed batch")
    }

    pub async fn seed_bom_line(
        &self,
        product_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
        unit: Unit,
        waste_percent: Decimal,
    ) -> product_bom::Model {
        let now = Utc::now();
        product_bom::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(self.store_id),
            product_id: Set(product_id),
            material_id: Set(material_id),
            quantity: Set(quantity),
            unit: Set(unit),
            waste_percent: Set(waste_percent),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed BOM line")
    }
}

impl Drop for TestEngine {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Fixed receipt timestamp `days` into March 2025, for deterministic FIFO
/// ordering.
pub fn received_on(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap()
}

/// Decimal equality up to storage round-trip noise.
pub fn assert_dec_eq(actual: Decimal, expected: Decimal) {
    let tolerance = dec!(0.000001);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {}, got {}",
        expected,
        actual
    );
}
