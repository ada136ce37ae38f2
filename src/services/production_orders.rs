use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        finished_goods,
        production_order::{self, CostingMethod, Entity as ProductionOrderEntity, ProductionOrderStatus},
        unit::Unit,
    },
    errors::{MaterialShortage, ServiceError},
    events::{Event, EventSender},
    services::{
        bom::find_product,
        costing::{
            allocate_on, calculate_consumptions_on, calculate_production_cost,
            consume_materials_on, update_cost_cache_on,
        },
        materials::{check_availability_on, AvailabilityStatus},
    },
};

#[derive(Debug, Clone)]
pub struct CreateProductionOrderInput {
    pub product_id: Uuid,
    pub planned_quantity: Decimal,
    pub unit: Unit,
    /// None snapshots the store-wide default at creation time.
    pub costing_method: Option<CostingMethod>,
    pub overhead_percent: Decimal,
    pub packaging_cost_per_unit: Decimal,
}

/// Production order lifecycle: draft -> in_progress -> finished, with
/// cancellation from either non-terminal state. Start performs a soft
/// availability check; all hard allocation happens atomically at finish.
#[derive(Clone)]
pub struct ProductionOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    default_costing_method: CostingMethod,
}

impl ProductionOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        default_costing_method: CostingMethod,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_costing_method,
        }
    }

    /// Creates a draft order with a generated batch code. The costing
    /// method is fixed here; later changes to the store default do not
    /// touch orders already in flight.
    #[instrument(skip(self, input))]
    pub async fn create_order(
        &self,
        store_id: Uuid,
        input: CreateProductionOrderInput,
    ) -> Result<production_order::Model, ServiceError> {
        if input.planned_quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Planned quantity must be positive, got: {}",
                input.planned_quantity
            )));
        }
        if input.overhead_percent < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Overhead percent cannot be negative, got: {}",
                input.overhead_percent
            )));
        }
        if input.packaging_cost_per_unit < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Packaging cost cannot be negative, got: {}",
                input.packaging_cost_per_unit
            )));
        }

        let product = find_product(&*self.db, store_id, input.product_id).await?;
        let batch_code = self.next_batch_code(store_id, &product.name).await?;
        let costing_method = input.costing_method.unwrap_or(self.default_costing_method);

        let now = Utc::now();
        let order = production_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            product_id: Set(input.product_id),
            planned_quantity: Set(input.planned_quantity),
            unit: Set(input.unit),
            costing_method: Set(costing_method),
            overhead_percent: Set(input.overhead_percent),
            packaging_cost_per_unit: Set(input.packaging_cost_per_unit),
            status: Set(ProductionOrderStatus::Draft),
            batch_code: Set(batch_code),
            started_at: Set(None),
            finished_at: Set(None),
            actual_quantity: Set(None),
            total_material_cost: Set(None),
            total_packaging_cost: Set(None),
            total_overhead_cost: Set(None),
            total_cost: Set(None),
            unit_cost: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = order.insert(&*self.db).await?;

        counter!("production.orders.created", 1);
        self.event_sender
            .send_or_log(Event::ProductionOrderCreated {
                store_id,
                production_order_id: created.id,
                product_id: created.product_id,
                planned_quantity: created.planned_quantity,
                unit: created.unit,
            })
            .await;

        info!(
            "Production order created: {} batch_code={} method={}",
            created.id, created.batch_code, created.costing_method
        );
        Ok(created)
    }

    /// Moves a draft order into progress after a soft availability check
    /// over the planned output. Only fully-unavailable materials block the
    /// start; partial stock is tolerated until finish allocates for real.
    #[instrument(skip(self))]
    pub async fn start_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        let order = self.get_order(store_id, order_id).await?;
        ensure_transition(&order, ProductionOrderStatus::InProgress)?;

        let consumptions = calculate_consumptions_on(
            &*self.db,
            store_id,
            order.product_id,
            order.planned_quantity,
            order.unit,
        )
        .await?;

        let mut shortages = Vec::new();
        for consumption in &consumptions {
            let availability = check_availability_on(
                &*self.db,
                store_id,
                consumption.material_id,
                consumption.final_quantity,
                consumption.unit,
            )
            .await?;
            if availability.status == AvailabilityStatus::Unavailable {
                shortages.push(MaterialShortage {
                    material_id: consumption.material_id,
                    material_name: consumption.material_name.clone(),
                    required: consumption.final_quantity,
                    available: availability.total_available,
                    shortfall: availability.shortfall,
                    unit: consumption.unit,
                });
            }
        }

        if !shortages.is_empty() {
            for shortage in &shortages {
                self.event_sender
                    .send_or_log(Event::MaterialShortageDetected {
                        store_id,
                        production_order_id: order.id,
                        material_id: shortage.material_id,
                        required: shortage.required,
                        available: shortage.available,
                        shortfall: shortage.shortfall,
                        unit: shortage.unit,
                    })
                    .await;
            }
            warn!(
                "Cannot start production order {}: {} material(s) unavailable",
                order.id,
                shortages.len()
            );
            return Err(ServiceError::InsufficientMaterials(shortages));
        }

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::InProgress);
        active.started_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        counter!("production.orders.started", 1);
        self.event_sender
            .send_or_log(Event::ProductionOrderStarted {
                store_id,
                production_order_id: updated.id,
            })
            .await;

        info!("Production order started: {}", updated.id);
        Ok(updated)
    }

    /// Finishes an in-progress order: recomputes consumption against the
    /// actual output, allocates per the snapshotted costing method, rolls
    /// up costs, consumes stock, and records finished goods plus the cost
    /// cache — all inside one transaction. Failure leaves the order
    /// in_progress with no partial writes, so the call is safely
    /// retryable.
    #[instrument(skip(self))]
    pub async fn finish_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
        actual_quantity: Decimal,
    ) -> Result<production_order::Model, ServiceError> {
        if actual_quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Actual quantity must be positive, got: {}",
                actual_quantity
            )));
        }

        let order = self.get_order(store_id, order_id).await?;
        ensure_transition(&order, ProductionOrderStatus::Finished)?;

        let txn = self.db.begin().await?;

        let consumptions = calculate_consumptions_on(
            &txn,
            store_id,
            order.product_id,
            actual_quantity,
            order.unit,
        )
        .await?;
        let allocations =
            allocate_on(&txn, store_id, &consumptions, order.costing_method).await?;
        let cost = calculate_production_cost(
            &allocations,
            actual_quantity,
            order.packaging_cost_per_unit,
            order.overhead_percent,
        );
        let outcome = consume_materials_on(&txn, store_id, order.id, &allocations).await?;

        let now = Utc::now();
        let product_id = order.product_id;
        let unit = order.unit;
        let batch_code = order.batch_code.clone();
        let costing_method = order.costing_method;

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::Finished);
        active.actual_quantity = Set(Some(actual_quantity));
        active.finished_at = Set(Some(now));
        active.total_material_cost = Set(Some(cost.material_cost));
        active.total_packaging_cost = Set(Some(cost.packaging_cost));
        active.total_overhead_cost = Set(Some(cost.overhead_cost));
        active.total_cost = Set(Some(cost.total_cost));
        active.unit_cost = Set(Some(cost.unit_cost));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        finished_goods::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            product_id: Set(product_id),
            production_order_id: Set(updated.id),
            quantity: Set(actual_quantity),
            unit: Set(unit),
            unit_cost: Set(cost.unit_cost),
            batch_code: Set(batch_code),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let cache =
            update_cost_cache_on(&txn, store_id, product_id, cost.unit_cost, costing_method)
                .await?;

        txn.commit().await.map_err(|e| {
            error!("Finish transaction failed for order {}: {}", order_id, e);
            ServiceError::DatabaseError(e)
        })?;

        counter!("production.orders.finished", 1);
        histogram!(
            "production.orders.total_cost",
            cost.total_cost.to_f64().unwrap_or(0.0)
        );

        for (material_id, batch_id) in outcome.depleted_batches {
            self.event_sender
                .send_or_log(Event::MaterialBatchDepleted {
                    store_id,
                    material_id,
                    batch_id,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::ProductCostCacheUpdated {
                store_id,
                product_id,
                unit_cost: cache.unit_cost,
                costing_method: cache.costing_method,
                calculated_at: cache.calculated_at,
            })
            .await;
        self.event_sender
            .send_or_log(Event::ProductionOrderFinished {
                store_id,
                production_order_id: updated.id,
                product_id,
                actual_quantity,
                total_cost: cost.total_cost,
                unit_cost: cost.unit_cost,
            })
            .await;

        info!(
            "Production order finished: {} total_cost={} unit_cost={}",
            updated.id, cost.total_cost, cost.unit_cost
        );
        Ok(updated)
    }

    /// Cancels a draft or in-progress order. Nothing is released because
    /// start never reserves stock; finished orders cannot be canceled.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        let order = self.get_order(store_id, order_id).await?;
        ensure_transition(&order, ProductionOrderStatus::Canceled)?;

        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(ProductionOrderStatus::Canceled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        counter!("production.orders.canceled", 1);
        self.event_sender
            .send_or_log(Event::ProductionOrderCanceled {
                store_id,
                production_order_id: updated.id,
            })
            .await;

        info!("Production order canceled: {}", updated.id);
        Ok(updated)
    }

    /// Deletes a draft order. Orders that have moved material are part of
    /// the audit trail and can only be canceled.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, store_id: Uuid, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.get_order(store_id, order_id).await?;
        if order.status != ProductionOrderStatus::Draft {
            return Err(ServiceError::InvalidStateTransition {
                from: order.status.to_string(),
                to: "deleted".to_string(),
            });
        }

        order.delete(&*self.db).await?;
        info!("Production order deleted: {}", order_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        store_id: Uuid,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        ProductionOrderEntity::find_by_id(order_id)
            .filter(production_order::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    /// Orders for a store, newest first, one page at a time.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        store_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<production_order::Model>, u64), ServiceError> {
        if page == 0 || limit == 0 {
            return Err(ServiceError::InvalidInput(
                "Page and limit must be positive".to_string(),
            ));
        }

        let paginator = ProductionOrderEntity::find()
            .filter(production_order::Column::StoreId.eq(store_id))
            .order_by_desc(production_order::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok((items, total))
    }

    /// Batch codes look like `PAO250806003`: a three-letter product
    /// prefix, the UTC date, and a three-digit daily sequence per store.
    async fn next_batch_code(
        &self,
        store_id: Uuid,
        product_name: &str,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let day_start = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();

        let today_count = ProductionOrderEntity::find()
            .filter(production_order::Column::StoreId.eq(store_id))
            .filter(production_order::Column::CreatedAt.gte(day_start))
            .count(&*self.db)
            .await?;

        let mut prefix: String = product_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_uppercase();
        while prefix.len() < 3 {
            prefix.push('X');
        }

        Ok(format!(
            "{}{}{:03}",
            prefix,
            now.format("%y%m%d"),
            today_count + 1
        ))
    }
}

fn ensure_transition(
    order: &production_order::Model,
    to: ProductionOrderStatus,
) -> Result<(), ServiceError> {
    if !order.status.can_transition(to) {
        return Err(ServiceError::InvalidStateTransition {
            from: order.status.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}
