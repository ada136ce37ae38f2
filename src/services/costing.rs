use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        material_batch::{self, BatchStatus, Entity as MaterialBatchEntity},
        product_cost_cache::{self, Entity as ProductCostCacheEntity},
        production_consumption,
        production_order::{self, CostingMethod, Entity as ProductionOrderEntity, ProductionOrderStatus},
        unit::Unit,
    },
    errors::ServiceError,
    services::{
        bom::{find_product, scale_recipe_on},
        materials::find_material,
        units::{convert_quantity, ConversionScope},
    },
};

/// Per-material requirement derived from a product's BOM for a target
/// output, before allocation against stock.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialConsumption {
    pub material_id: Uuid,
    pub material_name: String,
    /// Scaled quantity before waste.
    pub required_quantity: Decimal,
    pub unit: Unit,
    pub waste_percent: Decimal,
    /// Scaled quantity inflated by waste; what allocation must cover.
    pub final_quantity: Decimal,
}

/// One priced slice of an allocation. Under FIFO each slice names the
/// batch it draws from; under WAC there is a single unpriced-batch slice
/// per material at the blended cost.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialAllocation {
    pub material_id: Uuid,
    pub material_name: String,
    pub batch_id: Option<Uuid>,
    pub quantity: Decimal,
    pub unit: Unit,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionCost {
    pub material_cost: Decimal,
    pub packaging_cost: Decimal,
    pub overhead_cost: Decimal,
    pub total_cost: Decimal,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    Dynamic,
    Cache,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedPrice {
    pub product_id: Uuid,
    pub unit_cost: Decimal,
    pub markup_percent: Decimal,
    pub suggested_price: Decimal,
    pub source: CostSource,
}

#[derive(Debug, Clone)]
pub struct GetSuggestedPriceInput {
    pub product_id: Uuid,
    pub output_quantity: Decimal,
    pub output_unit: Unit,
    pub markup_percent: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostHistoryEntry {
    pub production_order_id: Uuid,
    pub batch_code: String,
    pub finished_at: Option<DateTime<Utc>>,
    pub quantity: Decimal,
    pub unit: Unit,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub costing_method: CostingMethod,
}

/// What a consumption run changed, so the caller can emit events once the
/// surrounding transaction commits.
#[derive(Debug, Default)]
pub struct ConsumptionOutcome {
    pub consumptions: Vec<production_consumption::Model>,
    /// (material_id, batch_id) pairs drained to zero.
    pub depleted_batches: Vec<(Uuid, Uuid)>,
}

/// Costing engine: BOM-driven requirement calculation, FIFO/WAC batch
/// allocation, cost rollup, and the transactional consumption step.
#[derive(Clone)]
pub struct CostingService {
    db: Arc<DatabaseConnection>,
}

impl CostingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Scales the product's BOM to the requested output. Returns an empty
    /// list (not an error) when the product has no recipe, which callers
    /// read as "nothing to allocate".
    #[instrument(skip(self))]
    pub async fn calculate_material_consumptions(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        output_quantity: Decimal,
        output_unit: Unit,
    ) -> Result<Vec<MaterialConsumption>, ServiceError> {
        calculate_consumptions_on(&*self.db, store_id, product_id, output_quantity, output_unit)
            .await
    }

    /// Allocates each consumption against available batches oldest-first,
    /// priced at each batch's actual cost.
    #[instrument(skip(self, consumptions))]
    pub async fn allocate_fifo(
        &self,
        store_id: Uuid,
        consumptions: &[MaterialConsumption],
    ) -> Result<Vec<MaterialAllocation>, ServiceError> {
        allocate_on(&*self.db, store_id, consumptions, CostingMethod::Fifo).await
    }

    /// Allocates each consumption at the quantity-weighted average cost
    /// across all available batches; batch identity is resolved later by
    /// the consumption step.
    #[instrument(skip(self, consumptions))]
    pub async fn allocate_wac(
        &self,
        store_id: Uuid,
        consumptions: &[MaterialConsumption],
    ) -> Result<Vec<MaterialAllocation>, ServiceError> {
        allocate_on(&*self.db, store_id, consumptions, CostingMethod::Wac).await
    }

    /// Dynamic price suggestion: live WAC costing of the requested output,
    /// falling back to the cached unit cost when live costing is not
    /// possible.
    #[instrument(skip(self))]
    pub async fn get_suggested_price(
        &self,
        store_id: Uuid,
        input: GetSuggestedPriceInput,
    ) -> Result<SuggestedPrice, ServiceError> {
        if input.output_quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Output quantity must be positive, got: {}",
                input.output_quantity
            )));
        }
        if input.markup_percent < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Markup percent cannot be negative, got: {}",
                input.markup_percent
            )));
        }

        find_product(&*self.db, store_id, input.product_id).await?;

        let dynamic = self.dynamic_unit_cost(store_id, &input).await?;
        let (unit_cost, source) = match dynamic {
            Some(cost) => (cost, CostSource::Dynamic),
            None => {
                let cached = ProductCostCacheEntity::find()
                    .filter(product_cost_cache::Column::StoreId.eq(store_id))
                    .filter(product_cost_cache::Column::ProductId.eq(input.product_id))
                    .one(&*self.db)
                    .await?
                    .ok_or(ServiceError::NoCostInformation(input.product_id))?;
                (cached.unit_cost, CostSource::Cache)
            }
        };

        let suggested_price = unit_cost * (Decimal::ONE + input.markup_percent / dec!(100));
        Ok(SuggestedPrice {
            product_id: input.product_id,
            unit_cost,
            markup_percent: input.markup_percent,
            suggested_price,
            source,
        })
    }

    /// Cost fields of finished production orders for a product, newest
    /// first. The cost cache only keeps the latest value; this is the
    /// full trail.
    #[instrument(skip(self))]
    pub async fn get_product_cost_history(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<CostHistoryEntry>, ServiceError> {
        find_product(&*self.db, store_id, product_id).await?;

        let orders = ProductionOrderEntity::find()
            .filter(production_order::Column::StoreId.eq(store_id))
            .filter(production_order::Column::ProductId.eq(product_id))
            .filter(production_order::Column::Status.eq(ProductionOrderStatus::Finished))
            .order_by_desc(production_order::Column::FinishedAt)
            .all(&*self.db)
            .await?;

        Ok(orders
            .into_iter()
            .filter_map(|order| {
                let (unit_cost, total_cost, quantity) =
                    match (order.unit_cost, order.total_cost, order.actual_quantity) {
                        (Some(u), Some(t), Some(q)) => (u, t, q),
                        _ => return None,
                    };
                Some(CostHistoryEntry {
                    production_order_id: order.id,
                    batch_code: order.batch_code,
                    finished_at: order.finished_at,
                    quantity,
                    unit: order.unit,
                    unit_cost,
                    total_cost,
                    costing_method: order.costing_method,
                })
            })
            .collect())
    }

    /// Live WAC cost per output unit, or None when the product has no
    /// recipe, stock does not cover the requirement, or a conversion
    /// cannot be performed — the cases the cache exists for.
    async fn dynamic_unit_cost(
        &self,
        store_id: Uuid,
        input: &GetSuggestedPriceInput,
    ) -> Result<Option<Decimal>, ServiceError> {
        let consumptions = calculate_consumptions_on(
            &*self.db,
            store_id,
            input.product_id,
            input.output_quantity,
            input.output_unit,
        )
        .await?;
        if consumptions.is_empty() {
            return Ok(None);
        }

        match allocate_on(&*self.db, store_id, &consumptions, CostingMethod::Wac).await {
            Ok(allocations) => {
                let material_cost: Decimal =
                    allocations.iter().map(|a| a.total_cost).sum();
                Ok(Some(material_cost / input.output_quantity))
            }
            Err(
                ServiceError::InsufficientStock { .. }
                | ServiceError::MissingDensity { .. }
                | ServiceError::IncompatibleUnits { .. },
            ) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

/// Rolls material, packaging, and overhead into a total and per-unit cost.
/// Callers guarantee `output_quantity > 0`.
pub fn calculate_production_cost(
    allocations: &[MaterialAllocation],
    output_quantity: Decimal,
    packaging_cost_per_unit: Decimal,
    overhead_percent: Decimal,
) -> ProductionCost {
    let material_cost: Decimal = allocations.iter().map(|a| a.total_cost).sum();
    let packaging_cost = output_quantity * packaging_cost_per_unit;
    let overhead_cost = (material_cost + packaging_cost) * overhead_percent / dec!(100);
    let total_cost = material_cost + packaging_cost + overhead_cost;
    let unit_cost = total_cost / output_quantity;

    ProductionCost {
        material_cost,
        packaging_cost,
        overhead_cost,
        total_cost,
        unit_cost,
    }
}

pub(crate) async fn calculate_consumptions_on<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    product_id: Uuid,
    output_quantity: Decimal,
    output_unit: Unit,
) -> Result<Vec<MaterialConsumption>, ServiceError> {
    let recipe =
        match scale_recipe_on(conn, store_id, product_id, output_quantity, output_unit).await {
            Ok(recipe) => recipe,
            Err(ServiceError::RecipeNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

    Ok(recipe
        .ingredients
        .into_iter()
        .map(|ing| MaterialConsumption {
            material_id: ing.material_id,
            material_name: ing.material_name,
            required_quantity: ing.scaled_quantity,
            unit: ing.unit,
            waste_percent: ing.waste_percent,
            final_quantity: ing.final_quantity,
        })
        .collect())
}

pub(crate) async fn allocate_on<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    consumptions: &[MaterialConsumption],
    method: CostingMethod,
) -> Result<Vec<MaterialAllocation>, ServiceError> {
    let mut allocations = Vec::new();
    for consumption in consumptions {
        let mat = find_material(conn, store_id, consumption.material_id).await?;
        let scope = ConversionScope::load(conn, store_id, &mat).await?;
        let batches = available_batches(conn, store_id, consumption.material_id).await?;

        let result = match method {
            CostingMethod::Fifo => allocate_fifo_for(consumption, &batches, &scope),
            CostingMethod::Wac => {
                allocate_wac_for(consumption, &batches, &scope).map(|a| vec![a])
            }
        };

        match result {
            Ok(mut slices) => allocations.append(&mut slices),
            Err(e) => {
                if matches!(e, ServiceError::InsufficientStock { .. }) {
                    counter!("costing.allocations.insufficient_stock", 1);
                    warn!(
                        "Allocation failed for material {}: {}",
                        consumption.material_id, e
                    );
                }
                return Err(e);
            }
        }
    }
    Ok(allocations)
}

/// Walks available batches oldest-received-first, drawing from each until
/// the requirement is covered. No partial result: exhausting every batch
/// with a remainder is an `InsufficientStock` error.
fn allocate_fifo_for(
    consumption: &MaterialConsumption,
    batches: &[material_batch::Model],
    scope: &ConversionScope,
) -> Result<Vec<MaterialAllocation>, ServiceError> {
    let mut remaining = consumption.final_quantity;
    let mut slices = Vec::new();

    for batch in batches {
        if remaining <= Decimal::ZERO {
            break;
        }
        let batch_quantity =
            convert_quantity(batch.quantity_remaining, batch.unit, consumption.unit, scope)?;
        if batch_quantity <= Decimal::ZERO {
            continue;
        }
        let unit_cost = cost_per_unit(batch, consumption.unit, scope)?;
        let take = batch_quantity.min(remaining);
        slices.push(MaterialAllocation {
            material_id: consumption.material_id,
            material_name: consumption.material_name.clone(),
            batch_id: Some(batch.id),
            quantity: take,
            unit: consumption.unit,
            unit_cost,
            total_cost: take * unit_cost,
        });
        remaining -= take;
    }

    if remaining > Decimal::ZERO {
        return Err(ServiceError::InsufficientStock {
            material_id: consumption.material_id,
            material_name: consumption.material_name.clone(),
            shortfall: remaining,
            unit: consumption.unit,
        });
    }
    Ok(slices)
}

/// Prices the whole requirement at the quantity-weighted average cost of
/// every available batch. The slice carries no batch reference; the
/// consumption step drains all contributing batches proportionally.
fn allocate_wac_for(
    consumption: &MaterialConsumption,
    batches: &[material_batch::Model],
    scope: &ConversionScope,
) -> Result<MaterialAllocation, ServiceError> {
    let mut total_quantity = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;

    for batch in batches {
        let quantity =
            convert_quantity(batch.quantity_remaining, batch.unit, consumption.unit, scope)?;
        if quantity <= Decimal::ZERO {
            continue;
        }
        total_quantity += quantity;
        total_value += quantity * cost_per_unit(batch, consumption.unit, scope)?;
    }

    if total_quantity < consumption.final_quantity {
        return Err(ServiceError::InsufficientStock {
            material_id: consumption.material_id,
            material_name: consumption.material_name.clone(),
            shortfall: consumption.final_quantity - total_quantity,
            unit: consumption.unit,
        });
    }

    let unit_cost = total_value / total_quantity;
    Ok(MaterialAllocation {
        material_id: consumption.material_id,
        material_name: consumption.material_name.clone(),
        batch_id: None,
        quantity: consumption.final_quantity,
        unit: consumption.unit,
        unit_cost,
        total_cost: consumption.final_quantity * unit_cost,
    })
}

/// Batch unit cost re-expressed per one unit of `target`.
fn cost_per_unit(
    batch: &material_batch::Model,
    target: Unit,
    scope: &ConversionScope,
) -> Result<Decimal, ServiceError> {
    let one_batch_unit = convert_quantity(Decimal::ONE, batch.unit, target, scope)?;
    Ok(batch.unit_cost / one_batch_unit)
}

async fn available_batches<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    material_id: Uuid,
) -> Result<Vec<material_batch::Model>, ServiceError> {
    Ok(MaterialBatchEntity::find()
        .filter(material_batch::Column::StoreId.eq(store_id))
        .filter(material_batch::Column::MaterialId.eq(material_id))
        .filter(material_batch::Column::Status.eq(BatchStatus::Available))
        .order_by_asc(material_batch::Column::ReceivedAt)
        .all(conn)
        .await?)
}

/// Writes consumption audit rows and mutates batch stock for a set of
/// allocations. Runs on the caller's transaction: either every row lands
/// or none do.
pub(crate) async fn consume_materials_on<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    production_order_id: Uuid,
    allocations: &[MaterialAllocation],
) -> Result<ConsumptionOutcome, ServiceError> {
    let mut outcome = ConsumptionOutcome::default();

    for alloc in allocations {
        let mat = find_material(conn, store_id, alloc.material_id).await?;
        let scope = ConversionScope::load(conn, store_id, &mat).await?;

        let row = production_consumption::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            production_order_id: Set(production_order_id),
            material_id: Set(alloc.material_id),
            batch_id: Set(alloc.batch_id),
            quantity: Set(alloc.quantity),
            unit: Set(alloc.unit),
            unit_cost: Set(alloc.unit_cost),
            total_cost: Set(alloc.total_cost),
            created_at: Set(Utc::now()),
        };
        outcome.consumptions.push(row.insert(conn).await?);

        match alloc.batch_id {
            Some(batch_id) => {
                let batch = MaterialBatchEntity::find_by_id(batch_id)
                    .filter(material_batch::Column::StoreId.eq(store_id))
                    .one(conn)
                    .await?
                    .ok_or(ServiceError::BatchNotFound(batch_id))?;
                let native = convert_quantity(alloc.quantity, alloc.unit, batch.unit, &scope)?;
                if decrement_batch(conn, &batch, native).await? {
                    outcome.depleted_batches.push((alloc.material_id, batch.id));
                }
            }
            None => {
                // Weighted average: drain every available batch in
                // proportion to its share of total availability.
                let batches = available_batches(conn, store_id, alloc.material_id).await?;
                let mut entries = Vec::with_capacity(batches.len());
                let mut total_available = Decimal::ZERO;
                for batch in &batches {
                    let quantity =
                        convert_quantity(batch.quantity_remaining, batch.unit, alloc.unit, &scope)?;
                    if quantity <= Decimal::ZERO {
                        continue;
                    }
                    total_available += quantity;
                    entries.push((batch, quantity));
                }
                if total_available < alloc.quantity {
                    return Err(ServiceError::InsufficientStock {
                        material_id: alloc.material_id,
                        material_name: alloc.material_name.clone(),
                        shortfall: alloc.quantity - total_available,
                        unit: alloc.unit,
                    });
                }

                let mut remaining = alloc.quantity;
                let last = entries.len().saturating_sub(1);
                for (index, (batch, available)) in entries.iter().enumerate() {
                    if remaining <= Decimal::ZERO {
                        break;
                    }
                    let share = if index == last {
                        remaining
                    } else {
                        alloc.quantity * *available / total_available
                    };
                    let share = share.min(*available).min(remaining);
                    if share <= Decimal::ZERO {
                        continue;
                    }
                    let native = convert_quantity(share, alloc.unit, batch.unit, &scope)?;
                    if decrement_batch(conn, batch, native).await? {
                        outcome.depleted_batches.push((alloc.material_id, batch.id));
                    }
                    remaining -= share;
                }
            }
        }
    }

    info!(
        "Consumed {} allocation(s) for production order {}",
        allocations.len(),
        production_order_id
    );
    Ok(outcome)
}

/// Decrements a batch with an optimistic version check. Quantity is
/// clamped at zero and the status flips to consumed when the batch is
/// drained. Returns true when the batch was depleted by this call.
async fn decrement_batch<C: ConnectionTrait>(
    conn: &C,
    batch: &material_batch::Model,
    quantity_native: Decimal,
) -> Result<bool, ServiceError> {
    let new_quantity = batch.quantity_remaining - quantity_native;
    let depleted = new_quantity <= Decimal::ZERO;
    let stored_quantity = new_quantity.max(Decimal::ZERO);
    let new_status = if depleted {
        BatchStatus::Consumed
    } else {
        batch.status
    };

    let result = MaterialBatchEntity::update_many()
        .col_expr(
            material_batch::Column::QuantityRemaining,
            Expr::value(stored_quantity),
        )
        .col_expr(
            material_batch::Column::Status,
            Expr::value(new_status.to_value()),
        )
        .col_expr(
            material_batch::Column::Version,
            Expr::value(batch.version + 1),
        )
        .col_expr(material_batch::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(material_batch::Column::Id.eq(batch.id))
        .filter(material_batch::Column::Version.eq(batch.version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(batch.id));
    }
    Ok(depleted)
}

/// Upserts the per-product cost cache row after a successful finish.
pub(crate) async fn update_cost_cache_on<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    product_id: Uuid,
    unit_cost: Decimal,
    method: CostingMethod,
) -> Result<product_cost_cache::Model, ServiceError> {
    let now = Utc::now();
    let existing = ProductCostCacheEntity::find()
        .filter(product_cost_cache::Column::StoreId.eq(store_id))
        .filter(product_cost_cache::Column::ProductId.eq(product_id))
        .one(conn)
        .await?;

    let saved = match existing {
        Some(row) => {
            let mut active: product_cost_cache::ActiveModel = row.into();
            active.unit_cost = Set(unit_cost);
            active.costing_method = Set(method);
            active.calculated_at = Set(now);
            active.update(conn).await?
        }
        None => {
            product_cost_cache::ActiveModel {
                id: Set(Uuid::new_v4()),
                store_id: Set(store_id),
                product_id: Set(product_id),
                unit_cost: Set(unit_cost),
                costing_method: Set(method),
                calculated_at: Set(now),
            }
            .insert(conn)
            .await?
        }
    };
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn consumption(material_id: Uuid, final_quantity: Decimal, unit: Unit) -> MaterialConsumption {
        MaterialConsumption {
            material_id,
            material_name: "flour".to_string(),
            required_quantity: final_quantity,
            unit,
            waste_percent: Decimal::ZERO,
            final_quantity,
        }
    }

    fn batch(
        material_id: Uuid,
        day: u32,
        quantity: Decimal,
        unit: Unit,
        unit_cost: Decimal,
    ) -> material_batch::Model {
        let received = Utc.with_ymd_and_hms(2025, 3, day, 8, 0, 0).unwrap();
        material_batch::Model {
            id: Uuid::new_v4(),
            store_id: Uuid::new_v4(),
            material_id,
            quantity_remaining: quantity,
            unit,
            unit_cost,
            total_cost: quantity * unit_cost,
            lot_code: None,
            supplier: None,
            received_at: received,
            expires_at: None,
            status: BatchStatus::Available,
            version: 0,
            created_at: received,
            updated_at: received,
        }
    }

    #[test]
    fn fifo_exhausts_oldest_batch_first() {
        let material_id = Uuid::new_v4();
        let b1 = batch(material_id, 1, dec!(10), Unit::Kg, dec!(2));
        let b2 = batch(material_id, 2, dec!(10), Unit::Kg, dec!(3));
        let scope = ConversionScope::empty();

        let slices = allocate_fifo_for(
            &consumption(material_id, dec!(15), Unit::Kg),
            &[b1.clone(), b2.clone()],
            &scope,
        )
        .unwrap();

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].batch_id, Some(b1.id));
        assert_eq!(slices[0].quantity, dec!(10));
        assert_eq!(slices[0].total_cost, dec!(20));
        assert_eq!(slices[1].batch_id, Some(b2.id));
        assert_eq!(slices[1].quantity, dec!(5));
        assert_eq!(slices[1].total_cost, dec!(15));
    }

    #[test]
    fn fifo_converts_batch_units_into_consumption_units() {
        let material_id = Uuid::new_v4();
        // 2000 g at 0.002/g is 2 kg at 2/kg.
        let b = batch(material_id, 1, dec!(2000), Unit::G, dec!(0.002));
        let scope = ConversionScope::empty();

        let slices = allocate_fifo_for(
            &consumption(material_id, dec!(1.5), Unit::Kg),
            &[b],
            &scope,
        )
        .unwrap();

        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].quantity, dec!(1.5));
        assert_eq!(slices[0].unit_cost, dec!(2));
        assert_eq!(slices[0].total_cost, dec!(3));
    }

    #[test]
    fn fifo_reports_exact_shortfall() {
        let material_id = Uuid::new_v4();
        let b1 = batch(material_id, 1, dec!(12), Unit::Kg, dec!(2));
        let b2 = batch(material_id, 2, dec!(8), Unit::Kg, dec!(2));
        let scope = ConversionScope::empty();

        let err = allocate_fifo_for(
            &consumption(material_id, dec!(25), Unit::Kg),
            &[b1, b2],
            &scope,
        )
        .unwrap_err();

        assert_matches!(
            err,
            ServiceError::InsufficientStock { shortfall, .. } if shortfall == dec!(5)
        );
    }

    #[test]
    fn wac_blends_batch_prices() {
        let material_id = Uuid::new_v4();
        let b1 = batch(material_id, 1, dec!(10), Unit::Kg, dec!(2));
        let b2 = batch(material_id, 2, dec!(10), Unit::Kg, dec!(4));
        let scope = ConversionScope::empty();

        let slice = allocate_wac_for(
            &consumption(material_id, dec!(12), Unit::Kg),
            &[b1, b2],
            &scope,
        )
        .unwrap();

        assert_eq!(slice.batch_id, None);
        assert_eq!(slice.unit_cost, dec!(3));
        assert_eq!(slice.quantity, dec!(12));
        assert_eq!(slice.total_cost, dec!(36));
    }

    #[test]
    fn wac_reports_exact_shortfall() {
        let material_id = Uuid::new_v4();
        let b1 = batch(material_id, 1, dec!(10), Unit::Kg, dec!(2));
        let b2 = batch(material_id, 2, dec!(10), Unit::Kg, dec!(4));
        let scope = ConversionScope::empty();

        let err = allocate_wac_for(
            &consumption(material_id, dec!(25), Unit::Kg),
            &[b1, b2],
            &scope,
        )
        .unwrap_err();

        assert_matches!(
            err,
            ServiceError::InsufficientStock { shortfall, .. } if shortfall == dec!(5)
        );
    }

    #[test]
    fn rollup_matches_reference_numbers() {
        let material_id = Uuid::new_v4();
        let allocations = vec![MaterialAllocation {
            material_id,
            material_name: "flour".to_string(),
            batch_id: None,
            quantity: dec!(50),
            unit: Unit::Kg,
            unit_cost: dec!(2),
            total_cost: dec!(100),
        }];

        let cost = calculate_production_cost(&allocations, dec!(10), dec!(2), dec!(10));

        assert_eq!(cost.material_cost, dec!(100));
        assert_eq!(cost.packaging_cost, dec!(20));
        assert_eq!(cost.overhead_cost, dec!(12));
        assert_eq!(cost.total_cost, dec!(132));
        assert_eq!(cost.unit_cost, dec!(13.2));
    }

    #[test]
    fn rollup_with_zero_overhead_and_packaging() {
        let cost = calculate_production_cost(&[], dec!(4), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(cost.total_cost, Decimal::ZERO);
        assert_eq!(cost.unit_cost, Decimal::ZERO);
    }
}
