use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        material::{self, Entity as MaterialEntity},
        material_batch::{self, BatchStatus, Entity as MaterialBatchEntity},
        product_bom::{self, Entity as ProductBomEntity},
        unit::Unit,
        unit_conversion::{self, Entity as UnitConversionEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::units::{convert_quantity, ConversionScope},
};

#[derive(Debug, Clone)]
pub struct CreateMaterialInput {
    pub name: String,
    pub sku: Option<String>,
    pub base_unit: Unit,
    pub density: Option<Decimal>,
    pub minimum_stock: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMaterialInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub density: Option<Decimal>,
    pub minimum_stock: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ReceiveBatchInput {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
    pub unit_cost: Decimal,
    pub lot_code: Option<String>,
    pub supplier: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Partial,
    Unavailable,
}

/// Per-batch slice of an availability answer, quantities expressed in the
/// requested unit, FIFO order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAvailability {
    pub batch_id: Uuid,
    pub lot_code: Option<String>,
    pub quantity: Decimal,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialAvailability {
    pub material_id: Uuid,
    pub requested_quantity: Decimal,
    pub unit: Unit,
    pub total_available: Decimal,
    pub status: AvailabilityStatus,
    pub shortfall: Decimal,
    pub batches: Vec<BatchAvailability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockMaterial {
    pub material_id: Uuid,
    pub name: String,
    pub base_unit: Unit,
    pub minimum_stock: Decimal,
    pub available: Decimal,
}

/// Catalog service for raw materials, their batches, and per-material
/// conversion overrides. Everything is scoped by the calling store.
#[derive(Clone)]
pub struct MaterialsService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl MaterialsService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_material(
        &self,
        store_id: Uuid,
        input: CreateMaterialInput,
    ) -> Result<material::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Material name cannot be empty".to_string(),
            ));
        }
        if let Some(density) = input.density {
            if density <= Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "Density must be positive, got: {}",
                    density
                )));
            }
        }
        if let Some(minimum) = input.minimum_stock {
            if minimum < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "Minimum stock cannot be negative, got: {}",
                    minimum
                )));
            }
        }

        let now = Utc::now();
        let mat = material::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            name: Set(input.name),
            sku: Set(input.sku),
            base_unit: Set(input.base_unit),
            density: Set(input.density),
            minimum_stock: Set(input.minimum_stock),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = mat.insert(&*self.db).await?;

        counter!("catalog.materials.created", 1);
        self.event_sender
            .send_or_log(Event::MaterialCreated {
                store_id,
                material_id: created.id,
            })
            .await;

        info!("Material created: id={} name={}", created.id, created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_material(
        &self,
        store_id: Uuid,
        material_id: Uuid,
    ) -> Result<material::Model, ServiceError> {
        find_material(&*self.db, store_id, material_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_materials(&self, store_id: Uuid) -> Result<Vec<material::Model>, ServiceError> {
        Ok(MaterialEntity::find()
            .filter(material::Column::StoreId.eq(store_id))
            .order_by_asc(material::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_material(
        &self,
        store_id: Uuid,
        material_id: Uuid,
        input: UpdateMaterialInput,
    ) -> Result<material::Model, ServiceError> {
        let existing = find_material(&*self.db, store_id, material_id).await?;

        if let Some(density) = input.density {
            if density <= Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "Density must be positive, got: {}",
                    density
                )));
            }
        }

        let mut active: material::ActiveModel = existing.into();
        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::InvalidInput(
                    "Material name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(sku) = input.sku {
            active.sku = Set(Some(sku));
        }
        if let Some(density) = input.density {
            active.density = Set(Some(density));
        }
        if let Some(minimum) = input.minimum_stock {
            active.minimum_stock = Set(Some(minimum));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a material unless it still backs a recipe or holds stock
    /// that has not been fully consumed.
    #[instrument(skip(self))]
    pub async fn delete_material(
        &self,
        store_id: Uuid,
        material_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mat = find_material(&*self.db, store_id, material_id).await?;

        let bom_refs = ProductBomEntity::find()
            .filter(product_bom::Column::StoreId.eq(store_id))
            .filter(product_bom::Column::MaterialId.eq(material_id))
            .count(&*self.db)
            .await?;
        if bom_refs > 0 {
            return Err(ServiceError::MaterialInUse(material_id));
        }

        let live_batches = MaterialBatchEntity::find()
            .filter(material_batch::Column::StoreId.eq(store_id))
            .filter(material_batch::Column::MaterialId.eq(material_id))
            .filter(material_batch::Column::Status.ne(BatchStatus::Consumed))
            .count(&*self.db)
            .await?;
        if live_batches > 0 {
            return Err(ServiceError::MaterialInUse(material_id));
        }

        mat.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MaterialDeleted {
                store_id,
                material_id,
            })
            .await;

        info!("Material deleted: {}", material_id);
        Ok(())
    }

    /// Records a received lot of stock at its purchase cost.
    #[instrument(skip(self, input))]
    pub async fn receive_batch(
        &self,
        store_id: Uuid,
        input: ReceiveBatchInput,
    ) -> Result<material_batch::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Batch quantity must be positive, got: {}",
                input.quantity
            )));
        }
        if input.unit_cost < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Unit cost cannot be negative, got: {}",
                input.unit_cost
            )));
        }

        find_material(&*self.db, store_id, input.material_id).await?;

        let now = Utc::now();
        let batch = material_batch::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            material_id: Set(input.material_id),
            quantity_remaining: Set(input.quantity),
            unit: Set(input.unit),
            unit_cost: Set(input.unit_cost),
            total_cost: Set(input.quantity * input.unit_cost),
            lot_code: Set(input.lot_code),
            supplier: Set(input.supplier),
            received_at: Set(input.received_at.unwrap_or(now)),
            expires_at: Set(input.expires_at),
            status: Set(BatchStatus::Available),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = batch.insert(&*self.db).await?;

        counter!("catalog.batches.received", 1);
        histogram!(
            "catalog.batches.received_quantity",
            created.quantity_remaining.to_f64().unwrap_or(0.0)
        );
        self.event_sender
            .send_or_log(Event::MaterialBatchReceived {
                store_id,
                material_id: created.material_id,
                batch_id: created.id,
                quantity: created.quantity_remaining,
                unit: created.unit,
            })
            .await;

        info!(
            "Batch received: material={} batch={} qty={} {}",
            created.material_id, created.id, created.quantity_remaining, created.unit
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_batch(
        &self,
        store_id: Uuid,
        batch_id: Uuid,
    ) -> Result<material_batch::Model, ServiceError> {
        MaterialBatchEntity::find_by_id(batch_id)
            .filter(material_batch::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::BatchNotFound(batch_id))
    }

    /// Batches for a material in FIFO (received-at ascending) order.
    #[instrument(skip(self))]
    pub async fn list_batches(
        &self,
        store_id: Uuid,
        material_id: Uuid,
    ) -> Result<Vec<material_batch::Model>, ServiceError> {
        Ok(MaterialBatchEntity::find()
            .filter(material_batch::Column::StoreId.eq(store_id))
            .filter(material_batch::Column::MaterialId.eq(material_id))
            .order_by_asc(material_batch::Column::ReceivedAt)
            .all(&*self.db)
            .await?)
    }

    /// Registers (or replaces) a material-specific conversion factor that
    /// overrides the generic family table for this from/to pair.
    #[instrument(skip(self))]
    pub async fn set_conversion_override(
        &self,
        store_id: Uuid,
        material_id: Uuid,
        from_unit: Unit,
        to_unit: Unit,
        factor: Decimal,
    ) -> Result<unit_conversion::Model, ServiceError> {
        if factor <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "Conversion factor must be positive, got: {}",
                factor
            )));
        }
        find_material(&*self.db, store_id, material_id).await?;

        let now = Utc::now();
        let existing = UnitConversionEntity::find()
            .filter(unit_conversion::Column::StoreId.eq(store_id))
            .filter(unit_conversion::Column::MaterialId.eq(material_id))
            .filter(unit_conversion::Column::FromUnit.eq(from_unit))
            .filter(unit_conversion::Column::ToUnit.eq(to_unit))
            .one(&*self.db)
            .await?;

        let saved = match existing {
            Some(row) => {
                let mut active: unit_conversion::ActiveModel = row.into();
                active.factor = Set(factor);
                active.updated_at = Set(now);
                active.update(&*self.db).await?
            }
            None => {
                unit_conversion::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    store_id: Set(store_id),
                    material_id: Set(material_id),
                    from_unit: Set(from_unit),
                    to_unit: Set(to_unit),
                    factor: Set(factor),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&*self.db)
                .await?
            }
        };

        Ok(saved)
    }

    /// Sums available batches (converted into the requested unit) in FIFO
    /// order and classifies the result against the requested quantity.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        store_id: Uuid,
        material_id: Uuid,
        required_quantity: Decimal,
        required_unit: Unit,
    ) -> Result<MaterialAvailability, ServiceError> {
        check_availability_on(
            &*self.db,
            store_id,
            material_id,
            required_quantity,
            required_unit,
        )
        .await
    }

    /// Materials whose available stock (in their base unit) sits below the
    /// configured minimum threshold.
    #[instrument(skip(self))]
    pub async fn list_below_minimum(
        &self,
        store_id: Uuid,
    ) -> Result<Vec<LowStockMaterial>, ServiceError> {
        let materials = MaterialEntity::find()
            .filter(material::Column::StoreId.eq(store_id))
            .filter(material::Column::MinimumStock.is_not_null())
            .all(&*self.db)
            .await?;

        let mut low = Vec::new();
        for mat in materials {
            let minimum = match mat.minimum_stock {
                Some(minimum) => minimum,
                None => continue,
            };
            let availability =
                check_availability_on(&*self.db, store_id, mat.id, minimum, mat.base_unit).await?;
            if availability.total_available < minimum {
                low.push(LowStockMaterial {
                    material_id: mat.id,
                    name: mat.name,
                    base_unit: mat.base_unit,
                    minimum_stock: minimum,
                    available: availability.total_available,
                });
            }
        }

        Ok(low)
    }
}

pub(crate) async fn find_material<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    material_id: Uuid,
) -> Result<material::Model, ServiceError> {
    MaterialEntity::find_by_id(material_id)
        .filter(material::Column::StoreId.eq(store_id))
        .one(conn)
        .await?
        .ok_or(ServiceError::MaterialNotFound(material_id))
}

/// Connection-generic availability check so order start/finish can run it
/// against a transaction.
pub(crate) async fn check_availability_on<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    material_id: Uuid,
    required_quantity: Decimal,
    required_unit: Unit,
) -> Result<MaterialAvailability, ServiceError> {
    let mat = find_material(conn, store_id, material_id).await?;
    let scope = ConversionScope::load(conn, store_id, &mat).await?;

    let batches = MaterialBatchEntity::find()
        .filter(material_batch::Column::StoreId.eq(store_id))
        .filter(material_batch::Column::MaterialId.eq(material_id))
        .filter(material_batch::Column::Status.eq(BatchStatus::Available))
        .order_by_asc(material_batch::Column::ReceivedAt)
        .all(conn)
        .await?;

    let mut total = Decimal::ZERO;
    let mut details = Vec::with_capacity(batches.len());
    for batch in batches {
        let in_requested_unit =
            convert_quantity(batch.quantity_remaining, batch.unit, required_unit, &scope)?;
        total += in_requested_unit;
        details.push(BatchAvailability {
            batch_id: batch.id,
            lot_code: batch.lot_code,
            quantity: in_requested_unit,
            received_at: batch.received_at,
        });
    }

    let status = if total >= required_quantity {
        AvailabilityStatus::Available
    } else if total > Decimal::ZERO {
        AvailabilityStatus::Partial
    } else {
        AvailabilityStatus::Unavailable
    };
    let shortfall = (required_quantity - total).max(Decimal::ZERO);

    Ok(MaterialAvailability {
        material_id,
        requested_quantity: required_quantity,
        unit: required_unit,
        total_available: total,
        status,
        shortfall,
        batches: details,
    })
}
