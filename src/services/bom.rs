use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        product::{self, Entity as ProductEntity},
        product_bom::{self, Entity as ProductBomEntity},
        unit::Unit,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        materials::find_material,
        units::{convert_quantity, ConversionScope},
    },
};

/// The BOM baseline: line quantities are defined per this many units of
/// the product's base unit.
pub const BASE_RECIPE_SIZE: Decimal = dec!(100);

#[derive(Debug, Clone)]
pub struct AddBomLineInput {
    pub product_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
    pub waste_percent: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateBomLineInput {
    pub quantity: Option<Decimal>,
    pub unit: Option<Unit>,
    pub waste_percent: Option<Decimal>,
    pub notes: Option<String>,
}

/// One ingredient of a recipe scaled to a target output.
#[derive(Debug, Clone, Serialize)]
pub struct ScaledIngredient {
    pub material_id: Uuid,
    pub material_name: String,
    /// Quantity per 100 base-recipe units, as entered.
    pub base_quantity: Decimal,
    /// base_quantity x scaling factor.
    pub scaled_quantity: Decimal,
    /// scaled_quantity x (1 + waste_percent / 100).
    pub final_quantity: Decimal,
    pub unit: Unit,
    pub waste_percent: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScaledRecipe {
    pub product_id: Uuid,
    pub scaling_factor: Decimal,
    pub ingredients: Vec<ScaledIngredient>,
}

/// Bill-of-materials catalog: ingredient lines per product plus the
/// scaling math every costing path is built on.
#[derive(Clone)]
pub struct BomService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl BomService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn add_bom_line(
        &self,
        store_id: Uuid,
        input: AddBomLineInput,
    ) -> Result<product_bom::Model, ServiceError> {
        validate_line_values(input.quantity, input.waste_percent)?;
        find_product(&*self.db, store_id, input.product_id).await?;
        find_material(&*self.db, store_id, input.material_id).await?;

        let now = Utc::now();
        let line = product_bom::ActiveModel {
            id: Set(Uuid::new_v4()),
            store_id: Set(store_id),
            product_id: Set(input.product_id),
            material_id: Set(input.material_id),
            quantity: Set(input.quantity),
            unit: Set(input.unit),
            waste_percent: Set(input.waste_percent),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = line.insert(&*self.db).await?;

        counter!("catalog.bom_lines.added", 1);
        self.event_sender
            .send_or_log(Event::BomLineAdded {
                store_id,
                product_id: created.product_id,
                material_id: created.material_id,
            })
            .await;

        info!(
            "BOM line added: product={} material={} qty={} {}",
            created.product_id, created.material_id, created.quantity, created.unit
        );
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_bom_line(
        &self,
        store_id: Uuid,
        line_id: Uuid,
        input: UpdateBomLineInput,
    ) -> Result<product_bom::Model, ServiceError> {
        let existing = ProductBomEntity::find_by_id(line_id)
            .filter(product_bom::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::BomLineNotFound(line_id))?;

        let quantity = input.quantity.unwrap_or(existing.quantity);
        let waste = input.waste_percent.unwrap_or(existing.waste_percent);
        validate_line_values(quantity, waste)?;

        let mut active: product_bom::ActiveModel = existing.into();
        active.quantity = Set(quantity);
        active.waste_percent = Set(waste);
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn remove_bom_line(&self, store_id: Uuid, line_id: Uuid) -> Result<(), ServiceError> {
        let existing = ProductBomEntity::find_by_id(line_id)
            .filter(product_bom::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::BomLineNotFound(line_id))?;

        let product_id = existing.product_id;
        let material_id = existing.material_id;
        existing.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BomLineRemoved {
                store_id,
                product_id,
                material_id,
            })
            .await;

        Ok(())
    }

    /// All BOM lines for a product. An empty list means the product is not
    /// manufactured.
    #[instrument(skip(self))]
    pub async fn list_bom(
        &self,
        store_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<product_bom::Model>, ServiceError> {
        find_product(&*self.db, store_id, product_id).await?;
        Ok(ProductBomEntity::find()
            .filter(product_bom::Column::StoreId.eq(store_id))
            .filter(product_bom::Column::ProductId.eq(product_id))
            .order_by_asc(product_bom::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Scales a product's recipe to a target output quantity.
    ///
    /// `scaling_factor = convert(target, target_unit, base_unit) / 100`;
    /// each line is scaled linearly and then inflated by its waste percent.
    /// Fails with `RecipeNotFound` when the product has no BOM lines.
    #[instrument(skip(self))]
    pub async fn scale_recipe(
        &self,
        store_id: Uuid,
        product_id: Uuid,
        target_quantity: Decimal,
        target_unit: Unit,
    ) -> Result<ScaledRecipe, ServiceError> {
        scale_recipe_on(&*self.db, store_id, product_id, target_quantity, target_unit).await
    }
}

fn validate_line_values(quantity: Decimal, waste_percent: Decimal) -> Result<(), ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "BOM quantity must be positive, got: {}",
            quantity
        )));
    }
    if waste_percent < Decimal::ZERO || waste_percent > dec!(100) {
        return Err(ServiceError::InvalidInput(format!(
            "Waste percent must be between 0 and 100, got: {}",
            waste_percent
        )));
    }
    Ok(())
}

pub(crate) async fn find_product<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    product_id: Uuid,
) -> Result<product::Model, ServiceError> {
    ProductEntity::find_by_id(product_id)
        .filter(product::Column::StoreId.eq(store_id))
        .one(conn)
        .await?
        .ok_or(ServiceError::ProductNotFound(product_id))
}

/// Connection-generic scaling so costing can run it inside a transaction.
pub(crate) async fn scale_recipe_on<C: ConnectionTrait>(
    conn: &C,
    store_id: Uuid,
    product_id: Uuid,
    target_quantity: Decimal,
    target_unit: Unit,
) -> Result<ScaledRecipe, ServiceError> {
    if target_quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidInput(format!(
            "Target quantity must be positive, got: {}",
            target_quantity
        )));
    }

    let prod = find_product(conn, store_id, product_id).await?;

    let lines = ProductBomEntity::find()
        .filter(product_bom::Column::StoreId.eq(store_id))
        .filter(product_bom::Column::ProductId.eq(product_id))
        .order_by_asc(product_bom::Column::CreatedAt)
        .all(conn)
        .await?;
    if lines.is_empty() {
        return Err(ServiceError::RecipeNotFound(product_id));
    }

    let target_in_base = convert_quantity(
        target_quantity,
        target_unit,
        prod.base_unit,
        &ConversionScope::empty(),
    )?;
    let scaling_factor = target_in_base / BASE_RECIPE_SIZE;

    let mut ingredients = Vec::with_capacity(lines.len());
    for line in lines {
        let mat = find_material(conn, store_id, line.material_id).await?;
        let scaled = line.quantity * scaling_factor;
        let final_quantity = scaled * (Decimal::ONE + line.waste_percent / dec!(100));
        ingredients.push(ScaledIngredient {
            material_id: line.material_id,
            material_name: mat.name,
            base_quantity: line.quantity,
            scaled_quantity: scaled,
            final_quantity,
            unit: line.unit,
            waste_percent: line.waste_percent,
        });
    }

    Ok(ScaledRecipe {
        product_id,
        scaling_factor,
        ingredients,
    })
}
