use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::unit::Unit;

/// Raw material. All stock comparisons reduce to `base_unit`; `density`
/// (grams per milliliter) is only consulted for mass <-> volume conversion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub base_unit: Unit,
    #[sea_orm(column_type = "Decimal(Some((19, 6)))", nullable)]
    pub density: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub minimum_stock: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::material_batch::Entity")]
    Batches,
    #[sea_orm(has_many = "super::product_bom::Entity")]
    BomLines,
    #[sea_orm(has_many = "super::unit_conversion::Entity")]
    ConversionOverrides,
}

impl Related<super::material_batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::product_bom::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BomLines.def()
    }
}

impl Related<super::unit_conversion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConversionOverrides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
