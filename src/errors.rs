use rust_decimal::Decimal;
use sea_orm::error::DbErr;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::unit::Unit;

/// A single material the caller is short on, with enough detail to render
/// an actionable message.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialShortage {
    pub material_id: Uuid,
    pub material_name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub shortfall: Decimal,
    pub unit: Unit,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Material {0} not found")]
    MaterialNotFound(Uuid),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Batch {0} not found")]
    BatchNotFound(Uuid),

    #[error("Production order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Product {0} has no bill of materials")]
    RecipeNotFound(Uuid),

    #[error("BOM line {0} not found")]
    BomLineNotFound(Uuid),

    #[error("Density required to convert {from} to {to} for material {material_id}")]
    MissingDensity {
        material_id: Uuid,
        from: Unit,
        to: Unit,
    },

    #[error("Cannot convert between {from} and {to}")]
    IncompatibleUnits { from: Unit, to: Unit },

    #[error("Insufficient stock of {material_name}: short {shortfall} {unit}")]
    InsufficientStock {
        material_id: Uuid,
        material_name: String,
        shortfall: Decimal,
        unit: Unit,
    },

    #[error("Insufficient materials: {} unavailable", .0.len())]
    InsufficientMaterials(Vec<MaterialShortage>),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Material {0} is in use by a recipe or active batch")]
    MaterialInUse(Uuid),

    #[error("No cost information available for product {0}")]
    NoCostInformation(Uuid),

    #[error("Concurrent modification of batch {0}")]
    ConcurrentModification(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// True for the error kinds that denote a missing entity rather than a
    /// rejected operation.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MaterialNotFound(_)
                | Self::ProductNotFound(_)
                | Self::BatchNotFound(_)
                | Self::OrderNotFound(_)
                | Self::BomLineNotFound(_)
        )
    }
}
