use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Measurement families. Conversions inside a family use fixed factors;
/// mass <-> volume requires a material density; count never converts across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Mass,
    Volume,
    Count,
}

/// Measurement units understood by the engine. Stored as short lowercase
/// codes, which are also what recipe and stock rows carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    #[sea_orm(string_value = "kg")]
    Kg,
    #[sea_orm(string_value = "g")]
    G,
    #[sea_orm(string_value = "mg")]
    Mg,
    #[sea_orm(string_value = "l")]
    L,
    #[sea_orm(string_value = "ml")]
    Ml,
    #[sea_orm(string_value = "un")]
    Un,
    #[sea_orm(string_value = "dz")]
    Dz,
}

impl Unit {
    pub fn family(self) -> UnitFamily {
        match self {
            Unit::Kg | Unit::G | Unit::Mg => UnitFamily::Mass,
            Unit::L | Unit::Ml => UnitFamily::Volume,
            Unit::Un | Unit::Dz => UnitFamily::Count,
        }
    }

    /// Factor from this unit to its family base (grams, milliliters, units).
    pub fn factor_to_base(self) -> Decimal {
        match self {
            Unit::Kg => dec!(1000),
            Unit::G => Decimal::ONE,
            Unit::Mg => dec!(0.001),
            Unit::L => dec!(1000),
            Unit::Ml => Decimal::ONE,
            Unit::Un => Decimal::ONE,
            Unit::Dz => dec!(12),
        }
    }
}
