use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{
        material::{self, Entity as MaterialEntity},
        unit::{Unit, UnitFamily},
        unit_conversion::{self, Entity as UnitConversionEntity},
    },
    errors::ServiceError,
};

/// Everything needed to convert quantities for one material without
/// touching the database again: its density and any override rows.
#[derive(Debug, Clone, Default)]
pub struct ConversionScope {
    material_id: Option<Uuid>,
    density: Option<Decimal>,
    overrides: HashMap<(Unit, Unit), Decimal>,
}

impl ConversionScope {
    /// Scope with no material context. Same-family conversions only.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_density(material_id: Uuid, density: Option<Decimal>) -> Self {
        Self {
            material_id: Some(material_id),
            density,
            overrides: HashMap::new(),
        }
    }

    /// Loads the material's density and override conversions in one scan.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        store_id: Uuid,
        mat: &material::Model,
    ) -> Result<Self, ServiceError> {
        let overrides = UnitConversionEntity::find()
            .filter(unit_conversion::Column::StoreId.eq(store_id))
            .filter(unit_conversion::Column::MaterialId.eq(mat.id))
            .all(conn)
            .await?
            .into_iter()
            .map(|row| ((row.from_unit, row.to_unit), row.factor))
            .collect();

        Ok(Self {
            material_id: Some(mat.id),
            density: mat.density,
            overrides,
        })
    }
}

/// Converts `quantity` from one unit to another.
///
/// Identity conversions return the input untouched. A material-specific
/// override factor wins over the generic family table. Mass <-> volume
/// needs a density (grams per milliliter) in scope; count units never
/// convert across families.
pub fn convert_quantity(
    quantity: Decimal,
    from: Unit,
    to: Unit,
    scope: &ConversionScope,
) -> Result<Decimal, ServiceError> {
    if from == to {
        return Ok(quantity);
    }

    if let Some(factor) = scope.overrides.get(&(from, to)) {
        return Ok(quantity * factor);
    }

    match (from.family(), to.family()) {
        (a, b) if a == b => Ok(quantity * from.factor_to_base() / to.factor_to_base()),
        (UnitFamily::Mass, UnitFamily::Volume) => {
            let density = require_density(scope, from, to)?;
            let grams = quantity * from.factor_to_base();
            Ok(grams / density / to.factor_to_base())
        }
        (UnitFamily::Volume, UnitFamily::Mass) => {
            let density = require_density(scope, from, to)?;
            let milliliters = quantity * from.factor_to_base();
            Ok(milliliters * density / to.factor_to_base())
        }
        _ => Err(ServiceError::IncompatibleUnits { from, to }),
    }
}

fn require_density(scope: &ConversionScope, from: Unit, to: Unit) -> Result<Decimal, ServiceError> {
    scope.density.ok_or(ServiceError::MissingDensity {
        material_id: scope.material_id.unwrap_or_default(),
        from,
        to,
    })
}

/// Database-backed conversion entry point for callers that only hold a
/// material id.
#[derive(Clone)]
pub struct UnitConversionService {
    db: Arc<DatabaseConnection>,
}

impl UnitConversionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn convert(
        &self,
        store_id: Uuid,
        quantity: Decimal,
        from: Unit,
        to: Unit,
        material_id: Option<Uuid>,
    ) -> Result<Decimal, ServiceError> {
        // Identity and plain same-family conversions need no lookup.
        let material_id = match material_id {
            Some(id) if from != to => id,
            _ => return convert_quantity(quantity, from, to, &ConversionScope::empty()),
        };

        let mat = MaterialEntity::find_by_id(material_id)
            .filter(material::Column::StoreId.eq(store_id))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::MaterialNotFound(material_id))?;

        let scope = ConversionScope::load(&*self.db, store_id, &mat).await?;
        convert_quantity(quantity, from, to, &scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn scope_with_density(density: Decimal) -> ConversionScope {
        ConversionScope::for_density(Uuid::new_v4(), Some(density))
    }

    #[test]
    fn identity_is_a_no_op() {
        for unit in [Unit::Kg, Unit::G, Unit::Mg, Unit::L, Unit::Ml, Unit::Un, Unit::Dz] {
            let q = dec!(3.1415);
            assert_eq!(
                convert_quantity(q, unit, unit, &ConversionScope::empty()).unwrap(),
                q
            );
        }
    }

    #[test]
    fn mass_family_factors() {
        let scope = ConversionScope::empty();
        assert_eq!(
            convert_quantity(dec!(2.5), Unit::Kg, Unit::G, &scope).unwrap(),
            dec!(2500)
        );
        assert_eq!(
            convert_quantity(dec!(500), Unit::Mg, Unit::G, &scope).unwrap(),
            dec!(0.5)
        );
    }

    #[test]
    fn volume_family_factors() {
        let scope = ConversionScope::empty();
        assert_eq!(
            convert_quantity(dec!(1.5), Unit::L, Unit::Ml, &scope).unwrap(),
            dec!(1500)
        );
    }

    #[test]
    fn count_family_factors() {
        let scope = ConversionScope::empty();
        assert_eq!(
            convert_quantity(dec!(2), Unit::Dz, Unit::Un, &scope).unwrap(),
            dec!(24)
        );
    }

    #[test]
    fn mass_to_volume_uses_density() {
        // 1 kg at 0.8 g/ml -> 1250 ml -> 1.25 l
        let scope = scope_with_density(dec!(0.8));
        assert_eq!(
            convert_quantity(dec!(1), Unit::Kg, Unit::L, &scope).unwrap(),
            dec!(1.25)
        );
    }

    #[test]
    fn volume_to_mass_uses_density() {
        let scope = scope_with_density(dec!(1.2));
        assert_eq!(
            convert_quantity(dec!(500), Unit::Ml, Unit::G, &scope).unwrap(),
            dec!(600)
        );
    }

    #[test]
    fn missing_density_is_reported() {
        let result = convert_quantity(dec!(1), Unit::Kg, Unit::L, &ConversionScope::empty());
        assert_matches!(result, Err(ServiceError::MissingDensity { .. }));
    }

    #[test]
    fn count_never_crosses_families() {
        let scope = scope_with_density(dec!(1));
        assert_matches!(
            convert_quantity(dec!(1), Unit::Un, Unit::Kg, &scope),
            Err(ServiceError::IncompatibleUnits { .. })
        );
        assert_matches!(
            convert_quantity(dec!(1), Unit::L, Unit::Dz, &scope),
            Err(ServiceError::IncompatibleUnits { .. })
        );
    }

    #[test]
    fn override_beats_generic_factor() {
        let mut scope = scope_with_density(dec!(1));
        scope
            .overrides
            .insert((Unit::Kg, Unit::L), dec!(0.5));
        assert_eq!(
            convert_quantity(dec!(4), Unit::Kg, Unit::L, &scope).unwrap(),
            dec!(2)
        );
    }

    proptest! {
        /// Same-family conversions round-trip within decimal rounding noise.
        #[test]
        fn round_trip_is_stable(cents in 1i64..1_000_000_000, pair in 0usize..4) {
            let pairs = [
                (Unit::Kg, Unit::G),
                (Unit::G, Unit::Mg),
                (Unit::L, Unit::Ml),
                (Unit::Dz, Unit::Un),
            ];
            let (a, b) = pairs[pair];
            let scope = ConversionScope::empty();
            let x = Decimal::new(cents, 2);

            let there = convert_quantity(x, a, b, &scope).unwrap();
            let back = convert_quantity(there, b, a, &scope).unwrap();

            let tolerance = dec!(0.000000000001) * (Decimal::ONE + x.abs());
            prop_assert!((back - x).abs() <= tolerance, "{} -> {} -> {}", x, there, back);
        }
    }
}
