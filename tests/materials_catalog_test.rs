//! Catalog-level tests: material CRUD guards, batch receiving,
//! availability queries, conversion overrides, and recipe scaling.

mod common;

use assert_matches::assert_matches;
use common::{assert_dec_eq, received_on, TestEngine};
use fabrica_api::{
    entities::unit::Unit,
    errors::ServiceError,
    services::{
        bom::AddBomLineInput,
        materials::{AvailabilityStatus, CreateMaterialInput, ReceiveBatchInput, UpdateMaterialInput},
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn material_input(name: &str, base_unit: Unit) -> CreateMaterialInput {
    CreateMaterialInput {
        name: name.to_string(),
        sku: None,
        base_unit,
        density: None,
        minimum_stock: None,
    }
}

#[tokio::test]
async fn material_crud_roundtrip() {
    let engine = TestEngine::new().await;
    let svc = &engine.state.materials;

    let created = svc
        .create_material(engine.store_id, material_input("Wheat flour", Unit::Kg))
        .await
        .unwrap();
    assert_eq!(created.base_unit, Unit::Kg);

    let fetched = svc.get_material(engine.store_id, created.id).await.unwrap();
    assert_eq!(fetched.name, "Wheat flour");

    let updated = svc
        .update_material(
            engine.store_id,
            created.id,
            UpdateMaterialInput {
                minimum_stock: Some(dec!(25)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.minimum_stock, Some(dec!(25)));

    svc.delete_material(engine.store_id, created.id)
        .await
        .unwrap();
    assert_matches!(
        svc.get_material(engine.store_id, created.id).await,
        Err(ServiceError::MaterialNotFound(_))
    );
}

#[tokio::test]
async fn material_is_invisible_to_other_stores() {
    let engine = TestEngine::new().await;
    let mat = engine.seed_material("Sugar", Unit::Kg, None).await;

    let other_store = Uuid::new_v4();
    assert_matches!(
        engine.state.materials.get_material(other_store, mat.id).await,
        Err(ServiceError::MaterialNotFound(_))
    );
}

#[tokio::test]
async fn empty_material_name_is_rejected() {
    let engine = TestEngine::new().await;
    let result = engine
        .state
        .materials
        .create_material(engine.store_id, material_input("   ", Unit::Kg))
        .await;
    assert_matches!(result, Err(ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn deleting_material_referenced_by_recipe_is_rejected() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Sourdough loaf", Unit::Un).await;
    let mat = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, mat.id, dec!(10), Unit::Kg, Decimal::ZERO)
        .await;

    assert_matches!(
        engine
            .state
            .materials
            .delete_material(engine.store_id, mat.id)
            .await,
        Err(ServiceError::MaterialInUse(id)) if id == mat.id
    );
}

#[tokio::test]
async fn deleting_material_with_live_stock_is_rejected() {
    let engine = TestEngine::new().await;
    let mat = engine.seed_material("Butter", Unit::Kg, None).await;
    engine
        .seed_batch(mat.id, dec!(5), Unit::Kg, dec!(30), received_on(1))
        .await;

    assert_matches!(
        engine
            .state
            .materials
            .delete_material(engine.store_id, mat.id)
            .await,
        Err(ServiceError::MaterialInUse(_))
    );
}

#[tokio::test]
async fn receive_batch_prices_the_lot() {
    let engine = TestEngine::new().await;
    let mat = engine.seed_material("Olive oil", Unit::L, None).await;

    let batch = engine
        .state
        .materials
        .receive_batch(
            engine.store_id,
            ReceiveBatchInput {
                material_id: mat.id,
                quantity: dec!(12),
                unit: Unit::L,
                unit_cost: dec!(8.5),
                lot_code: Some("OO-2025-03".to_string()),
                supplier: Some("Azienda Agricola".to_string()),
                received_at: None,
                expires_at: None,
            },
        )
        .await
        .unwrap();

    assert_dec_eq(batch.total_cost, dec!(102));
    assert_eq!(batch.version, 0);

    let result = engine
        .state
        .materials
        .receive_batch(
            engine.store_id,
            ReceiveBatchInput {
                material_id: mat.id,
                quantity: Decimal::ZERO,
                unit: Unit::L,
                unit_cost: dec!(8.5),
                lot_code: None,
                supplier: None,
                received_at: None,
                expires_at: None,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn availability_sums_batches_in_the_requested_unit() {
    let engine = TestEngine::new().await;
    let mat = engine.seed_material("Yeast", Unit::G, None).await;
    // 1500 g across two batches, requested in kg.
    engine
        .seed_batch(mat.id, dec!(1000), Unit::G, dec!(0.05), received_on(1))
        .await;
    engine
        .seed_batch(mat.id, dec!(500), Unit::G, dec!(0.06), received_on(2))
        .await;

    let availability = engine
        .state
        .materials
        .check_availability(engine.store_id, mat.id, dec!(1), Unit::Kg)
        .await
        .unwrap();

    assert_eq!(availability.status, AvailabilityStatus::Available);
    assert_dec_eq(availability.total_available, dec!(1.5));
    assert_eq!(availability.shortfall, Decimal::ZERO);
    assert_eq!(availability.batches.len(), 2);
    // FIFO: oldest batch first.
    assert!(availability.batches[0].received_at < availability.batches[1].received_at);
}

#[tokio::test]
async fn availability_classifies_partial_and_unavailable() {
    let engine = TestEngine::new().await;
    let mat = engine.seed_material("Cocoa", Unit::Kg, None).await;

    let empty = engine
        .state
        .materials
        .check_availability(engine.store_id, mat.id, dec!(10), Unit::Kg)
        .await
        .unwrap();
    assert_eq!(empty.status, AvailabilityStatus::Unavailable);
    assert_dec_eq(empty.shortfall, dec!(10));

    engine
        .seed_batch(mat.id, dec!(4), Unit::Kg, dec!(20), received_on(3))
        .await;
    let partial = engine
        .state
        .materials
        .check_availability(engine.store_id, mat.id, dec!(10), Unit::Kg)
        .await
        .unwrap();
    assert_eq!(partial.status, AvailabilityStatus::Partial);
    assert_dec_eq(partial.shortfall, dec!(6));
}

#[tokio::test]
async fn conversion_override_beats_generic_factor() {
    let engine = TestEngine::new().await;
    let mat = engine.seed_material("Honey", Unit::Kg, None).await;

    engine
        .state
        .materials
        .set_conversion_override(engine.store_id, mat.id, Unit::Kg, Unit::L, dec!(0.7))
        .await
        .unwrap();

    let converted = engine
        .state
        .units
        .convert(engine.store_id, dec!(10), Unit::Kg, Unit::L, Some(mat.id))
        .await
        .unwrap();
    assert_dec_eq(converted, dec!(7));
}

#[tokio::test]
async fn density_drives_mass_volume_conversion() {
    let engine = TestEngine::new().await;
    let oil = engine
        .seed_material("Sunflower oil", Unit::L, Some(dec!(0.92)))
        .await;
    let water = engine.seed_material("Water", Unit::L, None).await;

    let liters = engine
        .state
        .units
        .convert(engine.store_id, dec!(0.92), Unit::Kg, Unit::L, Some(oil.id))
        .await
        .unwrap();
    assert_dec_eq(liters, dec!(1));

    assert_matches!(
        engine
            .state
            .units
            .convert(engine.store_id, dec!(1), Unit::Kg, Unit::L, Some(water.id))
            .await,
        Err(ServiceError::MissingDensity { .. })
    );
}

#[tokio::test]
async fn recipe_scaling_is_linear() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Focaccia", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    let oil = engine.seed_material("Oil", Unit::L, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(10), Unit::Kg, dec!(10))
        .await;
    engine
        .seed_bom_line(product.id, oil.id, dec!(2), Unit::L, Decimal::ZERO)
        .await;

    // Double the 100-unit baseline.
    let recipe = engine
        .state
        .bom
        .scale_recipe(engine.store_id, product.id, dec!(200), Unit::Un)
        .await
        .unwrap();

    assert_dec_eq(recipe.scaling_factor, dec!(2));
    assert_eq!(recipe.ingredients.len(), 2);
    let flour_line = recipe
        .ingredients
        .iter()
        .find(|i| i.material_id == flour.id)
        .unwrap();
    assert_dec_eq(flour_line.scaled_quantity, dec!(20));
    // 20 x 1.10 waste.
    assert_dec_eq(flour_line.final_quantity, dec!(22));
    let oil_line = recipe
        .ingredients
        .iter()
        .find(|i| i.material_id == oil.id)
        .unwrap();
    assert_dec_eq(oil_line.final_quantity, dec!(4));
}

#[tokio::test]
async fn scaling_a_product_without_recipe_fails() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Resale item", Unit::Un).await;

    assert_matches!(
        engine
            .state
            .bom
            .scale_recipe(engine.store_id, product.id, dec!(50), Unit::Un)
            .await,
        Err(ServiceError::RecipeNotFound(id)) if id == product.id
    );
}

#[tokio::test]
async fn bom_line_waste_must_stay_in_range() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Cake", Unit::Un).await;
    let mat = engine.seed_material("Sugar", Unit::Kg, None).await;

    let result = engine
        .state
        .bom
        .add_bom_line(
            engine.store_id,
            AddBomLineInput {
                product_id: product.id,
                material_id: mat.id,
                quantity: dec!(1),
                unit: Unit::Kg,
                waste_percent: dec!(120),
                notes: None,
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn low_stock_report_flags_materials_below_minimum() {
    let engine = TestEngine::new().await;
    let svc = &engine.state.materials;

    let low = svc
        .create_material(
            engine.store_id,
            CreateMaterialInput {
                name: "Vanilla".to_string(),
                sku: None,
                base_unit: Unit::G,
                density: None,
                minimum_stock: Some(dec!(500)),
            },
        )
        .await
        .unwrap();
    engine
        .seed_batch(low.id, dec!(120), Unit::G, dec!(1.2), received_on(5))
        .await;

    let fine = svc
        .create_material(
            engine.store_id,
            CreateMaterialInput {
                name: "Salt".to_string(),
                sku: None,
                base_unit: Unit::Kg,
                density: None,
                minimum_stock: Some(dec!(1)),
            },
        )
        .await
        .unwrap();
    engine
        .seed_batch(fine.id, dec!(10), Unit::Kg, dec!(0.8), received_on(5))
        .await;

    let report = svc.list_below_minimum(engine.store_id).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].material_id, low.id);
    assert_dec_eq(report[0].available, dec!(120));
}
