//! Costing engine tests against a real (in-memory) store: consumption
//! calculation, FIFO/WAC allocation, price suggestion, and cost history.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::{assert_dec_eq, received_on, TestEngine};
use fabrica_api::{
    entities::{product_cost_cache, production_order::CostingMethod, unit::Unit},
    errors::ServiceError,
    services::costing::{CostSource, GetSuggestedPriceInput},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use uuid::Uuid;

#[tokio::test]
async fn consumptions_are_empty_without_a_recipe() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Resale soda", Unit::Un).await;

    let consumptions = engine
        .state
        .costing
        .calculate_material_consumptions(engine.store_id, product.id, dec!(50), Unit::Un)
        .await
        .unwrap();
    assert!(consumptions.is_empty());
}

#[tokio::test]
async fn consumptions_carry_waste_inflated_quantities() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Brioche", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(8), Unit::Kg, dec!(25))
        .await;

    let consumptions = engine
        .state
        .costing
        .calculate_material_consumptions(engine.store_id, product.id, dec!(50), Unit::Un)
        .await
        .unwrap();

    assert_eq!(consumptions.len(), 1);
    // factor 0.5: required 4, final 4 x 1.25 = 5.
    assert_dec_eq(consumptions[0].required_quantity, dec!(4));
    assert_dec_eq(consumptions[0].final_quantity, dec!(5));
}

#[tokio::test]
async fn fifo_allocation_walks_batches_oldest_first() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Baguette", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(15), Unit::Kg, Decimal::ZERO)
        .await;

    let old_batch = engine
        .seed_batch(flour.id, dec!(10), Unit::Kg, dec!(2), received_on(1))
        .await;
    let new_batch = engine
        .seed_batch(flour.id, dec!(10), Unit::Kg, dec!(3), received_on(2))
        .await;

    let consumptions = engine
        .state
        .costing
        .calculate_material_consumptions(engine.store_id, product.id, dec!(100), Unit::Un)
        .await
        .unwrap();
    let allocations = engine
        .state
        .costing
        .allocate_fifo(engine.store_id, &consumptions)
        .await
        .unwrap();

    assert_eq!(allocations.len(), 2);
    assert_eq!(allocations[0].batch_id, Some(old_batch.id));
    assert_dec_eq(allocations[0].quantity, dec!(10));
    assert_dec_eq(allocations[0].total_cost, dec!(20));
    assert_eq!(allocations[1].batch_id, Some(new_batch.id));
    assert_dec_eq(allocations[1].quantity, dec!(5));
    assert_dec_eq(allocations[1].total_cost, dec!(15));
}

#[tokio::test]
async fn wac_allocation_blends_prices_across_batches() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Ciabatta", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(16), Unit::Kg, Decimal::ZERO)
        .await;

    engine
        .seed_batch(flour.id, dec!(10), Unit::Kg, dec!(2), received_on(1))
        .await;
    engine
        .seed_batch(flour.id, dec!(10), Unit::Kg, dec!(4), received_on(2))
        .await;

    let consumptions = engine
        .state
        .costing
        .calculate_material_consumptions(engine.store_id, product.id, dec!(100), Unit::Un)
        .await
        .unwrap();
    let allocations = engine
        .state
        .costing
        .allocate_wac(engine.store_id, &consumptions)
        .await
        .unwrap();

    // One blended line, no batch reference, priced at (10x2 + 10x4)/20 = 3.
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].batch_id, None);
    assert_dec_eq(allocations[0].unit_cost, dec!(3));
    assert_dec_eq(allocations[0].quantity, dec!(16));
    assert_dec_eq(allocations[0].total_cost, dec!(48));
}

#[tokio::test]
async fn both_methods_report_the_same_shortfall() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Panettone", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(25), Unit::Kg, Decimal::ZERO)
        .await;

    engine
        .seed_batch(flour.id, dec!(12), Unit::Kg, dec!(2), received_on(1))
        .await;
    engine
        .seed_batch(flour.id, dec!(8), Unit::Kg, dec!(2), received_on(2))
        .await;

    let consumptions = engine
        .state
        .costing
        .calculate_material_consumptions(engine.store_id, product.id, dec!(100), Unit::Un)
        .await
        .unwrap();

    let fifo_err = engine
        .state
        .costing
        .allocate_fifo(engine.store_id, &consumptions)
        .await
        .unwrap_err();
    assert_matches!(
        fifo_err,
        ServiceError::InsufficientStock { shortfall, .. } if shortfall == dec!(5)
    );

    let wac_err = engine
        .state
        .costing
        .allocate_wac(engine.store_id, &consumptions)
        .await
        .unwrap_err();
    assert_matches!(
        wac_err,
        ServiceError::InsufficientStock { shortfall, .. } if shortfall == dec!(5)
    );
}

#[tokio::test]
async fn allocation_converts_batch_units() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Grissini", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(1), Unit::Kg, Decimal::ZERO)
        .await;

    // Stock kept in grams: 1500 g at 0.002/g = 1.5 kg at 2/kg.
    engine
        .seed_batch(flour.id, dec!(1500), Unit::G, dec!(0.002), received_on(1))
        .await;

    let consumptions = engine
        .state
        .costing
        .calculate_material_consumptions(engine.store_id, product.id, dec!(100), Unit::Un)
        .await
        .unwrap();
    let allocations = engine
        .state
        .costing
        .allocate_fifo(engine.store_id, &consumptions)
        .await
        .unwrap();

    assert_eq!(allocations.len(), 1);
    assert_dec_eq(allocations[0].quantity, dec!(1));
    assert_dec_eq(allocations[0].unit_cost, dec!(2));
    assert_dec_eq(allocations[0].total_cost, dec!(2));
}

#[tokio::test]
async fn suggested_price_uses_live_wac_when_possible() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Pizza base", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(10), Unit::Kg, Decimal::ZERO)
        .await;
    engine
        .seed_batch(flour.id, dec!(100), Unit::Kg, dec!(2), received_on(1))
        .await;

    let suggestion = engine
        .state
        .costing
        .get_suggested_price(
            engine.store_id,
            GetSuggestedPriceInput {
                product_id: product.id,
                output_quantity: dec!(100),
                output_unit: Unit::Un,
                markup_percent: dec!(50),
            },
        )
        .await
        .unwrap();

    // 10 kg at 2/kg over 100 units = 0.2/unit; +50% markup = 0.3.
    assert_eq!(suggestion.source, CostSource::Dynamic);
    assert_dec_eq(suggestion.unit_cost, dec!(0.2));
    assert_dec_eq(suggestion.suggested_price, dec!(0.3));
}

#[tokio::test]
async fn suggested_price_falls_back_to_the_cache() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Torta", Unit::Un).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(10), Unit::Kg, Decimal::ZERO)
        .await;
    // No stock at all, but a cached cost from a previous run.
    product_cost_cache::ActiveModel {
        id: Set(Uuid::new_v4()),
        store_id: Set(engine.store_id),
        product_id: Set(product.id),
        unit_cost: Set(dec!(1.4)),
        costing_method: Set(CostingMethod::Wac),
        calculated_at: Set(Utc::now()),
    }
    .insert(&*engine.state.db)
    .await
    .unwrap();

    let suggestion = engine
        .state
        .costing
        .get_suggested_price(
            engine.store_id,
            GetSuggestedPriceInput {
                product_id: product.id,
                output_quantity: dec!(100),
                output_unit: Unit::Un,
                markup_percent: dec!(100),
            },
        )
        .await
        .unwrap();

    assert_eq!(suggestion.source, CostSource::Cache);
    assert_dec_eq(suggestion.unit_cost, dec!(1.4));
    assert_dec_eq(suggestion.suggested_price, dec!(2.8));
}

#[tokio::test]
async fn suggested_price_without_any_information_fails() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Mystery item", Unit::Un).await;

    let result = engine
        .state
        .costing
        .get_suggested_price(
            engine.store_id,
            GetSuggestedPriceInput {
                product_id: product.id,
                output_quantity: dec!(10),
                output_unit: Unit::Un,
                markup_percent: dec!(30),
            },
        )
        .await;

    assert_matches!(
        result,
        Err(ServiceError::NoCostInformation(id)) if id == product.id
    );
}

#[tokio::test]
async fn cost_history_lists_finished_orders_newest_first() {
    let engine = TestEngine::new().await;
    let product = engine.seed_product("Pane", Unit::Kg).await;
    let flour = engine.seed_material("Flour", Unit::Kg, None).await;
    engine
        .seed_bom_line(product.id, flour.id, dec!(50), Unit::Kg, Decimal::ZERO)
        .await;
    engine
        .seed_batch(flour.id, dec!(500), Unit::Kg, dec!(2), received_on(1))
        .await;

    let orders = &engine.state.production_orders;
    for _ in 0..2 {
        let order = orders
            .create_order(
                engine.store_id,
                fabrica_api::services::production_orders::CreateProductionOrderInput {
                    product_id: product.id,
                    planned_quantity: dec!(10),
                    unit: Unit::Kg,
                    costing_method: Some(CostingMethod::Fifo),
                    overhead_percent: Decimal::ZERO,
                    packaging_cost_per_unit: Decimal::ZERO,
                },
            )
            .await
            .unwrap();
        orders.start_order(engine.store_id, order.id).await.unwrap();
        orders
            .finish_order(engine.store_id, order.id, dec!(10))
            .await
            .unwrap();
    }

    let history = engine
        .state
        .costing
        .get_product_cost_history(engine.store_id, product.id)
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    // 5 kg of flour at 2/kg over 10 kg output = 1/kg.
    assert_dec_eq(history[0].unit_cost, dec!(1));
    assert_eq!(history[0].costing_method, CostingMethod::Fifo);
    assert!(history[0].finished_at >= history[1].finished_at);
}
