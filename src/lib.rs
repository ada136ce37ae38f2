//! Production costing and material allocation engine for a multi-tenant
//! point-of-sale backend.
//!
//! The engine is an in-process library: request handlers resolve the
//! tenant ("store") and call into [`EngineState`], which wires the catalog,
//! costing, and production-order services over one shared connection pool.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use services::{
    bom::BomService, costing::CostingService, materials::MaterialsService,
    production_orders::ProductionOrderService, units::UnitConversionService,
};

/// The engine's service graph over one shared connection pool.
#[derive(Clone)]
pub struct EngineState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub units: UnitConversionService,
    pub materials: MaterialsService,
    pub bom: BomService,
    pub costing: CostingService,
    pub production_orders: ProductionOrderService,
}

impl EngineState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let units = UnitConversionService::new(db.clone());
        let materials = MaterialsService::new(db.clone(), event_sender.clone());
        let bom = BomService::new(db.clone(), event_sender.clone());
        let costing = CostingService::new(db.clone());
        let production_orders = ProductionOrderService::new(
            db.clone(),
            event_sender.clone(),
            config.default_costing_method,
        );

        Self {
            db,
            config,
            event_sender,
            units,
            materials,
            bom,
            costing,
            production_orders,
        }
    }
}
