pub mod finished_goods;
pub mod material;
pub mod material_batch;
pub mod product;
pub mod product_bom;
pub mod product_cost_cache;
pub mod production_consumption;
pub mod production_order;
pub mod unit;
pub mod unit_conversion;
