use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250115_000001_create_products_table::Migration),
            Box::new(m20250115_000002_create_materials_table::Migration),
            Box::new(m20250115_000003_create_material_batches_table::Migration),
            Box::new(m20250115_000004_create_unit_conversions_table::Migration),
            Box::new(m20250115_000005_create_product_boms_table::Migration),
            Box::new(m20250115_000006_create_production_orders_table::Migration),
            Box::new(m20250115_000007_create_production_consumptions_table::Migration),
            Box::new(m20250115_000008_create_finished_goods_table::Migration),
            Box::new(m20250115_000009_create_product_cost_cache_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250115_000001_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::StoreId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().null())
                        .col(
                            ColumnDef::new(Products::BaseUnit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::CostPrice)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_store_id")
                        .table(Products::Table)
                        .col(Products::StoreId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        StoreId,
        Name,
        Sku,
        BaseUnit,
        CostPrice,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250115_000002_create_materials_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000002_create_materials_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Materials::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Materials::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Materials::StoreId).uuid().not_null())
                        .col(ColumnDef::new(Materials::Name).string().not_null())
                        .col(ColumnDef::new(Materials::Sku).string().null())
                        .col(
                            ColumnDef::new(Materials::BaseUnit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Materials::Density)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Materials::MinimumStock)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Materials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Materials::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_materials_store_id")
                        .table(Materials::Table)
                        .col(Materials::StoreId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Materials::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Materials {
        Table,
        Id,
        StoreId,
        Name,
        Sku,
        BaseUnit,
        Density,
        MinimumStock,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250115_000003_create_material_batches_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000003_create_material_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaterialBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialBatches::StoreId).uuid().not_null())
                        .col(
                            ColumnDef::new(MaterialBatches::MaterialId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::QuantityRemaining)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::Unit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::TotalCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialBatches::LotCode).string().null())
                        .col(ColumnDef::new(MaterialBatches::Supplier).string().null())
                        .col(
                            ColumnDef::new(MaterialBatches::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::ExpiresAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialBatches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // FIFO scans filter by material and status, then order by
            // received_at.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_batches_fifo")
                        .table(MaterialBatches::Table)
                        .col(MaterialBatches::MaterialId)
                        .col(MaterialBatches::Status)
                        .col(MaterialBatches::ReceivedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_material_batches_store_id")
                        .table(MaterialBatches::Table)
                        .col(MaterialBatches::StoreId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MaterialBatches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MaterialBatches {
        Table,
        Id,
        StoreId,
        MaterialId,
        QuantityRemaining,
        Unit,
        UnitCost,
        TotalCost,
        LotCode,
        Supplier,
        ReceivedAt,
        ExpiresAt,
        Status,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250115_000004_create_unit_conversions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000004_create_unit_conversions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UnitConversions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UnitConversions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UnitConversions::StoreId).uuid().not_null())
                        .col(
                            ColumnDef::new(UnitConversions::MaterialId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::FromUnit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::ToUnit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::Factor)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_unit_conversions_lookup")
                        .table(UnitConversions::Table)
                        .col(UnitConversions::StoreId)
                        .col(UnitConversions::MaterialId)
                        .col(UnitConversions::FromUnit)
                        .col(UnitConversions::ToUnit)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UnitConversions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum UnitConversions {
        Table,
        Id,
        StoreId,
        MaterialId,
        FromUnit,
        ToUnit,
        Factor,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250115_000005_create_product_boms_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000005_create_product_boms_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductBoms::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductBoms::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductBoms::StoreId).uuid().not_null())
                        .col(ColumnDef::new(ProductBoms::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductBoms::MaterialId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductBoms::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductBoms::Unit).string_len(8).not_null())
                        .col(
                            ColumnDef::new(ProductBoms::WastePercent)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductBoms::Notes).string().null())
                        .col(
                            ColumnDef::new(ProductBoms::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBoms::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_boms_product_id")
                        .table(ProductBoms::Table)
                        .col(ProductBoms::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_boms_material_id")
                        .table(ProductBoms::Table)
                        .col(ProductBoms::MaterialId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductBoms::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductBoms {
        Table,
        Id,
        StoreId,
        ProductId,
        MaterialId,
        Quantity,
        Unit,
        WastePercent,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250115_000006_create_production_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000006_create_production_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionOrders::StoreId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductionOrders::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::PlannedQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::Unit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::CostingMethod)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::OverheadPercent)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::PackagingCostPerUnit)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::BatchCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::StartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::FinishedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::ActualQuantity)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::TotalMaterialCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::TotalPackagingCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::TotalOverheadCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::TotalCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::UnitCost)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_orders_store_created")
                        .table(ProductionOrders::Table)
                        .col(ProductionOrders::StoreId)
                        .col(ProductionOrders::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_orders_product_status")
                        .table(ProductionOrders::Table)
                        .col(ProductionOrders::ProductId)
                        .col(ProductionOrders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionOrders {
        Table,
        Id,
        StoreId,
        ProductId,
        PlannedQuantity,
        Unit,
        CostingMethod,
        OverheadPercent,
        PackagingCostPerUnit,
        Status,
        BatchCode,
        StartedAt,
        FinishedAt,
        ActualQuantity,
        TotalMaterialCost,
        TotalPackagingCost,
        TotalOverheadCost,
        TotalCost,
        UnitCost,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250115_000007_create_production_consumptions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000007_create_production_consumptions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionConsumptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionConsumptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::StoreId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::ProductionOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::MaterialId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::BatchId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::Unit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::TotalCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionConsumptions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_consumptions_order_id")
                        .table(ProductionConsumptions::Table)
                        .col(ProductionConsumptions::ProductionOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(ProductionConsumptions::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionConsumptions {
        Table,
        Id,
        StoreId,
        ProductionOrderId,
        MaterialId,
        BatchId,
        Quantity,
        Unit,
        UnitCost,
        TotalCost,
        CreatedAt,
    }
}

mod m20250115_000008_create_finished_goods_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000008_create_finished_goods_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FinishedGoodsInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::StoreId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::ProductionOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::Unit)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::BatchCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoodsInventory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_finished_goods_product_id")
                        .table(FinishedGoodsInventory::Table)
                        .col(FinishedGoodsInventory::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(FinishedGoodsInventory::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum FinishedGoodsInventory {
        Table,
        Id,
        StoreId,
        ProductId,
        ProductionOrderId,
        Quantity,
        Unit,
        UnitCost,
        BatchCode,
        CreatedAt,
    }
}

mod m20250115_000009_create_product_cost_cache_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250115_000009_create_product_cost_cache_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductCostCache::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCostCache::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductCostCache::StoreId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductCostCache::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCostCache::UnitCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCostCache::CostingMethod)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCostCache::CalculatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_cost_cache_store_product")
                        .table(ProductCostCache::Table)
                        .col(ProductCostCache::StoreId)
                        .col(ProductCostCache::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductCostCache::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductCostCache {
        Table,
        Id,
        StoreId,
        ProductId,
        UnitCost,
        CostingMethod,
        CalculatedAt,
    }
}
