use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240901_000001_create_supplier_tables::Migration),
            Box::new(m20240901_000002_create_item_tables::Migration),
            Box::new(m20240901_000003_create_materials_to_order_tables::Migration),
            Box::new(m20240901_000004_create_purchase_order_tables::Migration),
            Box::new(m20240901_000005_create_stock_transactions_table::Migration),
            Box::new(m20240901_000006_create_config_values_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240901_000001_create_supplier_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000001_create_supplier_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create suppliers table aligned with entities::supplier Model
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Address).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::Website).string().null())
                        .col(ColumnDef::new(Suppliers::AbnNumber).string().null())
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Suppliers::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_name")
                        .table(Suppliers::Table)
                        .col(Suppliers::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierContacts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierContacts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierContacts::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierContacts::Name).string().not_null())
                        .col(ColumnDef::new(SupplierContacts::Role).string().null())
                        .col(ColumnDef::new(SupplierContacts::Email).string().null())
                        .col(ColumnDef::new(SupplierContacts::Phone).string().null())
                        .col(
                            ColumnDef::new(SupplierContacts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_contacts_supplier_id")
                                .from(SupplierContacts::Table, SupplierContacts::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supplier_contacts_supplier_id")
                        .table(SupplierContacts::Table)
                        .col(SupplierContacts::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierStatements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierStatements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierStatements::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierStatements::MonthYear)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierStatements::DueDate).date().null())
                        .col(
                            ColumnDef::new(SupplierStatements::Amount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierStatements::PaymentStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierStatements::FileUrl).string().null())
                        .col(
                            ColumnDef::new(SupplierStatements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierStatements::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_statements_supplier_id")
                                .from(SupplierStatements::Table, SupplierStatements::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_supplier_statements_supplier_id")
                        .table(SupplierStatements::Table)
                        .col(SupplierStatements::SupplierId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierStatements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SupplierContacts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        Address,
        Email,
        Phone,
        Website,
        AbnNumber,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SupplierContacts {
        Table,
        Id,
        SupplierId,
        Name,
        Role,
        Email,
        Phone,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SupplierStatements {
        Table,
        Id,
        SupplierId,
        MonthYear,
        DueDate,
        Amount,
        PaymentStatus,
        FileUrl,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240901_000002_create_item_tables {

    use super::m20240901_000001_create_supplier_tables::Suppliers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000002_create_item_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Items carry the category discriminator; exactly one detail row
            // per item lives in the matching category table.
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::Category).string().not_null())
                        .col(ColumnDef::new(Items::Description).string().not_null())
                        .col(
                            ColumnDef::new(Items::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Items::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Items::MeasurementUnit).string().not_null())
                        .col(ColumnDef::new(Items::SupplierId).uuid().null())
                        .col(ColumnDef::new(Items::ImageUrl).string().null())
                        .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Items::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_supplier_id")
                                .from(Items::Table, Items::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_category")
                        .table(Items::Table)
                        .col(Items::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_supplier_id")
                        .table(Items::Table)
                        .col(Items::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SheetDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SheetDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SheetDetails::Material).string().not_null())
                        .col(ColumnDef::new(SheetDetails::Finish).string().null())
                        .col(
                            ColumnDef::new(SheetDetails::ThicknessMm)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SheetDetails::LengthMm).decimal().not_null())
                        .col(ColumnDef::new(SheetDetails::WidthMm).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sheet_details_item_id")
                                .from(SheetDetails::Table, SheetDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(HandleDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HandleDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(HandleDetails::Style).string().null())
                        .col(ColumnDef::new(HandleDetails::LengthMm).decimal().null())
                        .col(ColumnDef::new(HandleDetails::Finish).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_handle_details_item_id")
                                .from(HandleDetails::Table, HandleDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(HardwareDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HardwareDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(HardwareDetails::SubCategory)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(HardwareDetails::Brand).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_hardware_details_item_id")
                                .from(HardwareDetails::Table, HardwareDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AccessoryDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AccessoryDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AccessoryDetails::AccessoryType)
                                .string()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_accessory_details_item_id")
                                .from(AccessoryDetails::Table, AccessoryDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EdgingTapeDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EdgingTapeDetails::ItemId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(EdgingTapeDetails::Colour).string().null())
                        .col(
                            ColumnDef::new(EdgingTapeDetails::WidthMm)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EdgingTapeDetails::ThicknessMm)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(EdgingTapeDetails::Finish).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_edging_tape_details_item_id")
                                .from(EdgingTapeDetails::Table, EdgingTapeDetails::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EdgingTapeDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(AccessoryDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(HardwareDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(HandleDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SheetDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Items {
        Table,
        Id,
        Category,
        Description,
        Price,
        Quantity,
        MeasurementUnit,
        SupplierId,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SheetDetails {
        Table,
        ItemId,
        Material,
        Finish,
        ThicknessMm,
        LengthMm,
        WidthMm,
    }

    #[derive(DeriveIden)]
    pub(super) enum HandleDetails {
        Table,
        ItemId,
        Style,
        LengthMm,
        Finish,
    }

    #[derive(DeriveIden)]
    pub(super) enum HardwareDetails {
        Table,
        ItemId,
        SubCategory,
        Brand,
    }

    #[derive(DeriveIden)]
    pub(super) enum AccessoryDetails {
        Table,
        ItemId,
        AccessoryType,
    }

    #[derive(DeriveIden)]
    pub(super) enum EdgingTapeDetails {
        Table,
        ItemId,
        Colour,
        WidthMm,
        ThicknessMm,
        Finish,
    }
}

mod m20240901_000003_create_materials_to_order_tables {

    use super::m20240901_000002_create_item_tables::Items;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000003_create_materials_to_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MaterialsToOrder::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialsToOrder::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrder::ProjectId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MaterialsToOrder::LotIds).json().not_null())
                        .col(ColumnDef::new(MaterialsToOrder::Status).string().not_null())
                        .col(ColumnDef::new(MaterialsToOrder::Notes).string().null())
                        .col(
                            ColumnDef::new(MaterialsToOrder::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrder::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_materials_to_order_project_id")
                        .table(MaterialsToOrder::Table)
                        .col(MaterialsToOrder::ProjectId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MaterialsToOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::MaterialsToOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::QuantityOrderedPo)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::QuantityOrdered)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderItems::QuantityReceived)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_materials_to_order_items_parent_id")
                                .from(
                                    MaterialsToOrderItems::Table,
                                    MaterialsToOrderItems::MaterialsToOrderId,
                                )
                                .to(MaterialsToOrder::Table, MaterialsToOrder::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_materials_to_order_items_item_id")
                                .from(MaterialsToOrderItems::Table, MaterialsToOrderItems::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_materials_to_order_items_parent_id")
                        .table(MaterialsToOrderItems::Table)
                        .col(MaterialsToOrderItems::MaterialsToOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MaterialsToOrderMedia::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MaterialsToOrderMedia::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderMedia::MaterialsToOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderMedia::FileName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderMedia::Url)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderMedia::ContentType)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(MaterialsToOrderMedia::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_materials_to_order_media_parent_id")
                                .from(
                                    MaterialsToOrderMedia::Table,
                                    MaterialsToOrderMedia::MaterialsToOrderId,
                                )
                                .to(MaterialsToOrder::Table, MaterialsToOrder::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_materials_to_order_media_parent_id")
                        .table(MaterialsToOrderMedia::Table)
                        .col(MaterialsToOrderMedia::MaterialsToOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MaterialsToOrderMedia::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MaterialsToOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MaterialsToOrder::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum MaterialsToOrder {
        Table,
        Id,
        ProjectId,
        LotIds,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum MaterialsToOrderItems {
        Table,
        Id,
        MaterialsToOrderId,
        ItemId,
        Quantity,
        QuantityOrderedPo,
        QuantityOrdered,
        QuantityReceived,
    }

    #[derive(DeriveIden)]
    pub(super) enum MaterialsToOrderMedia {
        Table,
        Id,
        MaterialsToOrderId,
        FileName,
        Url,
        ContentType,
        CreatedAt,
    }
}

mod m20240901_000004_create_purchase_order_tables {

    use super::m20240901_000001_create_supplier_tables::Suppliers;
    use super::m20240901_000002_create_item_tables::Items;
    use super::m20240901_000003_create_materials_to_order_tables::MaterialsToOrder;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000004_create_purchase_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::OrderNo).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::MaterialsToOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::DeliveryCharge)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PurchaseOrders::InvoiceUrl).string().null())
                        .col(ColumnDef::new(PurchaseOrders::InvoiceDate).date().null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(ColumnDef::new(PurchaseOrders::OrderedAt).timestamp().null())
                        .col(ColumnDef::new(PurchaseOrders::OrderedBy).string().null())
                        .col(ColumnDef::new(PurchaseOrders::Notes).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_supplier_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_materials_to_order_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::MaterialsToOrderId)
                                .to(MaterialsToOrder::Table, MaterialsToOrder::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // order_no is the human-facing identifier and must stay unique
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_order_no")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::OrderNo)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_supplier_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_materials_to_order_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::MaterialsToOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UnitPrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::QuantityReceived)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_purchase_order_id")
                                .from(
                                    PurchaseOrderItems::Table,
                                    PurchaseOrderItems::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_item_id")
                                .from(PurchaseOrderItems::Table, PurchaseOrderItems::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_order_items_purchase_order_id")
                        .table(PurchaseOrderItems::Table)
                        .col(PurchaseOrderItems::PurchaseOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrders {
        Table,
        Id,
        OrderNo,
        SupplierId,
        MaterialsToOrderId,
        TotalAmount,
        DeliveryCharge,
        InvoiceUrl,
        InvoiceDate,
        Status,
        OrderedAt,
        OrderedBy,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseOrderItems {
        Table,
        Id,
        PurchaseOrderId,
        ItemId,
        Quantity,
        UnitPrice,
        QuantityReceived,
    }
}

mod m20240901_000005_create_stock_transactions_table {

    use super::m20240901_000002_create_item_tables::Items;
    use super::m20240901_000003_create_materials_to_order_tables::MaterialsToOrder;
    use super::m20240901_000004_create_purchase_order_tables::PurchaseOrders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000005_create_stock_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Append-only ledger; no update or delete paths exist in the API
            manager
                .create_table(
                    Table::create()
                        .table(StockTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::ItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::TransactionType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::PurchaseOrderId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransactions::MaterialsToOrderId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransactions::Notes).string().null())
                        .col(
                            ColumnDef::new(StockTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transactions_item_id")
                                .from(StockTransactions::Table, StockTransactions::ItemId)
                                .to(Items::Table, Items::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transactions_purchase_order_id")
                                .from(
                                    StockTransactions::Table,
                                    StockTransactions::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transactions_materials_to_order_id")
                                .from(
                                    StockTransactions::Table,
                                    StockTransactions::MaterialsToOrderId,
                                )
                                .to(MaterialsToOrder::Table, MaterialsToOrder::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_item_id")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transactions_created_at")
                        .table(StockTransactions::Table)
                        .col(StockTransactions::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockTransactions {
        Table,
        Id,
        ItemId,
        TransactionType,
        Quantity,
        PurchaseOrderId,
        MaterialsToOrderId,
        Notes,
        CreatedAt,
    }
}

mod m20240901_000006_create_config_values_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240901_000006_create_config_values_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ConfigValues::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConfigValues::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ConfigValues::Category).string().not_null())
                        .col(ColumnDef::new(ConfigValues::Value).string().not_null())
                        .col(
                            ColumnDef::new(ConfigValues::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_config_values_category_value")
                        .table(ConfigValues::Table)
                        .col(ConfigValues::Category)
                        .col(ConfigValues::Value)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ConfigValues::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ConfigValues {
        Table,
        Id,
        Category,
        Value,
        CreatedAt,
    }
}
