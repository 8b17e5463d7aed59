use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Category discriminator; decides which detail table holds the item's
/// category-specific attributes. Immutable after creation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    #[sea_orm(string_value = "SHEET")]
    Sheet,
    #[sea_orm(string_value = "HANDLE")]
    Handle,
    #[sea_orm(string_value = "HARDWARE")]
    Hardware,
    #[sea_orm(string_value = "ACCESSORY")]
    Accessory,
    #[sea_orm(string_value = "EDGING_TAPE")]
    EdgingTape,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category: ItemCategory,
    pub description: String,
    #[serde(serialize_with = "crate::entities::money::two_dp")]
    pub price: Decimal,
    /// On-hand quantity; only moved through the stock ledger and PO receipts
    pub quantity: i32,
    pub measurement_unit: String,
    pub supplier_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::supplier::Entity",
        from = "Column::SupplierId",
        to = "crate::entities::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "crate::entities::stock_transaction::Entity")]
    StockTransactions,
}

impl Related<crate::entities::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<crate::entities::stock_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
