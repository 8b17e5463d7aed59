use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "ORDERED")]
    Ordered,
    #[sea_orm(string_value = "PARTIALLY_RECEIVED")]
    PartiallyReceived,
    #[sea_orm(string_value = "FULLY_RECEIVED")]
    FullyReceived,
    /// Terminal
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// States from which stock can be received
    pub fn accepts_receipts(&self) -> bool {
        matches!(self, Self::Ordered | Self::PartiallyReceived)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_no: String,
    pub supplier_id: Uuid,
    pub materials_to_order_id: Uuid,
    /// Σ line qty × unit_price + delivery_charge
    #[serde(serialize_with = "crate::entities::money::two_dp")]
    pub total_amount: Decimal,
    #[serde(serialize_with = "crate::entities::money::two_dp")]
    pub delivery_charge: Decimal,
    pub invoice_url: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    pub ordered_at: Option<DateTime<Utc>>,
    pub ordered_by: Option<String>,
    pub notes: Option<String>,
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
    #[sea_orm(
        belongs_to = "crate::entities::materials_to_order::Entity",
        from = "Column::MaterialsToOrderId",
        to = "crate::entities::materials_to_order::Column::Id"
    )]
    MaterialsToOrder,
    #[sea_orm(has_many = "crate::entities::purchase_order_item::Entity")]
    Items,
}

impl Related<crate::entities::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<crate::entities::materials_to_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialsToOrder.def()
    }
}

impl Related<crate::entities::purchase_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
