use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "materials_to_order_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub materials_to_order_id: Uuid,
    pub file_name: String,
    /// Relative URL under `/media`
    pub url: String,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::materials_to_order::Entity",
        from = "Column::MaterialsToOrderId",
        to = "crate::entities::materials_to_order::Column::Id"
    )]
    MaterialsToOrder,
}

impl Related<crate::entities::materials_to_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialsToOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
