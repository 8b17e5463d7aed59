use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One required-material line of an MTO.
///
/// `quantity_ordered_po` is the reconciliation counter maintained under the
/// conditional-update guard; `quantity_ordered` mirrors it for display and is
/// written in lockstep. Invariant: `0 <= quantity_ordered_po <= quantity`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "materials_to_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub materials_to_order_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub quantity_ordered_po: i32,
    pub quantity_ordered: i32,
    pub quantity_received: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::materials_to_order::Entity",
        from = "Column::MaterialsToOrderId",
        to = "crate::entities::materials_to_order::Column::Id"
    )]
    MaterialsToOrder,
    #[sea_orm(
        belongs_to = "crate::entities::item::Entity",
        from = "Column::ItemId",
        to = "crate::entities::item::Column::Id"
    )]
    Item,
}

impl Related<crate::entities::materials_to_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialsToOrder.def()
    }
}

impl Related<crate::entities::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
