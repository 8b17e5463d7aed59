use crate::{
    commands::purchase_orders::unwrap_txn_error,
    db::DbPool,
    entities::{
        accessory_details, edging_tape_details, handle_details, hardware_details,
        item::{self, ItemCategory},
        materials_to_order_item, purchase_order_item, sheet_details, stock_transaction,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Category-specific attributes, discriminated by `category`.
///
/// The variant always matches the item's stored category; the exhaustive
/// match in this module is the single place that maps variants to detail
/// tables.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemAttributes {
    Sheet {
        material: String,
        finish: Option<String>,
        thickness_mm: Decimal,
        length_mm: Decimal,
        width_mm: Decimal,
    },
    Handle {
        style: Option<String>,
        length_mm: Option<Decimal>,
        finish: Option<String>,
    },
    Hardware {
        sub_category: String,
        brand: Option<String>,
    },
    Accessory {
        accessory_type: String,
    },
    EdgingTape {
        colour: Option<String>,
        width_mm: Decimal,
        thickness_mm: Option<Decimal>,
        finish: Option<String>,
    },
}

impl ItemAttributes {
    pub fn category(&self) -> ItemCategory {
        match self {
            Self::Sheet { .. } => ItemCategory::Sheet,
            Self::Handle { .. } => ItemCategory::Handle,
            Self::Hardware { .. } => ItemCategory::Hardware,
            Self::Accessory { .. } => ItemCategory::Accessory,
            Self::EdgingTape { .. } => ItemCategory::EdgingTape,
        }
    }

    fn validate_required_fields(&self) -> Result<(), ServiceError> {
        match self {
            Self::Sheet { material, .. } if material.trim().is_empty() => Err(
                ServiceError::ValidationError("Sheet material must not be empty".to_string()),
            ),
            Self::Hardware { sub_category, .. } if sub_category.trim().is_empty() => {
                Err(ServiceError::ValidationError(
                    "Hardware sub-category must not be empty".to_string(),
                ))
            }
            Self::Accessory { accessory_type } if accessory_type.trim().is_empty() => {
                Err(ServiceError::ValidationError(
                    "Accessory type must not be empty".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,
    pub price: Decimal,
    #[validate(length(min = 1, message = "Measurement unit must not be empty"))]
    pub measurement_unit: String,
    pub supplier_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub attributes: ItemAttributes,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateItemInput {
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub measurement_unit: Option<String>,
    pub supplier_id: Option<Option<Uuid>>,
    pub image_url: Option<Option<String>>,
    /// When present, must match the item's stored category
    pub attributes: Option<ItemAttributes>,
}

/// Item together with its category-specific attributes
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemWithAttributes {
    #[serde(flatten)]
    pub item: item::Model,
    pub attributes: ItemAttributes,
}

/// Service for managing inventory items and their detail records
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Creates an item and its detail row in one transaction
    #[instrument(skip(self, input))]
    pub async fn create_item(
        &self,
        input: CreateItemInput,
    ) -> Result<ItemWithAttributes, ServiceError> {
        input.validate()?;
        input.attributes.validate_required_fields()?;

        let attributes = input.attributes.clone();
        let created = self
            .db_pool
            .transaction::<_, item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let new_item = item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        category: Set(input.attributes.category()),
                        description: Set(input.description.clone()),
                        price: Set(input.price),
                        quantity: Set(0),
                        measurement_unit: Set(input.measurement_unit.clone()),
                        supplier_id: Set(input.supplier_id),
                        image_url: Set(input.image_url.clone()),
                        created_at: Set(now),
                        updated_at: Set(None),
                    };
                    let saved = new_item.insert(txn).await.map_err(ServiceError::db_error)?;
                    insert_details(txn, saved.id, &input.attributes).await?;
                    Ok(saved)
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        slog::info!(self.logger, "Item created";
            "item_id" => %created.id, "category" => format!("{:?}", created.category));
        self.event_sender
            .send(Event::ItemCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ItemWithAttributes {
            item: created,
            attributes,
        })
    }

    /// Fetches one item with its attributes
    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<ItemWithAttributes, ServiceError> {
        let model = item::Entity::find_by_id(item_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))?;
        let attributes = load_attributes(self.db_pool.as_ref(), &model).await?;
        Ok(ItemWithAttributes {
            item: model,
            attributes,
        })
    }

    /// Lists items, optionally narrowed to one category
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        category: Option<ItemCategory>,
    ) -> Result<Vec<ItemWithAttributes>, ServiceError> {
        let mut query = item::Entity::find();
        if let Some(category) = category {
            query = query.filter(item::Column::Category.eq(category));
        }
        let models = query
            .order_by_desc(item::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let attributes = load_attributes(self.db_pool.as_ref(), &model).await?;
            out.push(ItemWithAttributes {
                item: model,
                attributes,
            });
        }
        Ok(out)
    }

    /// Lists a supplier's items
    #[instrument(skip(self))]
    pub async fn list_items_by_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<ItemWithAttributes>, ServiceError> {
        let models = item::Entity::find()
            .filter(item::Column::SupplierId.eq(supplier_id))
            .order_by_desc(item::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let attributes = load_attributes(self.db_pool.as_ref(), &model).await?;
            out.push(ItemWithAttributes {
                item: model,
                attributes,
            });
        }
        Ok(out)
    }

    /// Updates an item; the category itself is immutable
    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> Result<ItemWithAttributes, ServiceError> {
        if let Some(attributes) = &input.attributes {
            attributes.validate_required_fields()?;
        }

        let updated = self
            .db_pool
            .transaction::<_, item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let model = item::Entity::find_by_id(item_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Item {} not found", item_id))
                        })?;

                    if let Some(attributes) = &input.attributes {
                        if attributes.category() != model.category {
                            return Err(ServiceError::ValidationError(format!(
                                "Attributes are for {:?} but the item is {:?}; the category is immutable",
                                attributes.category(),
                                model.category
                            )));
                        }
                        replace_details(txn, item_id, attributes).await?;
                    }

                    let mut active: item::ActiveModel = model.into();
                    if let Some(description) = input.description {
                        if description.trim().is_empty() {
                            return Err(ServiceError::ValidationError(
                                "Description must not be empty".to_string(),
                            ));
                        }
                        active.description = Set(description);
                    }
                    if let Some(price) = input.price {
                        active.price = Set(price);
                    }
                    if let Some(unit) = input.measurement_unit {
                        active.measurement_unit = Set(unit);
                    }
                    if let Some(supplier_id) = input.supplier_id {
                        active.supplier_id = Set(supplier_id);
                    }
                    if let Some(image_url) = input.image_url {
                        active.image_url = Set(image_url);
                    }
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        self.event_sender
            .send(Event::ItemUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        let attributes = load_attributes(self.db_pool.as_ref(), &updated).await?;
        Ok(ItemWithAttributes {
            item: updated,
            attributes,
        })
    }

    /// Deletes an item and its detail row.
    ///
    /// Refused while purchase order lines, materials lines or ledger entries
    /// still reference the item; those records are history and must keep
    /// resolving.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let po_refs = purchase_order_item::Entity::find()
            .filter(purchase_order_item::Column::ItemId.eq(item_id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if po_refs > 0 {
            return Err(ServiceError::Conflict(
                "Item is referenced by purchase orders and cannot be deleted".to_string(),
            ));
        }
        let mto_refs = materials_to_order_item::Entity::find()
            .filter(materials_to_order_item::Column::ItemId.eq(item_id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if mto_refs > 0 {
            return Err(ServiceError::Conflict(
                "Item is referenced by materials to order and cannot be deleted".to_string(),
            ));
        }
        let ledger_refs = stock_transaction::Entity::find()
            .filter(stock_transaction::Column::ItemId.eq(item_id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if ledger_refs > 0 {
            return Err(ServiceError::Conflict(
                "Item has stock ledger history and cannot be deleted".to_string(),
            ));
        }

        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let model = item::Entity::find_by_id(item_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Item {} not found", item_id))
                        })?;
                    delete_details(txn, item_id, model.category).await?;
                    model.delete(txn).await.map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        slog::info!(self.logger, "Item deleted"; "item_id" => %item_id);
        self.event_sender
            .send(Event::ItemDeleted(item_id))
            .await
            .map_err(ServiceError::EventError)
    }
}

async fn insert_details<C: sea_orm::ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    attributes: &ItemAttributes,
) -> Result<(), ServiceError> {
    match attributes {
        ItemAttributes::Sheet {
            material,
            finish,
            thickness_mm,
            length_mm,
            width_mm,
        } => {
            sheet_details::ActiveModel {
                item_id: Set(item_id),
                material: Set(material.clone()),
                finish: Set(finish.clone()),
                thickness_mm: Set(*thickness_mm),
                length_mm: Set(*length_mm),
                width_mm: Set(*width_mm),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
        ItemAttributes::Handle {
            style,
            length_mm,
            finish,
        } => {
            handle_details::ActiveModel {
                item_id: Set(item_id),
                style: Set(style.clone()),
                length_mm: Set(*length_mm),
                finish: Set(finish.clone()),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
        ItemAttributes::Hardware {
            sub_category,
            brand,
        } => {
            hardware_details::ActiveModel {
                item_id: Set(item_id),
                sub_category: Set(sub_category.clone()),
                brand: Set(brand.clone()),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
        ItemAttributes::Accessory { accessory_type } => {
            accessory_details::ActiveModel {
                item_id: Set(item_id),
                accessory_type: Set(accessory_type.clone()),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
        ItemAttributes::EdgingTape {
            colour,
            width_mm,
            thickness_mm,
            finish,
        } => {
            edging_tape_details::ActiveModel {
                item_id: Set(item_id),
                colour: Set(colour.clone()),
                width_mm: Set(*width_mm),
                thickness_mm: Set(*thickness_mm),
                finish: Set(finish.clone()),
            }
            .insert(conn)
            .await
            .map_err(ServiceError::db_error)?;
        }
    }
    Ok(())
}

async fn delete_details<C: sea_orm::ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    category: ItemCategory,
) -> Result<(), ServiceError> {
    match category {
        ItemCategory::Sheet => {
            sheet_details::Entity::delete_by_id(item_id)
                .exec(conn)
                .await
                .map_err(ServiceError::db_error)?;
        }
        ItemCategory::Handle => {
            handle_details::Entity::delete_by_id(item_id)
                .exec(conn)
                .await
                .map_err(ServiceError::db_error)?;
        }
        ItemCategory::Hardware => {
            hardware_details::Entity::delete_by_id(item_id)
                .exec(conn)
                .await
                .map_err(ServiceError::db_error)?;
        }
        ItemCategory::Accessory => {
            accessory_details::Entity::delete_by_id(item_id)
                .exec(conn)
                .await
                .map_err(ServiceError::db_error)?;
        }
        ItemCategory::EdgingTape => {
            edging_tape_details::Entity::delete_by_id(item_id)
                .exec(conn)
                .await
                .map_err(ServiceError::db_error)?;
        }
    }
    Ok(())
}

async fn replace_details<C: sea_orm::ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    attributes: &ItemAttributes,
) -> Result<(), ServiceError> {
    delete_details(conn, item_id, attributes.category()).await?;
    insert_details(conn, item_id, attributes).await
}

/// Loads the attribute variant matching the item's category
pub(crate) async fn load_attributes<C: sea_orm::ConnectionTrait>(
    conn: &C,
    model: &item::Model,
) -> Result<ItemAttributes, ServiceError> {
    let missing = || {
        ServiceError::InternalError(format!(
            "Detail record missing for item {} ({:?})",
            model.id, model.category
        ))
    };

    let attributes = match model.category {
        ItemCategory::Sheet => {
            let d = sheet_details::Entity::find_by_id(model.id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(missing)?;
            ItemAttributes::Sheet {
                material: d.material,
                finish: d.finish,
                thickness_mm: d.thickness_mm,
                length_mm: d.length_mm,
                width_mm: d.width_mm,
            }
        }
        ItemCategory::Handle => {
            let d = handle_details::Entity::find_by_id(model.id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(missing)?;
            ItemAttributes::Handle {
                style: d.style,
                length_mm: d.length_mm,
                finish: d.finish,
            }
        }
        ItemCategory::Hardware => {
            let d = hardware_details::Entity::find_by_id(model.id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(missing)?;
            ItemAttributes::Hardware {
                sub_category: d.sub_category,
                brand: d.brand,
            }
        }
        ItemCategory::Accessory => {
            let d = accessory_details::Entity::find_by_id(model.id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(missing)?;
            ItemAttributes::Accessory {
                accessory_type: d.accessory_type,
            }
        }
        ItemCategory::EdgingTape => {
            let d = edging_tape_details::Entity::find_by_id(model.id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(missing)?;
            ItemAttributes::EdgingTape {
                colour: d.colour,
                width_mm: d.width_mm,
                thickness_mm: d.thickness_mm,
                finish: d.finish,
            }
        }
    };

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_report_their_category() {
        let attrs = ItemAttributes::Hardware {
            sub_category: "hinge".into(),
            brand: None,
        };
        assert_eq!(attrs.category(), ItemCategory::Hardware);
    }

    #[test]
    fn attributes_deserialize_from_tagged_json() {
        let json = serde_json::json!({
            "category": "SHEET",
            "material": "MDF",
            "finish": null,
            "thickness_mm": "16",
            "length_mm": "2400",
            "width_mm": "1200"
        });
        let attrs: ItemAttributes = serde_json::from_value(json).unwrap();
        assert_eq!(attrs.category(), ItemCategory::Sheet);
    }

    #[test]
    fn blank_hardware_sub_category_is_rejected() {
        let attrs = ItemAttributes::Hardware {
            sub_category: "  ".into(),
            brand: None,
        };
        assert!(attrs.validate_required_fields().is_err());
    }
}
