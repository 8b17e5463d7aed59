use crate::{
    commands::purchase_orders::unwrap_txn_error,
    db::DbPool,
    entities::{
        item,
        materials_to_order::{self, MaterialsToOrderStatus},
        materials_to_order_item, materials_to_order_media,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MaterialsToOrderLineInput {
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateMaterialsToOrderInput {
    pub project_id: Uuid,
    /// Lot UUIDs covered by this aggregate; empty means the whole project
    #[serde(default)]
    pub lot_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "At least one material line is required"))]
    pub items: Vec<MaterialsToOrderLineInput>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Aggregate with its lines and media, as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialsToOrderDetail {
    #[serde(flatten)]
    pub materials_to_order: materials_to_order::Model,
    pub items: Vec<materials_to_order_item::Model>,
    pub media: Vec<materials_to_order_media::Model>,
}

/// Service for the materials-to-order aggregates
#[derive(Clone)]
pub struct MaterialsToOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl MaterialsToOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    /// Creates an aggregate in `DRAFT` with zeroed counters
    #[instrument(skip(self, input), fields(project_id = %input.project_id))]
    pub async fn create(
        &self,
        input: CreateMaterialsToOrderInput,
    ) -> Result<MaterialsToOrderDetail, ServiceError> {
        input.validate()?;
        for line in &input.items {
            line.validate()
                .map_err(|e| ServiceError::ValidationError(format!("Invalid line: {}", e)))?;
        }

        let detail = self
            .db_pool
            .transaction::<_, MaterialsToOrderDetail, ServiceError>(move |txn| {
                Box::pin(async move {
                    // Every line must point at a real inventory item
                    for line in &input.items {
                        item::Entity::find_by_id(line.item_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Item {} not found",
                                    line.item_id
                                ))
                            })?;
                    }

                    let now = Utc::now();
                    let aggregate = materials_to_order::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        project_id: Set(input.project_id),
                        lot_ids: Set(serde_json::to_value(&input.lot_ids)
                            .map_err(|e| ServiceError::InternalError(e.to_string()))?),
                        status: Set(MaterialsToOrderStatus::Draft),
                        notes: Set(input.notes.clone()),
                        created_at: Set(now),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut saved_lines = Vec::with_capacity(input.items.len());
                    for line in &input.items {
                        let saved = materials_to_order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            materials_to_order_id: Set(aggregate.id),
                            item_id: Set(line.item_id),
                            quantity: Set(line.quantity),
                            quantity_ordered_po: Set(0),
                            quantity_ordered: Set(0),
                            quantity_received: Set(0),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        saved_lines.push(saved);
                    }

                    Ok(MaterialsToOrderDetail {
                        materials_to_order: aggregate,
                        items: saved_lines,
                        media: Vec::new(),
                    })
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        slog::info!(self.logger, "Materials to order created";
            "materials_to_order_id" => %detail.materials_to_order.id,
            "lines" => detail.items.len(),
        );
        self.event_sender
            .send(Event::MaterialsToOrderCreated(detail.materials_to_order.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(detail)
    }

    /// Fetches one aggregate with lines and media
    #[instrument(skip(self))]
    pub async fn get(&self, mto_id: Uuid) -> Result<MaterialsToOrderDetail, ServiceError> {
        let aggregate = self.find_required(mto_id).await?;

        let items = materials_to_order_item::Entity::find()
            .filter(materials_to_order_item::Column::MaterialsToOrderId.eq(mto_id))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        let media = materials_to_order_media::Entity::find()
            .filter(materials_to_order_media::Column::MaterialsToOrderId.eq(mto_id))
            .order_by_desc(materials_to_order_media::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(MaterialsToOrderDetail {
            materials_to_order: aggregate,
            items,
            media,
        })
    }

    /// Lists aggregates, optionally for a single project
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        project_id: Option<Uuid>,
    ) -> Result<Vec<materials_to_order::Model>, ServiceError> {
        let mut query = materials_to_order::Entity::find();
        if let Some(project_id) = project_id {
            query = query.filter(materials_to_order::Column::ProjectId.eq(project_id));
        }
        query
            .order_by_desc(materials_to_order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Updates the free-text notes; counters and status are never patched here
    #[instrument(skip(self))]
    pub async fn update_notes(
        &self,
        mto_id: Uuid,
        notes: Option<String>,
    ) -> Result<materials_to_order::Model, ServiceError> {
        let aggregate = self.find_required(mto_id).await?;
        let mut active: materials_to_order::ActiveModel = aggregate.into();
        active.notes = Set(notes);
        active.updated_at = Set(Some(Utc::now()));
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Manually closes the aggregate; terminal from any state
    #[instrument(skip(self))]
    pub async fn close(&self, mto_id: Uuid) -> Result<materials_to_order::Model, ServiceError> {
        let aggregate = self.find_required(mto_id).await?;
        if aggregate.status == MaterialsToOrderStatus::Closed {
            return Err(ServiceError::InvalidStatus(
                "Materials to order is already closed".to_string(),
            ));
        }

        let mut active: materials_to_order::ActiveModel = aggregate.into();
        active.status = Set(MaterialsToOrderStatus::Closed);
        active.updated_at = Set(Some(Utc::now()));
        let closed = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "Materials to order closed";
            "materials_to_order_id" => %mto_id);
        self.event_sender
            .send(Event::MaterialsToOrderClosed(mto_id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(closed)
    }

    /// Attaches an already-stored file to the aggregate
    #[instrument(skip(self))]
    pub async fn add_media(
        &self,
        mto_id: Uuid,
        file_name: String,
        url: String,
        content_type: Option<String>,
    ) -> Result<materials_to_order_media::Model, ServiceError> {
        self.find_required(mto_id).await?;

        materials_to_order_media::ActiveModel {
            id: Set(Uuid::new_v4()),
            materials_to_order_id: Set(mto_id),
            file_name: Set(file_name),
            url: Set(url),
            content_type: Set(content_type),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)
    }

    /// Removes a media row, returning it so the caller can delete the file
    #[instrument(skip(self))]
    pub async fn remove_media(
        &self,
        mto_id: Uuid,
        media_id: Uuid,
    ) -> Result<materials_to_order_media::Model, ServiceError> {
        let media = materials_to_order_media::Entity::find_by_id(media_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|m| m.materials_to_order_id == mto_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Media {} not found on materials to order {}",
                    media_id, mto_id
                ))
            })?;

        media
            .clone()
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(media)
    }

    async fn find_required(
        &self,
        mto_id: Uuid,
    ) -> Result<materials_to_order::Model, ServiceError> {
        materials_to_order::Entity::find_by_id(mto_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Materials to order {} not found", mto_id))
            })
    }
}
