use crate::{
    commands::{purchase_orders::unwrap_txn_error, Command},
    db::DbPool,
    entities::{
        purchase_order::{self, PurchaseOrderStatus},
        purchase_order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Patch-style field wrapper distinguishing "leave unchanged" from
/// "set to null"
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum Patch<T> {
    // Untagged matching must try Set first so an explicit JSON null becomes
    // Set(None); Keep is only ever produced by the field default.
    Set(Option<T>),
    #[default]
    Keep,
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

/// Patches purchase order fields and drives the `DRAFT → ORDERED` transition.
///
/// Cancellation is a separate command because it rolls back MTO counters;
/// requesting `CANCELLED` here is rejected so the rollback path cannot be
/// bypassed.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdatePurchaseOrderCommand {
    pub purchase_order_id: Uuid,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub delivery_charge: Option<Decimal>,
    #[serde(default)]
    pub invoice_url: Patch<String>,
    #[serde(default)]
    pub invoice_date: Patch<NaiveDate>,
    /// Requested status transition; only `ORDERED` is accepted here
    pub status: Option<PurchaseOrderStatus>,
    /// Display name of the user marking the order as placed
    pub ordered_by: Option<String>,
}

#[async_trait::async_trait]
impl Command for UpdatePurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;

        if matches!(self.status, Some(PurchaseOrderStatus::Cancelled)) {
            return Err(ServiceError::InvalidStatus(
                "Use the cancel operation to cancel a purchase order".to_string(),
            ));
        }

        let updated = self.apply_update(db_pool.as_ref()).await?;

        info!(
            purchase_order_id = %updated.id,
            status = ?updated.status,
            "Purchase order updated"
        );

        event_sender
            .send(Event::PurchaseOrderUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }
}

impl UpdatePurchaseOrderCommand {
    async fn apply_update(&self, db: &DbPool) -> Result<purchase_order::Model, ServiceError> {
        let po_id = self.purchase_order_id;
        let notes = self.notes.clone();
        let delivery_charge = self.delivery_charge;
        let invoice_url = self.invoice_url.clone();
        let invoice_date = self.invoice_date.clone();
        let status = self.status;
        let ordered_by = self.ordered_by.clone();

        db.transaction::<_, purchase_order::Model, ServiceError>(move |txn| {
            Box::pin(async move {
                let po = purchase_order::Entity::find_by_id(po_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Purchase order {} not found", po_id))
                    })?;

                if po.status == PurchaseOrderStatus::Cancelled {
                    return Err(ServiceError::InvalidStatus(
                        "Cancelled purchase orders cannot be modified".to_string(),
                    ));
                }

                let current_status = po.status;
                let old_delivery_charge = po.delivery_charge;
                let old_total = po.total_amount;
                let mut active: purchase_order::ActiveModel = po.into();

                if let Some(notes) = notes {
                    active.notes = Set(Some(notes));
                }

                if let Some(charge) = delivery_charge {
                    // total_amount carries the delivery charge, so moving the
                    // charge moves the total by the same delta
                    active.delivery_charge = Set(charge);
                    active.total_amount = Set(old_total - old_delivery_charge + charge);
                }

                if let Patch::Set(url) = invoice_url {
                    active.invoice_url = Set(url);
                }
                if let Patch::Set(date) = invoice_date {
                    active.invoice_date = Set(date);
                }

                if let Some(requested) = status {
                    match (current_status, requested) {
                        (PurchaseOrderStatus::Draft, PurchaseOrderStatus::Ordered) => {
                            active.status = Set(PurchaseOrderStatus::Ordered);
                            active.ordered_at = Set(Some(Utc::now()));
                            active.ordered_by = Set(ordered_by);
                        }
                        (current, requested) if current == requested => {}
                        (current, requested) => {
                            return Err(ServiceError::InvalidStatus(format!(
                                "Cannot move purchase order from {:?} to {:?}",
                                current, requested
                            )));
                        }
                    }
                }

                active.updated_at = Set(Some(Utc::now()));
                active.update(txn).await.map_err(ServiceError::db_error)
            })
        })
        .await
        .map_err(unwrap_txn_error)
    }
}

/// Loads a purchase order's lines; shared by handlers building responses
pub async fn load_po_items(
    db: &DbPool,
    po_id: Uuid,
) -> Result<Vec<purchase_order_item::Model>, ServiceError> {
    purchase_order_item::Entity::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(po_id))
        .all(db)
        .await
        .map_err(ServiceError::db_error)
}
