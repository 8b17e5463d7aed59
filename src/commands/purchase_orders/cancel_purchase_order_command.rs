use crate::{
    commands::{
        purchase_orders::{deallocate_mto_line, recompute_mto_status, unwrap_txn_error},
        Command,
    },
    db::DbPool,
    entities::{
        materials_to_order::MaterialsToOrderStatus,
        materials_to_order_item,
        purchase_order::{self, PurchaseOrderStatus},
        purchase_order_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Cancels a purchase order and returns its unreceived quantity to the MTO.
///
/// Stock that already arrived stays counted: only `quantity -
/// quantity_received` per line is rolled back off the MTO counters. The MTO
/// status is re-derived afterwards, so a sole-contributor cancellation drops
/// the aggregate back to `DRAFT`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelPurchaseOrderCommand {
    pub purchase_order_id: Uuid,
}

#[async_trait::async_trait]
impl Command for CancelPurchaseOrderCommand {
    type Result = purchase_order::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let po_id = self.purchase_order_id;

        let (cancelled, status_change) = db_pool
            .transaction::<_, _, ServiceError>(move |txn| {
                Box::pin(async move {
                    let po = purchase_order::Entity::find_by_id(po_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Purchase order {} not found", po_id))
                        })?;

                    if po.status.is_terminal() {
                        return Err(ServiceError::InvalidStatus(
                            "Purchase order is already cancelled".to_string(),
                        ));
                    }
                    if po.status == PurchaseOrderStatus::FullyReceived {
                        return Err(ServiceError::InvalidStatus(
                            "Fully received purchase orders cannot be cancelled".to_string(),
                        ));
                    }

                    let mto_id = po.materials_to_order_id;
                    let po_lines = purchase_order_item::Entity::find()
                        .filter(purchase_order_item::Column::PurchaseOrderId.eq(po_id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    for line in &po_lines {
                        let unreceived = line.quantity - line.quantity_received;
                        if unreceived == 0 {
                            continue;
                        }
                        let mto_line = materials_to_order_item::Entity::find()
                            .filter(
                                materials_to_order_item::Column::MaterialsToOrderId.eq(mto_id),
                            )
                            .filter(materials_to_order_item::Column::ItemId.eq(line.item_id))
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::InternalError(format!(
                                    "Materials line missing for item {}",
                                    line.item_id
                                ))
                            })?;
                        deallocate_mto_line(txn, mto_line.id, unreceived).await?;
                    }

                    let mut active: purchase_order::ActiveModel = po.into();
                    active.status = Set(PurchaseOrderStatus::Cancelled);
                    active.updated_at = Set(Some(Utc::now()));
                    let cancelled = active.update(txn).await.map_err(ServiceError::db_error)?;

                    let status_change = recompute_mto_status(txn, mto_id).await?;

                    Ok((cancelled, status_change))
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        info!(
            purchase_order_id = %cancelled.id,
            order_no = %cancelled.order_no,
            "Purchase order cancelled"
        );

        event_sender
            .send(Event::PurchaseOrderCancelled(cancelled.id))
            .await
            .map_err(ServiceError::EventError)?;

        if let Some((old_status, new_status)) = status_change {
            self.emit_status_change(&event_sender, cancelled.materials_to_order_id, old_status, new_status)
                .await?;
        }

        Ok(cancelled)
    }
}

impl CancelPurchaseOrderCommand {
    async fn emit_status_change(
        &self,
        event_sender: &EventSender,
        mto_id: Uuid,
        old_status: MaterialsToOrderStatus,
        new_status: MaterialsToOrderStatus,
    ) -> Result<(), ServiceError> {
        event_sender
            .send(Event::MaterialsToOrderStatusChanged {
                materials_to_order_id: mto_id,
                old_status: format!("{:?}", old_status),
                new_status: format!("{:?}", new_status),
            })
            .await
            .map_err(ServiceError::EventError)
    }
}
