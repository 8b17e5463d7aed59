use crate::{
    commands::{
        purchase_orders::{deallocate_mto_line, recompute_mto_status, unwrap_txn_error},
        Command,
    },
    db::DbPool,
    entities::{materials_to_order_item, purchase_order, purchase_order_item},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Hard-deletes a purchase order and returns its allocations to the MTO.
///
/// Refused once any line has received stock: the ledger is append-only and
/// deleting the order would orphan its receipt rows. An unreceived order is
/// fully rolled back, so a sole contributor's deletion drops the MTO back to
/// `DRAFT`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletePurchaseOrderCommand {
    pub purchase_order_id: Uuid,
}

#[async_trait::async_trait]
impl Command for DeletePurchaseOrderCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let po_id = self.purchase_order_id;

        let (order_no, status_change, mto_id) = db_pool
            .transaction::<_, _, ServiceError>(move |txn| {
                Box::pin(async move {
                    let po = purchase_order::Entity::find_by_id(po_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Purchase order {} not found", po_id))
                        })?;

                    let mto_id = po.materials_to_order_id;
                    let lines = purchase_order_item::Entity::find()
                        .filter(purchase_order_item::Column::PurchaseOrderId.eq(po_id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    if lines.iter().any(|line| line.quantity_received > 0) {
                        return Err(ServiceError::Conflict(
                            "Purchase orders with received stock cannot be deleted".to_string(),
                        ));
                    }

                    // A cancelled order already gave its allocation back
                    if !po.status.is_terminal() {
                        for line in &lines {
                            let mto_line = materials_to_order_item::Entity::find()
                                .filter(
                                    materials_to_order_item::Column::MaterialsToOrderId
                                        .eq(mto_id),
                                )
                                .filter(
                                    materials_to_order_item::Column::ItemId.eq(line.item_id),
                                )
                                .one(txn)
                                .await
                                .map_err(ServiceError::db_error)?
                                .ok_or_else(|| {
                                    ServiceError::InternalError(format!(
                                        "Materials line missing for item {}",
                                        line.item_id
                                    ))
                                })?;
                            deallocate_mto_line(txn, mto_line.id, line.quantity).await?;
                        }
                    }

                    purchase_order_item::Entity::delete_many()
                        .filter(purchase_order_item::Column::PurchaseOrderId.eq(po_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let order_no = po.order_no.clone();
                    po.delete(txn).await.map_err(ServiceError::db_error)?;

                    let status_change = recompute_mto_status(txn, mto_id).await?;

                    Ok((order_no, status_change, mto_id))
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        info!(
            purchase_order_id = %po_id,
            order_no = %order_no,
            "Purchase order deleted"
        );

        event_sender
            .send(Event::PurchaseOrderDeleted(po_id))
            .await
            .map_err(ServiceError::EventError)?;

        if let Some((old_status, new_status)) = status_change {
            event_sender
                .send(Event::MaterialsToOrderStatusChanged {
                    materials_to_order_id: mto_id,
                    old_status: format!("{:?}", old_status),
                    new_status: format!("{:?}", new_status),
                })
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(())
    }
}
