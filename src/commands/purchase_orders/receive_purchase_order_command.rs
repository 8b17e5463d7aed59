use crate::{
    commands::{purchase_orders::unwrap_txn_error, Command},
    db::DbPool,
    entities::{
        item, materials_to_order_item,
        purchase_order::{self, PurchaseOrderStatus},
        purchase_order_item,
        stock_transaction::{self, StockTransactionType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReceiptLine {
    pub purchase_order_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Books received stock against a purchase order.
///
/// For every receipt line, in one transaction: raises the PO line's
/// `quantity_received` (capped at its ordered quantity), mirrors the receipt
/// onto the matching MTO line, raises the item's on-hand quantity, and
/// appends an `ADDED` row to the stock ledger. Finishes by re-deriving the PO
/// status.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReceivePurchaseOrderCommand {
    pub purchase_order_id: Uuid,
    #[validate(length(min = 1, message = "At least one receipt line is required"))]
    pub receipts: Vec<ReceiptLine>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceivePurchaseOrderResult {
    pub purchase_order: purchase_order::Model,
    pub items: Vec<purchase_order_item::Model>,
    pub fully_received: bool,
}

#[async_trait::async_trait]
impl Command for ReceivePurchaseOrderCommand {
    type Result = ReceivePurchaseOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()
            .map_err(|e| ServiceError::ValidationError(format!("Invalid input: {}", e)))?;
        for receipt in &self.receipts {
            receipt
                .validate()
                .map_err(|e| ServiceError::ValidationError(format!("Invalid receipt: {}", e)))?;
        }

        let result = self.receive(db_pool.as_ref()).await?;

        counter!("millwork_po.receipts.recorded", self.receipts.len() as u64);
        info!(
            purchase_order_id = %result.purchase_order.id,
            fully_received = %result.fully_received,
            "Purchase order receipt recorded"
        );

        event_sender
            .send(Event::PurchaseOrderReceived {
                purchase_order_id: result.purchase_order.id,
                fully_received: result.fully_received,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(result)
    }
}

impl ReceivePurchaseOrderCommand {
    async fn receive(&self, db: &DbPool) -> Result<ReceivePurchaseOrderResult, ServiceError> {
        let po_id = self.purchase_order_id;
        let receipts = self.receipts.clone();

        db.transaction::<_, ReceivePurchaseOrderResult, ServiceError>(move |txn| {
            Box::pin(async move {
                let po = purchase_order::Entity::find_by_id(po_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Purchase order {} not found", po_id))
                    })?;

                if !po.status.accepts_receipts() {
                    return Err(ServiceError::InvalidStatus(format!(
                        "Purchase order in status {:?} cannot receive stock",
                        po.status
                    )));
                }

                for receipt in &receipts {
                    let po_line = purchase_order_item::Entity::find_by_id(
                        receipt.purchase_order_item_id,
                    )
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .filter(|line| line.purchase_order_id == po_id)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Purchase order line {} not found on this order",
                            receipt.purchase_order_item_id
                        ))
                    })?;

                    // Conditional increment caps quantity_received at the
                    // ordered quantity even under concurrent receipts.
                    let updated = purchase_order_item::Entity::update_many()
                        .col_expr(
                            purchase_order_item::Column::QuantityReceived,
                            Expr::col(purchase_order_item::Column::QuantityReceived)
                                .add(receipt.quantity),
                        )
                        .filter(purchase_order_item::Column::Id.eq(po_line.id))
                        .filter(
                            Expr::col(purchase_order_item::Column::QuantityReceived)
                                .add(receipt.quantity)
                                .lte(Expr::col(purchase_order_item::Column::Quantity)),
                        )
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if updated.rows_affected == 0 {
                        error!(
                            purchase_order_item_id = %po_line.id,
                            qty = %receipt.quantity,
                            "Receipt would exceed the ordered quantity"
                        );
                        return Err(ServiceError::Conflict(format!(
                            "Receiving {} more would exceed the ordered quantity on line {}",
                            receipt.quantity, po_line.id
                        )));
                    }

                    // Mirror the receipt onto the MTO line
                    materials_to_order_item::Entity::update_many()
                        .col_expr(
                            materials_to_order_item::Column::QuantityReceived,
                            Expr::col(materials_to_order_item::Column::QuantityReceived)
                                .add(receipt.quantity),
                        )
                        .filter(
                            materials_to_order_item::Column::MaterialsToOrderId
                                .eq(po.materials_to_order_id),
                        )
                        .filter(materials_to_order_item::Column::ItemId.eq(po_line.item_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    // On-hand stock goes up with the receipt
                    item::Entity::update_many()
                        .col_expr(
                            item::Column::Quantity,
                            Expr::col(item::Column::Quantity).add(receipt.quantity),
                        )
                        .filter(item::Column::Id.eq(po_line.item_id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let ledger_row = stock_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        item_id: Set(po_line.item_id),
                        transaction_type: Set(StockTransactionType::Added),
                        quantity: Set(receipt.quantity),
                        purchase_order_id: Set(Some(po_id)),
                        materials_to_order_id: Set(Some(po.materials_to_order_id)),
                        notes: Set(Some(format!(
                            "Received against purchase order {}",
                            po.order_no
                        ))),
                        created_at: Set(Utc::now()),
                    };
                    ledger_row.insert(txn).await.map_err(ServiceError::db_error)?;
                }

                let lines = purchase_order_item::Entity::find()
                    .filter(purchase_order_item::Column::PurchaseOrderId.eq(po_id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                let derived =
                    crate::services::reconciliation::derive_po_status(&lines, po.status);
                let fully_received = derived == PurchaseOrderStatus::FullyReceived;

                let updated_po = if derived != po.status {
                    let mut active: purchase_order::ActiveModel = po.into();
                    active.status = Set(derived);
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)?
                } else {
                    po
                };

                Ok(ReceivePurchaseOrderResult {
                    purchase_order: updated_po,
                    items: lines,
                    fully_received,
                })
            })
        })
        .await
        .map_err(unwrap_txn_error)
    }
}
