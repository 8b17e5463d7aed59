//! Purchase order commands.
//!
//! Each command runs inside a single database transaction and keeps the
//! materials-to-order counters, the purchase order rows and the stock ledger
//! consistent with each other. Counter movements against MTO lines always go
//! through the conditional updates in this module so concurrent writers can
//! never push a counter past its bound.

use crate::entities::materials_to_order::{self, MaterialsToOrderStatus};
use crate::entities::materials_to_order_item;
use crate::errors::ServiceError;
use crate::services::reconciliation::derive_mto_status;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionError,
};
use tracing::error;
use uuid::Uuid;

pub mod cancel_purchase_order_command;
pub mod create_purchase_order_command;
pub mod delete_purchase_order_command;
pub mod receive_purchase_order_command;
pub mod update_purchase_order_command;

pub use cancel_purchase_order_command::CancelPurchaseOrderCommand;
pub use create_purchase_order_command::{
    CreatePurchaseOrderCommand, PurchaseOrderLineRequest,
};
pub use delete_purchase_order_command::DeletePurchaseOrderCommand;
pub use receive_purchase_order_command::{ReceiptLine, ReceivePurchaseOrderCommand};
pub use update_purchase_order_command::UpdatePurchaseOrderCommand;

/// Flattens a SeaORM transaction error into the service error raised inside it
pub(crate) fn unwrap_txn_error(e: TransactionError<ServiceError>) -> ServiceError {
    match e {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// Atomically moves `quantity_ordered_po` (and its display mirror
/// `quantity_ordered`) up by `qty` on one MTO line.
///
/// The increment and the bound check happen in a single conditional UPDATE:
/// `SET quantity_ordered_po = quantity_ordered_po + qty
///  WHERE id = ? AND quantity_ordered_po + qty <= quantity`.
/// Zero rows affected means another writer claimed the remaining quantity
/// first; the caller's transaction must fail so nothing is left half-applied.
pub(crate) async fn allocate_mto_line(
    txn: &DatabaseTransaction,
    mto_item_id: Uuid,
    qty: i32,
) -> Result<(), ServiceError> {
    let result = materials_to_order_item::Entity::update_many()
        .col_expr(
            materials_to_order_item::Column::QuantityOrderedPo,
            Expr::col(materials_to_order_item::Column::QuantityOrderedPo).add(qty),
        )
        .col_expr(
            materials_to_order_item::Column::QuantityOrdered,
            Expr::col(materials_to_order_item::Column::QuantityOrdered).add(qty),
        )
        .filter(materials_to_order_item::Column::Id.eq(mto_item_id))
        .filter(
            Expr::col(materials_to_order_item::Column::QuantityOrderedPo)
                .add(qty)
                .lte(Expr::col(materials_to_order_item::Column::Quantity)),
        )
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        error!(
            mto_item_id = %mto_item_id,
            qty = %qty,
            "Ordered quantity would exceed the required quantity"
        );
        return Err(ServiceError::Conflict(format!(
            "Ordering {} more would exceed the required quantity for materials line {}",
            qty, mto_item_id
        )));
    }

    Ok(())
}

/// Returns previously allocated quantity to an MTO line.
///
/// Guarded the same way as [`allocate_mto_line`] so the counter can never go
/// below zero, which would indicate the rollback amount was computed from
/// stale data.
pub(crate) async fn deallocate_mto_line(
    txn: &DatabaseTransaction,
    mto_item_id: Uuid,
    qty: i32,
) -> Result<(), ServiceError> {
    if qty == 0 {
        return Ok(());
    }

    let result = materials_to_order_item::Entity::update_many()
        .col_expr(
            materials_to_order_item::Column::QuantityOrderedPo,
            Expr::col(materials_to_order_item::Column::QuantityOrderedPo).sub(qty),
        )
        .col_expr(
            materials_to_order_item::Column::QuantityOrdered,
            Expr::col(materials_to_order_item::Column::QuantityOrdered).sub(qty),
        )
        .filter(materials_to_order_item::Column::Id.eq(mto_item_id))
        .filter(materials_to_order_item::Column::QuantityOrderedPo.gte(qty))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;

    if result.rows_affected == 0 {
        error!(
            mto_item_id = %mto_item_id,
            qty = %qty,
            "Cannot return more than was allocated to the materials line"
        );
        return Err(ServiceError::ConcurrentModification(mto_item_id));
    }

    Ok(())
}

/// Re-derives and persists the MTO status from its current lines.
///
/// A `CLOSED` aggregate is terminal and left untouched. Returns the
/// `(old, new)` pair when the status actually changed so the caller can emit
/// a status-change event after commit.
pub(crate) async fn recompute_mto_status(
    txn: &DatabaseTransaction,
    mto_id: Uuid,
) -> Result<Option<(MaterialsToOrderStatus, MaterialsToOrderStatus)>, ServiceError> {
    let mto = materials_to_order::Entity::find_by_id(mto_id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Materials to order {} not found", mto_id))
        })?;

    if mto.status == MaterialsToOrderStatus::Closed {
        return Ok(None);
    }

    let lines = materials_to_order_item::Entity::find()
        .filter(materials_to_order_item::Column::MaterialsToOrderId.eq(mto_id))
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;

    let derived = derive_mto_status(&lines);
    if derived == mto.status {
        return Ok(None);
    }

    let old_status = mto.status;
    let mut active: materials_to_order::ActiveModel = mto.into();
    active.status = Set(derived);
    active.updated_at = Set(Some(chrono::Utc::now()));
    active.update(txn).await.map_err(ServiceError::db_error)?;

    Ok(Some((old_status, derived)))
}
