//! The reconciliation engine.
//!
//! Keeps materials-to-order counters, purchase order rows and the stock
//! ledger consistent. All mutations go through the purchase order commands;
//! this module owns the two pure status-derivation functions every write
//! path shares, and the service that fronts the commands for handlers.

use crate::{
    commands::{
        purchase_orders::{
            create_purchase_order_command::CreatePurchaseOrderResult,
            receive_purchase_order_command::ReceivePurchaseOrderResult,
            update_purchase_order_command::load_po_items, CancelPurchaseOrderCommand,
            CreatePurchaseOrderCommand, DeletePurchaseOrderCommand, ReceivePurchaseOrderCommand,
            UpdatePurchaseOrderCommand,
        },
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
    events::EventSender,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Derives an MTO status from its lines.
///
/// `FULLY_ORDERED` iff every line is fully covered by purchase orders,
/// `PARTIALLY_ORDERED` iff any line has coverage, otherwise `DRAFT`.
/// Never derives `CLOSED`; callers skip closed aggregates entirely.
pub fn derive_mto_status(lines: &[materials_to_order_item::Model]) -> MaterialsToOrderStatus {
    if !lines.is_empty()
        && lines
            .iter()
            .all(|line| line.quantity_ordered_po >= line.quantity)
    {
        MaterialsToOrderStatus::FullyOrdered
    } else if lines.iter().any(|line| line.quantity_ordered_po > 0) {
        MaterialsToOrderStatus::PartiallyOrdered
    } else {
        MaterialsToOrderStatus::Draft
    }
}

/// Derives a PO status from its lines.
///
/// `FULLY_RECEIVED` iff every line is fully received, `PARTIALLY_RECEIVED`
/// iff any line has receipts, otherwise the current status is kept
/// (`DRAFT`/`ORDERED` are not receipt-derived). `CANCELLED` is terminal and
/// never re-derived.
pub fn derive_po_status(
    lines: &[purchase_order_item::Model],
    current: PurchaseOrderStatus,
) -> PurchaseOrderStatus {
    if current == PurchaseOrderStatus::Cancelled {
        return current;
    }
    if !lines.is_empty()
        && lines
            .iter()
            .all(|line| line.quantity_received >= line.quantity)
    {
        PurchaseOrderStatus::FullyReceived
    } else if lines.iter().any(|line| line.quantity_received > 0) {
        PurchaseOrderStatus::PartiallyReceived
    } else {
        current
    }
}

/// Service fronting the purchase order commands
#[derive(Clone)]
pub struct ReconciliationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl ReconciliationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    #[instrument(skip(self, command), fields(order_no = %command.order_no))]
    pub async fn create_purchase_order(
        &self,
        command: CreatePurchaseOrderCommand,
    ) -> Result<CreatePurchaseOrderResult, ServiceError> {
        slog::info!(self.logger, "Creating purchase order";
            "order_no" => &command.order_no,
            "materials_to_order_id" => %command.materials_to_order_id,
        );
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn update_purchase_order(
        &self,
        command: UpdatePurchaseOrderCommand,
    ) -> Result<purchase_order::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_purchase_order(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<purchase_order::Model, ServiceError> {
        slog::info!(self.logger, "Cancelling purchase order";
            "purchase_order_id" => %purchase_order_id);
        CancelPurchaseOrderCommand { purchase_order_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn receive_purchase_order(
        &self,
        command: ReceivePurchaseOrderCommand,
    ) -> Result<ReceivePurchaseOrderResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, purchase_order_id: Uuid) -> Result<(), ServiceError> {
        slog::info!(self.logger, "Deleting purchase order";
            "purchase_order_id" => %purchase_order_id);
        DeletePurchaseOrderCommand { purchase_order_id }
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Fetches one purchase order with its lines
    #[instrument(skip(self))]
    pub async fn get_purchase_order(
        &self,
        purchase_order_id: Uuid,
    ) -> Result<(purchase_order::Model, Vec<purchase_order_item::Model>), ServiceError> {
        let po = purchase_order::Entity::find_by_id(purchase_order_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", purchase_order_id))
            })?;
        let items = load_po_items(&self.db_pool, purchase_order_id).await?;
        Ok((po, items))
    }

    /// Lists purchase orders, optionally narrowed to one supplier or one MTO
    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        supplier_id: Option<Uuid>,
        materials_to_order_id: Option<Uuid>,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        let mut query = purchase_order::Entity::find();
        if let Some(supplier_id) = supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }
        if let Some(mto_id) = materials_to_order_id {
            query = query.filter(purchase_order::Column::MaterialsToOrderId.eq(mto_id));
        }
        query
            .order_by_desc(purchase_order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn mto_line(quantity: i32, ordered: i32) -> materials_to_order_item::Model {
        materials_to_order_item::Model {
            id: Uuid::new_v4(),
            materials_to_order_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity,
            quantity_ordered_po: ordered,
            quantity_ordered: ordered,
            quantity_received: 0,
        }
    }

    fn po_line(quantity: i32, received: i32) -> purchase_order_item::Model {
        purchase_order_item::Model {
            id: Uuid::new_v4(),
            purchase_order_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            quantity,
            unit_price: rust_decimal::Decimal::ONE,
            quantity_received: received,
        }
    }

    #[test]
    fn mto_status_is_draft_with_no_coverage() {
        let lines = vec![mto_line(10, 0), mto_line(5, 0)];
        assert_eq!(derive_mto_status(&lines), MaterialsToOrderStatus::Draft);
    }

    #[test]
    fn mto_status_is_partially_ordered_with_any_coverage() {
        let lines = vec![mto_line(10, 4), mto_line(5, 0)];
        assert_eq!(
            derive_mto_status(&lines),
            MaterialsToOrderStatus::PartiallyOrdered
        );
    }

    #[test]
    fn mto_status_is_fully_ordered_when_every_line_is_covered() {
        let lines = vec![mto_line(10, 10), mto_line(5, 5)];
        assert_eq!(
            derive_mto_status(&lines),
            MaterialsToOrderStatus::FullyOrdered
        );
    }

    #[test]
    fn mto_status_one_uncovered_line_blocks_fully_ordered() {
        let lines = vec![mto_line(10, 10), mto_line(5, 4)];
        assert_eq!(
            derive_mto_status(&lines),
            MaterialsToOrderStatus::PartiallyOrdered
        );
    }

    #[test]
    fn mto_status_empty_lines_is_draft() {
        assert_eq!(derive_mto_status(&[]), MaterialsToOrderStatus::Draft);
    }

    #[test]
    fn po_status_keeps_current_without_receipts() {
        let lines = vec![po_line(10, 0)];
        assert_eq!(
            derive_po_status(&lines, PurchaseOrderStatus::Draft),
            PurchaseOrderStatus::Draft
        );
        assert_eq!(
            derive_po_status(&lines, PurchaseOrderStatus::Ordered),
            PurchaseOrderStatus::Ordered
        );
    }

    #[test]
    fn po_status_partial_receipt() {
        let lines = vec![po_line(10, 3), po_line(5, 0)];
        assert_eq!(
            derive_po_status(&lines, PurchaseOrderStatus::Ordered),
            PurchaseOrderStatus::PartiallyReceived
        );
    }

    #[test]
    fn po_status_full_receipt() {
        let lines = vec![po_line(10, 10), po_line(5, 5)];
        assert_eq!(
            derive_po_status(&lines, PurchaseOrderStatus::PartiallyReceived),
            PurchaseOrderStatus::FullyReceived
        );
    }

    #[test]
    fn po_status_cancelled_is_terminal() {
        let lines = vec![po_line(10, 10)];
        assert_eq!(
            derive_po_status(&lines, PurchaseOrderStatus::Cancelled),
            PurchaseOrderStatus::Cancelled
        );
    }
}
