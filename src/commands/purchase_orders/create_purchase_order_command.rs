use crate::{
    commands::{
        purchase_orders::{allocate_mto_line, recompute_mto_status, unwrap_txn_error},
        Command,
    },
    db::DbPool,
    entities::{
        materials_to_order::{self, MaterialsToOrderStatus},
        materials_to_order_item,
        purchase_order::{self, PurchaseOrderStatus},
        purchase_order_item, supplier,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseOrderLineRequest {
    /// Inventory item this line orders; must match a line of the target MTO
    pub item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderCommand {
    #[validate(length(min = 1, message = "Order number must not be empty"))]
    pub order_no: String,
    pub supplier_id: Uuid,
    pub materials_to_order_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<PurchaseOrderLineRequest>,
    pub delivery_charge: Option<Decimal>,
    pub invoice_url: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePurchaseOrderResult {
    pub purchase_order: purchase_order::Model,
    pub items: Vec<purchase_order_item::Model>,
    pub mto_status: MaterialsToOrderStatus,
}

#[async_trait::async_trait]
impl Command for CreatePurchaseOrderCommand {
    type Result = CreatePurchaseOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(order_no = %self.order_no))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            counter!("millwork_po.create.rejected", 1);
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        if self.order_no.trim().is_empty() {
            counter!("millwork_po.create.rejected", 1);
            return Err(ServiceError::ValidationError(
                "Order number must not be blank".to_string(),
            ));
        }

        for line in &self.items {
            line.validate()
                .map_err(|e| ServiceError::ValidationError(format!("Invalid line: {}", e)))?;
        }

        let (result, status_change) = self.create_purchase_order(db_pool.as_ref()).await?;

        self.log_and_trigger_events(&event_sender, &result, status_change)
            .await?;

        counter!("millwork_po.create.succeeded", 1);

        Ok(result)
    }
}

impl CreatePurchaseOrderCommand {
    fn compute_total(&self) -> Decimal {
        let lines: Decimal = self
            .items
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();
        lines + self.delivery_charge.unwrap_or_default()
    }

    async fn create_purchase_order(
        &self,
        db: &DbPool,
    ) -> Result<
        (
            CreatePurchaseOrderResult,
            Option<(MaterialsToOrderStatus, MaterialsToOrderStatus)>,
        ),
        ServiceError,
    > {
        let order_no = self.order_no.trim().to_string();
        let supplier_id = self.supplier_id;
        let mto_id = self.materials_to_order_id;
        let lines = self.items.clone();
        let total_amount = self.compute_total();
        let delivery_charge = self.delivery_charge.unwrap_or_default();
        let invoice_url = self.invoice_url.clone();
        let invoice_date = self.invoice_date;
        let notes = self.notes.clone();

        db.transaction::<_, _, ServiceError>(move |txn| {
            Box::pin(async move {
                // order_no is the human-facing identifier; duplicates are a conflict
                let duplicate = purchase_order::Entity::find()
                    .filter(purchase_order::Column::OrderNo.eq(order_no.clone()))
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                if duplicate.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Order number '{}' is already in use",
                        order_no
                    )));
                }

                supplier::Entity::find_by_id(supplier_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
                    })?;

                let mto = materials_to_order::Entity::find_by_id(mto_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Materials to order {} not found", mto_id))
                    })?;
                if mto.status == MaterialsToOrderStatus::Closed {
                    return Err(ServiceError::InvalidOperation(
                        "Cannot order against a closed materials-to-order".to_string(),
                    ));
                }

                let mto_lines = materials_to_order_item::Entity::find()
                    .filter(materials_to_order_item::Column::MaterialsToOrderId.eq(mto_id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                let mto_lines_by_item: HashMap<Uuid, &materials_to_order_item::Model> =
                    mto_lines.iter().map(|line| (line.item_id, line)).collect();

                // Claim quantity on every referenced MTO line before writing
                // the PO itself; any failure rolls the whole transaction back.
                for line in &lines {
                    let mto_line =
                        mto_lines_by_item.get(&line.item_id).ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Item {} is not part of materials to order {}",
                                line.item_id, mto_id
                            ))
                        })?;
                    allocate_mto_line(txn, mto_line.id, line.quantity).await?;
                }

                let now = Utc::now();
                let new_po = purchase_order::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_no: Set(order_no.clone()),
                    supplier_id: Set(supplier_id),
                    materials_to_order_id: Set(mto_id),
                    total_amount: Set(total_amount),
                    delivery_charge: Set(delivery_charge),
                    invoice_url: Set(invoice_url),
                    invoice_date: Set(invoice_date),
                    status: Set(PurchaseOrderStatus::Draft),
                    ordered_at: Set(None),
                    ordered_by: Set(None),
                    notes: Set(notes),
                    created_at: Set(now),
                    updated_at: Set(None),
                };
                let saved_po = new_po.insert(txn).await.map_err(|e| {
                    error!("Failed to create purchase order {}: {}", order_no, e);
                    ServiceError::db_error(e)
                })?;

                let mut saved_items = Vec::with_capacity(lines.len());
                for line in &lines {
                    let new_item = purchase_order_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        purchase_order_id: Set(saved_po.id),
                        item_id: Set(line.item_id),
                        quantity: Set(line.quantity),
                        unit_price: Set(line.unit_price),
                        quantity_received: Set(0),
                    };
                    saved_items.push(
                        new_item
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?,
                    );
                }

                let status_change = recompute_mto_status(txn, mto_id).await?;
                let mto_status = status_change
                    .map(|(_, new)| new)
                    .unwrap_or(mto.status);

                Ok((
                    CreatePurchaseOrderResult {
                        purchase_order: saved_po,
                        items: saved_items,
                        mto_status,
                    },
                    status_change,
                ))
            })
        })
        .await
        .map_err(unwrap_txn_error)
    }

    async fn log_and_trigger_events(
        &self,
        event_sender: &EventSender,
        result: &CreatePurchaseOrderResult,
        status_change: Option<(MaterialsToOrderStatus, MaterialsToOrderStatus)>,
    ) -> Result<(), ServiceError> {
        info!(
            purchase_order_id = %result.purchase_order.id,
            order_no = %result.purchase_order.order_no,
            supplier_id = %self.supplier_id,
            items_count = %result.items.len(),
            total_amount = %result.purchase_order.total_amount,
            "Purchase order created successfully"
        );

        event_sender
            .send(Event::PurchaseOrderCreated(result.purchase_order.id))
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for created purchase order: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        if let Some((old_status, new_status)) = status_change {
            event_sender
                .send(Event::MaterialsToOrderStatusChanged {
                    materials_to_order_id: self.materials_to_order_id,
                    old_status: format!("{:?}", old_status),
                    new_status: format!("{:?}", new_status),
                })
                .await
                .map_err(|e| ServiceError::EventError(e.to_string()))?;
        }

        Ok(())
    }
}
