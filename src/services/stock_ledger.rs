use crate::{
    commands::purchase_orders::unwrap_txn_error,
    db::DbPool,
    entities::{
        item,
        stock_transaction::{self, StockTransactionType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordStockTransactionInput {
    pub item_id: Uuid,
    pub transaction_type: StockTransactionType,
    /// Positive magnitude; the type (and `adjustment_increases` for ADJUSTED)
    /// decides the direction
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Direction flag for ADJUSTED rows; ignored for ADDED/USED
    #[serde(default)]
    pub adjustment_increases: bool,
    pub purchase_order_id: Option<Uuid>,
    pub materials_to_order_id: Option<Uuid>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl RecordStockTransactionInput {
    /// Signed effect on the item's on-hand quantity
    pub fn quantity_delta(&self) -> i32 {
        match self.transaction_type {
            StockTransactionType::Added => self.quantity,
            StockTransactionType::Used => -self.quantity,
            StockTransactionType::Adjusted => {
                if self.adjustment_increases {
                    self.quantity
                } else {
                    -self.quantity
                }
            }
        }
    }
}

/// Append-only stock ledger.
///
/// Every append also moves the item's on-hand quantity inside the same
/// transaction; drawing below zero fails the whole call and writes nothing.
#[derive(Clone)]
pub struct StockLedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl StockLedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    #[instrument(skip(self, input), fields(item_id = %input.item_id))]
    pub async fn record(
        &self,
        input: RecordStockTransactionInput,
    ) -> Result<stock_transaction::Model, ServiceError> {
        input.validate()?;

        let delta = input.quantity_delta();
        let item_id = input.item_id;

        let saved = self
            .db_pool
            .transaction::<_, stock_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    item::Entity::find_by_id(item_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Item {} not found", item_id))
                        })?;

                    // Conditional update keeps on-hand stock non-negative even
                    // under concurrent draws.
                    let mut update = item::Entity::update_many()
                        .col_expr(
                            item::Column::Quantity,
                            Expr::col(item::Column::Quantity).add(delta),
                        )
                        .filter(item::Column::Id.eq(item_id));
                    if delta < 0 {
                        update = update.filter(item::Column::Quantity.gte(-delta));
                    }
                    let result = update.exec(txn).await.map_err(ServiceError::db_error)?;
                    if result.rows_affected == 0 {
                        return Err(ServiceError::InsufficientStock(format!(
                            "Not enough stock on hand for item {} to draw {}",
                            item_id, -delta
                        )));
                    }

                    let row = stock_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        item_id: Set(item_id),
                        transaction_type: Set(input.transaction_type),
                        quantity: Set(input.quantity),
                        purchase_order_id: Set(input.purchase_order_id),
                        materials_to_order_id: Set(input.materials_to_order_id),
                        notes: Set(input.notes.clone()),
                        created_at: Set(Utc::now()),
                    };
                    row.insert(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(unwrap_txn_error)?;

        counter!("millwork_stock.transactions.recorded", 1);
        slog::info!(self.logger, "Stock transaction recorded";
            "transaction_id" => %saved.id,
            "item_id" => %saved.item_id,
            "delta" => delta,
        );

        self.event_sender
            .send(Event::StockTransactionRecorded {
                transaction_id: saved.id,
                item_id: saved.item_id,
                quantity_delta: delta,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }

    /// Most-recent-first page of an item's ledger
    #[instrument(skip(self))]
    pub async fn list_for_item(
        &self,
        item_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_transaction::Model>, u64), ServiceError> {
        let paginator = stock_transaction::Entity::find()
            .filter(stock_transaction::Column::ItemId.eq(item_id))
            .order_by_desc(stock_transaction::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((rows, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(transaction_type: StockTransactionType, quantity: i32, up: bool) -> RecordStockTransactionInput {
        RecordStockTransactionInput {
            item_id: Uuid::new_v4(),
            transaction_type,
            quantity,
            adjustment_increases: up,
            purchase_order_id: None,
            materials_to_order_id: None,
            notes: None,
        }
    }

    #[test]
    fn added_raises_on_hand() {
        assert_eq!(input(StockTransactionType::Added, 5, false).quantity_delta(), 5);
    }

    #[test]
    fn used_lowers_on_hand() {
        assert_eq!(input(StockTransactionType::Used, 5, true).quantity_delta(), -5);
    }

    #[test]
    fn adjusted_direction_follows_the_flag() {
        assert_eq!(input(StockTransactionType::Adjusted, 3, true).quantity_delta(), 3);
        assert_eq!(input(StockTransactionType::Adjusted, 3, false).quantity_delta(), -3);
    }
}
