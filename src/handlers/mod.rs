use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        config_values::ConfigValueService, items::ItemService, materials_to_order::MaterialsToOrderService,
        media::MediaStorage, reconciliation::ReconciliationService, stock_ledger::StockLedgerService,
        suppliers::SupplierService,
    },
};
use slog::o;
use std::sync::Arc;

pub mod common;
pub mod config_values;
pub mod items;
pub mod materials_to_order;
pub mod purchase_orders;
pub mod stock_transactions;
pub mod suppliers;

pub use crate::AppState;

/// Container for the application's service layer
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemService>,
    pub stock_ledger: Arc<StockLedgerService>,
    pub suppliers: Arc<SupplierService>,
    pub materials_to_order: Arc<MaterialsToOrderService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub config_values: Arc<ConfigValueService>,
    pub media: Arc<MediaStorage>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        base_logger: slog::Logger,
        config: &AppConfig,
    ) -> Self {
        let media = Arc::new(MediaStorage::new(
            config.upload_dir.clone(),
            config.max_upload_bytes,
        ));

        Self {
            items: Arc::new(ItemService::new(
                db_pool.clone(),
                event_sender.clone(),
                base_logger.new(o!("component" => "items")),
            )),
            stock_ledger: Arc::new(StockLedgerService::new(
                db_pool.clone(),
                event_sender.clone(),
                base_logger.new(o!("component" => "stock_ledger")),
            )),
            suppliers: Arc::new(SupplierService::new(
                db_pool.clone(),
                event_sender.clone(),
                base_logger.new(o!("component" => "suppliers")),
            )),
            materials_to_order: Arc::new(MaterialsToOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                base_logger.new(o!("component" => "materials_to_order")),
            )),
            reconciliation: Arc::new(ReconciliationService::new(
                db_pool.clone(),
                event_sender.clone(),
                base_logger.new(o!("component" => "reconciliation")),
            )),
            config_values: Arc::new(ConfigValueService::new(
                db_pool,
                event_sender,
                base_logger.new(o!("component" => "config_values")),
            )),
            media,
        }
    }
}
