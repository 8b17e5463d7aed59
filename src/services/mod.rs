// Reconciliation engine fronting the purchase order commands
pub mod reconciliation;

// Inventory and ledger
pub mod items;
pub mod stock_ledger;

// Procurement aggregates
pub mod materials_to_order;

// Master data
pub mod config_values;
pub mod suppliers;

// File storage for uploads
pub mod media;
