use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Millwork Admin API",
        version = "0.3.0",
        description = r#"
# Millwork Admin API

Back-office API for a cabinetry workshop: inventory items, suppliers,
materials-to-order aggregates, purchase orders and the append-only stock
ledger.

## Authentication

All `/api/v1` endpoints (except `/status` and `/health`) require a bearer
token issued by the identity service:

```
Authorization: Bearer <jwt>
```

## Envelope

Every JSON response uses the same envelope:

```json
{
  "status": true,
  "message": "Purchase order created",
  "data": { }
}
```

`status` is `false` on errors, with `data` null and `message` holding the
human-readable reason.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "items", description = "Inventory items and their category attributes"),
        (name = "stock", description = "Append-only stock ledger"),
        (name = "materials-to-order", description = "Per-project material aggregates"),
        (name = "purchase-orders", description = "Purchase orders and MTO reconciliation"),
        (name = "suppliers", description = "Supplier master data, contacts and statements"),
        (name = "config", description = "Configurable dropdown vocabularies")
    ),
    paths(
        // Items
        crate::handlers::items::create_item,
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::items::list_items_by_supplier,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
        crate::handlers::items::list_item_stock_transactions,

        // Stock ledger
        crate::handlers::stock_transactions::record_stock_transaction,

        // Materials to order
        crate::handlers::materials_to_order::create_materials_to_order,
        crate::handlers::materials_to_order::list_materials_to_order,
        crate::handlers::materials_to_order::get_materials_to_order,
        crate::handlers::materials_to_order::update_materials_to_order,
        crate::handlers::materials_to_order::close_materials_to_order,
        crate::handlers::materials_to_order::upload_materials_to_order_media,
        crate::handlers::materials_to_order::remove_materials_to_order_media,

        // Purchase orders
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders_by_supplier,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,
        crate::handlers::purchase_orders::receive_purchase_order,
        crate::handlers::purchase_orders::upload_purchase_order_invoice,
        crate::handlers::purchase_orders::delete_purchase_order,

        // Suppliers
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
        crate::handlers::suppliers::create_contact,
        crate::handlers::suppliers::list_contacts,
        crate::handlers::suppliers::update_contact,
        crate::handlers::suppliers::delete_contact,
        crate::handlers::suppliers::create_statement,
        crate::handlers::suppliers::list_statements,
        crate::handlers::suppliers::get_statement,
        crate::handlers::suppliers::update_statement,
        crate::handlers::suppliers::delete_statement,
        crate::handlers::suppliers::upload_statement_file,

        // Config vocabulary
        crate::handlers::config_values::list_config_values,
        crate::handlers::config_values::create_config_value,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            crate::handlers::items::CreateItemRequest,
            crate::handlers::items::UpdateItemRequest,
            crate::services::items::ItemAttributes,
            crate::entities::item::ItemCategory,

            crate::services::stock_ledger::RecordStockTransactionInput,
            crate::entities::stock_transaction::StockTransactionType,

            crate::handlers::materials_to_order::CreateMaterialsToOrderRequest,
            crate::handlers::materials_to_order::UpdateMaterialsToOrderRequest,
            crate::entities::materials_to_order::MaterialsToOrderStatus,

            crate::handlers::purchase_orders::CreatePurchaseOrderRequest,
            crate::handlers::purchase_orders::UpdatePurchaseOrderRequest,
            crate::handlers::purchase_orders::ReceivePurchaseOrderRequest,
            crate::entities::purchase_order::PurchaseOrderStatus,

            crate::handlers::suppliers::CreateSupplierRequest,
            crate::handlers::suppliers::UpdateSupplierRequest,
            crate::handlers::suppliers::CreateContactRequest,
            crate::handlers::suppliers::UpdateContactRequest,
            crate::handlers::suppliers::CreateStatementRequest,
            crate::handlers::suppliers::UpdateStatementRequest,
            crate::entities::supplier_statement::PaymentStatus,

            crate::handlers::config_values::CreateConfigValueRequest,
            crate::entities::config_value::ConfigCategory,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_the_core_surface() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Millwork Admin API"));
        assert!(json.contains("/api/v1/purchase-orders"));
        assert!(json.contains("bearer_auth"));
    }
}
