mod common;

use axum::http::StatusCode;
use serde_json::json;

async fn seed_order(
    app: &common::TestApp,
    order_no: &str,
    quantity: i32,
) -> (String, String, String) {
    let supplier_id = app.seed_supplier("Wilson & Bradley").await;
    let item_id = app.seed_item("Corner carousel", Some(&supplier_id)).await;
    let (mto_id, _) = app.seed_mto(&item_id, quantity).await;
    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            json!({
                "order_no": order_no,
                "supplier_id": supplier_id,
                "materials_to_order_id": mto_id,
                "items": [{ "item_id": item_id, "quantity": quantity, "unit_price": "2.00" }],
                "delivery_charge": "5.00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "seed order: {}", body);
    let po_id = body["data"]["purchase_order"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    (po_id, supplier_id, item_id)
}

#[tokio::test]
async fn totals_include_lines_and_delivery_charge() {
    let app = common::spawn_app().await;
    let (po_id, _, _) = seed_order(&app, "PO-100", 2).await;

    let (status, body) = app.get(&format!("/api/v1/purchase-orders/{}", po_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_amount"], "9.00");
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));

    // Moving the delivery charge moves the total by the same delta
    let (status, body) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "delivery_charge": "10.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["total_amount"], "14.00");
}

#[tokio::test]
async fn marking_ordered_stamps_the_user_and_timestamp() {
    let app = common::spawn_app().await;
    let (po_id, _, _) = seed_order(&app, "PO-101", 3).await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "status": "ORDERED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "ORDERED");
    assert_eq!(body["data"]["ordered_by"], "Test User");
    assert!(!body["data"]["ordered_at"].is_null());

    // Going back to DRAFT is not a thing
    let (status, _) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "status": "DRAFT" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancellation_only_happens_through_the_cancel_endpoint() {
    let app = common::spawn_app().await;
    let (po_id, _, _) = seed_order(&app, "PO-102", 3).await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "status": "CANCELLED" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, _) = app
        .post_empty(&format!("/api/v1/purchase-orders/{}/cancel", po_id))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Terminal: no edits, no second cancel
    let (status, _) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "notes": "too late" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post_empty(&format!("/api/v1/purchase-orders/{}/cancel", po_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invoice_fields_distinguish_clear_from_keep() {
    let app = common::spawn_app().await;
    let (po_id, _, _) = seed_order(&app, "PO-103", 2).await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "invoice_url": "/media/inv-103.pdf", "invoice_date": "2026-08-30" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["invoice_url"], "/media/inv-103.pdf");
    assert_eq!(body["data"]["invoice_date"], "2026-08-30");

    // A patch that does not mention the invoice leaves it alone
    let (_, body) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "notes": "chased supplier" }),
        )
        .await;
    assert_eq!(body["data"]["invoice_url"], "/media/inv-103.pdf");

    // An explicit null clears it
    let (_, body) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "invoice_url": null }),
        )
        .await;
    assert!(body["data"]["invoice_url"].is_null());
    assert_eq!(body["data"]["invoice_date"], "2026-08-30");
}

#[tokio::test]
async fn listing_filters_by_supplier() {
    let app = common::spawn_app().await;
    let (_, supplier_id, _) = seed_order(&app, "PO-104", 2).await;
    seed_order(&app, "PO-105", 2).await;

    let (status, body) = app
        .get(&format!(
            "/api/v1/purchase-orders/by-supplier/{}",
            supplier_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_no"], "PO-104");
}

#[tokio::test]
async fn unknown_order_is_a_404() {
    let app = common::spawn_app().await;
    let (status, body) = app
        .get(&format!("/api/v1/purchase-orders/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], false);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = common::spawn_app().await;
    let (status, _) = app.get_unauthenticated("/api/v1/purchase-orders").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
