mod common;

use axum::http::StatusCode;
use serde_json::json;

fn po_body(order_no: &str, supplier_id: &str, mto_id: &str, item_id: &str, qty: i32) -> serde_json::Value {
    json!({
        "order_no": order_no,
        "supplier_id": supplier_id,
        "materials_to_order_id": mto_id,
        "items": [{ "item_id": item_id, "quantity": qty, "unit_price": "2.00" }]
    })
}

#[tokio::test]
async fn partial_orders_walk_the_mto_to_fully_ordered_and_the_guard_holds() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Lincoln Sentry").await;
    let item_id = app.seed_item("35mm hinge", Some(&supplier_id)).await;
    let (mto_id, _) = app.seed_mto(&item_id, 100).await;

    // First order covers 60 of 100
    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-1", &supplier_id, &mto_id, &item_id, 60),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["mto_status"], "PARTIALLY_ORDERED");

    // Second order covers the remaining 40
    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-2", &supplier_id, &mto_id, &item_id, 40),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["mto_status"], "FULLY_ORDERED");

    // Even one more unit must be refused and leave nothing behind
    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-3", &supplier_id, &mto_id, &item_id, 1),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    assert_eq!(body["status"], false);

    let (status, body) = app
        .get(&format!("/api/v1/materials-to-order/{}", mto_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "FULLY_ORDERED");
    assert_eq!(body["data"]["items"][0]["quantity_ordered_po"], 100);
    assert_eq!(body["data"]["items"][0]["quantity_ordered"], 100);

    // Only the two accepted orders exist
    let (status, body) = app
        .get(&format!(
            "/api/v1/purchase-orders?materials_to_order_id={}",
            mto_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn blank_order_no_is_rejected_without_touching_the_mto() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Hafele").await;
    let item_id = app.seed_item("Soft-close runner", None).await;
    let (mto_id, _) = app.seed_mto(&item_id, 10).await;

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("   ", &supplier_id, &mto_id, &item_id, 5),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (_, body) = app
        .get(&format!("/api/v1/materials-to-order/{}", mto_id))
        .await;
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["items"][0]["quantity_ordered_po"], 0);
}

#[tokio::test]
async fn duplicate_order_no_is_a_conflict() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Hettich").await;
    let item_id = app.seed_item("Drawer box", None).await;
    let (mto_id, _) = app.seed_mto(&item_id, 20).await;

    let (status, _) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-77", &supplier_id, &mto_id, &item_id, 5),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-77", &supplier_id, &mto_id, &item_id, 5),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn deleting_the_sole_contributor_returns_the_mto_to_draft() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Polytec").await;
    let item_id = app.seed_item("Melamine sheet", None).await;
    let (mto_id, _) = app.seed_mto(&item_id, 50).await;

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-10", &supplier_id, &mto_id, &item_id, 30),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let po_id = body["data"]["purchase_order"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .delete(&format!("/api/v1/purchase-orders/{}", po_id))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .get(&format!("/api/v1/materials-to-order/{}", mto_id))
        .await;
    assert_eq!(body["data"]["status"], "DRAFT");
    assert_eq!(body["data"]["items"][0]["quantity_ordered_po"], 0);
}

#[tokio::test]
async fn receiving_posts_to_the_ledger_and_flips_statuses() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Blum").await;
    let item_id = app.seed_item("Clip-top hinge", Some(&supplier_id)).await;
    let (mto_id, _) = app.seed_mto(&item_id, 40).await;

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-20", &supplier_id, &mto_id, &item_id, 40),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let po_id = body["data"]["purchase_order"]["id"].as_str().unwrap().to_string();
    let po_line_id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    // Only placed orders accept receipts
    let (status, body) = app
        .post(
            &format!("/api/v1/purchase-orders/{}/receive", po_id),
            json!({ "receipts": [{ "purchase_order_item_id": po_line_id, "quantity": 40 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, _) = app
        .patch(
            &format!("/api/v1/purchase-orders/{}", po_id),
            json!({ "status": "ORDERED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            &format!("/api/v1/purchase-orders/{}/receive", po_id),
            json!({ "receipts": [{ "purchase_order_item_id": po_line_id, "quantity": 40 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["fully_received"], true);
    assert_eq!(body["data"]["purchase_order"]["status"], "FULLY_RECEIVED");

    // On-hand stock went up
    let (_, body) = app.get(&format!("/api/v1/items/{}", item_id)).await;
    assert_eq!(body["data"]["quantity"], 40);

    // And the ledger has the ADDED row pointing back at the order
    let (_, body) = app
        .get(&format!("/api/v1/items/{}/stock-transactions", item_id))
        .await;
    let rows = body["data"]["items"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["transaction_type"], "ADDED");
    assert_eq!(rows[0]["quantity"], 40);
    assert_eq!(rows[0]["purchase_order_id"].as_str(), Some(po_id.as_str()));

    // Receipt mirrored onto the MTO line
    let (_, body) = app
        .get(&format!("/api/v1/materials-to-order/{}", mto_id))
        .await;
    assert_eq!(body["data"]["items"][0]["quantity_received"], 40);
}

#[tokio::test]
async fn cancelling_rolls_back_only_the_unreceived_quantity() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Titus").await;
    let item_id = app.seed_item("Cam lock", None).await;
    let (mto_id, _) = app.seed_mto(&item_id, 60).await;

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-30", &supplier_id, &mto_id, &item_id, 60),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let po_id = body["data"]["purchase_order"]["id"].as_str().unwrap().to_string();
    let po_line_id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    app.patch(
        &format!("/api/v1/purchase-orders/{}", po_id),
        json!({ "status": "ORDERED" }),
    )
    .await;
    let (status, _) = app
        .post(
            &format!("/api/v1/purchase-orders/{}/receive", po_id),
            json!({ "receipts": [{ "purchase_order_item_id": po_line_id, "quantity": 20 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_empty(&format!("/api/v1/purchase-orders/{}/cancel", po_id))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "CANCELLED");

    // 20 received units keep their claim; the unreceived 40 are given back
    let (_, body) = app
        .get(&format!("/api/v1/materials-to-order/{}", mto_id))
        .await;
    assert_eq!(body["data"]["items"][0]["quantity_ordered_po"], 20);
    assert_eq!(body["data"]["status"], "PARTIALLY_ORDERED");

    // Received stock pins the order to history
    let (status, _) = app
        .delete(&format!("/api/v1/purchase-orders/{}", po_id))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn closed_mtos_reject_new_purchase_orders() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Nover").await;
    let item_id = app.seed_item("Edging tape roll", None).await;
    let (mto_id, _) = app.seed_mto(&item_id, 10).await;

    let (status, _) = app
        .post_empty(&format!("/api/v1/materials-to-order/{}/close", mto_id))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/v1/purchase-orders",
            po_body("PO-40", &supplier_id, &mto_id, &item_id, 5),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // Closing twice is also refused
    let (status, _) = app
        .post_empty(&format!("/api/v1/materials-to-order/{}/close", mto_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn drawing_below_zero_stock_is_refused() {
    let app = common::spawn_app().await;
    let item_id = app.seed_item("Shelf pin", None).await;

    let (status, _) = app
        .post(
            "/api/v1/stock-transactions",
            json!({ "item_id": item_id, "transaction_type": "ADDED", "quantity": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/v1/stock-transactions",
            json!({ "item_id": item_id, "transaction_type": "USED", "quantity": 6 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    // The failed draw wrote nothing
    let (_, body) = app
        .get(&format!("/api/v1/items/{}/stock-transactions", item_id))
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (_, body) = app.get(&format!("/api/v1/items/{}", item_id)).await;
    assert_eq!(body["data"]["quantity"], 5);
}

#[tokio::test]
async fn duplicate_vocabulary_values_conflict() {
    let app = common::spawn_app().await;

    let (status, _) = app
        .post(
            "/api/v1/config/values",
            json!({ "category": "finish", "value": "Matte" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/v1/config/values",
            json!({ "category": "finish", "value": "Matte" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get("/api/v1/config/values?category=finish").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}
