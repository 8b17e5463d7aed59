mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn item_carries_its_category_attributes() {
    let app = common::spawn_app().await;

    let (status, body) = app
        .post(
            "/api/v1/items",
            json!({
                "description": "White melamine 16mm",
                "price": "85.00",
                "measurement_unit": "sheet",
                "attributes": {
                    "category": "SHEET",
                    "material": "Melamine",
                    "finish": "White",
                    "thickness_mm": "16",
                    "length_mm": "2400",
                    "width_mm": "1200"
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["category"], "SHEET");
    assert_eq!(body["data"]["quantity"], 0);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attributes"]["material"], "Melamine");
    assert_eq!(body["data"]["attributes"]["thickness_mm"], "16");
}

#[tokio::test]
async fn attribute_updates_must_match_the_stored_category() {
    let app = common::spawn_app().await;
    let id = app.seed_item("Blum hinge", None).await;

    // Rewriting the hardware detail row is fine
    let (status, body) = app
        .patch(
            &format!("/api/v1/items/{}", id),
            json!({
                "attributes": {
                    "category": "HARDWARE",
                    "sub_category": "hinge",
                    "brand": "Hettich"
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["attributes"]["brand"], "Hettich");

    // Swapping category is not
    let (status, body) = app
        .patch(
            &format!("/api/v1/items/{}", id),
            json!({
                "attributes": { "category": "ACCESSORY", "accessory_type": "bin" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (_, body) = app.get(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(body["data"]["category"], "HARDWARE");
}

#[tokio::test]
async fn scalar_fields_patch_independently() {
    let app = common::spawn_app().await;
    let id = app.seed_item("Soft-close hinge", None).await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/items/{}", id),
            json!({ "price": "6.20", "description": "Soft-close hinge 110deg" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["price"], "6.20");
    assert_eq!(body["data"]["description"], "Soft-close hinge 110deg");
    // Attributes untouched
    assert_eq!(body["data"]["attributes"]["sub_category"], "hinge");

    let (status, _) = app
        .patch(
            &format!("/api/v1/items/{}", id),
            json!({ "description": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_an_unreferenced_item_removes_it() {
    let app = common::spawn_app().await;
    let id = app.seed_item("Spare part", None).await;

    let (status, _) = app.delete(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ledger_history_blocks_deletion() {
    let app = common::spawn_app().await;
    let id = app.seed_item("Shelf pin", None).await;

    let (status, _) = app
        .post(
            "/api/v1/stock-transactions",
            json!({ "item_id": id, "transaction_type": "ADDED", "quantity": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.delete(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn listing_filters_by_category_and_supplier() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Lincoln Sentry").await;
    app.seed_item("Hinge A", Some(&supplier_id)).await;
    app.seed_item("Hinge B", None).await;

    let (status, body) = app.get("/api/v1/items?category=HARDWARE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) = app.get("/api/v1/items?category=SHEET").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let (status, body) = app
        .get(&format!("/api/v1/items/by-supplier/{}", supplier_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "Hinge A");
}

#[tokio::test]
async fn materials_lines_block_item_deletion() {
    let app = common::spawn_app().await;
    let id = app.seed_item("Drawer runner", None).await;
    app.seed_mto(&id, 4).await;

    let (status, body) = app.delete(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn adjustments_move_stock_both_ways() {
    let app = common::spawn_app().await;
    let id = app.seed_item("Edging tape", None).await;

    app.post(
        "/api/v1/stock-transactions",
        json!({ "item_id": id, "transaction_type": "ADDED", "quantity": 10 }),
    )
    .await;
    app.post(
        "/api/v1/stock-transactions",
        json!({
            "item_id": id,
            "transaction_type": "ADJUSTED",
            "quantity": 3,
            "adjustment_increases": false,
            "notes": "stocktake"
        }),
    )
    .await;

    let (_, body) = app.get(&format!("/api/v1/items/{}", id)).await;
    assert_eq!(body["data"]["quantity"], 7);

    let (_, body) = app
        .get(&format!(
            "/api/v1/items/{}/stock-transactions?page=1&per_page=10",
            id
        ))
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 2);
    // Most recent first
    assert_eq!(body["data"]["items"][0]["transaction_type"], "ADJUSTED");
}
