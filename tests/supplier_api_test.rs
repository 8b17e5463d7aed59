mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn supplier_crud_round_trip() {
    let app = common::spawn_app().await;

    let (status, body) = app
        .post(
            "/api/v1/suppliers",
            json!({
                "name": "Lincoln Sentry",
                "email": "orders@lincolnsentry.com.au",
                "website": "https://www.lincolnsentry.com.au",
                "abn_number": "50 010 655 499"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!("/api/v1/suppliers/{}", id),
            json!({ "phone": "07 3333 0000" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "07 3333 0000");
    assert_eq!(body["data"]["name"], "Lincoln Sentry");

    let (status, _) = app.delete(&format!("/api/v1/suppliers/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/v1/suppliers/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_email_and_website_are_rejected() {
    let app = common::spawn_app().await;
    let (status, _) = app
        .post(
            "/api/v1/suppliers",
            json!({ "name": "Acme", "email": "not-an-email" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post(
            "/api/v1/suppliers",
            json!({ "name": "Acme", "website": "not a url" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contacts_belong_to_their_supplier() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Hafele").await;
    let other_id = app.seed_supplier("Blum").await;

    let (status, body) = app
        .post(
            &format!("/api/v1/suppliers/{}/contacts", supplier_id),
            json!({ "name": "Sam Lee", "role": "Account manager" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let contact_id = body["data"]["id"].as_str().unwrap().to_string();

    // Addressing the contact through the wrong supplier is a 404
    let (status, _) = app
        .patch(
            &format!("/api/v1/suppliers/{}/contacts/{}", other_id, contact_id),
            json!({ "name": "Sam L." }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .patch(
            &format!("/api/v1/suppliers/{}/contacts/{}", supplier_id, contact_id),
            json!({ "name": "Sam L." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sam L.");

    let (_, body) = app
        .get(&format!("/api/v1/suppliers/{}/contacts", supplier_id))
        .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = app
        .delete(&format!(
            "/api/v1/suppliers/{}/contacts/{}",
            supplier_id, contact_id
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn statements_validate_the_billing_period() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Polytec").await;

    let (status, _) = app
        .post(
            &format!("/api/v1/suppliers/{}/statements", supplier_id),
            json!({ "month_year": "August 2026", "amount": "1200.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            &format!("/api/v1/suppliers/{}/statements", supplier_id),
            json!({ "month_year": "2026-08", "amount": "1200.00", "due_date": "2026-09-14" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["payment_status"], "PENDING");
    let statement_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!(
                "/api/v1/suppliers/{}/statements/{}",
                supplier_id, statement_id
            ),
            json!({ "payment_status": "PAID" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "PAID");
}

#[tokio::test]
async fn statement_files_upload_and_attach() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Nover").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/suppliers/{}/statements", supplier_id),
            json!({ "month_year": "2026-07", "amount": "840.50" }),
        )
        .await;
    let statement_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_file(
            &format!(
                "/api/v1/suppliers/{}/statements/{}/file",
                supplier_id, statement_id
            ),
            "statement-july.pdf",
            b"%PDF-1.4 fake statement",
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let url = body["data"]["file_url"].as_str().unwrap();
    assert!(url.starts_with("/media/"));
    assert!(url.ends_with(".pdf"));
}

#[tokio::test]
async fn suppliers_referenced_by_items_cannot_be_deleted() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Hettich").await;
    app.seed_item("Drawer slide", Some(&supplier_id)).await;

    let (status, body) = app
        .delete(&format!("/api/v1/suppliers/{}", supplier_id))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn suppliers_with_purchase_orders_cannot_be_deleted() {
    let app = common::spawn_app().await;
    let supplier_id = app.seed_supplier("Titus").await;
    let item_id = app.seed_item("Cam lock", Some(&supplier_id)).await;
    let (mto_id, _) = app.seed_mto(&item_id, 10).await;

    let (status, _) = app
        .post(
            "/api/v1/purchase-orders",
            json!({
                "order_no": "PO-200",
                "supplier_id": supplier_id,
                "materials_to_order_id": mto_id,
                "items": [{ "item_id": item_id, "quantity": 5, "unit_price": "1.10" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.delete(&format!("/api/v1/suppliers/{}", supplier_id)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}
