use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use millwork_api as api;
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test harness: in-memory database, full router and a valid bearer token.
pub struct TestApp {
    pub app: Router,
    pub token: String,
    // Held so uploaded files are cleaned up with the harness
    _upload_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    // A single connection keeps every query on the same in-memory database.
    let mut opts = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(opts)
        .await
        .expect("in-memory sqlite");
    api::migrator::Migrator::up(&db, None)
        .await
        .expect("migrations");
    let db = Arc::new(db);

    let upload_dir = tempfile::tempdir().expect("upload dir");

    let mut config = api::config::AppConfig::new(
        "sqlite::memory:".into(),
        "integration_test_secret_that_is_long_enough_123".into(),
        3600,
        "127.0.0.1".into(),
        0,
        "development".into(),
    );
    config.upload_dir = upload_dir.path().to_string_lossy().into_owned();

    let (event_tx, event_rx) = tokio::sync::mpsc::channel(256);
    let event_sender = Arc::new(api::events::EventSender::new(event_tx));
    tokio::spawn(api::events::process_events(event_rx));

    let auth_service = Arc::new(api::auth::AuthService::new(
        api::auth::AuthConfig::from_app_config(&config),
    ));
    let token = auth_service
        .issue_token("test-user", Some("Test User"), None)
        .expect("token");

    let services = api::handlers::AppServices::new(
        db.clone(),
        event_sender.clone(),
        api::logging::discard_logger(),
        &config,
    );

    let state = api::AppState {
        db,
        config,
        event_sender,
        auth: auth_service.clone(),
        services,
    };

    let app = Router::new()
        .nest("/api/v1", api::api_v1_routes())
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |axum::extract::State(auth): axum::extract::State<Arc<api::auth::AuthService>>,
             mut req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        .layer(axum::middleware::from_fn(
            api::middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state);

    TestApp {
        app,
        token,
        _upload_dir: upload_dir,
    }
}

impl TestApp {
    async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    /// GET without the Authorization header
    pub async fn get_unauthenticated(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    /// POST a single "file" field as multipart/form-data
    pub async fn post_file(
        &self,
        uri: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = "------------------------millwork-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("request");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.request("POST", uri, None).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    /// Creates a supplier and returns its id
    pub async fn seed_supplier(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/suppliers",
                serde_json::json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed supplier: {}", body);
        body["data"]["id"].as_str().expect("supplier id").to_string()
    }

    /// Creates a hardware item and returns its id
    pub async fn seed_item(&self, description: &str, supplier_id: Option<&str>) -> String {
        let (status, body) = self
            .post(
                "/api/v1/items",
                serde_json::json!({
                    "description": description,
                    "price": "4.50",
                    "measurement_unit": "each",
                    "supplier_id": supplier_id,
                    "attributes": {
                        "category": "HARDWARE",
                        "sub_category": "hinge",
                        "brand": "Blum"
                    }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed item: {}", body);
        body["data"]["id"].as_str().expect("item id").to_string()
    }

    /// Creates a materials-to-order aggregate with one line and returns
    /// (mto_id, mto_item_id)
    pub async fn seed_mto(&self, item_id: &str, quantity: i32) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/materials-to-order",
                serde_json::json!({
                    "project_id": uuid::Uuid::new_v4(),
                    "items": [{ "item_id": item_id, "quantity": quantity }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed mto: {}", body);
        let mto_id = body["data"]["id"].as_str().expect("mto id").to_string();
        let line_id = body["data"]["items"][0]["id"]
            .as_str()
            .expect("mto line id")
            .to_string();
        (mto_id, line_id)
    }
}
