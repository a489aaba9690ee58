mod common;

use axum::body::Body;
use common::{TestApp, body_bytes, body_json};
use http::{Request, StatusCode};
use serde_json::json;
use shared::PushEvent;

fn new_order() -> serde_json::Value {
    json!({
        "customer": "Awa Diop",
        "items": ["Robe wax", "Foulard"],
        "totalAmount": 10000,
        "paidAmount": 4000,
        "note": "Livrer samedi"
    })
}

#[tokio::test]
async fn create_update_fetch_round_trip() {
    let app = TestApp::new().await;

    let response = app.json("POST", "/api/orders", new_order()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "partial");
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .json("PATCH", &format!("/api/orders/{id}"), json!({ "paidAmount": 10000 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "paid");

    let fetched = body_json(app.get(&format!("/api/orders/{id}")).await).await;
    assert_eq!(fetched["status"], "paid");
    assert_eq!(fetched["paidAmount"], 10000);
    assert_eq!(fetched["note"], "Livrer samedi");
    assert_eq!(fetched["createdAt"], created["createdAt"]);

    let list = body_json(app.get("/api/orders").await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn client_status_is_overridden() {
    let app = TestApp::new().await;
    let mut body = new_order();
    body["status"] = json!("paid");

    let created = body_json(app.json("POST", "/api/orders", body).await).await;
    assert_eq!(created["status"], "partial");
}

#[tokio::test]
async fn mutations_are_broadcast() {
    let app = TestApp::new().await;
    let mut conn = app.state.push.register();

    let created = body_json(app.json("POST", "/api/orders", new_order()).await).await;
    let id = created["id"].as_str().unwrap().to_string();

    let frame = conn.try_recv().expect("created frame");
    let event = PushEvent::from_json(&frame).unwrap();
    assert!(matches!(event, PushEvent::OrderCreated(ref o) if o.id == id));

    let response = app
        .send(
            Request::delete(format!("/api/orders/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let frame = conn.try_recv().expect("deleted frame");
    let wire: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(wire, json!({ "type": "order_deleted", "data": { "id": id } }));
}

#[tokio::test]
async fn deleting_missing_order_is_404_without_broadcast() {
    let app = TestApp::new().await;
    let mut conn = app.state.push.register();

    let response = app
        .send(
            Request::delete("/api/orders/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 4001);
    assert!(conn.try_recv().is_none());
}

#[tokio::test]
async fn patching_missing_order_is_404() {
    let app = TestApp::new().await;
    let response = app
        .json("PATCH", "/api/orders/nope", json!({ "paidAmount": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_bodies_are_400() {
    let app = TestApp::new().await;
    let mut conn = app.state.push.register();

    // Malformed JSON
    let response = app
        .send(
            Request::post("/api/orders")
                .header("content-type", "application/json")
                .body(Body::from("{\"customer\": "))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong type
    let mut body = new_order();
    body["totalAmount"] = json!("a lot");
    let response = app.json("POST", "/api/orders", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Schema violations, all reported
    let response = app
        .json(
            "POST",
            "/api/orders",
            json!({ "customer": "", "items": ["Robe"], "totalAmount": -5 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error["code"], 2);
    assert_eq!(error["details"]["fields"], json!(["customer", "totalAmount"]));

    assert!(conn.try_recv().is_none());
}

#[tokio::test]
async fn upload_then_serve() {
    let app = TestApp::new().await;
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"robe.png\"\r\nContent-Type: image/png\r\n\r\nnot-really-a-png\r\n--{boundary}--\r\n"
    );

    let response = app
        .send(
            Request::post("/api/upload")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let url = body_json(response).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));

    let response = app.get(&url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(body_bytes(response).await, b"not-really-a-png");

    assert_eq!(app.get("/uploads/missing.png").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/uploads/a..b").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_without_image_field_is_400() {
    let app = TestApp::new().await;
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.jpg\"\r\n\r\nabc\r\n--{boundary}--\r\n"
    );
    let response = app
        .send(
            Request::post("/api/upload")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], 5001);
}

#[tokio::test]
async fn upload_storage_failure_is_500_without_leftovers() {
    let app = TestApp::new().await;
    let uploads = app.state.uploads_dir();
    // A regular file where the uploads directory should be
    std::fs::remove_dir_all(&uploads).unwrap();
    std::fs::write(&uploads, b"blocker").unwrap();

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"robe.png\"\r\n\r\nbytes\r\n--{boundary}--\r\n"
    );
    let response = app
        .send(
            Request::post("/api/upload")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await;
    assert_eq!(error["code"], 9003);
    assert_eq!(error["message"], "Storage error");
    assert!(error.get("details").is_none());

    assert!(uploads.is_file());
    assert_eq!(std::fs::read(&uploads).unwrap(), b"blocker");
    let work_dir = uploads.parent().unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(work_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".png"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn csv_export_download() {
    let app = TestApp::new().await;
    app.json("POST", "/api/orders", new_order()).await;

    let response = app.get("/api/export?format=csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert_eq!(disposition, "attachment; filename=\"commandes.csv\"");

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with('\u{FEFF}'));
    let mut lines = text.lines();
    assert!(lines.next().unwrap().contains("Date;Client;Articles"));
    assert!(lines.next().unwrap().contains(";\"Awa Diop\";\"Robe wax | Foulard\";10000;4000;6000;Partielle;"));
}

#[tokio::test]
async fn empty_export_is_404() {
    let app = TestApp::new().await;
    let response = app.get("/api/export?format=json&year=2001&month=2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 6001);

    let response = app.get("/api/export?format=xml").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_connections() {
    let app = TestApp::new().await;
    let _conn = app.state.push.register();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["connections"], 1);
}
