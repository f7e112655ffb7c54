use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mcq_practice_backend::{
    error::Result,
    models::question::Question,
    routes,
    services::{buffer_service::BufferSettings, generator::QuestionGenerator},
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

struct NoQuestions;

#[async_trait]
impl QuestionGenerator for NoQuestions {
    async fn generate(&self, _topic: &str) -> Result<Vec<Question>> {
        Ok(Vec::new())
    }
}

fn setup_app() -> (Router, std::path::PathBuf) {
    let data_dir = std::env::temp_dir().join(format!("mcq-attempts-api-{}", uuid::Uuid::new_v4()));
    let state = AppState::with_generator(Arc::new(NoQuestions), BufferSettings::default(), &data_dir);
    (routes::app(state), data_dir)
}

fn attempt_body(subject: &str, selected: usize) -> JsonValue {
    json!({
        "question": "Which layer of the OSI model handles routing?",
        "options": ["Physical", "Data Link", "Network", "Transport"],
        "selected_option": selected,
        "correct_option": 2,
        "explanation": "Routing is done at the Network layer.",
        "subject": subject,
        "result": "ignored by the server"
    })
}

async fn post_attempt(app: &Router, body: JsonValue) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri("/save-attempt")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
}

#[tokio::test]
async fn save_attempt_records_result() {
    let (app, data_dir) = setup_app();

    let (status, body) = post_attempt(&app, attempt_body("Computer Networks", 2)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "saved");
    assert_eq!(body["result"], "Correct");

    let (status, body) = post_attempt(&app, attempt_body("Computer Networks", 0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Wrong");

    let stored = tokio::fs::read_to_string(data_dir.join("attempts.json")).await.unwrap();
    let stored: JsonValue = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 2);

    let _ = tokio::fs::remove_dir_all(data_dir).await;
}

#[tokio::test]
async fn save_attempt_rejects_invalid_payload() {
    let (app, _data_dir) = setup_app();
    let mut body = attempt_body("DBMS", 1);
    body["options"] = json!(["only", "three", "options"]);

    let (status, body) = post_attempt(&app, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn reports_download_as_xlsx() {
    let (app, data_dir) = setup_app();
    post_attempt(&app, attempt_body("Computer Networks", 2)).await;
    post_attempt(&app, attempt_body("DBMS", 1)).await;

    for uri in ["/download-report", "/download-report/DBMS", "/download-report/Digital%20Logic"] {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"practice_"));
        let bytes = to_bytes(resp.into_body(), 10 * 1024 * 1024).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    let _ = tokio::fs::remove_dir_all(data_dir).await;
}
