//! HTTP-level dispatch tests driven through the router without a listener.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use cx_webhook::webhook::FillState;
use cx_webhook::{
    HandlerResult, ServerConfig, WebhookRequest, WebhookResponse, WebhookServer,
};

mod common;

fn post(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn counting_server(calls: Arc<AtomicUsize>) -> WebhookServer {
    let mut server = WebhookServer::new(ServerConfig::default());
    server.register_handler(
        "/count",
        move |res: &mut WebhookResponse, _req: &WebhookRequest| -> HandlerResult {
            calls.fetch_add(1, Ordering::SeqCst);
            res.add_text_message(["counted"]);
            Ok(())
        },
    );
    server
}

#[tokio::test]
async fn non_post_is_method_not_allowed_before_parsing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = counting_server(calls.clone());
    let app = server.router();

    let request = Request::builder()
        .method("GET")
        .uri("/count")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::ALLOW], "POST");
    assert!(body.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_body_is_bad_request_and_skips_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = counting_server(calls.clone());
    let app = server.router();

    let (status, _, body) = send(&app, post("/count", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut config = ServerConfig::default();
    config.limits.max_body_bytes = 64;
    let mut server = WebhookServer::new(config);
    let counter = calls.clone();
    server.register_handler(
        "/count",
        move |_res: &mut WebhookResponse, _req: &WebhookRequest| -> HandlerResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );
    let app = server.router();

    let body = common::webhook_body("s1", json!({ "padding": "x".repeat(200) }));
    let (status, _, _) = send(&app, post("/count", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_handler_writes_json_reply() {
    let mut server = WebhookServer::new(ServerConfig::default());
    server.register_handler(
        "/hello",
        |res: &mut WebhookResponse, req: &WebhookRequest| -> HandlerResult {
            let mut params = req.session_parameters();
            let color = params.remove("color").ok_or("missing color")?;
            params.insert("color-processed".into(), true.into());
            res.set_session_parameters(params);
            res.add_text_message([format!("The provided color was {}", color)]);
            Ok(())
        },
    );
    let app = server.router();

    let body = common::webhook_body("projects/p/sessions/s1", json!({ "color": "red" }));
    let (status, headers, body) = send(&app, post("/hello", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(headers.contains_key("x-request-id"));

    let reply: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        reply["fulfillmentResponse"]["messages"][0]["text"]["text"][0],
        "The provided color was red"
    );
    assert_eq!(reply["sessionInfo"]["session"], "projects/p/sessions/s1");
    assert_eq!(
        reply["sessionInfo"]["parameters"],
        json!({ "color-processed": true })
    );
}

#[tokio::test]
async fn handler_error_is_internal_error_without_body() {
    let mut server = WebhookServer::new(ServerConfig::default());
    server.register_handler(
        "/fail",
        |res: &mut WebhookResponse, _req: &WebhookRequest| -> HandlerResult {
            res.add_text_message(["never sent"]);
            Err("backend unavailable".into())
        },
    );
    let app = server.router();

    let (status, _, body) = send(&app, post("/fail", common::webhook_body("s1", json!({})))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.is_empty());
}

#[tokio::test]
async fn unregistered_path_is_not_found() {
    let calls = Arc::new(AtomicUsize::new(0));
    let server = counting_server(calls.clone());
    let app = server.router();

    let (status, _, _) = send(&app, post("/other", common::webhook_body("s1", json!({})))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Exact patterns do not match paths below them.
    let (status, _, _) = send(&app, post("/count/more", common::webhook_body("s1", json!({})))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn trailing_slash_pattern_serves_subtree() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut server = WebhookServer::new(ServerConfig::default());
    let counter = calls.clone();
    server.register_handler(
        "/cx/",
        move |_res: &mut WebhookResponse, _req: &WebhookRequest| -> HandlerResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    );
    let app = server.router();

    for path in ["/cx/", "/cx/confirm", "/cx/a/b"] {
        let (status, _, _) = send(&app, post(path, common::webhook_body("s1", json!({})))).await;
        assert_eq!(status, StatusCode::OK, "path {}", path);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn request_id_reaches_handler_context() {
    let seen = Arc::new(Mutex::new(None));
    let mut server = WebhookServer::new(ServerConfig::default());
    let sink = seen.clone();
    server.register_handler(
        "/ctx",
        move |_res: &mut WebhookResponse, req: &WebhookRequest| -> HandlerResult {
            let ctx = req.context();
            *sink.lock().unwrap() = Some((ctx.request_id().to_string(), ctx.is_cancelled()));
            Ok(())
        },
    );
    let app = server.router();

    let mut request = post("/ctx", common::webhook_body("s1", json!({})));
    request
        .headers_mut()
        .insert("x-request-id", "req-123".parse().unwrap());
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "req-123");
    assert_eq!(
        seen.lock().unwrap().clone(),
        Some(("req-123".to_string(), false))
    );
}

#[tokio::test]
async fn payload_is_carried_forward_untouched() {
    let mut server = WebhookServer::new(ServerConfig::default());
    server.register_handler(
        "/noop",
        |_res: &mut WebhookResponse, _req: &WebhookRequest| -> HandlerResult { Ok(()) },
    );
    let app = server.router();

    let body = json!({
        "sessionInfo": { "session": "s1" },
        "payload": { "a": 1 },
    })
    .to_string();
    let (status, _, body) = send(&app, post("/noop", body)).await;

    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply["payload"], json!({ "a": 1 }));
}

#[tokio::test]
async fn handlers_see_form_slots_through_public_types() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut server = WebhookServer::new(ServerConfig::default());
    server.register_handler(
        "/form",
        move |_res: &mut WebhookResponse, req: &WebhookRequest| -> HandlerResult {
            let slots = req
                .form_parameter_infos()
                .into_iter()
                .map(|slot| (slot.display_name, slot.fill_state))
                .collect::<Vec<_>>();
            *sink.lock().unwrap() = slots;
            Ok(())
        },
    );
    let app = server.router();

    let body = json!({
        "pageInfo": { "formInfo": { "parameterInfo": [
            { "displayName": "size", "state": "FILLED", "value": "large" },
            { "displayName": "color", "state": "EMPTY" },
        ]}},
    })
    .to_string();
    let (status, _, _) = send(&app, post("/form", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        seen.lock().unwrap().clone(),
        vec![
            ("size".to_string(), FillState::Filled),
            ("color".to_string(), FillState::Empty),
        ]
    );
}
