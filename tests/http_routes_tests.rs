use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use bci_bridge::server::{ServerState, build_router};
use bci_bridge::CommandQueue;
use tower::ServiceExt;

fn app(queue: &CommandQueue) -> axum::Router {
    build_router(ServerState::new(queue.clone(), 8080))
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: String,
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: &str) -> Reply {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("response expected");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");

    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
    }
}

fn assert_cors(reply: &Reply) {
    assert_eq!(
        reply.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*",
        "missing allow-origin"
    );
    let methods = reply.headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .to_ascii_uppercase();
    for method in ["GET", "POST", "OPTIONS"] {
        assert!(methods.contains(method), "{} not allowed in {}", method, methods);
    }
    let allowed = reply.headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("content-type"));
}

#[tokio::test]
async fn ping_returns_pong() {
    let queue = CommandQueue::new();
    let reply = send(&app(&queue), Method::GET, "/ping", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "pong");
    assert_cors(&reply);
}

#[tokio::test]
async fn status_reports_running() {
    let queue = CommandQueue::new();
    let reply = send(&app(&queue), Method::GET, "/status", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "Unity BCI Server Running");
    assert!(
        reply.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

#[tokio::test]
async fn health_is_json_with_port() {
    let queue = CommandQueue::new();
    let reply = send(&app(&queue), Method::GET, "/health", "").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        reply.body,
        r#"{"status":"ok","server":"Unity BCI Server","port":8080}"#
    );
    assert_cors(&reply);
}

#[tokio::test]
async fn unknown_path_is_404() {
    let queue = CommandQueue::new();
    let reply = send(&app(&queue), Method::GET, "/unknown", "").await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "404 - Not Found");
    assert_cors(&reply);
}

#[tokio::test]
async fn wrong_method_is_404() {
    let queue = CommandQueue::new();
    let app = app(&queue);

    let reply = send(&app, Method::GET, "/command", "").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body, "404 - Not Found");

    let reply = send(&app, Method::DELETE, "/ping", "").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn options_is_empty_200_on_any_path() {
    let queue = CommandQueue::new();
    let app = app(&queue);

    for path in ["/command", "/anything/else"] {
        let reply = send(&app, Method::OPTIONS, path, "").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.is_empty());
        assert_cors(&reply);
    }
    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn post_command_enqueues_record() {
    let queue = CommandQueue::new();
    let reply = send(
        &app(&queue),
        Method::POST,
        "/command",
        r#"{"command":"left","strength":0.8,"timestamp":123}"#,
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "Command queued");
    assert_cors(&reply);

    let drained = queue.drain().unwrap();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].command(), "left");
    assert_eq!(drained[0].strength(), 0.8);
    assert_eq!(drained[0].timestamp(), 123);
}

#[tokio::test]
async fn malformed_command_is_400_and_not_queued() {
    let queue = CommandQueue::new();
    let app = app(&queue);

    for body in [
        "{not json",
        r#"{"strength":0.8}"#,
        r#"{"command":"","strength":0.8}"#,
    ] {
        let reply = send(&app, Method::POST, "/command", body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "body: {}", body);
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert!(json["error"].is_string());
        assert_cors(&reply);
    }

    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn commands_keep_arrival_order() {
    let queue = CommandQueue::new();
    let app = app(&queue);

    for label in ["left", "right", "push", "pull", "lift"] {
        let body = format!(r#"{{"command":"{}","strength":0.5,"timestamp":0}}"#, label);
        let reply = send(&app, Method::POST, "/command", &body).await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    let labels: Vec<String> = queue
        .drain()
        .unwrap()
        .iter()
        .map(|record| record.command().to_string())
        .collect();
    assert_eq!(labels, vec!["left", "right", "push", "pull", "lift"]);
}
