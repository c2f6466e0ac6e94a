// tests/webhook_invalidator.rs
//
// The revalidation webhook against a local listener: request shape, bearer
// auth and status handling.

use std::sync::{Arc, Mutex};

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use patchnote_ingest::cache::{CacheInvalidator, WebhookInvalidator, LATEST_VIEW_PATH};
use serde_json::{json, Value};

#[derive(Clone)]
struct Recorder {
    status: StatusCode,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn revalidate(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    rec.seen.lock().expect("recorder poisoned").push((auth, body));
    rec.status
}

/// Serve the recorder on an ephemeral port; returns the webhook URL.
async fn serve(rec: Recorder) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/api/revalidate", post(revalidate))
        .with_state(rec);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/revalidate")
}

fn recorder(status: StatusCode) -> Recorder {
    Recorder {
        status,
        seen: Arc::new(Mutex::new(Vec::new())),
    }
}

#[tokio::test]
async fn posts_paths_with_bearer_token() {
    let rec = recorder(StatusCode::OK);
    let url = serve(rec.clone()).await;
    let hook = WebhookInvalidator::new(url, Some("tok".into()));

    hook.invalidate(&[LATEST_VIEW_PATH]).await.unwrap();

    let seen = rec.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("Bearer tok"));
    assert_eq!(seen[0].1, json!({ "paths": ["/"] }));
}

#[tokio::test]
async fn no_token_sends_no_authorization_header() {
    let rec = recorder(StatusCode::NO_CONTENT);
    let url = serve(rec.clone()).await;
    let hook = WebhookInvalidator::new(url, None);

    hook.invalidate(&["/", "/patchnotes"]).await.unwrap();

    let seen = rec.seen.lock().unwrap();
    assert_eq!(seen[0].0, None);
    assert_eq!(seen[0].1, json!({ "paths": ["/", "/patchnotes"] }));
}

#[tokio::test]
async fn non_2xx_is_an_error() {
    let rec = recorder(StatusCode::INTERNAL_SERVER_ERROR);
    let url = serve(rec.clone()).await;
    let hook = WebhookInvalidator::new(url, Some("tok".into()));

    let err = hook.invalidate(&[LATEST_VIEW_PATH]).await.unwrap_err();
    assert!(format!("{err:#}").contains("revalidate non-2xx"), "{err:#}");
    assert_eq!(rec.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let hook = WebhookInvalidator::new(format!("http://{addr}/api/revalidate"), None);

    assert!(hook.invalidate(&[LATEST_VIEW_PATH]).await.is_err());
}
