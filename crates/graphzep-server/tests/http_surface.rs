//! Integration tests over the router built by [`graphzep_server::build_router`],
//! exercising the request/response shapes from spec §6 end-to-end against
//! an in-memory engine.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use graphzep_core::Engine;
use graphzep_server::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> axum::Router {
    let engine = Arc::new(Engine::open_in_memory().unwrap());
    graphzep_server::build_router(AppState::new(engine))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthcheck_returns_ok_status() {
    let response = router().oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn post_messages_accepts_and_persists_episodes() {
    let app = router();
    let payload = json!({
        "group_id": "group-1",
        "messages": [
            {
                "content": "Alice met Bob.",
                "role_type": "user",
                "timestamp": "2024-01-01T00:00:00Z"
            },
            {
                "content": "Alice also met Carol.",
                "role_type": "user",
                "timestamp": "2024-01-01T00:01:00Z"
            }
        ]
    });
    let response = app
        .clone()
        .oneshot(
            Request::post("/messages")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let response = app
        .oneshot(Request::get("/episodes/group-1?last_n=10").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn post_messages_rejects_empty_message_list() {
    let app = router();
    let payload = json!({ "group_id": "group-1", "messages": [] });
    let response = app
        .oneshot(
            Request::post("/messages")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_returns_facts_matching_the_query() {
    let app = router();
    let payload = json!({
        "group_id": "group-1",
        "messages": [{
            "content": "Alice met Bob.",
            "role_type": "user",
            "timestamp": "2024-01-01T00:00:00Z"
        }]
    });
    app.clone()
        .oneshot(
            Request::post("/messages")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::post("/search")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "group_ids": ["group-1"], "query": "", "max_facts": 10 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["facts"].is_array());
}

#[tokio::test]
async fn delete_group_removes_its_episodes() {
    let app = router();
    let payload = json!({
        "group_id": "group-1",
        "messages": [{ "content": "ephemeral", "role_type": "user", "timestamp": "2024-01-01T00:00:00Z" }]
    });
    app.clone()
        .oneshot(
            Request::post("/messages")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app.clone().oneshot(Request::delete("/group/group-1").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(Request::get("/episodes/group-1").body(Body::empty()).unwrap()).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn clear_wipes_every_group() {
    let app = router();
    let payload = json!({
        "group_id": "group-1",
        "messages": [{ "content": "hello", "role_type": "user", "timestamp": "2024-01-01T00:00:00Z" }]
    });
    app.clone()
        .oneshot(
            Request::post("/messages")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app.clone().oneshot(Request::post("/clear").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(Request::get("/episodes/group-1").body(Body::empty()).unwrap()).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}
