//! HTTP API tests
//!
//! Exercise the router with `oneshot` requests against in-memory collaborators.

mod helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use genwiki_locator::{build_router, AppState};
use helpers::*;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(world: &World) -> Router {
    build_router(AppState::new(Arc::new(world.locator())))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let world = World::weimar();

    let (status, body) = get(test_app(&world), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "genwiki-locator");
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_locate_returns_ranked_evidence() {
    let world = World::weimar();

    let (status, body) = get(test_app(&world), &format!("/locate/{}", WEIMAR_GOV_ID)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gov_id"], WEIMAR_GOV_ID);
    assert_eq!(body["ranked"], true);
    assert_eq!(body["evidence"], serde_json::json!({"geonames:2812482": "Q3955"}));
}

#[tokio::test]
async fn test_locate_raw_keeps_nulls_in_order() {
    let world = World::weimar();

    let (status, body) = get(
        test_app(&world),
        &format!("/locate/{}?ranked=false", WEIMAR_GOV_ID),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body["evidence"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys.len(), 4);
    assert_eq!(body["evidence"]["NUTS2003:DEG05"], Value::Null);
}

#[tokio::test]
async fn test_conflict_maps_to_409_and_is_reported_by_health() {
    let world = World::weimar();
    world.knowledge_base.reference("DEG05", &["Q3955", "Q7070"]);
    let app = test_app(&world);

    let (status, body) = get(app.clone(), &format!("/locate/{}", WEIMAR_GOV_ID)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICTING_EVIDENCE");

    let (_, health) = get(app, "/health").await;
    assert!(health["last_error"].as_str().unwrap().contains("NUTS2003:DEG05"));
}

#[tokio::test]
async fn test_gazetteer_failure_maps_to_502() {
    let world = World::weimar();
    *world.gazetteer.broken.lock().unwrap() = true;

    let (status, body) = get(test_app(&world), &format!("/locate/{}", WEIMAR_GOV_ID)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_path_for_item() {
    let world = World::weimar();

    let (status, body) = get(test_app(&world), "/path/Q3955").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"], "Q3955");
    assert_eq!(body["path"], "DE/TH/Weimar");
}

#[tokio::test]
async fn test_path_rejects_non_item_ids() {
    let world = World::weimar();

    let (status, body) = get(test_app(&world), "/path/Weimar").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_resolve_with_materialization() {
    let world = World::weimar();

    let (status, body) = get(
        test_app(&world),
        &format!("/resolve/{}?materialize=missing", WEIMAR_GOV_ID),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"], "Q3955");
    assert_eq!(body["path"], "DE/TH/Weimar");
    assert_eq!(body["materialized"].as_array().unwrap().len(), 3);
    assert!(world.store.page("DE/TH/Weimar").is_some());
}

#[tokio::test]
async fn test_resolve_defaults_to_no_materialization() {
    let world = World::weimar();

    let (status, body) = get(test_app(&world), &format!("/resolve/{}", WEIMAR_GOV_ID)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["materialized"].as_array().unwrap().is_empty());
    assert_eq!(world.store.write_count(), 0);
}

#[tokio::test]
async fn test_parts_requires_items() {
    let world = World::weimar();

    let (status, _) = get(test_app(&world), "/parts?items=").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
