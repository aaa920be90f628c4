//! HTTP surface driven through the router with the fixture source.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use flowscan::dashboard::{build_router, AppState, DashboardState, ScanResponse};
use flowscan::data::fixture::FixtureSource;
use flowscan::engine::scanner::Scanner;

fn make_state() -> AppState {
    let source =
        FixtureSource::load(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/snapshots.json"))
            .expect("fixture file should load");
    Arc::new(DashboardState::new(Scanner::default(), Arc::new(source), 20))
}

async fn read_scan(resp: axum::response::Response) -> ScanResponse {
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_source_scan_then_last_scan() {
    let state = make_state();

    let resp = build_router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/scan/swing?limit=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let scan = read_scan(resp).await;
    assert_eq!(scan.count, 3);
    assert_eq!(scan.results.len(), 3);

    let resp = build_router(state)
        .oneshot(Request::builder().uri("/api/last-scan").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let last = read_scan(resp).await;
    assert_eq!(last.scan_id, scan.scan_id);
}

#[tokio::test]
async fn test_unknown_mode_in_path_is_bad_request() {
    let resp = build_router(make_state())
        .oneshot(Request::builder().uri("/api/scan/weekly").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_breakdown_total_matches_scan() {
    let body = serde_json::json!({
        "mode": "intraday",
        "scores": {"tank": 70.0, "rad": 40.0, "mp_lp": 55.0, "osv": 80.0, "liquidity": 100.0}
    });
    let resp = build_router(make_state())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/breakdown")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    // 21 + 6 + 11 + 20 + 10
    assert_eq!(json["total"], 68);
    assert_eq!(json["components"].as_array().unwrap().len(), 5);
}
