//! End-to-end tests driving the full router in process.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use carecompare::{
    catalog::{Catalog, PriceSource},
    config::{CatalogConfig, Config, MetricsConfig, ServerConfig},
    handlers::AppState,
    server,
    session::SessionStore,
};

fn test_app() -> Router {
    router_for(test_state())
}

fn router_for(app_state: AppState) -> Router {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    server::create_router(app_state, Arc::new(recorder.handle()))
}

fn test_state() -> AppState {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        },
        catalog: CatalogConfig {
            city: "Surat".to_string(),
            data_file: None,
        },
        metrics: MetricsConfig {
            enabled: true,
            endpoint: "/metrics".to_string(),
        },
    };

    AppState {
        catalog: Arc::new(PriceSource::Builtin(Catalog::builtin(&config.catalog.city))),
        sessions: Arc::new(SessionStore::new()),
        config: Arc::new(config),
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = test_app();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "carecompare");

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_hospitals_lookup_filters_by_test() {
    let app = test_app();

    let (status, body) = get(&app, "/api/hospitals?test=thyroid%20panel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Surat");
    assert_eq!(body["test"], "thyroid panel");
    assert_eq!(body["total"], 4);

    // Each hospital is annotated with its own table price for the test.
    for hospital in body["hospitals"].as_array().unwrap() {
        assert_eq!(hospital["price"], hospital["tests"]["thyroid panel"]);
    }
}

#[tokio::test]
async fn test_hospitals_lookup_without_test_returns_directory() {
    let app = test_app();

    let (status, body) = get(&app, "/api/hospitals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["test"], Value::Null);
    assert_eq!(body["total"], 4);
    assert!(body["hospitals"][0].get("price").is_none());
}

#[tokio::test]
async fn test_compare_is_sorted_and_scored() {
    let app = test_app();

    let (status, body) = get(&app, "/api/compare?test=thyroid%20panel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["committed"], true);

    let results = body["results"].as_array().unwrap();
    let scores: Vec<u64> = results
        .iter()
        .map(|r| r["overallScore"].as_u64().unwrap())
        .collect();
    let mut sorted = scores.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(scores, sorted, "results must be sorted descending by score");

    for result in results {
        let base = result["basePrice"].as_u64().unwrap();
        let oop = result["outOfPocket"].as_u64().unwrap();
        let savings = result["savings"].as_u64().unwrap();
        assert!(oop <= base);
        assert_eq!(savings, base - oop);
        assert!(result["overallScore"].as_u64().unwrap() <= 100);
    }

    let summary = &body["summary"];
    assert_eq!(summary["bestScore"], scores[0]);
}

#[tokio::test]
async fn test_compare_unknown_test_is_empty_result_set() {
    let app = test_app();

    let (status, body) = get(&app, "/api/compare?test=mri%20scan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert!(body["results"].as_array().unwrap().is_empty());
    assert!(body.get("summary").is_none());
}

#[tokio::test]
async fn test_compare_without_test_is_bad_request() {
    let app = test_app();

    let (status, body) = get(&app, "/api/compare").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request");
}

#[tokio::test]
async fn test_compare_session_roundtrip() {
    let app = test_app();

    let (_, first) = get(&app, "/api/compare?test=lipid%20profile").await;
    let session = first["session"].as_str().unwrap().to_string();
    assert_eq!(first["seq"], 1);

    // Second search on the same session bumps the sequence number.
    let uri = format!("/api/compare?test=thyroid%20panel&session={}", session);
    let (_, second) = get(&app, &uri).await;
    assert_eq!(second["session"], session.as_str());
    assert_eq!(second["seq"], 2);

    // The session endpoint reports the latest committed search.
    let (status, state) = get(&app, &format!("/api/session/{}", session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["seq"], 2);
    assert_eq!(state["phase"], "loaded");
    assert_eq!(state["test"], "thyroid panel");
}

#[tokio::test]
async fn test_session_unknown_id_is_404() {
    let app = test_app();

    let (status, body) = get(
        &app,
        "/api/session/00000000-0000-0000-0000-000000000000",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "session_not_found");
}

#[tokio::test]
async fn test_risk_assessment_high() {
    let app = test_app();

    let (status, body) = post_json(
        &app,
        "/api/risk-assessment",
        json!({
            "age": 50,
            "bmi": 31,
            "fastingSugar": 130,
            "postMealSugar": 210,
            "familyHistory": true,
            "physicalActivity": "low"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["riskLevel"], "High");
    assert_eq!(body["riskScore"], 17);
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 4);
    assert!(body["message"].as_str().unwrap().contains("not a medical diagnosis"));
}

#[tokio::test]
async fn test_risk_assessment_missing_field_is_400() {
    let app = test_app();

    let (status, body) = post_json(
        &app,
        "/api/risk-assessment",
        json!({
            "age": 50,
            "bmi": 31,
            "fastingSugar": 130
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Missing required health parameters"));
}

#[tokio::test]
async fn test_risk_assessment_rejects_get() {
    let app = test_app();

    let (status, _) = get(&app, "/api/risk-assessment").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_recommendations_get_and_post() {
    let app = test_app();

    let (status, body) = get(&app, "/api/recommendations?age=45&focus=diabetes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"], "rule-based");

    let tests: Vec<&str> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["test"].as_str().unwrap())
        .collect();
    assert!(tests.contains(&"Lipid Profile"));
    assert!(tests.contains(&"HbA1c Test"));
    assert!(tests.contains(&"Kidney Function Test"));

    let (status, body) = post_json(
        &app,
        "/api/recommendations",
        json!({"focus": "thyroid"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["test"], "Thyroid Panel");
    assert_eq!(recs[0]["priority"], "high");
    assert_eq!(recs[0]["price"], 880);
    assert!(recs[0]["reason"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_compare_surfaces_lost_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hospitals.json");
    let json = serde_json::to_string(Catalog::builtin("Surat").hospitals()).unwrap();
    std::fs::write(&path, json).unwrap();

    let mut app_state = test_state();
    app_state.catalog = Arc::new(PriceSource::File {
        city: "Surat".to_string(),
        path: path.clone(),
    });
    let app = router_for(app_state);

    let (status, body) = get(&app, "/api/compare?test=thyroid%20panel").await;
    assert_eq!(status, StatusCode::OK);
    let session = body["session"].as_str().unwrap().to_string();

    std::fs::remove_file(&path).unwrap();

    let (status, body) = get(
        &app,
        &format!("/api/compare?test=thyroid%20panel&session={}", session),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "catalog_unavailable");

    // The failure is committed to the session, not swallowed.
    let (status, body) = get(&app, &format!("/api/session/{}", session)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "failed");
    assert_eq!(body["seq"], 2);
}
