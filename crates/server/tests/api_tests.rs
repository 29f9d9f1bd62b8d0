//! Integration tests for the inference API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use quality_server::{
    api::{create_router, AppState},
    config::ServiceConfig,
};
use serde_json::{json, Value};
use server_lib::{health::components, observability::StructuredLogger};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const DATASET: &str = "\
drcPercentage,moistureContent,impurities,colorScore,qualityGrade
65.5,0.5,0.3,9.0,A
50.0,2.0,1.5,6.0,B
35.0,5.0,4.0,3.0,C
";

struct TestApp {
    app: Router,
    state: Arc<AppState>,
    _dir: TempDir,
}

/// What to put into the temporary model store
struct Fixture {
    scaler: bool,
    metrics: bool,
    dataset: bool,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            scaler: true,
            metrics: true,
            dataset: true,
        }
    }
}

fn write_json(path: &Path, value: Value) {
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// KNN fit in standardized space, one cluster per grade
fn knn_artifact() -> Value {
    json!({
        "algorithm": "knn",
        "classes": ["A", "B", "C"],
        "k": 3,
        "points": [
            [1.0, -1.0, -1.0, 1.0], [1.1, -0.9, -1.0, 1.0], [0.9, -1.1, -0.9, 1.1],
            [0.0, 0.0, 0.0, 0.0], [0.1, 0.0, 0.1, 0.0], [0.0, 0.1, 0.0, -0.1],
            [-1.0, 1.0, 1.0, -1.0], [-1.1, 1.0, 0.9, -1.0], [-0.9, 1.1, 1.0, -0.9]
        ],
        "labels": ["A", "A", "A", "B", "B", "B", "C", "C", "C"]
    })
}

/// Tree over raw features: drcPercentage, then impurities
fn tree_artifact() -> Value {
    json!({
        "algorithm": "tree",
        "classes": ["A", "B", "C"],
        "nodes": [
            {"feature": 0, "threshold": 60.0, "left": 1, "right": 2},
            {"value": [0.0, 2.0, 8.0]},
            {"feature": 2, "threshold": 1.0, "left": 3, "right": 4},
            {"value": [9.0, 1.0, 0.0]},
            {"value": [1.0, 6.0, 3.0]}
        ]
    })
}

async fn setup(fixture: Fixture) -> TestApp {
    let dir = TempDir::new().unwrap();
    let model_dir = dir.path().join("models");
    fs::create_dir(&model_dir).unwrap();

    write_json(&model_dir.join("knn_model.json"), knn_artifact());
    write_json(&model_dir.join("tree_model.json"), tree_artifact());
    if fixture.scaler {
        write_json(
            &model_dir.join("scaler.json"),
            json!({"mean": [50.0, 2.5, 2.0, 6.0], "scale": [10.0, 1.5, 1.5, 2.0]}),
        );
    }
    if fixture.metrics {
        write_json(
            &model_dir.join("model_metrics.json"),
            json!({
                "knn": {"accuracy": 0.91, "precision": 0.9, "recall": 0.89, "f1_score": 0.895},
                "tree": {"accuracy": 0.87, "precision": 0.86, "recall": 0.85, "f1_score": 0.855}
            }),
        );
    }
    let dataset_path = dir.path().join("dataset.csv");
    if fixture.dataset {
        fs::write(&dataset_path, DATASET).unwrap();
    }

    let config = ServiceConfig {
        metrics_file: model_dir.join("model_metrics.json"),
        model_dir,
        dataset_path,
        ..ServiceConfig::default()
    };
    let logger = StructuredLogger::new("quality-api-test");
    let state = quality_server::initialize(&config, &logger).await.unwrap();

    TestApp {
        app: create_router(state.clone()),
        state,
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_predict(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn sample() -> Value {
    json!({
        "drcPercentage": 65.5,
        "moistureContent": 0.5,
        "impurities": 0.3,
        "colorScore": 9.0
    })
}

#[tokio::test]
async fn test_models_lists_loaded_models_and_features() {
    let test = setup(Fixture::default()).await;

    let (status, body) = send(&test.app, get("/models")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"], json!(["knn", "tree"]));
    assert_eq!(
        body["features"],
        json!(["drcPercentage", "moistureContent", "impurities", "colorScore"])
    );
}

#[tokio::test]
async fn test_predict_with_scaled_and_unscaled_models() {
    let test = setup(Fixture::default()).await;

    for model in ["knn", "tree"] {
        let (status, body) = send(
            &test.app,
            post_predict(json!({"features": sample(), "model": model})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], model);
        assert_eq!(body["prediction"], "A");

        let proba = body["proba"].as_object().unwrap();
        let total: f64 = proba.values().map(|p| p.as_f64().unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(proba.keys().all(|k| ["A", "B", "C"].contains(&k.as_str())));
    }
}

#[tokio::test]
async fn test_predict_defaults_to_knn() {
    let test = setup(Fixture::default()).await;

    let (status, body) = send(&test.app, post_predict(json!({"features": sample()}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "knn");
}

#[tokio::test]
async fn test_predict_accepts_numeric_strings() {
    let test = setup(Fixture::default()).await;
    let mut features = sample();
    features["drcPercentage"] = json!("65.5");

    let (status, body) = send(
        &test.app,
        post_predict(json!({"features": features, "model": "tree"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "A");
}

#[tokio::test]
async fn test_predict_out_of_range_never_reaches_router() {
    let test = setup(Fixture::default()).await;
    let mut features = sample();
    features["drcPercentage"] = json!(150);

    let (status, body) = send(&test.app, post_predict(json!({"features": features}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["reason"], "validation_error");
    assert_eq!(body["status"], 422);
    assert_eq!(
        body["details"],
        json!([{"field": "drcPercentage", "kind": "out_of_range"}])
    );
    assert_eq!(test.state.router.stats().total_predictions, 0);
}

#[tokio::test]
async fn test_predict_reports_every_invalid_feature() {
    let test = setup(Fixture::default()).await;

    let (status, body) = send(
        &test.app,
        post_predict(json!({
            "features": {"drcPercentage": 60, "moistureContent": "wet", "colorScore": -1}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["details"],
        json!([
            {"field": "moistureContent", "kind": "non_numeric"},
            {"field": "impurities", "kind": "missing"},
            {"field": "colorScore", "kind": "out_of_range"}
        ])
    );
}

#[tokio::test]
async fn test_predict_unloaded_model_is_client_error() {
    let test = setup(Fixture::default()).await;

    for model in ["svm", "random_forest"] {
        let (status, body) = send(
            &test.app,
            post_predict(json!({"features": sample(), "model": model})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["reason"], "model_not_found");
        assert!(body["error"].as_str().unwrap().contains(model));
    }
}

fn post_raw(body: &str, content_type: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/predict");
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_undecodable_requests_have_error_body() {
    let test = setup(Fixture::default()).await;
    let json = Some("application/json");

    let cases = [
        ("truncated json", post_raw("{\"features\":", json)),
        (
            "features not an object",
            post_raw(r#"{"features": "65.5,0.5,0.3,9.0"}"#, json),
        ),
        (
            "numeric model",
            post_predict(json!({"features": sample(), "model": 3})),
        ),
        (
            "null model",
            post_predict(json!({"features": sample(), "model": null})),
        ),
        ("missing content type", post_raw(&json!({"features": sample()}).to_string(), None)),
        ("non-integer n", get("/sample-stream?n=abc")),
    ];

    for (case, request) in cases {
        let (status, body) = send(&test.app, request).await;

        assert!(status.is_client_error(), "{}: got {}", case, status);
        assert_eq!(body["reason"], "invalid_request", "{}: {}", case, body);
        assert_eq!(body["status"], status.as_u16(), "{}", case);
        assert!(!body["error"].as_str().unwrap().is_empty(), "{}", case);
    }
    assert_eq!(test.state.router.stats().total_predictions, 0);
}

#[tokio::test]
async fn test_sample_stream_clamps_rows() {
    let test = setup(Fixture::default()).await;

    for (uri, expected) in [
        ("/sample-stream", 3),
        ("/sample-stream?n=2", 2),
        ("/sample-stream?n=100", 3),
        ("/sample-stream?n=0", 1),
        ("/sample-stream?n=-4", 1),
    ] {
        let (status, body) = send(&test.app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["items"].as_array().unwrap().len(), expected, "{uri}");
    }
}

#[tokio::test]
async fn test_sample_stream_labels_every_row_with_every_model() {
    let test = setup(Fixture::default()).await;

    let (_, body) = send(&test.app, get("/sample-stream?n=3")).await;
    let items = body["items"].as_array().unwrap();

    assert_eq!(items[0]["features"], sample());
    for item in items {
        let pred = item["pred"].as_object().unwrap();
        assert_eq!(pred.keys().collect::<Vec<_>>(), vec!["knn", "tree"]);
    }
    assert_eq!(items[0]["pred"]["knn"], "A");
    assert_eq!(items[2]["pred"]["knn"], "C");
}

#[tokio::test]
async fn test_sample_stream_without_dataset_is_server_error() {
    let test = setup(Fixture {
        dataset: false,
        ..Fixture::default()
    })
    .await;

    let (status, body) = send(&test.app, get("/sample-stream?n=5")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["reason"], "dataset_unavailable");
}

#[tokio::test]
async fn test_metrics_returns_file_content() {
    let test = setup(Fixture::default()).await;

    let (status, body) = send(&test.app, get("/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["knn"]["accuracy"], 0.91);
    assert_eq!(body["tree"]["f1_score"], 0.855);
}

#[tokio::test]
async fn test_metrics_missing_is_not_found() {
    let test = setup(Fixture {
        metrics: false,
        ..Fixture::default()
    })
    .await;

    let (status, body) = send(&test.app, get("/metrics")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["reason"], "metrics_unavailable");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_healthz_reports_components() {
    let test = setup(Fixture::default()).await;

    let (status, body) = send(&test.app, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    for component in [components::REGISTRY, components::METRICS_STORE, components::DATASET] {
        assert_eq!(body["components"][component]["status"], "healthy");
    }
}

#[tokio::test]
async fn test_healthz_degraded_without_scaler() {
    let test = setup(Fixture {
        scaler: false,
        ..Fixture::default()
    })
    .await;

    let (status, body) = send(&test.app, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["registry"]["status"], "degraded");

    // Still serves, with raw features
    let (status, _) = send(&test.app, post_predict(json!({"features": sample()}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let test = setup(Fixture::default()).await;
    test.state
        .health_registry
        .set_unhealthy(components::REGISTRY, "Failed")
        .await;

    let (status, body) = send(&test.app, get("/healthz")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_startup() {
    let test = setup(Fixture::default()).await;

    let (status, body) = send(&test.app, get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    test.state.health_registry.set_ready(true).await;
    let (status, body) = send(&test.app, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_prometheus_endpoint() {
    let test = setup(Fixture::default()).await;
    send(&test.app, post_predict(json!({"features": sample()}))).await;

    let response = test
        .app
        .clone()
        .oneshot(get("/internal/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("quality_api_predictions_total"));
    assert!(metrics_text.contains("quality_api_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("quality_api_models_loaded"));
}

#[tokio::test]
async fn test_startup_fails_without_models() {
    let dir = TempDir::new().unwrap();
    let config = ServiceConfig {
        model_dir: dir.path().to_path_buf(),
        ..ServiceConfig::default()
    };

    let err = quality_server::initialize(&config, &StructuredLogger::new("test"))
        .await
        .err()
        .unwrap();

    assert!(format!("{:#}", err).contains("no models found"));
}
