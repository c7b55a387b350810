//! Integration tests for the HTTP exposition endpoint
//!
//! Scrapes a running interface over TCP and drives the handler router
//! in-process with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use prometheus_interface::PrometheusInterface;
use prometheus_interface::config::Config;
use prometheus_interface::handlers::{self, AppState};
use prometheus_interface::registry::{MetricKind, MetricRegistry, Operation};
use std::sync::Arc;
use tower::ServiceExt;

async fn start() -> PrometheusInterface {
    let mut config = Config::with_port(0);
    config.exporter.host = "127.0.0.1".to_string();
    PrometheusInterface::start(&config)
        .await
        .expect("interface should start on an ephemeral port")
}

async fn scrape(interface: &PrometheusInterface) -> String {
    let url = format!("http://{}/metrics", interface.local_addr());
    let response = reqwest::get(&url).await.expect("scrape should succeed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.text().await.expect("body should be text")
}

#[tokio::test]
async fn test_scrape_shows_labelled_series() {
    let interface = start().await;
    interface.add_counter(Some("requests_total"), Some("count"), Some("room;bench"));
    interface.inc_counter(Some("requests_total"), Some("2"), Some("Room_1;Bench_A"));
    interface.inc_counter(Some("requests_total"), Some("3"), Some("Room_1;Bench_A"));

    let body = scrape(&interface).await;
    assert!(body.contains("# HELP requests_total count"), "{body}");
    assert!(body.contains("# TYPE requests_total counter"), "{body}");
    assert!(
        body.contains("requests_total{bench=\"Bench_A\",room=\"Room_1\"} 5")
            || body.contains("requests_total{room=\"Room_1\",bench=\"Bench_A\"} 5"),
        "{body}"
    );

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_scrape_covers_every_kind() {
    let interface = start().await;
    interface.add_gauge(Some("temperature"), Some("temp"), None);
    interface.set_gauge(Some("temperature"), Some("21"), None);
    interface.add_summary(Some("latency"), Some("latency"), None);
    interface.observe_summary(Some("latency"), Some("4"), None);
    interface.add_histogram(Some("duration"), Some("duration"), None);
    interface.observe_histogram(Some("duration"), Some("0.5"), None);
    interface.add_info(Some("build"), Some("build"), None);
    interface.set_info(Some("build"), Some("commit:abcdef"), None);

    let body = scrape(&interface).await;
    assert!(body.contains("temperature 21"), "{body}");
    assert!(body.contains("# TYPE latency summary"), "{body}");
    assert!(body.contains("latency_sum 4"), "{body}");
    assert!(body.contains("latency_count 1"), "{body}");
    assert!(body.contains("# TYPE duration histogram"), "{body}");
    assert!(body.contains("duration_bucket{le=\"+Inf\"} 1"), "{body}");
    assert!(body.contains("build_info{commit=\"abcdef\"} 1"), "{body}");

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_label_less_metric_visible_before_first_update() {
    let interface = start().await;
    interface.add_counter(Some("fresh_total"), Some("fresh"), None);

    let body = scrape(&interface).await;
    assert!(body.contains("fresh_total 0"), "{body}");

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_keyword_calls_are_exposed() {
    let interface = start().await;
    interface.add_gauge(Some("g"), Some("g"), None);
    interface.set_gauge(Some("unknown"), Some("1"), None);

    let body = scrape(&interface).await;
    assert!(
        body.contains("prometheus_interface_keyword_calls_total{keyword=\"add_gauge\",outcome=\"success\"} 1"),
        "{body}"
    );
    assert!(
        body.contains("prometheus_interface_keyword_calls_total{keyword=\"set_gauge\",outcome=\"failure\"} 1"),
        "{body}"
    );

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_shutdown_stops_endpoint() {
    let interface = start().await;
    let addr = interface.local_addr();
    interface.shutdown().await.expect("shutdown");

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_router_health_endpoint() {
    let registry = Arc::new(MetricRegistry::new());
    registry
        .register(MetricKind::Gauge, Some("g"), Some("g"), None)
        .expect("register");
    let app = handlers::router(AppState::new(registry));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["status"], "OK");
    assert_eq!(json["registered_metrics"], 1);
}

#[tokio::test]
async fn test_router_metrics_endpoint() {
    let registry = Arc::new(MetricRegistry::new());
    registry
        .register(MetricKind::Gauge, Some("level"), Some("level"), Some("tank"))
        .expect("register");
    registry
        .mutate(MetricKind::Gauge, Some("level"), Some("T1"), || {
            Ok(Operation::Set(-4))
        })
        .expect("set");
    let app = handlers::router(AppState::new(registry));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = String::from_utf8(body.to_vec()).expect("utf-8");
    assert!(body.contains("level{tank=\"T1\"} -4"), "{body}");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = handlers::router(AppState::new(Arc::new(MetricRegistry::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nope")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
