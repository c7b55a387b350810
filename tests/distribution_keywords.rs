//! Integration tests for summary and histogram keywords

use prometheus_interface::PrometheusInterface;
use prometheus_interface::config::Config;
use prometheus_interface::registry::{MetricKind, Reading, SummarySnapshot};

async fn start() -> PrometheusInterface {
    let mut config = Config::with_port(0);
    config.exporter.host = "127.0.0.1".to_string();
    PrometheusInterface::start(&config)
        .await
        .expect("interface should start on an ephemeral port")
}

fn snapshot(
    interface: &PrometheusInterface,
    kind: MetricKind,
    name: &str,
    labels: Option<&str>,
) -> SummarySnapshot {
    match interface
        .read_value(kind, Some(name), labels)
        .expect("distribution should be readable")
    {
        Reading::Distribution(s) => s,
        other => panic!("unexpected reading: {other:?}"),
    }
}

#[tokio::test]
async fn test_summary_accumulates_count_and_sum() {
    let interface = start().await;
    let added = interface.add_summary(Some("latency"), Some("latency"), Some("bench"));
    assert_eq!(added.message, "summary 'latency' added with labels: 'bench'");

    let first = interface.observe_summary(Some("latency"), Some("1.5"), Some("A"));
    assert!(first.success, "{}", first.message);
    assert_eq!(
        first.message,
        "summary 'latency' observed value '1.5' with labels: 'A'"
    );
    interface.observe_summary(Some("latency"), Some("2"), Some("A"));

    assert_eq!(
        snapshot(&interface, MetricKind::Summary, "latency", Some("A")),
        SummarySnapshot { count: 2, sum: 3.5 }
    );

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_histogram_accumulates_count_and_sum() {
    let interface = start().await;
    interface.add_histogram(Some("duration"), Some("duration"), None);

    for value in ["0.25", "1", "3"] {
        let result = interface.observe_histogram(Some("duration"), Some(value), None);
        assert!(result.success, "{}", result.message);
    }

    assert_eq!(
        snapshot(&interface, MetricKind::Histogram, "duration", None),
        SummarySnapshot {
            count: 3,
            sum: 4.25
        }
    );

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_observation_requires_numeric_value() {
    let interface = start().await;
    interface.add_summary(Some("s"), Some("s"), None);
    interface.add_histogram(Some("h"), Some("h"), None);

    let missing = interface.observe_summary(Some("s"), None, None);
    assert_eq!(missing.message, "parameter 'value' not defined");

    let not_a_number = interface.observe_summary(Some("s"), Some("abc"), None);
    assert!(!not_a_number.success);
    assert_eq!(
        not_a_number.message,
        "value 'abc' cannot be converted to a finite number"
    );
    assert_eq!(
        snapshot(&interface, MetricKind::Summary, "s", None),
        SummarySnapshot::default()
    );

    let bad = interface.observe_histogram(Some("h"), Some("fast"), None);
    assert!(!bad.success);
    assert!(bad.message.contains("'fast'"), "{}", bad.message);

    let infinite = interface.observe_histogram(Some("h"), Some("inf"), None);
    assert!(!infinite.success);

    assert_eq!(
        snapshot(&interface, MetricKind::Histogram, "h", None),
        SummarySnapshot::default()
    );

    interface.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_summary_and_histogram_names_are_distinct_per_kind() {
    let interface = start().await;
    interface.add_summary(Some("shared"), Some("s"), None);

    let unknown = interface.observe_histogram(Some("shared"), Some("1"), None);
    assert_eq!(unknown.message, "histogram 'shared' not defined");

    // The client registry refuses a second family with the same name
    let clash = interface.add_histogram(Some("shared"), Some("h"), None);
    assert!(!clash.success);

    interface.shutdown().await.expect("shutdown");
}
