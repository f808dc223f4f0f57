//! End-to-end lookup tests against a mock JMA server.
//!
//! `.expect(n)` on each mock counts network calls; wiremock verifies the
//! counts when the server is dropped.

use jma_wx::cache::ForecastCache;
use jma_wx::config::Config;
use jma_wx::lookup::{DisplayText, Lookup, Origin, PROMPT_TEXT, UNAVAILABLE_TEXT};
use jma_wx::weather::{self, JmaClient};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tokyo_forecast() -> serde_json::Value {
    serde_json::json!([{
        "publishingOffice": "Tokyo Office",
        "timeSeries": [{"areas": [{"weathers": ["Sunny"]}]}]
    }])
}

async fn mount_regions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/area.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "offices": {"130000": {"name": "Tokyo"}}
        })))
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, body: serde_json::Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/130000.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_select_tokyo_and_fetch() {
    let server = MockServer::start().await;
    mount_regions(&server).await;
    mount_forecast(&server, tokyo_forecast(), 1).await;

    let config = Config::with_base_url(&server.uri(), "unused.db");
    let client = JmaClient::new(&config).unwrap();
    let regions = weather::regions_from(&client.regions_or_empty().await);
    let tokyo = regions.iter().find(|r| r.name == "Tokyo").unwrap();

    let lookup = Lookup::direct(&config).unwrap();
    let text = lookup.run(Some(tokyo.code.as_str())).await.to_string();

    assert!(text.contains("Tokyo Office"));
    assert!(text.contains("Sunny"));
}

#[tokio::test]
async fn test_no_selection_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tokyo_forecast()))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config::with_base_url(&server.uri(), "unused.db");
    let lookup = Lookup::direct(&config).unwrap();

    assert_eq!(lookup.run(None).await.to_string(), PROMPT_TEXT);
}

#[tokio::test]
async fn test_api_then_cache() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_forecast(&server, tokyo_forecast(), 1).await;

    let config = Config::with_base_url(&server.uri(), dir.path().join("weather_forecast.db"));
    let lookup = Lookup::cached(&config).unwrap();

    let first = lookup.run(Some("130000")).await;
    assert_eq!(
        first,
        DisplayText::Forecast {
            office: "Tokyo Office".into(),
            text: "Sunny".into(),
            origin: Origin::Fetched,
        }
    );
    assert!(first.to_string().starts_with("[From API]"));

    let second = lookup.run(Some("130000")).await;
    let DisplayText::Forecast { text, origin, .. } = &second else {
        panic!("expected a forecast, got {:?}", second);
    };
    assert_eq!(text, "Sunny");
    assert!(matches!(origin, Origin::Cached { .. }));
    assert!(second.to_string().starts_with("[From cache]"));

    let cache = ForecastCache::open(&config.database_path).unwrap();
    assert_eq!(cache.count_for("130000").unwrap(), 1);
}

#[tokio::test]
async fn test_cached_region_never_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_forecast(&server, tokyo_forecast(), 0).await;

    let config = Config::with_base_url(&server.uri(), dir.path().join("weather_forecast.db"));
    let cache = ForecastCache::open(&config.database_path).unwrap();
    cache
        .append_at("130000", "Tokyo Office", "Rain", "2000-01-01 00:00:00")
        .unwrap();

    let lookup = Lookup::cached(&config).unwrap();
    let shown = lookup.run(Some("130000")).await.to_string();

    assert!(shown.contains("Rain"));
    assert!(shown.contains("2000-01-01 00:00:00"));
}

#[tokio::test]
async fn test_failed_fetch_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/130000.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = Config::with_base_url(&server.uri(), dir.path().join("weather_forecast.db"));
    let lookup = Lookup::cached(&config).unwrap();

    assert_eq!(lookup.run(Some("130000")).await.to_string(), UNAVAILABLE_TEXT);
    assert_eq!(lookup.run(Some("130000")).await.to_string(), UNAVAILABLE_TEXT);

    let cache = ForecastCache::open(&config.database_path).unwrap();
    assert!(cache.latest_for("130000").unwrap().is_none());
}

#[tokio::test]
async fn test_empty_and_malformed_payloads_are_unavailable() {
    let server = MockServer::start().await;
    mount_forecast(&server, serde_json::json!([]), 1).await;
    Mock::given(method("GET"))
        .and(path("/270000.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"publishingOffice": "Osaka Office", "timeSeries": []}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = Lookup::direct(&Config::with_base_url(&server.uri(), "unused.db")).unwrap();

    assert_eq!(lookup.run(Some("130000")).await, DisplayText::Unavailable);
    assert_eq!(lookup.run(Some("270000")).await, DisplayText::Unavailable);
}

#[tokio::test]
async fn test_unreachable_forecast_is_unavailable_and_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_base_url("http://127.0.0.1:9", dir.path().join("weather_forecast.db"));
    let lookup = Lookup::cached(&config).unwrap();

    assert_eq!(lookup.run(Some("130000")).await, DisplayText::Unavailable);

    let cache = ForecastCache::open(&config.database_path).unwrap();
    assert_eq!(cache.count_for("130000").unwrap(), 0);
}

#[tokio::test]
async fn test_locked_cache_does_not_stall_other_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_base_url("http://127.0.0.1:9", dir.path().join("weather_forecast.db"));
    let lookup = Lookup::cached(&config).unwrap();

    let holder = rusqlite::Connection::open(&config.database_path).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let timer = tokio::spawn(async {
        let start = Instant::now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        start.elapsed()
    });

    // the read waits out the busy timeout, then falls through to the (unreachable) API
    let shown = lookup.run(Some("130000")).await;
    assert_eq!(shown, DisplayText::Unavailable);

    let waited = timer.await.unwrap();
    assert!(waited < Duration::from_secs(1), "timer waited {:?}", waited);

    holder.execute_batch("ROLLBACK;").unwrap();
}
