//! HTTP-level tests for the OpenWeather provider against a mock server.

use std::time::Duration;

use woff_weather_core::{
    CityQuery, ErrorCode, FetchClient, HttpTransport, OpenWeatherProvider, Operation, RetryPolicy,
    WeatherProvider, format_current_weather,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn current_weather_body() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 139.6917, "lat": 35.6895 },
        "weather": [{ "id": 801, "main": "Clouds", "description": "薄い雲", "icon": "02d" }],
        "main": { "temp": 21.6, "feels_like": 21.2, "pressure": 1014, "humidity": 65 },
        "wind": { "speed": 3.2, "deg": 140 },
        "dt": 1_704_855_600,
        "name": "Tokyo",
        "cod": 200
    })
}

/// Provider pointed at the mock server with a short retry delay.
fn create_test_provider(mock_server: &MockServer, timeout: Duration) -> OpenWeatherProvider {
    let transport = HttpTransport::new(timeout).expect("Failed to create transport");
    let fetch = FetchClient::new(transport)
        .with_timeout(timeout)
        .with_retry(RetryPolicy { max_retries: 2, delay: Duration::from_millis(10) });

    OpenWeatherProvider::with_client("TEST_KEY".to_string(), fetch).with_base_url(mock_server.uri())
}

fn tokyo() -> CityQuery {
    CityQuery::parse("Tokyo").expect("valid city")
}

#[tokio::test]
async fn current_weather_sends_expected_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Tokyo"))
        .and(query_param("units", "metric"))
        .and(query_param("lang", "ja"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let raw = provider.current_weather(&tokyo()).await.expect("request should succeed");
    let record = format_current_weather(&raw).expect("payload should format");

    assert_eq!(record.location, "Tokyo");
    assert_eq!(record.temperature_c, 22);
    assert_eq!(record.wind_speed_kmh, 12);
}

#[tokio::test]
async fn forecast_hits_forecast_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "New York"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cod": "200", "list": [] })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let city = CityQuery::parse("New York").expect("valid city");
    let raw = provider.forecast(&city).await.expect("request should succeed");

    assert_eq!(raw["list"], serde_json::json!([]));
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let err = provider.forecast(&tokyo()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Api);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.operation(), Some(Operation::GetForecast));
    let source = std::error::Error::source(&err).expect("context wraps the api error");
    assert_eq!(source.to_string(), "city not found");
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            serde_json::json!({ "cod": 401, "message": "Invalid API key." }),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let err = provider.current_weather(&tokyo()).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.operation(), Some(Operation::GetCurrentWeather));
}

#[tokio::test]
async fn server_errors_are_retried_three_times() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let err = provider.current_weather(&tokyo()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Api);
    assert_eq!(err.status(), Some(503));
    let source = std::error::Error::source(&err).expect("context wraps the api error");
    assert_eq!(source.to_string(), "API error: 503");
}

#[tokio::test]
async fn recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let raw = provider.current_weather(&tokyo()).await.expect("second attempt succeeds");

    assert_eq!(raw["name"], "Tokyo");
}

#[tokio::test]
async fn slow_responses_time_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_millis(100));
    let err = provider.current_weather(&tokyo()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Timeout);
}

#[tokio::test]
async fn invalid_json_body_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = create_test_provider(&mock_server, Duration::from_secs(5));
    let err = provider.current_weather(&tokyo()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Formatting);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let mock_server = MockServer::start().await;
    let provider =
        create_test_provider(&mock_server, Duration::from_secs(5)).with_base_url("http://127.0.0.1:1");

    let err = provider.current_weather(&tokyo()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::Network);
    assert_eq!(err.operation(), Some(Operation::GetCurrentWeather));
}
