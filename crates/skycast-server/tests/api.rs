#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end handler tests: real router, SQLite database, mock upstreams,
//! in-memory sessions.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skycast_core::Config;
use skycast_server::routes;
use skycast_server::state::AppState;
use skycast_store::migration::MigratorTrait;
use skycast_store::Migrator;

async fn build_app(configure: impl FnOnce(&mut Config)) -> (Router, MockServer, MockServer) {
    let geo_server = MockServer::start().await;
    let weather_server = MockServer::start().await;

    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.geocoding.base_url = geo_server.uri();
    config.weather.base_url = weather_server.uri();
    configure(&mut config);

    let state = AppState::new(db, config).unwrap();
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_expiry(Expiry::OnInactivity(time::Duration::days(1)));
    let app = routes::router(state).layer(session_layer);

    (app, geo_server, weather_server)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn geocoding_result() -> Value {
    json!({
        "results": [{
            "name": "Munich",
            "admin1": "Bavaria",
            "country_code": "DE",
            "latitude": 48.137154,
            "longitude": 11.576124,
        }]
    })
}

fn forecast_body() -> Value {
    json!({
        "latitude": 48.14,
        "longitude": 11.58,
        "timezone": "Europe/Berlin",
        "elevation": 521.0,
        "current_weather": {
            "time": "2024-06-01T13:00",
            "temperature": 21.4,
            "windspeed": 7.2,
            "winddirection": 180.0,
            "weathercode": 2
        },
        "hourly": {
            "time": ["2024-06-01T13:00"],
            "temperature_2m": [21.4],
            "weather_code": [2],
            "precipitation_probability": [5],
            "windspeed_10m": [7.2],
            "winddirection_10m": [180.0]
        },
        "daily": {
            "time": ["2024-06-01"],
            "weather_code": [2],
            "temperature_2m_max": [24.0],
            "temperature_2m_min": [12.1]
        }
    })
}

#[tokio::test]
async fn healthz_answers() {
    let (app, _geo, _weather) = build_app(|_| {}).await;
    let response = app.oneshot(get("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn autocomplete_short_query_returns_empty_list() {
    let (app, _geo, _weather) = build_app(|_| {}).await;
    let response = app
        .oneshot(get("/api/search?city=m", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn autocomplete_hits_upstream_once_then_cache() {
    let (app, geo, _weather) = build_app(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", "mun"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocoding_result()))
        .expect(1)
        .mount(&geo)
        .await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/api/search?city=mun", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["full_display"], "Munich, Bavaria, DE");
    }
}

#[tokio::test]
async fn autocomplete_upstream_failure_degrades_to_empty() {
    let (app, geo, _weather) = build_app(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&geo)
        .await;

    let response = app.oneshot(get("/api/search?city=mun", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn register_login_me_logout_flow() {
    let (app, _geo, _weather) = build_app(|_| {}).await;
    let credentials = json!({"email": "Jane@Example.com", "password": "hunter2hunter2"});

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/register", &credentials, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    assert_eq!(body_json(response).await["email"], "jane@example.com");

    // Registered session is signed in
    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Duplicate registration conflicts
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/register", &credentials, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Fresh login works and the old password is checked
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            &json!({"email": "jane@example.com", "password": "wrong password"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/login", &credentials, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Logout drops the session
    let response = app
        .clone()
        .oneshot(post_json("/api/auth/logout", &json!({}), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_validates_input() {
    let (app, _geo, _weather) = build_app(|_| {}).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            &json!({"email": "not-an-email", "password": "hunter2hunter2"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(post_json(
            "/api/auth/register",
            &json!({"email": "jane@example.com", "password": "short"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_respects_disabled_registration() {
    let (app, _geo, _weather) = build_app(|config| {
        config.auth.allow_registration = false;
    })
    .await;

    let response = app
        .clone()
        .oneshot(get("/api/auth/settings", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({"allow_registration": false}));

    let response = app
        .oneshot(post_json(
            "/api/auth/register",
            &json!({"email": "jane@example.com", "password": "hunter2hunter2"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn statistics_rejects_anonymous_users() {
    let (app, _geo, _weather) = build_app(|_| {}).await;
    let response = app.oneshot(get("/api/statistics", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn weather_requires_a_selected_location() {
    let (app, _geo, _weather) = build_app(|_| {}).await;
    let response = app.oneshot(get("/api/weather", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn select_location_rejects_empty_city() {
    let (app, _geo, _weather) = build_app(|_| {}).await;
    let response = app
        .oneshot(post_json("/api/location", &json!({"city": "  "}), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn weather_flow_with_coordinates() {
    let (app, _geo, weather) = build_app(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&weather)
        .await;

    // Pick a suggestion (coordinates included, comma decimals accepted)
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/location",
            &json!({"city": "Munich, Bavaria, DE", "lat": "48,137154", "lon": "11,576124"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(get("/api/weather", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["current"]["condition"], "partly_cloudy");
    assert_eq!(report["hourly"].as_array().unwrap().len(), 1);

    // Results page re-serves the stored report and resolved location
    let response = app
        .clone()
        .oneshot(get("/api/weather/results", Some(&cookie)))
        .await
        .unwrap();
    let results = body_json(response).await;
    assert_eq!(results["location"]["name"], "Munich");
    assert_eq!(results["weather"]["daily"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn weather_flow_geocodes_bare_names_and_logs_history() {
    let (app, geo, weather) = build_app(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("count", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocoding_result()))
        .mount(&geo)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&weather)
        .await;

    // Sign up, then search by bare name
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            &json!({"email": "jane@example.com", "password": "hunter2hunter2"}),
            None,
        ))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/location",
            &json!({"city": "Munich"}),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/weather", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The lookup shows up in the statistics
    let response = app
        .clone()
        .oneshot(get("/api/statistics", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["total_searches"], 1);
    assert_eq!(stats["unique_cities"], 1);
    assert_eq!(stats["top_searches"][0]["city"], "Munich, Bavaria, DE");
    assert_eq!(stats["user_searches"][0]["city"], "Munich, Bavaria, DE");
}

#[tokio::test]
async fn weather_upstream_failure_is_bad_gateway() {
    let (app, _geo, weather) = build_app(|_| {}).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&weather)
        .await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/location",
            &json!({"city": "48.1,11.5"}),
            None,
        ))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .oneshot(get("/api/weather", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
