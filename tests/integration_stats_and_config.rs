use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use beacon::models::server_config::NewServerConfig;
use beacon::repositories::memory::MemoryStore;
use beacon::repositories::server_config::ServerConfigRepository;
use beacon::repositories::user::UserRepository;
use beacon::state::AppState;

const MEGABYTE: i64 = 1024 * 1024;

fn test_app() -> (Router, Arc<MemoryStore>) {
    let (state, store) = AppState::in_memory();
    (beacon::app(state), store)
}

async fn send(app: &Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn start(app: &Router, user_id: &str, device_os: &str, app_version: &str) -> Uuid {
    let (status, body) = send(
        app,
        Method::POST,
        "/start-session/",
        Some(json!({
            "user_id": user_id,
            "device_os": device_os,
            "app_version": app_version
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "start-session failed: {body}");
    body["session_id"].as_str().unwrap().parse().unwrap()
}

async fn end(app: &Router, session_id: Uuid, bytes_sent: i64, bytes_received: i64) {
    let (status, _) = send(
        app,
        Method::POST,
        "/end-session/",
        Some(json!({
            "session_id": session_id,
            "bytes_sent": bytes_sent,
            "bytes_received": bytes_received
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn stats_with_no_sessions_are_zero() {
    let (app, _store) = test_app();

    let (status, body) = send(&app, Method::GET, "/stats/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected_users"].as_i64().unwrap(), 0);
    assert_eq!(body["total_data_MB"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn stats_sum_both_directions_in_megabytes() {
    let (app, _store) = test_app();
    let session_id = start(&app, "u1", "android", "1.0").await;
    end(&app, session_id, MEGABYTE, MEGABYTE).await;

    let (status, body) = send(&app, Method::GET, "/stats/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected_users"].as_i64().unwrap(), 0);
    assert_eq!(body["total_data_MB"].as_f64().unwrap(), 2.0);
}

#[tokio::test]
async fn stats_round_to_two_decimal_places() {
    let (app, _store) = test_app();
    let session_id = start(&app, "u1", "android", "1.0").await;
    // 1.5 MiB sent, a third of a MiB received: 1.8333... rounds to 1.83.
    end(&app, session_id, MEGABYTE + MEGABYTE / 2, MEGABYTE / 3).await;

    let (_, body) = send(&app, Method::GET, "/stats/", None).await;

    assert_eq!(body["total_data_MB"].as_f64().unwrap(), 1.83);
}

#[tokio::test]
async fn stats_count_only_active_sessions() {
    let (app, _store) = test_app();
    let first = start(&app, "u1", "android", "1.0").await;
    let _second = start(&app, "u2", "ios", "2.0").await;
    end(&app, first, 0, 0).await;

    let (_, body) = send(&app, Method::GET, "/stats/", None).await;

    assert_eq!(body["connected_users"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn detailed_stats_break_down_by_os_and_version() {
    let (app, _store) = test_app();
    let ended = start(&app, "u1", "android", "1.0").await;
    let _still_open = start(&app, "u1", "android", "1.0").await;
    let _other = start(&app, "u2", "ios", "2.0").await;
    end(&app, ended, MEGABYTE, MEGABYTE).await;

    let (status, body) = send(&app, Method::GET, "/stats/detailed/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_users"].as_i64().unwrap(), 2);
    assert_eq!(body["total_sessions"].as_i64().unwrap(), 3);
    assert_eq!(body["active_sessions"].as_i64().unwrap(), 2);
    assert_eq!(body["total_data_used_mb"].as_f64().unwrap(), 2.0);

    assert_eq!(
        body["top_os_versions"],
        json!([
            {"device_os": "android", "count": 2},
            {"device_os": "ios", "count": 1}
        ])
    );
    assert_eq!(
        body["top_app_versions"],
        json!([
            {"app_version": "1.0", "count": 2},
            {"app_version": "2.0", "count": 1}
        ])
    );
}

#[tokio::test]
async fn server_config_missing_returns_404() {
    let (app, _store) = test_app();

    let (status, body) = send(&app, Method::GET, "/server-config/", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No config found"}));
}

#[tokio::test]
async fn server_config_serves_most_recent_row() {
    let (app, store) = test_app();

    store
        .save(NewServerConfig {
            server_ip: "10.0.0.1".parse().unwrap(),
            port: 1194,
            protocol: "udp".to_string(),
            dns: "1.1.1.1".to_string(),
            message: None,
        })
        .await
        .unwrap();
    store
        .save(NewServerConfig {
            server_ip: "10.0.0.2".parse().unwrap(),
            port: 443,
            protocol: "tcp".to_string(),
            dns: "9.9.9.9".to_string(),
            message: Some("maintenance tonight".to_string()),
        })
        .await
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/server-config/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "server_ip": "10.0.0.2",
            "port": 443,
            "protocol": "tcp",
            "dns": "9.9.9.9",
            "message": "maintenance tonight"
        })
    );
}

#[tokio::test]
async fn report_install_records_install_and_user() {
    let (app, store) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/report-install/",
        Some(json!({
            "user_id": "u9",
            "os_version": "Android 14",
            "app_version": "1.2"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "recorded"}));
    assert_eq!(store.install_count(), 1);

    let user = store.find_by_external_id("u9").await.unwrap().unwrap();
    assert_eq!(user.device_os, "Android 14");
    assert_eq!(user.app_version, "1.2");
}

#[tokio::test]
async fn report_install_reuses_existing_user() {
    let (app, store) = test_app();
    start(&app, "u1", "android", "1.0").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/report-install/",
        Some(json!({
            "user_id": "u1",
            "os_version": "Android 15",
            "app_version": "2.0"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.user_count(), 1);
    assert_eq!(store.install_count(), 1);

    // The install keeps its own reported versions; the user keeps the
    // fields from first sight.
    let user = store.find_by_external_id("u1").await.unwrap().unwrap();
    assert_eq!(user.device_os, "android");
    assert_eq!(user.app_version, "1.0");
}
