use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use tubestats::{
    config::DatabaseConfig,
    database::Database,
    history::HistoryRecorder,
    sources::{ChannelRecord, VideoRecord},
    utils::time::CalendarZone,
    web::{create_router, AppState},
};

const CHANNEL_ID: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

// Helper function to send requests to the app
async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(body) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

fn video(id: &str, day: u32, views: u64, likes: u64) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        title: format!("Video {}", id),
        description: String::new(),
        published_at: Utc.with_ymd_and_hms(2025, 1, day, 15, 0, 0).unwrap(),
        view_count: views,
        like_count: likes,
        comment_count: 1,
    }
}

/// Router over an in-memory database holding one channel with three videos
/// and a two-point subscriber history (2025-01-01: 100, 2025-01-11: 200).
async fn seeded_app() -> (Router, Database) {
    let database = Database::new(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
    })
    .await
    .unwrap();
    database.migrate().await.unwrap();

    let recorder = HistoryRecorder::new(CalendarZone::from_config(Some("UTC")).unwrap());
    let channel = ChannelRecord {
        id: CHANNEL_ID.to_string(),
        title: "Google for Developers".to_string(),
        description: "Talks".to_string(),
        subscribers: 200,
        video_count: 3,
        view_count: 5000,
    };
    database.upsert_channel(&channel, &recorder).await.unwrap();
    database
        .save_videos(
            CHANNEL_ID,
            &[video("a", 3, 1000, 60), video("b", 6, 0, 0), video("c", 9, 400, 4)],
            &recorder,
        )
        .await
        .unwrap();

    let mut blob = None;
    for (day, count) in [(1, 100), (11, 200)] {
        let date = NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        blob = Some(recorder.add_point(blob.as_deref(), count, Some(date)).unwrap());
    }
    sqlx::query("UPDATE channels SET subscriber_history = ? WHERE id = ?")
        .bind(blob)
        .bind(CHANNEL_ID)
        .execute(&database.pool())
        .await
        .unwrap();

    let app = create_router(AppState {
        database: database.clone(),
    });
    (app, database)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = seeded_app().await;
    let (status, response) = send_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["data"]["database"], "connected");
    assert!(response.get("timestamp").is_some());
}

#[tokio::test]
async fn test_list_and_get_channel() {
    let (app, _) = seeded_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/v1/channels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"].as_array().unwrap().len(), 1);
    assert_eq!(response["data"][0]["title"], "Google for Developers");
    assert!(response["data"][0].get("subscriber_history").is_none());

    let uri = format!("/api/v1/channels/{}", CHANNEL_ID);
    let (status, response) = send_request(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["subscribers"], 200);

    let (status, response) =
        send_request(&app, Method::GET, "/api/v1/channels/UCmissing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_subscriber_history_range() {
    let (app, _) = seeded_app().await;

    let uri = format!(
        "/api/v1/channels/{}/history/subscribers?start=2025-01-01&end=2025-01-31",
        CHANNEL_ID
    );
    let (status, response) = send_request(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response["data"],
        json!([
            {"date": "2025-01-01", "count": 100},
            {"date": "2025-01-11", "count": 200}
        ])
    );

    let uri = format!("/api/v1/channels/{}/history/subscribers?start=yesterday", CHANNEL_ID);
    let (status, _) = send_request(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/v1/channels/UCmissing/history/views",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"], json!([]));
}

#[tokio::test]
async fn test_chart_places_markers_on_series() {
    let (app, _) = seeded_app().await;

    let uri = format!(
        "/api/v1/channels/{}/chart/subscribers?start=2025-01-01&end=2025-01-31",
        CHANNEL_ID
    );
    let (status, response) = send_request(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let markers = response["data"]["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 3);
    // 2025-01-06 is halfway between the two snapshots
    assert_eq!(markers[1]["date"], "2025-01-06");
    assert_eq!(markers[1]["value"], 150.0);
    assert_eq!(response["data"]["series"].as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/channels/{}/chart/likes", CHANNEL_ID);
    let (status, _) = send_request(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hide_video_moves_it_between_lists() {
    let (app, _) = seeded_app().await;
    let visible_uri = format!("/api/v1/channels/{}/videos", CHANNEL_ID);
    let hidden_uri = format!("/api/v1/channels/{}/videos?hidden=true", CHANNEL_ID);

    let (_, response) = send_request(&app, Method::GET, &visible_uri, None).await;
    let ids: Vec<_> = response["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
    assert_eq!(response["data"][2]["like_ratio"], 6.0);
    assert_eq!(response["data"][1]["like_ratio"], Value::Null);

    let (status, response) = send_request(
        &app,
        Method::PUT,
        "/api/v1/videos/c/hidden",
        Some(json!({"hidden": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["hidden"], true);

    let (_, response) = send_request(&app, Method::GET, &hidden_uri, None).await;
    assert_eq!(response["data"].as_array().unwrap().len(), 1);

    let publications = format!("/api/v1/channels/{}/publications", CHANNEL_ID);
    let (_, response) = send_request(&app, Method::GET, &publications, None).await;
    assert_eq!(
        response["data"],
        json!([
            {"date": "2025-01-03", "title": "Video a", "video_id": "a"},
            {"date": "2025-01-06", "title": "Video b", "video_id": "b"}
        ])
    );

    let (status, _) = send_request(
        &app,
        Method::PUT,
        "/api/v1/videos/zzz/hidden",
        Some(json!({"hidden": false})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_detail_and_analysis_lifecycle() {
    let (app, _) = seeded_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/v1/videos/a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["url"], "https://www.youtube.com/watch?v=a");
    assert_eq!(response["data"]["stats"]["like_percent"], 6.0);

    let (status, response) =
        send_request(&app, Method::GET, "/api/v1/videos/a/analysis/template", None).await;
    assert_eq!(status, StatusCode::OK);
    let template = response["data"]["template"].as_str().unwrap();
    assert!(template.starts_with("# Video Analysis: Video a"));
    assert!(template.contains("performed well?"));

    let (status, response) = send_request(
        &app,
        Method::PUT,
        "/api/v1/videos/a/analysis",
        Some(json!({"analysis": "Strong hook"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["analysis"], "Strong hook");

    let (status, _) = send_request(
        &app,
        Method::PUT,
        "/api/v1/videos/a/analysis",
        Some(json!({"analysis": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, response) =
        send_request(&app, Method::DELETE, "/api/v1/videos/a/analysis", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["analysis"], Value::Null);
}

#[tokio::test]
async fn test_video_view_history_has_growth() {
    let (app, database) = seeded_app().await;

    let recorder = HistoryRecorder::new(CalendarZone::from_config(Some("UTC")).unwrap());
    let blob = recorder
        .add_point(None, 500, Some(NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()))
        .unwrap();
    let blob = recorder
        .add_point(Some(&blob), 1000, Some(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()))
        .unwrap();
    sqlx::query("UPDATE videos SET view_count_history = ? WHERE id = 'a'")
        .bind(blob)
        .execute(&database.pool())
        .await
        .unwrap();

    let (status, response) =
        send_request(&app, Method::GET, "/api/v1/videos/a/history/views", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["points"].as_array().unwrap().len(), 2);
    assert_eq!(response["data"]["growth"]["absolute"], 500);
    assert_eq!(response["data"]["growth"]["percent"], 100.0);

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/v1/videos/a/history/views?start=2025-01-05",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["points"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_video_view_history_is_empty() {
    let (app, _) = seeded_app().await;

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/v1/videos/unknown/history/views",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["video_id"], "unknown");
    assert_eq!(response["data"]["points"], json!([]));
    assert_eq!(response["data"]["growth"], Value::Null);
}

#[tokio::test]
async fn test_delete_channel_removes_videos() {
    let (app, database) = seeded_app().await;

    let uri = format!("/api/v1/channels/{}", CHANNEL_ID);
    let (status, response) = send_request(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["deleted"], true);

    assert!(database.get_video("a").await.unwrap().is_none());
    let (status, _) = send_request(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
