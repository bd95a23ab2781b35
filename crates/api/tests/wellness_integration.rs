//! Integration tests for mood, chat, meditation and assessment endpoints.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use domain::models::report::NO_ACTIVITY_SUMMARY;
use serde_json::json;
use uuid::Uuid;

use common::{get_json, get_text, post_json, register_user, test_app, test_pool, MOCK_REPLY};

#[tokio::test]
async fn test_mood_log_and_history() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    for (mood, intensity) in [("calm", 4), ("anxious", 8), ("calm", 6)] {
        let (status, body) = post_json(
            &app,
            "/api/mood",
            json!({"user_email": email, "mood": mood, "intensity": intensity}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, body) = get_json(&app, &format!("/api/mood/{}", email)).await;
    assert_eq!(status, StatusCode::OK);
    let moods = body["moods"].as_array().unwrap();
    assert_eq!(moods.len(), 3);
    assert_eq!(moods[0]["mood"], "calm");
    assert_eq!(moods[0]["intensity"], 6);
}

#[tokio::test]
async fn test_mood_intensity_out_of_range() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, body) = post_json(
        &app,
        "/api/mood",
        json!({"user_email": email, "mood": "calm", "intensity": 11}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_insights_without_moods() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, body) = get_json(&app, &format!("/api/insights/{}", email)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No mood data found.");
}

#[tokio::test]
async fn test_insights_use_generator() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    post_json(
        &app,
        "/api/mood",
        json!({"user_email": email, "mood": "hopeful", "intensity": 7}),
    )
    .await;

    let (status, body) = get_json(&app, &format!("/api/insights/{}", email)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["insights"], MOCK_REPLY);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_session_flow() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, body) =
        post_json(&app, "/api/chat/start-session", json!({"user_email": email})).await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let (status, reply) = post_json(
        &app,
        "/api/chat",
        json!({"session_id": session_id, "message": "I can't sleep"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["reply"], MOCK_REPLY);
    assert_eq!(reply["emotion"], "neutral");
    assert!(reply["calming_tip"].as_str().unwrap().contains("deep breaths"));

    let (status, history) = get_json(&app, &format!("/api/chat/history/{}", session_id)).await;
    assert_eq!(status, StatusCode::OK);
    let messages = history["history"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[0]["message"], "I can't sleep");
    assert_eq!(messages[1]["sender"], "ai");

    let (status, sessions) = get_json(&app, &format!("/api/chat/sessions/{}", email)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions["sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_unknown_session_is_not_found() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);

    let unknown = Uuid::new_v4();
    let (status, _) = get_json(&app, &format!("/api/chat/history/{}", unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(
        &app,
        "/api/chat",
        json!({"session_id": unknown, "message": "hello"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guided_meditation() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);

    let (status, body) = post_json(&app, "/api/guided-meditation", json!({"type": "sleep"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], MOCK_REPLY);
}

#[tokio::test]
async fn test_assessment_scoring() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, body) = post_json(
        &app,
        "/api/assessments",
        json!({
            "user_email": email,
            "phq9_answers": [2, 2, 2, 2, 2, 1, 1, 1, 1],
            "gad7_answers": [3, 3, 3, 3, 3, 0, 0]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["phq9_score"], 14);
    assert_eq!(body["data"]["gad7_score"], 15);
    assert_eq!(body["interpretations"]["phq9_level"], "Moderate depression");
    assert_eq!(body["interpretations"]["gad7_level"], "Severe anxiety");
}

#[tokio::test]
async fn test_assessment_rejects_short_answer_set() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, body) = post_json(
        &app,
        "/api/assessments",
        json!({
            "user_email": email,
            "phq9_answers": [0, 0, 0],
            "gad7_answers": [0, 0, 0, 0, 0, 0, 0]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("PHQ-9"));
}

#[tokio::test]
async fn test_mood_distribution_counts() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let mood = format!("rare-{}", &Uuid::new_v4().simple().to_string()[..8]);
    for _ in 0..2 {
        post_json(
            &app,
            "/api/mood",
            json!({"user_email": email, "mood": mood, "intensity": 5}),
        )
        .await;
    }

    let (status, body) = get_json(&app, "/api/stats/mood-distribution").await;
    assert_eq!(status, StatusCode::OK);

    let moods = body["moods"].as_array().unwrap();
    let counts = body["counts"].as_array().unwrap();
    assert_eq!(moods.len(), counts.len());
    let index = moods.iter().position(|m| m == mood.as_str()).unwrap();
    assert_eq!(counts[index], 2);
}

async fn chat_once(app: &axum::Router, email: &str, message: &str) {
    let (_, body) = post_json(app, "/api/chat/start-session", json!({"user_email": email})).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();
    let (status, _) = post_json(
        app,
        "/api/chat",
        json!({"session_id": session_id, "message": message}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_monthly_users_counts_current_month() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;
    chat_once(&app, &email, "Work has been a lot lately").await;

    let (status, body) = get_json(&app, "/api/stats/monthly-users").await;
    assert_eq!(status, StatusCode::OK);

    let months = body["months"].as_array().unwrap();
    let users = body["users"].as_array().unwrap();
    assert_eq!(months.len(), users.len());
    let month = Utc::now().format("%Y-%m").to_string();
    let index = months.iter().position(|m| m == month.as_str()).unwrap();
    // user message plus reply
    assert!(users[index].as_i64().unwrap() >= 2);
}

#[tokio::test]
async fn test_report_summarizes_moods_and_chat() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    post_json(
        &app,
        "/api/mood",
        json!({"user_email": email, "mood": "anxious", "intensity": 6}),
    )
    .await;
    chat_once(&app, &email, "I keep worrying about exams").await;

    let (status, body) = get_json(&app, &format!("/api/report/{}", email)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_email"], email.as_str());
    assert_eq!(body["summary"], MOCK_REPLY);
    assert_eq!(body["mood_entries"], 1);
    assert_eq!(body["chat_messages"], 2);
}

#[tokio::test]
async fn test_report_without_activity() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, body) = get_json(&app, &format!("/api/report/{}", email)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], NO_ACTIVITY_SUMMARY);
    assert_eq!(body["mood_entries"], 0);
    assert_eq!(body["chat_messages"], 0);
}

#[tokio::test]
async fn test_report_as_text() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    post_json(
        &app,
        "/api/mood",
        json!({"user_email": email, "mood": "calm", "intensity": 3}),
    )
    .await;

    let (status, content_type, body) =
        get_text(&app, &format!("/api/report/{}?format=text", email)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"));
    assert!(body.starts_with("Therapy Progress Report"));
    assert!(body.contains(&format!("User: {}", email)));
    assert!(body.contains("Based on 1 mood entries and 0 chat messages"));
    assert!(body.contains(MOCK_REPLY));
}

#[tokio::test]
async fn test_report_rejects_unknown_format() {
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);
    let email = register_user(&app).await;

    let (status, _, _) = get_text(&app, &format!("/api/report/{}?format=pdf", email)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
