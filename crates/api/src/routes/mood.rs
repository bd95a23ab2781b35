//! Mood logging, insights, progress report and distribution endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use domain::models::mood::{
    LogMoodRequest, MoodDistributionResponse, MoodInsightsResponse, MoodListResponse, MoodLog,
    INSIGHT_MOOD_LIMIT, RECENT_MOOD_LIMIT,
};
use domain::models::report::{
    ReportFormat, ReportQuery, WellnessReport, NO_ACTIVITY_SUMMARY, REPORT_MESSAGE_LIMIT,
    REPORT_MOOD_LIMIT,
};
use domain::services::generate_or_fallback;
use domain::services::text_generation::{
    fallback_insights, fallback_report, insights_request, report_request,
};
use persistence::repositories::{ChatRepository, MoodRepository};
use shared::validation::normalize_email;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Record how the user feels right now.
///
/// POST /api/mood
pub async fn log_mood(
    State(state): State<AppState>,
    Json(request): Json<LogMoodRequest>,
) -> Result<(StatusCode, Json<MoodLog>), ApiError> {
    request.validate()?;

    let entry = MoodRepository::new(state.pool.clone())
        .create(
            &normalize_email(&request.user_email),
            request.mood.trim(),
            request.intensity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Latest mood entries for a user, newest first.
///
/// GET /api/mood/:email
pub async fn recent_moods(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<MoodListResponse>, ApiError> {
    let moods = MoodRepository::new(state.pool.clone())
        .recent_by_email(&normalize_email(&email), RECENT_MOOD_LIMIT)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(MoodListResponse { moods }))
}

/// Generated summary of a user's recent moods.
///
/// GET /api/insights/:email
pub async fn insights(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<MoodInsightsResponse>, ApiError> {
    let moods: Vec<MoodLog> = MoodRepository::new(state.pool.clone())
        .recent_chronological(&normalize_email(&email), INSIGHT_MOOD_LIMIT)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    if moods.is_empty() {
        return Ok(Json(MoodInsightsResponse::no_data()));
    }

    let text = generate_or_fallback(
        state.text_generator.as_ref(),
        insights_request(&moods),
        || fallback_insights(&moods),
    )
    .await;

    Ok(Json(MoodInsightsResponse {
        success: true,
        insights: Some(text),
        message: None,
        data: moods,
    }))
}

/// Generated wellness summary over a user's latest moods and chat messages.
///
/// GET /api/report/:email?format=json|text
pub async fn report(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let email = normalize_email(&email);

    let moods: Vec<MoodLog> = MoodRepository::new(state.pool.clone())
        .recent_by_email(&email, REPORT_MOOD_LIMIT)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let messages: Vec<String> = ChatRepository::new(state.pool.clone())
        .recent_for_user(&email, REPORT_MESSAGE_LIMIT)
        .await?
        .into_iter()
        .map(|m| m.message)
        .collect();

    let summary = if moods.is_empty() && messages.is_empty() {
        NO_ACTIVITY_SUMMARY.to_string()
    } else {
        generate_or_fallback(
            state.text_generator.as_ref(),
            report_request(&moods, &messages),
            || fallback_report(&moods, &messages),
        )
        .await
    };

    let report = WellnessReport {
        user_email: email,
        generated_at: Utc::now(),
        mood_entries: moods.len(),
        chat_messages: messages.len(),
        summary,
    };

    Ok(match query.format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            report.to_text(),
        )
            .into_response(),
    })
}

/// Entry counts per mood across all users.
///
/// GET /api/stats/mood-distribution
pub async fn distribution(
    State(state): State<AppState>,
) -> Result<Json<MoodDistributionResponse>, ApiError> {
    let response = MoodRepository::new(state.pool.clone())
        .distribution()
        .await?
        .into_iter()
        .map(|row| (row.mood, row.count))
        .collect();

    Ok(Json(response))
}
