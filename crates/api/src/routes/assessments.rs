//! PHQ-9 / GAD-7 assessment endpoint.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::assessment::{AssessmentResponse, Interpretations, SubmitAssessmentRequest};
use domain::services::assessment::score;
use persistence::repositories::AssessmentRepository;
use shared::validation::normalize_email;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Score and store a questionnaire submission.
///
/// POST /api/assessments
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ApiError> {
    request.validate()?;

    let result = score(&request.phq9_answers, &request.gad7_answers)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    // Scores are bounded by 27 and 21.
    let stored = AssessmentRepository::new(state.pool.clone())
        .create(
            &normalize_email(&request.user_email),
            result.phq9_score as i32,
            result.gad7_score as i32,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssessmentResponse {
            data: stored.into(),
            interpretations: Interpretations {
                phq9_level: result.depression.to_string(),
                gad7_level: result.anxiety.to_string(),
            },
        }),
    ))
}
