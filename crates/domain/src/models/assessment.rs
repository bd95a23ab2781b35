//! PHQ-9 / GAD-7 assessment domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A stored assessment result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Assessment {
    pub id: Uuid,
    pub user_email: String,
    pub phq9_score: i32,
    pub gad7_score: i32,
    pub created_at: DateTime<Utc>,
}

/// Request payload for submitting questionnaire answers.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAssessmentRequest {
    #[serde(default)]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,

    pub phq9_answers: Vec<u8>,
    pub gad7_answers: Vec<u8>,
}

/// Human-readable severity bands for both questionnaires.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Interpretations {
    pub phq9_level: String,
    pub gad7_level: String,
}

/// Response after submitting an assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResponse {
    pub data: Assessment,
    pub interpretations: Interpretations,
}
