//! Mood logging domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Number of entries returned by the mood history endpoint.
pub const RECENT_MOOD_LIMIT: i64 = 30;

/// Number of entries analysed for mood insights.
pub const INSIGHT_MOOD_LIMIT: i64 = 50;

/// A single mood log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MoodLog {
    pub id: Uuid,
    pub user_email: String,
    pub mood: String,
    pub intensity: i32,
    pub created_at: DateTime<Utc>,
}

/// Request payload for logging a mood.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogMoodRequest {
    #[serde(default)]
    #[validate(email(message = "A valid user_email is required"))]
    pub user_email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Mood must be between 1 and 50 characters"))]
    pub mood: String,

    #[validate(range(min = 1, max = 10, message = "Intensity must be between 1 and 10"))]
    pub intensity: i32,
}

/// Response for listing moods.
#[derive(Debug, Clone, Serialize)]
pub struct MoodListResponse {
    pub moods: Vec<MoodLog>,
}

/// Generated summary over a user's recent moods.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MoodInsightsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<MoodLog>,
}

impl MoodInsightsResponse {
    pub fn no_data() -> Self {
        Self {
            success: false,
            insights: None,
            message: Some("No mood data found.".to_string()),
            data: Vec::new(),
        }
    }
}

/// Mood counts across all users, as parallel arrays for charting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoodDistributionResponse {
    pub moods: Vec<String>,
    pub counts: Vec<i64>,
}

impl FromIterator<(String, i64)> for MoodDistributionResponse {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut response = Self::default();
        for (mood, count) in iter {
            response.moods.push(mood);
            response.counts.push(count);
        }
        response
    }
}
