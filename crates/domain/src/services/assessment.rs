//! PHQ-9 and GAD-7 scoring.

use thiserror::Error;

/// Number of PHQ-9 items.
pub const PHQ9_ITEMS: usize = 9;

/// Number of GAD-7 items.
pub const GAD7_ITEMS: usize = 7;

/// Highest score for a single item ("nearly every day").
pub const MAX_ITEM_SCORE: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssessmentError {
    #[error("{questionnaire} expects {expected} answers, got {actual}")]
    WrongAnswerCount {
        questionnaire: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{questionnaire} answer {index} is {value}, must be 0-3")]
    AnswerOutOfRange {
        questionnaire: &'static str,
        index: usize,
        value: u8,
    },
}

/// PHQ-9 depression severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepressionSeverity {
    Minimal,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl DepressionSeverity {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=4 => Self::Minimal,
            5..=9 => Self::Mild,
            10..=14 => Self::Moderate,
            15..=19 => Self::ModeratelySevere,
            _ => Self::Severe,
        }
    }
}

impl std::fmt::Display for DepressionSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "Minimal depression"),
            Self::Mild => write!(f, "Mild depression"),
            Self::Moderate => write!(f, "Moderate depression"),
            Self::ModeratelySevere => write!(f, "Moderately severe depression"),
            Self::Severe => write!(f, "Severe depression"),
        }
    }
}

/// GAD-7 anxiety severity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnxietySeverity {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl AnxietySeverity {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=4 => Self::Minimal,
            5..=9 => Self::Mild,
            10..=14 => Self::Moderate,
            _ => Self::Severe,
        }
    }
}

impl std::fmt::Display for AnxietySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimal => write!(f, "Minimal anxiety"),
            Self::Mild => write!(f, "Mild anxiety"),
            Self::Moderate => write!(f, "Moderate anxiety"),
            Self::Severe => write!(f, "Severe anxiety"),
        }
    }
}

/// Scored questionnaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentScore {
    pub phq9_score: u32,
    pub gad7_score: u32,
    pub depression: DepressionSeverity,
    pub anxiety: AnxietySeverity,
}

fn sum_answers(
    questionnaire: &'static str,
    answers: &[u8],
    expected: usize,
) -> Result<u32, AssessmentError> {
    if answers.len() != expected {
        return Err(AssessmentError::WrongAnswerCount {
            questionnaire,
            expected,
            actual: answers.len(),
        });
    }

    answers.iter().enumerate().try_fold(0u32, |acc, (index, &value)| {
        if value > MAX_ITEM_SCORE {
            Err(AssessmentError::AnswerOutOfRange {
                questionnaire,
                index,
                value,
            })
        } else {
            Ok(acc + u32::from(value))
        }
    })
}

/// Scores a PHQ-9 and GAD-7 answer set.
pub fn score(phq9_answers: &[u8], gad7_answers: &[u8]) -> Result<AssessmentScore, AssessmentError> {
    let phq9_score = sum_answers("PHQ-9", phq9_answers, PHQ9_ITEMS)?;
    let gad7_score = sum_answers("GAD-7", gad7_answers, GAD7_ITEMS)?;

    Ok(AssessmentScore {
        phq9_score,
        gad7_score,
        depression: DepressionSeverity::from_score(phq9_score),
        anxiety: AnxietySeverity::from_score(gad7_score),
    })
}
