// src/advisor/mod.rs

//! Adaptive difficulty: suggests the next quiz difficulty from the last set's accuracy.

pub mod llm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::models::content::Difficulty;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("advisor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("advisor returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advisor returned an unusable answer: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustDifficultyRequest {
    /// Percentage of correct answers in the last quiz set.
    #[validate(range(min = 0.0, max = 100.0, message = "userPerformance must be between 0 and 100"))]
    pub user_performance: f64,
    #[validate(length(min = 1, max = 32))]
    pub current_difficulty: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdjustDifficultyResponse {
    pub adjusted_difficulty: String,
    pub reasoning: String,
}

#[async_trait]
pub trait DifficultyAdvisor: Send + Sync {
    async fn adjust(
        &self,
        request: &AdjustDifficultyRequest,
    ) -> Result<AdjustDifficultyResponse, AdvisorError>;
}

/// Above this accuracy the next set gets harder.
pub const RAISE_ABOVE: f64 = 90.0;
/// Below this accuracy the next set gets easier.
pub const LOWER_BELOW: f64 = 60.0;

/// Offline advisor applying the accuracy bands directly.
#[derive(Debug, Default, Clone)]
pub struct ThresholdAdvisor;

#[async_trait]
impl DifficultyAdvisor for ThresholdAdvisor {
    async fn adjust(
        &self,
        request: &AdjustDifficultyRequest,
    ) -> Result<AdjustDifficultyResponse, AdvisorError> {
        let current = Difficulty::parse(&request.current_difficulty).ok_or_else(|| {
            AdvisorError::InvalidInput(format!(
                "Unknown difficulty '{}'",
                request.current_difficulty
            ))
        })?;
        let performance = request.user_performance;

        let (adjusted, reasoning) = if performance > RAISE_ABOVE {
            (
                current.harder(),
                format!("A score of {:.0}% shows mastery, so the next set should be harder.", performance),
            )
        } else if performance < LOWER_BELOW {
            (
                current.easier(),
                format!("A score of {:.0}% suggests the material is too hard for now.", performance),
            )
        } else {
            (
                current,
                format!("A score of {:.0}% is in the balanced range; keeping the difficulty.", performance),
            )
        };

        Ok(AdjustDifficultyResponse {
            adjusted_difficulty: adjusted.as_str().to_string(),
            reasoning,
        })
    }
}
