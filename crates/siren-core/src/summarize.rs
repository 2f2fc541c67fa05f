// Summarization collaborator seam
//
// The gated alert flow condenses the reporter's medical history and
// location into a short brief before the alert is written. Provider crates
// implement this trait; the API depends only on the trait object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;

/// Request for a medical-history summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummarizeRequest {
    /// Free-text rendering of the employee's medical history
    pub medical_history: String,
    /// Current location, e.g. "Lat: 12.97, Lon: 77.59"
    pub current_location: String,
}

/// Response from the summarization collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummarizeResponse {
    /// Concise brief for emergency responders
    pub summary: String,
}

/// Trait for summarization providers.
///
/// Implementations own their transport and must bound the call with a
/// timeout; a hung collaborator must surface as an error, never block the
/// alert flow indefinitely.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: SummarizeRequest) -> Result<SummarizeResponse>;
}

#[cfg(test)]
mod tests {
    use super::testing::FixedSummarizer;
    use super::*;

    fn request() -> SummarizeRequest {
        SummarizeRequest {
            medical_history: "Allergies: peanuts (severe).".to_string(),
            current_location: "Lat: 12.97, Lon: 77.59".to_string(),
        }
    }

    #[tokio::test]
    async fn fixed_summarizer_returns_configured_summary() {
        let summarizer = FixedSummarizer::ok("Severe peanut allergy, carry epinephrine.");
        let response = summarizer.summarize(request()).await.unwrap();
        assert_eq!(response.summary, "Severe peanut allergy, carry epinephrine.");
        assert_eq!(summarizer.call_count(), 1);
    }

    #[tokio::test]
    async fn fixed_summarizer_surfaces_failure() {
        let summarizer = FixedSummarizer::failing("provider unavailable");
        let err = summarizer.summarize(request()).await.unwrap_err();
        assert!(matches!(err, crate::error::SirenError::Summarizer(_)));
        assert_eq!(summarizer.call_count(), 1);
    }
}
