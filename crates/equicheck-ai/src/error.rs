use thiserror::Error;

/// Why an analysis failed. Every variant renders as a message fit to show a
/// user as-is.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Access Denied: Invalid API Key or Permissions.")]
    AuthError,

    #[error("Rate Limit Exceeded: The service is currently busy. Please try again in a moment.")]
    RateLimited,

    #[error("Service Unavailable: The analysis model is experiencing issues.")]
    ServiceUnavailable,

    #[error("The AI model returned an empty response. Please try again.")]
    EmptyResponse,

    #[error("Failed to parse AI analysis. The model output was not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("{0}")]
    UnknownError(String),
}

/// A failure reported by the model transport or service.
///
/// The message is expected to embed the HTTP status code when there is one
/// (e.g. `"... 429 Too Many Requests: ..."`); [`classify_failure`] matches on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ModelError {
    pub message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

const AUTH_MARKERS: &[&str] = &["401", "403", "PERMISSION_DENIED", "UNAUTHENTICATED"];
const RATE_MARKERS: &[&str] = &["429", "RESOURCE_EXHAUSTED"];
const SERVER_MARKERS: &[&str] = &["500", "502", "503", "504", "UNAVAILABLE", "INTERNAL"];

/// Map a transport/service failure onto the analysis error taxonomy.
///
/// Substring match on the message, checked in order: auth, rate limit,
/// server fault. Anything unmatched keeps its original message.
pub fn classify_failure(err: &ModelError) -> AnalysisError {
    let msg = err.message.as_str();
    let hit = |markers: &[&str]| markers.iter().any(|m| msg.contains(m));
    if hit(AUTH_MARKERS) {
        AnalysisError::AuthError
    } else if hit(RATE_MARKERS) {
        AnalysisError::RateLimited
    } else if hit(SERVER_MARKERS) {
        AnalysisError::ServiceUnavailable
    } else if msg.trim().is_empty() {
        AnalysisError::UnknownError(
            "An unexpected error occurred during document analysis.".into(),
        )
    } else {
        AnalysisError::UnknownError(msg.to_string())
    }
}
