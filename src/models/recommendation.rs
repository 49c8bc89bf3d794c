use std::fmt::Display;

use crate::{
    error::{AppError, AppResult},
    transport::{codec::SEPARATOR, Message},
};

/// User ID sent with the startup connectivity check
pub const SELF_TEST_USER_ID: &str = "test_user";

/// Video ID sent with the startup connectivity check
pub const SELF_TEST_VIDEO_ID: &str = "test_video";

/// Status value the service uses for an acknowledged request
pub const STATUS_SUCCESS: &str = "success";

/// Status value the service uses for a rejected request
pub const STATUS_ERROR: &str = "error";

/// Value of the `action` field, which selects the request kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Recommend,
    Test,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Recommend => "recommend",
            Action::Test => "test",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request kinds understood by the recommendation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationRequest {
    /// A user watched a video
    View { user_id: String, video_id: String },
    /// Ranked video IDs for a user
    Recommend { user_id: String },
    /// Connectivity check with fixed sentinel IDs
    SelfTest,
}

impl RecommendationRequest {
    pub fn action(&self) -> Action {
        match self {
            RecommendationRequest::View { .. } => Action::View,
            RecommendationRequest::Recommend { .. } => Action::Recommend,
            RecommendationRequest::SelfTest => Action::Test,
        }
    }

    /// Rejects identifiers the wire format cannot carry
    pub fn validate(&self) -> AppResult<()> {
        match self {
            RecommendationRequest::View { user_id, video_id } => {
                validate_id("user_id", user_id)?;
                validate_id("video_id", video_id)
            }
            RecommendationRequest::Recommend { user_id } => validate_id("user_id", user_id),
            RecommendationRequest::SelfTest => Ok(()),
        }
    }

    /// Builds the wire message; `action` always comes first
    pub fn to_message(&self) -> Message {
        let message = Message::new().with("action", self.action().as_str());

        match self {
            RecommendationRequest::View { user_id, video_id } => message
                .with("user_id", user_id.as_str())
                .with("video_id", video_id.as_str()),
            RecommendationRequest::Recommend { user_id } => {
                message.with("user_id", user_id.as_str())
            }
            RecommendationRequest::SelfTest => message
                .with("user_id", SELF_TEST_USER_ID)
                .with("video_id", SELF_TEST_VIDEO_ID),
        }
    }
}

fn validate_id(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} cannot be empty", field)));
    }

    if value.contains([SEPARATOR, '\n', '\r']) {
        return Err(AppError::InvalidInput(format!(
            "{} contains characters the recommendation protocol cannot carry",
            field
        )));
    }

    Ok(())
}

/// `status`/`message` acknowledgment returned for `view` and `test`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceStatus {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl ServiceStatus {
    pub fn from_message(message: &Message) -> Self {
        Self {
            status: message.get("status").map(str::to_string),
            message: message.get("message").map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }

    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ERROR)
    }
}

impl Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status.as_deref().unwrap_or("<missing>"))?;
        if let Some(message) = &self.message {
            write!(f, " ({})", message)?;
        }
        Ok(())
    }
}

/// Parses the comma-joined `recommendations` value into opaque video IDs.
///
/// A missing key or empty value yields an empty list.
pub fn parse_recommendations(message: &Message) -> Vec<String> {
    message
        .get("recommendations")
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
