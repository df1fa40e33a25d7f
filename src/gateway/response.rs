//! The uniform result shape of every gated admin action.

use serde::{Deserialize, Serialize};

/// Returned in place of internal error details.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// `{ "success": bool, "data"?: T, "error"?: string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn unexpected() -> Self {
        Self::fail(UNEXPECTED_ERROR)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The error message, empty on success.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| UNEXPECTED_ERROR.to_string())),
        }
    }
}
