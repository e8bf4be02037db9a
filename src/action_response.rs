//! The response body returned by every endpoint that changes data.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Tells the client whether an action succeeded, and why not if it failed.
///
/// Serialised as `{"success": true}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Whether the action was carried out.
    pub success: bool,
    /// A message for the end user when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    /// A successful action.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed action with a message for the end user.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

impl IntoResponse for ActionResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ActionResponse;

    #[test]
    fn ok_omits_error() {
        let json = serde_json::to_value(ActionResponse::ok()).unwrap();

        assert_eq!(json, json!({ "success": true }));
    }

    #[test]
    fn error_includes_message() {
        let json = serde_json::to_value(ActionResponse::error("Categoria é obrigatória")).unwrap();

        assert_eq!(
            json,
            json!({ "success": false, "error": "Categoria é obrigatória" })
        );
    }
}
