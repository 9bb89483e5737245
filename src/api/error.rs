use serde::Deserialize;
use serde_json::Value;

use crate::error::StraicoError;

/// Extracts the human-readable message from an error body.
///
/// The service reports errors as `{"success": false, "error": "..."}`; nested
/// `{"error": {"message": ...}}` and bare `{"message": ...}` bodies are accepted too.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<Value>,
        message: Option<String>,
    }

    let parsed = serde_json::from_str::<ErrorBody>(body).ok()?;
    let from_error = match parsed.error {
        Some(Value::String(message)) => Some(message),
        Some(Value::Object(inner)) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    from_error
        .or(parsed.message)
        .filter(|message| !message.trim().is_empty())
}

/// Maps a non-success response to [`StraicoError::Api`] without suggestions.
pub(crate) fn parse_api_error(status: u16, body: &str) -> StraicoError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            format!("request failed with status {status}")
        } else {
            trimmed.to_string()
        }
    });
    StraicoError::Api {
        status,
        message,
        requested_model: None,
        suggestions: Vec::new(),
    }
}
