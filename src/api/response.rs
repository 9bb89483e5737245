use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::StraicoError;
use crate::types::{ChatResponse, ModelCatalog, ModelEntry};

use super::error::extract_error_message;

/// Parses a 2xx completion body.
///
/// A body with `"success": false` is reported as [`StraicoError::Api`] even though the
/// transport status was successful.
pub(crate) fn parse_chat_response(status: u16, text: &str) -> Result<ChatResponse, StraicoError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| StraicoError::parse(format!("invalid JSON in completion response: {err}")))?;
    reject_unsuccessful(status, &value)?;
    ChatResponse::from_value(value)
}

/// Parses a 2xx catalog body into its chat models.
pub(crate) fn parse_catalog(status: u16, text: &str) -> Result<ModelCatalog, StraicoError> {
    #[derive(Deserialize)]
    struct CatalogData {
        chat: Option<Vec<Value>>,
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|err| StraicoError::parse(format!("invalid JSON in models response: {err}")))?;
    reject_unsuccessful(status, &value)?;

    let data = value
        .get("data")
        .cloned()
        .ok_or_else(|| StraicoError::parse("models response has no `data` field"))?;
    let data: CatalogData = serde_json::from_value(data)
        .map_err(|err| StraicoError::parse(format!("unexpected models payload: {err}")))?;
    let entries = data
        .chat
        .ok_or_else(|| StraicoError::parse("models response has no `data.chat` list"))?;
    let chat = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<ModelEntry>(entry) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable catalog entry");
                None
            }
        })
        .collect();
    Ok(ModelCatalog { chat })
}

fn reject_unsuccessful(status: u16, value: &Value) -> Result<(), StraicoError> {
    if !value.is_object() {
        return Err(StraicoError::parse("response body is not a JSON object"));
    }
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = extract_error_message(&value.to_string())
            .unwrap_or_else(|| "service reported failure".to_string());
        return Err(StraicoError::Api {
            status,
            message,
            requested_model: None,
            suggestions: Vec::new(),
        });
    }
    Ok(())
}
