use serde_json::{Map, Value, json};

use crate::error::StraicoError;
use crate::types::{ApiVersion, ChatRequest, MAX_QUANTITY, MIN_QUANTITY, ModelSelection};

/// Checks caller parameters and decides how the request is routed.
///
/// Everything rejected here never reaches the network.
pub(crate) fn resolve_selection(
    request: &ChatRequest,
    version: ApiVersion,
) -> Result<ModelSelection, StraicoError> {
    if request.message.trim().is_empty() {
        return Err(StraicoError::validation("message must not be empty"));
    }

    if let Some(quantity) = request.quantity {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
            return Err(StraicoError::validation(format!(
                "quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY} (got {quantity})"
            )));
        }
    }

    let selection = match (&request.model, &request.models, request.quantity) {
        (Some(_), Some(_), _) => {
            return Err(StraicoError::validation(
                "model and models are mutually exclusive",
            ));
        }
        (Some(_), None, Some(_)) | (None, Some(_), Some(_)) => {
            return Err(StraicoError::validation(
                "quantity cannot be combined with an explicit model or model list",
            ));
        }
        (Some(model), None, None) => {
            if model.trim().is_empty() {
                return Err(StraicoError::validation("model must not be empty"));
            }
            ModelSelection::Single(model.trim().to_string())
        }
        (None, Some(models), None) => {
            if models.is_empty() {
                return Err(StraicoError::validation("models list must not be empty"));
            }
            if models.iter().any(|model| model.trim().is_empty()) {
                return Err(StraicoError::validation(
                    "models list must not contain empty identifiers",
                ));
            }
            ModelSelection::Multiple(models.iter().map(|m| m.trim().to_string()).collect())
        }
        (None, None, quantity) => ModelSelection::Smart {
            pricing_method: request.pricing_method,
            quantity: quantity.unwrap_or(MIN_QUANTITY),
        },
    };

    if version == ApiVersion::V0 {
        match &selection {
            ModelSelection::Multiple(_) => {
                return Err(StraicoError::validation(
                    "querying multiple models requires API v1",
                ));
            }
            ModelSelection::Smart { quantity, .. } if request.quantity.is_some() => {
                return Err(StraicoError::validation(format!(
                    "quantity-based selection requires API v1 (got quantity {quantity})"
                )));
            }
            _ => {}
        }
    }

    Ok(selection)
}

/// Builds the completion request body for the given API version.
pub(crate) fn build_completion_body(
    request: &ChatRequest,
    version: ApiVersion,
) -> Result<Value, StraicoError> {
    let selection = resolve_selection(request, version)?;

    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(request.message.clone()));
    body.insert("replace_failed_models".to_string(), Value::Bool(true));

    match (version, selection) {
        (ApiVersion::V0, ModelSelection::Single(model)) => {
            body.insert("model".to_string(), Value::String(model));
        }
        (ApiVersion::V0, ModelSelection::Smart { pricing_method, .. }) => {
            body.insert(
                "smart_llm_selector".to_string(),
                Value::String(pricing_method.as_str().to_string()),
            );
        }
        (ApiVersion::V0, ModelSelection::Multiple(_)) => {
            // Rejected in `resolve_selection`.
            return Err(StraicoError::validation(
                "querying multiple models requires API v1",
            ));
        }
        (ApiVersion::V1, ModelSelection::Single(model)) => {
            body.insert("models".to_string(), json!([model]));
        }
        (ApiVersion::V1, ModelSelection::Multiple(models)) => {
            body.insert("models".to_string(), json!(models));
        }
        (
            ApiVersion::V1,
            ModelSelection::Smart {
                pricing_method,
                quantity,
            },
        ) => {
            body.insert(
                "smart_llm_selector".to_string(),
                json!({
                    "quantity": quantity,
                    "pricing_method": pricing_method.as_str(),
                }),
            );
        }
    }

    Ok(Value::Object(body))
}
