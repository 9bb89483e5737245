use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::error::parse_api_error;
use crate::api::request::build_completion_body;
use crate::api::response::{parse_catalog, parse_chat_response};
use crate::error::{StraicoError, blame_model, looks_like_model_not_found};
use crate::http::{DynHttpTransport, HttpResponse, get_with_headers, post_json_with_headers};
use crate::matching::{DEFAULT_MAX_SUGGESTIONS, rank_models};
use crate::progress::{IndicatorGuard, LoadingIndicator, SinkFactory, stderr_sink};
use crate::types::{ApiVersion, ChatRequest, ChatResponse, ModelCatalog, ModelEntry};

/// Public host of the Straico API.
pub const DEFAULT_BASE_URL: &str = "https://api.straico.com";

/// Client for the Straico completion and model-listing endpoints.
///
/// The credential and API version are fixed at construction. Each call makes at most one
/// completion request, plus one catalog request when an unknown model needs suggestions.
pub struct StraicoClient {
    transport: DynHttpTransport,
    api_key: String,
    api_version: ApiVersion,
    base_url: String,
    progress_sink: SinkFactory,
}

impl StraicoClient {
    /// Creates a client against the public host.
    pub fn new(
        transport: DynHttpTransport,
        api_key: impl Into<String>,
        api_version: ApiVersion,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            api_version,
            base_url: DEFAULT_BASE_URL.to_string(),
            progress_sink: stderr_sink(),
        }
    }

    /// Overrides the API host, e.g. for a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Redirects the loading indicator away from stderr.
    pub fn with_progress_sink(mut self, sink: SinkFactory) -> Self {
        self.progress_sink = sink;
        self
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn completion_endpoint(&self) -> String {
        format!(
            "{}/{}/prompt/completion",
            self.base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    /// The catalog only exists on v1, whichever version chat uses.
    pub(crate) fn models_endpoint(&self) -> String {
        format!("{}/v1/models", self.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            ),
            ("Accept".to_string(), "application/json".to_string()),
        ])
    }

    /// Sends a chat request.
    ///
    /// Parameters are validated before anything is sent. When the service rejects an
    /// unknown model, the returned [`StraicoError::Api`] carries the closest catalog
    /// entries. If `show_animation` is set, the indicator runs for the whole call and has
    /// stopped by the time this returns, on every path.
    ///
    /// # Errors
    ///
    /// - [`StraicoError::Validation`] for malformed parameters.
    /// - [`StraicoError::Api`] for a non-success status or `"success": false` body.
    /// - [`StraicoError::Parse`] when the body is not the expected JSON.
    /// - [`StraicoError::Transport`] for network failures.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, StraicoError> {
        let body = build_completion_body(request, self.api_version)?;
        debug!(
            api_version = %self.api_version,
            endpoint = %self.completion_endpoint(),
            body = %body,
            "sending completion request"
        );

        let guard = self.start_indicator(request.show_animation);
        let result = self.send_completion(request, &body).await;
        if let Some(guard) = guard {
            guard.stop();
        }
        result
    }

    async fn send_completion(
        &self,
        request: &ChatRequest,
        body: &Value,
    ) -> Result<ChatResponse, StraicoError> {
        let response = post_json_with_headers(
            self.transport.as_ref(),
            self.completion_endpoint(),
            self.build_headers(),
            body,
        )
        .await?;

        let status = response.status;
        let text = match self.ensure_success(response) {
            Ok(text) => text,
            Err(err) => return Err(self.attach_suggestions(request, err).await),
        };
        match parse_chat_response(status, &text) {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(self.attach_suggestions(request, err).await),
        }
    }

    /// Fetches the chat model catalog.
    ///
    /// # Errors
    ///
    /// Same kinds as [`StraicoClient::chat`], minus validation.
    pub async fn get_models(&self) -> Result<ModelCatalog, StraicoError> {
        debug!(endpoint = %self.models_endpoint(), "fetching model catalog");
        let response = get_with_headers(
            self.transport.as_ref(),
            self.models_endpoint(),
            self.build_headers(),
        )
        .await?;
        let status = response.status;
        let text = self.ensure_success(response)?;
        let catalog = parse_catalog(status, &text)?;
        debug!(models = catalog.len(), "model catalog fetched");
        Ok(catalog)
    }

    /// [`StraicoClient::get_models`] with the loading indicator.
    pub async fn get_models_with_animation(
        &self,
        show_animation: bool,
    ) -> Result<ModelCatalog, StraicoError> {
        let guard = self.start_indicator(show_animation);
        let result = self.get_models().await;
        if let Some(guard) = guard {
            guard.stop();
        }
        result
    }

    /// Fetches the catalog and returns up to `max_suggestions` entries resembling `query`.
    ///
    /// See [`crate::matching`] for the scoring rules.
    pub async fn find_similar_models(
        &self,
        query: &str,
        max_suggestions: usize,
    ) -> Result<Vec<ModelEntry>, StraicoError> {
        let catalog = self.get_models().await?;
        Ok(rank_models(query, &catalog.chat, max_suggestions))
    }

    fn start_indicator(&self, show_animation: bool) -> Option<IndicatorGuard> {
        show_animation.then(|| LoadingIndicator::new("Thinking").start((self.progress_sink)()))
    }

    fn ensure_success(&self, response: HttpResponse) -> Result<String, StraicoError> {
        if response.is_success() {
            response.into_string()
        } else {
            Err(parse_api_error(
                response.status,
                &String::from_utf8_lossy(&response.body),
            ))
        }
    }

    async fn attach_suggestions(&self, request: &ChatRequest, err: StraicoError) -> StraicoError {
        match err {
            StraicoError::Api {
                status,
                message,
                requested_model: None,
                ..
            } if looks_like_model_not_found(&message) => {
                let Some(requested) = blame_model(&request.requested_models(), &message) else {
                    // Smart-selector requests name no model to correct.
                    return StraicoError::Api {
                        status,
                        message,
                        requested_model: None,
                        suggestions: Vec::new(),
                    };
                };

                let suggestions = match self
                    .find_similar_models(&requested, DEFAULT_MAX_SUGGESTIONS)
                    .await
                {
                    Ok(found) => found,
                    Err(lookup_err) => {
                        warn!(
                            error = %lookup_err,
                            model = %requested,
                            "could not fetch catalog for suggestions"
                        );
                        Vec::new()
                    }
                };
                debug!(
                    model = %requested,
                    suggestions = suggestions.len(),
                    "unknown model reported by service"
                );
                StraicoError::Api {
                    status,
                    message,
                    requested_model: Some(requested),
                    suggestions,
                }
            }
            other => other,
        }
    }
}
