//! Shared data structures for chat requests, responses, and the model catalog.
//!
//! Request types are strongly typed. Response types stay close to the JSON the service
//! returns and expose explicit accessors that fail with [`StraicoError::Parse`] instead of
//! panicking on an unexpected shape.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::StraicoError;

/// Smallest quantity the smart selector accepts.
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity the smart selector accepts.
pub const MAX_QUANTITY: u32 = 4;

/// Strategy guiding the service's automatic model choice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PricingMethod {
    Quality,
    #[default]
    Balance,
    Budget,
}

impl PricingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingMethod::Quality => "quality",
            PricingMethod::Balance => "balance",
            PricingMethod::Budget => "budget",
        }
    }
}

impl fmt::Display for PricingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingMethod {
    type Err = StraicoError;

    /// Parses a pricing tier name.
    ///
    /// # Examples
    ///
    /// ```
    /// use straico::types::PricingMethod;
    ///
    /// assert_eq!("Budget".parse::<PricingMethod>().unwrap(), PricingMethod::Budget);
    /// assert!("cheapest".parse::<PricingMethod>().is_err());
    /// ```
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quality" => Ok(PricingMethod::Quality),
            "balance" => Ok(PricingMethod::Balance),
            "budget" => Ok(PricingMethod::Budget),
            other => Err(StraicoError::validation(format!(
                "pricing method must be one of quality, balance, budget (got {other:?})"
            ))),
        }
    }
}

/// API generation the client talks to. Fixed for the lifetime of a client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ApiVersion {
    /// Single-model completions only.
    V0,
    /// Multi-model queries and quantity-based smart selection.
    #[default]
    V1,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V0 => "v0",
            ApiVersion::V1 => "v1",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = StraicoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v0" => Ok(ApiVersion::V0),
            "v1" => Ok(ApiVersion::V1),
            other => Err(StraicoError::config(
                "api_version",
                format!("expected v0 or v1, got {other:?}"),
            )),
        }
    }
}

/// Parameters of a single chat call.
///
/// At most one of `model`, `models`, or `quantity` may be set. When none is set the
/// service picks one model according to `pricing_method`.
///
/// # Examples
///
/// ```
/// use straico::types::{ChatRequest, PricingMethod};
///
/// let request = ChatRequest::new("What is the capital of France?")
///     .with_pricing(PricingMethod::Quality)
///     .with_quantity(2)
///     .with_animation(false);
/// assert_eq!(request.quantity, Some(2));
/// assert!(request.model.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub pricing_method: PricingMethod,
    pub model: Option<String>,
    pub models: Option<Vec<String>>,
    pub quantity: Option<u32>,
    /// Whether to animate a "working" indicator while the call is outstanding.
    pub show_animation: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pricing_method: PricingMethod::default(),
            model: None,
            models: None,
            quantity: None,
            show_animation: true,
        }
    }

    pub fn with_pricing(mut self, pricing_method: PricingMethod) -> Self {
        self.pricing_method = pricing_method;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_animation(mut self, show_animation: bool) -> Self {
        self.show_animation = show_animation;
        self
    }

    /// Model identifiers the caller named explicitly, in request order.
    pub fn requested_models(&self) -> Vec<String> {
        match (&self.model, &self.models) {
            (Some(model), _) => vec![model.clone()],
            (None, Some(models)) => models.clone(),
            (None, None) => Vec::new(),
        }
    }
}

/// Validated routing decision derived from a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelection {
    /// Let the smart selector pick `quantity` models for the given tier.
    Smart {
        pricing_method: PricingMethod,
        quantity: u32,
    },
    Single(String),
    Multiple(Vec<String>),
}

/// Cost metadata attached to a catalog entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Coins charged per 100 words. Numeric strings are accepted; anything else reads as
    /// unknown.
    #[serde(default, deserialize_with = "lenient_number")]
    pub coins: Option<f64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// One model the service currently offers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Human-readable display name, e.g. `GPT-4o`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Identifier used in requests, e.g. `openai/gpt-4o`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: String,
    #[serde(default, deserialize_with = "lenient_pricing")]
    pub pricing: Option<ModelPricing>,
    /// Fields the client does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_coins(mut self, coins: f64) -> Self {
        self.pricing = Some(ModelPricing {
            coins: Some(coins),
            extra: HashMap::new(),
        });
        self
    }

    /// Display name, falling back to the identifier when the name is blank.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.model
        } else {
            &self.name
        }
    }

    pub fn coins(&self) -> Option<f64> {
        self.pricing.as_ref().and_then(|pricing| pricing.coins)
    }
}

// Catalog fields are read leniently: unexpected shapes degrade to empty or unknown values.

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_pricing<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ModelPricing>, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// Chat models returned by a single catalog fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelCatalog {
    pub chat: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn len(&self) -> usize {
        self.chat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chat.is_empty()
    }

    /// Finds an entry by exact identifier.
    pub fn get(&self, model: &str) -> Option<&ModelEntry> {
        self.chat.iter().find(|entry| entry.model == model)
    }
}

/// A citation or other annotation attached to a completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    UrlCitation {
        url: String,
        title: Option<String>,
    },
    Other {
        kind: String,
        raw: Value,
    },
}

/// One model's answer extracted from a chat response.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Model that produced the answer.
    pub model: String,
    /// First choice's message content, if any.
    pub text: Option<String>,
    pub annotations: Vec<Annotation>,
}

/// Aggregate price and word count reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostSummary {
    /// Total coins charged.
    pub price: Option<f64>,
    /// Total words billed.
    pub words: Option<f64>,
}

/// Successful chat response.
///
/// The body is kept as parsed JSON; accessors locate the fields the front end needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    raw: Value,
}

impl ChatResponse {
    /// Wraps a response body, requiring a top-level `data` object.
    ///
    /// # Errors
    ///
    /// Returns [`StraicoError::Parse`] when `data` is missing or not an object.
    pub fn from_value(raw: Value) -> Result<Self, StraicoError> {
        match raw.get("data") {
            Some(Value::Object(_)) => Ok(Self { raw }),
            Some(_) => Err(StraicoError::parse("`data` is not an object")),
            None => Err(StraicoError::parse("response has no `data` field")),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get("data").and_then(|data| data.get(key))
    }

    /// Returns `true` when the body carries a per-model `completions` map.
    pub fn is_multi(&self) -> bool {
        matches!(self.field("completions"), Some(Value::Object(map)) if !map.is_empty())
    }

    /// Extracts every completion in the response, in service order.
    ///
    /// Entries of a `completions` map without a `completion` object are skipped, matching
    /// models the service failed to run.
    ///
    /// # Errors
    ///
    /// Returns [`StraicoError::Parse`] when neither `completion` nor `completions` is present.
    pub fn completions(&self) -> Result<Vec<Completion>, StraicoError> {
        if let Some(Value::Object(map)) = self.field("completions") {
            if !map.is_empty() {
                return Ok(map
                    .iter()
                    .filter_map(|(model_id, entry)| {
                        entry
                            .get("completion")
                            .filter(|completion| completion.is_object())
                            .map(|completion| parse_completion(completion, model_id))
                    })
                    .collect());
            }
        }
        match self.field("completion") {
            Some(completion @ Value::Object(_)) => {
                Ok(vec![parse_completion(completion, "Unknown")])
            }
            _ => Err(StraicoError::parse("no completion found in response")),
        }
    }

    /// Text of the first completion.
    pub fn text(&self) -> Result<Option<String>, StraicoError> {
        Ok(self
            .completions()?
            .into_iter()
            .next()
            .and_then(|completion| completion.text))
    }

    /// Price and words, using the overall totals for multi-model responses.
    pub fn cost(&self) -> CostSummary {
        let (price_key, words_key) = if self.is_multi() {
            ("overall_price", "overall_words")
        } else {
            ("price", "words")
        };
        let total = |key: &str| {
            self.field(key)
                .and_then(|value| value.get("total"))
                .and_then(Value::as_f64)
        };
        CostSummary {
            price: total(price_key),
            words: total(words_key),
        }
    }

    /// Explanation the smart selector gave for its model choice.
    pub fn justification(&self) -> Option<&str> {
        self.field("model_selector_justification")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

fn parse_completion(completion: &Value, fallback_model: &str) -> Completion {
    let model = completion
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(fallback_model)
        .to_string();
    let message = completion
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"));
    let text = message
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let annotations = message
        .and_then(|message| message.get("annotations"))
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_annotation).collect())
        .unwrap_or_default();
    Completion {
        model,
        text,
        annotations,
    }
}

fn parse_annotation(annotation: &Value) -> Annotation {
    let kind = annotation
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    if kind == "url_citation" {
        let citation = annotation.get("url_citation");
        let field = |name: &str| {
            citation
                .and_then(|c| c.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Annotation::UrlCitation {
            url: field("url").unwrap_or_else(|| "N/A".to_string()),
            title: field("title"),
        }
    } else {
        Annotation::Other {
            kind: kind.to_string(),
            raw: annotation.clone(),
        }
    }
}
