use serde::{Deserialize, Serialize};

use crate::client::StraicoClient;
use crate::error::StraicoError;
use crate::http::DynHttpTransport;
use crate::types::ApiVersion;

/// Environment variable the front end reads the credential from.
pub const API_KEY_ENV: &str = "STRAICO_API_KEY";
/// Environment variable overriding the API host.
pub const BASE_URL_ENV: &str = "STRAICO_BASE_URL";

/// Settings needed to build a [`StraicoClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Host override; the public API host when absent.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_version: ApiVersion::default(),
            base_url: None,
        }
    }
}

/// Builds a client from configuration.
///
/// # Errors
///
/// Returns [`StraicoError::Config`] when the credential or host is blank.
pub fn build_client_from_config(
    config: &ClientConfig,
    transport: DynHttpTransport,
) -> Result<StraicoClient, StraicoError> {
    if config.api_key.trim().is_empty() {
        return Err(StraicoError::config("api_key", "credential must not be blank"));
    }

    let mut client = StraicoClient::new(transport, config.api_key.trim(), config.api_version);
    if let Some(base_url) = &config.base_url {
        if base_url.trim().is_empty() {
            return Err(StraicoError::config("base_url", "host must not be blank"));
        }
        client = client.with_base_url(base_url.trim());
    }
    Ok(client)
}

/// Picks the credential: an explicit flag wins over the environment.
///
/// # Errors
///
/// Returns [`StraicoError::Config`] when neither source holds a non-blank value.
pub fn resolve_api_key(
    flag: Option<String>,
    env: Option<String>,
) -> Result<String, StraicoError> {
    flag.into_iter()
        .chain(env)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            StraicoError::config(
                "api_key",
                format!("no API key given; pass --api-key or set {API_KEY_ENV}"),
            )
        })
}
