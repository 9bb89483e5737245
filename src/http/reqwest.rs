use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::error::StraicoError;

use super::{DynHttpTransport, HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Default [`HttpTransport`] backed by reqwest.
///
/// No request timeout is configured; hangs are bounded only by the underlying connection
/// defaults.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wraps a caller-supplied reqwest client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a transport with reqwest's default configuration.
    pub fn default_client() -> Result<Self, StraicoError> {
        Client::builder()
            .user_agent(concat!("straico-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map(Self::new)
            .map_err(|err| {
                StraicoError::transport(format!("failed to create reqwest client: {err}"))
            })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    fn build_request(
        &self,
        mut request: HttpRequest,
    ) -> Result<reqwest::RequestBuilder, StraicoError> {
        let method = Self::method(request.method);
        let mut builder = self.client.request(method, &request.url);

        for (name, value) in request.headers.drain() {
            let header_name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| StraicoError::transport(format!("invalid header name: {err}")))?;
            let header_value = reqwest::header::HeaderValue::from_str(&value).map_err(|err| {
                StraicoError::transport(format!("invalid header value for {header_name}: {err}"))
            })?;
            builder = builder.header(header_name, header_value);
        }

        if let Some(body) = request.body.take() {
            builder = builder.body(body);
        }

        Ok(builder)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, StraicoError> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|err| StraicoError::transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| StraicoError::transport(err.to_string()))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Builds a shareable reqwest-backed transport.
pub fn default_dyn_transport() -> Result<DynHttpTransport, StraicoError> {
    Ok(Arc::new(ReqwestTransport::default_client()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn build_request_carries_headers_and_body_without_timeout() {
        let transport = ReqwestTransport::default_client().expect("client");
        let request =
            HttpRequest::post_json("http://straico.test/v1/prompt/completion", b"{}".to_vec())
                .with_headers(HashMap::from([(
                    "Authorization".to_string(),
                    "Bearer k".to_string(),
                )]));

        let built = transport
            .build_request(request)
            .expect("builder")
            .build()
            .expect("request");
        assert_eq!(built.method(), Method::POST);
        assert_eq!(built.headers()["authorization"], "Bearer k");
        assert_eq!(built.headers()["content-type"], "application/json");
        assert!(built.timeout().is_none());
        assert_eq!(built.body().and_then(|body| body.as_bytes()), Some(&b"{}"[..]));
    }

    #[test]
    fn invalid_header_is_transport_error() {
        let transport = ReqwestTransport::default_client().expect("client");
        let request = HttpRequest::get("http://straico.test/v1/models")
            .with_headers(HashMap::from([("bad header".to_string(), "x".to_string())]));
        assert!(matches!(
            transport.build_request(request),
            Err(StraicoError::Transport { .. })
        ));
    }
}
