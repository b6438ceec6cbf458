//! HTTP plumbing shared by the provider clients.
//!
//! Every provider does the same three things: check the config it was handed,
//! build a `reqwest::Client` with its auth header and timeout, and POST one
//! JSON body whose non-2xx answers become [`ProviderErrorKind::HttpStatus`].

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::{
    config::{
        llm_model_config::{DEFAULT_TIMEOUT_SECS, LlmModelConfig},
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet},
};

/// Client, normalized endpoint and timeout for one provider.
#[derive(Debug)]
pub(crate) struct ProviderHttp {
    pub provider: Provider,
    pub client: reqwest::Client,
    /// Endpoint without trailing slash.
    pub base: String,
    pub timeout: Duration,
}

impl ProviderHttp {
    /// Checks `cfg` for `provider` and builds the client. `auth` renders the
    /// header value from the API key.
    pub fn new(
        provider: Provider,
        cfg: &LlmModelConfig,
        auth_header: HeaderName,
        auth: impl FnOnce(&str) -> String,
    ) -> Result<Self, AiLlmError> {
        let expected = match provider {
            Provider::AzureOpenAI => LlmProvider::AzureOpenAI,
            Provider::OpenAI => LlmProvider::OpenAI,
        };
        let fail = |kind| -> AiLlmError { ProviderError::new(provider, kind).into() };

        if cfg.provider != expected {
            return Err(fail(ProviderErrorKind::InvalidProvider));
        }

        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| fail(ProviderErrorKind::MissingApiKey))?;

        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(fail(ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone())));
        }

        let auth_value = HeaderValue::from_str(&auth(api_key))
            .map_err(|e| fail(ProviderErrorKind::Decode(format!("invalid API key header: {e}"))))?;
        let mut headers = HeaderMap::new();
        headers.insert(auth_header, auth_value);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            provider,
            client,
            base: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// POSTs `body` to `url` and decodes the JSON answer.
    ///
    /// `expected` names the field the caller reads, for decode errors.
    pub async fn post_json<B, R>(&self, url: &str, body: &B, model: &str, expected: &str) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        debug!(provider = %self.provider, model, "POST {}", url);

        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(
                provider = %self.provider,
                %status,
                url,
                %snippet,
                model,
                latency_ms = started.elapsed().as_millis() as u64,
                "provider returned non-success status"
            );
            return Err(ProviderError::new(
                self.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        resp.json::<R>().await.map_err(|e| {
            error!(provider = %self.provider, error = %e, model, "failed to decode provider response");
            ProviderError::new(
                self.provider,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `{expected}`")),
            )
            .into()
        })
    }
}
