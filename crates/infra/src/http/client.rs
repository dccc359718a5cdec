use std::fmt;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use homedash_domain::{ApiFailure, ApiResult, HomedashError, HttpConfig, Result, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::errors::InfraError;

const DEFAULT_USER_AGENT: &str = concat!("homedash/", env!("CARGO_PKG_VERSION"));

/// Verbs understood by the backend's REST surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }

    /// Only POST and PUT send a request body.
    pub const fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

/// Per-request overrides of the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    /// Applied after the client's default headers, replacing any with the
    /// same name.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Result of a single attempt.
enum Outcome {
    Success(String),
    /// Not worth repeating: 4xx.
    Rejected(ApiFailure),
    /// Timeout, transport failure or any other non-2xx status.
    Retryable(ApiFailure),
    Misuse(HomedashError),
}

/// HTTP client with built-in retry and timeout support.
///
/// Ordinary request failures come back as [`ApiResult::Failure`]; `Err` is
/// reserved for requests that cannot be built and for a 2xx body that is
/// not valid JSON for `T`.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: Option<Url>,
    timeout: Duration,
    retry: RetryPolicy,
    default_headers: HeaderMap,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_ref().map(Url::as_str)
    }

    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute `method endpoint` with retry semantics.
    ///
    /// `endpoint` is joined to the base URL unless it is already absolute.
    /// `body` is ignored for GET and DELETE.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<ApiResult<T>> {
        let url = self.resolve(endpoint)?;
        let headers = self.merge_headers(&options.headers)?;
        let payload = match body {
            Some(body) if method.carries_body() => {
                Some(serde_json::to_vec(body).map_err(InfraError::from)?)
            }
            _ => None,
        };

        let policy = options.retry.unwrap_or(self.retry);
        let timeout = options.timeout.unwrap_or(self.timeout);
        let max_attempts = policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            debug!(attempt = attempt + 1, max_attempts, %method, %url, "sending HTTP request");

            let failure =
                match self.execute(method, &url, &headers, payload.as_deref(), timeout).await {
                    Outcome::Success(text) => return decode_body(&text).map(ApiResult::Success),
                    Outcome::Rejected(failure) => {
                        debug!(%method, %url, code = failure.code, "request rejected, not retrying");
                        return Ok(ApiResult::Failure(failure));
                    }
                    Outcome::Misuse(err) => return Err(err),
                    Outcome::Retryable(failure) => failure,
                };

            if attempt >= policy.max_retries {
                debug!(%method, %url, code = failure.code, attempts = attempt + 1, "retries exhausted");
                return Ok(ApiResult::Failure(failure));
            }

            let delay = policy.delay_for_attempt(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                code = failure.code,
                error = %failure.message,
                %method,
                %url,
                "request failed, retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<ApiResult<T>> {
        self.request(HttpMethod::Get, endpoint, None, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<ApiResult<T>> {
        self.request(HttpMethod::Post, endpoint, Some(body), options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<ApiResult<T>> {
        self.request(HttpMethod::Put, endpoint, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<ApiResult<T>> {
        self.request(HttpMethod::Delete, endpoint, None, options).await
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: &Url,
        headers: &HeaderMap,
        payload: Option<&[u8]>,
        timeout: Duration,
    ) -> Outcome {
        let mut builder = self.client.request(method.as_reqwest(), url.clone()).headers(headers.clone());
        if let Some(payload) = payload {
            builder = builder.body(payload.to_vec());
        }

        let call = async {
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match tokio::time::timeout(timeout, call).await {
            Err(_elapsed) => Outcome::Retryable(timeout_failure(timeout)),
            Ok(Err(err)) if err.is_builder() => Outcome::Misuse(InfraError::from(err).into()),
            Ok(Err(err)) => Outcome::Retryable(network_failure(err)),
            Ok(Ok((status, text))) if status.is_success() => Outcome::Success(text),
            Ok(Ok((status, text))) => {
                let failure = status_failure(status, &text);
                if status.is_client_error() {
                    Outcome::Rejected(failure)
                } else {
                    Outcome::Retryable(failure)
                }
            }
        }
    }

    fn resolve(&self, endpoint: &str) -> Result<Url> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Url::parse(endpoint)
                .map_err(|e| HomedashError::InvalidInput(format!("invalid request URL {endpoint}: {e}")));
        }

        let base = self.base_url.as_ref().ok_or_else(|| {
            HomedashError::InvalidInput(format!("relative endpoint {endpoint} without a base URL"))
        })?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| HomedashError::InvalidInput(format!("invalid request URL {joined}: {e}")))
    }

    fn merge_headers(&self, overrides: &[(String, String)]) -> Result<HeaderMap> {
        let mut headers = self.default_headers.clone();
        for (name, value) in overrides {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: Option<String>,
    default_headers: Vec<(String, String)>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        let defaults = HttpConfig::default();
        Self {
            base_url: None,
            timeout: defaults.timeout,
            retry: defaults.retry,
            user_agent: None,
            default_headers: Vec::new(),
        }
    }
}

impl HttpClientBuilder {
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Apply the timeout and retry policy from `config`.
    #[must_use]
    pub fn config(self, config: &HttpConfig) -> Self {
        self.timeout(config.timeout).retry_policy(config.retry)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Sent with every request unless the request overrides it.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let base_url = self
            .base_url
            .map(|raw| Url::parse(&raw).map_err(InfraError::from))
            .transpose()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.default_headers {
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        let client = ReqwestClient::builder()
            .no_proxy()
            .user_agent(self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()))
            .build()
            .map_err(InfraError::from)?;

        Ok(HttpClient {
            client,
            base_url,
            timeout: self.timeout,
            retry: self.retry,
            default_headers,
        })
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| HomedashError::InvalidInput(format!("invalid header name: {name}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| HomedashError::InvalidInput(format!("invalid value for header {name}")))?;
    Ok((header_name, header_value))
}

fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T> {
    let decoded = if text.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(text)
    };
    decoded.map_err(|err| InfraError::from(err).into())
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timeout_failure(timeout: Duration) -> ApiFailure {
    ApiFailure::new(408, format!("Request timeout after {}ms", timeout.as_millis()))
        .with_detail("originalError", "timeout")
        .with_detail("timestamp", timestamp())
}

fn network_failure(err: reqwest::Error) -> ApiFailure {
    let cause = err.to_string();
    let mapped: HomedashError = InfraError::from(err).into();
    ApiFailure::new(500, mapped.to_string())
        .with_detail("originalError", "network")
        .with_detail("cause", cause)
        .with_detail("timestamp", timestamp())
}

fn status_failure(status: StatusCode, text: &str) -> ApiFailure {
    let status_text = status.canonical_reason().unwrap_or("Unknown Status");
    let mut failure = ApiFailure::new(status.as_u16(), format!("HTTP {}: {status_text}", status.as_u16()))
        .with_detail("originalError", "http")
        .with_detail("statusText", status_text)
        .with_detail("timestamp", timestamp());

    if !text.trim().is_empty() {
        let body = serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()));
        failure = failure.with_detail("body", body);
    }
    failure
}
