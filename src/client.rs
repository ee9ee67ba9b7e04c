//! Terraform Cloud API client: request engine, retry policy, pagination.
//!
//! [`ApiClient`] performs one authenticated HTTP exchange per logical call,
//! wrapped in the configured retry policy. Permanent errors short-circuit the
//! loop; transient errors are retried with exponential backoff until attempts
//! are exhausted, at which point the last error surfaces to the caller.
//! [`TfcClient`] composes the capability modules over a shared engine.

use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{TfcConfig, TfcCredentials};
use crate::error::{ApiErrorDetail, TfcError, TfcResult};
use crate::jsonapi::{resource_from_value, ListDocument, ListMeta, ResourceObject};
use crate::organizations::Organizations;
use crate::retry::{RetryEvent, RetryObserver};
use crate::users::{Account, Users};
use crate::workspaces::Workspaces;

/// JSON:API content type required by Terraform Cloud.
const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Query parameter names for list pagination.
const PAGE_SIZE_PARAM: &str = "page[size]";
const PAGE_NUMBER_PARAM: &str = "page[number]";

/// Descriptor for one API call. Immutable per call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API origin, e.g. `/api/v2/organizations`.
    pub path: String,
    /// Query parameters; `None` values are dropped, not serialized.
    pub query: Vec<(String, Option<String>)>,
    /// JSON body, serialized when present.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Add a query parameter. `None` values are omitted from the URL.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.query.push((key.into(), value));
        self
    }

    fn has_query_param(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k == key)
    }
}

/// Build the target URL, joining the origin with the path and serializing
/// only the query parameters that carry a value.
fn build_url(base: &Url, request: &ApiRequest) -> TfcResult<Url> {
    let mut url = base.join(&request.path)?;

    let pairs: Vec<(&str, &str)> = request
        .query
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key.as_str(), v)))
        .collect();

    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url)
}

/// HTTP request engine for the Terraform Cloud API.
///
/// Stateless across calls except for configuration bound at construction.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_token: SecretString,
    config: TfcConfig,
    on_retry: Option<RetryObserver>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("config", &self.config)
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: TfcConfig, credentials: TfcCredentials) -> TfcResult<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TfcError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_token: credentials.api_token,
            config,
            on_retry: None,
        })
    }

    /// Attach an observer invoked once per retryable request failure.
    #[must_use]
    pub fn with_retry_observer(mut self, observer: RetryObserver) -> Self {
        self.on_retry = Some(observer);
        self
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &TfcConfig {
        &self.config
    }

    /// The underlying HTTP client, for plain (non-API) downloads.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Perform one logical exchange under the retry policy and return the
    /// parsed response body (`Null` for empty bodies).
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> TfcResult<Value> {
        let url = build_url(&self.base_url, request)?;
        let max_attempts = self.config.retry.max_attempts;
        let mut attempt = 1u32;

        loop {
            match self.send_once(request, &url).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_permanent() => return Err(err),
                Err(err) if attempt >= max_attempts => {
                    warn!(
                        url = %url,
                        attempts = attempt,
                        error = %err,
                        "request failed after exhausting retries"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let attempts_remaining = max_attempts - attempt;
                    if let Some(observer) = &self.on_retry {
                        observer(&RetryEvent {
                            url: url.to_string(),
                            error_code: err.error_code(),
                            error: err.to_string(),
                            attempt,
                            attempts_remaining,
                        });
                    }

                    let delay = self.config.retry.backoff_delay(attempt);
                    debug!(
                        url = %url,
                        attempt,
                        attempts_remaining,
                        delay_ms = delay.as_millis() as u64,
                        "retrying transient request failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One transport exchange: build, send, classify.
    async fn send_once(&self, request: &ApiRequest, url: &Url) -> TfcResult<Value> {
        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .bearer_auth(self.api_token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, JSON_API_CONTENT_TYPE);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        // Success is any status in [200, 400).
        if (200..400).contains(&status) {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&body)?);
        }

        // Error bodies usually carry a JSON:API `errors` array; a body that
        // fails to parse is tolerated as "no structured detail available".
        let details = parse_error_details(&body);
        Err(TfcError::api(status, details))
    }

    /// Request a single resource and return its normalized record.
    pub async fn request(&self, request: &ApiRequest) -> TfcResult<ResourceObject> {
        let mut value = self.send(request).await?;
        let data = value
            .get_mut("data")
            .map(Value::take)
            .ok_or_else(|| TfcError::Config("response document has no data section".into()))?;
        Ok(resource_from_value(data)?)
    }

    /// Issue a DELETE and discard the response body.
    pub async fn delete(&self, path: impl Into<String>) -> TfcResult<()> {
        self.send(&ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Request one page of a list endpoint, normalized.
    ///
    /// A document whose `data` is not an array is a fatal contract violation
    /// and is reported as [`TfcError::MalformedListResponse`].
    pub async fn list(&self, request: &ApiRequest) -> TfcResult<ListDocument> {
        let mut value = self.send(request).await?;

        let data = match value.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TfcError::MalformedListResponse {
                    method: request.method.to_string(),
                    path: request.path.clone(),
                })
            }
        };

        let included = match value.get_mut("included").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let data = data
            .into_iter()
            .map(resource_from_value)
            .collect::<Result<Vec<_>, _>>()?;
        let included = included
            .into_iter()
            .map(resource_from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let links = value
            .get_mut("links")
            .map(Value::take)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let meta: Option<ListMeta> = value
            .get_mut("meta")
            .map(Value::take)
            .and_then(|v| serde_json::from_value(v).ok());

        Ok(ListDocument {
            data,
            included,
            links,
            meta,
        })
    }

    /// Pull-based page iterator over a list endpoint.
    pub fn pager(&self, request: ApiRequest) -> ListPager<'_> {
        ListPager {
            client: self,
            request,
            next_page: None,
            started: false,
        }
    }

    /// Drive a list endpoint page by page, streaming every item to the
    /// callback together with that page's `included` side-records.
    ///
    /// All of page N's callbacks complete before page N+1 is requested, and
    /// items are delivered in server order.
    pub async fn iterate_items<F>(&self, request: ApiRequest, mut callback: F) -> TfcResult<()>
    where
        F: FnMut(&ResourceObject, &[ResourceObject]) -> TfcResult<()>,
    {
        let mut pager = self.pager(request);
        while let Some(page) = pager.next_page().await? {
            for item in &page.data {
                callback(item, &page.included)?;
            }
        }
        Ok(())
    }
}

/// Lazy page sequence over a paginated list endpoint.
///
/// The first request omits `page[number]`; each subsequent request uses the
/// server-reported `next-page` verbatim. Iteration ends when the server stops
/// reporting a next page.
pub struct ListPager<'a> {
    client: &'a ApiClient,
    request: ApiRequest,
    next_page: Option<u32>,
    started: bool,
}

impl ListPager<'_> {
    /// Fetch the next page, or `None` once the sequence is exhausted.
    pub async fn next_page(&mut self) -> TfcResult<Option<ListDocument>> {
        if self.started && self.next_page.is_none() {
            return Ok(None);
        }

        let mut request = self.request.clone();
        if !request.has_query_param(PAGE_SIZE_PARAM) {
            request = request.with_query(
                PAGE_SIZE_PARAM,
                Some(self.client.config.page_size.to_string()),
            );
        }
        if let Some(page) = self.next_page {
            request = request.with_query(PAGE_NUMBER_PARAM, Some(page.to_string()));
        }

        let document = self.client.list(&request).await?;
        debug!(
            path = %self.request.path,
            items = document.data.len(),
            next_page = ?document.next_page(),
            "fetched list page"
        );

        self.started = true;
        self.next_page = document.next_page();
        Ok(Some(document))
    }
}

/// Tolerant parse of a JSON:API error body.
fn parse_error_details(body: &str) -> Vec<ApiErrorDetail> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|mut v| v.get_mut("errors").map(Value::take))
        .and_then(|errors| serde_json::from_value(errors).ok())
        .unwrap_or_default()
}

/// Terraform Cloud client composed of independent capability modules sharing
/// one request engine.
#[derive(Debug, Clone)]
pub struct TfcClient {
    api: Arc<ApiClient>,
}

impl TfcClient {
    /// Create a client from configuration and credentials.
    pub fn new(config: TfcConfig, credentials: TfcCredentials) -> TfcResult<Self> {
        Ok(Self {
            api: Arc::new(ApiClient::new(config, credentials)?),
        })
    }

    /// Wrap an already-built request engine.
    pub fn from_api(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// The shared request engine.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Organization operations.
    pub fn organizations(&self) -> Organizations {
        Organizations::new(Arc::clone(&self.api))
    }

    /// Workspace operations.
    pub fn workspaces(&self) -> Workspaces {
        Workspaces::new(Arc::clone(&self.api))
    }

    /// User operations.
    pub fn users(&self) -> Users {
        Users::new(Arc::clone(&self.api))
    }

    /// Token-holder account operations.
    pub fn account(&self) -> Account {
        Account::new(Arc::clone(&self.api))
    }
}
