//! HTTP transport layer for the Bugzilla SDK.

use crate::config::{AuthScheme, ClientConfig, Idempotency};
use crate::error::{BugzillaError, BugzillaResult};
use reqwest::header::{self, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const API_KEY_HEADER: &str = "x-bugzilla-api-key";

/// HTTP transport for making API requests.
///
/// Holds one credential. The underlying [`Client`] (and its connection pool)
/// may be shared between transports; the credential never is.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
    site_url: Url,
    rest_url: Url,
    auth: Option<Auth>,
}

#[derive(Clone)]
enum Auth {
    Header(HeaderName, HeaderValue),
    Query(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(name, _) => write!(f, "Header({name}: <redacted>)"),
            Self::Query(_) => f.write_str("Query(api_key=<redacted>)"),
        }
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with its own connection pool.
    pub fn new(config: Arc<ClientConfig>) -> BugzillaResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("mcp-bugzilla/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BugzillaError::Config(format!("Failed to create HTTP client: {e}")))?;
        Self::with_client(client, config)
    }

    /// Create a transport on top of an existing client.
    pub fn with_client(client: Client, config: Arc<ClientConfig>) -> BugzillaResult<Self> {
        let mut site_url = config.base_url.clone();
        if !site_url.path().ends_with('/') {
            let path = format!("{}/", site_url.path());
            site_url.set_path(&path);
        }
        let rest_url = site_url.join("rest/")?;

        let auth = match config.api_key.as_deref() {
            None => None,
            Some(key) => Some(match config.auth_scheme {
                AuthScheme::ApiKeyHeader => Auth::Header(
                    HeaderName::from_static(API_KEY_HEADER),
                    sensitive_value(key)?,
                ),
                AuthScheme::Bearer => Auth::Header(
                    header::AUTHORIZATION,
                    sensitive_value(&format!("Bearer {key}"))?,
                ),
                AuthScheme::QueryParam => Auth::Query(key.to_string()),
            }),
        };

        Ok(Self {
            client,
            config,
            site_url,
            rest_url,
            auth,
        })
    }

    /// Build a URL below the REST root for the given path.
    pub(crate) fn build_url(&self, path: &str) -> BugzillaResult<Url> {
        Ok(self.rest_url.join(path.trim_start_matches('/'))?)
    }

    /// Build a URL below the site root (non-REST pages).
    pub(crate) fn build_site_url(&self, path: &str) -> BugzillaResult<Url> {
        Ok(self.site_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .timeout(self.config.timeout)
            .header(header::ACCEPT, "application/json");

        match &self.auth {
            Some(Auth::Header(name, value)) => builder.header(name.clone(), value.clone()),
            Some(Auth::Query(key)) => builder.query(&[("api_key", key.as_str())]),
            None => builder,
        }
    }

    /// Execute a request with retries, returning the response body and the
    /// number of attempts it took.
    ///
    /// Reading the body is part of the attempt, so a connection dropped
    /// mid-response is retried like one dropped before it.
    async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        idempotency: Idempotency,
    ) -> BugzillaResult<(Vec<u8>, u32)> {
        let policy = &self.config.retry_policy;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = request_builder
                .try_clone()
                .ok_or_else(|| BugzillaError::Config("Request cannot be cloned".to_string()))?;

            let (failure, in_flight) = match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        match response.bytes().await {
                            Ok(body) => return Ok((body.to_vec(), attempt)),
                            // The response started, so the request reached Bugzilla.
                            Err(e) => (e, true),
                        }
                    } else if policy.has_attempts_left(attempt)
                        && policy.retry_status(status, idempotency)
                    {
                        let backoff = policy.backoff_for_attempt(attempt);
                        warn!(
                            status = status,
                            attempt = attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            "Bugzilla request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    } else {
                        let body = match response.text().await {
                            Ok(body) => body,
                            Err(e) => {
                                let e = e.without_url();
                                debug!(status = status, error = %e, "Failed to read error body");
                                format!("<failed to read body: {e}>")
                            }
                        };
                        warn!(status = status, attempt = attempt, "Bugzilla request failed");
                        return Err(BugzillaError::from_response(status, &body, attempt));
                    }
                }
                Err(e) => {
                    let in_flight = is_in_flight(&e);
                    (e, in_flight)
                }
            };

            // The URL may carry the API key as a query parameter.
            let e = failure.without_url();
            if policy.has_attempts_left(attempt)
                && policy.retry_transport(e.is_connect(), in_flight, idempotency)
            {
                let backoff = policy.backoff_for_attempt(attempt);
                warn!(
                    attempt = attempt,
                    timeout = e.is_timeout(),
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "Bugzilla unreachable, retrying"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }
            warn!(attempt = attempt, error = %e, "Bugzilla unreachable");
            return Err(BugzillaError::Transport {
                source: e,
                attempts: attempt,
            });
        }
    }

    fn parse_json<T: DeserializeOwned>(body: &[u8]) -> BugzillaResult<T> {
        debug!(bytes = body.len(), "Bugzilla response received");
        serde_json::from_slice(body).map_err(|e| BugzillaError::Parse(e.to_string()))
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> BugzillaResult<T> {
        let url = self.build_url(path)?;
        info!(path = url.path(), "GET request");

        let (body, _) = self
            .execute_with_retry(self.request(Method::GET, url), Idempotency::Safe)
            .await?;
        Self::parse_json(&body)
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> BugzillaResult<T> {
        let url = self.build_url(path)?;
        info!(path = url.path(), "GET request with query");

        let (body, _) = self
            .execute_with_retry(self.request(Method::GET, url).query(query), Idempotency::Safe)
            .await?;
        Self::parse_json(&body)
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> BugzillaResult<T> {
        let url = self.build_url(path)?;
        info!(path = url.path(), "POST request");

        let (body, _) = self
            .execute_with_retry(self.request(Method::POST, url).json(body), Idempotency::Unsafe)
            .await?;
        Self::parse_json(&body)
    }

    /// Fetch a page outside the REST API as text.
    pub async fn get_page<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> BugzillaResult<String> {
        let url = self.build_site_url(path)?;
        info!(path = url.path(), "GET page");

        let (body, _) = self
            .execute_with_retry(self.request(Method::GET, url).query(query), Idempotency::Safe)
            .await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Send failures that happened on the wire: timeouts, resets, connections
/// closed before a response arrived. Builder, redirect and decode errors are
/// local.
fn is_in_flight(e: &reqwest::Error) -> bool {
    !(e.is_builder() || e.is_redirect() || e.is_decode())
}

fn sensitive_value(raw: &str) -> BugzillaResult<HeaderValue> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|_| BugzillaError::Config("Invalid API key format".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
