//! Movie metadata HTTP client.
//!
//! The client never raises on HTTP or transport problems: by contract with
//! its callers every operation returns an [`ApiResponse`], with
//! connection-level failures folded into a sentinel value (`error = true`,
//! `status = None`). Expected negative status codes are an environment
//! property, so assertions go through a configurable [`StatusExpectations`]
//! instead of hard-coded numbers.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;

use crate::report::{Attachment, NullSink, StepSink};
use crate::result::{KinocheckError, KinocheckResult};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.poiskkino.dev/v1.4/movie";

/// Default per-client request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shorter timeout used by unauthorized negative requests
const NO_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fields every movie payload must carry
const REQUIRED_FIELDS: [&str; 3] = ["id", "name", "year"];

/// Attached response bodies are truncated to this many characters
const BODY_ATTACH_LIMIT: usize = 1_000;

/// Query filters for the search operation.
///
/// Later values replace earlier ones for the same key, mirroring how custom
/// filters override the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pairs: Vec<(String, String)>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            pairs: vec![
                ("selectFields".to_string(), "name".to_string()),
                ("type".to_string(), "cartoon".to_string()),
                ("limit".to_string(), "10".to_string()),
            ],
        }
    }
}

impl FilterSet {
    /// The default filters: cartoon names, ten results
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty filter set
    #[must_use]
    pub const fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Set a filter, replacing any existing value for the key
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Filters as query pairs
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value for a key, if set
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Expected status codes for the negative paths.
///
/// What a broken request returns depends on the deployment, so tests assert
/// against these expectations rather than fixed numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusExpectations {
    /// Status of a successful request
    pub success: u16,
    /// Status of an unauthorized request
    pub unauthorized: u16,
    /// Statuses an unknown movie id may produce
    pub invalid_id: Vec<u16>,
}

impl Default for StatusExpectations {
    fn default() -> Self {
        Self {
            success: 200,
            unauthorized: 401,
            invalid_id: vec![404, 400, 422],
        }
    }
}

impl StatusExpectations {
    /// Whether a status is acceptable for an unknown-id request
    #[must_use]
    pub fn allows_invalid_id(&self, status: u16) -> bool {
        self.invalid_id.contains(&status)
    }

    /// Whether a status signals a missing API key
    #[must_use]
    pub fn is_unauthorized(&self, status: u16) -> bool {
        self.unauthorized == status
    }
}

/// Outcome of one API operation.
///
/// A body that is not valid JSON leaves `data` empty without being an error;
/// only transport-level failures set `error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status, absent when the request never completed
    pub status: Option<u16>,
    /// Parsed JSON body, when the body held one
    pub data: Option<Value>,
    /// Raw body text, or the transport error message
    pub raw: String,
    /// Whether the request failed below the HTTP layer
    pub error: bool,
}

impl ApiResponse {
    /// Build from a completed HTTP exchange
    #[must_use]
    pub fn from_http(status: u16, body: String) -> Self {
        let data = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&body).ok()
        };
        Self {
            status: Some(status),
            data,
            raw: body,
            error: false,
        }
    }

    /// Sentinel for a request that never completed
    #[must_use]
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            data: None,
            raw: message.into(),
            error: true,
        }
    }

    /// Whether the body parsed as JSON
    #[must_use]
    pub const fn is_valid_json(&self) -> bool {
        self.data.is_some()
    }

    /// Whether the payload carries the required movie fields (id, name, year)
    #[must_use]
    pub fn has_required_fields(&self) -> bool {
        match &self.data {
            Some(Value::Object(map)) => REQUIRED_FIELDS.iter().all(|field| map.contains_key(*field)),
            _ => false,
        }
    }
}

/// Blocking client for the movie metadata API
pub struct MovieApi {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    sink: Box<dyn StepSink>,
}

impl fmt::Debug for MovieApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovieApi")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl MovieApi {
    /// Create a client for a base URL with an optional API key.
    ///
    /// # Errors
    ///
    /// [`KinocheckError::HttpClient`] when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> KinocheckResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| KinocheckError::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client,
            sink: Box::new(NullSink),
        })
    }

    /// Report requests and responses through a sink
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn StepSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn movie_url(&self, id: u64) -> String {
        format!("{}/{id}", self.base_url)
    }

    fn request(
        &self,
        method: Method,
        url: &str,
        authorized: bool,
        filters: Option<&FilterSet>,
        timeout: Option<Duration>,
    ) -> ApiResponse {
        self.sink.step(&format!("{method} {url}"));
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if authorized {
            if let Some(key) = &self.api_key {
                builder = builder.header("X-API-KEY", key);
            }
        }
        if let Some(filters) = filters {
            builder = builder.query(filters.pairs());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        match builder.send() {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().unwrap_or_default();
                tracing::info!(%method, url, status, "api response");
                self.sink.attach(Attachment::text(
                    "response status",
                    format!("{method} {url} -> {status}"),
                ));
                if !body.is_empty() {
                    let shown: String = body.chars().take(BODY_ATTACH_LIMIT).collect();
                    self.sink.attach(Attachment::json("response body", shown));
                }
                ApiResponse::from_http(status, body)
            }
            Err(error) => {
                tracing::error!(%method, url, %error, "api request failed");
                self.sink
                    .attach(Attachment::text("request error", error.to_string()));
                ApiResponse::transport_error(error.to_string())
            }
        }
    }

    /// Fetch a movie by id
    #[must_use]
    pub fn movie_by_id(&self, id: u64) -> ApiResponse {
        self.request(Method::GET, &self.movie_url(id), true, None, None)
    }

    /// Fetch a random movie
    #[must_use]
    pub fn random_movie(&self) -> ApiResponse {
        let url = format!("{}/random", self.base_url);
        self.request(Method::GET, &url, true, None, None)
    }

    /// Search movies with query filters
    #[must_use]
    pub fn search(&self, filters: &FilterSet) -> ApiResponse {
        let url = self.base_url.clone();
        self.request(Method::GET, &url, true, Some(filters), None)
    }

    /// Negative path: fetch a movie with POST instead of GET
    #[must_use]
    pub fn movie_by_id_wrong_method(&self, id: u64) -> ApiResponse {
        self.request(Method::POST, &self.movie_url(id), true, None, None)
    }

    /// Negative path: fetch a movie without the API key header
    #[must_use]
    pub fn movie_by_id_no_auth(&self, id: u64) -> ApiResponse {
        self.request(
            Method::GET,
            &self.movie_url(id),
            false,
            None,
            Some(NO_AUTH_TIMEOUT),
        )
    }
}
