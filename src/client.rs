use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::backend::Backend;
use crate::client_logger::ExchangeLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, CLIENT_UPLOAD_BYTES,
};
use crate::types::wire::ErrorBody;
use crate::types::{Document, InitializeResponse, Role, SessionId, TurnRequest, TurnResponse};

/// Base URL used when neither the caller nor the environment names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// Environment variable consulted for the base URL.
pub const BASE_URL_ENV: &str = "DEFACTO_BASE_URL";

/// Each turn runs several language-model rounds on the backend, so the
/// default is generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for a DeFacto backend.
#[derive(Clone)]
pub struct DeFacto {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ExchangeLogger>>,
}

impl DeFacto {
    /// Create a new client.
    ///
    /// The base URL is read from the DEFACTO_BASE_URL environment variable,
    /// falling back to `http://localhost:8000/`.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that sees every exchange.
    pub fn with_logger(mut self, logger: Arc<dyn ExchangeLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the base URL every endpoint path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves an endpoint path against the base URL.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(
        &self,
        response: Response,
        session_id: Option<&SessionId>,
    ) -> Error {
        let status = response.status();
        let url = response.url().to_string();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return self.map_send_error(e),
        };
        error_for_status(status, &body, retry_after, &url, session_id)
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_str(&body).map_err(|e| {
            Error::malformed_response(format!("response is not the expected JSON: {}", e))
        })
    }

    async fn post_initialize(
        &self,
        url: &Url,
        document: &Document,
        role: Role,
    ) -> Result<InitializeResponse> {
        let part = Part::bytes(document.bytes().to_vec())
            .file_name(document.file_name().to_string())
            .mime_str(document.media_type())
            .map_err(|e| {
                Error::http_client(
                    format!("Invalid document media type: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        let form = Form::new()
            .part("pdf", part)
            .text("role", role.code().to_string());

        CLIENT_UPLOAD_BYTES.count(document.len() as u64);
        let response = self
            .client
            .post(url.clone())
            .headers(Self::default_headers())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(self.process_error_response(response, None).await);
        }
        self.read_json(response).await
    }

    async fn post_turn(&self, url: &Url, request: &TurnRequest) -> Result<TurnResponse> {
        let response = self
            .client
            .post(url.clone())
            .headers(Self::default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(self
                .process_error_response(response, Some(&request.session_id))
                .await);
        }
        self.read_json(response).await
    }

    fn record<T>(&self, url: &Url, started: Instant, result: &Result<T>) {
        CLIENT_REQUESTS.click();
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());
        if let Err(err) = result {
            CLIENT_REQUEST_ERRORS.click();
            if let Some(logger) = &self.logger {
                logger.log_error(url.as_str(), err);
            }
        }
    }
}

#[async_trait::async_trait]
impl Backend for DeFacto {
    async fn initialize(
        &self,
        path: &str,
        document: &Document,
        role: Role,
    ) -> Result<InitializeResponse> {
        let url = self.endpoint_url(path)?;
        let started = Instant::now();
        let result = self.post_initialize(&url, document, role).await;
        self.record(&url, started, &result);
        if let (Ok(response), Some(logger)) = (&result, &self.logger) {
            logger.log_initialize(url.as_str(), document, role, response);
        }
        result
    }

    async fn turn(&self, path: &str, request: &TurnRequest) -> Result<TurnResponse> {
        let url = self.endpoint_url(path)?;
        let started = Instant::now();
        let result = self.post_turn(&url, request).await;
        self.record(&url, started, &result);
        if let (Ok(response), Some(logger)) = (&result, &self.logger) {
            logger.log_turn(url.as_str(), request, response);
        }
        result
    }
}

impl fmt::Debug for DeFacto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeFacto")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Parses a base URL, making sure it ends in `/` so that endpoint paths
/// append to it instead of replacing its last segment.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("base URL cannot have paths joined to it: {base_url}"),
            None,
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Map a non-success status to an error.
///
/// A 404 on a turn whose body carries the backend's own `error` means the
/// session has been forgotten. Any other 404 means the route is wrong.
fn error_for_status(
    status: StatusCode,
    body: &str,
    retry_after: Option<u64>,
    url: &str,
    session_id: Option<&SessionId>,
) -> Error {
    let mut message = ErrorBody::message(body);
    if message.trim().is_empty() {
        message = status.canonical_reason().unwrap_or("no response body").to_string();
    }
    match (status.as_u16(), session_id) {
        (400, _) | (422, _) => Error::bad_request(message),
        (404, Some(session_id)) if ErrorBody::backend_error(body).is_some() => {
            Error::session_not_found(message, session_id.as_str())
        }
        (404, _) => Error::not_found(message, Some(url.to_string())),
        (408, _) => Error::timeout(message, None),
        (500, _) => Error::internal_server(message),
        (502..=504, _) => Error::service_unavailable(message, retry_after),
        (code, _) => Error::api(code, message),
    }
}
