//! Authenticated HTTP transport for the Packet API.
//!
//! The lifecycle code talks to the provider exclusively through the
//! [`Transport`] trait so tests can script responses without a network. The
//! production implementation, [`HttpTransport`], issues requests against a
//! fixed API base over TLS and authenticates every call with the project
//! token in the `X-Auth-Token` header.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

/// Default base address of the Packet API.
pub const DEFAULT_API_BASE: &str = "https://api.packet.net";

const AUTH_HEADER: &str = "X-Auth-Token";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// HTTP verbs used against the provider API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// Read a listing or a record.
    Get,
    /// Create a record.
    Post,
    /// Remove a record.
    Delete,
}

impl Method {
    /// Returns whether `status` counts as success for this verb.
    ///
    /// Reads accept `200`, creation accepts `200`/`201` and deletion accepts
    /// `200`/`204`. Every other status is surfaced as
    /// [`TransportError::Status`].
    #[must_use]
    pub const fn accepts(self, status: u16) -> bool {
        match self {
            Self::Get => status == 200,
            Self::Post => matches!(status, 200 | 201),
            Self::Delete => matches!(status, 200 | 204),
        }
    }

    const fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// Errors raised at the transport boundary.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// Raised when the request could not be sent or its body not read.
    #[error("[{method}] {path}: request failed: {message}")]
    Request {
        /// Verb of the failed call.
        method: Method,
        /// API path relative to the base address.
        path: String,
        /// Message reported by the HTTP client.
        message: String,
    },
    /// Raised when the provider answers with a status the verb does not accept.
    #[error("[{method}] {path}: response error {status}: body = '{body}'")]
    Status {
        /// Verb of the failed call.
        method: Method,
        /// API path relative to the base address.
        path: String,
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw response body, decoded lossily as UTF-8.
        body: String,
    },
}

/// Future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Raw request interface to the provider control plane.
///
/// Paths are relative to the API base (for example `operating-systems` or
/// `devices/<id>/events`). Bodies are pre-encoded JSON.
pub trait Transport: Send + Sync {
    /// Issues an authenticated `GET` and returns the response body.
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a, Vec<u8>>;

    /// Issues an authenticated `POST` carrying `body`.
    fn post<'a>(&'a self, path: &'a str, body: Vec<u8>) -> TransportFuture<'a, Vec<u8>>;

    /// Issues an authenticated `DELETE` carrying `body`.
    fn delete<'a>(&'a self, path: &'a str, body: Vec<u8>) -> TransportFuture<'a, Vec<u8>>;
}

/// [`Transport`] backed by `reqwest` with rustls.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    auth_token: String,
}

impl HttpTransport {
    /// Creates a transport targeting `base_url` and authenticating with
    /// `auth_token`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Joins `path` onto the configured base address.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, TransportError> {
        let request_error = |err: reqwest::Error| TransportError::Request {
            method,
            path: path.to_owned(),
            message: err.to_string(),
        };

        let mut builder = HTTP_CLIENT
            .request(method.as_reqwest(), self.url(path))
            .header(AUTH_HEADER, &self.auth_token);
        if let Some(payload) = body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let response = builder.send().await.map_err(request_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(request_error)?;

        if method.accepts(status) {
            return Ok(bytes.to_vec());
        }

        Err(TransportError::Status {
            method,
            path: path.to_owned(),
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(self.send(Method::Get, path, None))
    }

    fn post<'a>(&'a self, path: &'a str, body: Vec<u8>) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(self.send(Method::Post, path, Some(body)))
    }

    fn delete<'a>(&'a self, path: &'a str, body: Vec<u8>) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(self.send(Method::Delete, path, Some(body)))
    }
}
